use markweave_config::FamilySettings;

use crate::buffer::AllocationPolicy;
use crate::error::ComposeError;
use crate::format::{FormatSpec, FormatValue, Locale, try_format};

/// Formats `value` into trial buffers of increasing size until it fits.
///
/// Starts at `initial_buffer_length` and grows by `growth_factor`, never past
/// `max_buffer_length`. On success `on_success` sees exactly the written
/// chars, while the trial buffer is still alive; anything it wants to keep
/// must be copied out. Each attempt rents and returns its own buffer, so a
/// failure leaves nothing leased.
pub fn format_with_retry<T, R, F>(
    value: &T,
    spec: &FormatSpec,
    locale: &Locale,
    settings: &FamilySettings,
    policy: &AllocationPolicy<'_>,
    mut on_success: F,
) -> Result<R, ComposeError>
where
    T: FormatValue + ?Sized,
    F: FnMut(&[char]) -> R,
{
    let mut capacity = settings.initial_buffer_length.min(settings.max_buffer_length);
    let mut attempt = 1;
    loop {
        log::trace!("Formatting attempt {attempt} with {capacity} chars");
        let outcome = policy.with_buffer(capacity, |buf| {
            try_format(value, buf, spec, locale).map(|written| on_success(&buf[..written]))
        });
        if let Some(result) = outcome {
            return Ok(result);
        }

        match settings.next_capacity(capacity) {
            Some(next) => {
                log::debug!("Value did not fit in {capacity} chars, retrying with {next}");
                capacity = next;
                attempt += 1;
            }
            None => {
                return Err(ComposeError::CapacityExceeded {
                    requested: settings.max_buffer_length + 1,
                    max: settings.max_buffer_length,
                });
            }
        }
    }
}
