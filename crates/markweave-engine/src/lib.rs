//! Length-aware text composition.
//!
//! Fragments ([`Fragment`]) know their exact length before they are written,
//! so a whole tree of literals, formatted values and nested wrappers is
//! materialised into one exactly sized buffer. Where the length is not known
//! up front, [`StringBuilder`] retries an append callback in growing buffers
//! chosen by the [`buffer::AllocationPolicy`].
//!
//! ```
//! use markweave_engine::{Fragment, Node};
//!
//! let greeting = Fragment::join([
//!     Fragment::text("Hello, "),
//!     Fragment::value(42),
//!     Fragment::text("!"),
//! ]);
//! assert_eq!(greeting.total_length(), 10);
//! assert_eq!(greeting.to_string(), "Hello, 42!");
//! ```

pub mod buffer;
pub mod builder;
pub mod composer;
pub mod error;
pub mod format;
pub mod node;

pub use builder::{StringBuilder, Writer};
pub use composer::Composer;
pub use error::{ComposeError, InsufficientBuffer};
pub use format::{Align, Displayed, FormatSpec, FormatValue, Locale, ValueNode};
pub use node::{Composite, Fragment, LengthCache, Node, TextNode};

pub use markweave_config::{Family, FamilySettings, SettingsRegistry};
