use std::fmt;

use serde::{Deserialize, Serialize};

/// A group of consumers sharing one settings record.
///
/// Builders use [`Family::Builder`]; every formattable value type declares
/// the family whose trial-buffer sizes suit its typical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Builder,
    Integer,
    Float,
    Temporal,
    Identifier,
    Enumeration,
}

impl Family {
    pub const ALL: [Family; 6] = [
        Family::Builder,
        Family::Integer,
        Family::Float,
        Family::Temporal,
        Family::Identifier,
        Family::Enumeration,
    ];

    /// Key used for this family's table in the settings file.
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Builder => "builder",
            Family::Integer => "integer",
            Family::Float => "float",
            Family::Temporal => "temporal",
            Family::Identifier => "identifier",
            Family::Enumeration => "enumeration",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
