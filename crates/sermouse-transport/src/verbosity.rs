//! Diagnostic verbosity
//!
//! Passed into each component at construction. It only decides which trace
//! lines are emitted and never changes behavior.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Errors and removal only.
    Quiet,
    /// Lifecycle and detection outcomes.
    #[default]
    Normal,
    /// Every decoded packet.
    Packets,
    /// Every received byte.
    Bytes,
}

impl Verbosity {
    pub fn packets(self) -> bool {
        self >= Verbosity::Packets
    }

    pub fn bytes(self) -> bool {
        self >= Verbosity::Bytes
    }

    pub fn lifecycle(self) -> bool {
        self >= Verbosity::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(!Verbosity::Quiet.lifecycle());
        assert!(Verbosity::Normal.lifecycle());
        assert!(!Verbosity::Normal.packets());
        assert!(Verbosity::Bytes.packets());
        assert!(Verbosity::Bytes.bytes());
    }

    #[test]
    fn test_serde_names() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&Verbosity::Packets)?;
        assert_eq!(json, "\"packets\"");
        let parsed: Verbosity = serde_json::from_str("\"bytes\"")?;
        assert_eq!(parsed, Verbosity::Bytes);
        Ok(())
    }
}
