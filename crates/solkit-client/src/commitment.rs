use std::fmt;

use serde::{Deserialize, Serialize};

/// How settled a block must be before a read or confirmation counts.
///
/// Ordered from weakest to strongest, so `status >= wanted` means the
/// wanted level has been reached.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Commitment::Processed < Commitment::Confirmed);
        assert!(Commitment::Confirmed < Commitment::Finalized);
    }

    #[test]
    fn serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&Commitment::Finalized).unwrap(),
            "\"finalized\""
        );
        let parsed: Commitment = serde_json::from_str("\"processed\"").unwrap();
        assert_eq!(parsed, Commitment::Processed);
    }
}
