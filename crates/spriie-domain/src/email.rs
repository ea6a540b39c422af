//! Email job delivery state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UnknownVariant;

/// Delivery state of a queued email.
///
/// `Queued` jobs are picked up by the dispatcher, `DeadLetter` jobs by the
/// resurrector. `Sent` and `Abandoned` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailJobState {
    Queued,
    Sent,
    DeadLetter,
    Abandoned,
}

impl EmailJobState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::DeadLetter => "dead_letter",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Abandoned)
    }

    /// Legacy `sent` flag.
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent)
    }

    /// Legacy `failed` flag: set for dead-lettered and abandoned jobs alike.
    pub fn is_failed(self) -> bool {
        matches!(self, Self::DeadLetter | Self::Abandoned)
    }
}

impl fmt::Display for EmailJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmailJobState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "sent" => Ok(Self::Sent),
            "dead_letter" => Ok(Self::DeadLetter),
            "abandoned" => Ok(Self::Abandoned),
            other => Err(UnknownVariant::new("email job state", other)),
        }
    }
}
