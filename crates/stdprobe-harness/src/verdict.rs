//! Per-assertion outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an assertion failed. Diagnostic only: every kind counts as one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The operation returned a value unequal to the expected one.
    ValueMismatch,
    /// The operation faulted where a value was expected.
    UnexpectedFault,
    /// The operation returned normally where a fault was expected.
    UnexpectedSuccess,
    /// The operation faulted, but with a different kind than expected.
    WrongFaultKind,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValueMismatch => "value_mismatch",
            Self::UnexpectedFault => "unexpected_fault",
            Self::UnexpectedSuccess => "unexpected_success",
            Self::WrongFaultKind => "wrong_fault_kind",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single assertion primitive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "kind", rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail(FailureKind),
    /// Not evaluated: fault signaling is unavailable in this run.
    Skipped,
}

impl Verdict {
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    #[must_use]
    pub const fn is_fail(self) -> bool {
        matches!(self, Self::Fail(_))
    }

    #[must_use]
    pub const fn failure_kind(self) -> Option<FailureKind> {
        match self {
            Self::Fail(kind) => Some(kind),
            Self::Pass | Self::Skipped => None,
        }
    }
}
