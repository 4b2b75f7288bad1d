//! Errors from the harness's ambient surfaces (log files, reports).
//!
//! Assertion primitives never return these: outcomes of the code under test
//! are classified into counters, not propagated.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}
