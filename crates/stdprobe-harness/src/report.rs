//! Run summaries.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Final tally of a harness run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Assertions evaluated (`passed + failed`).
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    /// `assert_throws` calls not evaluated for lack of fault support.
    pub skipped: u64,
}

impl Summary {
    /// True when nothing failed. Skips do not count against a run.
    #[must_use]
    pub const fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Human-readable multi-line summary.
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut out = format!(
            "Test results:\n  total:   {}\n  passed:  {}\n  failed:  {}\n",
            self.total, self.passed, self.failed
        );
        if self.skipped > 0 {
            out.push_str(&format!("  skipped: {}\n", self.skipped));
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON form to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), HarnessError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
