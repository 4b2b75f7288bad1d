//! Harness configuration.
//!
//! Fault support is decided at two levels:
//! - compile time: the `fault-signaling` Cargo feature. Without it the build
//!   cannot catch faults at all (e.g. `panic = "abort"` targets).
//! - run time: the `STDPROBE_FAULTS` environment variable (`on` by default)
//!   can switch fault support off, never on for a build lacking the feature.
//!
//! Progress markers are controlled by `STDPROBE_PROGRESS` (`on` by default).

use crate::fault::FAULT_SIGNALING_COMPILED;

/// Environment variable selecting runtime fault support.
pub const FAULTS_ENV: &str = "STDPROBE_FAULTS";
/// Environment variable toggling progress markers.
pub const PROGRESS_ENV: &str = "STDPROBE_PROGRESS";

/// Whether the harness may catch faults raised by operations under test.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultSupport {
    /// Faults are caught and classified.
    #[default]
    Enabled,
    /// Faults cannot be caught: `assert_throws` records skips and
    /// `assert_returns` invokes operations directly.
    Disabled,
}

impl FaultSupport {
    /// Parse from string (case-insensitive). Unknown values mean `Enabled`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match parse_switch(s) {
            Some(false) => Self::Disabled,
            Some(true) | None => Self::Enabled,
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }

    /// Clamp to what this build supports.
    #[must_use]
    pub const fn effective(self) -> Self {
        if FAULT_SIGNALING_COMPILED {
            self
        } else {
            Self::Disabled
        }
    }
}

/// Runtime settings for a [`TestHarness`](crate::TestHarness).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessConfig {
    pub faults: FaultSupport,
    pub progress: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            faults: FaultSupport::Enabled.effective(),
            progress: true,
        }
    }
}

impl HarnessConfig {
    /// Resolve settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let faults = lookup(FAULTS_ENV)
            .map(|raw| FaultSupport::from_str_loose(&raw))
            .unwrap_or_default()
            .effective();
        let progress = lookup(PROGRESS_ENV)
            .and_then(|raw| parse_switch(&raw))
            .unwrap_or(true);
        Self { faults, progress }
    }

    #[must_use]
    pub fn with_faults(mut self, faults: FaultSupport) -> Self {
        self.faults = faults.effective();
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "enabled" | "yes" | "true" | "1" => Some(true),
        "off" | "disabled" | "no" | "false" | "0" => Some(false),
        _ => None,
    }
}
