//! Standard library smoke programs.
//!
//! Each program is a short linear sequence of library calls whose effects
//! are printed for manual inspection, plus a `check` entry point that drives
//! the same calls through a [`TestHarness`](stdprobe_harness::TestHarness).

pub mod newdel;
pub mod streamiter;
pub mod trace;

use stdprobe_harness::TestHarness;

/// A named group of harness checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Newdel,
    Streamiter,
}

impl Suite {
    pub const ALL: [Self; 2] = [Self::Newdel, Self::Streamiter];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Newdel => "newdel",
            Self::Streamiter => "streamiter",
        }
    }

    /// Run this suite's checks against `harness`.
    pub fn check(self, harness: &mut TestHarness) {
        harness.set_suite(self.name());
        match self {
            Self::Newdel => newdel::check(harness),
            Self::Streamiter => streamiter::check(harness),
        }
    }
}
