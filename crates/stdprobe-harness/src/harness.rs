//! The assertion-counting harness.

use std::any::Any;
use std::fmt;
use std::io::{self, Write};

use crate::config::HarnessConfig;
use crate::fault::{FAULT_SIGNALING_COMPILED, catch_fault};
use crate::report::Summary;
use crate::structured_log::{LogEmitter, LogEntry, LogLevel};
use crate::verdict::{FailureKind, Verdict};

/// Runs checks against code under test and keeps the pass/fail tally.
///
/// Every assertion primitive increments `total` and exactly one of
/// `passed` / `failed`, except an `assert_throws` evaluated without fault
/// support, which increments `skipped` only. Hence
/// `total == passed + failed` holds after every call.
pub struct TestHarness {
    counts: Summary,
    config: HarnessConfig,
    out: Box<dyn Write>,
    log: Option<LogEmitter>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with default config, writing progress to stdout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HarnessConfig::default())
    }

    #[must_use]
    pub fn with_config(config: HarnessConfig) -> Self {
        Self {
            counts: Summary::default(),
            config,
            out: Box::new(io::stdout()),
            log: None,
        }
    }

    /// Redirect progress markers and the summary.
    #[must_use]
    pub fn with_output(mut self, out: impl Write + 'static) -> Self {
        self.out = Box::new(out);
        self
    }

    /// Attach a JSONL emitter receiving one event per assertion.
    #[must_use]
    pub fn with_log(mut self, log: LogEmitter) -> Self {
        self.log = Some(log);
        self
    }

    #[must_use]
    pub fn config(&self) -> HarnessConfig {
        self.config
    }

    /// Label subsequent log events with `suite`.
    pub fn set_suite(&mut self, suite: &str) {
        if let Some(log) = self.log.as_mut() {
            log.set_suite(suite);
        }
    }

    /// Reset all counters to zero.
    pub fn init(&mut self) {
        self.counts = Summary::default();
    }

    /// Check that `operation` returns `expected`.
    ///
    /// A fault raised by `operation`, or by the `PartialEq` / `Debug` impls
    /// of `T`, counts as a failure and is not propagated. Turning fault
    /// support off at run time does not change this; only a build without
    /// the `fault-signaling` feature invokes the operation uncaught.
    pub fn assert_returns<T, F>(&mut self, operation: F, expected: T) -> Verdict
    where
        T: PartialEq + fmt::Debug,
        F: FnOnce() -> T,
    {
        self.counts.total += 1;
        let index = self.counts.total;
        self.progress(format_args!("."));

        // Ok(None) on a match, Ok(Some(detail)) on a mismatch.
        let evaluate = move || {
            let actual = operation();
            if actual == expected {
                None
            } else {
                Some(format!("expected {expected:?}, got {actual:?}"))
            }
        };
        let outcome = if FAULT_SIGNALING_COMPILED {
            catch_fault(evaluate)
        } else {
            Ok(evaluate())
        };

        match outcome {
            Ok(None) => self.record(index, Verdict::Pass, None),
            Ok(Some(detail)) => {
                self.progress(format_args!("({index})"));
                self.record(index, Verdict::Fail(FailureKind::ValueMismatch), Some(detail))
            }
            Err(fault) => {
                self.progress(format_args!("(e{index})"));
                self.record(
                    index,
                    Verdict::Fail(FailureKind::UnexpectedFault),
                    Some(fault.message()),
                )
            }
        }
    }

    /// Check that `operation` faults with kind `E`.
    ///
    /// Without fault support the operation is not invoked and the call is
    /// recorded as skipped.
    pub fn assert_throws<E, R, F>(&mut self, operation: F) -> Verdict
    where
        E: Any,
        F: FnOnce() -> R,
    {
        if !self.config.faults.is_enabled() {
            self.counts.skipped += 1;
            self.progress(format_args!("s"));
            let index = self.counts.total;
            return self.record(index, Verdict::Skipped, None);
        }

        self.counts.total += 1;
        let index = self.counts.total;
        self.progress(format_args!("."));

        match catch_fault(operation) {
            Ok(_) => {
                self.progress(format_args!("N {index}"));
                self.record(index, Verdict::Fail(FailureKind::UnexpectedSuccess), None)
            }
            Err(fault) if fault.is::<E>() => self.record(index, Verdict::Pass, None),
            Err(fault) => {
                self.progress(format_args!("(e {index})"));
                self.record(
                    index,
                    Verdict::Fail(FailureKind::WrongFaultKind),
                    Some(fault.message()),
                )
            }
        }
    }

    #[must_use]
    pub fn total_tests(&self) -> u64 {
        self.counts.total
    }

    #[must_use]
    pub fn good_tests(&self) -> u64 {
        self.counts.passed
    }

    #[must_use]
    pub fn bad_tests(&self) -> u64 {
        self.counts.failed
    }

    #[must_use]
    pub fn skipped_tests(&self) -> u64 {
        self.counts.skipped
    }

    /// Snapshot of the current tally.
    #[must_use]
    pub fn summary(&self) -> Summary {
        self.counts
    }

    /// Write the summary to the harness output (and log, if attached).
    pub fn results(&mut self) {
        let summary = self.counts;
        // Output is informational only.
        let _ = write!(self.out, "\n{}", summary.render_plain());
        let _ = self.out.flush();

        if let Some(log) = self.log.as_mut() {
            let level = if summary.all_passed() {
                LogLevel::Info
            } else {
                LogLevel::Warn
            };
            let details = serde_json::to_value(summary).unwrap_or_default();
            let _ = log.emit_entry(LogEntry::new("", level, "summary").with_details(details));
            let _ = log.flush();
        }
    }

    fn record(&mut self, index: u64, verdict: Verdict, detail: Option<String>) -> Verdict {
        match verdict {
            Verdict::Pass => self.counts.passed += 1,
            Verdict::Fail(_) => self.counts.failed += 1,
            Verdict::Skipped => {}
        }

        if let Some(log) = self.log.as_mut() {
            let level = if verdict.is_fail() {
                LogLevel::Warn
            } else {
                LogLevel::Info
            };
            let mut entry = LogEntry::new("", level, "assertion").with_verdict(verdict);
            if verdict != Verdict::Skipped {
                entry = entry.with_assertion(index);
            }
            if let Some(detail) = detail {
                entry = match verdict.failure_kind() {
                    Some(FailureKind::UnexpectedFault | FailureKind::WrongFaultKind) => {
                        entry.with_fault(detail)
                    }
                    _ => entry.with_details(serde_json::Value::String(detail)),
                };
            }
            // Log failures never affect the tally.
            let _ = log.emit_entry(entry);
        }

        verdict
    }

    fn progress(&mut self, marker: fmt::Arguments<'_>) {
        if self.config.progress {
            let _ = self.out.write_fmt(marker);
        }
    }
}

impl fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHarness")
            .field("counts", &self.counts)
            .field("config", &self.config)
            .field("logging", &self.log.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SharedBuffer;
    use crate::config::FaultSupport;
    use crate::fault::raise;

    #[derive(Debug)]
    struct RangeFault;

    #[derive(Debug)]
    struct LengthFault;

    fn quiet_harness() -> (TestHarness, SharedBuffer) {
        let out = SharedBuffer::new();
        let harness = TestHarness::new().with_output(out.clone());
        (harness, out)
    }

    #[test]
    fn accessors_are_zero_before_init() {
        let (harness, _) = quiet_harness();
        assert_eq!(harness.total_tests(), 0);
        assert_eq!(harness.good_tests(), 0);
        assert_eq!(harness.bad_tests(), 0);
        assert_eq!(harness.skipped_tests(), 0);
    }

    #[test]
    fn returns_scenario_counts_pass_then_fail() {
        let (mut h, out) = quiet_harness();
        h.init();
        assert_eq!(h.assert_returns(|| 5, 5), Verdict::Pass);
        assert_eq!((h.good_tests(), h.bad_tests(), h.total_tests()), (1, 0, 1));
        assert_eq!(
            h.assert_returns(|| 4, 5),
            Verdict::Fail(FailureKind::ValueMismatch)
        );
        assert_eq!((h.good_tests(), h.bad_tests(), h.total_tests()), (1, 1, 2));
        assert_eq!(out.contents(), "..(2)");
    }

    #[test]
    #[cfg(feature = "fault-signaling")]
    fn returns_converts_fault_into_failure() {
        let (mut h, out) = quiet_harness();
        h.init();
        let verdict = h.assert_returns(|| -> i32 { raise(RangeFault) }, 1);
        assert_eq!(verdict, Verdict::Fail(FailureKind::UnexpectedFault));
        assert_eq!(h.bad_tests(), 1);
        assert_eq!(h.good_tests(), 0);
        assert_eq!(out.contents(), ".(e1)");
    }

    #[test]
    #[cfg(feature = "fault-signaling")]
    fn throws_scenario_matches_kinds() {
        let (mut h, out) = quiet_harness();
        h.init();
        assert_eq!(h.assert_throws::<RangeFault, _, _>(|| raise(RangeFault)), Verdict::Pass);
        assert_eq!(h.good_tests(), 1);
        assert_eq!(
            h.assert_throws::<RangeFault, _, _>(|| 42),
            Verdict::Fail(FailureKind::UnexpectedSuccess)
        );
        assert_eq!(
            h.assert_throws::<RangeFault, _, _>(|| raise(LengthFault)),
            Verdict::Fail(FailureKind::WrongFaultKind)
        );
        assert_eq!((h.good_tests(), h.bad_tests(), h.total_tests()), (1, 2, 3));
        assert_eq!(out.contents(), "..N 2.(e 3)");
    }

    #[test]
    fn init_discards_prior_tally() {
        let (mut h, _) = quiet_harness();
        h.init();
        h.assert_returns(|| true, false);
        h.assert_returns(|| 'x', 'x');
        h.init();
        assert_eq!(h.summary(), Summary::default());
        h.init();
        assert_eq!(h.total_tests(), 0);
    }

    #[test]
    fn disabled_faults_skip_throws_without_invoking() {
        let out = SharedBuffer::new();
        let config = HarnessConfig::default().with_faults(FaultSupport::Disabled);
        let mut h = TestHarness::with_config(config).with_output(out.clone());
        h.init();
        let mut invoked = false;
        let verdict = h.assert_throws::<RangeFault, _, _>(|| invoked = true);
        assert_eq!(verdict, Verdict::Skipped);
        assert!(!invoked);
        assert_eq!(h.total_tests(), 0);
        assert_eq!(h.skipped_tests(), 1);
        assert_eq!(h.assert_returns(|| 2 + 2, 4), Verdict::Pass);
        assert_eq!(h.total_tests(), 1);
        assert_eq!(out.contents(), "s.");
    }

    #[test]
    #[cfg(feature = "fault-signaling")]
    fn runtime_disabled_faults_still_catch_returns() {
        let out = SharedBuffer::new();
        let config = HarnessConfig::default().with_faults(FaultSupport::Disabled);
        let mut h = TestHarness::with_config(config).with_output(out.clone());
        h.init();
        let verdict = h.assert_returns(|| -> i32 { raise(RangeFault) }, 1);
        assert_eq!(verdict, Verdict::Fail(FailureKind::UnexpectedFault));
        assert_eq!(h.bad_tests(), 1);
        assert_eq!(h.total_tests(), h.good_tests() + h.bad_tests());
        assert_eq!(out.contents(), ".(e1)");
    }

    /// Equality that faults.
    #[derive(Debug)]
    struct Touchy;

    impl PartialEq for Touchy {
        fn eq(&self, _other: &Self) -> bool {
            panic!("touchy comparison")
        }
    }

    /// Never equal, and faults when formatted.
    struct Opaque;

    impl PartialEq for Opaque {
        fn eq(&self, _other: &Self) -> bool {
            false
        }
    }

    impl fmt::Debug for Opaque {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("opaque formatting")
        }
    }

    #[test]
    #[cfg(feature = "fault-signaling")]
    fn faulting_comparison_counts_as_failure() {
        let (mut h, _) = quiet_harness();
        h.init();
        let verdict = h.assert_returns(|| Touchy, Touchy);
        assert_eq!(verdict, Verdict::Fail(FailureKind::UnexpectedFault));
        let verdict = h.assert_returns(|| Opaque, Opaque);
        assert_eq!(verdict, Verdict::Fail(FailureKind::UnexpectedFault));
        assert_eq!((h.good_tests(), h.bad_tests(), h.total_tests()), (0, 2, 2));
    }

    #[test]
    fn progress_can_be_silenced() {
        let out = SharedBuffer::new();
        let config = HarnessConfig::default().with_progress(false);
        let mut h = TestHarness::with_config(config).with_output(out.clone());
        h.assert_returns(|| 1, 2);
        assert!(out.is_empty());
        h.results();
        assert!(out.contents().contains("failed:  1"));
    }

    #[test]
    fn results_prints_summary_after_markers() {
        let (mut h, out) = quiet_harness();
        h.init();
        h.assert_returns(|| "a", "a");
        h.results();
        let text = out.contents();
        assert!(text.starts_with(".\nTest results:"));
        assert!(text.contains("total:   1"));
        assert!(text.contains("passed:  1"));
    }
}
