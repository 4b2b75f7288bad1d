//! Assertion-counting test harness for standard library smoke programs.
//!
//! This crate provides:
//! - [`TestHarness`]: running pass/fail tallies plus the `assert_returns` /
//!   `assert_throws` primitives
//! - Fault signaling: typed panics raised by code under test ([`fault`])
//! - Configuration: compile-time and env-driven fault support ([`config`])
//! - Structured JSONL logging of assertion events ([`structured_log`])
//! - Summary reports in plain text and JSON ([`report`])

#![forbid(unsafe_code)]

pub mod capture;
pub mod config;
pub mod error;
pub mod fault;
pub mod harness;
pub mod report;
pub mod structured_log;
pub mod verdict;

pub use config::{FaultSupport, HarnessConfig};
pub use error::HarnessError;
pub use fault::{FaultPayload, catch_fault, raise};
pub use harness::TestHarness;
pub use report::Summary;
pub use verdict::{FailureKind, Verdict};
