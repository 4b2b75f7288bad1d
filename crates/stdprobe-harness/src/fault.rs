//! Typed faults raised by operations under test.
//!
//! A fault is an unwinding panic whose payload carries a value; the fault's
//! kind is the payload's Rust type. [`raise`] signals one, [`catch_fault`]
//! turns one back into a value the harness can classify.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// True when this build can catch faults (the `fault-signaling` feature).
pub const FAULT_SIGNALING_COMPILED: bool = cfg!(feature = "fault-signaling");

/// Signal a fault of kind `E`.
pub fn raise<E: Any + Send>(fault: E) -> ! {
    panic::panic_any(fault)
}

/// Run `operation`, capturing a fault instead of unwinding past the caller.
pub fn catch_fault<T, F>(operation: F) -> Result<T, FaultPayload>
where
    F: FnOnce() -> T,
{
    // The operation is consumed; nothing observes it after a fault.
    panic::catch_unwind(AssertUnwindSafe(operation)).map_err(FaultPayload::new)
}

/// The payload of a captured fault.
pub struct FaultPayload {
    payload: Box<dyn Any + Send>,
}

impl FaultPayload {
    #[must_use]
    pub fn new(payload: Box<dyn Any + Send>) -> Self {
        Self { payload }
    }

    /// Returns true if the fault is of kind `E`.
    #[must_use]
    pub fn is<E: Any>(&self) -> bool {
        self.payload.is::<E>()
    }

    #[must_use]
    pub fn downcast_ref<E: Any>(&self) -> Option<&E> {
        self.payload.downcast_ref::<E>()
    }

    /// Render the payload for diagnostics.
    ///
    /// `panic!` payloads (`&'static str` / `String`) render verbatim; other
    /// kinds render as a fixed placeholder.
    #[must_use]
    pub fn message(&self) -> String {
        if let Some(msg) = self.payload.downcast_ref::<String>() {
            return msg.clone();
        }
        if let Some(msg) = self.payload.downcast_ref::<&'static str>() {
            return (*msg).to_string();
        }
        "<non-string fault payload>".to_string()
    }

    #[must_use]
    pub fn into_inner(self) -> Box<dyn Any + Send> {
        self.payload
    }
}

impl fmt::Debug for FaultPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultPayload")
            .field("message", &self.message())
            .finish()
    }
}
