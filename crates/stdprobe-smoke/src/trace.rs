//! Shared event trace for smoke programs.

use std::cell::RefCell;
use std::rc::Rc;

/// Ordered log of constructions, prints and destructions.
///
/// Clones share the same underlying trace, so objects can hold a handle and
/// report their own drop.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Trace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, line: impl Into<String>) {
        self.lines.borrow_mut().push(line.into());
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Number of lines starting with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        self.lines
            .borrow()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_append_to_one_trace() {
        let trace = Trace::new();
        let handle = trace.clone();
        handle.push("base: construct a=0");
        trace.push("base: destroy");
        assert_eq!(trace.len(), 2);
        assert_eq!(handle.count("base:"), 2);
        assert_eq!(trace.count("sub:"), 0);
    }
}
