//! Cooperative cancellation for the provisioning pipeline.
//!
//! A clone of the token is handed to the signal handler; the pipeline checks
//! it before each network request and at each body write, so an abort takes
//! effect at the next blocking I/O boundary (never mid file write).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared abort flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request abort. The pipeline stops at its next cancellation point.
    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abort_visible_through_clones() {
        let token = AbortToken::new();
        let clone = token.clone();
        assert!(!token.is_aborted());
        clone.abort();
        assert!(token.is_aborted());
        assert!(clone.is_aborted());
    }
}
