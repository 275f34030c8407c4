use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation: the server loop polls this once per datagram,
/// and anything holding a clone may trip it.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag {
    inner: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trip(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::ShutdownFlag;

    #[test]
    fn should_share_state_between_clones() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        assert!(!flag.is_tripped());
        other.trip();
        assert!(flag.is_tripped());
    }
}
