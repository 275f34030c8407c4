use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A pending entry that never saw its reply is reclaimed after this long.
const STALE_AFTER: Duration = Duration::from_secs(30);

/// A client query waiting for its upstream reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub client: SocketAddr,
    pub original_id: u16,
    created: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    last_id: u16,
    pending: HashMap<u16, PendingQuery>,
}

/// Maps the transaction ids this server puts on forwarded queries back to
/// the clients waiting for them. Ids are claimed atomically with the entry
/// insertion, so the entry always exists before the datagram leaves.
#[derive(Debug, Default)]
pub struct ForwardTable {
    inner: Mutex<Inner>,
}

impl ForwardTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next free id (wrapping, never 0) and records the
    /// waiting client under it.
    pub fn claim(&self, client: SocketAddr, original_id: u16) -> u16 {
        let mut inner = self.inner.lock().expect("forward table lock");
        inner
            .pending
            .retain(|_, entry| entry.created.elapsed() < STALE_AFTER);
        // with stale entries swept the table is nowhere near 2^16 ids deep
        loop {
            inner.last_id = inner.last_id.wrapping_add(1);
            if inner.last_id != 0 && !inner.pending.contains_key(&inner.last_id) {
                break;
            }
        }
        let id = inner.last_id;
        inner.pending.insert(
            id,
            PendingQuery {
                client,
                original_id,
                created: Instant::now(),
            },
        );
        id
    }

    /// Removes and returns the entry for a reply id; a missing entry means
    /// the reply is unsolicited and gets dropped by the caller.
    pub fn take(&self, id: u16) -> Option<PendingQuery> {
        let mut inner = self.inner.lock().expect("forward table lock");
        inner.pending.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("forward table lock").pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::ForwardTable;
    use std::net::SocketAddr;

    fn client() -> SocketAddr {
        "192.168.1.20:51000".parse().unwrap()
    }

    #[test]
    fn should_hold_exactly_one_entry_per_claim() {
        let table = ForwardTable::new();
        let id = table.claim(client(), 0x1234);
        assert_eq!(id, 1);
        assert_eq!(table.len(), 1);

        let entry = table.take(id).unwrap();
        assert_eq!(entry.client, client());
        assert_eq!(entry.original_id, 0x1234);
        assert!(table.is_empty());
        // the reply consumed the entry for good
        assert!(table.take(id).is_none());
    }

    #[test]
    fn should_skip_zero_when_wrapping() {
        let table = ForwardTable::new();
        let mut last = 0u16;
        // enough claims to wrap the 16 bit id space once
        for _ in 0..0x10000 {
            last = table.claim(client(), 1);
            assert_ne!(last, 0);
            table.take(last);
        }
        // 0x10000 allocations skipped id 0 exactly once
        assert_eq!(last, 1);
    }

    #[test]
    fn should_skip_ids_still_in_flight() {
        let table = ForwardTable::new();
        let first = table.claim(client(), 1);
        let second = table.claim(client(), 2);
        assert_ne!(first, second);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn should_drop_unsolicited_ids() {
        let table = ForwardTable::new();
        assert!(table.take(0x4242).is_none());
    }
}
