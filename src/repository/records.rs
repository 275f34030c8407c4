use std::collections::{BTreeMap, HashMap};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::RwLock;

/// Time to live handed out with every locally generated answer.
pub const DEFAULT_TTL: u32 = 600;

/// One static binding: a domain may carry an IPv4 address, an IPv6 address,
/// or both. Binding the any-address marks a name as known-but-unresolvable.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RecordEntry {
    #[serde(default)]
    pub ipv4: Option<Ipv4Addr>,
    #[serde(default)]
    pub ipv6: Option<Ipv6Addr>,
    #[serde(default = "RecordEntry::default_ttl")]
    pub ttl: u32,
}

impl RecordEntry {
    fn default_ttl() -> u32 {
        DEFAULT_TTL
    }

    pub fn ipv4(addr: Ipv4Addr, ttl: u32) -> Self {
        Self {
            ipv4: Some(addr),
            ipv6: None,
            ttl,
        }
    }
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub inner: BTreeMap<String, RecordEntry>,
}

impl Config {
    pub fn build(self) -> RecordStore {
        let store = RecordStore::default();
        for (domain, entry) in self.inner {
            store.insert(&domain, entry);
        }
        store
    }
}

/// The static record table. Keys are case-insensitive; concurrent readers
/// and an occasional writer share it through a coarse lock.
#[derive(Debug, Default)]
pub struct RecordStore {
    inner: RwLock<HashMap<String, RecordEntry>>,
}

impl RecordStore {
    pub fn insert(&self, domain: &str, entry: RecordEntry) {
        let mut inner = self.inner.write().expect("record store lock");
        inner.insert(domain.to_lowercase(), entry);
    }

    pub fn bind_ipv4(&self, domain: &str, addr: Ipv4Addr, ttl: u32) {
        let mut inner = self.inner.write().expect("record store lock");
        let entry = inner
            .entry(domain.to_lowercase())
            .or_insert_with(|| RecordEntry {
                ipv4: None,
                ipv6: None,
                ttl,
            });
        entry.ipv4 = Some(addr);
        entry.ttl = ttl;
    }

    pub fn get(&self, domain: &str) -> Option<RecordEntry> {
        let inner = self.inner.read().expect("record store lock");
        inner.get(&domain.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("record store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordEntry, RecordStore};
    use std::net::Ipv4Addr;

    #[test]
    fn should_lookup_case_insensitive() {
        let store = RecordStore::default();
        store.insert("Printer.LAN", RecordEntry::ipv4(Ipv4Addr::new(10, 0, 0, 9), 60));
        let found = store.get("printer.lan").unwrap();
        assert_eq!(found.ipv4, Some(Ipv4Addr::new(10, 0, 0, 9)));
        assert!(store.get("scanner.lan").is_none());
    }

    #[test]
    fn should_rebind_existing_entry() {
        let store = RecordStore::default();
        store.bind_ipv4("host.lan", Ipv4Addr::new(10, 0, 0, 1), 60);
        store.bind_ipv4("host.lan", Ipv4Addr::new(10, 0, 0, 2), 60);
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get("host.lan").unwrap().ipv4,
            Some(Ipv4Addr::new(10, 0, 0, 2))
        );
    }
}
