use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// What happens to queries under a filtered domain, from most permissive to
/// most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Pass = 0,
    /// Resolve normally, but clone the query to the trace server.
    Trace = 1,
    /// Answer the warning redirect address.
    Warning = 2,
    /// Answer the stop redirect address.
    Stop = 3,
    /// Answer REFUSED.
    Reject = 4,
}

impl FilterMode {
    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "pass" => Some(Self::Pass),
            "trace" => Some(Self::Trace),
            "warning" => Some(Self::Warning),
            "stop" => Some(Self::Stop),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn to_num(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
    #[serde(flatten)]
    pub inner: BTreeMap<String, FilterMode>,
}

impl Config {
    pub fn build(self) -> FilterStore {
        let store = FilterStore::default();
        for (domain, mode) in self.inner {
            store.set(&domain, mode);
        }
        store
    }
}

/// Domain filters with label-wise suffix matching.
#[derive(Debug, Default)]
pub struct FilterStore {
    inner: RwLock<HashMap<String, FilterMode>>,
}

impl FilterStore {
    pub fn set(&self, domain: &str, mode: FilterMode) {
        let mut inner = self.inner.write().expect("filter store lock");
        inner.insert(domain.to_lowercase(), mode);
    }

    /// Walks suffixes from the rightmost label towards the full name and
    /// returns the first non-PASS mode. An entry for `example.com` covers
    /// `blocked.example.com` but never `notexample.com`.
    pub fn evaluate(&self, domain: &str) -> FilterMode {
        let domain = domain.to_lowercase();
        let inner = self.inner.read().expect("filter store lock");
        let labels: Vec<&str> = domain.split('.').collect();
        for start in (0..labels.len()).rev() {
            let suffix = labels[start..].join(".");
            if let Some(mode) = inner.get(&suffix) {
                if *mode != FilterMode::Pass {
                    return *mode;
                }
            }
        }
        FilterMode::Pass
    }
}
