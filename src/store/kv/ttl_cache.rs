use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// Thread-safe TTL-bounded cache, generalized from the single-purpose
/// ticker failure cache into the building block for every ephemeral key
/// the gate needs (previous decisions, cooldowns, daily counters).
pub struct TtlCache<V: Clone> {
    entries: DashMap<String, Entry<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if Utc::now() < entry.expires_at {
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    pub fn set(&self, key: &str, value: V, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Utc::now() + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_entries_are_treated_as_absent() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("a", 1, Duration::seconds(-1));
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn fresh_entries_are_returned() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("a", 42, Duration::hours(1));
        assert_eq!(cache.get("a"), Some(42));
    }
}
