use std::collections::HashMap;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    fresh: bool,
}

/// Holds values that may be needed many times during a session.
///
/// Values do not expire by themselves: the owner marks them stale with
/// `timeout`. A stale value is kept but is not handed out anymore.
#[derive(Debug, Clone)]
pub struct Cache<V> {
    entries: HashMap<String, CacheEntry<V>>,
}

impl<V> Cache<V> {
    pub fn new() -> Cache<V> {
        Cache {
            entries: HashMap::new(),
        }
    }

    /// True if there is a fresh value under this name.
    pub fn is_fresh(&self, name: &str) -> bool {
        self.entries.get(name).map(|e| e.fresh).unwrap_or(false)
    }

    /// Stores the value and marks it fresh.
    pub fn set(&mut self, name: &str, value: V) {
        self.entries
            .insert(name.to_string(), CacheEntry { value, fresh: true });
    }

    /// The value under this name, if it is fresh.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries
            .get(name)
            .filter(|e| e.fresh)
            .map(|e| &e.value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut V> {
        self.entries
            .get_mut(name)
            .filter(|e| e.fresh)
            .map(|e| &mut e.value)
    }

    /// Marks the value stale. Does nothing if the name was never set.
    pub fn timeout(&mut self, name: &str) {
        if let Some(e) = self.entries.get_mut(name) {
            e.fresh = false;
        }
    }

    pub fn timeout_all(&mut self) {
        for e in self.entries.values_mut() {
            e.fresh = false;
        }
    }
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self::new()
    }
}
