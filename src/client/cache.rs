use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;

struct Entry {
    value: Value,
    fetched_at: Instant,
}

/// Response cache keyed by request path. Entries younger than `stale_time`
/// are served without a request; mutations drop keys by prefix.
pub struct RequestCache {
    stale_time: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl RequestCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// The cached value, unless missing or stale.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.fetched_at.elapsed() < self.stale_time)
            .map(|e| e.value.clone())
    }

    /// Stores `value` and drops every entry that has gone stale.
    pub async fn put(&self, key: impl Into<String>, value: Value) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.fetched_at.elapsed() < self.stale_time);
        entries.insert(
            key.into(),
            Entry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drops every key starting with one of `prefixes`.
    pub async fn invalidate(&self, prefixes: &[&str]) {
        self.entries
            .write()
            .await
            .retain(|key, _| !prefixes.iter().any(|p| key.starts_with(p)));
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn fresh_entries_are_served() {
        let cache = RequestCache::new(Duration::from_secs(60));
        cache.put("/api/recipes?page=1", json!({"n": 1})).await;
        assert_eq!(cache.get("/api/recipes?page=1").await, Some(json!({"n": 1})));
        assert_eq!(cache.get("/api/recipes?page=2").await, None);
    }

    #[tokio::test]
    async fn zero_stale_time_disables_reuse() {
        let cache = RequestCache::new(Duration::ZERO);
        cache.put("/api/recipes", json!([])).await;
        assert_eq!(cache.get("/api/recipes").await, None);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn entries_go_stale() {
        let cache = RequestCache::new(Duration::from_millis(20));
        cache.put("/api/meal-plan", json!({})).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("/api/meal-plan").await, None);
    }

    #[tokio::test]
    async fn stale_entries_are_evicted_on_put() {
        let cache = RequestCache::new(Duration::from_millis(20));
        cache.put("/api/recipes?search=a", json!(1)).await;
        cache.put("/api/recipes?search=ab", json!(2)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        cache.put("/api/recipes?search=abc", json!(3)).await;
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("/api/recipes?search=abc").await, Some(json!(3)));
    }

    #[tokio::test]
    async fn invalidation_is_by_prefix() {
        let cache = RequestCache::new(Duration::from_secs(60));
        cache.put("/api/recipes?page=1", json!(1)).await;
        cache.put("/api/recipes/abc", json!(2)).await;
        cache.put("/api/meal-plan?week_start_date=2024-01-01", json!(3)).await;
        cache.put("/api/shopping-lists", json!(4)).await;

        cache.invalidate(&["/api/recipes", "/api/meal-plan"]).await;
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("/api/shopping-lists").await.is_some());

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
