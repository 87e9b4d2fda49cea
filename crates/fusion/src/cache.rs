//! Decision cache abstraction.
//!
//! The backing store is pluggable; the engine treats every cache error
//! as a miss and recomputes, so callers never see cache failures.

use adaptix_core::{Decision, DecisionRequest};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Errors raised by a cache backend.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backing store is unreachable or misbehaving
    #[error("cache backend error: {0}")]
    Backend(String),
}

/// Pluggable decision cache.
#[async_trait]
pub trait DecisionCache: Send + Sync {
    /// Look up a cached decision.
    async fn get(&self, key: &str) -> Result<Option<Decision>, CacheError>;

    /// Store a decision with a TTL.
    async fn set(&self, key: &str, decision: Decision, ttl: Duration) -> Result<(), CacheError>;
}

/// Deterministic cache key for a decision request.
///
/// Sorted context keys, sorted metric name:value pairs and the priority
/// go into the digest, so two requests with identical inputs share an
/// entry regardless of map iteration order.
pub fn fingerprint(request: &DecisionRequest) -> String {
    let mut context: Vec<_> = request
        .context
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    context.sort();

    let mut metrics: Vec<_> = request
        .real_time_metrics
        .iter()
        .map(|(k, v)| format!("{k}:{v:.6}"))
        .collect();
    metrics.sort();

    let canonical = format!(
        "ctx[{}]|metrics[{}]|priority:{}",
        context.join(","),
        metrics.join(","),
        request.priority
    );

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("decision:{:016x}", hasher.finish())
}

/// In-memory TTL cache.
///
/// Entries expire purely by TTL; expired entries are dropped lazily on
/// read and swept opportunistically on write.
pub struct InMemoryDecisionCache {
    entries: Arc<Mutex<HashMap<String, (Decision, Instant)>>>,
}

impl InMemoryDecisionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryDecisionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DecisionCache for InMemoryDecisionCache {
    async fn get(&self, key: &str) -> Result<Option<Decision>, CacheError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((decision, expires)) if *expires > Instant::now() => Ok(Some(decision.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, decision: Decision, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (decision, now + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::RecommendedAction;

    fn request_with(priority: u8, cpu: f64) -> DecisionRequest {
        let mut request = DecisionRequest {
            priority,
            ..Default::default()
        };
        request
            .real_time_metrics
            .insert("cpu_usage".to_string(), cpu);
        request
            .context
            .insert("service".to_string(), "api".to_string());
        request
    }

    #[test]
    fn fingerprint_is_stable_for_identical_inputs() {
        assert_eq!(
            fingerprint(&request_with(5, 0.5)),
            fingerprint(&request_with(5, 0.5))
        );
    }

    #[test]
    fn fingerprint_varies_with_priority_and_metrics() {
        let base = fingerprint(&request_with(5, 0.5));
        assert_ne!(base, fingerprint(&request_with(6, 0.5)));
        assert_ne!(base, fingerprint(&request_with(5, 0.6)));
    }

    #[tokio::test]
    async fn entries_expire_by_ttl() {
        let cache = InMemoryDecisionCache::new();
        let decision = Decision::new(RecommendedAction::Maintain, 0.5);
        cache
            .set("k", decision, Duration::from_millis(10))
            .await
            .unwrap();
        assert!(cache.get("k").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(cache.get("k").await.unwrap().is_none());
    }
}
