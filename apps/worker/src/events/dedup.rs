//! Concurrent-duplicate suppression.
//!
//! The guard holds the only shared mutable state across concurrent event
//! handlers: a set of active dedup keys. `try_acquire` is an atomic
//! check-and-insert; the returned `ActiveKey` removes its key on drop, so
//! the key is released no matter how the pipeline run ends.
//!
//! Process-local by design: a multi-instance deployment would need a
//! TTL-bound lease keyed by the same dedup key.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::events::messages::ReportType;

/// Builds the dedup key for a job/candidate pair, with the report type
/// folded in when a request names one.
pub fn dedup_key(job_id: &str, resume_id: &str, report_type: Option<ReportType>) -> String {
    match report_type {
        Some(kind) => format!("{job_id}:{resume_id}:{}", kind.as_str()),
        None => format!("{job_id}:{resume_id}"),
    }
}

#[derive(Clone, Default)]
pub struct DedupGuard {
    active: Arc<Mutex<HashSet<String>>>,
}

impl DedupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically marks a key active. Returns `None` if the key is already
    /// being processed — the caller drops the duplicate event.
    pub fn try_acquire(&self, key: &str) -> Option<ActiveKey> {
        let mut active = self.active.lock().expect("dedup lock poisoned");
        if !active.insert(key.to_string()) {
            return None;
        }
        Some(ActiveKey {
            key: key.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.lock().expect("dedup lock poisoned").contains(key)
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().expect("dedup lock poisoned").len()
    }
}

/// RAII handle for an acquired key. Dropping it releases the key.
pub struct ActiveKey {
    key: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl Drop for ActiveKey {
    fn drop(&mut self) {
        self.active
            .lock()
            .expect("dedup lock poisoned")
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_includes_report_type_when_present() {
        assert_eq!(dedup_key("j", "r", None), "j:r");
        assert_eq!(
            dedup_key("j", "r", Some(ReportType::FullReport)),
            "j:r:full-report"
        );
    }

    #[test]
    fn test_second_acquire_fails_while_active() {
        let guard = DedupGuard::new();
        let held = guard.try_acquire("j:r").unwrap();
        assert!(guard.try_acquire("j:r").is_none());
        assert!(guard.is_active("j:r"));
        drop(held);
        assert!(!guard.is_active("j:r"));
        assert!(guard.try_acquire("j:r").is_some());
    }

    #[test]
    fn test_distinct_keys_do_not_interfere() {
        let guard = DedupGuard::new();
        let _a = guard.try_acquire("j1:r1").unwrap();
        let _b = guard.try_acquire("j1:r2").unwrap();
        assert_eq!(guard.active_count(), 2);
    }

    #[test]
    fn test_key_released_even_on_panic() {
        let guard = DedupGuard::new();
        let inner = guard.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _held = inner.try_acquire("j:r").unwrap();
            panic!("pipeline blew up");
        }));
        assert!(result.is_err());
        assert!(!guard.is_active("j:r"));
    }

    #[tokio::test]
    async fn test_concurrent_acquire_admits_exactly_one() {
        let guard = DedupGuard::new();
        let mut handles = Vec::new();
        for _ in 0..16 {
            let guard = guard.clone();
            handles.push(tokio::spawn(async move {
                guard.try_acquire("j:r").map(std::mem::forget).is_some()
            }));
        }
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }
}
