//! `RequestTracker`: a bounded, insertion-ordered map from request id to a
//! snapshot of its lifecycle, with TTL-based expiry (§4.8).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use scenectl_core::Envelope;
use serde::Serialize;
use serde_json::Value;

/// A point-in-time copy of a tracked request. Mutating a snapshot never
/// affects tracker state.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSnapshot {
    pub id: String,
    pub payload: Value,
    pub submitted_at_ms: u64,
    pub completed: bool,
    pub completed_at_ms: Option<u64>,
    pub result: Option<Value>,
    pub error: Option<Envelope>,
}

struct Entry {
    snapshot: RequestSnapshot,
    submitted_at: Instant,
    completed_at: Option<Instant>,
}

impl Entry {
    fn reference_instant(&self) -> Instant {
        self.completed_at.unwrap_or(self.submitted_at)
    }
}

struct Inner {
    order: VecDeque<String>,
    entries: std::collections::HashMap<String, Entry>,
}

pub struct RequestTracker {
    max_entries: usize,
    ttl: Duration,
    inner: Mutex<Inner>,
    epoch: Instant,
}

impl RequestTracker {
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            max_entries,
            ttl,
            inner: Mutex::new(Inner { order: VecDeque::new(), entries: std::collections::HashMap::new() }),
            epoch: Instant::now(),
        }
    }

    fn millis_since_epoch(&self, instant: Instant) -> u64 {
        instant.saturating_duration_since(self.epoch).as_millis() as u64
    }

    pub fn add(&self, id: impl Into<String>, payload: Value) -> RequestSnapshot {
        let id = id.into();
        let now = Instant::now();
        let mut guard = self.inner.lock();
        self.prune_locked(&mut guard, now);

        let snapshot = RequestSnapshot {
            id: id.clone(),
            payload,
            submitted_at_ms: self.millis_since_epoch(now),
            completed: false,
            completed_at_ms: None,
            result: None,
            error: None,
        };
        guard.entries.insert(id.clone(), Entry { snapshot: snapshot.clone(), submitted_at: now, completed_at: None });
        guard.order.push_back(id);

        while guard.order.len() > self.max_entries {
            if let Some(oldest) = guard.order.pop_front() {
                guard.entries.remove(&oldest);
            }
        }

        snapshot
    }

    pub fn update(&self, id: &str, apply: impl FnOnce(&mut RequestSnapshot)) -> Option<RequestSnapshot> {
        let mut guard = self.inner.lock();
        self.prune_locked(&mut guard, Instant::now());
        let entry = guard.entries.get_mut(id)?;
        apply(&mut entry.snapshot);
        Some(entry.snapshot.clone())
    }

    pub fn mark_completed(&self, id: &str, result: Option<Value>, error: Option<Envelope>) -> Option<RequestSnapshot> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        self.prune_locked(&mut guard, now);
        let completed_at_ms = self.millis_since_epoch(now);
        let entry = guard.entries.get_mut(id)?;
        entry.completed_at = Some(now);
        entry.snapshot.completed = true;
        entry.snapshot.completed_at_ms = Some(completed_at_ms);
        entry.snapshot.result = result;
        entry.snapshot.error = error;
        Some(entry.snapshot.clone())
    }

    /// Returns the entry if live, dropping it from the tracker when expired
    /// unless `remove_if_expired` is false.
    pub fn get(&self, id: &str, remove_if_expired: bool) -> Option<RequestSnapshot> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let expired = match guard.entries.get(id) {
            Some(entry) => now.saturating_duration_since(entry.reference_instant()) > self.ttl,
            None => return None,
        };
        if expired {
            if remove_if_expired {
                guard.entries.remove(id);
                guard.order.retain(|existing| existing != id);
            }
            return None;
        }
        guard.entries.get(id).map(|entry| entry.snapshot.clone())
    }

    /// Removes and returns the entry, ignoring it (returning `None`) if it
    /// has already expired.
    pub fn pop(&self, id: &str) -> Option<RequestSnapshot> {
        let now = Instant::now();
        let mut guard = self.inner.lock();
        let entry = guard.entries.remove(id)?;
        guard.order.retain(|existing| existing != id);
        if now.saturating_duration_since(entry.reference_instant()) > self.ttl {
            return None;
        }
        Some(entry.snapshot)
    }

    /// Evicts every expired entry. Called internally on every mutation and
    /// exposed for periodic maintenance callers.
    pub fn prune(&self) {
        let mut guard = self.inner.lock();
        self.prune_locked(&mut guard, Instant::now());
    }

    fn prune_locked(&self, guard: &mut Inner, now: Instant) {
        let ttl = self.ttl;
        let expired: Vec<String> = guard
            .entries
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.reference_instant()) > ttl)
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            guard.entries.remove(&id);
        }
        guard.order.retain(|id| guard.entries.contains_key(id));
    }

    pub fn clear(&self) {
        let mut guard = self.inner.lock();
        guard.entries.clear();
        guard.order.clear();
    }

    pub fn len(&self) -> usize {
        let mut guard = self.inner.lock();
        self.prune_locked(&mut guard, Instant::now());
        guard.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread::sleep;

    #[test]
    fn add_then_get_round_trips() {
        let tracker = RequestTracker::new(10, Duration::from_secs(60));
        let snapshot = tracker.add("r1", serde_json::json!({"op": "add_element"}));
        assert_eq!(snapshot.id, "r1");
        assert!(!snapshot.completed);
        let fetched = tracker.get("r1", true).expect("present");
        assert_eq!(fetched.payload, serde_json::json!({"op": "add_element"}));
    }

    #[test]
    fn mark_completed_stamps_result_and_timestamp() {
        let tracker = RequestTracker::new(10, Duration::from_secs(60));
        tracker.add("r1", serde_json::json!({}));
        let snapshot = tracker.mark_completed("r1", Some(serde_json::json!({"id": "e1"})), None).unwrap();
        assert!(snapshot.completed);
        assert!(snapshot.completed_at_ms.is_some());
        assert_eq!(snapshot.result, Some(serde_json::json!({"id": "e1"})));
    }

    #[test]
    fn oldest_entry_evicted_when_over_capacity() {
        let tracker = RequestTracker::new(2, Duration::from_secs(60));
        tracker.add("r1", serde_json::json!({}));
        tracker.add("r2", serde_json::json!({}));
        tracker.add("r3", serde_json::json!({}));
        assert!(tracker.get("r1", true).is_none());
        assert!(tracker.get("r2", true).is_some());
        assert!(tracker.get("r3", true).is_some());
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn ttl_expiry_uses_completed_at_when_present() {
        let tracker = RequestTracker::new(10, Duration::from_millis(30));
        tracker.add("r1", serde_json::json!({}));
        sleep(Duration::from_millis(20));
        tracker.mark_completed("r1", None, None);
        sleep(Duration::from_millis(20));
        // completed_at resets the TTL clock, so the entry should still be live
        // (40ms since submission, but only 20ms since completion).
        assert!(tracker.get("r1", true).is_some());
    }

    #[test]
    fn expired_entry_is_dropped_on_access() {
        let tracker = RequestTracker::new(10, Duration::from_millis(10));
        tracker.add("r1", serde_json::json!({}));
        sleep(Duration::from_millis(25));
        assert!(tracker.get("r1", true).is_none());
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn pop_ignores_already_expired_entries() {
        let tracker = RequestTracker::new(10, Duration::from_millis(10));
        tracker.add("r1", serde_json::json!({}));
        sleep(Duration::from_millis(25));
        assert!(tracker.pop("r1").is_none());
    }

    #[test]
    fn snapshots_are_independent_copies() {
        let tracker = RequestTracker::new(10, Duration::from_secs(60));
        let mut snapshot = tracker.add("r1", serde_json::json!({"a": 1}));
        snapshot.payload = serde_json::json!({"a": 2});
        let fetched = tracker.get("r1", true).unwrap();
        assert_eq!(fetched.payload, serde_json::json!({"a": 1}));
    }

    #[test]
    fn clear_removes_everything() {
        let tracker = RequestTracker::new(10, Duration::from_secs(60));
        tracker.add("r1", serde_json::json!({}));
        tracker.add("r2", serde_json::json!({}));
        tracker.clear();
        assert_eq!(tracker.len(), 0);
    }
}
