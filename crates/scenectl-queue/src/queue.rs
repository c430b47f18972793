//! `RequestQueue`: bounded, multi-channel queue of render-touching
//! operations, drained only by [`crate::tick::TickExecutor`] (§4.6).

use std::collections::VecDeque;

use parking_lot::Mutex;
use scenectl_core::{CoreError, Envelope};
use serde_json::Value;
use tokio::sync::oneshot;

/// The four channels a `QueueEntry` can be submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Elements,
    Batches,
    Assets,
    Other,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::Elements => "elements",
            Channel::Batches => "batches",
            Channel::Assets => "assets",
            Channel::Other => "other",
        }
    }

    /// Fixed round-robin order the drain loop visits channels in.
    pub const ALL: [Channel; 4] = [Channel::Elements, Channel::Batches, Channel::Assets, Channel::Other];
}

/// One queued operation awaiting the next render tick.
pub struct QueueEntry {
    pub id: String,
    pub operation: String,
    pub payload: Value,
    pub result_tx: oneshot::Sender<Envelope>,
}

struct ChannelQueue {
    capacity: usize,
    entries: VecDeque<QueueEntry>,
}

pub struct RequestQueue {
    channels: Mutex<[ChannelQueue; 4]>,
}

impl RequestQueue {
    /// `capacity` bounds each channel independently; enqueue fails with
    /// `QUEUE_FULL` once a channel is at capacity rather than blocking.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new([
                ChannelQueue { capacity, entries: VecDeque::new() },
                ChannelQueue { capacity, entries: VecDeque::new() },
                ChannelQueue { capacity, entries: VecDeque::new() },
                ChannelQueue { capacity, entries: VecDeque::new() },
            ]),
        }
    }

    /// Enqueues an operation and returns its correlation id plus a one-shot
    /// receiver the caller awaits for the tick-produced result.
    pub fn enqueue(
        &self,
        channel: Channel,
        id: impl Into<String>,
        operation: impl Into<String>,
        payload: Value,
    ) -> Result<(String, oneshot::Receiver<Envelope>), CoreError> {
        let id = id.into();
        let (tx, rx) = oneshot::channel();
        let mut guard = self.channels.lock();
        let slot = &mut guard[channel as usize];
        if slot.entries.len() >= slot.capacity {
            return Err(CoreError::queue_full(channel.name()));
        }
        slot.entries.push_back(QueueEntry { id: id.clone(), operation: operation.into(), payload, result_tx: tx });
        Ok((id, rx))
    }

    /// Pops up to `budget` entries total, round-robining across channels in
    /// [`Channel::ALL`] order and preserving FIFO order within each channel.
    pub fn drain(&self, budget: usize) -> Vec<(Channel, QueueEntry)> {
        let mut drained = Vec::with_capacity(budget);
        let mut guard = self.channels.lock();
        'outer: loop {
            let mut made_progress = false;
            for channel in Channel::ALL {
                if drained.len() >= budget {
                    break 'outer;
                }
                if let Some(entry) = guard[channel as usize].entries.pop_front() {
                    drained.push((channel, entry));
                    made_progress = true;
                }
            }
            if !made_progress {
                break;
            }
        }
        drained
    }

    pub fn len(&self, channel: Channel) -> usize {
        self.channels.lock()[channel as usize].entries.len()
    }

    pub fn total_len(&self) -> usize {
        self.channels.lock().iter().map(|c| c.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_beyond_capacity_fails_with_queue_full() {
        let queue = RequestQueue::new(1);
        queue.enqueue(Channel::Elements, "r1", "add_element", serde_json::json!({})).unwrap();
        let err = queue.enqueue(Channel::Elements, "r2", "add_element", serde_json::json!({})).unwrap_err();
        assert_eq!(err.error_code(), "QUEUE_FULL");
    }

    #[test]
    fn drain_respects_global_budget_across_channels() {
        let queue = RequestQueue::new(10);
        for i in 0..3 {
            queue.enqueue(Channel::Elements, format!("e{i}"), "add_element", serde_json::json!({})).unwrap();
        }
        for i in 0..3 {
            queue.enqueue(Channel::Batches, format!("b{i}"), "add_batch", serde_json::json!({})).unwrap();
        }
        let drained = queue.drain(2);
        assert_eq!(drained.len(), 2);
        assert_eq!(queue.total_len(), 4);
    }

    #[test]
    fn drain_preserves_fifo_order_within_a_channel() {
        let queue = RequestQueue::new(10);
        queue.enqueue(Channel::Elements, "e1", "add_element", serde_json::json!({})).unwrap();
        queue.enqueue(Channel::Elements, "e2", "add_element", serde_json::json!({})).unwrap();
        let drained = queue.drain(1);
        assert_eq!(drained[0].1.id, "e1");
        let drained = queue.drain(1);
        assert_eq!(drained[0].1.id, "e2");
    }

    #[test]
    fn round_robins_across_channels_when_budget_allows() {
        let queue = RequestQueue::new(10);
        queue.enqueue(Channel::Elements, "e1", "add_element", serde_json::json!({})).unwrap();
        queue.enqueue(Channel::Batches, "b1", "add_batch", serde_json::json!({})).unwrap();
        queue.enqueue(Channel::Assets, "a1", "place_asset", serde_json::json!({})).unwrap();
        let drained = queue.drain(3);
        let order: Vec<&str> = drained.iter().map(|(_, e)| e.id.as_str()).collect();
        assert_eq!(order, vec!["e1", "b1", "a1"]);
    }
}
