//! Per-channel bounded message history.
//!
//! Each channel owns a [`HistoryBuffer`] of at most [`HISTORY_CAPACITY`] messages in
//! arrival order; appending at capacity evicts the oldest first. Buffers live behind a
//! per-channel mutex so operations on one channel are serialized while different
//! channels proceed independently.
//!
//! The trigger message that asks for a summary is never appended, so "last N excluding
//! the trigger" is a single [`HistoryStore::take_last`] under the channel lock.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::types::BufferedMessage;

/// Messages kept per channel.
pub const HISTORY_CAPACITY: usize = 500;

/// Bounded FIFO of one channel's messages.
#[derive(Debug)]
pub struct HistoryBuffer {
    capacity: usize,
    messages: VecDeque<BufferedMessage>,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Appends at the tail, evicting the head when full.
    pub fn push(&mut self, message: BufferedMessage) {
        if self.capacity == 0 {
            return;
        }
        if self.messages.len() >= self.capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    /// Last `min(n, len)` messages, oldest first.
    pub fn last(&self, n: usize) -> Vec<BufferedMessage> {
        let skip = self.messages.len().saturating_sub(n);
        self.messages.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// All channels' buffers.
pub struct HistoryStore {
    capacity: usize,
    buffers: RwLock<HashMap<String, Arc<Mutex<HistoryBuffer>>>>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            buffers: RwLock::new(HashMap::new()),
        }
    }

    async fn buffer(&self, channel_id: &str) -> Arc<Mutex<HistoryBuffer>> {
        if let Some(buf) = self.buffers.read().await.get(channel_id) {
            return Arc::clone(buf);
        }
        let mut buffers = self.buffers.write().await;
        Arc::clone(
            buffers
                .entry(channel_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(HistoryBuffer::new(self.capacity)))),
        )
    }

    /// Appends to the channel's buffer, creating it on first use.
    pub async fn append(&self, channel_id: &str, message: BufferedMessage) {
        let buf = self.buffer(channel_id).await;
        buf.lock().await.push(message);
    }

    /// Last `min(n, len)` messages of the channel, oldest first. Unknown channel yields empty.
    pub async fn take_last(&self, channel_id: &str, n: usize) -> Vec<BufferedMessage> {
        let buf = match self.buffers.read().await.get(channel_id) {
            Some(buf) => Arc::clone(buf),
            None => return Vec::new(),
        };
        let guard = buf.lock().await;
        guard.last(n)
    }

    pub async fn len(&self, channel_id: &str) -> usize {
        let buf = match self.buffers.read().await.get(channel_id) {
            Some(buf) => Arc::clone(buf),
            None => return 0,
        };
        let len = buf.lock().await.len();
        len
    }
}
