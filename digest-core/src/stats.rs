//! In-memory request counters. Reset on restart.

use std::collections::BTreeMap;
use std::fmt::Write;

use tokio::sync::Mutex;

/// Kind of counted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Summary,
    Ask,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub total: u64,
    pub per_channel: BTreeMap<String, u64>,
    pub ask_per_channel: BTreeMap<String, u64>,
}

impl StatsSnapshot {
    /// HTML report for `/status`.
    pub fn render(&self) -> String {
        let mut out = format!("<b>Bot statistics</b>\n\nTotal requests: {}\n", self.total);
        if !self.per_channel.is_empty() {
            out.push_str("\n<b>Requests per chat:</b>\n");
            for (channel, count) in &self.per_channel {
                let _ = writeln!(out, "{}: {}", channel, count);
            }
        }
        if !self.ask_per_channel.is_empty() {
            out.push_str("\n<b>Ask requests per chat:</b>\n");
            for (channel, count) in &self.ask_per_channel {
                let _ = writeln!(out, "{}: {}", channel, count);
            }
        }
        out
    }
}

#[derive(Default)]
pub struct RequestStats {
    inner: Mutex<StatsSnapshot>,
}

impl RequestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request counts toward the total and its channel; asks are also counted separately.
    pub async fn increment(&self, channel_id: &str, kind: RequestKind) {
        let mut stats = self.inner.lock().await;
        stats.total += 1;
        *stats.per_channel.entry(channel_id.to_string()).or_default() += 1;
        if kind == RequestKind::Ask {
            *stats.ask_per_channel.entry(channel_id.to_string()).or_default() += 1;
        }
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().await.clone()
    }
}
