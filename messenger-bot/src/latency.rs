//! Per-sender reply latency window: the last 50 samples plus the most recent one.
//!
//! Samples are milliseconds from event receipt to a successful send. Process-local only.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

pub const WINDOW_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    pub last: u64,
    pub average: f64,
    pub samples: usize,
}

#[derive(Default)]
struct Window {
    samples: VecDeque<u64>,
    last: u64,
}

#[derive(Default)]
pub struct LatencyTracker {
    windows: Mutex<HashMap<String, Window>>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, sender_id: &str, latency_ms: u64) {
        let mut windows = self.windows.lock();
        let window = windows.entry(sender_id.to_string()).or_default();
        window.samples.push_back(latency_ms);
        if window.samples.len() > WINDOW_SIZE {
            window.samples.pop_front();
        }
        window.last = latency_ms;
    }

    /// `None` until the sender has at least one sample.
    pub fn stats(&self, sender_id: &str) -> Option<LatencyStats> {
        let windows = self.windows.lock();
        let window = windows.get(sender_id)?;
        if window.samples.is_empty() {
            return None;
        }
        let sum: u64 = window.samples.iter().sum();
        Some(LatencyStats {
            last: window.last,
            average: sum as f64 / window.samples.len() as f64,
            samples: window.samples.len(),
        })
    }
}
