//! history.rs — bounded in-memory log of recent pipeline verdicts.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pipeline::Verdict;
use crate::social::Post;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub ts: DateTime<Utc>,
    pub post_id: String,
    pub author: String,
    pub verdict: Verdict,
}

#[derive(Debug)]
pub struct History {
    inner: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl History {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Vec::with_capacity(cap.min(10_000))),
            cap: cap.min(10_000),
        }
    }

    pub fn push(&self, post: &Post, verdict: Verdict, ts: DateTime<Utc>) {
        let entry = HistoryEntry {
            ts,
            post_id: post.id.0.clone(),
            author: post.author_screen_name.clone(),
            verdict,
        };

        let mut v = self.inner.lock().expect("history mutex poisoned");
        v.push(entry);
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    pub fn snapshot_last_n(&self, n: usize) -> Vec<HistoryEntry> {
        let v = self.inner.lock().expect("history mutex poisoned");
        let start = v.len().saturating_sub(n);
        v[start..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
