//! Bounded decision history.
//!
//! Shared between the fusion engine (writer) and the feedback loop
//! (reader), each side holding its own `Arc`.

use adaptix_core::{Decision, DecisionId};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Fixed-size ring of recent decisions.
pub struct DecisionHistory {
    entries: Mutex<VecDeque<Decision>>,
    capacity: usize,
}

impl DecisionHistory {
    /// Create a history with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a decision, evicting the oldest on overflow.
    pub async fn push(&self, decision: Decision) {
        let mut entries = self.entries.lock().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(decision);
    }

    /// Find a decision by id.
    pub async fn find(&self, id: DecisionId) -> Option<Decision> {
        let entries = self.entries.lock().await;
        entries.iter().find(|d| d.id == id).cloned()
    }

    /// The most recent `n` decisions, newest first.
    pub async fn recent(&self, n: usize) -> Vec<Decision> {
        let entries = self.entries.lock().await;
        entries.iter().rev().take(n).cloned().collect()
    }

    /// Number of retained decisions.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the history is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adaptix_core::RecommendedAction;

    #[tokio::test]
    async fn history_evicts_oldest_on_overflow() {
        let history = DecisionHistory::new(2);
        let first = Decision::new(RecommendedAction::Maintain, 0.5);
        let first_id = first.id;
        history.push(first).await;
        history.push(Decision::new(RecommendedAction::Monitor, 0.6)).await;
        history.push(Decision::new(RecommendedAction::ScaleUp, 0.9)).await;

        assert_eq!(history.len().await, 2);
        assert!(history.find(first_id).await.is_none());
    }
}
