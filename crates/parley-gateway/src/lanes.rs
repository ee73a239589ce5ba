// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat lanes: turns of one chat run one at a time, chats run in
//! parallel.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutex per chat id, created on first use and dropped when idle.
#[derive(Debug, Default)]
pub struct ChatLanes {
    lanes: DashMap<i64, Arc<Mutex<()>>>,
}

impl ChatLanes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the chat's lane. Holding the guard keeps other turns of
    /// the same chat waiting.
    pub async fn enter(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lane = self.lanes.entry(chat_id).or_default().clone();
        lane.lock_owned().await
    }

    /// Drops the chat's lane if no turn holds or awaits it.
    pub fn release(&self, chat_id: i64) {
        self.lanes
            .remove_if(&chat_id, |_, lane| Arc::strong_count(lane) == 1);
    }

    /// Number of chats with a live lane.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_chat_is_serialized() {
        let lanes = Arc::new(ChatLanes::new());
        let guard = lanes.enter(1).await;

        let waiter = {
            let lanes = Arc::clone(&lanes);
            tokio::spawn(async move {
                let _guard = lanes.enter(1).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn different_chats_do_not_block() {
        let lanes = ChatLanes::new();
        let _a = lanes.enter(1).await;
        let _b = tokio::time::timeout(Duration::from_secs(1), lanes.enter(2))
            .await
            .expect("other chat should not wait");
    }

    #[tokio::test]
    async fn idle_lane_is_released() {
        let lanes = ChatLanes::new();
        let guard = lanes.enter(7).await;
        lanes.release(7);
        assert_eq!(lanes.len(), 1);

        drop(guard);
        lanes.release(7);
        assert!(lanes.is_empty());
    }
}
