// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The receive side of the state channel.
//!
//! A tokio task drains wire frames from a flume channel, decodes them, and
//! publishes them into the latest-wins mailbox. The task runs on its own
//! timeline; the frame producer only ever calls the non-blocking
//! [`StateChannel::poll_latest`]. Malformed frames are absorbed and logged,
//! never surfaced to the producer thread.

use crate::wire::{decode_snapshot, encode_snapshot, WireError};
use cadence_core::state::{Snapshot, StateChannel, StateMailbox};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// The producer-facing handle: encodes snapshots onto the wire.
#[derive(Debug, Clone)]
pub struct StateFeed {
    sender: flume::Sender<Vec<u8>>,
}

impl StateFeed {
    /// Encodes and sends a snapshot. Delivery is fire-and-forget; a closed
    /// channel is reported so the producer can stop.
    pub fn send<T: Serialize>(&self, snapshot: &Snapshot<T>) -> Result<(), WireError> {
        let bytes = encode_snapshot(snapshot)?;
        if self.sender.send(bytes).is_err() {
            log::info!("State channel closed; snapshot not delivered.");
        }
        Ok(())
    }

    /// Sends pre-encoded wire bytes, e.g. straight from a socket.
    pub fn send_raw(&self, bytes: Vec<u8>) {
        if self.sender.send(bytes).is_err() {
            log::info!("State channel closed; raw frame not delivered.");
        }
    }
}

/// The consumer-facing handle over the decode task and mailbox.
#[derive(Debug)]
pub struct NetChannel<T> {
    mailbox: Arc<StateMailbox<T>>,
    task: JoinHandle<()>,
}

impl<T> NetChannel<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Spawns the decode task on the current tokio runtime and returns the
    /// channel plus the feed end.
    pub fn spawn() -> (Self, StateFeed) {
        let (sender, receiver) = flume::unbounded::<Vec<u8>>();
        let mailbox = Arc::new(StateMailbox::new());

        let task_mailbox = mailbox.clone();
        let task = tokio::spawn(async move {
            while let Ok(bytes) = receiver.recv_async().await {
                match decode_snapshot::<T>(&bytes) {
                    Ok(snapshot) => {
                        log::trace!("Snapshot #{} received", snapshot.sequence);
                        task_mailbox.publish(snapshot);
                    }
                    Err(err) => {
                        log::warn!("Dropping malformed state frame: {err}");
                    }
                }
            }
            log::info!("State channel feed closed; decode task exiting.");
        });

        (
            Self { mailbox, task },
            StateFeed { sender },
        )
    }

    /// Whether the decode task is still running.
    pub fn is_open(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the decode task without waiting for the feed to close.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl<T: Send + Sync> StateChannel<T> for NetChannel<T> {
    fn poll_latest(&self) -> Option<Arc<Snapshot<T>>> {
        self.mailbox.poll_latest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestState {
        tick: u32,
    }

    async fn settle() {
        // Give the decode task a chance to drain the feed.
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn delivers_newest_snapshot_once() {
        let (channel, feed) = NetChannel::<TestState>::spawn();

        feed.send(&Snapshot::new(1, 100, TestState { tick: 1 }))
            .unwrap();
        feed.send(&Snapshot::new(2, 200, TestState { tick: 2 }))
            .unwrap();
        settle().await;

        let got = channel.poll_latest().expect("snapshot delivered");
        assert_eq!(got.sequence, 2);
        assert_eq!(got.state, TestState { tick: 2 });
        assert!(
            channel.poll_latest().is_none(),
            "second poll without arrival returns nothing"
        );
    }

    #[tokio::test]
    async fn malformed_frames_are_absorbed() {
        let (channel, feed) = NetChannel::<TestState>::spawn();

        feed.send_raw(vec![0xde, 0xad]);
        feed.send(&Snapshot::new(7, 700, TestState { tick: 7 }))
            .unwrap();
        settle().await;

        let got = channel.poll_latest().expect("valid snapshot survives");
        assert_eq!(got.sequence, 7);
    }

    #[tokio::test]
    async fn task_exits_when_feed_drops() {
        let (channel, feed) = NetChannel::<TestState>::spawn();
        drop(feed);
        settle().await;
        assert!(!channel.is_open());
    }
}
