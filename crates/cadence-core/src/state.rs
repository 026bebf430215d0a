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

//! Externally-sourced simulation state: snapshots and the latest-wins
//! mailbox that decouples state delivery from the frame cadence.
//!
//! The mailbox is a single slot rather than a queue: stale simulation state
//! is explicitly preferable to blocking the render cadence, so an unread
//! snapshot is simply replaced when a newer one arrives.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};
use std::sync::{Arc, Mutex};

/// An opaque, dimensionally-checked scalar quantity.
///
/// The arithmetic rules of the underlying unit system are supplied
/// externally; the core only moves these values around and interpolates
/// between them.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scalar(f64);

impl Scalar {
    /// Wraps a raw magnitude.
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// The raw magnitude.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Scales the quantity by a dimensionless factor.
    pub fn scale(&self, factor: f64) -> Self {
        Self(self.0 * factor)
    }

    /// Linear interpolation between two quantities, `t` in `[0, 1]`.
    pub fn lerp(a: Scalar, b: Scalar, t: f64) -> Self {
        Self(a.0 + (b.0 - a.0) * t)
    }
}

impl Add for Scalar {
    type Output = Scalar;

    fn add(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 + rhs.0)
    }
}

impl Sub for Scalar {
    type Output = Scalar;

    fn sub(self, rhs: Scalar) -> Scalar {
        Scalar(self.0 - rhs.0)
    }
}

impl Neg for Scalar {
    type Output = Scalar;

    fn neg(self) -> Scalar {
        Scalar(-self.0)
    }
}

/// An immutable, timestamped unit of externally-sourced simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    /// Producer-assigned sequence number, monotonic per producer.
    pub sequence: u64,
    /// Producer timestamp in microseconds on the producer's clock.
    pub timestamp_us: u64,
    /// The simulation state carried by this snapshot.
    pub state: T,
}

impl<T> Snapshot<T> {
    /// Creates a snapshot.
    pub fn new(sequence: u64, timestamp_us: u64, state: T) -> Self {
        Self {
            sequence,
            timestamp_us,
            state,
        }
    }
}

/// Non-blocking access to the newest snapshot received since the last poll.
pub trait StateChannel<T>: Send + Sync {
    /// Returns the newest snapshot received since the last call, or `None`
    /// if nothing arrived. Never blocks.
    fn poll_latest(&self) -> Option<Arc<Snapshot<T>>>;
}

/// A single-slot, latest-wins mailbox connecting an asynchronous producer to
/// the frame producer thread.
#[derive(Debug)]
pub struct StateMailbox<T> {
    latest: Mutex<Option<Arc<Snapshot<T>>>>,
}

impl<T> StateMailbox<T> {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
        }
    }

    /// Publishes a snapshot, replacing any unread one.
    ///
    /// A snapshot older than the one already waiting is discarded; reordered
    /// delivery must never roll state backwards.
    pub fn publish(&self, snapshot: Snapshot<T>) {
        match self.latest.lock() {
            Ok(mut slot) => {
                if let Some(waiting) = slot.as_ref() {
                    if snapshot.sequence < waiting.sequence {
                        log::debug!(
                            "Discarding out-of-order snapshot #{} (newer #{} already waiting)",
                            snapshot.sequence,
                            waiting.sequence
                        );
                        return;
                    }
                }
                *slot = Some(Arc::new(snapshot));
            }
            Err(_) => {
                log::error!("StateMailbox mutex poisoned; dropping snapshot.");
            }
        }
    }
}

impl<T> Default for StateMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync> StateChannel<T> for StateMailbox<T> {
    fn poll_latest(&self) -> Option<Arc<Snapshot<T>>> {
        match self.latest.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                log::error!("StateMailbox mutex poisoned; reporting no snapshot.");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_lerp_endpoints_and_midpoint() {
        let a = Scalar::new(2.0);
        let b = Scalar::new(6.0);
        assert_eq!(Scalar::lerp(a, b, 0.0), a);
        assert_eq!(Scalar::lerp(a, b, 1.0), b);
        assert_eq!(Scalar::lerp(a, b, 0.5), Scalar::new(4.0));
    }

    #[test]
    fn poll_is_empty_without_arrival() {
        let mailbox: StateMailbox<u32> = StateMailbox::new();
        assert!(mailbox.poll_latest().is_none());
    }

    #[test]
    fn second_poll_without_arrival_returns_nothing() {
        let mailbox = StateMailbox::new();
        mailbox.publish(Snapshot::new(1, 100, 42u32));

        let first = mailbox.poll_latest().expect("snapshot waiting");
        assert_eq!(first.state, 42);
        assert!(mailbox.poll_latest().is_none(), "no duplicate delivery");
    }

    #[test]
    fn latest_wins_between_polls() {
        let mailbox = StateMailbox::new();
        mailbox.publish(Snapshot::new(1, 100, "old"));
        mailbox.publish(Snapshot::new(2, 200, "new"));

        let got = mailbox.poll_latest().expect("snapshot waiting");
        assert_eq!(got.sequence, 2);
        assert_eq!(got.state, "new");
        assert!(mailbox.poll_latest().is_none());
    }

    #[test]
    fn out_of_order_publish_is_discarded() {
        let mailbox = StateMailbox::new();
        mailbox.publish(Snapshot::new(5, 500, "newer"));
        mailbox.publish(Snapshot::new(3, 300, "late"));

        let got = mailbox.poll_latest().expect("snapshot waiting");
        assert_eq!(got.sequence, 5);
        assert_eq!(got.state, "newer");
    }
}
