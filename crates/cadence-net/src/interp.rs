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

//! Interpolation over the two most recent snapshots.
//!
//! The core holds at most two snapshots; older ones are discarded as newer
//! ones arrive. Sampling between the retained pair lets consumers read
//! state at frame timestamps that fall between network deliveries.

use cadence_core::state::Snapshot;
use std::sync::Arc;

/// State that can be blended between two snapshots.
pub trait Interpolate {
    /// Returns the state `t` of the way from `self` to `other`, `t` in
    /// `[0, 1]`.
    fn interpolate(&self, other: &Self, t: f64) -> Self;
}

/// Retains the two most recent snapshots for interpolation.
#[derive(Debug)]
pub struct SnapshotHistory<T> {
    previous: Option<Arc<Snapshot<T>>>,
    latest: Option<Arc<Snapshot<T>>>,
}

impl<T> SnapshotHistory<T> {
    /// An empty history.
    pub fn new() -> Self {
        Self {
            previous: None,
            latest: None,
        }
    }

    /// Records a newly received snapshot, discarding all but the previous
    /// one. Snapshots not newer than the latest are dropped.
    pub fn push(&mut self, snapshot: Arc<Snapshot<T>>) {
        if let Some(latest) = &self.latest {
            if snapshot.sequence <= latest.sequence {
                log::debug!(
                    "Ignoring snapshot #{} (history already at #{})",
                    snapshot.sequence,
                    latest.sequence
                );
                return;
            }
        }
        self.previous = self.latest.take();
        self.latest = Some(snapshot);
    }

    /// The most recent snapshot, if any arrived yet.
    pub fn latest(&self) -> Option<&Arc<Snapshot<T>>> {
        self.latest.as_ref()
    }

    /// Whether two snapshots are retained, i.e. sampling can interpolate.
    pub fn can_interpolate(&self) -> bool {
        self.previous.is_some() && self.latest.is_some()
    }
}

impl<T: Interpolate + Clone> SnapshotHistory<T> {
    /// Samples state at `timestamp_us`.
    ///
    /// With two snapshots retained, the result is interpolated between them
    /// with the blend factor clamped to their timestamps; with one, that
    /// snapshot's state is reused as-is; with none, there is nothing to
    /// sample. The caller never blocks on delivery.
    pub fn sample(&self, timestamp_us: u64) -> Option<T> {
        match (&self.previous, &self.latest) {
            (Some(previous), Some(latest)) => {
                let span = latest.timestamp_us.saturating_sub(previous.timestamp_us);
                if span == 0 {
                    return Some(latest.state.clone());
                }
                let offset = timestamp_us.saturating_sub(previous.timestamp_us);
                let t = (offset as f64 / span as f64).clamp(0.0, 1.0);
                Some(previous.state.interpolate(&latest.state, t))
            }
            (None, Some(latest)) => Some(latest.state.clone()),
            _ => None,
        }
    }
}

impl<T> Default for SnapshotHistory<T> {
    fn default() -> Self {
        Self::new()
    }
}
