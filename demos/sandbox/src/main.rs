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

//! Drives the frame core against the in-memory backend: a background
//! producer streams simulation snapshots over the state channel while the
//! main thread records shadow/lighting/present frames, interpolating state
//! between deliveries. Finishes with a span report from the telemetry
//! store.

use anyhow::Result;
use cadence_core::pass::{ResourceAccess, WorkToken};
use cadence_core::resource::ResourceKind;
use cadence_core::settings::CoreSettings;
use cadence_core::state::{Scalar, Snapshot, StateChannel};
use cadence_frame::{FrameCore, NullBackend};
use cadence_net::{Interpolate, NetChannel, SnapshotHistory, StateFeed};
use cadence_telemetry::{InMemorySpanStore, RecordingSink, SpanStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const FRAMES: u64 = 120;
const SNAPSHOT_INTERVAL: Duration = Duration::from_millis(4);

/// A point bouncing inside the unit box, as delivered by the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimState {
    x: Scalar,
    y: Scalar,
}

impl Interpolate for SimState {
    fn interpolate(&self, other: &Self, t: f64) -> Self {
        SimState {
            x: Scalar::lerp(self.x, other.x, t),
            y: Scalar::lerp(self.y, other.y, t),
        }
    }
}

/// Streams bouncing-point snapshots at its own cadence, decoupled from the
/// frame loop.
fn run_producer(feed: StateFeed, epoch: Instant) {
    let mut x = 0.25;
    let mut y = 0.5;
    let mut vx = 0.61;
    let mut vy = 0.47;
    let step = SNAPSHOT_INTERVAL.as_secs_f64();

    for sequence in 1.. {
        x += vx * step;
        y += vy * step;
        if !(0.0..=1.0).contains(&x) {
            x = x.clamp(0.0, 1.0);
            vx = -vx;
        }
        if !(0.0..=1.0).contains(&y) {
            y = y.clamp(0.0, 1.0);
            vy = -vy;
        }

        let snapshot = Snapshot::new(
            sequence,
            epoch.elapsed().as_micros() as u64,
            SimState {
                x: Scalar::new(x),
                y: Scalar::new(y),
            },
        );
        if let Err(err) = feed.send(&snapshot) {
            log::warn!("Snapshot #{sequence} not sent: {err}");
        }
        thread::sleep(SNAPSHOT_INTERVAL);
    }
}

fn main() -> Result<()> {
    env_logger::init();

    // The state channel lives on a tokio runtime; the frame loop stays on
    // the main thread.
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();
    let (channel, feed) = NetChannel::<SimState>::spawn();

    let epoch = Instant::now();
    thread::spawn(move || run_producer(feed, epoch));

    let backend = Arc::new(NullBackend::new());
    let store = Arc::new(InMemorySpanStore::new());
    let core_settings = CoreSettings {
        frames_in_flight: 2,
        resource_capacity: 64,
        ..CoreSettings::default()
    };
    let mut core = FrameCore::new(
        core_settings.clone(),
        backend.clone(),
        Arc::new(RecordingSink::new(store.clone())),
    );

    // Frame-local color targets are instanced per slot; depth is produced
    // and consumed within each frame.
    let depth = core.registry().create(ResourceKind::Image {
        width: 1024,
        height: 1024,
    })?;
    let mut color = Vec::new();
    for _ in 0..core_settings.frames_in_flight {
        color.push(core.registry().create(ResourceKind::Image {
            width: 1280,
            height: 720,
        })?);
    }

    let mut history = SnapshotHistory::new();
    for frame in 0..FRAMES {
        if let Some(snapshot) = channel.poll_latest() {
            history.push(snapshot);
        }
        // Never block on the simulation: sample whatever the history holds,
        // or skip state-driven work entirely before the first delivery.
        if let Some(state) = history.sample(epoch.elapsed().as_micros() as u64) {
            log::debug!(
                "frame {frame}: point at ({:.3}, {:.3})",
                state.x.value(),
                state.y.value()
            );
        }

        let slot = core.begin_frame()?;
        let target = color[slot.0];
        core.declare_pass("Shadow", vec![ResourceAccess::write(depth)], WorkToken(frame))?;
        core.declare_pass(
            "Lighting",
            vec![ResourceAccess::read(depth), ResourceAccess::write(target)],
            WorkToken(frame),
        )?;
        core.declare_pass("Present", vec![ResourceAccess::read(target)], WorkToken(frame))?;

        match core.end_frame() {
            Ok(handle) => log::trace!("frame {} in flight", handle.frame_index),
            Err(err) if err.is_recoverable() => {
                log::warn!("Recovering: {err}");
                core.reconfigure_surface(1280, 720);
            }
            Err(err) => return Err(err.into()),
        }
    }

    core.registry().retire(depth)?;
    core.wait_idle();
    channel.abort();

    println!("{}", store.report_json());
    log::info!(
        "Sandbox finished: {FRAMES} frames, {} spans recorded",
        store.len()
    );
    Ok(())
}
