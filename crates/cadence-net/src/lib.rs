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

//! # Cadence Net
//!
//! The network state channel: receives serialized simulation snapshots on
//! an independent asynchronous timeline and hands the newest one to the
//! frame producer through a non-blocking, latest-wins mailbox. Also carries
//! interpolation support over the two most recent snapshots, so consumers
//! can sample state at frame timestamps between deliveries.

pub mod channel;
pub mod interp;
pub mod wire;

pub use channel::{NetChannel, StateFeed};
pub use interp::{Interpolate, SnapshotHistory};
pub use wire::{decode_snapshot, encode_snapshot, WireError};
