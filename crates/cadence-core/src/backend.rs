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

//! The device-submission seam.
//!
//! The frame core is polymorphic over the capability set
//! {submit, present, query-token-signaled}, so the same scheduling and
//! ordering logic runs against a real device or an in-memory fake.

use crate::error::{PresentError, SubmitError};
use crate::handle::SlotIndex;
use crate::pass::{Barrier, WorkToken};
use std::fmt;

/// A point on the device timeline the CPU can query or wait on.
///
/// Tokens are owned by the slot that produced them and are never shared
/// across slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncToken {
    /// The slot whose submission produced this token.
    pub slot: SlotIndex,
    /// Backend-assigned, monotonically increasing timeline value.
    pub value: u64,
}

impl fmt::Display for SyncToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token({}, #{})", self.slot, self.value)
    }
}

/// Returned by a successful submission; pairs the frame with its token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionHandle {
    /// Token signaling completion of the submitted work.
    pub token: SyncToken,
    /// The frame counter value the submission belonged to.
    pub frame_index: u64,
}

/// One ordered, fully resolved unit of the batch handed to the backend.
///
/// Barriers listed here must take effect before the item's work executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionItem {
    /// Name of the originating pass, for diagnostics and telemetry tags.
    pub pass_name: String,
    /// The opaque work payload declared by the pass.
    pub work: WorkToken,
    /// Barriers required before this item, in derivation order.
    pub barriers: Vec<Barrier>,
}

/// The ordered batch for one frame, produced by the submission engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmissionBatch {
    /// The frame counter value this batch belongs to.
    pub frame_index: u64,
    /// Items in execution order.
    pub items: Vec<SubmissionItem>,
}

/// The graphics API family a backend runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Vulkan.
    Vulkan,
    /// DirectX 12.
    Dx12,
    /// Metal.
    Metal,
    /// OpenGL / GLES.
    OpenGl,
    /// WebGPU.
    WebGpu,
    /// The in-memory fake used for tests and headless runs.
    Null,
}

/// The class of device a backend selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// A GPU integrated with the CPU.
    IntegratedGpu,
    /// A discrete GPU.
    DiscreteGpu,
    /// A GPU virtualized by a hypervisor.
    VirtualGpu,
    /// Software rasterization on the CPU.
    Cpu,
    /// The device class could not be determined.
    Unknown,
}

/// A description of the adapter a backend runs on, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendAdapterInfo {
    /// Human-readable adapter name.
    pub name: String,
    /// The graphics API family.
    pub backend: BackendKind,
    /// The class of device.
    pub device: DeviceKind,
}

/// The capability set the frame core requires from a device backend.
///
/// Implementations translate batches into device work and report completion
/// through [`SyncToken`]s. `wait_token` is the only operation the scheduler
/// blocks on; everything else must return promptly.
pub trait SubmissionBackend: Send + Sync + fmt::Debug + 'static {
    /// Issues the batch to the device in order, honoring each item's
    /// barriers, and returns the token that signals its completion.
    ///
    /// ## Errors
    /// * `SubmitError::SubmissionRejected` - the device reported an
    ///   unrecoverable error; the frame is lost and must not be retried.
    fn submit(&self, batch: &SubmissionBatch, slot: SlotIndex) -> Result<SyncToken, SubmitError>;

    /// Requests display of the slot's output resource.
    ///
    /// ## Errors
    /// * `PresentError::Stale` - the surface needs recreation; non-fatal.
    /// * `PresentError::Rejected` - the device failed presentation; fatal
    ///   for the frame.
    fn present(&self, slot: SlotIndex) -> Result<(), PresentError>;

    /// Non-blocking query: has the device reached this token?
    fn token_signaled(&self, token: SyncToken) -> bool;

    /// Blocks the calling thread until the device reaches this token.
    fn wait_token(&self, token: SyncToken);

    /// Rebuilds the presentation surface after a [`PresentError::Stale`].
    fn reconfigure_surface(&self, width: u32, height: u32);

    /// Describes the adapter this backend runs on.
    fn adapter_info(&self) -> BackendAdapterInfo;
}
