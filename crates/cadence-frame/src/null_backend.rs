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

//! An in-memory submission backend.
//!
//! Records every batch and presentation it receives and signals tokens
//! either immediately (`new`) or under test control (`manual`), so the
//! scheduler, engine, and registry are exercisable without a live device.

use cadence_core::backend::{
    BackendAdapterInfo, BackendKind, DeviceKind, SubmissionBackend, SubmissionBatch, SyncToken,
};
use cadence_core::error::{PresentError, SubmitError};
use cadence_core::handle::SlotIndex;
use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct NullState {
    next_token: u64,
    signaled: HashSet<u64>,
    submitted: Vec<(SlotIndex, SubmissionBatch)>,
    presented: Vec<SlotIndex>,
    reject_next_submit: Option<String>,
    stale_next_present: bool,
    surface: (u32, u32),
}

/// The in-memory fake device.
#[derive(Debug)]
pub struct NullBackend {
    state: Mutex<NullState>,
    signal: Condvar,
    auto_signal: bool,
}

impl NullBackend {
    /// A backend whose tokens signal the moment work is submitted.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NullState {
                surface: (640, 480),
                ..Default::default()
            }),
            signal: Condvar::new(),
            auto_signal: true,
        }
    }

    /// A backend whose tokens signal only when [`NullBackend::complete`] is
    /// called, for tests that control the device timeline.
    pub fn manual() -> Self {
        Self {
            auto_signal: false,
            ..Self::new()
        }
    }

    fn lock(&self) -> MutexGuard<'_, NullState> {
        // A poisoned lock only means a test thread panicked; the state
        // itself is still consistent for assertions.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Signals a token, waking any thread blocked in `wait_token`.
    pub fn complete(&self, token: SyncToken) {
        self.lock().signaled.insert(token.value);
        self.signal.notify_all();
    }

    /// Arranges for the next `submit` call to be rejected with the given
    /// device detail.
    pub fn reject_next_submit(&self, details: impl Into<String>) {
        self.lock().reject_next_submit = Some(details.into());
    }

    /// Arranges for the next `present` call to report a stale surface.
    pub fn stale_next_present(&self) {
        self.lock().stale_next_present = true;
    }

    /// Every batch submitted so far, with the slot it was submitted for.
    pub fn submitted(&self) -> Vec<(SlotIndex, SubmissionBatch)> {
        self.lock().submitted.clone()
    }

    /// Every slot presented so far.
    pub fn presented(&self) -> Vec<SlotIndex> {
        self.lock().presented.clone()
    }

    /// The current surface dimensions.
    pub fn surface_size(&self) -> (u32, u32) {
        self.lock().surface
    }
}

impl Default for NullBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionBackend for NullBackend {
    fn submit(&self, batch: &SubmissionBatch, slot: SlotIndex) -> Result<SyncToken, SubmitError> {
        let mut state = self.lock();
        if let Some(details) = state.reject_next_submit.take() {
            return Err(SubmitError::SubmissionRejected {
                slot,
                pass: batch.items.first().map(|item| item.pass_name.clone()),
                details,
            });
        }

        state.next_token += 1;
        let token = SyncToken {
            slot,
            value: state.next_token,
        };
        if self.auto_signal {
            state.signaled.insert(token.value);
        }
        state.submitted.push((slot, batch.clone()));
        log::trace!(
            "Null device accepted batch of {} items for {slot} -> {token}",
            batch.items.len()
        );
        Ok(token)
    }

    fn present(&self, slot: SlotIndex) -> Result<(), PresentError> {
        let mut state = self.lock();
        if state.stale_next_present {
            state.stale_next_present = false;
            return Err(PresentError::Stale { slot });
        }
        state.presented.push(slot);
        Ok(())
    }

    fn token_signaled(&self, token: SyncToken) -> bool {
        self.lock().signaled.contains(&token.value)
    }

    fn wait_token(&self, token: SyncToken) {
        let mut state = self.lock();
        while !state.signaled.contains(&token.value) {
            state = self
                .signal
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    fn reconfigure_surface(&self, width: u32, height: u32) {
        self.lock().surface = (width, height);
        log::debug!("Null surface reconfigured to {width}x{height}");
    }

    fn adapter_info(&self) -> BackendAdapterInfo {
        BackendAdapterInfo {
            name: "cadence-null".to_string(),
            backend: BackendKind::Null,
            device: DeviceKind::Cpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_signal_tokens_are_immediately_signaled() {
        let backend = NullBackend::new();
        let token = backend
            .submit(&SubmissionBatch::default(), SlotIndex(0))
            .unwrap();
        assert!(backend.token_signaled(token));
    }

    #[test]
    fn manual_tokens_signal_on_complete() {
        let backend = NullBackend::manual();
        let token = backend
            .submit(&SubmissionBatch::default(), SlotIndex(0))
            .unwrap();
        assert!(!backend.token_signaled(token));
        backend.complete(token);
        assert!(backend.token_signaled(token));
    }

    #[test]
    fn rejection_carries_first_pass_name() {
        use cadence_core::backend::SubmissionItem;
        use cadence_core::pass::WorkToken;

        let backend = NullBackend::new();
        backend.reject_next_submit("device lost");
        let batch = SubmissionBatch {
            frame_index: 1,
            items: vec![SubmissionItem {
                pass_name: "geometry".to_string(),
                work: WorkToken(0),
                barriers: vec![],
            }],
        };
        let err = backend.submit(&batch, SlotIndex(1)).unwrap_err();
        assert_eq!(
            err,
            SubmitError::SubmissionRejected {
                slot: SlotIndex(1),
                pass: Some("geometry".to_string()),
                details: "device lost".to_string(),
            }
        );
    }

    #[test]
    fn stale_present_is_one_shot() {
        let backend = NullBackend::new();
        backend.stale_next_present();
        assert_eq!(
            backend.present(SlotIndex(0)),
            Err(PresentError::Stale {
                slot: SlotIndex(0)
            })
        );
        assert!(backend.present(SlotIndex(0)).is_ok());
        assert_eq!(backend.presented(), vec![SlotIndex(0)]);
    }
}
