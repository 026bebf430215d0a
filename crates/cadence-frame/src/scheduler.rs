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

//! The frames-in-flight scheduler.
//!
//! K slots rotate round-robin across frames; the slot count bounds how many
//! frames of CPU work can run ahead of GPU completion and is fixed at
//! construction. Completion is observed through the backend's sync tokens,
//! never by polling in a busy loop: `acquire_slot` is the only operation
//! that blocks the producer thread, and it blocks on slot availability, not
//! on full GPU idle.

use cadence_core::backend::{SubmissionBackend, SyncToken};
use cadence_core::error::SchedulerError;
use cadence_core::handle::SlotIndex;
use std::sync::Arc;

/// The per-slot state machine. `Idle` is initial and terminal per cycle:
/// `Idle -> Recording -> Submitted -> Completed -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Free for the next frame.
    Idle,
    /// CPU work for a frame is being recorded against this slot.
    Recording,
    /// The frame was handed to the device; its token is outstanding.
    Submitted,
    /// The token was observed signaled; transient on the way back to idle.
    Completed,
}

impl SlotState {
    fn name(&self) -> &'static str {
        match self {
            SlotState::Idle => "idle",
            SlotState::Recording => "recording",
            SlotState::Submitted => "submitted",
            SlotState::Completed => "completed",
        }
    }
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    token: Option<SyncToken>,
    frame_index: u64,
}

/// Pipelines N frames in flight across K rotating slots.
#[derive(Debug)]
pub struct FrameScheduler {
    slots: Vec<Slot>,
    backend: Arc<dyn SubmissionBackend>,
    cursor: usize,
    frame_counter: u64,
    reclaimed: Vec<SlotIndex>,
}

impl FrameScheduler {
    /// Creates a scheduler with `frames_in_flight` slots over the given
    /// backend.
    pub fn new(frames_in_flight: usize, backend: Arc<dyn SubmissionBackend>) -> Self {
        let slots = (0..frames_in_flight.max(1))
            .map(|_| Slot {
                state: SlotState::Idle,
                token: None,
                frame_index: 0,
            })
            .collect();
        Self {
            slots,
            backend,
            cursor: 0,
            frame_counter: 0,
            reclaimed: Vec::new(),
        }
    }

    /// The fixed slot count K.
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// The state a slot is currently in.
    pub fn slot_state(&self, slot: SlotIndex) -> SlotState {
        self.slots[slot.0].state
    }

    /// Acquires the least-recently-used slot for recording, blocking until
    /// it reaches `Completed`/`Idle`. Never returns a slot still in
    /// `Submitted`.
    ///
    /// Returns the slot and the frame index assigned to it.
    ///
    /// ## Errors
    /// * `SchedulerError::InvalidTransition` - the LRU slot is still
    ///   recording, i.e. the previous frame was neither submitted nor
    ///   aborted.
    pub fn acquire_slot(&mut self) -> Result<(SlotIndex, u64), SchedulerError> {
        let index = SlotIndex(self.cursor);

        match self.slots[index.0].state {
            SlotState::Idle => {}
            SlotState::Submitted => {
                // Wait on the slot's token, then walk it through
                // Completed back to Idle.
                if let Some(token) = self.slots[index.0].token {
                    log::trace!("{index}: waiting on {token}");
                    self.backend.wait_token(token);
                }
                self.complete(index);
            }
            SlotState::Completed => {
                self.finish(index);
            }
            state @ SlotState::Recording => {
                return Err(SchedulerError::InvalidTransition {
                    slot: index,
                    from: state.name(),
                    requested: "acquire",
                });
            }
        }

        self.cursor = (self.cursor + 1) % self.slots.len();
        self.frame_counter += 1;
        let slot = &mut self.slots[index.0];
        slot.state = SlotState::Recording;
        slot.frame_index = self.frame_counter;
        log::trace!("{index}: idle -> recording (frame {})", self.frame_counter);
        Ok((index, self.frame_counter))
    }

    /// Transitions `Recording -> Submitted` once the submission engine has
    /// accepted the ordered pass list, storing the token the slot will be
    /// reclaimed on.
    ///
    /// ## Errors
    /// * `SchedulerError::InvalidTransition` - the slot is not recording.
    pub fn advance(&mut self, slot: SlotIndex, token: SyncToken) -> Result<(), SchedulerError> {
        let state = self.slots[slot.0].state;
        if state != SlotState::Recording {
            return Err(SchedulerError::InvalidTransition {
                slot,
                from: state.name(),
                requested: "advance",
            });
        }
        self.slots[slot.0].state = SlotState::Submitted;
        self.slots[slot.0].token = Some(token);
        log::trace!("{slot}: recording -> submitted ({token})");
        Ok(())
    }

    /// Transitions `Submitted -> Completed -> Idle` if the slot's token has
    /// been observed signaled. Returns whether the slot was reclaimed.
    ///
    /// ## Errors
    /// * `SchedulerError::InvalidTransition` - the slot is not submitted.
    pub fn reclaim(&mut self, slot: SlotIndex) -> Result<bool, SchedulerError> {
        let state = self.slots[slot.0].state;
        if state != SlotState::Submitted {
            return Err(SchedulerError::InvalidTransition {
                slot,
                from: state.name(),
                requested: "reclaim",
            });
        }
        match self.slots[slot.0].token {
            Some(token) if self.backend.token_signaled(token) => {
                self.complete(slot);
                Ok(true)
            }
            Some(_) => Ok(false),
            // A submitted slot without a token cannot signal; treat it as
            // complete rather than wedging the pipeline.
            None => {
                log::error!("{slot}: submitted without a token; reclaiming");
                self.complete(slot);
                Ok(true)
            }
        }
    }

    /// Reclaims every submitted slot whose token has signaled. Returns the
    /// slots that became idle.
    pub fn reclaim_signaled(&mut self) -> Vec<SlotIndex> {
        let mut idle = Vec::new();
        for index in 0..self.slots.len() {
            let slot = SlotIndex(index);
            if self.slots[index].state == SlotState::Submitted
                && matches!(self.reclaim(slot), Ok(true))
            {
                idle.push(slot);
            }
        }
        idle
    }

    /// Aborts a frame still being recorded, discarding its declared passes.
    ///
    /// ## Errors
    /// * `SchedulerError::AbortAfterSubmit` - the frame has already been
    ///   submitted; submitted frames cannot be canceled.
    /// * `SchedulerError::InvalidTransition` - the slot is not recording.
    pub fn abort(&mut self, slot: SlotIndex) -> Result<(), SchedulerError> {
        match self.slots[slot.0].state {
            SlotState::Recording => {
                self.slots[slot.0].state = SlotState::Idle;
                log::debug!("{slot}: recording aborted");
                Ok(())
            }
            SlotState::Submitted => Err(SchedulerError::AbortAfterSubmit { slot }),
            state => Err(SchedulerError::InvalidTransition {
                slot,
                from: state.name(),
                requested: "abort",
            }),
        }
    }

    /// Blocks until every submitted slot has completed and been reclaimed.
    pub fn wait_idle(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].state == SlotState::Submitted {
                if let Some(token) = self.slots[index].token {
                    self.backend.wait_token(token);
                }
                self.complete(SlotIndex(index));
            }
        }
    }

    /// Drains the list of slots reclaimed since the last call. The caller
    /// uses this to drive deferred resource destruction.
    pub fn take_reclaimed(&mut self) -> Vec<SlotIndex> {
        std::mem::take(&mut self.reclaimed)
    }

    fn complete(&mut self, slot: SlotIndex) {
        self.slots[slot.0].state = SlotState::Completed;
        log::trace!("{slot}: submitted -> completed");
        self.finish(slot);
    }

    fn finish(&mut self, slot: SlotIndex) {
        self.slots[slot.0].state = SlotState::Idle;
        self.slots[slot.0].token = None;
        self.reclaimed.push(slot);
        log::trace!("{slot}: completed -> idle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_backend::NullBackend;

    fn scheduler(k: usize, backend: Arc<NullBackend>) -> FrameScheduler {
        FrameScheduler::new(k, backend)
    }

    #[test]
    fn acquire_assigns_increasing_frame_indices() {
        let backend = Arc::new(NullBackend::new());
        let mut sched = scheduler(2, backend.clone());

        let (slot_a, frame_a) = sched.acquire_slot().unwrap();
        sched.abort(slot_a).unwrap();
        let (slot_b, frame_b) = sched.acquire_slot().unwrap();

        assert_ne!(slot_a, slot_b);
        assert_eq!(frame_b, frame_a + 1);
    }

    #[test]
    fn round_trip_never_skips_completed() {
        let backend = Arc::new(NullBackend::new());
        let mut sched = scheduler(2, backend.clone());

        let (slot, _) = sched.acquire_slot().unwrap();
        assert_eq!(sched.slot_state(slot), SlotState::Recording);

        let token = backend
            .submit(&Default::default(), slot)
            .expect("null backend accepts");
        sched.advance(slot, token).unwrap();
        assert_eq!(sched.slot_state(slot), SlotState::Submitted);

        // Auto-signaling backend: reclaim observes the token and walks
        // Submitted -> Completed -> Idle.
        assert!(sched.reclaim(slot).unwrap());
        assert_eq!(sched.slot_state(slot), SlotState::Idle);
        assert_eq!(sched.take_reclaimed(), vec![slot]);
    }

    #[test]
    fn reclaim_before_signal_leaves_slot_submitted() {
        let backend = Arc::new(NullBackend::manual());
        let mut sched = scheduler(2, backend.clone());

        let (slot, _) = sched.acquire_slot().unwrap();
        let token = backend.submit(&Default::default(), slot).unwrap();
        sched.advance(slot, token).unwrap();

        assert!(!sched.reclaim(slot).unwrap());
        assert_eq!(sched.slot_state(slot), SlotState::Submitted);

        backend.complete(token);
        assert!(sched.reclaim(slot).unwrap());
        assert_eq!(sched.slot_state(slot), SlotState::Idle);
    }

    #[test]
    fn abort_after_submit_is_rejected() {
        let backend = Arc::new(NullBackend::new());
        let mut sched = scheduler(2, backend.clone());

        let (slot, _) = sched.acquire_slot().unwrap();
        let token = backend.submit(&Default::default(), slot).unwrap();
        sched.advance(slot, token).unwrap();

        assert_eq!(
            sched.abort(slot),
            Err(SchedulerError::AbortAfterSubmit { slot })
        );
    }

    #[test]
    fn double_acquire_without_submit_is_rejected() {
        let backend = Arc::new(NullBackend::new());
        let mut sched = scheduler(1, backend);

        let (_slot, _) = sched.acquire_slot().unwrap();
        assert!(matches!(
            sched.acquire_slot(),
            Err(SchedulerError::InvalidTransition { .. })
        ));
    }
}
