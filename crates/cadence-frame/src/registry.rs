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

//! The resource registry: exclusive owner of GPU-visible resources.
//!
//! Every other component holds [`ResourceHandle`]s, which are arena index +
//! generation pairs. Reusing an arena index always increments its
//! generation, so a held handle from an earlier generation can never alias
//! a different resource undetected.

use cadence_core::error::RegistryError;
use cadence_core::handle::{Generation, ResourceHandle, SlotIndex};
use cadence_core::resource::{ResourceKind, UsageState};

/// A live resource instance, owned by the registry.
#[derive(Debug, Clone)]
pub struct Resource {
    /// The kind and sizing the resource was created with.
    pub kind: ResourceKind,
    /// The usage state last recorded for the resource.
    pub usage: UsageState,
    /// The slot currently holding write access, if any. Write access is
    /// confined to one slot at a time; ownership is released when the slot
    /// is reclaimed.
    pub owning_slot: Option<SlotIndex>,
}

#[derive(Debug)]
struct Entry {
    generation: Generation,
    occupant: Option<Resource>,
    /// `Some(n)` once retired: the resource is destroyed after `n` further
    /// slot reclamations, at which point every slot that could have been in
    /// flight at retire time has completed.
    release_countdown: Option<usize>,
}

/// Owns GPU-visible resources and their lifetime state.
///
/// Capacity is fixed at construction; exhaustion is reported to the caller
/// and never retried automatically. Destruction is deferred: `retire` only
/// marks a resource, and the actual release happens after every slot that
/// was in flight at retire time has been reclaimed.
#[derive(Debug)]
pub struct ResourceRegistry {
    entries: Vec<Entry>,
    free: Vec<u32>,
    capacity: usize,
    frames_in_flight: usize,
}

impl ResourceRegistry {
    /// Creates a registry with a fixed arena capacity, sized for a core
    /// running `frames_in_flight` slots.
    pub fn new(capacity: usize, frames_in_flight: usize) -> Self {
        Self {
            entries: Vec::new(),
            free: Vec::new(),
            capacity,
            frames_in_flight,
        }
    }

    /// Allocates a resource and returns a handle bound to the entry's
    /// current generation.
    ///
    /// ## Errors
    /// * `RegistryError::AllocationExhausted` - the fixed capacity is full.
    pub fn create(&mut self, kind: ResourceKind) -> Result<ResourceHandle, RegistryError> {
        let resource = Resource {
            kind,
            usage: UsageState::Uninitialized,
            owning_slot: None,
        };

        if let Some(index) = self.free.pop() {
            // Reusing an index always bumps the generation so stale handles
            // remain detectable.
            let entry = &mut self.entries[index as usize];
            entry.generation += 1;
            entry.occupant = Some(resource);
            entry.release_countdown = None;
            log::trace!("Created {kind} at reused index {index} g{}", entry.generation);
            return Ok(ResourceHandle {
                index,
                generation: entry.generation,
            });
        }

        if self.entries.len() >= self.capacity {
            return Err(RegistryError::AllocationExhausted {
                kind,
                capacity: self.capacity,
            });
        }

        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 1,
            occupant: Some(resource),
            release_countdown: None,
        });
        log::trace!("Created {kind} at index {index} g1");
        Ok(ResourceHandle {
            index,
            generation: 1,
        })
    }

    /// Resolves a handle to the live resource it was created for.
    ///
    /// ## Errors
    /// * `RegistryError::StaleHandle` - the handle's generation does not
    ///   match the entry's live occupant. This is the sole defense against
    ///   use-after-retire bugs and is always fatal to the frame.
    pub fn resolve(&self, handle: ResourceHandle) -> Result<&Resource, RegistryError> {
        let entry = self
            .entries
            .get(handle.index as usize)
            .ok_or(RegistryError::StaleHandle {
                handle,
                live_generation: None,
            })?;
        match &entry.occupant {
            Some(resource) if entry.generation == handle.generation => Ok(resource),
            Some(_) => Err(RegistryError::StaleHandle {
                handle,
                live_generation: Some(entry.generation),
            }),
            None => Err(RegistryError::StaleHandle {
                handle,
                live_generation: None,
            }),
        }
    }

    /// Marks a resource for release once no in-flight slot references it.
    /// Never immediate: the GPU may still be using the resource.
    ///
    /// Retiring an already-retired resource is a no-op.
    ///
    /// ## Errors
    /// * `RegistryError::StaleHandle` - the handle does not resolve.
    pub fn retire(&mut self, handle: ResourceHandle) -> Result<(), RegistryError> {
        self.resolve(handle)?;
        let entry = &mut self.entries[handle.index as usize];
        if entry.release_countdown.is_some() {
            log::debug!("Resource {handle} already retired");
            return Ok(());
        }
        entry.release_countdown = Some(self.frames_in_flight);
        log::trace!(
            "Retired {handle}; release after {} reclamations",
            self.frames_in_flight
        );
        Ok(())
    }

    /// Records the usage state a frame's plan established for a resource.
    ///
    /// ## Errors
    /// * `RegistryError::StaleHandle` - the handle does not resolve.
    pub fn mark_usage(
        &mut self,
        handle: ResourceHandle,
        usage: UsageState,
    ) -> Result<(), RegistryError> {
        self.resolve(handle)?;
        let entry = &mut self.entries[handle.index as usize];
        if let Some(resource) = entry.occupant.as_mut() {
            resource.usage = usage;
        }
        Ok(())
    }

    /// Confines write access to a resource to the given slot.
    ///
    /// Write access to any resource belongs to exactly one slot at a time.
    /// Frame-local resources are expected to be instanced per slot, so a
    /// conflicting in-flight owner indicates a declaration bug upstream; it
    /// is reported and the newer owner wins.
    ///
    /// ## Errors
    /// * `RegistryError::StaleHandle` - the handle does not resolve.
    pub fn confine_write(
        &mut self,
        handle: ResourceHandle,
        slot: SlotIndex,
    ) -> Result<(), RegistryError> {
        self.resolve(handle)?;
        let entry = &mut self.entries[handle.index as usize];
        if let Some(resource) = entry.occupant.as_mut() {
            if let Some(owner) = resource.owning_slot {
                if owner != slot {
                    debug_assert!(
                        false,
                        "write to {handle} from {slot} while owned by {owner}"
                    );
                    log::error!(
                        "Write to {handle} from {slot} while {owner} is still in flight; \
                         instance frame-local resources per slot"
                    );
                }
            }
            resource.owning_slot = Some(slot);
        }
        Ok(())
    }

    /// Releases slot ownership and advances deferred destruction after the
    /// given slot has been reclaimed.
    pub fn sweep(&mut self, slot: SlotIndex) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Some(resource) = entry.occupant.as_mut() {
                if resource.owning_slot == Some(slot) {
                    resource.owning_slot = None;
                }
            }
            if let Some(countdown) = entry.release_countdown.as_mut() {
                *countdown -= 1;
                if *countdown == 0 {
                    entry.occupant = None;
                    entry.release_countdown = None;
                    self.free.push(index as u32);
                    log::trace!("Released retired resource at index {index}");
                }
            }
        }
    }

    /// Number of live (not yet released) resources.
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|e| e.occupant.is_some()).count()
    }

    /// The fixed arena capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
