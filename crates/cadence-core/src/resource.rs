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

//! Resource kinds and usage states tracked by the registry.

use std::fmt;

/// The kind of a GPU-visible resource, with its sizing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A linear buffer of `size` bytes.
    Buffer {
        /// Size of the buffer in bytes.
        size: u64,
    },
    /// A two-dimensional image.
    Image {
        /// Width in texels.
        width: u32,
        /// Height in texels.
        height: u32,
    },
    /// A synchronization primitive (fence/semaphore equivalent).
    SyncPrimitive,
}

impl ResourceKind {
    /// A short, stable label for logging and error context.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Buffer { .. } => "buffer",
            ResourceKind::Image { .. } => "image",
            ResourceKind::SyncPrimitive => "sync-primitive",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Buffer { size } => write!(f, "buffer({size} bytes)"),
            ResourceKind::Image { width, height } => write!(f, "image({width}x{height})"),
            ResourceKind::SyncPrimitive => write!(f, "sync-primitive"),
        }
    }
}

/// The usage state a resource is currently in, as last observed by the
/// dependency graph for the frame it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UsageState {
    /// Freshly created; no pass has touched the resource yet.
    #[default]
    Uninitialized,
    /// Last access was a read.
    Read,
    /// Last access was a write.
    Write,
    /// A barrier covering this resource has been issued but not yet observed.
    Transitioning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display() {
        assert_eq!(
            format!("{}", ResourceKind::Buffer { size: 256 }),
            "buffer(256 bytes)"
        );
        assert_eq!(
            format!(
                "{}",
                ResourceKind::Image {
                    width: 64,
                    height: 32
                }
            ),
            "image(64x32)"
        );
        assert_eq!(ResourceKind::SyncPrimitive.label(), "sync-primitive");
    }

    #[test]
    fn usage_state_defaults_to_uninitialized() {
        assert_eq!(UsageState::default(), UsageState::Uninitialized);
    }
}
