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

//! Construction-time settings for the frame core.

use serde::{Deserialize, Serialize};

/// Settings fixed when the frame core is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreSettings {
    /// Number of frames-in-flight slots (K). Bounds how many frames of CPU
    /// work can run ahead of GPU completion; the single knob trading latency
    /// against throughput. Fixed for the core's lifetime.
    pub frames_in_flight: usize,
    /// Fixed capacity of the resource registry's arena.
    pub resource_capacity: usize,
    /// A runtime toggle for span emission; when off, a null sink is used.
    pub enable_telemetry: bool,
}

impl CoreSettings {
    /// Clamps settings into usable ranges: at least one slot and room for at
    /// least one resource.
    pub fn sanitized(mut self) -> Self {
        if self.frames_in_flight == 0 {
            log::warn!("frames_in_flight of 0 requested; clamping to 1");
            self.frames_in_flight = 1;
        }
        if self.resource_capacity == 0 {
            log::warn!("resource_capacity of 0 requested; clamping to 1");
            self.resource_capacity = 1;
        }
        self
    }
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            resource_capacity: 1024,
            enable_telemetry: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_two_frames_in_flight() {
        let settings = CoreSettings::default();
        assert_eq!(settings.frames_in_flight, 2);
        assert!(settings.enable_telemetry);
    }

    #[test]
    fn sanitized_clamps_zeroes() {
        let settings = CoreSettings {
            frames_in_flight: 0,
            resource_capacity: 0,
            enable_telemetry: false,
        }
        .sanitized();
        assert_eq!(settings.frames_in_flight, 1);
        assert_eq!(settings.resource_capacity, 1);
    }
}
