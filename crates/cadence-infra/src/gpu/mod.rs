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

//! Device backends.

pub mod wgpu_backend;

use std::fmt;

/// An error while bringing up a device backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendInitError {
    /// No suitable adapter was found.
    AdapterUnavailable {
        /// Instance-reported detail.
        details: String,
    },
    /// The adapter refused to create a logical device.
    DeviceUnavailable {
        /// Adapter-reported detail.
        details: String,
    },
    /// The presentation surface could not be created or configured.
    SurfaceUnavailable {
        /// Surface-reported detail.
        details: String,
    },
}

impl fmt::Display for BackendInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendInitError::AdapterUnavailable { details } => {
                write!(f, "No suitable graphics adapter: {details}")
            }
            BackendInitError::DeviceUnavailable { details } => {
                write!(f, "Failed to create logical device: {details}")
            }
            BackendInitError::SurfaceUnavailable { details } => {
                write!(f, "Failed to create presentation surface: {details}")
            }
        }
    }
}

impl std::error::Error for BackendInitError {}
