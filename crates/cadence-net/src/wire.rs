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

//! The snapshot wire format: bincode-encoded [`Snapshot`] frames.

use cadence_core::state::Snapshot;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// An error en/decoding a snapshot frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The payload could not be encoded.
    Encode {
        /// Encoder-reported detail.
        details: String,
    },
    /// The received bytes are not a valid snapshot frame.
    Decode {
        /// Decoder-reported detail.
        details: String,
    },
}

impl fmt::Display for WireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WireError::Encode { details } => write!(f, "Failed to encode snapshot: {details}"),
            WireError::Decode { details } => write!(f, "Failed to decode snapshot: {details}"),
        }
    }
}

impl std::error::Error for WireError {}

/// Encodes a snapshot for transmission.
pub fn encode_snapshot<T: Serialize>(snapshot: &Snapshot<T>) -> Result<Vec<u8>, WireError> {
    bincode::serde::encode_to_vec(snapshot, bincode::config::standard()).map_err(|err| {
        WireError::Encode {
            details: err.to_string(),
        }
    })
}

/// Decodes a received snapshot frame. Trailing bytes are rejected: a frame
/// carries exactly one snapshot.
pub fn decode_snapshot<T: DeserializeOwned>(bytes: &[u8]) -> Result<Snapshot<T>, WireError> {
    let (snapshot, consumed) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map_err(|err| {
            WireError::Decode {
                details: err.to_string(),
            }
        })?;
    if consumed != bytes.len() {
        return Err(WireError::Decode {
            details: format!("{} trailing bytes after snapshot", bytes.len() - consumed),
        });
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::state::Scalar;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestState {
        height: Scalar,
    }

    #[test]
    fn encode_decode_round_trip() {
        let snapshot = Snapshot::new(
            9,
            123_456,
            TestState {
                height: Scalar::new(1.5),
            },
        );
        let bytes = encode_snapshot(&snapshot).unwrap();
        let decoded: Snapshot<TestState> = decode_snapshot(&bytes).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn garbage_fails_to_decode() {
        let err = decode_snapshot::<TestState>(&[0xff, 0x00, 0x13]).unwrap_err();
        assert!(matches!(err, WireError::Decode { .. }));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let snapshot = Snapshot::new(
            1,
            1,
            TestState {
                height: Scalar::new(0.0),
            },
        );
        let mut bytes = encode_snapshot(&snapshot).unwrap();
        bytes.push(0);
        let err = decode_snapshot::<TestState>(&bytes).unwrap_err();
        assert!(matches!(err, WireError::Decode { .. }));
    }
}
