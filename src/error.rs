// Copyright 2025 Lablup Inc. and Jeongkyu Shin
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

//! Error types for the upload workflow

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while staging key material, connecting, or
/// transferring files
#[derive(Debug, Error)]
pub enum Error {
    /// The temporary key file could not be written or removed
    #[error("failed to stage private key at {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The private key could not be loaded or decrypted
    #[error("invalid private key: {0}")]
    KeyInvalid(#[source] russh::keys::Error),

    /// The server rejected the private key
    #[error("private key was rejected by the server")]
    KeyAuthFailed,

    /// The server's host key was not recognized or has changed
    #[error("host key verification failed")]
    ServerCheckFailed,

    /// The TCP connection and SSH handshake did not complete in time
    #[error("connection did not complete within {timeout:?}")]
    ConnectTimeout { timeout: Duration },

    /// Authentication did not complete in time
    #[error("authentication did not complete within {timeout:?}")]
    AuthTimeout { timeout: Duration },

    /// SSH error from russh
    #[error("ssh error: {0}")]
    Ssh(#[from] russh::Error),

    /// SFTP error from russh-sftp
    #[error("sftp error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A specific file of the batch could not be transferred. Files before
    /// `index` have already been uploaded and are not rolled back.
    #[error("failed to transfer {file} (index {index}): {source}")]
    Transfer {
        file: String,
        index: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether this error belongs to the key-loading / connect / handshake
    /// phase rather than staging or per-file transfer.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Error::KeyInvalid(_)
                | Error::KeyAuthFailed
                | Error::ServerCheckFailed
                | Error::ConnectTimeout { .. }
                | Error::AuthTimeout { .. }
                | Error::Ssh(_)
        )
    }
}

/// Result type for upload operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::KeyAuthFailed;
        assert_eq!(err.to_string(), "private key was rejected by the server");

        let err = Error::Transfer {
            file: "photo1.jpg".to_string(),
            index: 2,
            source: Box::new(Error::ServerCheckFailed),
        };
        assert_eq!(
            err.to_string(),
            "failed to transfer photo1.jpg (index 2): host key verification failed"
        );
    }

    #[test]
    fn test_authentication_grouping() {
        assert!(Error::KeyAuthFailed.is_authentication());
        assert!(Error::ConnectTimeout {
            timeout: Duration::from_secs(10)
        }
        .is_authentication());

        let staging = Error::Staging {
            path: PathBuf::from("/tmp/id_rsa"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!staging.is_authentication());

        let transfer = Error::Transfer {
            file: "a.bin".to_string(),
            index: 0,
            source: Box::new(Error::KeyAuthFailed),
        };
        assert!(!transfer.is_authentication());
    }
}
