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

//! Private key authentication.
//!
//! Keys are loaded and decrypted locally before any network activity, so a
//! missing file or a wrong passphrase never looks like a connection problem.

use russh::client::{Handle, Handler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// An authentification token.
///
/// Used when creating a [`Client`] for authentification.
///
/// [`Client`]: crate::ssh::Client
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthMethod {
    PrivateKey {
        /// entire contents of private key file
        key_data: Zeroizing<String>,
        key_pass: Option<Zeroizing<String>>,
    },
    PrivateKeyFile {
        key_file_path: PathBuf,
        key_pass: Option<Zeroizing<String>>,
    },
}

impl AuthMethod {
    pub fn with_key(key: &str, passphrase: Option<&str>) -> Self {
        Self::PrivateKey {
            key_data: Zeroizing::new(key.to_string()),
            key_pass: passphrase.map(|p| Zeroizing::new(p.to_string())),
        }
    }

    pub fn with_key_file<T: AsRef<Path>>(
        key_file_path: T,
        passphrase: Option<&str>,
    ) -> Self {
        Self::PrivateKeyFile {
            key_file_path: key_file_path.as_ref().to_path_buf(),
            key_pass: passphrase.map(|p| Zeroizing::new(p.to_string())),
        }
    }

    /// Load the private key, decrypting it when a passphrase is present.
    pub(crate) fn load(&self) -> Result<russh::keys::PrivateKey> {
        match self {
            Self::PrivateKey { key_data, key_pass } => {
                russh::keys::decode_secret_key(key_data, key_pass.as_ref().map(|p| &***p))
                    .map_err(Error::KeyInvalid)
            }
            Self::PrivateKeyFile {
                key_file_path,
                key_pass,
            } => {
                tracing::debug!(path = %key_file_path.display(), "loading private key");
                russh::keys::load_secret_key(key_file_path, key_pass.as_ref().map(|p| &***p))
                    .map_err(Error::KeyInvalid)
            }
        }
    }
}

/// This takes a handle and performs publickey authentification with the
/// already-loaded key.
pub(crate) async fn authenticate<H: Handler>(
    handle: &mut Handle<H>,
    username: &str,
    key: russh::keys::PrivateKey,
) -> Result<()> {
    let auth_result = handle
        .authenticate_publickey(
            username,
            russh::keys::PrivateKeyWithHashAlg::new(
                Arc::new(key),
                handle.best_supported_rsa_hash().await?.flatten(),
            ),
        )
        .await?;

    if !auth_result.success() {
        return Err(Error::KeyAuthFailed);
    }

    tracing::debug!("private key authentication successful");
    Ok(())
}
