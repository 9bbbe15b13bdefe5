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

//! Batch upload workflow.
//!
//! Stages the private key material to a temporary file, connects, transfers
//! every file in input order over a single SFTP channel, and removes the
//! staged key on every exit path. Transfers are strictly sequential; a
//! failure aborts the remaining batch without rolling back files already
//! uploaded.

use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile, TempDir};

use crate::config::UploadConfig;
use crate::error::{Error, Result};
use crate::ssh::{file_transfer, Client};

/// Private key material staged to disk for the duration of one upload call.
///
/// The file name carries a random per-invocation suffix, so concurrent
/// calls sharing a work directory cannot race on the same path. On Unix the
/// file is created with mode 0600. Removal is explicit via [`remove`];
/// dropping the guard performs the same cleanup best-effort, so the key
/// never outlives the call even on panic.
///
/// [`remove`]: StagedKey::remove
struct StagedKey {
    file: NamedTempFile,
    /// Present when no work directory was supplied; keeps the private
    /// per-call directory alive until cleanup.
    dir: Option<TempDir>,
}

impl StagedKey {
    fn stage(key_material: &str, work_dir: Option<&Path>) -> Result<Self> {
        let (dir, dir_path) = match work_dir {
            Some(path) => (None, path.to_path_buf()),
            None => {
                let dir = tempfile::tempdir().map_err(|e| Error::Staging {
                    path: std::env::temp_dir(),
                    source: e,
                })?;
                let path = dir.path().to_path_buf();
                (Some(dir), path)
            }
        };

        let mut file = Builder::new()
            .prefix("id_rsa.")
            .tempfile_in(&dir_path)
            .map_err(|e| Error::Staging {
                path: dir_path.clone(),
                source: e,
            })?;
        file.write_all(key_material.as_bytes())
            .map_err(|e| Error::Staging {
                path: file.path().to_path_buf(),
                source: e,
            })?;

        tracing::debug!(path = %file.path().display(), "staged private key");
        Ok(Self { file, dir })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the key file, and the per-call directory when one was created.
    fn remove(self) -> std::io::Result<()> {
        self.file.close()?;
        if let Some(dir) = self.dir {
            dir.close()?;
        }
        Ok(())
    }
}

/// Upload `files` to `config.remote_dir` on the configured host.
///
/// Each file reference may be a plain path or a URL-shaped string; the full
/// reference is used as the local path, and only its final path segment
/// (query string and fragment stripped) becomes the remote file name. The
/// remote path is `remote_dir` + file name with no separator normalization,
/// so `remote_dir` should end with the appropriate separator.
///
/// Returns the remote paths in input order, one per input file. An empty
/// file list succeeds immediately without staging key material or opening
/// a connection.
///
/// The key material from `config` is staged under `work_dir` (or a private
/// temporary directory when `None`) and removed whenever it was created,
/// regardless of outcome.
pub async fn upload_files<S: AsRef<str>>(
    files: &[S],
    config: &UploadConfig,
    work_dir: Option<&Path>,
) -> Result<Vec<String>> {
    if files.is_empty() {
        tracing::debug!("empty file list, nothing to upload");
        return Ok(Vec::new());
    }

    let staged = StagedKey::stage(&config.private_key, work_dir)?;
    let key_path = staged.path().to_path_buf();

    let outcome = transfer_batch(files, config, &key_path).await;

    // The staged key must not outlive the call, whatever happened above. A
    // removal failure only surfaces when the batch itself succeeded.
    if let Err(e) = staged.remove() {
        match outcome {
            Ok(_) => {
                return Err(Error::Staging {
                    path: key_path,
                    source: e,
                })
            }
            Err(_) => tracing::warn!(error = %e, "failed to remove staged key"),
        }
    }

    outcome
}

async fn transfer_batch<S: AsRef<str>>(
    files: &[S],
    config: &UploadConfig,
    key_path: &Path,
) -> Result<Vec<String>> {
    let params = config.connect_params(key_path);
    let client = Client::connect(&params).await?;

    let result = run_transfers(&client, files, &config.remote_dir).await;

    // Orderly close on success and failure alike; dropping the handle would
    // also tear the session down.
    if let Err(e) = client.disconnect().await {
        tracing::debug!(error = %e, "disconnect after batch failed");
    }

    result
}

async fn run_transfers<S: AsRef<str>>(
    client: &Client,
    files: &[S],
    remote_dir: &str,
) -> Result<Vec<String>> {
    let sftp = client.open_sftp().await?;

    let mut remote_paths = Vec::with_capacity(files.len());
    for (index, file) in files.iter().enumerate() {
        let file = file.as_ref();
        let name = destination_name(file);
        let remote_path = format!("{remote_dir}{name}");

        file_transfer::put_file(&sftp, Path::new(file), &remote_path)
            .await
            .map_err(|source| Error::Transfer {
                file: file.to_string(),
                index,
                source: Box::new(source),
            })?;

        remote_paths.push(remote_path);
    }

    Ok(remote_paths)
}

/// Final path segment of a file reference, with any query string or
/// fragment discarded.
fn destination_name(reference: &str) -> &str {
    let path = reference.split(['?', '#']).next().unwrap_or(reference);
    path.rsplit('/').next().unwrap_or(path)
}
