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

//! SFTP file transfer operations.

use russh_sftp::{client::SftpSession, protocol::OpenFlags};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};

/// Upload a single local file to `remote_path` over an open SFTP session.
///
/// The remote file is created or truncated. The transfer blocks until the
/// file is fully written and the remote handle is shut down.
pub async fn put_file(sftp: &SftpSession, local_path: &Path, remote_path: &str) -> Result<()> {
    tracing::debug!(
        local = %local_path.display(),
        remote = %remote_path,
        "uploading file"
    );

    let file_contents = tokio::fs::read(local_path).await.map_err(Error::Io)?;

    // remote path is Into<String>, not AsRef<Path>, per russh-sftp's API
    let mut remote_file = sftp
        .open_with_flags(
            remote_path,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE | OpenFlags::READ,
        )
        .await?;
    remote_file
        .write_all(&file_contents)
        .await
        .map_err(Error::Io)?;
    remote_file.flush().await.map_err(Error::Io)?;
    remote_file.shutdown().await.map_err(Error::Io)?;

    Ok(())
}
