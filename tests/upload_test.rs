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

//! Integration tests for the batch upload workflow
//!
//! These exercise the failure paths that need no live SSH server (key
//! loading failures, refused connections) and assert the staged-key
//! cleanup invariant on each of them.

use bsftp::{upload_files, Error, UploadConfig};
use std::path::Path;

const PLAIN_KEY: &str = include_str!("fixtures/test_ed25519");
const ENCRYPTED_KEY: &str = include_str!("fixtures/test_ed25519_enc");

fn test_config(private_key: &str, passphrase: &str, port: u16) -> UploadConfig {
    serde_json::from_value(serde_json::json!({
        "upload_hostname": "127.0.0.1",
        "upload_port": port,
        "upload_ftpusername": "deploy",
        "upload_pkeystr": private_key,
        "upload_passphrase": passphrase,
        "upload_remotedir": "/data/",
    }))
    .unwrap()
}

fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

/// Reserve a loopback port that nothing is listening on.
fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_empty_file_list_skips_staging_and_connection() {
    let work_dir = tempfile::tempdir().unwrap();
    let config = test_config(PLAIN_KEY, "", unused_port());

    let result = upload_files::<String>(&[], &config, Some(work_dir.path()))
        .await
        .unwrap();

    assert!(result.is_empty());
    // No key material was staged for an empty batch
    assert!(dir_is_empty(work_dir.path()));
}

#[tokio::test]
async fn test_garbage_key_material_fails_and_leaves_no_key_behind() {
    let work_dir = tempfile::tempdir().unwrap();
    let config = test_config("this is not a private key", "", unused_port());
    let files = ["photo1.jpg"];

    let err = upload_files(&files, &config, Some(work_dir.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::KeyInvalid(_)));
    assert!(err.is_authentication());
    assert!(dir_is_empty(work_dir.path()));
}

#[tokio::test]
async fn test_wrong_passphrase_fails_and_leaves_no_key_behind() {
    let work_dir = tempfile::tempdir().unwrap();
    let config = test_config(ENCRYPTED_KEY, "wrong passphrase", unused_port());
    let files = ["photo1.jpg", "photo2.jpg"];

    let err = upload_files(&files, &config, Some(work_dir.path()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::KeyInvalid(_)));
    assert!(dir_is_empty(work_dir.path()));
}

#[tokio::test]
async fn test_refused_connection_fails_and_leaves_no_key_behind() {
    let work_dir = tempfile::tempdir().unwrap();
    // Key loads fine; the failure comes from the connect phase
    let config = test_config(PLAIN_KEY, "", unused_port());
    let files = ["photo1.jpg"];

    let err = upload_files(&files, &config, Some(work_dir.path()))
        .await
        .unwrap_err();

    assert!(err.is_authentication());
    assert!(!matches!(err, Error::KeyInvalid(_)));
    assert!(dir_is_empty(work_dir.path()));
}

#[tokio::test]
async fn test_default_work_dir_leaves_no_trace() {
    let config = test_config(ENCRYPTED_KEY, "wrong passphrase", unused_port());
    let files = ["photo1.jpg"];

    // With no work_dir the key is staged in a private temporary directory;
    // nothing observable should remain after the call either way.
    let err = upload_files(&files, &config, None).await.unwrap_err();
    assert!(matches!(err, Error::KeyInvalid(_)));
}
