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

//! SSH/SFTP client plumbing based on russh and russh-sftp
//!
//! This module provides:
//! - Private key authentication (file or in-memory material)
//! - Host key verification policies, including trust-on-first-use
//! - Connection establishment with separate connect/auth timeouts
//! - Single-file SFTP upload

pub mod auth;
pub mod connection;
pub mod file_transfer;
pub mod known_hosts;

pub use auth::AuthMethod;
pub use connection::{Client, ClientHandler};
pub use file_transfer::put_file;
pub use known_hosts::{ServerCheckMethod, StrictHostKeyChecking};
