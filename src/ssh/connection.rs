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

//! SSH connection management and establishment.
//!
//! This module handles connection establishment, the initial handshake with
//! host key verification, authentication, and opening the SFTP channel.

use russh::client::{Config, Handle, Handler};
use russh::Disconnect;
use russh_sftp::client::SftpSession;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ConnectParams;
use crate::error::{Error, Result};
use crate::ssh::auth::{self, AuthMethod};
use crate::ssh::known_hosts::{self, ServerCheckMethod};

/// Inactivity timeout for the underlying russh session, in seconds
const SESSION_INACTIVITY_TIMEOUT_SECS: u64 = 300;

/// An authenticated SSH connection to a remote server.
///
/// After [`connect`]ing, use [`open_sftp`] to obtain the file-transfer
/// channel. The session is owned by exactly one upload batch and is torn
/// down when the handle is dropped; [`disconnect`] performs an orderly
/// close.
///
/// [`connect`]: Client::connect
/// [`open_sftp`]: Client::open_sftp
/// [`disconnect`]: Client::disconnect
pub struct Client {
    handle: Handle<ClientHandler>,
    host: String,
    port: u16,
    username: String,
}

impl Client {
    /// Open an SSH connection described by `params`, authenticating with
    /// the private key at `params.key_path`.
    ///
    /// The key is loaded (and decrypted, when a passphrase is set) before
    /// any network activity. The TCP connect and handshake are bounded by
    /// `params.connect_timeout`, the authentication exchange by
    /// `params.auth_timeout`. No retry is attempted; the caller decides
    /// whether to retry.
    pub async fn connect(params: &ConnectParams) -> Result<Self> {
        let auth = AuthMethod::with_key_file(&params.key_path, params.passphrase.as_deref());
        Self::connect_with_auth(params, auth).await
    }

    /// Same as [`connect`], but with an explicit [`AuthMethod`] (e.g. key
    /// material held in memory).
    ///
    /// [`connect`]: Client::connect
    pub async fn connect_with_auth(params: &ConnectParams, auth: AuthMethod) -> Result<Self> {
        let key = auth.load()?;

        let config = Arc::new(Config {
            inactivity_timeout: Some(Duration::from_secs(SESSION_INACTIVITY_TIMEOUT_SECS)),
            ..Default::default()
        });
        let handler = ClientHandler::new(
            params.host.clone(),
            params.port,
            known_hosts::get_check_method(params.strict_host_key_checking),
        );

        tracing::debug!(host = %params.host, port = params.port, "connecting");

        let mut handle = tokio::time::timeout(
            params.connect_timeout,
            russh::client::connect(config, (params.host.as_str(), params.port), handler),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            timeout: params.connect_timeout,
        })??;

        tokio::time::timeout(
            params.auth_timeout,
            auth::authenticate(&mut handle, &params.username, key),
        )
        .await
        .map_err(|_| Error::AuthTimeout {
            timeout: params.auth_timeout,
        })??;

        Ok(Self {
            handle,
            host: params.host.clone(),
            port: params.port,
            username: params.username.clone(),
        })
    }

    /// Open the SFTP subsystem channel on this session.
    ///
    /// Some sshd configurations do not enable sftp by default; the remote
    /// sshd_config needs a line like `Subsystem sftp internal-sftp`.
    pub async fn open_sftp(&self) -> Result<SftpSession> {
        tracing::debug!("initializing sftp channel");

        let channel = self.handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;

        Ok(sftp)
    }

    /// Disconnect from the remote host.
    pub async fn disconnect(&self) -> Result<()> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "")
            .await
            .map_err(Error::Ssh)
    }

    /// Check if the connection is closed.
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Get connection info
    pub fn connection_info(&self) -> (&str, u16, &str) {
        (&self.host, self.port, &self.username)
    }
}

impl Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("handle", &"Handle<ClientHandler>")
            .finish()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        tracing::debug!("SSH session to {}:{} being dropped", self.host, self.port);
    }
}

/// SSH client handler for managing server key verification.
#[derive(Debug, Clone)]
pub struct ClientHandler {
    hostname: String,
    port: u16,
    server_check: ServerCheckMethod,
}

impl ClientHandler {
    /// Create a new client handler.
    pub fn new(hostname: String, port: u16, server_check: ServerCheckMethod) -> Self {
        Self {
            hostname,
            port,
            server_check,
        }
    }

    /// Trust-on-first-use check against `path`: known keys must match,
    /// unknown hosts are recorded, changed keys are rejected.
    fn check_accept_new(&self, path: &Path, server_key: &russh::keys::PublicKey) -> Result<bool> {
        if !path.exists() {
            if let Some(ssh_dir) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(ssh_dir) {
                    tracing::warn!(error = %e, "failed to create known_hosts directory");
                }
            }
            if let Err(e) = std::fs::File::create(path) {
                tracing::warn!(error = %e, "failed to create known_hosts file");
            } else {
                tracing::debug!("created empty known_hosts file at {:?}", path);
            }
        }

        match russh::keys::check_known_hosts_path(&self.hostname, self.port, server_key, path) {
            Ok(true) => Ok(true),
            Ok(false) => {
                russh::keys::known_hosts::learn_known_hosts_path(&self.hostname, self.port, server_key, path)
                    .map_err(|_| Error::ServerCheckFailed)?;
                tracing::info!(
                    host = %self.hostname,
                    port = self.port,
                    "recorded new host key in {:?}",
                    path
                );
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    host = %self.hostname,
                    port = self.port,
                    error = %e,
                    "host key verification failed"
                );
                Err(Error::ServerCheckFailed)
            }
        }
    }
}

impl Handler for ClientHandler {
    type Error = Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool> {
        match &self.server_check {
            ServerCheckMethod::NoCheck => Ok(true),
            ServerCheckMethod::DefaultKnownHostsFile => {
                let result = russh::keys::check_known_hosts(
                    &self.hostname,
                    self.port,
                    server_public_key,
                )
                .map_err(|_| Error::ServerCheckFailed)?;

                Ok(result)
            }
            ServerCheckMethod::KnownHostsFile(known_hosts_path) => {
                let result = russh::keys::check_known_hosts_path(
                    &self.hostname,
                    self.port,
                    server_public_key,
                    known_hosts_path,
                )
                .map_err(|_| Error::ServerCheckFailed)?;

                Ok(result)
            }
            ServerCheckMethod::AcceptNew => {
                match known_hosts::get_default_known_hosts_path() {
                    Some(path) => self.check_accept_new(&path, server_public_key),
                    None => {
                        tracing::warn!(
                            "could not determine known_hosts path, accepting host key unchecked"
                        );
                        Ok(true)
                    }
                }
            }
            ServerCheckMethod::AcceptNewKnownHostsFile(known_hosts_path) => {
                let path = known_hosts_path.clone();
                self.check_accept_new(&path, server_public_key)
            }
        }
    }
}
