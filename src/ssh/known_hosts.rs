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

use directories::BaseDirs;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

/// Get the default known_hosts file path
pub fn get_default_known_hosts_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
}

/// Server host key verification methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCheckMethod {
    /// No verification - accept any host key (insecure, for testing only)
    NoCheck,
    /// Verify against the default known_hosts file (~/.ssh/known_hosts),
    /// fail on unknown or changed keys
    DefaultKnownHostsFile,
    /// Verify against a specific known_hosts file, fail on unknown or
    /// changed keys
    KnownHostsFile(PathBuf),
    /// Trust-on-first-use against the default known_hosts file: unknown
    /// hosts are accepted and recorded, changed keys are rejected
    AcceptNew,
    /// Trust-on-first-use against a specific known_hosts file
    AcceptNewKnownHostsFile(PathBuf),
}

/// Create a ServerCheckMethod based on strict host key checking mode
pub fn get_check_method(strict_mode: StrictHostKeyChecking) -> ServerCheckMethod {
    match strict_mode {
        StrictHostKeyChecking::Yes => {
            tracing::debug!("host key checking strict, using default known_hosts");
            ServerCheckMethod::DefaultKnownHostsFile
        }
        StrictHostKeyChecking::No => {
            tracing::debug!("host key checking disabled (strict mode = no)");
            ServerCheckMethod::NoCheck
        }
        StrictHostKeyChecking::AcceptNew => ServerCheckMethod::AcceptNew,
    }
}

/// Mode for host key checking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrictHostKeyChecking {
    /// Always verify host keys (fail on unknown/changed)
    Yes,
    /// Never verify host keys (accept all)
    No,
    /// Verify known hosts, add new ones automatically (TOFU)
    #[default]
    AcceptNew,
}

impl FromStr for StrictHostKeyChecking {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "yes" | "true" => Self::Yes,
            "no" | "false" => Self::No,
            "accept-new" | "tofu" => Self::AcceptNew,
            _ => Self::AcceptNew, // Default
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_mode_from_str() {
        assert_eq!(
            "yes".parse::<StrictHostKeyChecking>(),
            Ok(StrictHostKeyChecking::Yes)
        );
        assert_eq!(
            "no".parse::<StrictHostKeyChecking>(),
            Ok(StrictHostKeyChecking::No)
        );
        assert_eq!(
            "accept-new".parse::<StrictHostKeyChecking>(),
            Ok(StrictHostKeyChecking::AcceptNew)
        );
        assert_eq!(
            "tofu".parse::<StrictHostKeyChecking>(),
            Ok(StrictHostKeyChecking::AcceptNew)
        );
        // Unknown values fall back to the default
        assert_eq!(
            "bogus".parse::<StrictHostKeyChecking>(),
            Ok(StrictHostKeyChecking::AcceptNew)
        );
    }

    #[test]
    fn test_default_is_accept_new() {
        assert_eq!(
            StrictHostKeyChecking::default(),
            StrictHostKeyChecking::AcceptNew
        );
    }

    #[test]
    fn test_check_method_mapping() {
        assert_eq!(
            get_check_method(StrictHostKeyChecking::No),
            ServerCheckMethod::NoCheck
        );
        assert_eq!(
            get_check_method(StrictHostKeyChecking::Yes),
            ServerCheckMethod::DefaultKnownHostsFile
        );
        assert_eq!(
            get_check_method(StrictHostKeyChecking::AcceptNew),
            ServerCheckMethod::AcceptNew
        );
    }

    #[test]
    fn test_deserialize_kebab_case() {
        let mode: StrictHostKeyChecking = serde_json::from_str("\"accept-new\"").unwrap();
        assert_eq!(mode, StrictHostKeyChecking::AcceptNew);
        let mode: StrictHostKeyChecking = serde_json::from_str("\"yes\"").unwrap();
        assert_eq!(mode, StrictHostKeyChecking::Yes);
    }
}
