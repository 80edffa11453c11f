// Copyright 2026 Grzegorz Blach
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

//! Relying party configuration.

use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::types::{ResidentKeyRequirement, UserVerificationRequirement};

/// Default client-side timeout hint, in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Default lifetime of an issued challenge.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(300);

/// Relying party identity and ceremony options.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingPartyConfig {
    rp_id: String,
    rp_origin: String,
    rp_name: String,
    timeout_ms: u64,
    challenge_ttl: Duration,
    user_verification: UserVerificationRequirement,
    resident_key: ResidentKeyRequirement,
}

impl RelyingPartyConfig {
    /// Creates a configuration after validating the RP ID and origin.
    ///
    /// # Arguments
    ///
    /// * `rp_id` - The relying party identifier (a hostname, e.g. "example.com")
    /// * `rp_origin` - The expected origin (e.g. `https://login.example.com`)
    /// * `rp_name` - The human-readable relying party name
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidRpId`] if the RP ID is empty or contains a scheme,
    ///   port or path
    /// * [`ConfigError::InvalidOrigin`] if the origin does not parse, uses a
    ///   scheme other than https (http is allowed for localhost only), or
    ///   carries a path, query, fragment or credentials
    /// * [`ConfigError::OriginOutsideRpId`] if the origin's host is neither the
    ///   RP ID nor a subdomain of it
    pub fn new(rp_id: &str, rp_origin: &str, rp_name: &str) -> Result<Self, ConfigError> {
        let rp_id = rp_id.trim().to_ascii_lowercase();
        if rp_id.is_empty() || rp_id.contains(['/', ':', '@', ' ']) {
            return Err(ConfigError::InvalidRpId(rp_id));
        }

        let url = Url::parse(rp_origin).map_err(|e| ConfigError::InvalidOrigin(e.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| ConfigError::InvalidOrigin(format!("{rp_origin} has no host")))?
            .to_string();

        match url.scheme() {
            "https" => {}
            "http" if host == "localhost" => {}
            scheme => {
                return Err(ConfigError::InvalidOrigin(format!(
                    "scheme {scheme} is not allowed"
                )))
            }
        }

        if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::InvalidOrigin(format!(
                "{rp_origin} must not have a path, query or fragment"
            )));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::InvalidOrigin(format!(
                "{rp_origin} must not carry credentials"
            )));
        }

        if host != rp_id && !host.ends_with(&format!(".{rp_id}")) {
            return Err(ConfigError::OriginOutsideRpId { host, rp_id });
        }

        Ok(Self {
            rp_id,
            rp_origin: url.origin().ascii_serialization(),
            rp_name: rp_name.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            challenge_ttl: DEFAULT_CHALLENGE_TTL,
            user_verification: UserVerificationRequirement::Preferred,
            resident_key: ResidentKeyRequirement::Preferred,
        })
    }

    /// Creates configuration from environment variables.
    ///
    /// Environment variables:
    /// - `WEBAUTHN_RP_ID` - Relying Party ID (default: "localhost")
    /// - `WEBAUTHN_RP_ORIGIN` - RP origin URL (default: "http://localhost:3000")
    /// - `WEBAUTHN_RP_NAME` - RP display name (default: "Passkey RP")
    pub fn from_env() -> Result<Self, ConfigError> {
        let rp_id = std::env::var("WEBAUTHN_RP_ID").unwrap_or_else(|_| "localhost".to_string());
        let rp_origin = std::env::var("WEBAUTHN_RP_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let rp_name =
            std::env::var("WEBAUTHN_RP_NAME").unwrap_or_else(|_| "Passkey RP".to_string());

        Self::new(&rp_id, &rp_origin, &rp_name)
    }

    /// Sets the client timeout hint in milliseconds.
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Sets how long an issued challenge stays valid.
    pub fn with_challenge_ttl(mut self, ttl: Duration) -> Self {
        self.challenge_ttl = ttl;
        self
    }

    pub fn with_user_verification(mut self, requirement: UserVerificationRequirement) -> Self {
        self.user_verification = requirement;
        self
    }

    pub fn with_resident_key(mut self, requirement: ResidentKeyRequirement) -> Self {
        self.resident_key = requirement;
        self
    }

    pub fn rp_id(&self) -> &str {
        &self.rp_id
    }

    /// The expected origin, serialized as `scheme://host[:port]`.
    pub fn rp_origin(&self) -> &str {
        &self.rp_origin
    }

    pub fn rp_name(&self) -> &str {
        &self.rp_name
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }

    pub fn user_verification(&self) -> UserVerificationRequirement {
        self.user_verification
    }

    pub fn resident_key(&self) -> ResidentKeyRequirement {
        self.resident_key
    }
}
