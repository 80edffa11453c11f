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

//! passkey-rp - A WebAuthn/Passkey relying-party ceremony engine
//!
//! This crate issues and validates challenges, parses the attestation and
//! assertion payloads returned by authenticators, verifies ES256 signatures
//! and enforces the single-use challenge and signature counter rules. It does
//! no I/O of its own: credential persistence is delegated to a
//! [`CredentialStore`] the host implements, and all inputs are plain strings,
//! byte buffers and small structs.
//!
//! # Example
//!
//! ```rust
//! use passkey_rp::{RelyingParty, RelyingPartyConfig, UserIdentity};
//!
//! let config = RelyingPartyConfig::new(
//!     "example.com",              // Relying Party ID (domain)
//!     "https://example.com",      // Relying Party Origin
//!     "Example Corp",             // Relying Party Name
//! ).expect("valid relying party configuration");
//! let rp = RelyingParty::new(config);
//!
//! // Registration flow
//! // Step 1: issue a challenge bound to the caller's session
//! let user = UserIdentity::new(*b"unique_user_identifier_12345", "alice@example.com", "Alice Smith");
//! let options = rp.start_registration("session-1", &user, None)
//!     .expect("user id is at least 16 bytes");
//!
//! // Send `options` to the client (as JSON); it calls navigator.credentials.create()
//!
//! // Step 2: verify the client's response and save the credential
//! # /*
//! let credential = rp.register("session-1", &registration_credential, &store).await?;
//! # */
//!
//! // Authentication flow
//! // Step 1: issue a challenge, optionally restricted to the user's credentials
//! let options = rp.start_authentication("session-2", None).expect("random source");
//!
//! // Step 2: verify the assertion and persist the new signature counter
//! # /*
//! let verified = rp.authenticate("session-2", &authentication_credential, &store).await?;
//! # */
//! ```
//!
//! # Security Considerations
//!
//! - The origin and RP ID are compared exactly; configure them for the host users see
//! - A [`Error::SignatureCounterRegression`] means a credential may have been
//!   cloned; treat it as a security event, not a failed login
//! - Hosts should return [`Error::public_message`] to clients and log the full error
//! - Credential stores must enforce credential ID uniqueness on insert

pub mod attestation;
pub mod authenticator_data;
mod authentication;
pub mod base64url;
pub mod cbor;
pub mod challenge;
mod client_data;
mod config;
pub mod cose;
mod error;
mod registration;
pub mod store;
mod types;

#[cfg(test)]
mod tests;

// Re-export public types
pub use attestation::AttestationObject;
pub use authentication::{
    check_signature_counter, AssertionResponse, AuthenticationCredential, AuthenticationOptions,
    VerifiedAuthentication,
};
pub use authenticator_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorFlags};
pub use challenge::{CeremonyState, Challenge, ChallengeStore};
pub use client_data::{ClientData, ClientDataType};
pub use config::RelyingPartyConfig;
pub use cose::{CoseAlgorithm, CoseKeyType, CosePublicKey, EcCurve};
pub use error::*;
pub use registration::{
    AttestationResponse, RegistrationCredential, RegistrationOptions, VerifiedRegistration,
};
pub use store::{CredentialStore, MemoryCredentialStore};
pub use types::*;

use aws_lc_rs::digest::{self, SHA256};

/// The relying party: configuration plus the pending challenges.
///
/// Share one instance across request handlers (e.g. behind an `Arc`); every
/// method takes `&self`.
#[derive(Debug)]
pub struct RelyingParty {
    config: RelyingPartyConfig,
    challenges: ChallengeStore,
    rp_id_hash: [u8; 32],
}

impl RelyingParty {
    /// Creates a relying party with an in-memory challenge store using the
    /// configured challenge lifetime.
    pub fn new(config: RelyingPartyConfig) -> Self {
        let challenges = ChallengeStore::new(config.challenge_ttl());
        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(digest::digest(&SHA256, config.rp_id().as_bytes()).as_ref());

        Self {
            config,
            challenges,
            rp_id_hash,
        }
    }

    pub fn config(&self) -> &RelyingPartyConfig {
        &self.config
    }

    /// The pending challenges. Hosts may call
    /// [`ChallengeStore::purge_expired`] periodically.
    pub fn challenges(&self) -> &ChallengeStore {
        &self.challenges
    }

    /// Checks the parts of authenticator data common to both ceremonies:
    /// RP ID hash, user presence and, when required, user verification.
    pub(crate) fn check_authenticator_data(&self, auth_data: &AuthenticatorData) -> Result<()> {
        if auth_data.rp_id_hash != self.rp_id_hash {
            return Err(Error::RpIdHashMismatch);
        }
        if !auth_data.flags.user_present() {
            return Err(Error::UserNotPresent);
        }
        if self.config.user_verification() == UserVerificationRequirement::Required
            && !auth_data.flags.user_verified()
        {
            return Err(Error::UserNotVerified);
        }
        Ok(())
    }
}

/// Short, stable tag for a session key. Session keys are bearer secrets and
/// never reach the logs; the tag still correlates the entries of one ceremony.
pub(crate) fn session_tag(session_key: &str) -> String {
    let hash = digest::digest(&SHA256, session_key.as_bytes());
    base64url::encode(&hash.as_ref()[..8])
}

/// Logs a rejected ceremony with its detailed cause.
pub(crate) fn log_rejection(
    ceremony: &'static str,
    session_key: &str,
    credential_id: &str,
    err: &Error,
) {
    if err.is_security_event() {
        tracing::error!(
            ceremony,
            session = %session_tag(session_key),
            credential_id,
            error = %err,
            "security violation"
        );
    } else {
        tracing::warn!(
            ceremony,
            session = %session_tag(session_key),
            credential_id,
            kind = ?err.kind(),
            error = %err,
            "ceremony rejected"
        );
    }
}
