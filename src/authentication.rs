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

//! Passkey authentication functionality.

use aws_lc_rs::digest::{self, SHA256};
use serde::{Deserialize, Serialize};

use crate::authenticator_data::AuthenticatorData;
use crate::base64url;
use crate::challenge::{CeremonyState, Challenge};
use crate::client_data::{ClientData, ClientDataType};
use crate::error::{Error, Result, StoreError};
use crate::store::CredentialStore;
use crate::types::*;
use crate::{log_rejection, session_tag, RelyingParty};

/// Options sent to the client to begin passkey authentication.
///
/// This structure contains all the parameters needed by the WebAuthn client
/// to authenticate using an existing credential.
#[derive(Serialize, Debug)]
pub struct AuthenticationOptions {
    /// The challenge value (base64url-encoded).
    pub challenge: String,

    /// Timeout for the operation in milliseconds.
    pub timeout: u64,

    /// The relying party identifier.
    #[serde(rename = "rpId")]
    pub rp_id: String,

    /// Credentials allowed for this authentication. Absent for the
    /// usernameless flow, where the browser offers every discoverable passkey.
    #[serde(rename = "allowCredentials", skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<Vec<CredentialDescriptor>>,

    /// User verification requirement.
    #[serde(rename = "userVerification")]
    pub user_verification: UserVerificationRequirement,
}

/// Credential returned by the client after `navigator.credentials.get()`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationCredential {
    /// The credential ID that was used (base64url-encoded).
    pub id: String,

    /// The credential ID (base64url-encoded); must decode to the same bytes as `id`.
    pub raw_id: String,

    /// Credential type, always "public-key".
    #[serde(rename = "type")]
    pub type_: String,

    pub response: AssertionResponse,
}

/// The `response` member of an authentication credential.
#[derive(Deserialize, Debug, Clone)]
pub struct AssertionResponse {
    /// The authenticator data (base64url-encoded).
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,

    /// The client data JSON (base64url-encoded).
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,

    /// The signature over the authenticator data and client data hash (base64url-encoded).
    pub signature: String,

    /// The user handle of a discoverable credential (base64url-encoded).
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

/// Result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAuthentication {
    /// The credential ID that was used for authentication.
    pub credential_id: Vec<u8>,

    /// The credential owner's user handle.
    pub user_id: Vec<u8>,

    /// The new signature counter, to be persisted.
    pub sign_count: u32,

    /// Whether the user was verified.
    pub user_verified: bool,
}

/// Enforces the signature counter rule.
///
/// The received counter must be strictly greater than the stored one, except
/// that authenticators without a counter report 0 forever, so 0 after 0 is
/// accepted.
///
/// # Errors
///
/// Returns [`Error::SignatureCounterRegression`] otherwise. This indicates a
/// possibly cloned authenticator.
pub fn check_signature_counter(stored: u32, received: u32) -> Result<()> {
    if received > stored || (received == 0 && stored == 0) {
        Ok(())
    } else {
        Err(Error::SignatureCounterRegression { stored, received })
    }
}

impl RelyingParty {
    /// Starts a passkey authentication ceremony.
    ///
    /// Issues a challenge bound to `session_key`. Pass the user's credentials
    /// when the user is known (passwordless flow); pass `None` to let the
    /// client pick any discoverable credential (usernameless flow).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAllowedCredentials`] when an allow-list is given but
    /// empty: a user with no credentials cannot authenticate.
    pub fn start_authentication(
        &self,
        session_key: &str,
        allowed_credentials: Option<&[Credential]>,
    ) -> Result<AuthenticationOptions> {
        if matches!(allowed_credentials, Some([])) {
            return Err(Error::NoAllowedCredentials);
        }

        let allowed_ids: Vec<Vec<u8>> = allowed_credentials
            .unwrap_or(&[])
            .iter()
            .map(|c| c.credential_id.clone())
            .collect();

        let allow_credentials = allowed_credentials.map(|credentials| {
            credentials
                .iter()
                .map(|c| CredentialDescriptor::new(&c.credential_id))
                .collect()
        });

        let challenge = self.challenges.issue(
            session_key,
            CeremonyState::Authentication {
                allowed_credentials: allowed_ids,
            },
        )?;

        Ok(AuthenticationOptions {
            challenge: challenge.encoded().to_string(),
            timeout: self.config.timeout_ms(),
            rp_id: self.config.rp_id().to_string(),
            allow_credentials,
            user_verification: self.config.user_verification(),
        })
    }

    /// Completes a passkey authentication ceremony against a known credential.
    ///
    /// Consumes the session's challenge and verifies the assertion with
    /// `stored_credential`. On success, persist the returned `sign_count`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The challenge is missing, expired or already consumed
    /// * The credential is not the stored one or not in the allowed list
    /// * The client data type, challenge or origin doesn't match
    /// * The authenticator data is malformed or carries attested credential data
    /// * The signature is invalid
    /// * The counter did not increase (possible cloned authenticator)
    pub fn finish_authentication(
        &self,
        session_key: &str,
        credential: &AuthenticationCredential,
        stored_credential: &Credential,
    ) -> Result<VerifiedAuthentication> {
        let result = self
            .challenges
            .consume(session_key)
            .map_err(Error::from)
            .and_then(|challenge| self.verify_assertion(&challenge, credential, stored_credential));

        self.log_outcome(session_key, credential, &result);
        result
    }

    /// Completes an authentication using `store` to look up the credential and
    /// persist the new signature counter.
    ///
    /// The challenge is consumed before the lookup, so an unknown credential
    /// still burns it. The counter is written with a compare-and-set against
    /// the value read, so a concurrent assertion with the same counter fails
    /// as [`Error::SignatureCounterRegression`].
    pub async fn authenticate<S>(
        &self,
        session_key: &str,
        credential: &AuthenticationCredential,
        store: &S,
    ) -> Result<VerifiedAuthentication>
    where
        S: CredentialStore + ?Sized,
    {
        let result = self.try_authenticate(session_key, credential, store).await;
        self.log_outcome(session_key, credential, &result);
        result
    }

    async fn try_authenticate<S>(
        &self,
        session_key: &str,
        credential: &AuthenticationCredential,
        store: &S,
    ) -> Result<VerifiedAuthentication>
    where
        S: CredentialStore + ?Sized,
    {
        let challenge = self.challenges.consume(session_key)?;

        let credential_id = base64url::decode(&credential.raw_id)?;
        let stored = store
            .find_by_id(&credential_id)
            .await?
            .ok_or(Error::UnknownCredential)?;

        let verified = self.verify_assertion(&challenge, credential, &stored)?;
        match store
            .update_signature_counter(
                &verified.credential_id,
                stored.sign_count,
                verified.sign_count,
            )
            .await
        {
            Ok(()) => Ok(verified),
            // Another assertion moved the counter after the lookup
            Err(StoreError::CounterConflict { current }) => {
                Err(Error::SignatureCounterRegression {
                    stored: current,
                    received: verified.sign_count,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Verifies an assertion against a consumed challenge and a stored credential.
    pub(crate) fn verify_assertion(
        &self,
        challenge: &Challenge,
        credential: &AuthenticationCredential,
        stored: &Credential,
    ) -> Result<VerifiedAuthentication> {
        let allowed_credentials = match challenge.state() {
            CeremonyState::Authentication {
                allowed_credentials,
            } => allowed_credentials,
            CeremonyState::Registration { .. } => return Err(Error::ChallengePurposeMismatch),
        };

        let credential_id =
            decode_credential_id(&credential.type_, &credential.id, &credential.raw_id)?;

        // Empty list: usernameless flow, any credential may be used
        if !allowed_credentials.is_empty() && !allowed_credentials.contains(&credential_id) {
            return Err(Error::CredentialNotAllowed);
        }
        if credential_id != stored.credential_id {
            return Err(Error::CredentialIdMismatch);
        }

        let client_data_bytes = base64url::decode(&credential.response.client_data_json)?;
        let client_data = ClientData::from_bytes(&client_data_bytes)?;
        client_data.verify(
            ClientDataType::Get,
            challenge.encoded(),
            self.config.rp_origin(),
        )?;

        let authenticator_data = base64url::decode(&credential.response.authenticator_data)?;
        let auth_data = AuthenticatorData::parse(&authenticator_data)?;
        self.check_authenticator_data(&auth_data)?;
        if auth_data.attested_credential_data.is_some() {
            return Err(Error::UnexpectedAttestedCredentialData);
        }

        if let Some(user_handle) = &credential.response.user_handle {
            let user_handle = base64url::decode(user_handle)?;
            if !user_handle.is_empty() && user_handle != stored.user_id {
                return Err(Error::UserHandleMismatch);
            }
        }

        // Signed message: authenticatorData || SHA-256(clientDataJSON)
        let client_data_hash = digest::digest(&SHA256, &client_data_bytes);
        let mut signed_data = authenticator_data;
        signed_data.extend_from_slice(client_data_hash.as_ref());

        let signature = base64url::decode(&credential.response.signature)?;
        stored
            .decode_public_key()?
            .verify(&signed_data, &signature)?;

        check_signature_counter(stored.sign_count, auth_data.sign_count)?;

        Ok(VerifiedAuthentication {
            credential_id,
            user_id: stored.user_id.clone(),
            sign_count: auth_data.sign_count,
            user_verified: auth_data.flags.user_verified(),
        })
    }

    fn log_outcome(
        &self,
        session_key: &str,
        credential: &AuthenticationCredential,
        result: &Result<VerifiedAuthentication>,
    ) {
        match result {
            Ok(verified) => tracing::debug!(
                session = %session_tag(session_key),
                credential_id = %base64url::encode(&verified.credential_id),
                sign_count = verified.sign_count,
                "authentication verified"
            ),
            Err(err) => log_rejection("authentication", session_key, &credential.raw_id, err),
        }
    }
}
