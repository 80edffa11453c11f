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

//! Passkey registration functionality.

use serde::{Deserialize, Serialize};

use crate::attestation::AttestationObject;
use crate::base64url;
use crate::challenge::{CeremonyState, Challenge};
use crate::client_data::{ClientData, ClientDataType};
use crate::cose::{CoseAlgorithm, CosePublicKey};
use crate::error::{Error, Result, StoreError};
use crate::store::CredentialStore;
use crate::types::*;
use crate::{log_rejection, session_tag, RelyingParty};

/// Options sent to the client to begin passkey registration.
///
/// This structure contains all the parameters needed by the WebAuthn client
/// to create a new credential.
#[derive(Serialize, Debug)]
pub struct RegistrationOptions {
    /// Information about the relying party.
    pub rp: RelyingPartyEntity,

    /// Information about the user.
    pub user: UserEntity,

    /// The challenge value (base64url-encoded).
    pub challenge: String,

    /// List of acceptable public key credential parameters.
    #[serde(rename = "pubKeyCredParams")]
    pub pub_key_cred_params: Vec<PubKeyCredParam>,

    /// Timeout for the operation in milliseconds.
    pub timeout: u64,

    /// Attestation conveyance preference. Only "none" is supported.
    pub attestation: &'static str,

    /// Authenticator selection criteria.
    #[serde(rename = "authenticatorSelection")]
    pub authenticator_selection: AuthenticatorSelection,

    /// Credentials the user already has, so the authenticator does not
    /// register a second credential for the same account.
    #[serde(rename = "excludeCredentials")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
}

/// Credential returned by the client after `navigator.credentials.create()`.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationCredential {
    /// The credential ID (base64url-encoded).
    pub id: String,

    /// The credential ID (base64url-encoded); must decode to the same bytes as `id`.
    pub raw_id: String,

    /// Credential type, always "public-key".
    #[serde(rename = "type")]
    pub type_: String,

    pub response: AttestationResponse,
}

/// The `response` member of a registration credential.
#[derive(Deserialize, Debug, Clone)]
pub struct AttestationResponse {
    /// The attestation object (base64url-encoded CBOR).
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,

    /// The client data JSON (base64url-encoded).
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
}

/// Result of a successful registration, for the caller to persist.
#[derive(Debug, Clone)]
pub struct VerifiedRegistration {
    /// The new credential's ID.
    pub credential_id: Vec<u8>,

    /// The user the credential was registered for.
    pub user_id: Vec<u8>,

    /// The decoded public key.
    pub public_key: CosePublicKey,

    /// The public key in COSE format, as sent by the authenticator.
    pub public_key_bytes: Vec<u8>,

    /// Authenticator model identifier.
    pub aaguid: [u8; 16],

    /// Whether the user was verified during registration.
    pub user_verified: bool,
}

impl VerifiedRegistration {
    /// Converts the result into a credential record with a zero signature counter.
    pub fn into_credential(self) -> Credential {
        Credential {
            credential_id: self.credential_id,
            user_id: self.user_id,
            public_key: self.public_key_bytes,
            sign_count: 0,
        }
    }
}

impl RelyingParty {
    /// Starts a passkey registration ceremony.
    ///
    /// Issues a challenge bound to `session_key` and returns the options to
    /// send to the client. Issuing again for the same session replaces the
    /// pending challenge.
    ///
    /// # Arguments
    ///
    /// * `session_key` - The caller's session identifier
    /// * `user` - The account to register a credential for
    /// * `existing_credentials` - The user's existing credentials, to exclude
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUserHandle`] if the user ID is not 16 to 64
    /// bytes, or a challenge error if the random source fails.
    pub fn start_registration(
        &self,
        session_key: &str,
        user: &UserIdentity,
        existing_credentials: Option<&[Credential]>,
    ) -> Result<RegistrationOptions> {
        user.validate()?;

        let challenge = self.challenges.issue(
            session_key,
            CeremonyState::Registration { user: user.clone() },
        )?;

        let exclude_credentials = existing_credentials
            .unwrap_or(&[])
            .iter()
            .map(|c| CredentialDescriptor::new(&c.credential_id))
            .collect();

        Ok(RegistrationOptions {
            rp: RelyingPartyEntity {
                name: self.config.rp_name().to_string(),
                id: self.config.rp_id().to_string(),
            },
            user: UserEntity::from(user),
            challenge: challenge.encoded().to_string(),
            pub_key_cred_params: vec![PubKeyCredParam {
                alg: CoseAlgorithm::Es256.identifier(),
                type_: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
            }],
            timeout: self.config.timeout_ms(),
            attestation: "none",
            authenticator_selection: AuthenticatorSelection {
                resident_key: self.config.resident_key(),
                user_verification: self.config.user_verification(),
            },
            exclude_credentials,
        })
    }

    /// Completes a passkey registration ceremony.
    ///
    /// Consumes the session's challenge, verifies the client data and the
    /// attestation object, and checks with `store` that the credential ID is
    /// not already registered. Nothing is persisted: save the result with a
    /// uniqueness-enforcing insert, or use [`RelyingParty::register`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The challenge is missing, expired or already consumed
    /// * The client data type, challenge or origin doesn't match
    /// * The attestation object or authenticator data is malformed
    /// * The authenticator data carries no attested credential data
    /// * The credential ID is already registered
    pub async fn finish_registration<S>(
        &self,
        session_key: &str,
        credential: &RegistrationCredential,
        store: &S,
    ) -> Result<VerifiedRegistration>
    where
        S: CredentialStore + ?Sized,
    {
        let result = self
            .try_finish_registration(session_key, credential, store)
            .await;

        match &result {
            Ok(verified) => tracing::debug!(
                session = %session_tag(session_key),
                credential_id = %base64url::encode(&verified.credential_id),
                "registration verified"
            ),
            Err(err) => log_rejection("registration", session_key, &credential.raw_id, err),
        }
        result
    }

    /// Completes a registration and saves the credential in one step.
    ///
    /// A duplicate reported by `save` (a concurrent registration that won the
    /// race) is returned as [`Error::CredentialIdAlreadyRegistered`].
    pub async fn register<S>(
        &self,
        session_key: &str,
        credential: &RegistrationCredential,
        store: &S,
    ) -> Result<Credential>
    where
        S: CredentialStore + ?Sized,
    {
        let record = self
            .finish_registration(session_key, credential, store)
            .await?
            .into_credential();

        match store.save(record.clone()).await {
            Ok(()) => Ok(record),
            Err(StoreError::Duplicate) => {
                let err = Error::CredentialIdAlreadyRegistered;
                log_rejection("registration", session_key, &credential.raw_id, &err);
                Err(err)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn try_finish_registration<S>(
        &self,
        session_key: &str,
        credential: &RegistrationCredential,
        store: &S,
    ) -> Result<VerifiedRegistration>
    where
        S: CredentialStore + ?Sized,
    {
        let challenge = self.challenges.consume(session_key)?;
        let verified = self.verify_registration(&challenge, credential)?;

        if store.exists_by_id(&verified.credential_id).await? {
            return Err(Error::CredentialIdAlreadyRegistered);
        }
        Ok(verified)
    }

    /// Verifies a registration response against a consumed challenge.
    pub(crate) fn verify_registration(
        &self,
        challenge: &Challenge,
        credential: &RegistrationCredential,
    ) -> Result<VerifiedRegistration> {
        let user = match challenge.state() {
            CeremonyState::Registration { user } => user,
            CeremonyState::Authentication { .. } => return Err(Error::ChallengePurposeMismatch),
        };

        let raw_id = decode_credential_id(&credential.type_, &credential.id, &credential.raw_id)?;

        let client_data = ClientData::from_base64(&credential.response.client_data_json)?;
        client_data.verify(
            ClientDataType::Create,
            challenge.encoded(),
            self.config.rp_origin(),
        )?;

        let attestation_bytes = base64url::decode(&credential.response.attestation_object)?;
        let attestation = AttestationObject::parse(&attestation_bytes)?;
        let auth_data = attestation.auth_data;

        self.check_authenticator_data(&auth_data)?;

        let attested = auth_data
            .attested_credential_data
            .ok_or(Error::MissingAttestedCredentialData)?;

        if attested.credential_id != raw_id {
            return Err(Error::CredentialIdMismatch);
        }

        Ok(VerifiedRegistration {
            credential_id: attested.credential_id,
            user_id: user.id.clone(),
            public_key: attested.public_key,
            public_key_bytes: attested.public_key_bytes,
            aaguid: attested.aaguid,
            user_verified: auth_data.flags.user_verified(),
        })
    }
}
