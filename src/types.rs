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

//! Data structures shared by both ceremonies.

use serde::{Deserialize, Serialize};

use crate::base64url;
use crate::cose::CosePublicKey;
use crate::error::{Error, Result};

/// Credential type string used throughout WebAuthn.
pub const PUBLIC_KEY_CREDENTIAL_TYPE: &str = "public-key";

/// Resident key requirement for passkey registration.
///
/// Specifies whether the authenticator should store the credential locally
/// (resident/discoverable credential) or rely on the server to provide it.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResidentKeyRequirement {
    /// The authenticator should not create a resident credential.
    Discouraged,
    /// A resident credential is preferred but not required.
    Preferred,
    /// A resident credential must be created.
    Required,
}

/// User verification requirement for passkey operations.
///
/// Specifies whether user verification (e.g., PIN, biometric) is required
/// during the ceremony. Only `Required` is enforced on the response; the
/// other values are hints for the client.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserVerificationRequirement {
    /// User verification is required.
    Required,
    /// User verification is preferred but not required.
    Preferred,
    /// User verification should not be performed.
    Discouraged,
}

/// A registered credential, as kept by the host's credential store.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Credential {
    /// The unique identifier for this credential.
    pub credential_id: Vec<u8>,

    /// The owner's user handle.
    pub user_id: Vec<u8>,

    /// The public key in COSE format.
    pub public_key: Vec<u8>,

    /// The signature counter used to detect cloned authenticators. Never decreases.
    pub sign_count: u32,
}

impl Credential {
    /// Decodes the stored COSE public key.
    pub fn decode_public_key(&self) -> Result<CosePublicKey> {
        Ok(CosePublicKey::from_bytes(&self.public_key)?)
    }
}

/// The account a credential is being registered for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserIdentity {
    /// Opaque user handle, 16 to 64 bytes. Must not contain personal information.
    pub id: Vec<u8>,

    /// Username or account identifier.
    pub name: String,

    /// Human-readable display name.
    pub display_name: String,
}

impl UserIdentity {
    pub const MIN_ID_LEN: usize = 16;
    pub const MAX_ID_LEN: usize = 64;

    pub fn new(id: impl Into<Vec<u8>>, name: &str, display_name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
            display_name: display_name.to_string(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let len = self.id.len();
        if !(Self::MIN_ID_LEN..=Self::MAX_ID_LEN).contains(&len) {
            return Err(Error::InvalidUserHandle(len));
        }
        Ok(())
    }
}

/// Information about the relying party (RP) sent to the client.
#[derive(Serialize, Debug, Clone)]
pub struct RelyingPartyEntity {
    /// Human-readable name of the relying party.
    pub name: String,

    /// Unique identifier for the relying party (typically the domain).
    pub id: String,
}

/// Information about the user account sent to the client.
#[derive(Clone, Serialize, Debug)]
pub struct UserEntity {
    /// User handle (base64url-encoded).
    pub id: String,

    /// Username or account identifier.
    pub name: String,

    /// Human-readable display name for the user.
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl From<&UserIdentity> for UserEntity {
    fn from(user: &UserIdentity) -> Self {
        Self {
            id: base64url::encode(&user.id),
            name: user.name.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// A public key credential parameter specifying an acceptable algorithm.
#[derive(Serialize, Debug, Clone)]
pub struct PubKeyCredParam {
    /// COSE algorithm identifier (e.g., -7 for ES256).
    pub alg: i64,

    /// Credential type (always "public-key" for passkeys).
    #[serde(rename = "type")]
    pub type_: String,
}

/// Authenticator selection criteria for passkey registration.
#[derive(Serialize, Debug, Clone)]
pub struct AuthenticatorSelection {
    /// Resident key requirement.
    #[serde(rename = "residentKey")]
    pub resident_key: ResidentKeyRequirement,

    /// User verification requirement.
    #[serde(rename = "userVerification")]
    pub user_verification: UserVerificationRequirement,
}

/// A credential reference used in `excludeCredentials` and `allowCredentials`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CredentialDescriptor {
    /// The credential ID (base64url-encoded).
    pub id: String,

    /// Credential type (always "public-key" for passkeys).
    #[serde(rename = "type")]
    pub type_: String,
}

impl CredentialDescriptor {
    pub fn new(credential_id: &[u8]) -> Self {
        Self {
            id: base64url::encode(credential_id),
            type_: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
        }
    }
}

/// Checks the `type`, `id` and `rawId` fields of a client credential and
/// returns the decoded credential ID.
pub(crate) fn decode_credential_id(type_: &str, id: &str, raw_id: &str) -> Result<Vec<u8>> {
    if type_ != PUBLIC_KEY_CREDENTIAL_TYPE {
        return Err(Error::InvalidCredentialType(type_.to_string()));
    }
    let raw = base64url::decode(raw_id)?;
    if base64url::decode(id)? != raw {
        return Err(Error::CredentialIdMismatch);
    }
    Ok(raw)
}
