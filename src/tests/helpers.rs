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

use aws_lc_rs::digest::{self, SHA256};
use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};
use ciborium::Value;

use crate::*;

pub const RP_ID: &str = "example.test";
pub const RP_ORIGIN: &str = "https://example.test";
pub const USER_ID: &[u8] = b"user_handle_0001_example";

/// Flags for a registration response: UP, UV and AT.
pub const REGISTRATION_FLAGS: u8 = AuthenticatorFlags::USER_PRESENT
    | AuthenticatorFlags::USER_VERIFIED
    | AuthenticatorFlags::ATTESTED_CREDENTIAL_DATA;

/// Flags for an assertion: UP and UV.
pub const ASSERTION_FLAGS: u8 = AuthenticatorFlags::USER_PRESENT | AuthenticatorFlags::USER_VERIFIED;

pub fn test_config() -> RelyingPartyConfig {
    RelyingPartyConfig::new(RP_ID, RP_ORIGIN, "Example Test").unwrap()
}

pub fn test_rp() -> RelyingParty {
    RelyingParty::new(test_config())
}

pub fn test_user() -> UserIdentity {
    UserIdentity::new(USER_ID, "alice", "Alice Example")
}

/// A software P-256 authenticator.
pub struct TestAuthenticator {
    key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl TestAuthenticator {
    pub fn new() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref()).unwrap();
        Self { key_pair, rng }
    }

    /// Affine x and y coordinates of the public key.
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        // Uncompressed point: 0x04 || x || y
        let point = self.key_pair.public_key().as_ref();
        (point[1..33].to_vec(), point[33..65].to_vec())
    }

    pub fn cose_key(&self) -> Vec<u8> {
        let (x, y) = self.coordinates();
        create_es256_cose_key(&x, &y)
    }

    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair.sign(&self.rng, message).unwrap().as_ref().to_vec()
    }

    /// A stored credential record for this authenticator.
    pub fn credential(&self, credential_id: &[u8], sign_count: u32) -> Credential {
        Credential {
            credential_id: credential_id.to_vec(),
            user_id: USER_ID.to_vec(),
            public_key: self.cose_key(),
            sign_count,
        }
    }

    /// Builds a registration response for `challenge`.
    pub fn register(&self, challenge: &str, credential_id: &[u8], origin: &str) -> RegistrationCredential {
        let auth_data = create_attested_authenticator_data(
            RP_ID,
            REGISTRATION_FLAGS,
            credential_id,
            &self.cose_key(),
        );
        let attestation_object = create_attestation_object(auth_data);
        let client_data = create_client_data_json("webauthn.create", challenge, origin);
        registration_credential(credential_id, &attestation_object, &client_data)
    }

    /// Builds a signed assertion for `challenge`.
    pub fn assert(
        &self,
        challenge: &str,
        credential_id: &[u8],
        counter: u32,
        user_handle: Option<&[u8]>,
    ) -> AuthenticationCredential {
        let auth_data = create_authenticator_data(RP_ID, ASSERTION_FLAGS, counter);
        let client_data = create_client_data_json("webauthn.get", challenge, RP_ORIGIN);
        self.assert_with(credential_id, &auth_data, &client_data, user_handle)
    }

    /// Signs the given authenticator data and client data as an assertion.
    pub fn assert_with(
        &self,
        credential_id: &[u8],
        auth_data: &[u8],
        client_data: &[u8],
        user_handle: Option<&[u8]>,
    ) -> AuthenticationCredential {
        let signature = self.sign(&signed_message(auth_data, client_data));
        authentication_credential(credential_id, auth_data, client_data, &signature, user_handle)
    }
}

/// authenticatorData || SHA-256(clientDataJSON)
pub fn signed_message(auth_data: &[u8], client_data: &[u8]) -> Vec<u8> {
    let mut message = auth_data.to_vec();
    message.extend_from_slice(digest::digest(&SHA256, client_data).as_ref());
    message
}

pub fn rp_id_hash(rp_id: &str) -> Vec<u8> {
    digest::digest(&SHA256, rp_id.as_bytes()).as_ref().to_vec()
}

/// Encodes a CBOR value with ciborium.
pub fn to_cbor(value: &Value) -> Vec<u8> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes).unwrap();
    bytes
}

/// Helper function to create a COSE key map from label/value pairs
pub fn create_cose_key(entries: Vec<(i64, Value)>) -> Vec<u8> {
    let map = entries
        .into_iter()
        .map(|(label, value)| (Value::Integer(label.into()), value))
        .collect();
    to_cbor(&Value::Map(map))
}

/// Helper function to create a valid ES256 COSE key
pub fn create_es256_cose_key(x: &[u8], y: &[u8]) -> Vec<u8> {
    create_cose_key(vec![
        (1, Value::Integer(2.into())),         // kty: EC2
        (3, Value::Integer((-7).into())),      // alg: ES256
        (-1, Value::Integer(1.into())),        // crv: P-256
        (-2, Value::Bytes(x.to_vec())),        // x coordinate
        (-3, Value::Bytes(y.to_vec())),        // y coordinate
    ])
}

/// Helper function to create authenticator data without attested credential data
pub fn create_authenticator_data(rp_id: &str, flags: u8, counter: u32) -> Vec<u8> {
    let mut auth_data = rp_id_hash(rp_id);
    auth_data.push(flags);
    auth_data.extend_from_slice(&counter.to_be_bytes());
    auth_data
}

/// Helper function to create authenticator data carrying a credential
pub fn create_attested_authenticator_data(
    rp_id: &str,
    flags: u8,
    credential_id: &[u8],
    cose_key: &[u8],
) -> Vec<u8> {
    let mut auth_data = create_authenticator_data(rp_id, flags, 0);
    auth_data.extend_from_slice(&[0xAA; 16]); // aaguid
    auth_data.extend_from_slice(&(credential_id.len() as u16).to_be_bytes());
    auth_data.extend_from_slice(credential_id);
    auth_data.extend_from_slice(cose_key);
    auth_data
}

/// Helper function to create a "none" attestation object
pub fn create_attestation_object(auth_data: Vec<u8>) -> Vec<u8> {
    create_attestation_object_with("none", auth_data, Vec::new())
}

pub fn create_attestation_object_with(
    format: &str,
    auth_data: Vec<u8>,
    statement: Vec<(Value, Value)>,
) -> Vec<u8> {
    to_cbor(&Value::Map(vec![
        (Value::Text("fmt".into()), Value::Text(format.into())),
        (Value::Text("authData".into()), Value::Bytes(auth_data)),
        (Value::Text("attStmt".into()), Value::Map(statement)),
    ]))
}

/// Helper function to create client data JSON
pub fn create_client_data_json(type_: &str, challenge: &str, origin: &str) -> Vec<u8> {
    let client_data = serde_json::json!({
        "type": type_,
        "challenge": challenge,
        "origin": origin,
        "crossOrigin": false
    });
    serde_json::to_vec(&client_data).unwrap()
}

pub fn registration_credential(
    credential_id: &[u8],
    attestation_object: &[u8],
    client_data: &[u8],
) -> RegistrationCredential {
    RegistrationCredential {
        id: base64url::encode(credential_id),
        raw_id: base64url::encode(credential_id),
        type_: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
        response: AttestationResponse {
            attestation_object: base64url::encode(attestation_object),
            client_data_json: base64url::encode(client_data),
        },
    }
}

pub fn authentication_credential(
    credential_id: &[u8],
    auth_data: &[u8],
    client_data: &[u8],
    signature: &[u8],
    user_handle: Option<&[u8]>,
) -> AuthenticationCredential {
    AuthenticationCredential {
        id: base64url::encode(credential_id),
        raw_id: base64url::encode(credential_id),
        type_: PUBLIC_KEY_CREDENTIAL_TYPE.to_string(),
        response: AssertionResponse {
            authenticator_data: base64url::encode(auth_data),
            client_data_json: base64url::encode(client_data),
            signature: base64url::encode(signature),
            user_handle: user_handle.map(base64url::encode),
        },
    }
}
