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

//! Client data parsing and verification for WebAuthn operations.

use std::fmt;
use std::str::FromStr;

use crate::base64url;
use crate::error::{ClientDataError, Result};

/// The type of WebAuthn operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDataType {
    /// Registration operation ("webauthn.create").
    Create,
    /// Authentication operation ("webauthn.get").
    Get,
}

impl ClientDataType {
    /// Returns the string representation used in the client data JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientDataType::Create => "webauthn.create",
            ClientDataType::Get => "webauthn.get",
        }
    }
}

impl FromStr for ClientDataType {
    type Err = ClientDataError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "webauthn.create" => Ok(ClientDataType::Create),
            "webauthn.get" => Ok(ClientDataType::Get),
            _ => Err(ClientDataError::UnknownType(s.to_string())),
        }
    }
}

impl fmt::Display for ClientDataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reads a required string member: absent is `MissingField`, any other type
/// is `InvalidJson`.
fn string_field<'a>(
    json: &'a serde_json::Value,
    name: &'static str,
) -> std::result::Result<&'a str, ClientDataError> {
    match json.get(name) {
        None | Some(serde_json::Value::Null) => Err(ClientDataError::MissingField(name)),
        Some(serde_json::Value::String(s)) => Ok(s),
        Some(_) => Err(ClientDataError::InvalidJson(format!("{name} must be a string"))),
    }
}

/// Parsed client data from WebAuthn operations.
///
/// This structure contains the parsed fields from the client data JSON
/// that is sent by the browser during registration and authentication.
#[derive(Debug)]
pub struct ClientData {
    /// The type of operation (Create for registration, Get for authentication).
    pub type_: ClientDataType,

    /// The challenge that was signed (base64url-encoded).
    pub challenge: String,

    /// The origin of the requesting page.
    pub origin: String,

    /// Whether the request came from a cross-origin iframe.
    pub cross_origin: bool,
}

impl ClientData {
    /// Parses client data from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientDataError::InvalidJson`] if the bytes are not a JSON
    /// object or a member has the wrong type, [`ClientDataError::MissingField`]
    /// if `type`, `challenge` or `origin` is absent, and
    /// [`ClientDataError::UnknownType`] for a type other than
    /// `webauthn.create` / `webauthn.get`.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<ClientData, ClientDataError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)
            .map_err(|e| ClientDataError::InvalidJson(e.to_string()))?;

        if !json.is_object() {
            return Err(ClientDataError::InvalidJson("expected an object".into()));
        }

        let type_ = string_field(&json, "type")?.parse::<ClientDataType>()?;
        let challenge = string_field(&json, "challenge")?.to_string();
        let origin = string_field(&json, "origin")?.to_string();

        let cross_origin = match &json["crossOrigin"] {
            serde_json::Value::Null => false,
            serde_json::Value::Bool(b) => *b,
            _ => {
                return Err(ClientDataError::InvalidJson(
                    "crossOrigin must be a boolean".into(),
                ))
            }
        };

        Ok(ClientData {
            type_,
            challenge,
            origin,
            cross_origin,
        })
    }

    /// Parses a base64url-encoded client data JSON string.
    #[inline]
    pub fn from_base64(client_data_json: &str) -> Result<ClientData> {
        let bytes = base64url::decode(client_data_json)?;
        Ok(Self::from_bytes(&bytes)?)
    }

    /// Verifies the client data against expected values.
    ///
    /// Checks run in order and stop at the first mismatch: type, challenge,
    /// origin, then the cross-origin flag. The challenge is compared as the
    /// base64url string the relying party issued; the origin must match
    /// exactly, with no wildcard or suffix matching.
    pub fn verify(
        &self,
        expected_type: ClientDataType,
        expected_challenge: &str,
        expected_origin: &str,
    ) -> std::result::Result<(), ClientDataError> {
        if self.type_ != expected_type {
            return Err(ClientDataError::TypeMismatch {
                expected: expected_type.as_str(),
                received: self.type_.as_str(),
            });
        }

        if self.challenge != expected_challenge {
            return Err(ClientDataError::ChallengeMismatch);
        }

        if self.origin != expected_origin {
            return Err(ClientDataError::OriginMismatch {
                expected: expected_origin.to_string(),
                received: self.origin.clone(),
            });
        }

        if self.cross_origin {
            return Err(ClientDataError::CrossOrigin);
        }

        Ok(())
    }
}
