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

//! Attestation object decoding.

use crate::authenticator_data::AuthenticatorData;
use crate::cbor;
use crate::error::{AttestationError, Result};

/// The only attestation statement format accepted.
pub const FORMAT_NONE: &str = "none";

/// A decoded attestation object (`fmt`, `authData`, `attStmt`).
#[derive(Debug, Clone)]
pub struct AttestationObject {
    /// Attestation statement format.
    pub format: String,

    /// Authenticator data bytes as sent by the client.
    pub raw_auth_data: Vec<u8>,

    /// Parsed authenticator data.
    pub auth_data: AuthenticatorData,
}

impl AttestationObject {
    /// Decodes an attestation object and parses its authenticator data.
    ///
    /// Only the `none` format with an empty statement is accepted.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value = cbor::decode(bytes).map_err(AttestationError::from)?;
        if value.as_map().is_none() {
            return Err(AttestationError::NotAMap.into());
        }

        let format = value
            .get_text("fmt")
            .ok_or(AttestationError::MissingField("fmt"))?
            .as_text()
            .ok_or(AttestationError::InvalidField("fmt"))?
            .to_string();

        let raw_auth_data = value
            .get_text("authData")
            .ok_or(AttestationError::MissingField("authData"))?
            .as_bytes()
            .ok_or(AttestationError::InvalidField("authData"))?
            .to_vec();

        let statement = value
            .get_text("attStmt")
            .ok_or(AttestationError::MissingField("attStmt"))?
            .as_map()
            .ok_or(AttestationError::InvalidField("attStmt"))?;

        if format != FORMAT_NONE {
            return Err(AttestationError::UnsupportedFormat(format).into());
        }
        if !statement.is_empty() {
            return Err(AttestationError::UnexpectedStatement.into());
        }

        let auth_data = AuthenticatorData::parse(&raw_auth_data)?;

        Ok(AttestationObject {
            format,
            raw_auth_data,
            auth_data,
        })
    }
}
