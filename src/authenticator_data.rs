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

//! Authenticator data parsing.
//!
//! Layout (big-endian):
//!
//! | Offset | Length | Field |
//! |---|---|---|
//! | 0 | 32 | RP ID hash |
//! | 32 | 1 | Flags |
//! | 33 | 4 | Signature counter |
//! | 37 | 16 | AAGUID (AT flag only) |
//! | 53 | 2 | Credential ID length `L` (AT flag only) |
//! | 55 | L | Credential ID (AT flag only) |
//! | 55+L | var | COSE public key (AT flag only), then extensions (ED flag only) |
//!
//! Every byte must be accounted for by the flags. Leftover bytes are an error.

use aws_lc_rs::digest::{self, SHA256};

use crate::cbor;
use crate::cose::CosePublicKey;
use crate::error::AuthenticatorDataError;

/// Length of the fixed header (RP ID hash, flags, counter).
pub const MIN_LEN: usize = 37;

/// Offset where the credential ID starts when attested credential data is present.
const CREDENTIAL_ID_OFFSET: usize = 55;

/// Upper bound on credential ID length.
pub const MAX_CREDENTIAL_ID_LEN: usize = 1023;

/// Authenticator flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthenticatorFlags(u8);

impl AuthenticatorFlags {
    pub const USER_PRESENT: u8 = 0x01;
    pub const USER_VERIFIED: u8 = 0x04;
    pub const BACKUP_ELIGIBLE: u8 = 0x08;
    pub const BACKUP_STATE: u8 = 0x10;
    pub const ATTESTED_CREDENTIAL_DATA: u8 = 0x40;
    pub const EXTENSION_DATA: u8 = 0x80;

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn user_present(self) -> bool {
        self.0 & Self::USER_PRESENT != 0
    }

    pub fn user_verified(self) -> bool {
        self.0 & Self::USER_VERIFIED != 0
    }

    pub fn backup_eligible(self) -> bool {
        self.0 & Self::BACKUP_ELIGIBLE != 0
    }

    pub fn backup_state(self) -> bool {
        self.0 & Self::BACKUP_STATE != 0
    }

    pub fn attested_credential_data(self) -> bool {
        self.0 & Self::ATTESTED_CREDENTIAL_DATA != 0
    }

    pub fn extension_data(self) -> bool {
        self.0 & Self::EXTENSION_DATA != 0
    }
}

/// Credential data attached to authenticator data during registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData {
    /// Authenticator model identifier.
    pub aaguid: [u8; 16],

    /// The new credential's ID.
    pub credential_id: Vec<u8>,

    /// The COSE_Key exactly as encoded by the authenticator.
    pub public_key_bytes: Vec<u8>,

    /// The decoded public key.
    pub public_key: CosePublicKey,
}

/// Parsed authenticator data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData {
    /// SHA-256 of the RP ID the authenticator scoped the credential to.
    pub rp_id_hash: [u8; 32],

    pub flags: AuthenticatorFlags,

    /// Signature counter (0 for authenticators without a counter).
    pub sign_count: u32,

    /// Present only when the attested credential data flag is set.
    pub attested_credential_data: Option<AttestedCredentialData>,

    /// Raw extension block, present only when the extension data flag is set.
    /// Not interpreted.
    pub extensions: Option<Vec<u8>>,
}

impl AuthenticatorData {
    /// Parses raw authenticator data.
    ///
    /// # Errors
    ///
    /// * [`AuthenticatorDataError::AuthDataTooShort`] below 37 bytes
    /// * [`AuthenticatorDataError::AttestedCredentialDataMissing`] if the AT flag
    ///   is set but the input ends at or before byte 55
    /// * [`AuthenticatorDataError::LeftOverBytes`] if bytes remain that no flag
    ///   accounts for
    /// * [`AuthenticatorDataError::ExtensionDataMissing`] if the ED flag is set
    ///   but no bytes follow
    /// * CBOR/COSE errors for a malformed credential public key
    pub fn parse(bytes: &[u8]) -> Result<Self, AuthenticatorDataError> {
        if bytes.len() < MIN_LEN {
            return Err(AuthenticatorDataError::AuthDataTooShort(bytes.len()));
        }

        let mut rp_id_hash = [0u8; 32];
        rp_id_hash.copy_from_slice(&bytes[..32]);
        let flags = AuthenticatorFlags::from_bits(bytes[32]);
        let sign_count = u32::from_be_bytes([bytes[33], bytes[34], bytes[35], bytes[36]]);

        let mut offset = MIN_LEN;

        let attested_credential_data = if flags.attested_credential_data() {
            let (data, end) = Self::parse_attested_credential_data(bytes)?;
            offset = end;
            Some(data)
        } else {
            None
        };

        let extensions = if flags.extension_data() {
            // Opaque: everything after the credential data is the extension block
            if offset == bytes.len() {
                return Err(AuthenticatorDataError::ExtensionDataMissing);
            }
            let raw = bytes[offset..].to_vec();
            offset = bytes.len();
            Some(raw)
        } else {
            None
        };

        if offset != bytes.len() {
            return Err(AuthenticatorDataError::LeftOverBytes(bytes.len() - offset));
        }

        Ok(AuthenticatorData {
            rp_id_hash,
            flags,
            sign_count,
            attested_credential_data,
            extensions,
        })
    }

    /// Returns the attested credential data and the offset just past the COSE key.
    fn parse_attested_credential_data(
        bytes: &[u8],
    ) -> Result<(AttestedCredentialData, usize), AuthenticatorDataError> {
        if bytes.len() <= CREDENTIAL_ID_OFFSET {
            return Err(AuthenticatorDataError::AttestedCredentialDataMissing);
        }

        let mut aaguid = [0u8; 16];
        aaguid.copy_from_slice(&bytes[37..53]);

        let id_len = u16::from_be_bytes([bytes[53], bytes[54]]) as usize;
        if id_len > MAX_CREDENTIAL_ID_LEN {
            return Err(AuthenticatorDataError::CredentialIdTooLong(id_len));
        }

        let key_offset = CREDENTIAL_ID_OFFSET + id_len;
        if key_offset > bytes.len() {
            return Err(AuthenticatorDataError::CredentialIdTruncated);
        }
        let credential_id = bytes[CREDENTIAL_ID_OFFSET..key_offset].to_vec();

        // The key is one CBOR item; anything after it belongs to extensions.
        let (value, used) = cbor::decode_prefix(&bytes[key_offset..])?;
        let public_key = CosePublicKey::from_cbor(&value)?;
        let end = key_offset + used;

        Ok((
            AttestedCredentialData {
                aaguid,
                credential_id,
                public_key_bytes: bytes[key_offset..end].to_vec(),
                public_key,
            },
            end,
        ))
    }

    /// Checks the RP ID hash against SHA-256 of `rp_id`.
    pub fn matches_rp_id(&self, rp_id: &str) -> bool {
        digest::digest(&SHA256, rp_id.as_bytes()).as_ref() == &self.rp_id_hash[..]
    }
}
