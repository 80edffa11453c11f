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

use ciborium::Value;

use super::helpers::*;
use crate::*;

const AT: u8 = AuthenticatorFlags::ATTESTED_CREDENTIAL_DATA;
const ED: u8 = AuthenticatorFlags::EXTENSION_DATA;
const UP: u8 = AuthenticatorFlags::USER_PRESENT;

fn extensions_map() -> Vec<u8> {
    to_cbor(&Value::Map(vec![(
        Value::Text("credProtect".into()),
        Value::Integer(1.into()),
    )]))
}

// ===== Length guards =====

#[test]
fn test_parse_too_short() {
    for len in [0, 1, 32, 36] {
        assert_eq!(
            AuthenticatorData::parse(&vec![0u8; len]),
            Err(AuthenticatorDataError::AuthDataTooShort(len))
        );
    }
}

#[test]
fn test_parse_minimal() {
    let bytes = create_authenticator_data(RP_ID, 0, 0);
    assert_eq!(bytes.len(), 37);

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    assert_eq!(auth_data.rp_id_hash.to_vec(), rp_id_hash(RP_ID));
    assert_eq!(auth_data.flags.bits(), 0);
    assert_eq!(auth_data.sign_count, 0);
    assert!(auth_data.attested_credential_data.is_none());
    assert!(auth_data.extensions.is_none());
}

#[test]
fn test_parse_counter_is_big_endian() {
    let bytes = create_authenticator_data(RP_ID, UP, 0x0102_0304);
    assert_eq!(&bytes[33..37], &[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(AuthenticatorData::parse(&bytes).unwrap().sign_count, 0x0102_0304);
}

#[test]
fn test_attested_flag_without_data() {
    // Header only
    let bytes = create_authenticator_data(RP_ID, UP | AT, 0);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::AttestedCredentialDataMissing)
    );

    // AAGUID and length, but nothing after byte 55
    let mut bytes = create_authenticator_data(RP_ID, UP | AT, 0);
    bytes.extend_from_slice(&[0u8; 18]);
    assert_eq!(bytes.len(), 55);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::AttestedCredentialDataMissing)
    );
}

// ===== Attested credential data =====

#[test]
fn test_parse_attested_credential_data() {
    let cose_key = create_es256_cose_key(&[2u8; 32], &[3u8; 32]);
    let bytes = create_attested_authenticator_data(RP_ID, UP | AT, &[0x01, 0x02], &cose_key);

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    assert!(auth_data.flags.attested_credential_data());

    let attested = auth_data.attested_credential_data.unwrap();
    assert_eq!(attested.aaguid, [0xAA; 16]);
    assert_eq!(attested.credential_id, vec![0x01, 0x02]);
    assert_eq!(attested.public_key_bytes, cose_key);
    assert_eq!(attested.public_key.algorithm(), CoseAlgorithm::Es256);
}

#[test]
fn test_credential_id_too_long() {
    let mut bytes = create_authenticator_data(RP_ID, UP | AT, 0);
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&1024u16.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 1024]);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::CredentialIdTooLong(1024))
    );
}

#[test]
fn test_credential_id_at_maximum_length() {
    let credential_id = vec![7u8; 1023];
    let cose_key = create_es256_cose_key(&[2u8; 32], &[3u8; 32]);
    let bytes = create_attested_authenticator_data(RP_ID, UP | AT, &credential_id, &cose_key);

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    assert_eq!(
        auth_data.attested_credential_data.unwrap().credential_id,
        credential_id
    );
}

#[test]
fn test_credential_id_truncated() {
    let mut bytes = create_authenticator_data(RP_ID, UP | AT, 0);
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&100u16.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 10]);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::CredentialIdTruncated)
    );
}

#[test]
fn test_invalid_credential_public_key() {
    let cose_key = create_cose_key(vec![
        (1, Value::Integer(2.into())),
        (3, Value::Integer((-257).into())),
    ]);
    let bytes = create_attested_authenticator_data(RP_ID, UP | AT, &[0x01], &cose_key);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::Cose(CoseError::UnsupportedAlgorithm(-257)))
    );
}

#[test]
fn test_missing_credential_public_key() {
    // Credential ID runs exactly to the end
    let mut bytes = create_authenticator_data(RP_ID, UP | AT, 0);
    bytes.extend_from_slice(&[0u8; 16]);
    bytes.extend_from_slice(&2u16.to_be_bytes());
    bytes.extend_from_slice(&[0x01, 0x02]);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::Cbor(CborError::Truncated))
    );
}

// ===== Leftover bytes =====

#[test]
fn test_leftover_bytes_without_flags() {
    let mut bytes = create_authenticator_data(RP_ID, UP, 0);
    bytes.extend_from_slice(&[0xDE, 0xAD]);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::LeftOverBytes(2))
    );
}

#[test]
fn test_leftover_bytes_after_public_key() {
    let cose_key = create_es256_cose_key(&[2u8; 32], &[3u8; 32]);
    let mut bytes = create_attested_authenticator_data(RP_ID, UP | AT, &[0x01], &cose_key);
    bytes.extend_from_slice(&[0x00, 0x00]);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::LeftOverBytes(2))
    );
}

// ===== Extensions =====

#[test]
fn test_parse_extensions() {
    let mut bytes = create_authenticator_data(RP_ID, UP | ED, 1);
    bytes.extend_from_slice(&extensions_map());

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    assert!(auth_data.flags.extension_data());
    assert_eq!(auth_data.extensions, Some(extensions_map()));
}

#[test]
fn test_parse_attested_data_and_extensions() {
    let cose_key = create_es256_cose_key(&[2u8; 32], &[3u8; 32]);
    let mut bytes = create_attested_authenticator_data(RP_ID, UP | AT | ED, &[9; 16], &cose_key);
    bytes.extend_from_slice(&extensions_map());

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    let attested = auth_data.attested_credential_data.unwrap();
    assert_eq!(attested.public_key_bytes, cose_key);
    assert_eq!(auth_data.extensions, Some(extensions_map()));
}

#[test]
fn test_extension_flag_without_data() {
    let bytes = create_authenticator_data(RP_ID, UP | ED, 0);
    assert_eq!(
        AuthenticatorData::parse(&bytes),
        Err(AuthenticatorDataError::ExtensionDataMissing)
    );
}

#[test]
fn test_extensions_are_opaque() {
    // hmac-secret output is a boolean, which the CBOR reader does not accept
    let block = to_cbor(&Value::Map(vec![(
        Value::Text("hmac-secret".into()),
        Value::Bool(true),
    )]));
    let mut bytes = create_authenticator_data(RP_ID, UP | ED, 1);
    bytes.extend_from_slice(&block);

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    assert_eq!(auth_data.extensions, Some(block));
    assert_eq!(auth_data.sign_count, 1);
}

#[test]
fn test_extension_block_takes_all_remaining_bytes() {
    let cose_key = create_es256_cose_key(&[2u8; 32], &[3u8; 32]);
    let mut bytes = create_attested_authenticator_data(RP_ID, UP | AT | ED, &[0x01], &cose_key);
    bytes.extend_from_slice(&[0x01, 0xF5, 0x00]);

    let auth_data = AuthenticatorData::parse(&bytes).unwrap();
    assert_eq!(
        auth_data.attested_credential_data.unwrap().public_key_bytes,
        cose_key
    );
    assert_eq!(auth_data.extensions, Some(vec![0x01, 0xF5, 0x00]));
}

// ===== Flags and RP ID =====

#[test]
fn test_flags() {
    let flags = AuthenticatorFlags::from_bits(0x5D);
    assert!(flags.user_present());
    assert!(flags.user_verified());
    assert!(flags.backup_eligible());
    assert!(flags.backup_state());
    assert!(flags.attested_credential_data());
    assert!(!flags.extension_data());

    let none = AuthenticatorFlags::default();
    assert!(!none.user_present());
    assert!(!none.user_verified());
}

#[test]
fn test_matches_rp_id() {
    let auth_data = AuthenticatorData::parse(&create_authenticator_data(RP_ID, UP, 0)).unwrap();
    assert!(auth_data.matches_rp_id(RP_ID));
    assert!(!auth_data.matches_rp_id("evil.test"));
}
