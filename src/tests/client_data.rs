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

use super::helpers::{create_client_data_json, RP_ORIGIN};
use crate::*;

const CHALLENGE: &str = "dGVzdF9jaGFsbGVuZ2VfMTIz";

fn parse(json: serde_json::Value) -> std::result::Result<ClientData, ClientDataError> {
    ClientData::from_bytes(&serde_json::to_vec(&json).unwrap())
}

// ===== ClientDataType tests =====

#[test]
fn test_client_data_type_strings() {
    assert_eq!(ClientDataType::Create.as_str(), "webauthn.create");
    assert_eq!(ClientDataType::Get.as_str(), "webauthn.get");
    assert_eq!(ClientDataType::Get.to_string(), "webauthn.get");
    assert_eq!("webauthn.create".parse::<ClientDataType>(), Ok(ClientDataType::Create));
    assert_eq!(
        "webauthn.payment".parse::<ClientDataType>(),
        Err(ClientDataError::UnknownType("webauthn.payment".into()))
    );
}

// ===== Parsing tests =====

#[test]
fn test_parse_create() {
    let client_data = ClientData::from_bytes(&create_client_data_json(
        "webauthn.create",
        CHALLENGE,
        RP_ORIGIN,
    ))
    .unwrap();

    assert_eq!(client_data.type_, ClientDataType::Create);
    assert_eq!(client_data.challenge, CHALLENGE);
    assert_eq!(client_data.origin, RP_ORIGIN);
    assert!(!client_data.cross_origin);
}

#[test]
fn test_parse_cross_origin_defaults_to_false() {
    let client_data = parse(serde_json::json!({
        "type": "webauthn.get",
        "challenge": CHALLENGE,
        "origin": RP_ORIGIN
    }))
    .unwrap();
    assert!(!client_data.cross_origin);
}

#[test]
fn test_parse_ignores_unknown_fields() {
    let client_data = parse(serde_json::json!({
        "type": "webauthn.get",
        "challenge": CHALLENGE,
        "origin": RP_ORIGIN,
        "tokenBinding": { "status": "supported" },
        "other_keys_can_be_added_here": "do not compare clientDataJSON against a template"
    }))
    .unwrap();
    assert_eq!(client_data.type_, ClientDataType::Get);
}

#[test]
fn test_parse_missing_fields() {
    let missing_type = parse(serde_json::json!({ "challenge": CHALLENGE, "origin": RP_ORIGIN }));
    assert_eq!(missing_type.unwrap_err(), ClientDataError::MissingField("type"));

    let missing_challenge = parse(serde_json::json!({ "type": "webauthn.get", "origin": RP_ORIGIN }));
    assert_eq!(
        missing_challenge.unwrap_err(),
        ClientDataError::MissingField("challenge")
    );

    let missing_origin = parse(serde_json::json!({ "type": "webauthn.get", "challenge": CHALLENGE }));
    assert_eq!(missing_origin.unwrap_err(), ClientDataError::MissingField("origin"));
}

#[test]
fn test_parse_wrong_field_type() {
    let result = parse(serde_json::json!({
        "type": "webauthn.get",
        "challenge": 12345,
        "origin": RP_ORIGIN
    }));
    assert_eq!(
        result.unwrap_err(),
        ClientDataError::InvalidJson("challenge must be a string".into())
    );

    let result = parse(serde_json::json!({
        "type": ["webauthn.get"],
        "challenge": CHALLENGE,
        "origin": RP_ORIGIN
    }));
    assert!(matches!(result, Err(ClientDataError::InvalidJson(_))));
}

#[test]
fn test_parse_cross_origin_must_be_boolean() {
    for value in [serde_json::json!("true"), serde_json::json!(1), serde_json::json!({})] {
        let result = parse(serde_json::json!({
            "type": "webauthn.get",
            "challenge": CHALLENGE,
            "origin": RP_ORIGIN,
            "crossOrigin": value
        }));
        assert_eq!(
            result.unwrap_err(),
            ClientDataError::InvalidJson("crossOrigin must be a boolean".into())
        );
    }

    let client_data = parse(serde_json::json!({
        "type": "webauthn.get",
        "challenge": CHALLENGE,
        "origin": RP_ORIGIN,
        "crossOrigin": false
    }))
    .unwrap();
    assert!(!client_data.cross_origin);
}

#[test]
fn test_parse_unknown_type() {
    let result = parse(serde_json::json!({
        "type": "payment.get",
        "challenge": CHALLENGE,
        "origin": RP_ORIGIN
    }));
    assert!(matches!(result, Err(ClientDataError::UnknownType(ref t)) if t == "payment.get"));
}

#[test]
fn test_parse_invalid_json() {
    assert!(matches!(
        ClientData::from_bytes(b"{not json"),
        Err(ClientDataError::InvalidJson(_))
    ));
    assert!(matches!(
        ClientData::from_bytes(b"[\"webauthn.get\"]"),
        Err(ClientDataError::InvalidJson(_))
    ));
    assert!(matches!(
        ClientData::from_bytes(&[0xFF, 0xFE]),
        Err(ClientDataError::InvalidJson(_))
    ));
}

#[test]
fn test_from_base64() {
    let encoded = base64url::encode(&create_client_data_json("webauthn.get", CHALLENGE, RP_ORIGIN));
    let client_data = ClientData::from_base64(&encoded).unwrap();
    assert_eq!(client_data.type_, ClientDataType::Get);

    assert!(matches!(
        ClientData::from_base64("not*base64"),
        Err(Error::Base64(_))
    ));
    assert!(matches!(
        ClientData::from_base64(&base64url::encode(b"plain text")),
        Err(Error::ClientData(ClientDataError::InvalidJson(_)))
    ));
}

// ===== Verification tests =====

fn client_data(type_: &str, challenge: &str, origin: &str) -> ClientData {
    ClientData::from_bytes(&create_client_data_json(type_, challenge, origin)).unwrap()
}

#[test]
fn test_verify_success() {
    let data = client_data("webauthn.create", CHALLENGE, RP_ORIGIN);
    assert_eq!(data.verify(ClientDataType::Create, CHALLENGE, RP_ORIGIN), Ok(()));
}

#[test]
fn test_verify_type_mismatch() {
    let data = client_data("webauthn.get", CHALLENGE, RP_ORIGIN);
    assert_eq!(
        data.verify(ClientDataType::Create, CHALLENGE, RP_ORIGIN),
        Err(ClientDataError::TypeMismatch {
            expected: "webauthn.create",
            received: "webauthn.get"
        })
    );
}

#[test]
fn test_verify_challenge_mismatch() {
    let data = client_data("webauthn.get", "d3JvbmdfY2hhbGxlbmdl", RP_ORIGIN);
    assert_eq!(
        data.verify(ClientDataType::Get, CHALLENGE, RP_ORIGIN),
        Err(ClientDataError::ChallengeMismatch)
    );
}

#[test]
fn test_verify_origin_mismatch() {
    let data = client_data("webauthn.get", CHALLENGE, "https://evil.test");
    assert_eq!(
        data.verify(ClientDataType::Get, CHALLENGE, RP_ORIGIN),
        Err(ClientDataError::OriginMismatch {
            expected: RP_ORIGIN.into(),
            received: "https://evil.test".into()
        })
    );
}

#[test]
fn test_verify_origin_is_exact() {
    for origin in [
        "https://example.test/",
        "https://example.test:443",
        "http://example.test",
        "https://login.example.test",
        "https://EXAMPLE.test",
    ] {
        let data = client_data("webauthn.get", CHALLENGE, origin);
        assert!(
            matches!(
                data.verify(ClientDataType::Get, CHALLENGE, RP_ORIGIN),
                Err(ClientDataError::OriginMismatch { .. })
            ),
            "{origin} should not match"
        );
    }
}

#[test]
fn test_verify_cross_origin_rejected() {
    let data = parse(serde_json::json!({
        "type": "webauthn.get",
        "challenge": CHALLENGE,
        "origin": RP_ORIGIN,
        "crossOrigin": true
    }))
    .unwrap();
    assert_eq!(
        data.verify(ClientDataType::Get, CHALLENGE, RP_ORIGIN),
        Err(ClientDataError::CrossOrigin)
    );
}

#[test]
fn test_verify_checks_type_before_challenge_and_origin() {
    let data = client_data("webauthn.create", "d3Jvbmc", "https://evil.test");
    assert!(matches!(
        data.verify(ClientDataType::Get, CHALLENGE, RP_ORIGIN),
        Err(ClientDataError::TypeMismatch { .. })
    ));

    let data = client_data("webauthn.get", "d3Jvbmc", "https://evil.test");
    assert_eq!(
        data.verify(ClientDataType::Get, CHALLENGE, RP_ORIGIN),
        Err(ClientDataError::ChallengeMismatch)
    );
}
