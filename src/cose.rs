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

//! COSE_Key decoding and signature verification.
//!
//! Only EC2 keys on P-256 with ES256 are supported. Key types, curves and
//! algorithms are closed enums: adding one means adding a variant here, and
//! anything unknown fails closed at decode time.

use aws_lc_rs::signature::{UnparsedPublicKey, ECDSA_P256_SHA256_ASN1};

use crate::cbor::{self, CborValue};
use crate::error::{CoseError, Error, Result};

// COSE_Key map labels (RFC 9052 §7, RFC 9053 §7.1)
const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV: i64 = -1;
const LABEL_X: i64 = -2;
const LABEL_Y: i64 = -3;

/// COSE key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseKeyType {
    /// Elliptic curve key with x and y coordinates (kty = 2).
    Ec2,
}

impl CoseKeyType {
    pub fn identifier(self) -> i64 {
        match self {
            CoseKeyType::Ec2 => 2,
        }
    }
}

impl TryFrom<i64> for CoseKeyType {
    type Error = CoseError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            2 => Ok(CoseKeyType::Ec2),
            other => Err(CoseError::UnsupportedKeyType(other)),
        }
    }
}

/// COSE signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlgorithm {
    /// ECDSA with P-256 and SHA-256 (alg = -7).
    Es256,
}

impl CoseAlgorithm {
    pub fn identifier(self) -> i64 {
        match self {
            CoseAlgorithm::Es256 => -7,
        }
    }
}

impl TryFrom<i64> for CoseAlgorithm {
    type Error = CoseError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            -7 => Ok(CoseAlgorithm::Es256),
            other => Err(CoseError::UnsupportedAlgorithm(other)),
        }
    }
}

/// COSE elliptic curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    /// NIST P-256 (crv = 1).
    P256,
}

impl EcCurve {
    pub fn identifier(self) -> i64 {
        match self {
            EcCurve::P256 => 1,
        }
    }

    /// Width in bytes of one affine coordinate.
    pub fn coordinate_len(self) -> usize {
        match self {
            EcCurve::P256 => 32,
        }
    }
}

impl TryFrom<i64> for EcCurve {
    type Error = CoseError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(EcCurve::P256),
            other => Err(CoseError::UnsupportedCurve(other)),
        }
    }
}

/// An EC2 public key. Both coordinates are exactly `curve.coordinate_len()` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2PublicKey {
    algorithm: CoseAlgorithm,
    curve: EcCurve,
    x: Vec<u8>,
    y: Vec<u8>,
}

impl Ec2PublicKey {
    pub fn algorithm(&self) -> CoseAlgorithm {
        self.algorithm
    }

    pub fn curve(&self) -> EcCurve {
        self.curve
    }

    pub fn x(&self) -> &[u8] {
        &self.x
    }

    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// SEC1 uncompressed point encoding (`0x04 || x || y`).
    pub fn to_uncompressed_point(&self) -> Vec<u8> {
        let mut point = Vec::with_capacity(1 + self.x.len() + self.y.len());
        point.push(0x04);
        point.extend_from_slice(&self.x);
        point.extend_from_slice(&self.y);
        point
    }
}

/// A credential public key decoded from a COSE_Key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CosePublicKey {
    Ec2(Ec2PublicKey),
}

impl CosePublicKey {
    /// Decodes a COSE_Key from its CBOR encoding. The input must hold exactly one item.
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, CoseError> {
        let value = cbor::decode(bytes)?;
        Self::from_cbor(&value)
    }

    /// Decodes a COSE_Key from an already decoded CBOR map.
    ///
    /// # Errors
    ///
    /// * [`CoseError::MissingField`] naming the first absent label
    /// * [`CoseError::UnsupportedKeyType`], [`CoseError::UnsupportedAlgorithm`]
    ///   or [`CoseError::UnsupportedCurve`] for anything but EC2/ES256/P-256
    /// * [`CoseError::InvalidCoordinateLength`] if x or y is not 32 bytes
    pub fn from_cbor(value: &CborValue) -> std::result::Result<Self, CoseError> {
        if value.as_map().is_none() {
            return Err(CoseError::NotAMap);
        }

        let key_type = CoseKeyType::try_from(int_field(value, LABEL_KTY, "kty")?)?;
        let algorithm = CoseAlgorithm::try_from(int_field(value, LABEL_ALG, "alg")?)?;

        match key_type {
            CoseKeyType::Ec2 => {
                let curve = EcCurve::try_from(int_field(value, LABEL_CRV, "crv")?)?;
                let x = coordinate(value, LABEL_X, "x", curve)?;
                let y = coordinate(value, LABEL_Y, "y", curve)?;

                Ok(CosePublicKey::Ec2(Ec2PublicKey {
                    algorithm,
                    curve,
                    x,
                    y,
                }))
            }
        }
    }

    pub fn key_type(&self) -> CoseKeyType {
        match self {
            CosePublicKey::Ec2(_) => CoseKeyType::Ec2,
        }
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        match self {
            CosePublicKey::Ec2(key) => key.algorithm,
        }
    }

    /// Verifies `signature` over `message` with this key.
    ///
    /// For ES256 the signature is ASN.1 DER encoded and the message is hashed
    /// with SHA-256 by the verifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SignatureInvalid`] if verification fails for any reason,
    /// including a public key that is not a valid curve point.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        match self {
            CosePublicKey::Ec2(key) => match (key.algorithm, key.curve) {
                (CoseAlgorithm::Es256, EcCurve::P256) => {
                    let point = key.to_uncompressed_point();
                    UnparsedPublicKey::new(&ECDSA_P256_SHA256_ASN1, &point)
                        .verify(message, signature)
                        .map_err(|_| Error::SignatureInvalid)
                }
            },
        }
    }
}

fn int_field(
    map: &CborValue,
    label: i64,
    name: &'static str,
) -> std::result::Result<i64, CoseError> {
    map.get_int(label)
        .ok_or(CoseError::MissingField(name))?
        .as_integer()
        .ok_or(CoseError::InvalidField(name))
}

fn coordinate(
    map: &CborValue,
    label: i64,
    name: &'static str,
    curve: EcCurve,
) -> std::result::Result<Vec<u8>, CoseError> {
    let bytes = map
        .get_int(label)
        .ok_or(CoseError::MissingField(name))?
        .as_bytes()
        .ok_or(CoseError::InvalidField(name))?;

    if bytes.len() != curve.coordinate_len() {
        return Err(CoseError::InvalidCoordinateLength {
            field: name,
            len: bytes.len(),
            expected: curve.coordinate_len(),
        });
    }

    Ok(bytes.to_vec())
}
