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

//! Error types for ceremony verification.
//!
//! Every failure names its cause. Each component has its own error enum; the
//! crate-level [`Error`] wraps them and classifies every failure into an
//! [`ErrorKind`] so hosts can decide what to expose and what to alert on.

use thiserror::Error;

/// Base64url decoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Base64Error {
    #[error("invalid base64url encoding: {0}")]
    InvalidEncoding(String),
}

/// CBOR decoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CborError {
    #[error("CBOR input is truncated")]
    Truncated,

    #[error("invalid CBOR major type or header")]
    InvalidMajorType,

    #[error("unsupported CBOR item: {0}")]
    UnsupportedType(&'static str),

    #[error("CBOR nesting exceeds {0} levels")]
    NestingTooDeep(usize),

    #[error("duplicate key in CBOR map")]
    DuplicateKey,

    #[error("CBOR text string is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0} trailing bytes after CBOR item")]
    TrailingBytes(usize),
}

/// COSE key decoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoseError {
    #[error("COSE key is not a CBOR map")]
    NotAMap,

    #[error("COSE key is missing field {0}")]
    MissingField(&'static str),

    #[error("COSE key field {0} has the wrong type")]
    InvalidField(&'static str),

    #[error("unsupported COSE key type {0}")]
    UnsupportedKeyType(i64),

    #[error("unsupported COSE algorithm {0}")]
    UnsupportedAlgorithm(i64),

    #[error("unsupported COSE curve {0}")]
    UnsupportedCurve(i64),

    #[error("COSE coordinate {field} is {len} bytes, expected {expected}")]
    InvalidCoordinateLength {
        field: &'static str,
        len: usize,
        expected: usize,
    },

    #[error(transparent)]
    Cbor(#[from] CborError),
}

/// Authenticator data parsing failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatorDataError {
    #[error("authenticator data is {0} bytes, expected at least 37")]
    AuthDataTooShort(usize),

    #[error("attested credential data flag is set but the data is missing")]
    AttestedCredentialDataMissing,

    #[error("credential ID length {0} exceeds 1023 bytes")]
    CredentialIdTooLong(usize),

    #[error("credential ID runs past the end of authenticator data")]
    CredentialIdTruncated,

    #[error("extension data flag is set but no extensions follow")]
    ExtensionDataMissing,

    #[error("{0} unaccounted bytes at the end of authenticator data")]
    LeftOverBytes(usize),

    #[error("invalid CBOR in authenticator data: {0}")]
    Cbor(#[from] CborError),

    #[error("invalid credential public key: {0}")]
    Cose(#[from] CoseError),
}

/// Attestation object decoding failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttestationError {
    #[error("invalid CBOR in attestation object: {0}")]
    Cbor(#[from] CborError),

    #[error("attestation object is not a CBOR map")]
    NotAMap,

    #[error("attestation object is missing {0}")]
    MissingField(&'static str),

    #[error("attestation object field {0} has the wrong type")]
    InvalidField(&'static str),

    #[error("unsupported attestation format: {0}")]
    UnsupportedFormat(String),

    #[error("attestation statement must be empty for the none format")]
    UnexpectedStatement,
}

/// Client data parsing or validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientDataError {
    #[error("invalid client data JSON: {0}")]
    InvalidJson(String),

    #[error("client data is missing {0}")]
    MissingField(&'static str),

    #[error("unknown client data type: {0}")]
    UnknownType(String),

    #[error("client data type mismatch: expected {expected}, got {received}")]
    TypeMismatch {
        expected: &'static str,
        received: &'static str,
    },

    #[error("client data challenge mismatch")]
    ChallengeMismatch,

    #[error("client data origin mismatch: expected {expected}, got {received}")]
    OriginMismatch { expected: String, received: String },

    #[error("cross-origin ceremonies are not allowed")]
    CrossOrigin,
}

impl ClientDataError {
    fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::InvalidJson(_) | Self::MissingField(_) | Self::UnknownType(_)
        )
    }
}

/// Challenge store failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChallengeError {
    #[error("no challenge issued for this session")]
    NotFound,

    #[error("challenge has expired")]
    Expired,

    #[error("challenge was already consumed")]
    AlreadyConsumed,

    #[error("secure random source unavailable")]
    RandomUnavailable,
}

/// Relying party configuration failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid relying party ID: {0}")]
    InvalidRpId(String),

    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("origin host {host} is not within relying party ID {rp_id}")]
    OriginOutsideRpId { host: String, rp_id: String },
}

/// Credential store collaborator failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("credential ID already exists")]
    Duplicate,

    #[error("credential not found")]
    NotFound,

    #[error("signature counter changed concurrently, now {current}")]
    CounterConflict { current: u32 },

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or unsupported data from the client or authenticator.
    Protocol,
    /// A ceremony check did not match (type, challenge, origin, RP ID, flags).
    Ceremony,
    /// Bad signature or counter regression; possibly a cloned authenticator.
    Security,
    /// The credential store or the random source failed.
    Collaborator,
    /// The relying party configuration is invalid.
    Configuration,
}

/// Errors returned by ceremony operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Base64(#[from] Base64Error),

    #[error(transparent)]
    Cbor(#[from] CborError),

    #[error(transparent)]
    Cose(#[from] CoseError),

    #[error(transparent)]
    AuthenticatorData(#[from] AuthenticatorDataError),

    #[error(transparent)]
    Attestation(#[from] AttestationError),

    #[error(transparent)]
    ClientData(#[from] ClientDataError),

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid credential type: {0}")]
    InvalidCredentialType(String),

    #[error("credential ID does not match rawId or authenticator data")]
    CredentialIdMismatch,

    #[error("user handle must be 16 to 64 bytes, got {0}")]
    InvalidUserHandle(usize),

    #[error("challenge was issued for a different ceremony")]
    ChallengePurposeMismatch,

    #[error("RP ID hash does not match the relying party")]
    RpIdHashMismatch,

    #[error("user presence flag is not set")]
    UserNotPresent,

    #[error("user verification is required but was not performed")]
    UserNotVerified,

    #[error("registration response has no attested credential data")]
    MissingAttestedCredentialData,

    #[error("assertion must not carry attested credential data")]
    UnexpectedAttestedCredentialData,

    #[error("credential ID is already registered")]
    CredentialIdAlreadyRegistered,

    #[error("no credentials are allowed for this authentication")]
    NoAllowedCredentials,

    #[error("credential is not in the allowed list")]
    CredentialNotAllowed,

    #[error("unknown credential")]
    UnknownCredential,

    #[error("user handle does not match the credential owner")]
    UserHandleMismatch,

    #[error("signature verification failed")]
    SignatureInvalid,

    #[error("signature counter regression: stored {stored}, received {received}")]
    SignatureCounterRegression { stored: u32, received: u32 },
}

impl Error {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Base64(_)
            | Error::Cbor(_)
            | Error::Cose(_)
            | Error::AuthenticatorData(_)
            | Error::Attestation(_)
            | Error::InvalidCredentialType(_)
            | Error::CredentialIdMismatch
            | Error::InvalidUserHandle(_)
            | Error::MissingAttestedCredentialData
            | Error::UnexpectedAttestedCredentialData => ErrorKind::Protocol,

            Error::ClientData(e) if e.is_malformed() => ErrorKind::Protocol,

            Error::ClientData(_)
            | Error::Challenge(ChallengeError::NotFound)
            | Error::Challenge(ChallengeError::Expired)
            | Error::Challenge(ChallengeError::AlreadyConsumed)
            | Error::ChallengePurposeMismatch
            | Error::RpIdHashMismatch
            | Error::UserNotPresent
            | Error::UserNotVerified
            | Error::CredentialIdAlreadyRegistered
            | Error::NoAllowedCredentials
            | Error::CredentialNotAllowed
            | Error::UnknownCredential
            | Error::UserHandleMismatch => ErrorKind::Ceremony,

            Error::SignatureInvalid | Error::SignatureCounterRegression { .. } => {
                ErrorKind::Security
            }

            Error::Challenge(ChallengeError::RandomUnavailable) | Error::Store(_) => {
                ErrorKind::Collaborator
            }

            Error::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true when the error should be treated as a security event
    /// (possible credential theft or cloned authenticator).
    pub fn is_security_event(&self) -> bool {
        self.kind() == ErrorKind::Security
    }

    /// A message that is safe to return to an external caller.
    ///
    /// Ceremony and protocol failures collapse into one message so that a
    /// client cannot learn which check rejected it. Use `Display` for logs.
    pub fn public_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Protocol | ErrorKind::Ceremony => "ceremony failed",
            ErrorKind::Security => "security violation",
            ErrorKind::Collaborator => "service unavailable",
            ErrorKind::Configuration => "relying party misconfigured",
        }
    }
}

/// Convenience type alias for ceremony results.
pub type Result<T> = std::result::Result<T, Error>;
