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

//! Base64url codec (RFC 4648 §5) as used by WebAuthn JSON.
//!
//! Encoding never emits padding. Decoding accepts input with or without
//! canonical `=` padding and rejects the standard alphabet's `+` and `/`.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;

use crate::error::Base64Error;

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes binary data as base64url without padding.
#[inline]
pub fn encode(data: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(data)
}

/// Decodes a base64url string, with or without padding.
///
/// # Errors
///
/// Returns [`Base64Error::InvalidEncoding`] if the input contains characters
/// outside the URL-safe alphabet, has a non-canonical length or padding, or
/// carries non-zero trailing bits.
#[inline]
pub fn decode(s: &str) -> Result<Vec<u8>, Base64Error> {
    URL_SAFE_LENIENT
        .decode(s)
        .map_err(|e| Base64Error::InvalidEncoding(e.to_string()))
}
