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

//! Strict CBOR reader for the subset used by WebAuthn.
//!
//! Only definite-length unsigned and negative integers, byte strings, text
//! strings, arrays and maps are accepted. Tags, floats, simple values and
//! indefinite-length items fail instead of being coerced. Headers are pulled
//! with `ciborium-ll` so the reader always knows how many bytes an item used,
//! which the authenticator data parser needs to find where the COSE key ends.

use ciborium_io::Read as _;
use ciborium_ll::{Decoder, Header};

use crate::error::CborError;

/// Maximum nesting depth of arrays and maps.
pub const MAX_DEPTH: usize = 16;

/// A decoded CBOR value.
///
/// Map entries keep their encoded order; lookups compare keys by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CborValue {
    /// Major type 0.
    Unsigned(u64),
    /// Major type 1, holding the raw magnitude `n` of the value `-1 - n`.
    Negative(u64),
    /// Major type 2.
    Bytes(Vec<u8>),
    /// Major type 3.
    Text(String),
    /// Major type 4.
    Array(Vec<CborValue>),
    /// Major type 5.
    Map(Vec<(CborValue, CborValue)>),
}

impl CborValue {
    /// Builds the integer value for `value`, choosing the major type by sign.
    pub fn integer(value: i64) -> Self {
        if value >= 0 {
            CborValue::Unsigned(value as u64)
        } else {
            CborValue::Negative((-1 - value) as u64)
        }
    }

    /// Returns the signed value of an integer, if it fits in `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CborValue::Unsigned(n) => i64::try_from(*n).ok(),
            CborValue::Negative(n) => i64::try_from(*n).ok().map(|n| -1 - n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CborValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CborValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(CborValue, CborValue)]> {
        match self {
            CborValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up `key` in a map. Returns `None` for non-maps.
    pub fn get(&self, key: &CborValue) -> Option<&CborValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Looks up an integer key in a map.
    pub fn get_int(&self, key: i64) -> Option<&CborValue> {
        self.get(&CborValue::integer(key))
    }

    /// Looks up a text key in a map.
    pub fn get_text(&self, key: &str) -> Option<&CborValue> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k.as_text() == Some(key))
            .map(|(_, v)| v)
    }
}

/// Decodes exactly one CBOR item that spans the whole input.
///
/// # Errors
///
/// Fails with [`CborError::TrailingBytes`] if bytes remain after the item,
/// and with the other [`CborError`] variants for malformed input.
pub fn decode(bytes: &[u8]) -> Result<CborValue, CborError> {
    let (value, used) = decode_prefix(bytes)?;
    if used != bytes.len() {
        return Err(CborError::TrailingBytes(bytes.len() - used));
    }
    Ok(value)
}

/// Decodes one CBOR item from the start of `bytes`.
///
/// Returns the value and the number of bytes it occupied.
pub fn decode_prefix(bytes: &[u8]) -> Result<(CborValue, usize), CborError> {
    let mut reader = Reader {
        decoder: Decoder::from(bytes),
        len: bytes.len(),
    };
    let value = reader.item(0)?;
    let used = reader.decoder.offset();
    Ok((value, used))
}

struct Reader<'a> {
    decoder: Decoder<&'a [u8]>,
    len: usize,
}

impl Reader<'_> {
    fn item(&mut self, depth: usize) -> Result<CborValue, CborError> {
        if depth > MAX_DEPTH {
            return Err(CborError::NestingTooDeep(MAX_DEPTH));
        }

        let header = self.decoder.pull().map_err(|e| match e {
            ciborium_ll::Error::Io(_) => CborError::Truncated,
            ciborium_ll::Error::Syntax(_) => CborError::InvalidMajorType,
        })?;

        match header {
            Header::Positive(n) => Ok(CborValue::Unsigned(n)),
            Header::Negative(n) => Ok(CborValue::Negative(n)),
            Header::Bytes(Some(len)) => self.read(len).map(CborValue::Bytes),
            Header::Text(Some(len)) => {
                let raw = self.read(len)?;
                String::from_utf8(raw)
                    .map(CborValue::Text)
                    .map_err(|_| CborError::InvalidUtf8)
            }
            Header::Array(Some(len)) => {
                // Every element takes at least one byte.
                self.ensure(len)?;
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.item(depth + 1)?);
                }
                Ok(CborValue::Array(items))
            }
            Header::Map(Some(len)) => {
                self.ensure(len.saturating_mul(2))?;
                let mut entries: Vec<(CborValue, CborValue)> = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = self.item(depth + 1)?;
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(CborError::DuplicateKey);
                    }
                    let value = self.item(depth + 1)?;
                    entries.push((key, value));
                }
                Ok(CborValue::Map(entries))
            }
            Header::Bytes(None) | Header::Text(None) | Header::Array(None) | Header::Map(None) => {
                Err(CborError::UnsupportedType("indefinite-length item"))
            }
            Header::Tag(_) => Err(CborError::UnsupportedType("tag")),
            Header::Float(_) => Err(CborError::UnsupportedType("float")),
            Header::Break => Err(CborError::InvalidMajorType),
            _ => Err(CborError::UnsupportedType("simple value")),
        }
    }

    fn remaining(&mut self) -> usize {
        self.len.saturating_sub(self.decoder.offset())
    }

    /// Rejects declared lengths that cannot fit in the remaining input.
    fn ensure(&mut self, len: usize) -> Result<(), CborError> {
        if len > self.remaining() {
            return Err(CborError::Truncated);
        }
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, CborError> {
        self.ensure(len)?;
        let mut buf = vec![0u8; len];
        self.decoder
            .read_exact(&mut buf)
            .map_err(|_| CborError::Truncated)?;
        Ok(buf)
    }
}
