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

//! Single-use, expiring challenges keyed by session.
//!
//! `issue` and `consume` are atomic per session key: the map shard holding
//! the key stays write-locked while the entry is checked and marked consumed,
//! so two concurrent consumers can never both succeed. Consumed entries stay
//! behind as tombstones until [`ChallengeStore::purge_expired`] runs, which
//! lets a replay be reported as `AlreadyConsumed` rather than `NotFound`.

use std::time::{Duration, Instant};

use aws_lc_rs::rand::{SecureRandom, SystemRandom};
use dashmap::DashMap;

use crate::base64url;
use crate::config::DEFAULT_CHALLENGE_TTL;
use crate::error::ChallengeError;
use crate::session_tag;
use crate::types::UserIdentity;

/// Number of random bytes in a challenge.
pub const CHALLENGE_LEN: usize = 32;

/// Generates a cryptographically secure random challenge.
pub fn generate_challenge() -> Result<Vec<u8>, ChallengeError> {
    let rng = SystemRandom::new();
    let mut challenge = vec![0u8; CHALLENGE_LEN];
    rng.fill(&mut challenge)
        .map_err(|_| ChallengeError::RandomUnavailable)?;
    Ok(challenge)
}

/// Ceremony state carried alongside a challenge between `start` and `finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyState {
    /// A registration for this user.
    Registration { user: UserIdentity },
    /// An authentication, optionally restricted to these credential IDs.
    /// An empty list means any credential may be used.
    Authentication { allowed_credentials: Vec<Vec<u8>> },
}

/// An issued challenge.
#[derive(Debug, Clone)]
pub struct Challenge {
    bytes: Vec<u8>,
    encoded: String,
    state: CeremonyState,
    expires_at: Instant,
}

impl Challenge {
    /// The raw challenge bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The challenge as sent to the client (base64url, unpadded).
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    pub fn state(&self) -> &CeremonyState {
        &self.state
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

struct Entry {
    challenge: Challenge,
    consumed: bool,
}

/// In-memory challenge store.
pub struct ChallengeStore {
    entries: DashMap<String, Entry>,
    ttl: Duration,
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_TTL)
    }
}

impl ChallengeStore {
    /// Creates a store whose challenges live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a fresh challenge for `session_key`, replacing any pending one.
    pub fn issue(
        &self,
        session_key: &str,
        state: CeremonyState,
    ) -> Result<Challenge, ChallengeError> {
        let bytes = generate_challenge()?;
        let challenge = Challenge {
            encoded: base64url::encode(&bytes),
            bytes,
            state,
            expires_at: Instant::now() + self.ttl,
        };

        self.entries.insert(
            session_key.to_string(),
            Entry {
                challenge: challenge.clone(),
                consumed: false,
            },
        );
        tracing::debug!(session = %session_tag(session_key), "challenge issued");

        Ok(challenge)
    }

    /// Takes the pending challenge for `session_key`.
    ///
    /// The entry is invalidated by this call whatever the outcome, so a second
    /// call for the same key fails.
    ///
    /// # Errors
    ///
    /// * [`ChallengeError::NotFound`] if nothing was issued for the session
    /// * [`ChallengeError::AlreadyConsumed`] if it was taken before
    /// * [`ChallengeError::Expired`] if its lifetime has passed
    pub fn consume(&self, session_key: &str) -> Result<Challenge, ChallengeError> {
        let mut entry = self
            .entries
            .get_mut(session_key)
            .ok_or(ChallengeError::NotFound)?;

        if entry.consumed {
            return Err(ChallengeError::AlreadyConsumed);
        }
        entry.consumed = true;

        if entry.challenge.expires_at <= Instant::now() {
            return Err(ChallengeError::Expired);
        }

        tracing::debug!(session = %session_tag(session_key), "challenge consumed");
        Ok(entry.challenge.clone())
    }

    /// Removes expired and consumed entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.consumed && entry.challenge.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries, including consumed ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ChallengeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeStore")
            .field("entries", &self.entries.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
