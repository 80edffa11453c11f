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

//! Credential store collaborator.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::types::Credential;

/// Persistence for registered credentials, implemented by the host.
///
/// `save` must reject an existing credential ID atomically (for example with
/// a unique constraint). The `exists_by_id` check made during registration
/// only produces an early, friendly error and does not close the race between
/// two registrations of the same ID.
///
/// `update_signature_counter` is a compare-and-set for the same reason: two
/// assertions verified against the same stored counter must not both land.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_id(&self, credential_id: &[u8]) -> Result<Option<Credential>, StoreError>;

    async fn exists_by_id(&self, credential_id: &[u8]) -> Result<bool, StoreError>;

    /// Inserts a new credential, failing with [`StoreError::Duplicate`] if the ID exists.
    async fn save(&self, credential: Credential) -> Result<(), StoreError>;

    /// Sets the counter to `sign_count` if it still equals `expected`,
    /// failing with [`StoreError::CounterConflict`] otherwise.
    async fn update_signature_counter(
        &self,
        credential_id: &[u8],
        expected: u32,
        sign_count: u32,
    ) -> Result<(), StoreError>;
}

/// In-memory credential store for tests and development.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: DashMap<Vec<u8>, Credential>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All credentials owned by `user_id`.
    pub fn credentials_for_user(&self, user_id: &[u8]) -> Vec<Credential> {
        self.credentials
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_id(&self, credential_id: &[u8]) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.get(credential_id).map(|c| c.value().clone()))
    }

    async fn exists_by_id(&self, credential_id: &[u8]) -> Result<bool, StoreError> {
        Ok(self.credentials.contains_key(credential_id))
    }

    async fn save(&self, credential: Credential) -> Result<(), StoreError> {
        match self.credentials.entry(credential.credential_id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                slot.insert(credential);
                Ok(())
            }
        }
    }

    async fn update_signature_counter(
        &self,
        credential_id: &[u8],
        expected: u32,
        sign_count: u32,
    ) -> Result<(), StoreError> {
        let mut credential = self
            .credentials
            .get_mut(credential_id)
            .ok_or(StoreError::NotFound)?;
        if credential.sign_count != expected {
            return Err(StoreError::CounterConflict {
                current: credential.sign_count,
            });
        }
        credential.sign_count = sign_count;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("credentials", &self.credentials.len())
            .finish()
    }
}
