//! Token authentication and bookkeeping.
//!
//! Tokens are 32 random bytes, hex encoded. Only the SHA-256 digest of a
//! token is stored, under two keys: one keyed by digest alone for the
//! authentication lookup, and one scoped to the owner for listing and
//! revocation. Both are written and deleted in the same batch.

use std::sync::Arc;

use common::clock::Clock;
use common::{Record, RecordOp};
use rand::RngCore;
use sha2::{Digest as _, Sha256};

use crate::config::WriteOptions;
use crate::error::{Error, Result};
use crate::model::{ApiKey, IssuedToken, OwnerId, datetime_from_micros};
use crate::serde::{CredentialKey, CredentialValue, DIGEST_LEN, Digest, OwnerCredentialKey};
use crate::storage::LogStorage;

const TOKEN_BYTES: usize = 32;
const TOKEN_PREFIX_LEN: usize = 8;

/// Computes the stored digest of a token.
pub fn token_digest(token: &str) -> Digest {
    Sha256::digest(token.as_bytes()).into()
}

/// Resolves tokens to owners and manages an owner's tokens.
///
/// Authentication failures never say why: an empty token, an unknown token
/// and a failed lookup all produce [`Error::Unauthorized`].
#[derive(Clone)]
pub struct CredentialGate {
    storage: LogStorage,
    clock: Arc<dyn Clock>,
    options: WriteOptions,
}

impl CredentialGate {
    pub(crate) fn new(storage: LogStorage, clock: Arc<dyn Clock>, options: WriteOptions) -> Self {
        Self {
            storage,
            clock,
            options,
        }
    }

    /// Maps a presented token to the owner it was issued to.
    #[tracing::instrument(level = "trace", skip_all)]
    pub async fn authenticate(&self, token: &str) -> Result<OwnerId> {
        if token.is_empty() {
            return Err(Error::Unauthorized);
        }
        match self.storage.get_credential(&token_digest(token)).await {
            Ok(Some(credential)) => Ok(credential.owner),
            Ok(None) => Err(Error::Unauthorized),
            Err(e) => {
                tracing::warn!("Credential lookup failed: {}", e);
                Err(Error::Unauthorized)
            }
        }
    }

    /// Issues a new token for `owner`. The raw token is returned once and
    /// never stored.
    pub async fn issue(&self, owner: OwnerId, name: &str) -> Result<IssuedToken> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("token name must not be empty".to_string()));
        }

        let mut raw = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut raw);
        let token = hex::encode(raw);
        let digest = token_digest(&token);
        let created_micros = self.clock.now_micros();

        let value = CredentialValue {
            owner,
            name: name.to_string(),
            prefix: token[..TOKEN_PREFIX_LEN].to_string(),
            created_micros,
        };
        let encoded = value.serialize();
        let ops = vec![
            RecordOp::Put(Record::new(
                CredentialKey::new(digest).serialize(),
                encoded.clone(),
            )),
            RecordOp::Put(Record::new(
                OwnerCredentialKey::new(owner, digest).serialize(),
                encoded,
            )),
        ];
        self.storage.apply(ops, self.options).await?;
        tracing::info!("Issued token {} for owner {}", value.prefix, owner);

        Ok(IssuedToken {
            token,
            owner,
            key: api_key(&digest, value)?,
        })
    }

    /// Lists an owner's tokens, oldest first.
    pub async fn list(&self, owner: &OwnerId) -> Result<Vec<ApiKey>> {
        let mut keys = self
            .storage
            .scan_owner_credentials(owner)
            .await?
            .into_iter()
            .map(|(key, value)| api_key(&key.digest, value))
            .collect::<Result<Vec<_>>>()?;
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(keys)
    }

    /// Revokes one of the owner's tokens by its hex digest.
    pub async fn revoke(&self, owner: &OwnerId, hash: &str) -> Result<()> {
        let digest = parse_digest(hash)?;
        let owner_key = OwnerCredentialKey::new(*owner, digest).serialize();
        if self.storage.get(owner_key.clone()).await?.is_none() {
            return Err(Error::NotFound(format!("token {} not found", hash)));
        }
        let ops = vec![
            RecordOp::Delete(CredentialKey::new(digest).serialize()),
            RecordOp::Delete(owner_key),
        ];
        self.storage.apply(ops, self.options).await?;
        tracing::info!("Revoked token {} for owner {}", hash, owner);
        Ok(())
    }
}

fn api_key(digest: &Digest, value: CredentialValue) -> Result<ApiKey> {
    Ok(ApiKey {
        hash: hex::encode(digest),
        name: value.name,
        prefix: value.prefix,
        created_at: datetime_from_micros(value.created_micros)?,
    })
}

fn parse_digest(hash: &str) -> Result<Digest> {
    let bytes = hex::decode(hash)
        .map_err(|_| Error::InvalidInput(format!("invalid token hash: {}", hash)))?;
    let digest: [u8; DIGEST_LEN] = bytes
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("invalid token hash: {}", hash)))?;
    Ok(digest)
}
