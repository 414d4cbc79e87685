use std::collections::HashMap;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_types::{StrategyConfig, WorkerKey};

/// Decoded identity carried by a verified bearer token.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing or expired credentials")]
    Unauthenticated,
    #[error("caller does not own worker '{0}'")]
    Forbidden(String),
}

#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    user_id: String,
    username: String,
}

/// Verifies bearer tokens and enforces per-worker ownership. The closest
/// Rust analogue to `simple_auth.py`'s `python-jose`/`PyJWT` use — the
/// teacher has no JWT concern of its own, so this is enrichment from the
/// wider Rust trading/service ecosystem, where `jsonwebtoken` is the
/// standard choice.
pub struct AuthzFilter {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthzFilter {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
        }
    }

    /// Decodes and validates a bearer token; a missing or expired token maps
    /// to `Unauthenticated` (never `Forbidden` — ownership is a separate
    /// question from authentication).
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| AuthError::Unauthenticated)?;
        Ok(Identity {
            user_id: data.claims.user_id,
            username: data.claims.username,
        })
    }

    /// `config_for(worker_key).user_id == identity.user_id`.
    pub fn may_access(
        &self,
        identity: &Identity,
        worker_key: &WorkerKey,
        configurations: &HashMap<WorkerKey, StrategyConfig>,
    ) -> bool {
        configurations
            .get(worker_key)
            .map(|config| config.user_id.as_deref() == Some(identity.user_id.as_str()))
            .unwrap_or(false)
    }
}
