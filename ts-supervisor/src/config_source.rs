use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use ts_types::{EngineKind, StrategyConfig, WorkerKey};

/// Selector passed to [`ConfigSource::load`]: always `enabled = true`,
/// optionally narrowed to one user's configurations.
#[derive(Debug, Clone, Default)]
pub struct ConfigFilter {
    pub user_id: Option<String>,
}

impl ConfigFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// `{ _id: user_id, broker, account_id }` from the accounts collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub broker: String,
    pub account_id: String,
}

/// Reads the desired set of `StrategyConfig`s, keyed by
/// `(user_id, symbol, strategy_key)`. Failures are absorbed locally: `load`
/// always returns, even if empty, per spec §4.6 / §7's `ConfigLoadFailure`
/// policy — never propagated as an `Err` out of the call.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn load(&self, filter: ConfigFilter) -> HashMap<WorkerKey, StrategyConfig>;
    async fn resolve_account(&self, user_id: &str) -> Option<AccountInfo>;
}

/// Document shape read from the configuration store collection, before it's
/// validated into a `StrategyConfig`. Kept separate from `StrategyConfig` so
/// a malformed document (missing `symbol`/`strategy_key`, unknown `engine`)
/// can be rejected with a `tracing::warn!` instead of failing deserialization
/// of the whole batch.
#[derive(Debug, Clone, Deserialize)]
struct ConfigDocument {
    user_id: Option<String>,
    symbol: Option<String>,
    strategy_key: Option<String>,
    engine: Option<String>,
    #[serde(default)]
    params: serde_json::Map<String, serde_json::Value>,
    enabled: bool,
    engine_class: Option<String>,
}

fn parse_engine(raw: &str) -> Option<EngineKind> {
    match raw {
        "vnpy" => Some(EngineKind::Vnpy),
        "backtrader" => Some(EngineKind::Backtrader),
        _ => None,
    }
}

fn validate(doc: ConfigDocument) -> Option<StrategyConfig> {
    let symbol = doc.symbol.filter(|s| !s.is_empty())?;
    let strategy_key = doc.strategy_key.filter(|s| !s.is_empty())?;
    let raw_engine = doc.engine?;
    let engine = match parse_engine(&raw_engine) {
        Some(engine) => engine,
        None => {
            tracing::warn!(engine = %raw_engine, %symbol, %strategy_key, "skipping config with unregistered engine");
            return None;
        }
    };

    Some(StrategyConfig {
        symbol,
        strategy_key,
        engine,
        params: doc.params,
        enabled: doc.enabled,
        user_id: doc.user_id,
        engine_class: doc.engine_class,
    })
}

/// `HashMap`-backed double used by every reconciliation test — no
/// dependency on a live document store. Grounded on the teacher's
/// dev-dependency-free in-memory test doubles (`jackbot-risk`,
/// `jackbot-strategy`).
#[derive(Debug, Default, Clone)]
pub struct InMemoryConfigSource {
    configs: Vec<StrategyConfig>,
    accounts: HashMap<String, AccountInfo>,
}

impl InMemoryConfigSource {
    pub fn new(configs: Vec<StrategyConfig>) -> Self {
        Self {
            configs,
            accounts: HashMap::new(),
        }
    }

    pub fn with_account(mut self, account: AccountInfo) -> Self {
        self.accounts.insert(account.user_id.clone(), account);
        self
    }
}

#[async_trait]
impl ConfigSource for InMemoryConfigSource {
    async fn load(&self, filter: ConfigFilter) -> HashMap<WorkerKey, StrategyConfig> {
        self.configs
            .iter()
            .filter(|c| c.enabled)
            .filter(|c| match &filter.user_id {
                Some(uid) => c.user_id.as_deref() == Some(uid.as_str()),
                None => true,
            })
            .map(|c| (c.key(), c.clone()))
            .collect()
    }

    async fn resolve_account(&self, user_id: &str) -> Option<AccountInfo> {
        self.accounts.get(user_id).cloned()
    }
}

/// Production `ConfigSource` backed by a MongoDB collection. The teacher has
/// no document-store dependency of its own (its external stores are
/// exchange WebSocket feeds and Redis); this is enrichment from the wider
/// Rust trading/service ecosystem for the one concern — a document store
/// read — the teacher's stack never needed.
pub struct MongoConfigSource {
    configs: mongodb::Collection<ConfigDocument>,
    accounts: mongodb::Collection<AccountInfo>,
}

impl MongoConfigSource {
    pub fn new(database: &mongodb::Database, configs_collection: &str, accounts_collection: &str) -> Self {
        Self {
            configs: database.collection(configs_collection),
            accounts: database.collection(accounts_collection),
        }
    }
}

#[async_trait]
impl ConfigSource for MongoConfigSource {
    async fn load(&self, filter: ConfigFilter) -> HashMap<WorkerKey, StrategyConfig> {
        use futures::stream::TryStreamExt;
        use mongodb::bson::doc;

        let mut query = doc! { "enabled": true };
        if let Some(user_id) = filter.user_id {
            query.insert("user_id", user_id);
        }

        let cursor = match self.configs.find(query).await {
            Ok(cursor) => cursor,
            Err(err) => {
                tracing::warn!(%err, "config store query failed, treating as empty set");
                return HashMap::new();
            }
        };

        let documents: Vec<ConfigDocument> = match cursor.try_collect().await {
            Ok(documents) => documents,
            Err(err) => {
                tracing::warn!(%err, "config store cursor failed midway, using partial results");
                Vec::new()
            }
        };

        documents
            .into_iter()
            .filter_map(validate)
            .map(|c| (c.key(), c))
            .collect()
    }

    async fn resolve_account(&self, user_id: &str) -> Option<AccountInfo> {
        use mongodb::bson::doc;

        match self.accounts.find_one(doc! { "_id": user_id }).await {
            Ok(account) => account,
            Err(err) => {
                tracing::warn!(%err, %user_id, "account lookup failed");
                None
            }
        }
    }
}
