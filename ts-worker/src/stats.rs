use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_integration::stat::{StatTag, StatValue};
use ts_types::EngineKind;

use crate::state::WorkerState;

/// Non-blocking, never-fails snapshot of one worker's metrics, returned by
/// [`crate::WorkerContract::get_stats`]. `extras` carries whatever
/// strategy-defined numbers the engine reports, keyed the same way
/// `jackbot-integration::metric::Tag`/`Field` key observed measurements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStats {
    pub state: WorkerState,
    pub symbol: String,
    pub strategy_key: String,
    pub engine: EngineKind,
    pub bars_processed: u64,
    pub position: Decimal,
    pub entry_price: Option<Decimal>,
    pub extras: Vec<(StatTag, StatValue)>,
}

impl WorkerStats {
    pub fn new(state: WorkerState, symbol: String, strategy_key: String, engine: EngineKind) -> Self {
        Self {
            state,
            symbol,
            strategy_key,
            engine,
            bars_processed: 0,
            position: Decimal::ZERO,
            entry_price: None,
            extras: Vec::new(),
        }
    }
}
