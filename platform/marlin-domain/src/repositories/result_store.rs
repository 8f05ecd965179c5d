use crate::entities::metrics::MetricsReport;
use crate::value_objects::record::ResultRecord;

/// Identity of one stored run: strategy plus symbol, with an optional digest
/// of the run parameters so re-runs with different settings do not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunKey {
    pub strategy_id: String,
    pub symbol: String,
    pub params_digest: Option<String>,
}

impl RunKey {
    pub fn new(strategy_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            strategy_id: strategy_id.into(),
            symbol: symbol.into(),
            params_digest: None,
        }
    }

    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.params_digest = Some(digest.into());
        self
    }

    /// `{strategy_id}_{symbol}`, with the digest appended when present.
    pub fn storage_key(&self) -> String {
        match &self.params_digest {
            Some(digest) => format!("{}_{}_{}", self.strategy_id, self.symbol, digest),
            None => format!("{}_{}", self.strategy_id, self.symbol),
        }
    }
}

/// Persisted payload of one finished run.
#[derive(Debug, Clone)]
pub struct StoredRun {
    pub key: RunKey,
    pub records: Vec<ResultRecord>,
    pub metrics: MetricsReport,
}

/// Key-value persistence for finished runs. A `put` for an existing key
/// replaces the stored run. Failures here must not unwind a simulation; the
/// caller reports them and keeps the in-memory result.
pub trait ResultStore {
    fn put(&self, run: &StoredRun) -> Result<(), String>;

    fn get(&self, key: &RunKey) -> Result<Option<StoredRun>, String>;
}
