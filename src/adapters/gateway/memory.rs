//! In-memory sync gateway
//!
//! An authoritative store with the same upsert semantics as the remote
//! endpoint. Backs dry runs and scenario tests, and can be told to fail
//! specific calls.

use super::traits::{check_batch_size, SyncGateway};
use crate::domain::ids::{SourceId, UserId};
use crate::domain::{
    EntryError, GatewayError, Result, StepDayEntry, SyncBatchResult, SyncError,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Injected failure for one gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum InjectedFailure {
    /// 503 from the server, nothing applied
    ServerError,
    /// Every entry but the last applied, outcome reported as ambiguous
    Partial,
    /// Credentials refused
    Unauthorized,
    /// The server refused the batch with the given 4xx status
    Rejected(u16),
    /// The call hangs for the given duration before answering normally
    Hang(Duration),
}

type UpsertKey = (UserId, NaiveDate, SourceId);

/// In-memory upsert store
pub struct MemoryGateway {
    user: UserId,
    records: Mutex<HashMap<UpsertKey, StepDayEntry>>,
    failures: Mutex<HashMap<usize, InjectedFailure>>,
    calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl MemoryGateway {
    /// Create an empty store for `user`
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            records: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            batch_sizes: Mutex::new(Vec::new()),
        }
    }

    /// Fail the call with zero-based index `call`
    pub fn fail_call(&self, call: usize, failure: InjectedFailure) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(call, failure);
        }
    }

    /// Number of `sync_batch` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Size of every batch received, in call order
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Number of stored records
    pub fn record_count(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Stored record for `date` and `source`
    pub fn record(&self, date: NaiveDate, source: &SourceId) -> Option<StepDayEntry> {
        self.records
            .lock()
            .ok()?
            .get(&(self.user.clone(), date, source.clone()))
            .cloned()
    }

    fn upsert(&self, entries: &[StepDayEntry]) -> Result<SyncBatchResult> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| GatewayError::ConnectionFailed("record store poisoned".to_string()))?;

        let mut result = SyncBatchResult {
            total: entries.len(),
            ..SyncBatchResult::default()
        };

        for entry in entries {
            let key = (self.user.clone(), entry.date, entry.source.clone());
            if records.insert(key, entry.clone()).is_some() {
                result.updated += 1;
            } else {
                result.created += 1;
            }
        }

        Ok(result)
    }
}

#[async_trait]
impl SyncGateway for MemoryGateway {
    async fn sync_batch(&self, entries: &[StepDayEntry]) -> Result<SyncBatchResult> {
        check_batch_size(entries)?;

        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut sizes) = self.batch_sizes.lock() {
            sizes.push(entries.len());
        }

        let failure = self
            .failures
            .lock()
            .map_err(|_| SyncError::Gateway(GatewayError::ConnectionFailed("poisoned".into())))?
            .remove(&call);

        match failure {
            None => self.upsert(entries),
            Some(InjectedFailure::ServerError) => Err(GatewayError::ServerError {
                status: 503,
                message: "service unavailable".to_string(),
            }
            .into()),
            Some(InjectedFailure::Unauthorized) => {
                Err(GatewayError::Unauthorized("token expired".to_string()).into())
            }
            Some(InjectedFailure::Rejected(status)) => Err(GatewayError::Rejected {
                status,
                message: "batch refused".to_string(),
            }
            .into()),
            Some(InjectedFailure::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                self.upsert(entries)
            }
            Some(InjectedFailure::Partial) => {
                let applied = entries.len().saturating_sub(1);
                let mut result = self.upsert(&entries[..applied])?;
                result.total = entries.len();
                result.errors.push(EntryError {
                    date: entries.last().map(|e| e.date),
                    message: "outcome unknown".to_string(),
                });
                Ok(result)
            }
        }
    }

    fn name(&self) -> &str {
        "memory"
    }
}
