//! In-memory backend implementation for testing

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct MemoryState {
    fees: HashMap<StudentId, Vec<Value>>,
    transactions: HashMap<SessionId, Vec<Value>>,
    students: HashMap<StudentId, Value>,
    fetch_failure: Option<String>,
    submission_rejection: Option<String>,
}

/// In-memory fee backend for testing and development
///
/// New payments are recorded in the backend's current session, the way the
/// school server scopes them.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    current_session: SessionId,
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    /// Create a backend whose payments land in `current_session`
    pub fn new(current_session: impl Into<SessionId>) -> Self {
        Self {
            current_session: current_session.into(),
            state: Arc::new(RwLock::new(MemoryState::default())),
        }
    }

    pub fn current_session(&self) -> &SessionId {
        &self.current_session
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a raw fee record for a student
    pub fn add_fee(&self, student_id: impl Into<StudentId>, fee: Value) {
        self.write()
            .fees
            .entry(student_id.into())
            .or_default()
            .push(fee);
    }

    /// Add a raw transaction record to a session's ledger
    pub fn add_transaction(&self, session_id: impl Into<SessionId>, transaction: Value) {
        self.write()
            .transactions
            .entry(session_id.into())
            .or_default()
            .push(transaction);
    }

    /// Register a raw student profile
    pub fn add_student(&self, student_id: impl Into<StudentId>, profile: Value) {
        self.write().students.insert(student_id.into(), profile);
    }

    /// Make every listing call fail with the given reason, or succeed again with `None`
    pub fn set_fetch_failure(&self, reason: Option<String>) {
        self.write().fetch_failure = reason;
    }

    /// Make payment submissions fail with the given reason, or succeed again with `None`
    pub fn set_submission_rejection(&self, reason: Option<String>) {
        self.write().submission_rejection = reason;
    }

    /// Snapshot of a session's ledger
    pub fn transactions(&self, session_id: &SessionId) -> Vec<Value> {
        self.read()
            .transactions
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.write() = MemoryState::default();
    }

    fn check_fetch(&self) -> Result<(), BackendError> {
        match &self.read().fetch_failure {
            Some(reason) => Err(BackendError::Unavailable(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FeeBackend for MemoryBackend {
    async fn list_fees(&self, student_id: &StudentId) -> Result<Vec<Value>, BackendError> {
        self.check_fetch()?;
        Ok(self.read().fees.get(student_id).cloned().unwrap_or_default())
    }

    async fn list_transactions(&self, session_id: &SessionId) -> Result<Vec<Value>, BackendError> {
        self.check_fetch()?;
        Ok(self.transactions(session_id))
    }

    async fn create_transaction(&self, transaction: &NewTransaction) -> Result<Value, BackendError> {
        if let Some(reason) = &self.read().submission_rejection {
            return Err(BackendError::Status {
                status: 422,
                body: reason.clone(),
            });
        }

        let mut record =
            serde_json::to_value(transaction).map_err(|e| BackendError::Decode(e.to_string()))?;
        if let Value::Object(fields) = &mut record {
            fields.insert("transactionId".to_string(), json!(Uuid::new_v4().to_string()));
            fields.insert("status".to_string(), json!("success"));
            fields.insert(
                "paymentDate".to_string(),
                json!(Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()),
            );
        }

        self.write()
            .transactions
            .entry(self.current_session.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn get_student(&self, student_id: &StudentId) -> Result<Option<Value>, BackendError> {
        Ok(self.read().students.get(student_id).cloned())
    }
}
