use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::checker::Checker;
use super::evaluator::evaluate;
use super::types::{CheckState, LogEntry};
use super::validation::{ValidationError, parse_check};
use crate::alerts::{AlertSender, SenderError, compose_message};
use crate::audit::AuditLog;
use crate::store::{CHECKS, Store, StoreError};

/// Why a check's pipeline stopped early
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read check: {0}")]
    Read(#[source] StoreError),
    #[error("check skipped: {0}")]
    Invalid(#[from] ValidationError),
    #[error("failed to persist check state: {0}")]
    Persist(#[source] StoreError),
    #[error("failed to serialize check: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Summary of one completed pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub check_id: String,
    pub state: CheckState,
    pub alert_worthy: bool,
    pub alert_sent: bool,
}

/// Monitoring executor - runs the full pipeline for one check:
/// read, validate, probe, evaluate, persist, alert, log
pub struct MonitoringExecutor {
    store: Arc<dyn Store>,
    checker: Arc<dyn Checker>,
    audit: Arc<AuditLog>,
    alerts: Arc<dyn AlertSender>,
}

impl MonitoringExecutor {
    pub fn new(
        store: Arc<dyn Store>,
        checker: Arc<dyn Checker>,
        audit: Arc<AuditLog>,
        alerts: Arc<dyn AlertSender>,
    ) -> Self {
        Self { store, checker, audit, alerts }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Execute the pipeline for the check stored under `check_id`
    pub async fn execute_check(&self, check_id: &str) -> Result<ProbeReport, PipelineError> {
        let mut raw = self.store.read(CHECKS, check_id).await.map_err(PipelineError::Read)?;
        let check = parse_check(&raw)?;
        if check.id != check_id {
            return Err(ValidationError::IdMismatch {
                key: check_id.to_string(),
                id: check.id,
            }
            .into());
        }

        let outcome = self.checker.check(&check).await;
        let checked_at = chrono::Utc::now().timestamp_millis();
        let evaluation = evaluate(&check, &outcome, checked_at);

        // Only the worker-owned fields change; everything else the API wrote
        // goes back untouched.
        if let Value::Object(fields) = &mut raw {
            fields.insert("state".to_string(), serde_json::to_value(evaluation.updated.state)?);
            fields.insert("lastChecked".to_string(), serde_json::to_value(evaluation.updated.last_checked)?);
        }
        self.store.update(CHECKS, check_id, &raw).await.map_err(PipelineError::Persist)?;

        match outcome.error_kind() {
            Some(kind) => debug!(check_id = %check.id, target = %check.target(), error = %kind, "Probe failed"),
            None => debug!(
                check_id = %check.id,
                target = %check.target(),
                code = ?outcome.response_code(),
                state = %evaluation.state,
                "Check probed"
            ),
        }

        let alert_sent = if evaluation.alert_worthy {
            let message = compose_message(&check, evaluation.state);
            match self.alerts.send(&check.owner_phone, &message).await {
                Ok(()) => {
                    info!(check_id = %check.id, state = %evaluation.state, "Alert sent");
                    true
                }
                Err(SenderError::Disabled) => {
                    debug!(check_id = %check.id, state = %evaluation.state, "Alerts disabled, not sending");
                    false
                }
                Err(e) => {
                    warn!(check_id = %check.id, "Failed to send alert: {}", e);
                    false
                }
            }
        } else {
            false
        };

        let entry = LogEntry {
            check: check.clone(),
            outcome,
            state: evaluation.state,
            alert: alert_sent,
            time: checked_at,
        };
        if let Err(e) = self.audit.append(&check.id, &entry).await {
            warn!(check_id = %check.id, "Failed to append audit log: {}", e);
        }

        Ok(ProbeReport {
            check_id: check.id,
            state: evaluation.state,
            alert_worthy: evaluation.alert_worthy,
            alert_sent,
        })
    }
}
