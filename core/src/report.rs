//! Report trigger: one-shot report generation gated on readiness.

use crate::backend::{ChatBackend, bounded};
use crate::conversation::{ReportId, ReportReceipt, RoomId};
use crate::coordinator::{ChatSession, SessionPhase};
use crate::error::{BackendError, ReportBlock, ReportError};

/// Proof that the trigger fired while enabled.
#[derive(Debug)]
#[must_use = "a pending report must be completed or the session stays busy"]
pub struct PendingReport {
    room_id: RoomId,
}

impl PendingReport {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }
}

impl ChatSession {
    /// `Ok(())` when a report may be generated right now, otherwise the
    /// first reason it may not.
    pub fn report_gate(&self) -> Result<(), ReportBlock> {
        if self.conversation.has_report {
            return Err(ReportBlock::AlreadyReported);
        }
        if self.phase != SessionPhase::Idle {
            return Err(ReportBlock::Busy(self.phase));
        }
        if !self.conversation.readiness.is_fully_sufficient() {
            return Err(ReportBlock::Incomplete {
                missing: self.conversation.readiness.missing_categories(),
            });
        }
        Ok(())
    }

    pub fn report_enabled(&self) -> bool {
        self.report_gate().is_ok()
    }

    /// Re-check the gate and move to `GeneratingReport`.
    pub fn begin_report(&mut self) -> Result<PendingReport, ReportError> {
        self.report_gate().map_err(ReportError::NotEnabled)?;
        self.phase = SessionPhase::GeneratingReport;
        Ok(PendingReport {
            room_id: self.conversation.id.clone(),
        })
    }

    /// Apply the backend's answer. Success locks the trigger for good;
    /// failure leaves `has_report` false so the gate reopens.
    pub fn complete_report(
        &mut self,
        pending: PendingReport,
        result: Result<ReportReceipt, BackendError>,
    ) -> Result<ReportId, ReportError> {
        if self.phase != SessionPhase::GeneratingReport || pending.room_id != self.conversation.id
        {
            tracing::error!(
                room_id = %self.conversation.id,
                pending_room_id = %pending.room_id,
                phase = ?self.phase,
                "report completion does not match session"
            );
            return Err(ReportError::Mismatched);
        }
        self.phase = SessionPhase::Idle;

        match result {
            Ok(receipt) => {
                self.conversation.has_report = true;
                if let Some(title) = receipt.room_title.filter(|t| !t.trim().is_empty()) {
                    self.conversation.title = title;
                }
                tracing::info!(
                    room_id = %pending.room_id,
                    report_id = %receipt.report_id,
                    "report generated"
                );
                Ok(receipt.report_id)
            }
            Err(err) => {
                let err = ReportError::from_backend(err);
                tracing::warn!(
                    room_id = %pending.room_id,
                    error = %err,
                    "report generation failed"
                );
                Err(err)
            }
        }
    }

    /// Fire the trigger against `backend`. Not retried on failure.
    pub async fn fire_report<B: ChatBackend>(
        &mut self,
        backend: &B,
    ) -> Result<ReportId, ReportError> {
        let pending = self.begin_report()?;
        let result = bounded(
            self.config.report_timeout,
            backend.generate_report(&pending.room_id),
        )
        .await;
        self.complete_report(pending, result)
    }
}
