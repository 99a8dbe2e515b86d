//! Approval workflow for monthly-plan pending entries.
//!
//! State is derived from the audit columns: `approved_at` set means Approved,
//! otherwise `rejected_at` set means Rejected, otherwise Pending.

use chrono::{DateTime, Utc};

use crate::errors::{ShiftError, ShiftResult};
use crate::models::pending::{ApprovalState, PendingSchedule, UpdatePendingRequest};
use crate::models::schedule::{ScheduleEntry, ScheduleLayer, validate_status, validate_time_range};

fn required_reason(reason: &str, action: &str) -> ShiftResult<String> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ShiftError::Validation(format!(
            "A reason is required to {}",
            action
        )));
    }
    Ok(trimmed.to_string())
}

impl PendingSchedule {
    pub fn state(&self) -> ApprovalState {
        if self.approved_at.is_some() {
            ApprovalState::Approved
        } else if self.rejected_at.is_some() {
            ApprovalState::Rejected
        } else {
            ApprovalState::Pending
        }
    }

    /// Approves a Pending or Rejected entry. The optional reason is kept as a note.
    pub fn approve(
        &mut self,
        approver: &str,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> ShiftResult<()> {
        if self.state() == ApprovalState::Approved {
            return Err(ShiftError::Conflict("Entry is already approved".to_string()));
        }
        self.approved_by = Some(approver.to_string());
        self.approved_at = Some(now);
        self.approval_note = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        self.rejected_by = None;
        self.rejected_at = None;
        self.rejection_reason = None;
        self.updated_at = now;
        Ok(())
    }

    /// Rejects a Pending or Approved entry. A non-empty reason is mandatory.
    pub fn reject(&mut self, rejector: &str, reason: &str, now: DateTime<Utc>) -> ShiftResult<()> {
        let reason = required_reason(reason, "reject")?;
        if self.state() == ApprovalState::Rejected {
            return Err(ShiftError::Conflict("Entry is already rejected".to_string()));
        }
        self.approved_by = None;
        self.approved_at = None;
        self.approval_note = None;
        self.rejected_by = Some(rejector.to_string());
        self.rejected_at = Some(now);
        self.rejection_reason = Some(reason);
        self.updated_at = now;
        Ok(())
    }

    /// Returns an Approved entry to Pending. A non-empty reason is mandatory.
    pub fn unapprove(&mut self, reason: &str, now: DateTime<Utc>) -> ShiftResult<()> {
        let reason = required_reason(reason, "unapprove")?;
        if self.state() != ApprovalState::Approved {
            return Err(ShiftError::Conflict(
                "Only approved entries can be unapproved".to_string(),
            ));
        }
        self.approved_by = None;
        self.approved_at = None;
        self.approval_note = None;
        self.unapproval_reason = Some(reason);
        self.updated_at = now;
        Ok(())
    }

    /// The adjustment-layer entry this submission contributes once approved.
    pub fn approved_entry(&self) -> Option<ScheduleEntry> {
        let approved_at = self.approved_at?;
        Some(ScheduleEntry {
            id: self.id,
            staff_id: self.staff_id,
            date: self.date,
            status: self.status.clone(),
            start: self.start,
            end: self.end,
            memo: self.memo.clone(),
            layer: ScheduleLayer::Adjustment,
            import_batch_id: self.import_batch_id,
            approved_at: Some(approved_at),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub fn ensure_deletable(&self) -> ShiftResult<()> {
        if self.state() == ApprovalState::Approved {
            return Err(ShiftError::Conflict(
                "Approved entries cannot be deleted; unapprove it first".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies an edit. Approved entries reject edits; a Rejected entry goes back to Pending.
    pub fn apply_update(&mut self, update: &UpdatePendingRequest, now: DateTime<Utc>) -> ShiftResult<()> {
        if self.state() == ApprovalState::Approved {
            return Err(ShiftError::Conflict(
                "Approved entries cannot be edited".to_string(),
            ));
        }
        let start = update.start.unwrap_or(self.start);
        let end = update.end.unwrap_or(self.end);
        validate_time_range(start, end)?;
        if let Some(status) = &update.status {
            validate_status(status)?;
            self.status = status.clone();
        }
        if let Some(memo) = &update.memo {
            self.memo = Some(memo.clone()).filter(|m| !m.is_empty());
        }
        self.start = start;
        self.end = end;
        self.rejected_by = None;
        self.rejected_at = None;
        self.rejection_reason = None;
        self.updated_at = now;
        Ok(())
    }
}

/// Checks that a cell (staff x date) can take a new submission, given the
/// entries it already holds.
pub fn ensure_cell_accepts_submission(cell: &[PendingSchedule]) -> ShiftResult<()> {
    if cell.iter().any(|p| p.state() == ApprovalState::Approved) {
        return Err(ShiftError::Conflict(
            "This day already has an approved entry and cannot be edited".to_string(),
        ));
    }
    if cell.iter().any(|p| p.state() == ApprovalState::Pending) {
        return Err(ShiftError::Conflict(
            "This day already has a pending entry".to_string(),
        ));
    }
    Ok(())
}

/// Checks a transition of one entry against the other entries of its cell.
///
/// An entry leaving Rejected (edited back to Pending, or approved) re-enters the
/// cell like a new submission, so the rest of the cell must be free.
pub fn ensure_cell_accepts_transition(
    before: ApprovalState,
    after: &PendingSchedule,
    others: &[PendingSchedule],
) -> ShiftResult<()> {
    if before == ApprovalState::Rejected && after.state() != ApprovalState::Rejected {
        ensure_cell_accepts_submission(others)?;
    }
    Ok(())
}
