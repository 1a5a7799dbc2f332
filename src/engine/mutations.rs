use std::time::Instant;

use ulid::Ulid;

use crate::limits::*;
use crate::model::{
    Appointment, AppointmentStatus, AuditEvent, AuditKind, NewAppointment, SessionId, Span,
};
use crate::observability;

use super::availability::booked_by;
use super::lifecycle::check_transition;
use super::{Scheduler, StoreError};

fn validate_span(span: &Span) -> Result<(), StoreError> {
    if span.start >= span.end {
        return Err(StoreError::LimitExceeded("window is empty or inverted"));
    }
    if span.start < MIN_VALID_TIMESTAMP_MS || span.end > MAX_VALID_TIMESTAMP_MS {
        return Err(StoreError::LimitExceeded("timestamp out of range"));
    }
    if span.duration_ms() > MAX_APPOINTMENT_DURATION_MS {
        return Err(StoreError::LimitExceeded("appointment too long"));
    }
    Ok(())
}

fn validate_labels(req: &NewAppointment) -> Result<(), StoreError> {
    if req.subject.len() > MAX_SUBJECT_LEN {
        return Err(StoreError::LimitExceeded("subject too long"));
    }
    if req.kind.len() > MAX_TAG_LEN || req.mode.len() > MAX_TAG_LEN {
        return Err(StoreError::LimitExceeded("tag too long"));
    }
    Ok(())
}

/// Ownership gate for every targeted command: the acting session must be
/// the creator, and cancellation is terminal.
fn check_ownership(appt: &Appointment, session: SessionId) -> Result<(), StoreError> {
    if appt.created_by != session {
        return Err(StoreError::OwnershipViolation(appt.id));
    }
    if appt.is_cancelled() {
        return Err(StoreError::AlreadyCancelled(appt.id));
    }
    Ok(())
}

fn observe<T>(command: &'static str, started: Instant, result: &Result<T, StoreError>) {
    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(observability::COMMANDS_TOTAL, "command" => command, "status" => status)
        .increment(1);
    metrics::histogram!(observability::COMMAND_DURATION_SECONDS, "command" => command)
        .record(started.elapsed().as_secs_f64());
}

fn overlap_rejected(command: &'static str, blocking: Ulid) -> StoreError {
    metrics::counter!(observability::OVERLAPS_REJECTED_TOTAL).increment(1);
    tracing::debug!(command, blocking = %blocking, "overlap re-check rejected commit");
    StoreError::OverlapConflict(blocking)
}

impl Scheduler {
    pub async fn create_appointment(
        &self,
        req: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let started = Instant::now();
        let result = async {
            validate_span(&req.span)?;
            validate_labels(&req)?;
            if !self.directory().contains(&req.therapist_id) {
                return Err(StoreError::NotFound(req.therapist_id));
            }

            let _guard = self.commit_lock.lock().await;
            let mut state = self.load_state().await?;
            if state.appointments.len() >= MAX_APPOINTMENTS {
                return Err(StoreError::LimitExceeded("too many appointments"));
            }
            if let Some(blocking) =
                booked_by(&state.appointments, req.therapist_id, &req.span, None)
            {
                return Err(overlap_rejected("create_appointment", blocking));
            }

            let now = self.now_ms();
            let appt = Appointment {
                id: Ulid::new(),
                clinic_id: req.clinic_id,
                therapist_id: req.therapist_id,
                subject: req.subject.clone(),
                span: req.span,
                kind: req.kind.clone(),
                mode: req.mode.clone(),
                status: AppointmentStatus::Scheduled,
                created_by: self.session_id(),
                updated_at: now,
                cancelled_at: None,
                cancelled_by: None,
                audit: vec![AuditEvent::created(
                    now,
                    self.session_id(),
                    req.span,
                    AppointmentStatus::Scheduled,
                )],
            };
            state.appointments.push(appt.clone());
            self.commit(state, appt.id, appt.therapist_id, AuditKind::Created)
                .await?;
            Ok(appt)
        }
        .await;
        observe("create_appointment", started, &result);
        result
    }

    pub async fn reschedule_appointment(
        &self,
        id: Ulid,
        new_span: Span,
    ) -> Result<Appointment, StoreError> {
        let started = Instant::now();
        let result = async {
            validate_span(&new_span)?;

            let _guard = self.commit_lock.lock().await;
            let mut state = self.load_state().await?;
            let idx = state
                .appointments
                .iter()
                .position(|a| a.id == id)
                .ok_or(StoreError::NotFound(id))?;
            check_ownership(&state.appointments[idx], self.session_id())?;

            let therapist_id = state.appointments[idx].therapist_id;
            let old_span = state.appointments[idx].span;
            if let Some(blocking) =
                booked_by(&state.appointments, therapist_id, &new_span, Some(id))
            {
                return Err(overlap_rejected("reschedule_appointment", blocking));
            }

            let now = self.now_ms();
            let appt = &mut state.appointments[idx];
            appt.span = new_span;
            appt.updated_at = now;
            appt.audit
                .push(AuditEvent::rescheduled(now, self.session_id(), old_span, new_span));
            let updated = appt.clone();

            self.commit(state, id, therapist_id, AuditKind::Rescheduled)
                .await?;
            Ok(updated)
        }
        .await;
        observe("reschedule_appointment", started, &result);
        result
    }

    pub async fn reassign_appointment(
        &self,
        id: Ulid,
        new_therapist_id: Ulid,
    ) -> Result<Appointment, StoreError> {
        let started = Instant::now();
        let result = async {
            if !self.directory().contains(&new_therapist_id) {
                return Err(StoreError::NotFound(new_therapist_id));
            }

            let _guard = self.commit_lock.lock().await;
            let mut state = self.load_state().await?;
            let idx = state
                .appointments
                .iter()
                .position(|a| a.id == id)
                .ok_or(StoreError::NotFound(id))?;
            check_ownership(&state.appointments[idx], self.session_id())?;

            let old_therapist_id = state.appointments[idx].therapist_id;
            let span = state.appointments[idx].span;
            if let Some(blocking) =
                booked_by(&state.appointments, new_therapist_id, &span, Some(id))
            {
                return Err(overlap_rejected("reassign_appointment", blocking));
            }

            let now = self.now_ms();
            let appt = &mut state.appointments[idx];
            appt.therapist_id = new_therapist_id;
            appt.updated_at = now;
            appt.audit.push(AuditEvent::reassigned(
                now,
                self.session_id(),
                old_therapist_id,
                new_therapist_id,
            ));
            let updated = appt.clone();

            self.commit(state, id, new_therapist_id, AuditKind::Rescheduled)
                .await?;
            Ok(updated)
        }
        .await;
        observe("reassign_appointment", started, &result);
        result
    }

    /// Status updates cannot introduce a time overlap, so they skip the
    /// overlap re-check entirely.
    pub async fn update_appointment_status(
        &self,
        id: Ulid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let started = Instant::now();
        let result = async {
            let _guard = self.commit_lock.lock().await;
            let mut state = self.load_state().await?;
            let idx = state
                .appointments
                .iter()
                .position(|a| a.id == id)
                .ok_or(StoreError::NotFound(id))?;
            check_ownership(&state.appointments[idx], self.session_id())?;
            check_transition(state.appointments[idx].status, new_status)?;

            let now = self.now_ms();
            let appt = &mut state.appointments[idx];
            let old_status = appt.status;
            appt.status = new_status;
            appt.updated_at = now;
            appt.audit.push(AuditEvent::status_change(
                now,
                self.session_id(),
                old_status,
                new_status,
            ));
            let updated = appt.clone();
            let therapist_id = updated.therapist_id;

            self.commit(state, id, therapist_id, AuditKind::StatusChange)
                .await?;
            Ok(updated)
        }
        .await;
        observe("update_appointment_status", started, &result);
        result
    }

    pub async fn cancel_appointment(&self, id: Ulid) -> Result<Appointment, StoreError> {
        let started = Instant::now();
        let result = async {
            let _guard = self.commit_lock.lock().await;
            let mut state = self.load_state().await?;
            let idx = state
                .appointments
                .iter()
                .position(|a| a.id == id)
                .ok_or(StoreError::NotFound(id))?;
            check_ownership(&state.appointments[idx], self.session_id())?;

            let now = self.now_ms();
            let appt = &mut state.appointments[idx];
            appt.status = AppointmentStatus::Cancelled;
            appt.cancelled_at = Some(now);
            appt.cancelled_by = Some(self.session_id());
            appt.updated_at = now;
            appt.audit
                .push(AuditEvent::cancelled(now, self.session_id()));
            let updated = appt.clone();
            let therapist_id = updated.therapist_id;

            self.commit(state, id, therapist_id, AuditKind::Cancelled)
                .await?;
            Ok(updated)
        }
        .await;
        observe("cancel_appointment", started, &result);
        result
    }
}
