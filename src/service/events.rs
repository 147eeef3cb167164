use chrono::{DateTime, Utc};

use crate::calendar::{Action, EventItem, Principal};
use crate::error::ServiceError;
use crate::service::Service;

#[derive(Debug, Clone, PartialEq)]
pub struct CreateEventRequest {
    pub calendar_id: i64,
    pub title: String,
    pub start_at: String,
    pub end_at: String,
    pub all_day: bool,
    pub note: Option<String>,
    pub reminder_minutes_before: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub all_day: Option<bool>,
    pub note: Option<String>,
    pub reminder_minutes_before: Option<u32>,
}

fn parse_instant(iso: &str) -> Result<DateTime<Utc>, ServiceError> {
    DateTime::parse_from_rfc3339(iso)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| ServiceError::InvalidArgument(format!("Invalid ISO datetime: {iso}")))
}

impl Service {
    // Listing spans calendars the caller may or may not belong to;
    // non-member calendars are skipped rather than erroring the whole
    // request. Redaction happens here, per calendar, per role.
    pub fn list_events(
        &self,
        principal: &Principal,
        calendar_ids: &[i64],
        from: &str,
        to: &str,
    ) -> Result<Vec<EventItem>, ServiceError> {
        let from = parse_instant(from)?;
        let to = parse_instant(to)?;
        if to <= from {
            return Err(ServiceError::InvalidArgument(
                "to must be after from".to_string(),
            ));
        }

        let mut out = Vec::new();
        for &calendar_id in calendar_ids {
            let Some(role) = self.membership_role(calendar_id, principal)? else {
                continue;
            };

            for event in self.store.list_events(calendar_id, from, to)? {
                if role.sees_event_details() {
                    let reminder = self.store.reminder_for_event(event.id)?;
                    out.push(event.detailed(reminder));
                } else {
                    out.push(event.redacted());
                }
            }
        }
        Ok(out)
    }

    pub fn create_event(
        &self,
        principal: &Principal,
        req: &CreateEventRequest,
    ) -> Result<i64, ServiceError> {
        self.authorize(req.calendar_id, principal, Action::CreateEvent)?;
        if req.title.trim().is_empty() {
            return Err(ServiceError::InvalidArgument(
                "Event title must not be blank".to_string(),
            ));
        }
        let start_at = parse_instant(&req.start_at)?;
        let end_at = parse_instant(&req.end_at)?;
        if end_at <= start_at {
            return Err(ServiceError::InvalidArgument(
                "endAt must be after startAt".to_string(),
            ));
        }

        let event_id = self.store.create_event(
            req.calendar_id,
            &req.title,
            start_at,
            end_at,
            req.all_day,
            req.note.as_deref(),
            principal.user_id,
            Utc::now(),
        )?;
        self.store
            .upsert_reminder(event_id, req.reminder_minutes_before)?;
        Ok(event_id)
    }

    pub fn update_event(
        &self,
        principal: &Principal,
        event_id: i64,
        req: &UpdateEventRequest,
    ) -> Result<(), ServiceError> {
        let existing = self
            .store
            .get_event(event_id)?
            .ok_or_else(|| ServiceError::NotFound("Event".to_string()))?;
        self.authorize(existing.calendar_id, principal, Action::UpdateEvent)?;

        let start_at = req.start_at.as_deref().map(parse_instant).transpose()?;
        let end_at = req.end_at.as_deref().map(parse_instant).transpose()?;
        let effective_start = start_at.unwrap_or(existing.start_at);
        let effective_end = end_at.unwrap_or(existing.end_at);
        if effective_end <= effective_start {
            return Err(ServiceError::InvalidArgument(
                "endAt must be after startAt".to_string(),
            ));
        }

        self.store.update_event(
            event_id,
            req.title.as_deref(),
            start_at,
            end_at,
            req.all_day,
            req.note.as_deref(),
            principal.user_id,
            Utc::now(),
        )?;
        // The reminder field is authoritative on update: absent clears.
        self.store
            .upsert_reminder(event_id, req.reminder_minutes_before)?;
        Ok(())
    }

    pub fn delete_event(&self, principal: &Principal, event_id: i64) -> Result<(), ServiceError> {
        let existing = self
            .store
            .get_event(event_id)?
            .ok_or_else(|| ServiceError::NotFound("Event".to_string()))?;
        self.authorize(existing.calendar_id, principal, Action::DeleteEvent)?;
        self.store
            .soft_delete_event(event_id, principal.user_id, Utc::now())?;
        self.store.upsert_reminder(event_id, None)?;
        Ok(())
    }
}
