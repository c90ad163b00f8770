//! Analytics event log.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AnalyticsError, Result};
use crate::model::{collections, AnalyticsEvent, FieldValue, Fields};
use crate::traits::{Direction, DocumentStore, Filter, Query};

/// Default number of events returned by [`EventLog::user_events`].
pub const DEFAULT_EVENT_LIMIT: usize = 100;

/// Event type logged when a student submits an assignment.
pub const ASSIGNMENT_SUBMISSION: &str = "assignment_submission";

/// Appends and lists [`AnalyticsEvent`]s.
pub struct EventLog {
    store: Arc<dyn DocumentStore>,
}

impl EventLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Log an event and return its generated id.
    pub async fn log_event(&self, user_id: &str, event_type: &str, data: Fields) -> Result<String> {
        self.log_event_at(user_id, event_type, data, Utc::now()).await
    }

    pub async fn log_event_at(
        &self,
        user_id: &str,
        event_type: &str,
        data: Fields,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let mut fields = Fields::new();
        fields.insert("userId".into(), user_id.into());
        fields.insert("eventType".into(), event_type.into());
        fields.insert("eventData".into(), FieldValue::Map(data));
        fields.insert("createdAt".into(), now.into());

        let id = self
            .store
            .add(collections::ANALYTICS_EVENTS, fields)
            .await
            .map_err(AnalyticsError::failed("log event"))?;
        tracing::debug!(user_id, event_type, %id, "event logged");
        Ok(id)
    }

    /// A user's most recent events, newest first.
    pub async fn user_events(
        &self,
        user_id: &str,
        event_type: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AnalyticsEvent>> {
        const OPERATION: &str = "list user events";

        let mut query = Query::collection(collections::ANALYTICS_EVENTS)
            .filter(Filter::eq("userId", user_id))
            .order_by("createdAt", Direction::Descending)
            .limit(limit);
        if let Some(event_type) = event_type {
            query = query.filter(Filter::eq("eventType", event_type));
        }

        let docs = self
            .store
            .query(&query)
            .await
            .map_err(AnalyticsError::failed(OPERATION))?;
        docs.iter()
            .map(AnalyticsEvent::from_document)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AnalyticsError::failed(OPERATION))
    }
}
