use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use wayfinder_core::{PlanOutcome, SessionView, TripForm};

/// Everything the page needs to redraw for one browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSession {
    pub session_id: String,
    pub view: SessionView,
    /// Values of the last submission, used to refill the form.
    pub last_form: Option<TripForm>,
    pub submissions: u32,
    pub expires_at: DateTime<Utc>,
}

impl PlanSession {
    pub fn new(session_id: impl Into<String>, ttl: Duration) -> Self {
        Self {
            session_id: session_id.into(),
            view: SessionView::Idle,
            last_form: None,
            submissions: 0,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Replaces whatever was shown before; nothing accumulates.
    pub fn show_plan(&mut self, outcome: PlanOutcome) {
        self.view = SessionView::PlanShown(outcome);
    }

    pub fn record_form(&mut self, form: TripForm) {
        self.last_form = Some(form);
        self.submissions = self.submissions.saturating_add(1);
    }

    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}

pub trait SessionRepository: Send + Sync {
    async fn load_session(&self, session_id: &str) -> Result<Option<PlanSession>>;
    async fn upsert_session(&self, session: &PlanSession) -> Result<()>;
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    sessions: Arc<RwLock<HashMap<String, PlanSession>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

impl SessionRepository for MemoryStore {
    async fn load_session(&self, session_id: &str) -> Result<Option<PlanSession>> {
        let now = Utc::now();
        Ok(self
            .sessions
            .read()
            .get(session_id)
            .filter(|session| session.expires_at > now)
            .cloned())
    }

    async fn upsert_session(&self, session: &PlanSession) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut removed = 0_u64;
        self.sessions.write().retain(|_, value| {
            let keep = value.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        Ok(removed)
    }
}
