//! Per-session daily search quota.
//!
//! Sessions are identified by an opaque id supplied by the caller. Storage and
//! time are injected so the service can be exercised deterministically.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};

use crate::app_config::AppConfig;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    Free,
    Premium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub subscription: Subscription,
    pub subscription_expiry: Option<DateTime<Utc>>,
    pub daily_searches: u32,
    pub last_search_date: NaiveDate,
    pub total_searches: u64,
    pub developer_mode: bool,
}

impl SessionRecord {
    #[must_use]
    pub fn new(today: NaiveDate) -> Self {
        Self {
            subscription: Subscription::Free,
            subscription_expiry: None,
            daily_searches: 0,
            last_search_date: today,
            total_searches: 0,
            developer_mode: false,
        }
    }
}

/// Persistence seam for session records.
pub trait SessionStore: Send + Sync {
    fn load(&self, session_id: &str) -> Option<SessionRecord>;

    fn save(&self, session_id: &str, record: SessionRecord);

    /// Drop every record for which `keep` returns `false`; returns the number removed.
    fn retain(&self, keep: &dyn Fn(&SessionRecord) -> bool) -> usize;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, session_id: &str) -> Option<SessionRecord> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn save(&self, session_id: &str, record: SessionRecord) {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session_id.to_string(), record);
    }

    fn retain(&self, keep: &dyn Fn(&SessionRecord) -> bool) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, record| keep(record));
        before - sessions.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaLimits {
    pub free_daily: u32,
    pub premium_daily: u32,
}

impl QuotaLimits {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            free_daily: config.free_daily_searches,
            premium_daily: config.premium_daily_searches,
        }
    }
}

impl Default for QuotaLimits {
    fn default() -> Self {
        Self {
            free_daily: 2,
            premium_daily: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Limited(u32),
    Unlimited,
}

impl Serialize for Remaining {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Remaining::Limited(n) => serializer.serialize_u32(*n),
            Remaining::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remaining::Limited(n) => write!(f, "{n}"),
            Remaining::Unlimited => write!(f, "Unlimited"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaStatus {
    pub session_id: String,
    pub subscription: Subscription,
    pub premium: bool,
    pub developer_mode: bool,
    pub daily_searches: u32,
    pub total_searches: u64,
    /// `None` means unlimited.
    pub search_limit: Option<u32>,
    pub remaining: Remaining,
    pub subscription_expiry: Option<DateTime<Utc>>,
}

/// Every load/modify/save sequence runs under `updates`, so concurrent
/// requests on one session cannot both pass the limit check.
pub struct QuotaService<S, C> {
    store: S,
    clock: C,
    limits: QuotaLimits,
    updates: Mutex<()>,
}

impl<S: SessionStore, C: Clock> QuotaService<S, C> {
    pub fn new(store: S, clock: C, limits: QuotaLimits) -> Self {
        Self {
            store,
            clock,
            limits,
            updates: Mutex::new(()),
        }
    }

    pub fn limits(&self) -> QuotaLimits {
        self.limits
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn lock_updates(&self) -> MutexGuard<'_, ()> {
        self.updates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Load the session, applying day rollover and premium expiry, and persist
    /// the refreshed record if either changed it.
    fn refreshed(&self, session_id: &str) -> SessionRecord {
        let today = self.today();
        let now = self.clock.now();
        let mut record = self
            .store
            .load(session_id)
            .unwrap_or_else(|| SessionRecord::new(today));
        let original = record.clone();

        if record.last_search_date != today {
            record.daily_searches = 0;
            record.last_search_date = today;
        }

        if record.subscription == Subscription::Premium && !record.developer_mode {
            if let Some(expiry) = record.subscription_expiry {
                if expiry < now {
                    tracing::info!(session_id, %expiry, "premium subscription expired");
                    record.subscription = Subscription::Free;
                    record.subscription_expiry = None;
                }
            }
        }

        if record != original {
            self.store.save(session_id, record.clone());
        }
        record
    }

    fn limit_for(&self, record: &SessionRecord) -> Option<u32> {
        if record.developer_mode {
            return None;
        }
        match record.subscription {
            Subscription::Premium => Some(self.limits.premium_daily),
            Subscription::Free => Some(self.limits.free_daily),
        }
    }

    fn status_for(&self, session_id: &str, record: &SessionRecord) -> QuotaStatus {
        let search_limit = self.limit_for(record);
        let remaining = match search_limit {
            None => Remaining::Unlimited,
            Some(limit) => Remaining::Limited(limit.saturating_sub(record.daily_searches)),
        };
        QuotaStatus {
            session_id: session_id.to_string(),
            subscription: record.subscription,
            premium: record.developer_mode || record.subscription == Subscription::Premium,
            developer_mode: record.developer_mode,
            daily_searches: record.daily_searches,
            total_searches: record.total_searches,
            search_limit,
            remaining,
            subscription_expiry: record.subscription_expiry,
        }
    }

    pub fn can_search(&self, session_id: &str) -> bool {
        let _guard = self.lock_updates();
        let record = self.refreshed(session_id);
        match self.limit_for(&record) {
            None => true,
            Some(limit) => record.daily_searches < limit,
        }
    }

    /// Count one search against today's quota. Does not itself enforce the limit.
    pub fn record_search(&self, session_id: &str) -> QuotaStatus {
        let _guard = self.lock_updates();
        let record = self.refreshed(session_id);
        self.count_search(session_id, record)
    }

    /// Check the limit and count the search as one step.
    ///
    /// # Errors
    ///
    /// Returns the unchanged [`QuotaStatus`] when today's limit is already
    /// reached; nothing is counted in that case.
    pub fn try_record_search(&self, session_id: &str) -> Result<QuotaStatus, QuotaStatus> {
        let _guard = self.lock_updates();
        let record = self.refreshed(session_id);
        if let Some(limit) = self.limit_for(&record) {
            if record.daily_searches >= limit {
                return Err(self.status_for(session_id, &record));
            }
        }
        Ok(self.count_search(session_id, record))
    }

    fn count_search(&self, session_id: &str, mut record: SessionRecord) -> QuotaStatus {
        record.daily_searches = record.daily_searches.saturating_add(1);
        record.total_searches = record.total_searches.saturating_add(1);
        self.store.save(session_id, record.clone());
        tracing::debug!(
            session_id,
            daily_searches = record.daily_searches,
            "recorded search"
        );
        self.status_for(session_id, &record)
    }

    /// Whether the session is premium right now; an expired subscription is
    /// downgraded to free as a side effect.
    pub fn is_premium(&self, session_id: &str) -> bool {
        let _guard = self.lock_updates();
        let record = self.refreshed(session_id);
        record.developer_mode || record.subscription == Subscription::Premium
    }

    /// Today's search limit, or `None` when unlimited.
    pub fn search_limit(&self, session_id: &str) -> Option<u32> {
        let _guard = self.lock_updates();
        let record = self.refreshed(session_id);
        self.limit_for(&record)
    }

    pub fn remaining_searches(&self, session_id: &str) -> Remaining {
        self.status(session_id).remaining
    }

    pub fn status(&self, session_id: &str) -> QuotaStatus {
        let _guard = self.lock_updates();
        let record = self.refreshed(session_id);
        self.status_for(session_id, &record)
    }

    /// Mark the session premium until `expiry` (`None` never expires).
    pub fn upgrade_to_premium(
        &self,
        session_id: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> QuotaStatus {
        let _guard = self.lock_updates();
        let mut record = self.refreshed(session_id);
        record.subscription = Subscription::Premium;
        record.subscription_expiry = expiry;
        self.store.save(session_id, record.clone());
        tracing::info!(session_id, ?expiry, "session upgraded to premium");
        self.status_for(session_id, &record)
    }

    /// Toggle unlimited developer mode. Enabling it also clears today's count.
    pub fn set_developer_mode(&self, session_id: &str, enabled: bool) -> QuotaStatus {
        let _guard = self.lock_updates();
        let mut record = self.refreshed(session_id);
        record.developer_mode = enabled;
        if enabled {
            record.daily_searches = 0;
        }
        self.store.save(session_id, record.clone());
        self.status_for(session_id, &record)
    }

    /// Remove free sessions that have not searched since before today and
    /// carry no subscription state. Returns the number of sessions dropped.
    pub fn prune_idle(&self) -> usize {
        let _guard = self.lock_updates();
        let today = self.today();
        self.store.retain(&|record: &SessionRecord| {
            record.last_search_date >= today
                || record.subscription == Subscription::Premium
                || record.developer_mode
        })
    }
}
