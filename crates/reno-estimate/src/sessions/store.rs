use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::estimate::Estimate;

/// Identifier wrapper for editing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Open estimates keyed by session. Sessions nobody touches are dropped by
/// [`EstimateSessions::sweep_idle`].
#[derive(Debug, Default)]
pub struct EstimateSessions {
    sessions: Mutex<HashMap<SessionId, OpenSession>>,
}

#[derive(Debug)]
struct OpenSession {
    estimate: Estimate,
    touched: Instant,
}

impl EstimateSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, OpenSession>> {
        // Every mutation is one call on `Estimate`, so a poisoned map is still consistent.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn open(&self, estimate: Estimate) -> SessionId {
        let id = SessionId::generate();
        self.lock().insert(
            id.clone(),
            OpenSession {
                estimate,
                touched: Instant::now(),
            },
        );
        id
    }

    pub fn close(&self, id: &SessionId) -> Option<Estimate> {
        self.lock().remove(id).map(|session| session.estimate)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.lock().contains_key(id)
    }

    /// Runs `f` against the session's estimate while holding the guard.
    pub fn with<T>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut Estimate) -> T,
    ) -> Result<T, SessionError> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.clone()))?;
        session.touched = Instant::now();
        Ok(f(&mut session.estimate))
    }

    pub fn snapshot(&self, id: &SessionId) -> Result<Estimate, SessionError> {
        self.with(id, |estimate| estimate.clone())
    }

    /// Swaps in a whole estimate, e.g. after loading a saved project.
    pub fn replace(&self, id: &SessionId, estimate: Estimate) -> Result<(), SessionError> {
        self.with(id, |current| *current = estimate)
    }

    /// Closes sessions untouched for longer than `max_idle`. Returns how many went.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        self.sweep_idle_at(Instant::now(), max_idle)
    }

    fn sweep_idle_at(&self, now: Instant, max_idle: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| now.saturating_duration_since(session.touched) <= max_idle);
        before - sessions.len()
    }
}
