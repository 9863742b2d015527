use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EstimateSession;
use crate::location::LocationHierarchy;
use crate::prediction::PredictionClient;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// How long an untouched session lives and how many may be held at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub idle_ttl: Duration,
    pub capacity: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            capacity: 10_000,
        }
    }
}

struct SessionEntry<C> {
    session: Arc<EstimateSession<C>>,
    last_touched: Instant,
}

/// In-memory store of live sessions, all sharing one hierarchy and client.
///
/// Idle sessions are swept on every `create` and `get`; at capacity the
/// least recently touched session makes room for the new one.
pub struct SessionRegistry<C> {
    hierarchy: Arc<LocationHierarchy>,
    client: Arc<C>,
    limits: SessionLimits,
    sessions: Mutex<HashMap<SessionId, SessionEntry<C>>>,
}

impl<C> SessionRegistry<C>
where
    C: PredictionClient + 'static,
{
    pub fn new(hierarchy: Arc<LocationHierarchy>, client: Arc<C>) -> Self {
        Self::with_limits(hierarchy, client, SessionLimits::default())
    }

    pub fn with_limits(
        hierarchy: Arc<LocationHierarchy>,
        client: Arc<C>,
        limits: SessionLimits,
    ) -> Self {
        Self {
            hierarchy,
            client,
            limits,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn hierarchy(&self) -> &LocationHierarchy {
        &self.hierarchy
    }

    pub fn limits(&self) -> SessionLimits {
        self.limits
    }

    pub fn create(&self) -> (SessionId, Arc<EstimateSession<C>>) {
        self.create_at(Instant::now())
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<EstimateSession<C>>> {
        self.get_at(id, Instant::now())
    }

    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn create_at(&self, now: Instant) -> (SessionId, Arc<EstimateSession<C>>) {
        let id = next_session_id();
        let session = Arc::new(EstimateSession::new(
            self.hierarchy.clone(),
            self.client.clone(),
        ));

        let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
        self.sweep(&mut sessions, now);
        while sessions.len() >= self.limits.capacity.max(1) {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_touched)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    debug!(session_id = %oldest.0, "estimate session evicted at capacity");
                    sessions.remove(&oldest);
                }
                None => break,
            }
        }
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: session.clone(),
                last_touched: now,
            },
        );
        debug!(session_id = %id.0, live = sessions.len(), "estimate session created");
        (id, session)
    }

    fn get_at(&self, id: &SessionId, now: Instant) -> Option<Arc<EstimateSession<C>>> {
        let mut sessions = self.sessions.lock().expect("session registry mutex poisoned");
        self.sweep(&mut sessions, now);
        sessions.get_mut(id).map(|entry| {
            entry.last_touched = now;
            entry.session.clone()
        })
    }

    fn sweep(&self, sessions: &mut HashMap<SessionId, SessionEntry<C>>, now: Instant) {
        let before = sessions.len();
        let ttl = self.limits.idle_ttl;
        sessions.retain(|_, entry| now.saturating_duration_since(entry.last_touched) < ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            debug!(expired, "idle estimate sessions swept");
        }
    }
}

fn next_session_id() -> SessionId {
    static SEQUENCE: AtomicU64 = AtomicU64::new(1);
    let id = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("est-{id:06}"))
}
