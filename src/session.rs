//! Per-visitor dashboard state.
//!
//! A [`Session`] holds the questionnaire gate and the line filter. It only
//! changes through [`Session::apply`], and it remembers the last rendered
//! dashboard so a request whose inputs did not change reuses it.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::model::UserResponse;

/// Which lines the user wants to see.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum LineSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl LineSelection {
    /// The selected lines that exist in `available`.
    pub fn resolve(&self, available: &[String]) -> BTreeSet<String> {
        match self {
            LineSelection::All => available.iter().cloned().collect(),
            LineSelection::Only(lines) => available
                .iter()
                .filter(|line| lines.contains(*line))
                .cloned()
                .collect(),
        }
    }
}

/// The questionnaire gate: the dashboard is only shown once it is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Questionnaire {
    #[default]
    Incomplete,
    Complete(UserResponse),
}

/// Things a visitor can do.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Submit(UserResponse),
    Reset,
    SelectLines(BTreeSet<String>),
    SelectAll,
}

#[derive(Debug, Clone)]
struct RenderedPage {
    fingerprint: u64,
    html: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    questionnaire: Questionnaire,
    selection: LineSelection,
    rendered: Option<RenderedPage>,
    last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            questionnaire: Questionnaire::Incomplete,
            selection: LineSelection::All,
            rendered: None,
            last_seen: Utc::now(),
        }
    }

    pub fn questionnaire(&self) -> &Questionnaire {
        &self.questionnaire
    }

    pub fn answers(&self) -> Option<&UserResponse> {
        match &self.questionnaire {
            Questionnaire::Complete(response) => Some(response),
            Questionnaire::Incomplete => None,
        }
    }

    pub fn selection(&self) -> &LineSelection {
        &self.selection
    }

    /// Applies `event`. Returns `true` if the session changed.
    ///
    /// `Submit` only takes effect on an incomplete questionnaire and `Reset`
    /// only on a complete one; `Reset` also clears the line filter.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        let changed = match event {
            SessionEvent::Submit(response) => match self.questionnaire {
                Questionnaire::Incomplete => {
                    self.questionnaire = Questionnaire::Complete(response);
                    true
                }
                Questionnaire::Complete(_) => false,
            },
            SessionEvent::Reset => match self.questionnaire {
                Questionnaire::Complete(_) => {
                    self.questionnaire = Questionnaire::Incomplete;
                    self.selection = LineSelection::All;
                    true
                }
                Questionnaire::Incomplete => false,
            },
            SessionEvent::SelectLines(lines) => {
                let next = LineSelection::Only(lines);
                let changed = self.selection != next;
                self.selection = next;
                changed
            }
            SessionEvent::SelectAll => {
                let changed = self.selection != LineSelection::All;
                self.selection = LineSelection::All;
                changed
            }
        };

        if changed {
            self.rendered = None;
        }
        debug!(session = %self.id, changed, "Session event applied");
        changed
    }

    /// Hash of everything the dashboard page depends on.
    pub fn fingerprint(&self, summary_generation: u64, map_generation: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.questionnaire.hash(&mut hasher);
        self.selection.hash(&mut hasher);
        summary_generation.hash(&mut hasher);
        map_generation.hash(&mut hasher);
        hasher.finish()
    }

    /// The memoized page for `fingerprint`, if still current.
    pub fn cached_page(&self, fingerprint: u64) -> Option<&str> {
        self.rendered
            .as_ref()
            .filter(|page| page.fingerprint == fingerprint)
            .map(|page| page.html.as_str())
    }

    pub fn store_page(&mut self, fingerprint: u64, html: String) {
        self.rendered = Some(RenderedPage { fingerprint, html });
    }
}

/// Sessions idle for longer than this are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
/// Upper bound on live sessions; the least recently seen one is evicted first.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// All live sessions, keyed by the id carried in the session cookie.
///
/// Ids are only ever issued by the store. A cookie naming an unknown or
/// expired session gets a fresh id instead of being adopted.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    idle_timeout: TimeDelta,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS)
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: TimeDelta::from_std(idle_timeout).unwrap_or(TimeDelta::MAX),
            max_sessions: max_sessions.max(1),
        }
    }

    fn is_live(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.last_seen <= self.idle_timeout
    }

    /// Marks the live session `id` as seen, or starts a new one.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Session>,
        id: Option<Uuid>,
    ) -> &'a mut Session {
        let now = Utc::now();
        let known = id.filter(|id| {
            sessions
                .get(id)
                .is_some_and(|session| self.is_live(session, now))
        });

        let id = match known {
            Some(id) => id,
            None => {
                self.sweep(sessions, now);
                let id = Uuid::new_v4();
                sessions.insert(id, Session::new(id));
                debug!(session = %id, live = sessions.len(), "Session created");
                id
            }
        };

        let session = sessions.entry(id).or_insert_with(|| Session::new(id));
        session.last_seen = now;
        session
    }

    /// Drops idle sessions, then the least recently seen ones until a new
    /// session fits under the cap.
    fn sweep(&self, sessions: &mut HashMap<Uuid, Session>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, session| self.is_live(session, now));

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .values()
                .min_by_key(|session| session.last_seen)
                .map(|session| session.id);
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!(dropped, live = sessions.len(), "Sessions expired");
        }
    }

    /// Returns a copy of the session with `id`, creating a fresh one (with a
    /// new id) when the id is missing, unknown or expired.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> Session {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, id).clone()
    }

    /// Applies `event` to the session, creating a fresh one first if needed.
    /// Returns the id the session lives under and whether it changed.
    pub async fn apply(&self, id: Option<Uuid>, event: SessionEvent) -> (Uuid, bool) {
        let mut sessions = self.sessions.write().await;
        let session = self.touch(&mut sessions, id);
        (session.id, session.apply(event))
    }

    pub async fn store_page(&self, id: Uuid, fingerprint: u64, html: String) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.store_page(fingerprint, html);
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RidesZoneBuses;

    fn response(guess: &str) -> UserResponse {
        UserResponse::new(RidesZoneBuses::Yes, "917", guess)
    }

    fn lines(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_state_flow() {
        let mut session = Session::new(Uuid::new_v4());
        assert_eq!(session.questionnaire(), &Questionnaire::Incomplete);

        assert!(session.apply(SessionEvent::Submit(response("918"))));
        assert_eq!(session.answers().map(|r| r.delay_guess.as_str()), Some("918"));

        assert!(!session.apply(SessionEvent::Submit(response("321"))));
        assert_eq!(session.answers().map(|r| r.delay_guess.as_str()), Some("918"));

        assert!(session.apply(SessionEvent::Reset));
        assert_eq!(session.questionnaire(), &Questionnaire::Incomplete);
        assert!(!session.apply(SessionEvent::Reset));
    }

    #[test]
    fn test_reset_clears_selection() {
        let mut session = Session::new(Uuid::new_v4());
        session.apply(SessionEvent::Submit(response("")));
        session.apply(SessionEvent::SelectLines(lines(&["917"])));

        session.apply(SessionEvent::Reset);

        assert_eq!(session.selection(), &LineSelection::All);
    }

    #[test]
    fn test_selection_resolves_against_available() {
        let available = vec!["321".to_string(), "917".to_string(), "918".to_string()];

        let only = LineSelection::Only(lines(&["917", "999"]));
        assert_eq!(only.resolve(&available), lines(&["917"]));
        assert_eq!(LineSelection::All.resolve(&available), lines(&["321", "917", "918"]));
        assert!(LineSelection::Only(BTreeSet::new()).resolve(&available).is_empty());
    }

    #[test]
    fn test_unchanged_selection_keeps_rendered_page() {
        let mut session = Session::new(Uuid::new_v4());
        session.apply(SessionEvent::Submit(response("")));
        let fp = session.fingerprint(1, 1);
        session.store_page(fp, "<html/>".to_string());

        assert!(!session.apply(SessionEvent::SelectAll));
        assert_eq!(session.cached_page(fp), Some("<html/>"));

        assert!(session.apply(SessionEvent::SelectLines(lines(&["917"]))));
        assert_eq!(session.cached_page(fp), None);
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let mut session = Session::new(Uuid::new_v4());
        let before = session.fingerprint(1, 1);
        assert_eq!(before, session.fingerprint(1, 1));
        assert_ne!(before, session.fingerprint(2, 1));

        session.apply(SessionEvent::SelectLines(lines(&["918"])));
        assert_ne!(before, session.fingerprint(1, 1));
    }

    #[tokio::test]
    async fn test_store_creates_and_reuses_sessions() {
        let store = SessionStore::new();

        let created = store.get_or_create(None).await;
        let again = store.get_or_create(Some(created.id)).await;
        assert_eq!(created.id, again.id);
        assert_eq!(store.len().await, 1);

        let (id, changed) = store
            .apply(Some(created.id), SessionEvent::Submit(response("917")))
            .await;
        assert_eq!(id, created.id);
        assert!(changed);
        let updated = store.get_or_create(Some(created.id)).await;
        assert!(updated.answers().is_some());
    }

    #[tokio::test]
    async fn test_unknown_ids_are_not_adopted() {
        let store = SessionStore::new();
        let forged = Uuid::new_v4();

        let session = store.get_or_create(Some(forged)).await;
        assert_ne!(session.id, forged);

        let (id, _) = store.apply(Some(forged), SessionEvent::Reset).await;
        assert_ne!(id, forged);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_store_is_capped() {
        let store = SessionStore::with_limits(DEFAULT_IDLE_TIMEOUT, 50);

        let first = store.get_or_create(None).await;
        for _ in 0..500 {
            store.get_or_create(None).await;
        }
        for _ in 0..100 {
            store.apply(Some(Uuid::new_v4()), SessionEvent::Reset).await;
        }

        assert_eq!(store.len().await, 50);
        // The oldest session went first.
        assert_ne!(store.get_or_create(Some(first.id)).await.id, first.id);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let store = SessionStore::with_limits(Duration::from_millis(200), DEFAULT_MAX_SESSIONS);
        let idle = store.get_or_create(None).await;
        let active = store.get_or_create(None).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(store.get_or_create(Some(active.id)).await.id, active.id);
        tokio::time::sleep(Duration::from_millis(120)).await;

        let (id, _) = store.apply(Some(idle.id), SessionEvent::SelectAll).await;
        assert_ne!(id, idle.id);
        assert_eq!(store.get_or_create(Some(active.id)).await.id, active.id);
        // The idle session was swept when the replacement was created.
        assert_eq!(store.len().await, 2);
    }
}
