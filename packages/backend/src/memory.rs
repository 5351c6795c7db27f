use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{AuthError, FetchError};
use crate::facade::Backend;
use crate::listeners::{
    AuthSubscription, ChangeHandler, ChangeHub, ChannelHandle, SessionHandler, SessionListeners,
};
use crate::models::{
    Change, ChangeKind, Credentials, Identity, Row, Session, SignUpDetails, Table,
};
use crate::query::Query;

/// In-memory backend for tests and offline use.
///
/// Besides the [`Backend`] surface it exposes a few knobs for tests: injected
/// fetch failures, fetch gates that hold a read until released, and counters of
/// executed reads.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Session>>,
    listeners: Arc<SessionListeners>,
    hub: ChangeHub,
    failures: Mutex<HashMap<Table, VecDeque<FetchError>>>,
    gates: Mutex<HashMap<Table, VecDeque<oneshot::Receiver<()>>>>,
    selects: Mutex<HashMap<Table, usize>>,
}

struct Account {
    password: String,
    identity: Identity,
}

const MIN_PASSWORD_LEN: usize = 6;

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append records to a table without emitting change notifications.
    pub fn seed<T: Serialize>(&self, table: Table, records: impl IntoIterator<Item = T>) {
        let rows: Vec<Row> = records.into_iter().filter_map(|r| to_row(&r)).collect();
        self.inner.tables.lock().entry(table).or_default().extend(rows);
    }

    /// Remove every row of a table without emitting change notifications.
    pub fn clear(&self, table: Table) {
        self.inner.tables.lock().remove(&table);
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.inner
            .tables
            .lock()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn insert<T: Serialize>(&self, table: Table, record: &T) {
        if let Some(row) = to_row(record) {
            self.inner.tables.lock().entry(table).or_default().push(row);
            self.emit_change(table, ChangeKind::Insert);
        }
    }

    /// Replace the row whose `id` matches the record's `id`.
    pub fn update<T: Serialize>(&self, table: Table, record: &T) -> bool {
        let Some(row) = to_row(record) else {
            return false;
        };
        let replaced = {
            let mut tables = self.inner.tables.lock();
            let rows = tables.entry(table).or_default();
            match rows.iter_mut().find(|r| r.get("id") == row.get("id")) {
                Some(existing) => {
                    *existing = row;
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.emit_change(table, ChangeKind::Update);
        }
        replaced
    }

    pub fn delete(&self, table: Table, id: impl Into<Value>) -> bool {
        let id = id.into();
        let removed = {
            let mut tables = self.inner.tables.lock();
            let rows = tables.entry(table).or_default();
            let before = rows.len();
            rows.retain(|r| r.get("id") != Some(&id));
            rows.len() != before
        };
        if removed {
            self.emit_change(table, ChangeKind::Delete);
        }
        removed
    }

    /// Deliver a change notification as if it came from the remote feed.
    pub fn emit_change(&self, table: Table, kind: ChangeKind) {
        self.inner.hub.emit(Change { table, kind });
    }

    /// Register an account that can sign in with the given password.
    pub fn add_account(&self, id: &str, email: &str, password: &str) -> Identity {
        let identity = Identity {
            id: id.to_string(),
            email: Some(email.to_string()),
        };
        self.inner.accounts.lock().insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        identity
    }

    /// Replace the tracked session and notify listeners, as a token refresh or a
    /// sign-in from another tab would.
    pub fn set_session(&self, session: Option<Session>) {
        *self.inner.session.lock() = session.clone();
        self.inner.listeners.emit(session);
    }

    /// Make the next read against `table` fail with `error`.
    pub fn fail_next(&self, table: Table, error: FetchError) {
        self.inner
            .failures
            .lock()
            .entry(table)
            .or_default()
            .push_back(error);
    }

    /// Hold the next read against `table` until the returned sender fires or is
    /// dropped. Rows are read after release.
    pub fn gate_next(&self, table: Table) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.inner.gates.lock().entry(table).or_default().push_back(rx);
        tx
    }

    /// Number of reads executed against `table`.
    pub fn select_count(&self, table: Table) -> usize {
        self.inner.selects.lock().get(&table).copied().unwrap_or(0)
    }

    pub fn session_listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    pub fn open_channel_count(&self) -> usize {
        self.inner.hub.open_count()
    }

    fn start_session(&self, identity: Identity) -> Session {
        let session = Session {
            access_token: uuid::Uuid::new_v4().to_string(),
            identity,
        };
        self.set_session(Some(session.clone()));
        session
    }
}

fn to_row<T: Serialize>(record: &T) -> Option<Row> {
    match serde_json::to_value(record) {
        Ok(Value::Object(row)) => Some(row),
        Ok(other) => {
            tracing::warn!(value = %other, "ignoring non-object record");
            None
        }
        Err(e) => {
            tracing::warn!("failed to serialise record: {}", e);
            None
        }
    }
}

impl Backend for MemoryBackend {
    async fn current_session(&self) -> Option<Session> {
        self.inner.session.lock().clone()
    }

    fn on_session_change(&self, handler: SessionHandler) -> AuthSubscription {
        let id = self.inner.listeners.add(handler);
        let listeners = self.inner.listeners.clone();
        AuthSubscription::new(move || {
            listeners.remove(id);
        })
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let identity = {
            let accounts = self.inner.accounts.lock();
            match accounts.get(&credentials.email.trim().to_lowercase()) {
                Some(account) if account.password == credentials.password => {
                    account.identity.clone()
                }
                _ => return Err(AuthError::InvalidCredentials),
            }
        };
        Ok(self.start_session(identity))
    }

    async fn sign_up(&self, details: &SignUpDetails) -> Result<Option<Session>, AuthError> {
        let email = details.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if details.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.inner.accounts.lock().contains_key(&email) {
            return Err(AuthError::AlreadyRegistered);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let identity = self.add_account(&id, &email, &details.password);
        self.seed(
            Table::Profiles,
            [serde_json::json!({
                "id": id,
                "email": email,
                "full_name": details.full_name,
                "role": "user",
            })],
        );
        Ok(Some(self.start_session(identity)))
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None);
        Ok(())
    }

    async fn select(&self, query: &Query) -> Result<Vec<Row>, FetchError> {
        let table = query.table;
        *self.inner.selects.lock().entry(table).or_default() += 1;

        let gate = self
            .inner
            .gates
            .lock()
            .get_mut(&table)
            .and_then(VecDeque::pop_front);
        if let Some(gate) = gate {
            // A dropped sender releases the read too.
            let _ = gate.await;
        }

        let failure = self
            .inner
            .failures
            .lock()
            .get_mut(&table)
            .and_then(VecDeque::pop_front);
        if let Some(error) = failure {
            return Err(error);
        }

        let tables = self.inner.tables.lock();
        Ok(tables
            .get(&table)
            .map(|rows| query.apply(rows))
            .unwrap_or_default())
    }

    fn subscribe_to_changes(&self, table: Table, on_change: ChangeHandler) -> ChannelHandle {
        self.inner.hub.open(table, on_change)
    }

    fn close_channel(&self, handle: ChannelHandle) {
        self.inner.hub.close(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Family, Member, Profile};
    use crate::query::Direction;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn family(id: i64, name: &str) -> Family {
        Family {
            id,
            family_name: name.to_string(),
            parish: Some("St. Joseph".to_string()),
            province: None,
            jummuiya: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_no_session_by_default() {
        let backend = MemoryBackend::new();
        assert!(backend.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_in_fires_listeners() {
        let backend = MemoryBackend::new();
        backend.add_account("u-1", "admin@parish.org", "secret1");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let sub = backend.on_session_change(Arc::new(move |s: Option<Session>| {
            log.lock().push(s.map(|s| s.identity.id));
        }));

        let err = backend
            .sign_in(&Credentials::new("admin@parish.org", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);

        let session = backend
            .sign_in(&Credentials::new("Admin@Parish.org", "secret1"))
            .await
            .unwrap();
        assert_eq!(session.identity.id, "u-1");
        assert_eq!(backend.current_session().await, Some(session));

        backend.sign_out().await.unwrap();
        assert!(backend.current_session().await.is_none());
        assert_eq!(*seen.lock(), vec![Some("u-1".to_string()), None]);

        sub.unsubscribe();
        assert_eq!(backend.session_listener_count(), 0);
    }

    #[tokio::test]
    async fn test_sign_up_creates_profile() {
        let backend = MemoryBackend::new();
        let details = SignUpDetails {
            email: "new@parish.org".to_string(),
            password: "longenough".to_string(),
            full_name: Some("New Person".to_string()),
        };
        let session = backend.sign_up(&details).await.unwrap().unwrap();

        let profile: Option<Profile> = backend
            .from(Table::Profiles)
            .where_equals("id", session.identity.id.clone())
            .fetch_one()
            .await
            .unwrap();
        let profile = profile.unwrap();
        assert_eq!(profile.role.as_deref(), Some("user"));
        assert_eq!(profile.full_name.as_deref(), Some("New Person"));

        assert_eq!(
            backend.sign_up(&details).await.unwrap_err(),
            AuthError::AlreadyRegistered
        );
    }

    #[tokio::test]
    async fn test_sign_up_validates_input() {
        let backend = MemoryBackend::new();
        let err = backend
            .sign_up(&SignUpDetails {
                email: "nope".to_string(),
                password: "longenough".to_string(),
                full_name: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));

        let err = backend
            .sign_up(&SignUpDetails {
                email: "a@b.org".to_string(),
                password: "short".to_string(),
                full_name: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Password should be at least 6 characters");
    }

    #[tokio::test]
    async fn test_fetch_many_orders_and_filters() {
        let backend = MemoryBackend::new();
        backend.seed(
            Table::Members,
            [
                json!({"id": 1, "family_id": 7, "first_name": "A", "date_of_birth": "2010-01-01"}),
                json!({"id": 2, "family_id": 7, "first_name": "B", "date_of_birth": "2005-06-01"}),
                json!({"id": 3, "family_id": 7, "first_name": "C", "date_of_birth": "1999-12-31"}),
                json!({"id": 4, "family_id": 9, "first_name": "D", "date_of_birth": "1980-01-01"}),
            ],
        );

        let members: Vec<Member> = backend
            .from(Table::Members)
            .with_columns("*")
            .where_equals("family_id", 7)
            .order_by("date_of_birth", Direction::Ascending)
            .fetch_many()
            .await
            .unwrap();
        let ids: Vec<i64> = members.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let none: Vec<Member> = backend
            .from(Table::Members)
            .where_equals("family_id", 100)
            .fetch_many()
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_one_is_lenient() {
        let backend = MemoryBackend::new();
        backend.seed(Table::Families, [family(1, "Okello"), family(2, "Mwangi")]);

        let found: Option<Family> = backend
            .from(Table::Families)
            .where_equals("id", 2)
            .fetch_one()
            .await
            .unwrap();
        assert_eq!(found.unwrap().family_name, "Mwangi");

        let missing: Option<Family> = backend
            .from(Table::Families)
            .where_equals("id", 3)
            .fetch_one()
            .await
            .unwrap();
        assert!(missing.is_none());

        let ambiguous: Option<Family> = backend
            .from(Table::Families)
            .where_equals("parish", "St. Joseph")
            .fetch_one()
            .await
            .unwrap();
        assert!(ambiguous.is_none());
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let backend = MemoryBackend::new();
        backend.seed(Table::Families, [family(1, "Okello")]);
        backend.fail_next(Table::Families, FetchError::Network("offline".to_string()));

        let err = backend
            .from(Table::Families)
            .fetch_many::<Family>()
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "offline");

        let ok: Vec<Family> = backend.from(Table::Families).fetch_many().await.unwrap();
        assert_eq!(ok.len(), 1);
        assert_eq!(backend.select_count(Table::Families), 2);
    }

    #[tokio::test]
    async fn test_decode_failure_names_table() {
        let backend = MemoryBackend::new();
        backend.seed(Table::Families, [json!({"id": "not-a-number"})]);
        let err = backend
            .from(Table::Families)
            .fetch_many::<Family>()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode { ref table, .. } if table == "families"));
    }

    #[tokio::test]
    async fn test_writes_emit_changes() {
        let backend = MemoryBackend::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let handle = backend.subscribe_to_changes(
            Table::Families,
            Arc::new(move |_: Change| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        backend.insert(Table::Families, &family(1, "Okello"));
        assert!(backend.update(Table::Families, &family(1, "Okello-Otieno")));
        assert!(!backend.update(Table::Families, &family(5, "Ghost")));
        assert!(backend.delete(Table::Families, 1));
        assert_eq!(count.load(Ordering::SeqCst), 3);

        backend.close_channel(handle);
        assert_eq!(backend.open_channel_count(), 0);
        backend.insert(Table::Families, &family(2, "Mwangi"));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
