//! Handler registries for session-change events and table change feeds.
//!
//! Both registries hand out ids and invoke handlers outside the lock, so a
//! handler may register or release other handlers without deadlocking.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::{Change, Session, Table};

pub type SessionHandler = Arc<dyn Fn(Option<Session>) + Send + Sync>;
pub type ChangeHandler = Arc<dyn Fn(Change) + Send + Sync>;

/// Registered session-change handlers.
#[derive(Default)]
pub struct SessionListeners {
    next_id: AtomicU64,
    handlers: Mutex<BTreeMap<u64, SessionHandler>>,
}

impl SessionListeners {
    pub fn add(&self, handler: SessionHandler) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().insert(id, handler);
        id
    }

    pub fn remove(&self, id: u64) -> bool {
        self.handlers.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn emit(&self, session: Option<Session>) {
        let handlers: Vec<SessionHandler> = self.handlers.lock().values().cloned().collect();
        for handler in handlers {
            handler(session.clone());
        }
    }
}

/// Handle to an open change channel. Pass it back to `close_channel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub id: u64,
    pub table: Table,
}

/// Open change channels keyed by handle id.
#[derive(Default)]
pub struct ChangeHub {
    next_id: AtomicU64,
    channels: Mutex<BTreeMap<u64, (Table, ChangeHandler)>>,
}

impl ChangeHub {
    pub fn open(&self, table: Table, handler: ChangeHandler) -> ChannelHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.channels.lock().insert(id, (table, handler));
        tracing::debug!(%table, channel = id, "change channel opened");
        ChannelHandle { id, table }
    }

    pub fn close(&self, handle: ChannelHandle) -> bool {
        let removed = self.channels.lock().remove(&handle.id).is_some();
        if removed {
            tracing::debug!(table = %handle.table, channel = handle.id, "change channel closed");
        }
        removed
    }

    pub fn open_count(&self) -> usize {
        self.channels.lock().len()
    }

    /// Deliver a change to every channel open on its table.
    pub fn emit(&self, change: Change) {
        let handlers: Vec<ChangeHandler> = self
            .channels
            .lock()
            .values()
            .filter(|(table, _)| *table == change.table)
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(change);
        }
    }
}

/// Releases a session-change registration when dropped.
#[must_use = "dropping the subscription unregisters the handler"]
pub struct AuthSubscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl AuthSubscription {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release now instead of at drop.
    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeKind;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn change_hub_routes_by_table() {
        let hub = ChangeHub::default();
        let families = Arc::new(AtomicUsize::new(0));
        let counter = families.clone();
        let handle = hub.open(
            Table::Families,
            Arc::new(move |_: Change| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        hub.emit(Change { table: Table::Members, kind: ChangeKind::Insert });
        hub.emit(Change { table: Table::Families, kind: ChangeKind::Delete });
        assert_eq!(families.load(Ordering::SeqCst), 1);

        assert!(hub.close(handle));
        assert!(!hub.close(handle));
        hub.emit(Change { table: Table::Families, kind: ChangeKind::Update });
        assert_eq!(families.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn auth_subscription_releases_on_drop() {
        let listeners = Arc::new(SessionListeners::default());
        let id = listeners.add(Arc::new(|_: Option<Session>| {}));
        let registry = listeners.clone();
        let sub = AuthSubscription::new(move || {
            registry.remove(id);
        });
        assert_eq!(listeners.len(), 1);
        drop(sub);
        assert!(listeners.is_empty());
    }
}
