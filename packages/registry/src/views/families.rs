//! # Families list
//!
//! [`FamilyList`] keeps a live mirror of the `families` collection, newest first.
//!
//! - [`activate`](FamilyList::activate) opens a change channel on `families` and
//!   then fetches. Notifications are queued from the moment the channel opens, so
//!   none is lost between the first fetch and the subscription.
//! - [`next_change`](FamilyList::next_change) yields queued notifications; the host
//!   calls [`refetch`](FamilyList::refetch) for each. Refetches may overlap; the most
//!   recently issued one decides the final state.
//! - [`deactivate`](FamilyList::deactivate), or dropping the last clone, closes the
//!   channel. Queued notifications are discarded and in-flight responses ignored.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use backend::{Backend, Change, ChannelHandle, Direction, Family, Table};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use super::fetch::{FetchGuard, ViewState};

pub type FamiliesState = ViewState<Vec<Family>>;

pub struct FamilyList<B: Backend> {
    inner: Arc<ListInner<B>>,
}

impl<B: Backend> Clone for FamilyList<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct ListInner<B: Backend> {
    backend: B,
    state: watch::Sender<FamiliesState>,
    fetches: FetchGuard,
    active: AtomicBool,
    channel: Mutex<Option<ChannelHandle>>,
    changes: tokio::sync::Mutex<Option<mpsc::UnboundedReceiver<Change>>>,
}

impl<B: Backend> Drop for ListInner<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.channel.get_mut().take() {
            self.backend.close_channel(handle);
        }
    }
}

impl<B: Backend> FamilyList<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(FamiliesState::default());
        Self {
            inner: Arc::new(ListInner {
                backend,
                state,
                fetches: FetchGuard::default(),
                active: AtomicBool::new(false),
                channel: Mutex::new(None),
                changes: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> FamiliesState {
        self.inner.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FamiliesState> {
        self.inner.state.subscribe()
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Subscribe to changes, then load the collection.
    pub async fn activate(&self) {
        if !self.inner.active.swap(true, Ordering::SeqCst) {
            let (tx, rx) = mpsc::unbounded_channel();
            let handle = self.inner.backend.subscribe_to_changes(
                Table::Families,
                Arc::new(move |change: Change| {
                    let _ = tx.send(change);
                }),
            );
            *self.inner.changes.lock().await = Some(rx);
            if let Some(stale) = self.inner.channel.lock().replace(handle) {
                self.inner.backend.close_channel(stale);
            }
        }
        self.refetch().await;
    }

    /// Wait for the next change notification. Returns `None` once the view is
    /// inactive.
    pub async fn next_change(&self) -> Option<Change> {
        let mut changes = self.inner.changes.lock().await;
        let change = changes.as_mut()?.recv().await;
        match change {
            Some(change) if self.is_active() => Some(change),
            _ => {
                *changes = None;
                None
            }
        }
    }

    /// Refetch on every notification, one at a time, until deactivated.
    pub async fn follow_changes(&self) {
        while self.next_change().await.is_some() {
            self.refetch().await;
        }
    }

    /// Fetch the whole collection and replace the mirror.
    pub async fn refetch(&self) {
        if !self.is_active() {
            return;
        }
        let ticket = self.inner.fetches.begin();
        self.inner.state.send_modify(|s| s.begin());

        let result = self
            .inner
            .backend
            .from(Table::Families)
            .with_columns("*")
            .order_by("created_at", Direction::Descending)
            .fetch_many::<Family>()
            .await;

        if !self.inner.fetches.is_current(ticket) {
            tracing::debug!("dropping superseded families response");
            return;
        }
        match result {
            Ok(families) => {
                tracing::debug!(count = families.len(), "families loaded");
                self.inner.state.send_modify(|s| s.succeed(families));
            }
            Err(e) => {
                tracing::warn!("families fetch failed: {}", e);
                self.inner.state.send_modify(|s| s.fail(e.to_string()));
            }
        }
    }

    pub fn dismiss_error(&self) {
        self.inner.state.send_modify(|s| s.dismiss_error());
    }

    /// Close the change channel and ignore responses still in flight.
    pub fn deactivate(&self) {
        self.inner.active.store(false, Ordering::SeqCst);
        self.inner.fetches.invalidate();
        if let Some(handle) = self.inner.channel.lock().take() {
            self.inner.backend.close_channel(handle);
        }
    }
}
