//! One family and its members, loaded together.

use std::sync::Arc;

use backend::{Backend, Direction, Family, Member, Table};
use futures::future::try_join;
use tokio::sync::watch;

use super::fetch::{FetchGuard, ViewState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyRecord {
    /// `None` when no single row matched the id.
    pub family: Option<Family>,
    /// Ordered by date of birth, oldest first.
    pub members: Vec<Member>,
}

pub type DetailState = ViewState<FamilyRecord>;

pub struct FamilyDetail<B: Backend> {
    inner: Arc<DetailInner<B>>,
}

impl<B: Backend> Clone for FamilyDetail<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct DetailInner<B: Backend> {
    backend: B,
    state: watch::Sender<DetailState>,
    fetches: FetchGuard,
}

impl<B: Backend> FamilyDetail<B> {
    pub fn new(backend: B) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self {
            inner: Arc::new(DetailInner {
                backend,
                state,
                fetches: FetchGuard::default(),
            }),
        }
    }

    pub fn state(&self) -> DetailState {
        self.inner.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<DetailState> {
        self.inner.state.subscribe()
    }

    /// Fetch the family row and its members concurrently and commit both at once.
    /// The first failure of the pair becomes the view's error.
    pub async fn load(&self, family_id: i64) {
        let ticket = self.inner.fetches.begin();
        self.inner.state.send_modify(|s| s.begin());

        let family = self
            .inner
            .backend
            .from(Table::Families)
            .with_columns("*")
            .where_equals("id", family_id)
            .fetch_one::<Family>();
        let members = self
            .inner
            .backend
            .from(Table::Members)
            .with_columns("*")
            .where_equals("family_id", family_id)
            .order_by("date_of_birth", Direction::Ascending)
            .fetch_many::<Member>();
        let result = try_join(family, members).await;

        if !self.inner.fetches.is_current(ticket) {
            tracing::debug!(family_id, "dropping superseded family response");
            return;
        }
        match result {
            Ok((family, mut members)) => {
                members.retain(|m: &Member| m.family_id == family_id);
                if family.is_none() {
                    tracing::info!(family_id, "family not found");
                }
                self.inner
                    .state
                    .send_modify(|s| s.succeed(FamilyRecord { family, members }));
            }
            Err(e) => {
                tracing::warn!(family_id, "family fetch failed: {}", e);
                self.inner.state.send_modify(|s| s.fail(e.to_string()));
            }
        }
    }

    pub fn dismiss_error(&self) {
        self.inner.state.send_modify(|s| s.dismiss_error());
    }

    /// Ignore any response still in flight.
    pub fn deactivate(&self) {
        self.inner.fetches.invalidate();
    }
}

/// Status line shown in place of the header, if any.
pub fn status_message(state: &DetailState) -> Option<&'static str> {
    if state.loading {
        Some("Loading family...")
    } else if state.data.family.is_none() {
        Some("Family not found.")
    } else {
        None
    }
}
