//! # Backend facade
//!
//! [`Backend`] is the single seam between the application and the hosted backend.
//! It groups three concerns:
//!
//! | Concern | Methods |
//! |---------|---------|
//! | Auth | [`current_session`](Backend::current_session), [`on_session_change`](Backend::on_session_change), [`sign_in`](Backend::sign_in), [`sign_up`](Backend::sign_up), [`sign_out`](Backend::sign_out) |
//! | Change feed | [`subscribe_to_changes`](Backend::subscribe_to_changes), [`close_channel`](Backend::close_channel) |
//! | Reads | [`select`](Backend::select), and the typed [`from`](Backend::from) builder on top of it |
//!
//! Implementations live in sibling modules ([`crate::memory`], and `crate::rest`
//! behind the `rest` feature).

use std::future::Future;

use crate::error::{AuthError, FetchError};
use crate::listeners::{AuthSubscription, ChangeHandler, ChannelHandle, SessionHandler};
use crate::models::{Credentials, Row, Session, SignUpDetails, Table};
use crate::query::{Query, QueryBuilder};

/// Async interface to the hosted backend.
pub trait Backend {
    /// The session currently tracked by the backend. Absence is not an error.
    fn current_session(&self) -> impl Future<Output = Option<Session>>;

    /// Register a handler for every future login, logout and token refresh.
    /// The handler stays registered until the returned subscription is released.
    fn on_session_change(&self, handler: SessionHandler) -> AuthSubscription;

    fn sign_in(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Session, AuthError>>;

    /// Create an account. Returns the new session when the backend signs the
    /// user in immediately.
    fn sign_up(
        &self,
        details: &SignUpDetails,
    ) -> impl Future<Output = Result<Option<Session>, AuthError>>;

    fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>>;

    /// Execute a read and return raw rows.
    fn select(&self, query: &Query) -> impl Future<Output = Result<Vec<Row>, FetchError>>;

    /// Open a change feed for `table`. The handler is invoked with no payload
    /// guarantee beyond "something changed".
    fn subscribe_to_changes(&self, table: Table, on_change: ChangeHandler) -> ChannelHandle;

    fn close_channel(&self, handle: ChannelHandle);

    /// Start building a typed read against `table`.
    fn from(&self, table: Table) -> QueryBuilder<'_, Self>
    where
        Self: Sized,
    {
        QueryBuilder::new(self, table)
    }
}
