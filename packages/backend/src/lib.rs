//! Client-side access to the hosted records backend: auth, reads and change feeds.

pub mod config;
pub mod error;
pub mod facade;
pub mod listeners;
pub mod models;
pub mod query;

mod memory;
pub use memory::MemoryBackend;

#[cfg(feature = "rest")]
mod realtime;
#[cfg(feature = "rest")]
mod rest;
#[cfg(feature = "rest")]
pub use rest::RestBackend;

pub use config::BackendConfig;
pub use error::{AuthError, ConfigError, FetchError};
pub use facade::Backend;
pub use listeners::{AuthSubscription, ChangeHandler, ChannelHandle, SessionHandler};
pub use models::{
    Change, ChangeKind, Credentials, Family, Identity, Member, Profile, Row, Session,
    SignUpDetails, Table,
};
pub use query::{Direction, Query, QueryBuilder};
