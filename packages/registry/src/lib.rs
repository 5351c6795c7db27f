//! # Registry: session state and record views for Parishbook
//!
//! Everything here is plain async Rust over a [`backend::Backend`]; the `ui` crate
//! renders it and the tests drive it against [`backend::MemoryBackend`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`auth`] | [`SessionContext`]: session tracking, profile resolution, admin decision |
//! | [`views`] | [`FamilyList`] and [`FamilyDetail`], columns, row and page actions |
//! | [`grid`] | Quick filter, click-to-sort and pagination for the tables |

pub mod auth;
pub mod grid;
pub mod views;

pub use auth::{AuthState, Role, SessionContext};
pub use grid::{GridConfig, GridPage, GridState, SortDirection, SortModel};
pub use views::{FamilyDetail, FamilyList, Navigation};
