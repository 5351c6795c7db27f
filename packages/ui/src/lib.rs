//! This crate contains all shared UI for the workspace.

// Re-export icon library
pub use dioxus_free_icons::Icon;
pub mod icons {
    pub use dioxus_free_icons::icons::fa_solid_icons::*;
}

mod client;
pub use client::{make_client, Client};

mod mirror;

mod auth;
pub use auth::{use_auth, use_session, AuthProvider, LoginForm, Session, SignOutButton};

mod error_banner;
pub use error_banner::ErrorBanner;

mod data_grid;
pub use data_grid::DataGrid;

mod families_table;
pub use families_table::FamiliesTable;

mod family_detail_view;
pub use family_detail_view::FamilyDetailView;

mod navbar;
pub use navbar::Navbar;
