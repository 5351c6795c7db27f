//! Screens backed by direct backend reads: the live families list and the
//! family detail pair, plus their columns and actions.

mod actions;
mod columns;
mod families;
mod family_detail;
mod fetch;

pub use actions::{
    families_toolbar, family_detail_toolbar, visible_actions, Navigation, PageAction, RowAction,
};
pub use columns::{family_chips, family_columns, member_columns, CellValue, Column};
pub use families::{FamiliesState, FamilyList};
pub use family_detail::{status_message, DetailState, FamilyDetail, FamilyRecord};
pub use fetch::{FetchGuard, Ticket, ViewState};
