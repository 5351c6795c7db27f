//! Session tracking and the authorization decision derived from it.

mod session;
mod state;

pub use session::SessionContext;
pub use state::{AuthState, Role};
