use dioxus::prelude::*;
use registry::Navigation;
use ui::{use_auth, Navbar};

use crate::Route;

/// Navbar above every signed-in or anonymous page.
#[component]
pub fn AppLayout() -> Element {
    let auth = use_auth();
    let signed_in = auth().is_signed_in();

    rsx! {
        Navbar {
            Link { to: Route::from(Navigation::Families), class: "nav-link", "Families" }
            if !signed_in {
                Link { to: Route::from(Navigation::Login), class: "nav-link", "Sign in" }
            }
        }
        Outlet::<Route> {}
    }
}
