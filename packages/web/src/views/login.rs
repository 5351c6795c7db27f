//! Login page view with the email/password form.

use dioxus::prelude::*;
use ui::{use_auth, LoginForm};

use crate::Route;

#[component]
pub fn Login() -> Element {
    let auth = use_auth();
    let nav = use_navigator();

    // If already signed in, go to the families list
    use_effect(move || {
        if auth().is_signed_in() {
            nav.replace(Route::Families {});
        }
    });

    rsx! {
        div {
            class: "login-container",
            style: "display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; padding: 2rem;",

            h1 {
                style: "margin-bottom: 0.5rem; font-weight: 700; font-size: 1.75rem;",
                "Parishbook"
            }

            p {
                style: "margin-bottom: 2rem; color: #787774; font-size: 0.9375rem;",
                "Family and member records"
            }

            if auth().auth_loading() {
                p { "Loading..." }
            } else {
                LoginForm {}
            }
        }
    }
}
