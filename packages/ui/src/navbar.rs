use dioxus::prelude::*;

use crate::icons::FaChurch;
use crate::{use_auth, Icon, SignOutButton};

/// Top bar with the signed-in user and a sign-out button. `children` fill the
/// left side, typically navigation links.
#[component]
pub fn Navbar(children: Element) -> Element {
    let auth = use_auth();
    let state = auth();
    let role = state.role();
    let who = state.profile().map(|p| p.display_name().to_string()).or_else(|| {
        state
            .identity()
            .map(|i| i.email.clone().unwrap_or_else(|| i.id.clone()))
    });

    rsx! {
        div {
            class: "navbar",
            Icon { icon: FaChurch, width: 18, height: 18 }
            {children}
            div { class: "navbar-spacer" }
            if let Some(who) = who {
                span { class: "navbar-user", "{who} ({role})" }
                SignOutButton { class: "link-btn" }
            }
        }

        style {
            r#"
            .navbar {{
                display: flex;
                align-items: center;
                gap: 1rem;
                padding: 0.75rem 1.5rem;
                border-bottom: 1px solid #e0e0e0;
            }}
            .navbar-spacer {{
                flex: 1;
            }}
            .navbar-user {{
                color: #787774;
                font-size: 0.875rem;
            }}
            "#
        }
    }
}
