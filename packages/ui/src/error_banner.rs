use dioxus::prelude::*;

use crate::icons::{FaCircleExclamation, FaXmark};
use crate::Icon;

/// Inline error message with an optional dismiss button.
#[component]
pub fn ErrorBanner(message: String, on_dismiss: Option<EventHandler<()>>) -> Element {
    rsx! {
        div {
            class: "error-banner",
            role: "alert",
            Icon { icon: FaCircleExclamation, width: 14, height: 14 }
            span { class: "error-message", "{message}" }
            if let Some(handler) = on_dismiss {
                button {
                    class: "error-dismiss",
                    title: "Dismiss",
                    onclick: move |_| handler.call(()),
                    Icon { icon: FaXmark, width: 12, height: 12 }
                }
            }
        }

        style {
            r#"
            .error-banner {{
                display: flex;
                align-items: center;
                gap: 0.5rem;
                padding: 0.5rem 0.75rem;
                margin-bottom: 1rem;
                background: #fdecea;
                color: #611a15;
                border-radius: 4px;
            }}
            .error-message {{
                flex: 1;
            }}
            .error-dismiss {{
                background: none;
                border: none;
                cursor: pointer;
                color: inherit;
            }}
            "#
        }
    }
}
