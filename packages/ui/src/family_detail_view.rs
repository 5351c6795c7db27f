use backend::Member;
use dioxus::prelude::*;
use registry::views::{
    family_chips, family_detail_toolbar, member_columns, status_message, DetailState,
    FamilyDetail, Navigation,
};
use registry::GridConfig;

use crate::mirror::mirror;
use crate::{use_auth, use_session, DataGrid, ErrorBanner};

/// One family with its members, oldest first.
#[component]
pub fn FamilyDetailView(family_id: i64, on_navigate: EventHandler<Navigation>) -> Element {
    let session = use_session();
    let auth = use_auth();
    let detail = use_hook(|| FamilyDetail::new(session.backend().clone()));
    let state = use_signal(DetailState::default);

    use_future({
        let detail = detail.clone();
        move || {
            let detail = detail.clone();
            async move { mirror(detail.watch(), state).await }
        }
    });

    // Reload whenever the route points at another family.
    use_effect(use_reactive((&family_id,), {
        let detail = detail.clone();
        move |(family_id,)| {
            let detail = detail.clone();
            spawn(async move { detail.load(family_id).await });
        }
    }));

    use_drop({
        let detail = detail.clone();
        move || detail.deactivate()
    });

    let current = state();
    let is_admin = auth().is_admin();
    let family = current.data.family.clone();
    let toolbar = family_detail_toolbar(family.as_ref(), is_admin);
    let dismiss = {
        let detail = detail.clone();
        move |_: ()| detail.dismiss_error()
    };

    rsx! {
        div {
            class: "page",

            div {
                class: "page-header",
                h1 {
                    match &family {
                        Some(family) => rsx! { "{family.family_name}" },
                        None => rsx! { "Family" },
                    }
                }
                for action in toolbar {
                    button {
                        class: "primary-btn",
                        onclick: move |_| on_navigate.call(action.target()),
                        {action.label()}
                    }
                }
            }

            if let Some(message) = current.error.clone() {
                ErrorBanner { message, on_dismiss: dismiss }
            }

            if let Some(status) = status_message(&current) {
                p { class: "status", "{status}" }
            }

            if let Some(family) = family.clone() {
                div {
                    class: "chips",
                    for chip in family_chips(&family) {
                        span { class: "chip", "{chip}" }
                    }
                }

                h2 { "Members" }
                DataGrid::<Member> {
                    columns: member_columns(),
                    rows: current.data.members.clone(),
                    config: GridConfig::members(),
                }
            }
        }

        style {
            r#"
            .chips {{
                display: flex;
                flex-wrap: wrap;
                gap: 0.5rem;
                margin-bottom: 1rem;
            }}
            .chip {{
                padding: 0.25rem 0.75rem;
                border: 1px solid #c0c0c0;
                border-radius: 16px;
                font-size: 0.8125rem;
            }}
            .status {{
                color: #787774;
            }}
            "#
        }
    }
}
