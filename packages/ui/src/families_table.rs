use backend::Family;
use dioxus::prelude::*;
use registry::views::{
    families_toolbar, family_columns, visible_actions, FamiliesState, FamilyList, Navigation,
    RowAction,
};
use registry::GridConfig;

use crate::mirror::mirror;
use crate::{use_auth, use_session, DataGrid, ErrorBanner};

/// Live list of every family, newest first.
///
/// Each change notification on `families` starts a refetch of its own, so a
/// change arriving mid-fetch overlaps the running one; the list settles on the
/// most recently issued fetch.
#[component]
pub fn FamiliesTable(on_navigate: EventHandler<Navigation>) -> Element {
    let session = use_session();
    let auth = use_auth();
    let list = use_hook(|| FamilyList::new(session.backend().clone()));
    let state = use_signal(FamiliesState::default);

    use_future({
        let list = list.clone();
        move || {
            let list = list.clone();
            async move {
                let follow = async {
                    list.activate().await;
                    while list.next_change().await.is_some() {
                        let list = list.clone();
                        spawn(async move { list.refetch().await });
                    }
                };
                futures::future::join(follow, mirror(list.watch(), state)).await;
            }
        }
    });

    use_drop({
        let list = list.clone();
        move || list.deactivate()
    });

    let current = state();
    let is_admin = auth().is_admin();
    let dismiss = {
        let list = list.clone();
        move |_: ()| list.dismiss_error()
    };

    rsx! {
        div {
            class: "page",

            div {
                class: "page-header",
                h1 { "Families" }
                for action in families_toolbar(is_admin) {
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

            DataGrid::<Family> {
                columns: family_columns(),
                rows: current.data.clone(),
                config: GridConfig::families(),
                loading: current.loading,
                actions: visible_actions(is_admin).to_vec(),
                on_action: move |(action, family): (RowAction, Family)| {
                    on_navigate.call(action.target(family.id))
                },
            }
        }
    }
}
