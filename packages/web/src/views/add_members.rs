use dioxus::prelude::*;

use crate::Route;

/// Entry point of the add-member flow. Record creation is not available yet;
/// the page only shows which family the flow was opened for.
#[component]
pub fn AddMembers(family_id: String) -> Element {
    let family_id = family_id.trim().parse::<i64>().ok();

    rsx! {
        div {
            class: "page",
            div {
                class: "page-header",
                h1 { "Add Member" }
                Link { to: Route::Families {}, "Back to Families" }
            }
            match family_id {
                Some(id) => rsx! {
                    p { "New member for family #{id}." }
                    Link { to: Route::FamilyDetail { id }, "View family" }
                },
                None => rsx! { p { "New family registration." } },
            }
        }
    }
}
