use dioxus::prelude::*;
use registry::Navigation;
use ui::FamilyDetailView;

use crate::Route;

#[component]
pub fn FamilyDetail(id: i64) -> Element {
    let nav = use_navigator();

    rsx! {
        FamilyDetailView {
            family_id: id,
            on_navigate: move |target: Navigation| {
                nav.push(Route::from(target));
            },
        }
    }
}
