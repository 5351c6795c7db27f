use dioxus::prelude::*;
use registry::Navigation;
use ui::FamiliesTable;

use crate::Route;

#[component]
pub fn Families() -> Element {
    let nav = use_navigator();

    rsx! {
        FamiliesTable {
            on_navigate: move |target: Navigation| {
                nav.push(Route::from(target));
            },
        }
    }
}
