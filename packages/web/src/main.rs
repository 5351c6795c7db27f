use dioxus::prelude::*;

use registry::Navigation;
use ui::AuthProvider;
use views::{AddMembers, AppLayout, Families, FamilyDetail, Login};

mod views;

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum Route {
    #[layout(AppLayout)]
        #[route("/")]
        Root {},
        #[route("/families")]
        Families {},
        #[route("/families/:id")]
        FamilyDetail { id: i64 },
        #[route("/addmembers?:family_id")]
        AddMembers { family_id: String },
    #[end_layout]
    #[route("/login")]
    Login {},
}

impl From<Navigation> for Route {
    fn from(target: Navigation) -> Self {
        tracing::debug!(?target, "navigating");
        match target {
            Navigation::Families => Route::Families {},
            Navigation::FamilyDetail(id) => Route::FamilyDetail { id },
            Navigation::AddMember(family_id) => Route::AddMembers {
                family_id: family_id.map(|id| id.to_string()).unwrap_or_default(),
            },
            Navigation::Login => Route::Login {},
        }
    }
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        use tracing_subscriber::EnvFilter;

        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }

    tracing::info!("launching parishbook");
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        AuthProvider {
            Router::<Route> {}
        }

        style {
            r#"
            body {{
                margin: 0;
                color: #37352f;
                font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
            }}
            .page {{
                padding: 1.5rem;
            }}
            .page-header {{
                display: flex;
                align-items: center;
                gap: 1rem;
                margin-bottom: 1rem;
            }}
            .page-header h1 {{
                flex: 1;
                margin: 0;
                font-size: 1.5rem;
            }}
            .primary-btn {{
                padding: 0.5rem 1rem;
                border: none;
                border-radius: 4px;
                background: #1976d2;
                color: #ffffff;
                cursor: pointer;
            }}
            .primary-btn:disabled {{
                opacity: 0.5;
                cursor: not-allowed;
            }}
            "#
        }
    }
}

/// Redirect `/` to `/families`
#[component]
fn Root() -> Element {
    let nav = use_navigator();
    nav.replace(Route::Families {});
    rsx! {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_targets_map_to_paths() {
        assert_eq!(Route::from(Navigation::Login).to_string(), "/login");
        assert_eq!(Route::from(Navigation::Families).to_string(), "/families");
        assert_eq!(Route::from(Navigation::FamilyDetail(7)).to_string(), "/families/7");
    }
}
