//! Authentication context and hooks for the UI.

use backend::{Credentials, SignUpDetails};
use dioxus::prelude::*;
use registry::{AuthState, SessionContext};

use crate::client::{make_client, Client};
use crate::mirror::mirror;
use crate::ErrorBanner;

pub type Session = SessionContext<Client>;

/// Current authentication state. Updates on sign-in, sign-out and profile changes.
pub fn use_auth() -> Signal<AuthState> {
    use_context::<Signal<AuthState>>()
}

/// The application's session context, for signing in and out and for reaching the
/// backend client.
pub fn use_session() -> Session {
    use_context::<Session>()
}

/// Owns the single [`SessionContext`] of the application.
/// Wrap your app with this component to enable authentication.
#[component]
pub fn AuthProvider(children: Element) -> Element {
    let session = use_hook(|| SessionContext::new(make_client()));
    let auth_state = use_signal(AuthState::default);

    use_context_provider(|| session.clone());
    use_context_provider(|| auth_state);

    // Resolve the startup session, then follow session changes.
    use_future({
        let session = session.clone();
        move || {
            let session = session.clone();
            async move {
                futures::future::join(session.run(), mirror(session.watch(), auth_state)).await;
            }
        }
    });

    use_drop({
        let session = session.clone();
        move || session.shutdown()
    });

    rsx! {
        {children}
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mode {
    SignIn,
    SignUp,
}

/// Email/password sign-in, switchable to sign-up.
#[component]
pub fn LoginForm(on_signed_in: Option<EventHandler<()>>) -> Element {
    let session = use_session();
    let mut mode = use_signal(|| Mode::SignIn);
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut full_name = use_signal(String::new);
    let mut error = use_signal(|| Option::<String>::None);
    let mut busy = use_signal(|| false);

    let onsubmit = move |evt: FormEvent| {
        evt.prevent_default();
        let session = session.clone();
        async move {
            busy.set(true);
            error.set(None);
            let result = match mode() {
                Mode::SignIn => session.sign_in(&Credentials::new(email(), password())).await,
                Mode::SignUp => {
                    let name = full_name().trim().to_string();
                    let details = SignUpDetails {
                        email: email(),
                        password: password(),
                        full_name: (!name.is_empty()).then_some(name),
                    };
                    session.sign_up(&details).await
                }
            };
            busy.set(false);
            match result {
                Ok(()) => {
                    password.set(String::new());
                    if let Some(handler) = on_signed_in {
                        handler.call(());
                    }
                }
                Err(e) => error.set(Some(e.to_string())),
            }
        }
    };

    let (title, submit, switch) = match mode() {
        Mode::SignIn => ("Sign in", "Sign in", "Need an account? Sign up"),
        Mode::SignUp => ("Create account", "Sign up", "Have an account? Sign in"),
    };

    rsx! {
        form {
            class: "login-form",
            onsubmit: onsubmit,

            h2 { "{title}" }

            if let Some(message) = error() {
                ErrorBanner {
                    message,
                    on_dismiss: move |_| error.set(None),
                }
            }

            if mode() == Mode::SignUp {
                input {
                    r#type: "text",
                    placeholder: "Full name",
                    value: "{full_name}",
                    oninput: move |e| full_name.set(e.value()),
                }
            }
            input {
                r#type: "email",
                placeholder: "Email",
                value: "{email}",
                oninput: move |e| email.set(e.value()),
            }
            input {
                r#type: "password",
                placeholder: "Password",
                value: "{password}",
                oninput: move |e| password.set(e.value()),
            }

            button {
                r#type: "submit",
                class: "primary-btn",
                disabled: busy(),
                if busy() { "Please wait..." } else { "{submit}" }
            }
            button {
                r#type: "button",
                class: "link-btn",
                onclick: move |_| {
                    error.set(None);
                    mode.set(if mode() == Mode::SignIn { Mode::SignUp } else { Mode::SignIn });
                },
                "{switch}"
            }
        }

        style {
            r#"
            .login-form {{
                display: flex;
                flex-direction: column;
                gap: 0.75rem;
                width: 100%;
                max-width: 340px;
            }}
            .login-form input {{
                padding: 0.5rem 0.75rem;
                border: 1px solid #d0d0d0;
                border-radius: 4px;
                font-size: 0.9375rem;
            }}
            .link-btn {{
                background: none;
                border: none;
                color: #1976d2;
                cursor: pointer;
            }}
            "#
        }
    }
}

/// Signs out; the session change flows back through [`AuthProvider`].
/// A failed remote sign-out is shown beside the button.
#[component]
pub fn SignOutButton(
    #[props(default = "Sign out".to_string())] label: String,
    #[props(default = "".to_string())] class: String,
) -> Element {
    let session = use_session();
    let mut error = use_signal(|| Option::<String>::None);

    let onclick = move |_| {
        let session = session.clone();
        async move {
            error.set(None);
            if let Err(e) = session.sign_out().await {
                error.set(Some(e.to_string()));
            }
        }
    };

    rsx! {
        if let Some(message) = error() {
            ErrorBanner {
                message,
                on_dismiss: move |_| error.set(None),
            }
        }
        button {
            class: "{class}",
            onclick: onclick,
            "{label}"
        }
    }
}
