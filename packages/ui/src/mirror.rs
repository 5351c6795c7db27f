use dioxus::prelude::*;
use tokio::sync::watch;

/// Copy every value published on `rx` into `target` until the sender is gone.
pub(crate) async fn mirror<T: Clone + 'static>(mut rx: watch::Receiver<T>, mut target: Signal<T>) {
    loop {
        let value = rx.borrow_and_update().clone();
        target.set(value);
        if rx.changed().await.is_err() {
            break;
        }
    }
}
