//! Observer contract for connection events.
//!
//! The observer given to [`ConnectionManager::start`](crate::ConnectionManager::start)
//! is bound once and receives events from every connection the supervisor
//! opens, including all reconnects.

use std::sync::Arc;

use exmon_core::{MergeOutcome, StateStore};

/// Receiver of connectivity changes and raw inbound payloads.
///
/// Both methods run on the supervisor task, in transport order.
pub trait ConnectionObserver: Send + Sync + 'static {
    /// `true` when a connection opens, `false` when it terminates.
    fn on_connectivity_change(&self, is_open: bool);

    /// One inbound text frame, unmodified.
    fn on_message(&self, raw_payload: &str);
}

impl<T: ConnectionObserver + ?Sized> ConnectionObserver for Arc<T> {
    fn on_connectivity_change(&self, is_open: bool) {
        (**self).on_connectivity_change(is_open);
    }

    fn on_message(&self, raw_payload: &str) {
        (**self).on_message(raw_payload);
    }
}

/// Adapts a pair of closures into a [`ConnectionObserver`].
pub struct Callbacks<C, M> {
    on_connectivity_change: C,
    on_message: M,
}

impl<C, M> Callbacks<C, M>
where
    C: Fn(bool) + Send + Sync + 'static,
    M: Fn(&str) + Send + Sync + 'static,
{
    pub fn new(on_connectivity_change: C, on_message: M) -> Self {
        Self {
            on_connectivity_change,
            on_message,
        }
    }
}

impl<C, M> ConnectionObserver for Callbacks<C, M>
where
    C: Fn(bool) + Send + Sync + 'static,
    M: Fn(&str) + Send + Sync + 'static,
{
    fn on_connectivity_change(&self, is_open: bool) {
        (self.on_connectivity_change)(is_open);
    }

    fn on_message(&self, raw_payload: &str) {
        (self.on_message)(raw_payload);
    }
}

/// The store is the usual observer: connectivity goes to the flag, payloads
/// are merged. Malformed payloads are logged and dropped.
impl ConnectionObserver for StateStore {
    fn on_connectivity_change(&self, is_open: bool) {
        StateStore::on_connectivity_change(self, is_open);
    }

    fn on_message(&self, raw_payload: &str) {
        match StateStore::on_message(self, raw_payload) {
            Ok(MergeOutcome::Changed) => {
                tracing::trace!(len = raw_payload.len(), "store: update merged");
            }
            Ok(MergeOutcome::Unchanged) => {
                tracing::trace!(len = raw_payload.len(), "store: update was a no-op");
            }
            Err(e) => {
                tracing::warn!(len = raw_payload.len(), "store: dropping malformed update: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn callbacks_forward_both_events() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let (a, b) = (Arc::clone(&seen), Arc::clone(&seen));
        let observer = Callbacks::new(
            move |open| a.lock().unwrap().push(format!("open={open}")),
            move |raw: &str| b.lock().unwrap().push(raw.to_string()),
        );

        observer.on_connectivity_change(true);
        observer.on_message("{}");
        observer.on_connectivity_change(false);

        assert_eq!(*seen.lock().unwrap(), vec!["open=true", "{}", "open=false"]);
    }

    #[test]
    fn store_observer_merges_and_drops_malformed() {
        let store = Arc::new(StateStore::new());
        let observer: Arc<dyn ConnectionObserver> = store.clone();

        observer.on_connectivity_change(true);
        observer.on_message(r#"{"a":{"x":1}}"#);
        observer.on_message("not json");
        observer.on_message(r#"{"a":{"y":2}}"#);

        assert!(store.connected());
        assert_eq!(
            serde_json::Value::Object(store.tree()),
            serde_json::json!({"a": {"x": 1, "y": 2}})
        );
    }
}
