//! Session-scoped key-value persistence for the capture machine.
//!
//! Three entries per session — image, step, submitting — mirrored on every
//! transition and read back on reload. The store is an abstraction over
//! whatever short-lived storage the host has (web session storage, an app
//! preferences file); [`InMemoryStore`] backs tests.

use crate::machine::{CaptureMachine, PersistedState, Step};

/// Minimal key-value store scoped to the capture flow.
pub trait CaptureStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    /// Wipes everything (session supersession, "scan next").
    fn clear(&mut self);
}

fn image_key(session_id: &str) -> String {
    format!("capture_img_{session_id}")
}

fn step_key(session_id: &str) -> String {
    format!("capture_step_{session_id}")
}

fn submitting_key(session_id: &str) -> String {
    format!("capture_submitting_{session_id}")
}

/// Mirrors the machine's state into the store.
pub fn save_state<S: CaptureStore>(store: &mut S, session_id: &str, state: &PersistedState) {
    match &state.image {
        Some(image) => store.set(&image_key(session_id), image),
        None => store.remove(&image_key(session_id)),
    }
    let step = serde_json::to_string(&state.step).unwrap_or_else(|_| "\"capture\"".to_string());
    store.set(&step_key(session_id), step.trim_matches('"'));
    store.set(&submitting_key(session_id), &state.submitting.to_string());
}

/// Reads persisted state back. Unknown or missing steps restore as
/// `Capture`; the submitting flag is read but never trusted on restore (the
/// in-flight request did not survive the reload).
#[must_use]
pub fn load_state<S: CaptureStore>(store: &S, session_id: &str) -> PersistedState {
    let image = store.get(&image_key(session_id));
    let step = store
        .get(&step_key(session_id))
        .and_then(|raw| serde_json::from_str::<Step>(&format!("\"{raw}\"")).ok())
        .unwrap_or(Step::Capture);
    let submitting = store
        .get(&submitting_key(session_id))
        .is_some_and(|raw| raw == "true");

    PersistedState {
        image,
        step,
        submitting,
    }
}

/// Restores a machine for `session_id`, applying the mid-analyzing guard.
#[must_use]
pub fn restore_machine<S: CaptureStore>(
    store: &S,
    session_id: &str,
    batch_mode: bool,
) -> CaptureMachine {
    CaptureMachine::restore(load_state(store, session_id), batch_mode)
}

/// In-memory store for tests and headless hosts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: std::collections::HashMap<String, String>,
}

impl CaptureStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load_roundtrip() {
        let mut store = InMemoryStore::default();
        let state = PersistedState {
            image: Some("data:image/jpeg;base64,QUJD".to_string()),
            step: Step::Success,
            submitting: false,
        };
        save_state(&mut store, "session-1", &state);

        let loaded = load_state(&store, "session-1");
        assert_eq!(loaded, state);
    }

    #[test]
    fn missing_entries_default_to_capture() {
        let store = InMemoryStore::default();
        let loaded = load_state(&store, "nope");
        assert_eq!(loaded.step, Step::Capture);
        assert!(loaded.image.is_none());
        assert!(!loaded.submitting);
    }

    #[test]
    fn restore_does_not_trust_analyzing() {
        let mut store = InMemoryStore::default();
        save_state(
            &mut store,
            "session-1",
            &PersistedState {
                image: Some("data:image/jpeg;base64,QUJD".to_string()),
                step: Step::Analyzing,
                submitting: true,
            },
        );

        let machine = restore_machine(&store, "session-1", false);
        assert_eq!(machine.step(), Step::Capture);
        assert!(!machine.is_submitting());
        assert_eq!(
            machine.image_preview(),
            Some("data:image/jpeg;base64,QUJD")
        );
    }

    #[test]
    fn entries_are_scoped_by_session_id() {
        let mut store = InMemoryStore::default();
        save_state(
            &mut store,
            "session-a",
            &PersistedState {
                image: None,
                step: Step::Voice,
                submitting: false,
            },
        );

        assert_eq!(load_state(&store, "session-a").step, Step::Voice);
        assert_eq!(load_state(&store, "session-b").step, Step::Capture);
    }

    #[test]
    fn saving_without_image_removes_stale_entry() {
        let mut store = InMemoryStore::default();
        save_state(
            &mut store,
            "s",
            &PersistedState {
                image: Some("data:image/jpeg;base64,QUJD".to_string()),
                step: Step::Capture,
                submitting: false,
            },
        );
        save_state(
            &mut store,
            "s",
            &PersistedState {
                image: None,
                step: Step::Capture,
                submitting: false,
            },
        );
        assert!(load_state(&store, "s").image.is_none());
    }
}
