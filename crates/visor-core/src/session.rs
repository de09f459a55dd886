// Session Identity: the single locally-held "logged in" state.
//
// Created once by the authentication gate, cleared by logout. Its presence
// decides which phase the dashboard is in.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

/// Who is logged in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub name: String,
    pub score: f64,
}

/// Process-wide session state, shared by cloning.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Identity>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }

    /// Create the session unless one already exists. Returns whether this
    /// call created it.
    pub fn establish(&self, identity: Identity) -> bool {
        let name = identity.name.clone();
        let created = self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(identity);
            true
        });
        if created {
            info!(name = %name, "session established");
        }
        created
    }

    /// Log out. Returns the identity that was cleared.
    pub fn clear(&self) -> Option<Identity> {
        let mut previous = None;
        self.tx.send_if_modified(|slot| {
            previous = slot.take();
            previous.is_some()
        });
        if let Some(identity) = &previous {
            info!(name = %identity.name, "session cleared");
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shami() -> Identity {
        Identity {
            name: "Shami".into(),
            score: 0.61,
        }
    }

    #[test]
    fn establish_only_once() {
        let s = SessionStore::new();
        assert!(s.establish(shami()));
        assert!(!s.establish(Identity {
            name: "Other".into(),
            score: 0.9
        }));
        assert_eq!(s.current(), Some(shami()));
    }

    #[test]
    fn clear_allows_a_new_session() {
        let s = SessionStore::new();
        assert_eq!(s.clear(), None);
        s.establish(shami());
        assert_eq!(s.clear(), Some(shami()));
        assert!(!s.is_authenticated());
        assert!(s.establish(shami()));
    }
}
