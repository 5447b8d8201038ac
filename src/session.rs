//! Session-state store (§3): a mapping from local SEID to {peer SEID,
//! opaque session payload}, mutex-guarded for concurrent access by the
//! association's dispatch thread.

use crate::ie::Ie;
use std::collections::HashMap;
use std::sync::Mutex;

/// What is kept for one PFCP session the association has established:
/// the peer's own SEID (used as the header SEID of any message sent back
/// to it) and the stored IE tree (the establishment request's IEs, updated
/// in place by subsequent modifications).
pub struct SessionEntry {
    pub peer_seid: u64,
    pub ies: Vec<Ie>,
}

/// Maps local SEID to [`SessionEntry`]. Local SEIDs are either copied from
/// the peer (compatibility mode) or randomly generated by the caller.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<u64, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        SessionStore { sessions: Mutex::new(HashMap::new()) }
    }

    pub fn insert(&self, local_seid: u64, peer_seid: u64, ies: Vec<Ie>) {
        self.sessions.lock().unwrap().insert(local_seid, SessionEntry { peer_seid, ies });
    }

    pub fn get_ies(&self, local_seid: u64) -> Option<Vec<Ie>> {
        self.sessions.lock().unwrap().get(&local_seid).map(|e| e.ies.clone())
    }

    pub fn peer_seid(&self, local_seid: u64) -> Option<u64> {
        self.sessions.lock().unwrap().get(&local_seid).map(|e| e.peer_seid)
    }

    /// Overwrites the stored IE tree without touching the entry's peer SEID
    /// (§4.7.A: a successful modification keeps the session reference intact).
    pub fn replace_ies(&self, local_seid: u64, ies: Vec<Ie>) {
        if let Some(entry) = self.sessions.lock().unwrap().get_mut(&local_seid) {
            entry.ies = ies;
        }
    }

    pub fn remove(&self, local_seid: u64) -> Option<SessionEntry> {
        self.sessions.lock().unwrap().remove(&local_seid)
    }

    pub fn contains(&self, local_seid: u64) -> bool {
        self.sessions.lock().unwrap().contains_key(&local_seid)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ie::IeType;

    #[test]
    fn insert_get_and_remove_round_trip() {
        let store = SessionStore::new();
        assert!(store.is_empty());
        store.insert(1, 2, vec![Ie::new(IeType::Cause, vec![1])]);
        assert_eq!(store.peer_seid(1), Some(2));
        assert_eq!(store.get_ies(1).unwrap().len(), 1);

        let removed = store.remove(1).unwrap();
        assert_eq!(removed.peer_seid, 2);
        assert!(store.get_ies(1).is_none());
    }

    #[test]
    fn replace_ies_keeps_peer_seid() {
        let store = SessionStore::new();
        store.insert(1, 2, vec![Ie::new(IeType::Cause, vec![1])]);
        store.replace_ies(1, vec![Ie::new(IeType::Cause, vec![2])]);
        assert_eq!(store.peer_seid(1), Some(2));
        assert_eq!(store.get_ies(1).unwrap()[0].leaf_bytes(), Some(&[2u8][..]));
    }

    #[test]
    fn contains_reflects_current_membership() {
        let store = SessionStore::new();
        assert!(!store.contains(5));
        store.insert(5, 5, vec![]);
        assert!(store.contains(5));
        store.remove(5);
        assert!(!store.contains(5));
    }
}
