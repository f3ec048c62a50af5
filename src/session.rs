use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::chat::{ChatMessage, ChatSession, SessionWithMessages};

/// Client-side mirror of the server-owned chat sessions.
///
/// Rebuilt wholesale from each full `with-messages` fetch; between
/// fetches the only local mutation is appending newly sent/received
/// messages to the active session. No reconciliation beyond that, and
/// nothing is ever deleted locally.
#[derive(Default)]
pub struct SessionCache {
    sessions: DashMap<Uuid, SessionWithMessages>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cache from a full session-list fetch, dropping
    /// whatever was mirrored before.
    pub fn replace_all(&self, sessions: Vec<SessionWithMessages>) {
        self.sessions.clear();
        for entry in sessions {
            self.sessions.insert(entry.session.id, entry);
        }
    }

    /// Mirror a session the backend just created.
    pub fn upsert(&self, session: ChatSession) {
        match self.sessions.entry(session.id) {
            Entry::Occupied(mut entry) => entry.get_mut().session = session,
            Entry::Vacant(entry) => {
                entry.insert(SessionWithMessages {
                    session,
                    messages: Vec::new(),
                });
            }
        }
    }

    /// Optimistically append a message to the active session. Bumps the
    /// session's activity timestamp and message count so orderings stay
    /// consistent with what the server would return. Returns false when
    /// the session is not mirrored locally.
    pub fn append_message(&self, session_id: Uuid, message: ChatMessage) -> bool {
        match self.sessions.get_mut(&session_id) {
            Some(mut entry) => {
                entry.session.last_updated = message.created_at;
                entry.session.message_count += 1;
                entry.messages.push(message);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, session_id: &Uuid) -> Option<SessionWithMessages> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
    }

    pub fn messages(&self, session_id: &Uuid) -> Option<Vec<ChatMessage>> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().messages.clone())
    }

    /// All mirrored sessions, newest activity first.
    pub fn list(&self) -> Vec<ChatSession> {
        let mut sessions: Vec<ChatSession> = self
            .sessions
            .iter()
            .map(|entry| entry.value().session.clone())
            .collect();
        sessions.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::MessageRole;
    use chrono::{Duration, Utc};

    fn session(name: &str, minutes_ago: i64) -> SessionWithMessages {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        SessionWithMessages {
            session: ChatSession {
                id: Uuid::new_v4(),
                name: name.to_string(),
                message_count: 0,
                created_at: at,
                last_updated: at,
                document_id: None,
            },
            messages: Vec::new(),
        }
    }

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            chat_session_id: None,
            message_type: MessageRole::User,
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn replace_all_drops_previous_state() {
        let cache = SessionCache::new();
        cache.replace_all(vec![session("old", 60)]);
        let fresh = session("fresh", 0);
        let fresh_id = fresh.session.id;

        cache.replace_all(vec![fresh]);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&fresh_id).is_some());
    }

    #[test]
    fn append_bumps_activity_and_ordering() {
        let cache = SessionCache::new();
        let stale = session("stale", 30);
        let active = session("active", 60);
        let active_id = active.session.id;
        cache.replace_all(vec![stale, active]);

        // "active" is older; appending should move it to the front.
        assert!(cache.append_message(active_id, message("hello")));

        let listed = cache.list();
        assert_eq!(listed[0].id, active_id);
        assert_eq!(listed[0].message_count, 1);
        assert_eq!(cache.messages(&active_id).unwrap().len(), 1);
    }

    #[test]
    fn append_to_unknown_session_is_rejected() {
        let cache = SessionCache::new();
        assert!(!cache.append_message(Uuid::new_v4(), message("nope")));
    }

    #[test]
    fn upsert_keeps_existing_transcript() {
        let cache = SessionCache::new();
        let mut entry = session("doc chat", 10);
        let id = entry.session.id;
        entry.messages.push(message("kept"));
        cache.replace_all(vec![entry]);

        let mut renamed = cache.get(&id).unwrap().session;
        renamed.name = "renamed".to_string();
        cache.upsert(renamed);

        let stored = cache.get(&id).unwrap();
        assert_eq!(stored.session.name, "renamed");
        assert_eq!(stored.messages.len(), 1);
    }
}
