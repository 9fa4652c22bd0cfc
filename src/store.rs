use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Title given to a session before its first user message arrives.
pub const DEFAULT_SESSION_TITLE: &str = "New Eye Consultation";

/// Maximum number of characters kept when deriving a title from the first message.
const TITLE_MAX_CHARS: usize = 30;

/// Role of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single message within a session
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a complete user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an empty assistant message to be filled as fragments arrive
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
        }
    }
}

/// One consultation thread with its own message history and title
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub last_updated: DateTime<Utc>,
}

/// In-memory store for consultation sessions.
///
/// Single source of truth for everything rendered by the UI. All session and
/// message mutation goes through the four operations below; unknown ids are
/// silent no-ops since they only ever indicate a stale UI reference.
pub struct SessionStore {
    sessions: Vec<Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Vec::new(),
        }
    }

    /// Allocate a new session with a fresh id and default title.
    ///
    /// Does not make the session current; the caller decides that.
    pub fn create_session(&mut self) -> &Session {
        let session = Session {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            last_updated: Utc::now(),
        };
        self.sessions.push(session);
        self.sessions.last().expect("session just pushed")
    }

    /// Sessions in reverse creation order (most recent first)
    pub fn list_sessions(&self) -> Vec<&Session> {
        self.sessions.iter().rev().collect()
    }

    /// Look up a session by id
    pub fn session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Append a message to a session.
    ///
    /// The session title is derived exactly once, from the first message when
    /// it is a user message; it is never re-derived afterward.
    pub fn append_message(&mut self, session_id: &str, message: Message) {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };

        if session.messages.is_empty() && message.role == Role::User {
            session.title = derive_title(&message.content);
        }

        session.messages.push(message);
        session.last_updated = Utc::now();
    }

    /// Replace the content of a message in place.
    ///
    /// Position and timestamp are untouched, so streamed replies keep their
    /// place in the conversation as they grow.
    pub fn update_message_content(&mut self, session_id: &str, message_id: &str, new_content: String) {
        let Some(session) = self.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };
        let Some(message) = session.messages.iter_mut().find(|m| m.id == message_id) else {
            return;
        };
        message.content = new_content;
    }
}

/// Truncated prefix of the first user message, used as the session title
fn derive_title(content: &str) -> String {
    let title: String = content.chars().take(TITLE_MAX_CHARS).collect();
    if content.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", title)
    } else {
        title
    }
}
