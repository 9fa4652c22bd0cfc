use crate::relay::{RelayEvent, ReplySource};
use crate::store::{Message, Session, SessionStore};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Fixed user-facing text written over the placeholder when a reply fails
pub const REPLY_FAILURE_MESSAGE: &str =
    "I'm sorry, I encountered an error. Please check your connection and try again.";

/// Phase of one outstanding send operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendPhase {
    Streaming,
    Completed,
    Failed,
}

/// One in-flight reply being folded into the store
struct PendingSend {
    message_id: String,
    accumulated: String,
    rx: mpsc::UnboundedReceiver<RelayEvent>,
    phase: SendPhase,
}

/// Orchestrates user actions into store mutations and relay invocations.
///
/// Sends are strictly sequential per session; a second send against a session
/// with an outstanding reply is rejected. Sends for different sessions are
/// independent, keyed by session id, so switching sessions mid-stream leaves
/// the abandoned stream folding harmlessly into the store.
pub struct Controller<R: ReplySource> {
    store: SessionStore,
    relay: R,
    current_session_id: String,
    pending: HashMap<String, PendingSend>,
}

impl<R: ReplySource> Controller<R> {
    /// Create the controller with one auto-created session selected
    pub fn new(relay: R) -> Self {
        let mut store = SessionStore::new();
        let current_session_id = store.create_session().id.clone();

        Self {
            store,
            relay,
            current_session_id,
            pending: HashMap::new(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn current_session_id(&self) -> &str {
        &self.current_session_id
    }

    pub fn current_session(&self) -> Option<&Session> {
        self.store.session(&self.current_session_id)
    }

    /// Whether a reply is still streaming into the given session
    pub fn is_streaming(&self, session_id: &str) -> bool {
        self.pending.contains_key(session_id)
    }

    /// Create a new session and make it current
    pub fn new_session(&mut self) {
        self.current_session_id = self.store.create_session().id.clone();
    }

    /// Switch the current session; unknown ids are ignored
    pub fn select_session(&mut self, session_id: &str) {
        if self.store.session(session_id).is_some() {
            self.current_session_id = session_id.to_string();
        }
    }

    /// Send a user message in the current session and start streaming the reply.
    ///
    /// Returns false without touching the store when the input is blank or a
    /// reply is already streaming into this session.
    pub fn send_message(&mut self, input: &str) -> bool {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return false;
        }

        let session_id = self.current_session_id.clone();
        if self.pending.contains_key(&session_id) {
            tracing::debug!(%session_id, "send rejected, reply still streaming");
            return false;
        }

        // Snapshot prior turns before this exchange is appended
        let prior_turns: Vec<Message> = self
            .store
            .session(&session_id)
            .map(|s| s.messages.clone())
            .unwrap_or_default();

        self.store.append_message(&session_id, Message::user(trimmed));

        let placeholder = Message::assistant_placeholder();
        let message_id = placeholder.id.clone();
        self.store.append_message(&session_id, placeholder);

        let rx = self.relay.stream_reply(trimmed, &prior_turns);
        self.pending.insert(
            session_id,
            PendingSend {
                message_id,
                accumulated: String::new(),
                rx,
                phase: SendPhase::Streaming,
            },
        );

        true
    }

    /// Drain available relay events and fold them into the store.
    ///
    /// Called from the main loop; never blocks. Each fragment replaces the
    /// placeholder's whole content with the accumulated text so far.
    pub fn poll(&mut self) {
        let mut finished = Vec::new();

        for (session_id, send) in self.pending.iter_mut() {
            loop {
                match send.rx.try_recv() {
                    Ok(RelayEvent::Fragment(fragment)) => {
                        send.accumulated.push_str(&fragment);
                        self.store.update_message_content(
                            session_id,
                            &send.message_id,
                            send.accumulated.clone(),
                        );
                    }
                    Ok(RelayEvent::Done) => {
                        send.phase = SendPhase::Completed;
                        finished.push(session_id.clone());
                        break;
                    }
                    Ok(RelayEvent::Failed(reason)) => {
                        tracing::warn!(%session_id, %reason, "reply failed");
                        send.phase = SendPhase::Failed;
                        self.store.update_message_content(
                            session_id,
                            &send.message_id,
                            REPLY_FAILURE_MESSAGE.to_string(),
                        );
                        finished.push(session_id.clone());
                        break;
                    }
                    Err(mpsc::error::TryRecvError::Empty) => {
                        break;
                    }
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        // Sender dropped without a terminal event
                        if send.phase == SendPhase::Streaming {
                            send.phase = SendPhase::Failed;
                            self.store.update_message_content(
                                session_id,
                                &send.message_id,
                                REPLY_FAILURE_MESSAGE.to_string(),
                            );
                        }
                        finished.push(session_id.clone());
                        break;
                    }
                }
            }
        }

        for session_id in finished {
            self.pending.remove(&session_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayEvent;
    use crate::store::{Role, DEFAULT_SESSION_TITLE};
    use std::cell::RefCell;

    /// Relay that replays a fixed script of events
    struct ScriptedRelay {
        script: Vec<RelayEvent>,
    }

    impl ScriptedRelay {
        fn new(script: Vec<RelayEvent>) -> Self {
            Self { script }
        }

        fn reply(text: &str) -> Self {
            Self::new(vec![
                RelayEvent::Fragment(text.to_string()),
                RelayEvent::Done,
            ])
        }
    }

    impl ReplySource for ScriptedRelay {
        fn stream_reply(&self, _prompt: &str, _prior: &[Message]) -> mpsc::UnboundedReceiver<RelayEvent> {
            let (tx, rx) = mpsc::unbounded_channel();
            for event in self.script.clone() {
                let _ = tx.send(event);
            }
            rx
        }
    }

    /// Relay that hands out a receiver prepared by the test, so events can be
    /// fed one at a time between polls
    struct ManualRelay {
        rx: RefCell<Option<mpsc::UnboundedReceiver<RelayEvent>>>,
    }

    impl ManualRelay {
        fn new() -> (Self, mpsc::UnboundedSender<RelayEvent>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                Self {
                    rx: RefCell::new(Some(rx)),
                },
                tx,
            )
        }
    }

    impl ReplySource for ManualRelay {
        fn stream_reply(&self, _prompt: &str, _prior: &[Message]) -> mpsc::UnboundedReceiver<RelayEvent> {
            self.rx.borrow_mut().take().expect("one stream per test")
        }
    }

    fn current_messages<R: ReplySource>(controller: &Controller<R>) -> &[Message] {
        &controller.current_session().unwrap().messages
    }

    #[test]
    fn starts_with_one_auto_created_session() {
        let controller = Controller::new(ScriptedRelay::new(vec![]));

        let sessions = controller.store().list_sessions();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, controller.current_session_id());
        assert_eq!(sessions[0].title, DEFAULT_SESSION_TITLE);
    }

    #[test]
    fn blank_input_is_a_no_op() {
        let mut controller = Controller::new(ScriptedRelay::new(vec![]));

        assert!(!controller.send_message("   "));
        assert!(!controller.send_message(""));
        assert_eq!(current_messages(&controller).len(), 0);
    }

    #[test]
    fn send_appends_user_message_and_placeholder() {
        let mut controller = Controller::new(ScriptedRelay::reply("Hello"));

        assert!(controller.send_message("  My eyes are red  "));

        let messages = current_messages(&controller);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "My eyes are red");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "");
    }

    #[test]
    fn fragments_fold_into_cumulative_prefixes() {
        let (relay, tx) = ManualRelay::new();
        let mut controller = Controller::new(relay);
        controller.send_message("hello");

        tx.send(RelayEvent::Fragment("Hello".to_string())).unwrap();
        controller.poll();
        assert_eq!(current_messages(&controller)[1].content, "Hello");

        tx.send(RelayEvent::Fragment(", ".to_string())).unwrap();
        controller.poll();
        assert_eq!(current_messages(&controller)[1].content, "Hello, ");

        tx.send(RelayEvent::Fragment("world".to_string())).unwrap();
        tx.send(RelayEvent::Done).unwrap();
        controller.poll();

        assert_eq!(current_messages(&controller)[1].content, "Hello, world");
        let current = controller.current_session_id().to_string();
        assert!(!controller.is_streaming(&current));
    }

    #[test]
    fn failure_overwrites_partial_content_with_apology() {
        let mut controller = Controller::new(ScriptedRelay::new(vec![
            RelayEvent::Fragment("Your symptoms sugg".to_string()),
            RelayEvent::Failed("upstream quota exceeded".to_string()),
        ]));
        controller.send_message("hello");
        controller.poll();

        assert_eq!(current_messages(&controller)[1].content, REPLY_FAILURE_MESSAGE);
    }

    #[test]
    fn dropped_stream_without_terminal_event_counts_as_failure() {
        let (relay, tx) = ManualRelay::new();
        let mut controller = Controller::new(relay);
        controller.send_message("hello");

        tx.send(RelayEvent::Fragment("partial".to_string())).unwrap();
        drop(tx);
        controller.poll();

        assert_eq!(current_messages(&controller)[1].content, REPLY_FAILURE_MESSAGE);
    }

    #[test]
    fn concurrent_send_on_same_session_is_rejected() {
        let (relay, _tx) = ManualRelay::new();
        let mut controller = Controller::new(relay);

        assert!(controller.send_message("first"));
        assert!(!controller.send_message("second"));
        assert_eq!(current_messages(&controller).len(), 2);
    }

    #[test]
    fn select_session_ignores_unknown_ids() {
        let mut controller = Controller::new(ScriptedRelay::new(vec![]));
        let original = controller.current_session_id().to_string();

        controller.select_session("no-such-session");

        assert_eq!(controller.current_session_id(), original);
    }

    #[test]
    fn sends_in_one_session_leave_others_untouched() {
        let mut controller = Controller::new(ScriptedRelay::reply("Reply"));
        let first = controller.current_session_id().to_string();
        controller.new_session();
        let second = controller.current_session_id().to_string();
        assert_ne!(first, second);

        controller.send_message("Only in the second session");
        controller.poll();

        let store = controller.store();
        assert_eq!(store.session(&first).unwrap().messages.len(), 0);
        assert_eq!(store.session(&first).unwrap().title, DEFAULT_SESSION_TITLE);
        assert_eq!(store.session(&second).unwrap().messages.len(), 2);
    }

    #[test]
    fn consultation_round_trips_end_to_end() {
        let mut controller = Controller::new(ScriptedRelay::reply("Redness is often conjunctivitis."));
        controller.send_message("My eyes are red");
        controller.poll();

        let session = controller.current_session().unwrap();
        assert_eq!(session.title, "My eyes are red");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "Redness is often conjunctivitis.");

        // A second exchange stays in the same session and keeps the title
        controller.send_message("Should I see a doctor?");
        controller.poll();

        assert_eq!(controller.store().list_sessions().len(), 1);
        let session = controller.current_session().unwrap();
        assert_eq!(session.title, "My eyes are red");
        assert_eq!(session.messages.len(), 4);
    }
}
