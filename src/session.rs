//! Conversation session state and orchestration.
//!
//! A [`Session`] owns the ordered dialogue history, the exchange counter, and
//! the document provenance list for one interactive user. [`Session::converse`]
//! is the single operation that grows the history: it sends the full ordered
//! history plus one new user turn to the oracle, and appends the user/assistant
//! pair only after the round-trip succeeds.
//!
//! # All-or-nothing mutation
//!
//! A failed oracle call leaves the session byte-for-byte unchanged — no
//! dangling user turn without a matching reply. Turn pairing therefore stays
//! consistent for replay, and the caller may retry a failed exchange by
//! issuing a fresh `converse` call with the same text.
//!
//! Access to one session is serialized by construction: `converse` takes
//! `&mut self`, so no two exchanges can interleave on the same session.

use crate::document::DocumentRecord;
use crate::oracle::{Oracle, OracleError};

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used in oracle requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the ordered conversation history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Conversation and document state for one interactive user.
///
/// Created empty at session start; mutated by every successful exchange;
/// cleared by [`Session::reset`]. The oracle credential lives with the oracle
/// client, not here, so it survives a reset.
#[derive(Debug, Default)]
pub struct Session {
    turns: Vec<Turn>,
    exchanges: u64,
    documents: Vec<DocumentRecord>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered conversation history, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Count of completed exchanges (one user turn + one assistant reply).
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// Provenance of documents processed in this session.
    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    /// Append a provenance record after a successful processing round-trip.
    pub fn record_document(&mut self, record: DocumentRecord) {
        self.documents.push(record);
    }

    /// Clear turns, documents, and counters.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.documents.clear();
        self.exchanges = 0;
    }

    /// Run one exchange: send history + `user_text`, append the reply.
    ///
    /// The oracle is invoked exactly once. On success the user turn and the
    /// assistant turn are appended and the exchange counter is incremented;
    /// on failure the error is returned and the session is untouched.
    pub async fn converse(
        &mut self,
        oracle: &dyn Oracle,
        system: &str,
        max_tokens: u32,
        user_text: &str,
    ) -> Result<String, OracleError> {
        let mut outgoing = self.turns.clone();
        outgoing.push(Turn::user(user_text));

        let reply = oracle.complete(system, &outgoing, max_tokens).await?;

        // Persist only after the round-trip succeeded.
        self.turns = outgoing;
        self.turns.push(Turn::assistant(reply.clone()));
        self.exchanges += 1;
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Oracle stub that replays scripted outcomes and records every request.
    struct ScriptedOracle {
        outcomes: Mutex<VecDeque<Result<String, OracleError>>>,
        requests: Mutex<Vec<Vec<Turn>>>,
    }

    impl ScriptedOracle {
        fn new(outcomes: Vec<Result<String, OracleError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<Vec<Turn>> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Oracle for ScriptedOracle {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _system: &str,
            turns: &[Turn],
            _max_tokens: u32,
        ) -> Result<String, OracleError> {
            self.requests.lock().unwrap().push(turns.to_vec());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(OracleError::Other("script exhausted".to_string())))
        }
    }

    const SYSTEM: &str = "You are a test librarian.";

    #[tokio::test]
    async fn success_appends_one_user_and_one_assistant_turn() {
        let oracle = ScriptedOracle::new(vec![Ok("OK".to_string())]);
        let mut session = Session::new();

        let reply = session
            .converse(&oracle, SYSTEM, 100, "Search for: Stoicism")
            .await
            .unwrap();

        assert_eq!(reply, "OK");
        assert_eq!(
            session.turns(),
            &[Turn::user("Search for: Stoicism"), Turn::assistant("OK")]
        );
        assert_eq!(session.exchanges(), 1);
    }

    #[tokio::test]
    async fn failure_leaves_session_untouched() {
        let oracle = ScriptedOracle::new(vec![
            Ok("first".to_string()),
            Err(OracleError::Other("network down".to_string())),
        ]);
        let mut session = Session::new();
        session.converse(&oracle, SYSTEM, 100, "hello").await.unwrap();

        let turns_before = session.turns().to_vec();
        let exchanges_before = session.exchanges();

        let err = session
            .converse(&oracle, SYSTEM, 100, "second question")
            .await
            .unwrap_err();

        assert!(matches!(err, OracleError::Other(_)));
        assert_eq!(session.turns(), turns_before.as_slice());
        assert_eq!(session.exchanges(), exchanges_before);
    }

    #[tokio::test]
    async fn rate_limit_failure_is_a_session_noop() {
        let oracle = ScriptedOracle::new(vec![Err(OracleError::RateLimited)]);
        let mut session = Session::new();

        let err = session
            .converse(&oracle, SYSTEM, 100, "anything")
            .await
            .unwrap_err();

        assert_eq!(err, OracleError::RateLimited);
        assert!(session.turns().is_empty());
        assert_eq!(session.exchanges(), 0);
    }

    #[tokio::test]
    async fn history_is_cumulative_and_order_preserving() {
        let oracle = ScriptedOracle::new(vec![
            Ok("reply one".to_string()),
            Ok("reply two".to_string()),
        ]);
        let mut session = Session::new();

        session.converse(&oracle, SYSTEM, 100, "question one").await.unwrap();
        session.converse(&oracle, SYSTEM, 100, "question two").await.unwrap();

        let requests = oracle.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], vec![Turn::user("question one")]);
        assert_eq!(
            requests[1],
            vec![
                Turn::user("question one"),
                Turn::assistant("reply one"),
                Turn::user("question two"),
            ]
        );
        assert_eq!(session.turns().len(), 4);
        assert_eq!(session.exchanges(), 2);
    }

    #[tokio::test]
    async fn retry_after_failure_succeeds_cleanly() {
        let oracle = ScriptedOracle::new(vec![
            Err(OracleError::Other("timeout".to_string())),
            Ok("made it".to_string()),
        ]);
        let mut session = Session::new();

        assert!(session.converse(&oracle, SYSTEM, 100, "query").await.is_err());
        let reply = session.converse(&oracle, SYSTEM, 100, "query").await.unwrap();

        assert_eq!(reply, "made it");
        // No dangling user turn from the failed attempt.
        assert_eq!(session.turns().len(), 2);
        assert_eq!(session.exchanges(), 1);
    }

    #[tokio::test]
    async fn reset_clears_turns_documents_and_counters() {
        let oracle = ScriptedOracle::new(vec![Ok("noted".to_string())]);
        let mut session = Session::new();
        session.converse(&oracle, SYSTEM, 100, "remember this").await.unwrap();
        session.record_document(crate::document::DocumentRecord {
            filename: "list.txt".to_string(),
            processed_at: chrono::Utc::now(),
            media_type: crate::document::MediaType::PlainText,
        });

        session.reset();

        assert!(session.turns().is_empty());
        assert!(session.documents().is_empty());
        assert_eq!(session.exchanges(), 0);
    }
}
