//! In-memory `MessageRepository` adapter.
//!
//! Appends are stamped with the injected clock and kept in arrival order.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{MessagePersistenceError, MessageRepository};
use crate::domain::{GroupId, Message, MessageId, NewMessage};

/// Append-only message log.
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<Message>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageStore {
    /// Empty log stamped by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            clock,
        }
    }

    /// Messages stored for `group`, oldest first.
    pub fn messages_for(&self, group: GroupId) -> Result<Vec<Message>, MessagePersistenceError> {
        let messages = self
            .messages
            .lock()
            .map_err(|_| MessagePersistenceError::connection("message store lock poisoned"))?;
        Ok(messages
            .iter()
            .filter(|message| message.group_id() == group)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn create(&self, message: NewMessage) -> Result<Message, MessagePersistenceError> {
        let stored = Message::from_new(MessageId::random(), message, self.clock.utc());
        self.messages
            .lock()
            .map_err(|_| MessagePersistenceError::write("message store lock poisoned"))?
            .push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageContent, UserId};
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::rstest;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn new_message(group: GroupId, text: &str) -> NewMessage {
        NewMessage {
            sender_id: UserId::random(),
            group_id: group,
            content: MessageContent::new(text).expect("valid content"),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn stamps_and_keeps_messages_in_order() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let store = InMemoryMessageStore::new(Arc::new(FixedClock(now)));
        let group = GroupId::random();

        let first = store.create(new_message(group, "one")).await.expect("create");
        store.create(new_message(group, "two")).await.expect("create");
        store
            .create(new_message(GroupId::random(), "elsewhere"))
            .await
            .expect("create");

        assert_eq!(first.created_at(), now);
        let contents: Vec<String> = store
            .messages_for(group)
            .expect("list")
            .iter()
            .map(|message| message.content().to_owned())
            .collect();
        assert_eq!(contents, vec!["one", "two"]);
    }
}
