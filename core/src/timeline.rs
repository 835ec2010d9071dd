use crate::conversation::Message;

/// Append-only message history of one conversation.
#[derive(Debug, Clone, Default)]
pub struct MessageTimeline {
    messages: Vec<Message>,
}

impl MessageTimeline {
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Hydrate from the backend's authoritative history when a session opens.
    pub fn replace_all(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::conversation::Sender;

    #[test]
    fn append_preserves_insertion_order() {
        let mut timeline = MessageTimeline::default();
        timeline.append(Message::user("first", Utc::now()));
        timeline.append(Message::assistant("second", Utc::now()));
        timeline.append(Message::user("third", Utc::now()));

        let contents: Vec<&str> = timeline.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(timeline.last().map(|m| m.sender), Some(Sender::User));
    }

    #[test]
    fn replace_all_discards_local_history() {
        let mut timeline = MessageTimeline::new(vec![Message::user("draft", Utc::now())]);
        timeline.replace_all(vec![
            Message::assistant("안녕하세요!", Utc::now()),
            Message::user("hi", Utc::now()),
        ]);
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline.as_slice()[0].sender, Sender::Assistant);
    }
}
