use crate::effect::ChatTurn;

pub type MessageId = u64;
pub type ChatRequestId = u64;

pub const GREETING_TEXT: &str =
    "Hello! I am a language model trained from scratch on your own machine. How can I help you?";
pub const CLEARED_TEXT: &str = "Conversation cleared. How can I help you?";
pub const FALLBACK_TEXT: &str =
    "Sorry, I could not reach the backend server. Please make sure the server is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
}

/// Which part of the conversation is sent with each completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatHistoryMode {
    /// Only the turn that was just typed. Matches the stateless backend.
    #[default]
    LatestTurn,
    FullHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OutstandingSend {
    request: ChatRequestId,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChatState {
    messages: Vec<ChatMessage>,
    draft: String,
    outstanding: Option<OutstandingSend>,
    next_message_id: MessageId,
    next_request_id: ChatRequestId,
    generation: u64,
}

impl Default for ChatState {
    fn default() -> Self {
        let mut state = Self {
            messages: Vec::new(),
            draft: String::new(),
            outstanding: None,
            next_message_id: 1,
            next_request_id: 1,
            generation: 0,
        };
        state.push(Role::Assistant, GREETING_TEXT.to_string());
        state
    }
}

impl ChatState {
    pub(crate) fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub(crate) fn draft(&self) -> &str {
        &self.draft
    }

    pub(crate) fn set_draft(&mut self, text: String) {
        self.draft = text;
    }

    pub(crate) fn is_sending(&self) -> bool {
        self.outstanding.is_some()
    }

    pub(crate) fn can_send(&self) -> bool {
        !self.is_sending() && !self.draft.trim().is_empty()
    }

    /// Moves the draft into the transcript and returns the request to issue.
    pub(crate) fn begin_send(&mut self, mode: ChatHistoryMode) -> Option<(ChatRequestId, Vec<ChatTurn>)> {
        if !self.can_send() {
            return None;
        }
        let text = std::mem::take(&mut self.draft);
        self.push(Role::User, text);

        let request = self.next_request_id;
        self.next_request_id += 1;
        self.outstanding = Some(OutstandingSend {
            request,
            generation: self.generation,
        });

        let turns = match mode {
            ChatHistoryMode::LatestTurn => self.messages.last().map(ChatTurn::from).into_iter().collect(),
            ChatHistoryMode::FullHistory => self.messages.iter().map(ChatTurn::from).collect(),
        };
        Some((request, turns))
    }

    /// Settles the outstanding send. Returns false for replies nobody is waiting on.
    pub(crate) fn settle(&mut self, request: ChatRequestId, reply: Result<String, String>) -> bool {
        let Some(outstanding) = self.outstanding else {
            return false;
        };
        if outstanding.request != request {
            return false;
        }
        self.outstanding = None;

        // Conversation was reset while the request was in flight.
        if outstanding.generation != self.generation {
            return true;
        }

        let text = reply.unwrap_or_else(|_| FALLBACK_TEXT.to_string());
        self.push(Role::Assistant, text);
        true
    }

    pub(crate) fn reset(&mut self) {
        self.messages.clear();
        self.generation += 1;
        self.push(Role::Assistant, CLEARED_TEXT.to_string());
    }

    fn push(&mut self, role: Role, text: String) {
        let id = self.next_message_id;
        self.next_message_id += 1;
        self.messages.push(ChatMessage { id, role, text });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_keep_increasing_across_reset() {
        let mut chat = ChatState::default();
        chat.set_draft("hi".to_string());
        chat.begin_send(ChatHistoryMode::LatestTurn).unwrap();
        chat.reset();

        let ids: Vec<_> = chat.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn full_history_includes_greeting() {
        let mut chat = ChatState::default();
        chat.set_draft("hi".to_string());
        let (_, turns) = chat.begin_send(ChatHistoryMode::FullHistory).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::Assistant);
        assert_eq!(turns[1].content, "hi");
    }
}
