use murmur_model::{ChatMessage, ChatRequest, Role};
use serde::Serialize;

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Message<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RequestBody<'a> {
    messages: Vec<Message<'a>>,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(req: &ChatRequest) -> RequestBody<'_> {
    RequestBody {
        messages: req.messages.iter().map(create_message).collect(),
    }
}

#[inline]
fn create_message(msg: &ChatMessage) -> Message<'_> {
    Message {
        role: msg.role,
        content: &msg.content,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::user("Hello"),
                ChatMessage::assistant("Hi! How can I help?"),
                ChatMessage::user("Summarize X"),
            ],
        };
        let body = serde_json::to_value(create_request(&request)).unwrap();
        let expected = json!({
            "messages": [
                { "role": "user", "content": "Hello" },
                { "role": "assistant", "content": "Hi! How can I help?" },
                { "role": "user", "content": "Summarize X" },
            ]
        });
        assert_eq!(body, expected);
    }

    #[test]
    fn test_empty_history() {
        let body =
            serde_json::to_string(&create_request(&ChatRequest::default()))
                .unwrap();
        assert_eq!(body, r#"{"messages":[]}"#);
    }
}
