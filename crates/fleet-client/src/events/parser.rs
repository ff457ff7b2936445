//! SSE (Server-Sent Events) parser
//!
//! Parses the SSE wire format into action events.

use fleet_core::ActionEvent;
use tracing::trace;

use super::{EventError, EventResult};

/// SSE parser state
#[derive(Debug, Default)]
pub(crate) struct SseParser {
    /// Buffer for incomplete lines
    buffer: Vec<u8>,
    /// Current event data being accumulated
    data_buffer: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and extract any complete events
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<EventResult<ActionEvent>> {
        let mut events = Vec::new();
        self.buffer.extend_from_slice(bytes);

        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        events
    }

    fn process_line(&mut self, line: &[u8]) -> Option<EventResult<ActionEvent>> {
        // Empty line ends the event
        if line.is_empty() {
            return self.dispatch_event();
        }

        // Comment line (keepalive)
        if line.starts_with(b":") {
            trace!("SSE keepalive/comment");
            return None;
        }

        let line = match std::str::from_utf8(line) {
            Ok(s) => s,
            Err(_) => return Some(Err(EventError::Parse("Invalid UTF-8 in SSE line".into()))),
        };

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "data" => {
                if !self.data_buffer.is_empty() {
                    self.data_buffer.push('\n');
                }
                self.data_buffer.push_str(value);
            }
            // Only one event kind is sent
            "event" | "id" | "retry" => {}
            _ => trace!("SSE unknown field: {}", field),
        }

        None
    }

    fn dispatch_event(&mut self) -> Option<EventResult<ActionEvent>> {
        if self.data_buffer.is_empty() {
            return None;
        }

        let data = std::mem::take(&mut self.data_buffer);
        Some(serde_json::from_str::<ActionEvent>(&data).map_err(|e| {
            let preview: String = data.chars().take(100).collect();
            EventError::Parse(format!(
                "Failed to parse event JSON: {} (data: {})",
                e, preview
            ))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::ActionStatus;

    const RUNNING: &str = r#"{"action_id":"action_1_0","device_id":"dev-1","status":"RUNNING","timestamp":"2024-05-01T10:00:00Z"}"#;

    #[test]
    fn test_parse_simple_event() {
        let mut parser = SseParser::new();
        let input = format!("event: action\ndata: {}\n\n", RUNNING);

        let events = parser.feed(input.as_bytes());
        assert_eq!(events.len(), 1);
        let event = events[0].as_ref().unwrap();
        assert_eq!(event.action_id, "action_1_0");
        assert_eq!(event.status, ActionStatus::Running);
    }

    #[test]
    fn test_parse_chunked_data() {
        let mut parser = SseParser::new();
        let input = format!("data: {}\r\n\r\n", RUNNING);
        let (head, tail) = input.as_bytes().split_at(20);

        assert!(parser.feed(head).is_empty());
        assert_eq!(parser.feed(tail).len(), 1);
    }

    #[test]
    fn test_ignore_comments() {
        let mut parser = SseParser::new();
        let input = format!(": keepalive\n\ndata: {}\n\n", RUNNING);
        assert_eq!(parser.feed(input.as_bytes()).len(), 1);
    }

    #[test]
    fn test_bad_json_is_reported() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: {not json}\n\n");
        assert!(matches!(events[0], Err(EventError::Parse(_))));
    }
}
