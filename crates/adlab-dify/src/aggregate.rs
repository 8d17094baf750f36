//! Folding a decoded event sequence into one logical result.
//!
//! Identity fields sourced from streaming deltas are first-write-wins; the
//! terminal `message_end` event is authoritative and overwrites them along
//! with the usage accounting.

use crate::stream::{StreamEvent, Usage};

/// File attached to a message, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// File id assigned by the service.
    pub id: Option<String>,
    /// File type (`image`, ...).
    pub kind: String,
    /// Download URL.
    pub url: String,
    /// Owner of the file.
    pub belongs_to: String,
}

/// One logical chat response, folded from the event stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedResult {
    /// Concatenated answer text; `None` when no message event contributed
    /// text, which callers treat as failure rather than empty success.
    pub answer: Option<String>,
    /// Conversation identity for follow-up calls.
    pub conversation_id: Option<String>,
    /// Final message id.
    pub message_id: Option<String>,
    /// Finalized usage accounting.
    pub usage: Usage,
    /// Attached files, stream order, no de-duplication.
    pub files: Vec<FileAttachment>,
}

/// Fold an event sequence, in order, into an [`AggregatedResult`].
///
/// Pure function: aggregating the same sequence twice yields identical
/// results.
pub fn aggregate(events: &[StreamEvent]) -> AggregatedResult {
    let mut answer_parts: Vec<&str> = Vec::new();
    let mut result = AggregatedResult::default();

    for event in events {
        match event {
            StreamEvent::Message {
                answer,
                conversation_id,
                message_id,
            } => {
                if !answer.is_empty() {
                    answer_parts.push(answer);
                }
                if result.conversation_id.is_none() {
                    result.conversation_id.clone_from(conversation_id);
                }
                if result.message_id.is_none() {
                    result.message_id.clone_from(message_id);
                }
            }
            StreamEvent::MessageEnd {
                id,
                conversation_id,
                metadata,
            } => {
                // Terminal event carries the complete, finalized accounting
                // and the service-confirmed identity.
                result.usage = metadata.usage.clone();
                result.message_id.clone_from(id);
                result.conversation_id.clone_from(conversation_id);
            }
            StreamEvent::MessageFile {
                id,
                kind,
                url,
                belongs_to,
            } => {
                result.files.push(FileAttachment {
                    id: id.clone(),
                    kind: kind.clone(),
                    url: url.clone(),
                    belongs_to: belongs_to.clone(),
                });
            }
            StreamEvent::Other => {}
        }
    }

    if !answer_parts.is_empty() {
        result.answer = Some(answer_parts.concat());
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::decode_stream;

    fn events(payload: &str) -> Vec<StreamEvent> {
        decode_stream(payload)
    }

    #[test]
    fn concatenates_answer_fragments_in_order() {
        let seq = events(concat!(
            "data: {\"event\":\"message\",\"answer\":\"Hel\"}\n",
            "data: {\"event\":\"message\",\"answer\":\"lo \"}\n",
            "data: {\"event\":\"message\",\"answer\":\"world\"}\n",
        ));
        let result = aggregate(&seq);
        assert_eq!(result.answer.as_deref(), Some("Hello world"));
    }

    #[test]
    fn no_message_events_yields_absent_answer() {
        let seq = events(concat!(
            "data: {\"event\":\"message_file\",\"id\":\"f1\",\"type\":\"image\",\"url\":\"u\",\"belongs_to\":\"assistant\"}\n",
            "data: {\"event\":\"message_end\",\"id\":\"m1\"}\n",
        ));
        let result = aggregate(&seq);
        assert_eq!(result.answer, None);
        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn empty_answer_fragments_do_not_count_as_content() {
        let seq = events(concat!(
            "data: {\"event\":\"message\",\"answer\":\"\"}\n",
            "data: {\"event\":\"message\",\"answer\":\"\"}\n",
        ));
        assert_eq!(aggregate(&seq).answer, None);
    }

    #[test]
    fn identity_from_deltas_is_first_write_wins() {
        let seq = events(concat!(
            "data: {\"event\":\"message\",\"answer\":\"a\",\"conversation_id\":\"c1\",\"message_id\":\"m1\"}\n",
            "data: {\"event\":\"message\",\"answer\":\"b\",\"conversation_id\":\"c2\",\"message_id\":\"m2\"}\n",
        ));
        let result = aggregate(&seq);
        assert_eq!(result.conversation_id.as_deref(), Some("c1"));
        assert_eq!(result.message_id.as_deref(), Some("m1"));
    }

    #[test]
    fn message_end_identity_supersedes_streamed_values() {
        let seq = events(concat!(
            "data: {\"event\":\"message\",\"answer\":\"a\",\"conversation_id\":\"guess\",\"message_id\":\"m1\"}\n",
            "data: {\"event\":\"message_end\",\"id\":\"m-final\",\"conversation_id\":\"confirmed\"}\n",
        ));
        let result = aggregate(&seq);
        assert_eq!(result.conversation_id.as_deref(), Some("confirmed"));
        assert_eq!(result.message_id.as_deref(), Some("m-final"));
    }

    #[test]
    fn message_end_usage_is_authoritative() {
        let seq = events(concat!(
            "data: {\"event\":\"message\",\"answer\":\"a\"}\n",
            "data: {\"event\":\"message_end\",\"id\":\"m1\",\"metadata\":{\"usage\":",
            "{\"prompt_tokens\":12,\"completion_tokens\":34,\"total_tokens\":46,",
            "\"total_price\":\"0.001\",\"currency\":\"USD\"}}}\n",
        ));
        let result = aggregate(&seq);
        assert_eq!(result.usage.prompt_tokens, 12);
        assert_eq!(result.usage.completion_tokens, 34);
        assert_eq!(result.usage.total_tokens, 46);
        assert!((result.usage.total_price - 0.001).abs() < 1e-12);
    }

    #[test]
    fn files_preserve_order_without_dedup() {
        let seq = events(concat!(
            "data: {\"event\":\"message_file\",\"id\":\"f1\",\"type\":\"image\",\"url\":\"u1\",\"belongs_to\":\"assistant\"}\n",
            "data: {\"event\":\"message_file\",\"id\":\"f1\",\"type\":\"image\",\"url\":\"u1\",\"belongs_to\":\"assistant\"}\n",
            "data: {\"event\":\"message_file\",\"id\":\"f2\",\"type\":\"image\",\"url\":\"u2\",\"belongs_to\":\"assistant\"}\n",
        ));
        let result = aggregate(&seq);
        assert_eq!(result.files.len(), 3);
        assert_eq!(result.files[0].id.as_deref(), Some("f1"));
        assert_eq!(result.files[2].id.as_deref(), Some("f2"));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let seq = events(concat!(
            "data: {\"event\":\"message\",\"answer\":\"Hi\",\"conversation_id\":\"c1\"}\n",
            "data: {\"event\":\"message_file\",\"id\":\"f1\",\"type\":\"image\",\"url\":\"u\",\"belongs_to\":\"assistant\"}\n",
            "data: {\"event\":\"message_end\",\"id\":\"m1\",\"conversation_id\":\"c1\"}\n",
        ));
        assert_eq!(aggregate(&seq), aggregate(&seq));
    }
}
