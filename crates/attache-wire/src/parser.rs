//! Incremental parser for the line-delimited streaming body

use crate::event::StreamEvent;

/// Marker prefix carried by every event frame.
const FRAME_MARKER: &[u8] = b"data: ";

/// Parses raw streamed chunks into discrete [`StreamEvent`] values.
///
/// Framing is one event per line: the `data: ` marker followed by a JSON
/// payload. Chunk boundaries may split a line anywhere, including inside a
/// multi-byte UTF-8 sequence, so input is buffered as bytes and only
/// complete lines are decoded. A line that fails to parse is dropped and
/// logged; one corrupt frame must not abort an otherwise-healthy stream.
#[derive(Debug, Default)]
pub struct EventFrameParser {
    buffer: Vec<u8>,
}

impl EventFrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk and return every event that became fully framed,
    /// in arrival order. Any trailing partial line stays buffered for the
    /// next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line[..pos]) {
                events.push(event);
            }
        }
        events
    }

    /// Discard any unterminated partial line at end of stream. Never emits.
    pub fn finish(&mut self) {
        if !self.buffer.is_empty() {
            tracing::debug!(
                bytes = self.buffer.len(),
                "discarding unterminated partial frame at stream end"
            );
            self.buffer.clear();
        }
    }
}

fn parse_line(line: &[u8]) -> Option<StreamEvent> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        return None;
    }
    let Some(payload) = line.strip_prefix(FRAME_MARKER) else {
        tracing::warn!(
            line = %String::from_utf8_lossy(line),
            "dropping frame without marker prefix"
        );
        return None;
    };
    match serde_json::from_slice::<StreamEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::warn!(error = %e, "dropping unparseable frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_split(frame: &[u8], split: usize) -> Vec<StreamEvent> {
        let mut parser = EventFrameParser::new();
        let mut events = parser.feed(&frame[..split]);
        events.extend(parser.feed(&frame[split..]));
        events
    }

    #[test]
    fn test_single_frame() {
        let mut parser = EventFrameParser::new();
        let events = parser.feed(b"data: {\"type\":\"text\",\"content\":\"Hi\"}\n");
        assert_eq!(events, vec![StreamEvent::text("Hi")]);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk_preserve_order() {
        let mut parser = EventFrameParser::new();
        let events = parser.feed(
            b"data: {\"type\":\"text\",\"content\":\"a\"}\ndata: {\"type\":\"text\",\"content\":\"b\"}\ndata: {\"type\":\"done\"}\n",
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::text("a"),
                StreamEvent::text("b"),
                StreamEvent::Done
            ]
        );
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut parser = EventFrameParser::new();
        assert!(parser.feed(b"data: {\"type\":\"text\",\"content\":\"Hel").is_empty());
        let events = parser.feed(b"lo\"}\n");
        assert_eq!(events, vec![StreamEvent::text("Hello")]);
    }

    #[test]
    fn test_split_at_every_byte_boundary() {
        let frame = b"data: {\"type\":\"text\",\"content\":\"Hello\"}\n";
        for split in 1..frame.len() {
            assert_eq!(
                feed_split(frame, split),
                vec![StreamEvent::text("Hello")],
                "split at byte {split}"
            );
        }
    }

    #[test]
    fn test_split_inside_multibyte_codepoint() {
        let frame = "data: {\"type\":\"text\",\"content\":\"prix: 10€\"}\n".as_bytes();
        for split in 1..frame.len() {
            assert_eq!(
                feed_split(frame, split),
                vec![StreamEvent::text("prix: 10€")],
                "split at byte {split}"
            );
        }
    }

    #[test]
    fn test_function_call_frame() {
        let mut parser = EventFrameParser::new();
        let events = parser.feed(
            b"data: {\"type\":\"function_call\",\"name\":\"createTask\",\"args\":{},\"result\":{\"success\":true,\"created\":3}}\n",
        );
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::FunctionCall { name, result, .. } => {
                assert_eq!(name, "createTask");
                assert!(result.success);
                assert_eq!(result.created, Some(3));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_frame_dropped_stream_continues() {
        let mut parser = EventFrameParser::new();
        assert!(parser.feed(b"data: {not json}\n").is_empty());
        let events = parser.feed(b"data: {\"type\":\"done\"}\n");
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_line_without_marker_dropped() {
        let mut parser = EventFrameParser::new();
        assert!(parser.feed(b"event: noise\n").is_empty());
    }

    #[test]
    fn test_blank_lines_ignored() {
        let mut parser = EventFrameParser::new();
        assert!(parser.feed(b"\n\r\n\n").is_empty());
    }

    #[test]
    fn test_crlf_frame() {
        let mut parser = EventFrameParser::new();
        let events = parser.feed(b"data: {\"type\":\"done\"}\r\n");
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_finish_discards_partial_and_never_emits() {
        let mut parser = EventFrameParser::new();
        assert!(parser.feed(b"data: {\"type\":\"done\"").is_empty());
        parser.finish();
        // Buffer is clean: the next frame parses on its own.
        let events = parser.feed(b"data: {\"type\":\"done\"}\n");
        assert_eq!(events, vec![StreamEvent::Done]);
    }

    #[test]
    fn test_finish_on_empty_buffer_is_noop() {
        let mut parser = EventFrameParser::new();
        parser.finish();
        assert!(parser.feed(b"").is_empty());
    }
}
