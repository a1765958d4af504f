//! Incremental Server-Sent Events decoder
//!
//! Bytes may arrive split anywhere (inside a field name, a UTF-8 sequence or
//! a line ending); events come out only once their terminating blank line
//! has been seen.

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// `event:` field, `"message"` when absent
    pub event: String,
    /// All `data:` lines of the event joined with `\n`
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return the events it completed, in order
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.pending.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if let Some(event) = self.process_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final event the server did not terminate with a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest);
        let line = line.trim_end_matches('\r');
        if !line.is_empty() {
            self.process_line(line);
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id and retry carry nothing this client uses
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() && event.is_none() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<SseEvent> {
        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(decoder.feed(chunk));
        }
        events.extend(decoder.finish());
        events
    }

    fn event(name: &str, data: &str) -> SseEvent {
        SseEvent {
            event: name.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn test_basic_events() {
        let events = decode_all(&[b"event: output\ndata: A red\n\nevent: done\ndata: {}\n\n"]);
        assert_eq!(events, vec![event("output", "A red"), event("done", "{}")]);
    }

    #[test]
    fn test_chunk_boundaries_do_not_matter() {
        let raw = "event: output\r\ndata:  sports car ☕\r\n\r\n: keepalive\n\nevent: done\ndata: {}\n\n";
        let whole = decode_all(&[raw.as_bytes()]);

        let bytes = raw.as_bytes();
        for split in 1..bytes.len() {
            let parts = decode_all(&[&bytes[..split], &bytes[split..]]);
            assert_eq!(parts, whole, "split at byte {}", split);
        }
        let single_bytes: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(decode_all(&single_bytes), whole);

        assert_eq!(whole[0], event("output", " sports car ☕"));
    }

    #[test]
    fn test_multiline_data_joined_with_newline() {
        let events = decode_all(&[b"event: output\ndata: line one\ndata:\ndata: line three\n\n"]);
        assert_eq!(events, vec![event("output", "line one\n\nline three")]);
    }

    #[test]
    fn test_comments_and_unknown_fields_ignored() {
        let events = decode_all(&[b": hello\nid: 7\nretry: 100\ndata: x\n\n"]);
        assert_eq!(events, vec![event("message", "x")]);
    }

    #[test]
    fn test_unterminated_event_flushed_on_finish() {
        let events = decode_all(&[b"event: done\ndata: {\"reason\":\"canceled\"}"]);
        assert_eq!(events, vec![event("done", "{\"reason\":\"canceled\"}")]);
    }
}
