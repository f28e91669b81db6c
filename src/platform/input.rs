//! Frames raw stdin bytes into logical key sequences.
//!
//! Escape sequences (CSI, SS3, OSC and alt-prefixed keys) are emitted whole; runs of
//! printable text are emitted as one sequence; control characters are emitted alone.
//! A bracketed paste is emitted as its content without the markers. An incomplete escape
//! tail is held until the flush timeout, then emitted verbatim.

use std::time::{Duration, Instant};

const ESC: char = '\x1b';
const PASTE_START: &str = "\x1b[200~";
const PASTE_END: &str = "\x1b[201~";

#[derive(Debug, PartialEq, Eq)]
enum Status {
    Complete,
    Incomplete,
}

#[derive(Debug)]
pub struct InputFramer {
    buffer: String,
    /// Undecoded UTF-8 tail from the previous read.
    partial: Vec<u8>,
    paste: Option<String>,
    timeout: Duration,
    flush_deadline: Option<Instant>,
}

impl InputFramer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            buffer: String::new(),
            partial: Vec::new(),
            paste: None,
            timeout,
            flush_deadline: None,
        }
    }

    pub fn push(&mut self, data: &[u8]) -> Vec<String> {
        self.push_at(data, Instant::now())
    }

    pub fn push_at(&mut self, data: &[u8], now: Instant) -> Vec<String> {
        self.flush_deadline = None;
        self.partial.extend_from_slice(data);
        let text = self.decode();
        let mut out = Vec::new();
        self.process(&text, &mut out);
        if !self.buffer.is_empty() {
            self.flush_deadline = Some(now + self.timeout);
        }
        out
    }

    /// Emits a held escape tail once its deadline has passed.
    pub fn flush_due(&mut self, now: Instant) -> Vec<String> {
        match self.flush_deadline {
            Some(deadline) if now >= deadline => self.flush(),
            _ => Vec::new(),
        }
    }

    /// How long a poll may block before `flush_due` has work to do.
    pub fn next_timeout(&self, now: Instant, default: Duration) -> Duration {
        match self.flush_deadline {
            Some(deadline) => deadline.saturating_duration_since(now).min(default),
            None => default,
        }
    }

    pub fn flush(&mut self) -> Vec<String> {
        self.flush_deadline = None;
        if self.buffer.is_empty() {
            return Vec::new();
        }
        vec![std::mem::take(&mut self.buffer)]
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty() && self.partial.is_empty() && self.paste.is_none()
    }

    fn decode(&mut self) -> String {
        let mut text = String::new();
        let mut rest: &[u8] = &self.partial;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        self.partial = rest.to_vec();
        text
    }

    fn process(&mut self, data: &str, out: &mut Vec<String>) {
        if let Some(mut paste) = self.paste.take() {
            paste.push_str(data);
            match paste.find(PASTE_END) {
                Some(end) => {
                    let rest = paste[end + PASTE_END.len()..].to_string();
                    paste.truncate(end);
                    out.push(paste);
                    if !rest.is_empty() {
                        self.process(&rest, out);
                    }
                }
                None => self.paste = Some(paste),
            }
            return;
        }

        self.buffer.push_str(data);
        if let Some(start) = self.buffer.find(PASTE_START) {
            let before = self.buffer[..start].to_string();
            let after = self.buffer[start + PASTE_START.len()..].to_string();
            self.buffer.clear();
            out.extend(split_sequences(&before).0);
            self.paste = Some(String::new());
            self.process(&after, out);
            return;
        }

        let (sequences, remainder) = split_sequences(&self.buffer);
        out.extend(sequences);
        self.buffer = remainder;
    }
}

impl Default for InputFramer {
    fn default() -> Self {
        Self::new(Duration::from_millis(10))
    }
}

fn split_sequences(buffer: &str) -> (Vec<String>, String) {
    let mut sequences = Vec::new();
    let mut text = String::new();
    let mut pos = 0;

    while pos < buffer.len() {
        let rest = &buffer[pos..];
        let ch = rest.chars().next().expect("pos is on a char boundary");
        if ch == ESC {
            if !text.is_empty() {
                sequences.push(std::mem::take(&mut text));
            }
            match escape_len(rest) {
                Some(len) => {
                    sequences.push(rest[..len].to_string());
                    pos += len;
                }
                None => return (sequences, rest.to_string()),
            }
        } else if ch.is_control() {
            if !text.is_empty() {
                sequences.push(std::mem::take(&mut text));
            }
            sequences.push(ch.to_string());
            pos += ch.len_utf8();
        } else {
            text.push(ch);
            pos += ch.len_utf8();
        }
    }

    if !text.is_empty() {
        sequences.push(text);
    }
    (sequences, String::new())
}

/// Byte length of the complete escape sequence at the start of `data`.
fn escape_len(data: &str) -> Option<usize> {
    data[1..]
        .char_indices()
        .map(|(idx, ch)| 1 + idx + ch.len_utf8())
        .find(|end| status(&data[..*end]) == Status::Complete)
}

fn status(data: &str) -> Status {
    let after = &data[1..];
    if let Some(payload) = after.strip_prefix('[') {
        return match payload.as_bytes().last() {
            Some(byte) if (0x40..=0x7e).contains(byte) => Status::Complete,
            _ => Status::Incomplete,
        };
    }
    if after.starts_with(']') {
        return if data.ends_with("\x1b\\") || data.ends_with('\x07') {
            Status::Complete
        } else {
            Status::Incomplete
        };
    }
    if after.starts_with('O') {
        return if after.len() >= 2 {
            Status::Complete
        } else {
            Status::Incomplete
        };
    }
    Status::Complete
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_keys_and_text_runs() {
        let mut framer = InputFramer::default();
        assert_eq!(
            framer.push(b"hi\x1b[Aok\r\x7f"),
            vec!["hi", "\x1b[A", "ok", "\r", "\x7f"]
        );
    }

    #[test]
    fn alt_and_ss3_sequences_are_whole() {
        let mut framer = InputFramer::default();
        assert_eq!(framer.push(b"\x1bd\x1bOP\x1b\x7f"), vec!["\x1bd", "\x1bOP", "\x1b\x7f"]);
    }

    #[test]
    fn partial_csi_waits_for_the_rest() {
        let mut framer = InputFramer::default();
        assert!(framer.push(b"\x1b[3").is_empty());
        assert_eq!(framer.push(b"~x"), vec!["\x1b[3~", "x"]);
    }

    #[test]
    fn lone_escape_flushes_after_timeout() {
        let mut framer = InputFramer::new(Duration::from_millis(10));
        let start = Instant::now();
        assert!(framer.push_at(b"\x1b", start).is_empty());
        assert!(framer.flush_due(start).is_empty());
        assert_eq!(
            framer.next_timeout(start, Duration::from_millis(50)),
            Duration::from_millis(10)
        );
        assert_eq!(
            framer.flush_due(start + Duration::from_millis(10)),
            vec!["\x1b"]
        );
        assert!(framer.flush_due(start + Duration::from_millis(20)).is_empty());
    }

    #[test]
    fn bracketed_paste_is_one_sequence_across_reads() {
        let mut framer = InputFramer::default();
        assert_eq!(framer.push(b"a\x1b[200~line one\r"), vec!["a"]);
        assert_eq!(
            framer.push(b"line two\x1b[201~b"),
            vec!["line one\rline two", "b"]
        );
        assert!(framer.is_empty());
    }

    #[test]
    fn utf8_split_across_reads_is_reassembled() {
        let mut framer = InputFramer::default();
        let bytes = "é".as_bytes();
        assert!(framer.push(&bytes[..1]).is_empty());
        assert_eq!(framer.push(&bytes[1..]), vec!["é"]);
    }
}
