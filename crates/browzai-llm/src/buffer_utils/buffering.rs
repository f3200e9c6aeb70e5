use anyhow::Result;
use std::collections::VecDeque;

/// Byte buffer that yields complete `\n`-terminated lines
///
/// Network chunks can split a line (or a multi-byte character) anywhere, so
/// bytes are only decoded once the terminating newline has arrived.
pub struct CircularLineBuffer {
    buffer: VecDeque<u8>,
}

impl CircularLineBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Next complete line without its terminator (`\n` or `\r\n`)
    pub fn next_line(&mut self) -> Option<Result<String>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
        Some(decode_line(line_bytes))
    }

    /// Whatever is left once the byte stream has ended
    pub fn take_remaining(&mut self) -> Option<Result<String>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line_bytes: Vec<u8> = self.buffer.drain(..).collect();
        Some(decode_line(line_bytes))
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

fn decode_line(bytes: Vec<u8>) -> Result<String> {
    let line = String::from_utf8(bytes).map_err(|e| anyhow::anyhow!("Invalid UTF-8: {}", e))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_on_newline() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"line1\nline2\r\n");

        assert_eq!(buffer.next_line().unwrap().unwrap(), "line1");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "line2");
        assert!(buffer.next_line().is_none());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_partial_line_waits_for_terminator() {
        let mut buffer = CircularLineBuffer::with_capacity(64);

        buffer.extend(b"partial");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.len(), 7);

        buffer.extend(b" line\n");
        assert_eq!(buffer.next_line().unwrap().unwrap(), "partial line");
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        let bytes = "data: 😀\n".as_bytes();

        buffer.extend(&bytes[..8]);
        assert!(buffer.next_line().is_none());
        buffer.extend(&bytes[8..]);

        assert_eq!(buffer.next_line().unwrap().unwrap(), "data: 😀");
    }

    #[test]
    fn test_take_remaining() {
        let mut buffer = CircularLineBuffer::with_capacity(64);
        assert!(buffer.take_remaining().is_none());

        buffer.extend(b"data: [DONE]");
        assert_eq!(buffer.take_remaining().unwrap().unwrap(), "data: [DONE]");
        assert!(buffer.is_empty());
    }
}
