//! Incremental byte-to-line decoding for streamed response bodies.
//!
//! Network chunks arrive at arbitrary boundaries, including mid-line and
//! mid-UTF-8-sequence. [`LineDecoder`] buffers raw bytes and only decodes
//! once a full newline-terminated line is available, so split multi-byte
//! sequences are never mangled. The decoder owns no I/O; tests feed it
//! byte chunks directly.

/// Buffered line decoder for one streaming call.
///
/// Created at request start, discarded at the terminal signal.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of raw response bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        if !self.done {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// Pop the next complete line, without its newline terminator.
    ///
    /// Returns `None` until a newline arrives; bytes after the last
    /// newline stay buffered for the next push.
    pub fn next_line(&mut self) -> Option<String> {
        if self.done {
            return None;
        }
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
        line.pop(); // drop the newline itself
        Some(String::from_utf8_lossy(&line).into_owned())
    }

    /// Mark the stream terminated. Buffered bytes beyond this point are
    /// dropped and no further lines are produced.
    pub fn mark_done(&mut self) {
        self.done = true;
        self.buffer.clear();
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Bytes currently waiting for a newline boundary.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_decoder_yields_nothing() {
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.next_line(), None);
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_single_complete_line() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"data: hello\n");
        assert_eq!(decoder.next_line().as_deref(), Some("data: hello"));
        assert_eq!(decoder.next_line(), None);
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"data: hel");
        assert_eq!(decoder.next_line(), None);
        decoder.push(b"lo\nrest");
        assert_eq!(decoder.next_line().as_deref(), Some("data: hello"));
        assert_eq!(decoder.next_line(), None);
        assert_eq!(decoder.pending_bytes(), 4);
    }

    #[test]
    fn test_multiple_lines_in_one_chunk() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"one\ntwo\nthree\n");
        assert_eq!(decoder.next_line().as_deref(), Some("one"));
        assert_eq!(decoder.next_line().as_deref(), Some("two"));
        assert_eq!(decoder.next_line().as_deref(), Some("three"));
        assert_eq!(decoder.next_line(), None);
    }

    #[test]
    fn test_multibyte_sequence_split_across_chunks() {
        // "你" is three bytes in UTF-8; split it down the middle.
        let bytes = "data: 你好\n".as_bytes();
        let mut decoder = LineDecoder::new();
        decoder.push(&bytes[..8]);
        assert_eq!(decoder.next_line(), None);
        decoder.push(&bytes[8..]);
        assert_eq!(decoder.next_line().as_deref(), Some("data: 你好"));
    }

    #[test]
    fn test_crlf_terminated_line_keeps_cr() {
        // The decoder only splits on \n; trailing \r is the caller's to trim.
        let mut decoder = LineDecoder::new();
        decoder.push(b"data: x\r\n");
        assert_eq!(decoder.next_line().as_deref(), Some("data: x\r"));
    }

    #[test]
    fn test_empty_lines() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"\n\ndata: a\n");
        assert_eq!(decoder.next_line().as_deref(), Some(""));
        assert_eq!(decoder.next_line().as_deref(), Some(""));
        assert_eq!(decoder.next_line().as_deref(), Some("data: a"));
    }

    #[test]
    fn test_mark_done_drops_buffered_bytes() {
        let mut decoder = LineDecoder::new();
        decoder.push(b"data: before\ndata: after");
        assert_eq!(decoder.next_line().as_deref(), Some("data: before"));
        decoder.mark_done();
        assert!(decoder.is_done());
        assert_eq!(decoder.pending_bytes(), 0);
        assert_eq!(decoder.next_line(), None);

        // Pushes after termination are ignored.
        decoder.push(b"data: late\n");
        assert_eq!(decoder.next_line(), None);
    }
}
