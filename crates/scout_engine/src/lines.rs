use encoding_rs::{CoderResult, Decoder, UTF_8};
use engine_logging::engine_debug;

/// Turns arbitrarily split UTF-8 fragments into complete lines.
///
/// Decoding is stateful, so a multi-byte character split across two fragments
/// comes out whole. A trailing fragment without a newline waits for the next
/// `feed`; whatever is still buffered at [`LineDecoder::finish`] is dropped.
pub struct LineDecoder {
    decoder: Decoder,
    buffer: String,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            decoder: UTF_8.new_decoder_with_bom_removal(),
            buffer: String::new(),
        }
    }

    /// Decodes `bytes` and returns every line completed by them, without terminators.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.decode(bytes, false);
        self.take_complete_lines()
    }

    /// Ends the stream. A residual partial line is discarded.
    pub fn finish(mut self) {
        self.decode(&[], true);
        if !self.buffer.is_empty() {
            engine_debug!(
                "Dropping {} bytes of unterminated trailing line",
                self.buffer.len()
            );
        }
    }

    fn decode(&mut self, bytes: &[u8], last: bool) {
        let mut input = bytes;
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 16);
            self.buffer.reserve(needed);
            let (result, read, _had_errors) =
                self.decoder
                    .decode_to_string(input, &mut self.buffer, last);
            input = &input[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }
    }

    fn take_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let rest = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, rest);
        complete.lines().map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(fragments: &[&[u8]]) -> Vec<String> {
        let mut decoder = LineDecoder::new();
        let mut lines = Vec::new();
        for fragment in fragments {
            lines.extend(decoder.feed(fragment));
        }
        decoder.finish();
        lines
    }

    #[test]
    fn partial_line_is_carried_to_next_fragment() {
        let lines = feed_all(&[b"{\"perc", b"ent\":10}\n{\"status\"", b":\"ok\"}\n"]);
        assert_eq!(lines, vec!["{\"percent\":10}", "{\"status\":\"ok\"}"]);
    }

    #[test]
    fn several_lines_in_one_fragment() {
        let lines = feed_all(&[b"a\nb\n\nc\n"]);
        assert_eq!(lines, vec!["a", "b", "", "c"]);
    }

    #[test]
    fn crlf_terminators_are_stripped() {
        let lines = feed_all(&[b"one\r\ntwo\r", b"\n"]);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn multibyte_character_split_across_fragments() {
        let text = "{\"status\":\"Prüfung — 5 €\"}\n".as_bytes();
        let euro = text.len() - 6; // first byte of the 3-byte '€'
        let lines = feed_all(&[&text[..euro + 1], &text[euro + 1..euro + 2], &text[euro + 2..]]);
        assert_eq!(lines, vec!["{\"status\":\"Prüfung — 5 €\"}"]);
    }

    #[test]
    fn byte_at_a_time_delivery() {
        let text = "ü\nß\n".as_bytes();
        let fragments: Vec<&[u8]> = text.chunks(1).collect();
        assert_eq!(feed_all(&fragments), vec!["ü", "ß"]);
    }

    #[test]
    fn unterminated_tail_is_dropped() {
        let lines = feed_all(&[b"{\"percent\":5}\n{\"percent\":"]);
        assert_eq!(lines, vec!["{\"percent\":5}"]);
    }

    #[test]
    fn empty_fragments_are_harmless() {
        let lines = feed_all(&[b"", b"x", b"", b"\n", b""]);
        assert_eq!(lines, vec!["x"]);
    }
}
