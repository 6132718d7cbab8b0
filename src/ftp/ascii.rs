//! ASCII-mode line-ending translation (spec §4.3 "Types/modes", §9
//! "Character-set translation").
//!
//! No teacher analogue; minimal byte-stream translators per spec §9: RETR
//! in ASCII mode expands bare `LF` to `CRLF` with a one-byte lookahead so an
//! existing `CRLF` isn't doubled; STOR strips a `CR` immediately preceding
//! an `LF`. Both carry one bit of state across transfer-buffer-sized chunks
//! so a `CRLF` split across two reads is never mistranslated. Binary mode
//! never touches the stream.

/// RETR-direction (LF -> CRLF) translator, stateful across chunks.
#[derive(Default)]
pub struct LineEndingEncoder {
    prev_was_cr: bool,
}

impl LineEndingEncoder {
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if b == b'\n' {
                if !self.prev_was_cr {
                    out.push(b'\r');
                }
                out.push(b'\n');
                self.prev_was_cr = false;
            } else {
                out.push(b);
                self.prev_was_cr = b == b'\r';
            }
        }
    }
}

/// STOR-direction (CRLF -> LF) translator, stateful across chunks.
#[derive(Default)]
pub struct LineEndingDecoder {
    pending_cr: bool,
}

impl LineEndingDecoder {
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    out.push(b'\n');
                    continue;
                }
                out.push(b'\r');
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
    }

    /// Flush a trailing bare `CR` held across the final chunk boundary.
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if self.pending_cr {
            out.push(b'\r');
            self.pending_cr = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_bare_lf_without_doubling_existing_crlf() {
        let mut enc = LineEndingEncoder::default();
        let mut out = Vec::new();
        enc.encode(b"a\nb\r\nc", &mut out);
        assert_eq!(out, b"a\r\nb\r\nc");
    }

    #[test]
    fn collapses_crlf_to_lf() {
        let mut dec = LineEndingDecoder::default();
        let mut out = Vec::new();
        dec.decode(b"a\r\nb\r\nc", &mut out);
        dec.finish(&mut out);
        assert_eq!(out, b"a\nb\nc");
    }

    #[test]
    fn handles_split_crlf_across_chunks() {
        let mut enc = LineEndingEncoder::default();
        let mut out = Vec::new();
        enc.encode(b"a\r", &mut out);
        enc.encode(b"\nb", &mut out);
        assert_eq!(out, b"a\r\nb");

        let mut dec = LineEndingDecoder::default();
        let mut out = Vec::new();
        dec.decode(b"a\r", &mut out);
        dec.decode(b"\nb", &mut out);
        dec.finish(&mut out);
        assert_eq!(out, b"a\nb");
    }
}
