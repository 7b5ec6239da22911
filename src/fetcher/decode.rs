//! Incremental UTF-8 decoding for chunked response bodies.

use crate::error::{CompmetaError, Result};

/// Stateful text decoder for byte streams whose chunk boundaries need not
/// align with character boundaries.
///
/// An incomplete multi-byte sequence at the end of a chunk (at most three
/// bytes) is carried over and completed by the next chunk. Truly invalid
/// byte sequences are an error, not silently replaced.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    carry: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, appending the decoded text to `out`.
    pub fn decode(&mut self, chunk: &[u8], out: &mut String) -> Result<()> {
        if self.carry.is_empty() {
            return self.feed(chunk, out);
        }

        // Carry holds at most 3 trailing bytes of an unfinished sequence.
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(chunk);
        self.feed(&buf, out)
    }

    fn feed(&mut self, bytes: &[u8], out: &mut String) -> Result<()> {
        match std::str::from_utf8(bytes) {
            Ok(text) => {
                out.push_str(text);
                Ok(())
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                if let Ok(text) = std::str::from_utf8(valid) {
                    out.push_str(text);
                }
                match e.error_len() {
                    // Sequence is merely unfinished; wait for the next chunk.
                    None => {
                        self.carry = rest.to_vec();
                        Ok(())
                    }
                    Some(_) => Err(CompmetaError::Decode(format!(
                        "invalid UTF-8 in response body: {}",
                        e
                    ))),
                }
            }
        }
    }

    /// Flush the decoder at end of stream. Bytes still carried at this
    /// point can never form a complete character.
    pub fn finish(&mut self) -> Result<()> {
        if self.carry.is_empty() {
            Ok(())
        } else {
            Err(CompmetaError::Decode(
                "incomplete UTF-8 sequence at end of response body".to_string(),
            ))
        }
    }
}
