/// Reassembles a byte stream into lines.
///
/// A line ends at `\r` or `\n`. Bytes are kept undecoded until a line is
/// finalized, so a multi-byte UTF-8 sequence split across reads is never
/// corrupted; invalid sequences are decoded leniently.
#[derive(Debug, Default)]
pub struct LineAssembler {
    partial: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of output, returning every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                lines.push(self.take_line());
            } else {
                self.partial.push(byte);
            }
        }
        lines
    }

    /// Finalize the trailing partial line, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    pub fn has_partial(&self) -> bool {
        !self.partial.is_empty()
    }

    fn take_line(&mut self) -> String {
        let bytes = std::mem::take(&mut self.partial);
        match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}
