//! Streaming, line-oriented program reader.
//!
//! Design goals:
//! - Stream lines (no full-file allocation) suitable for large files.
//! - Yield raw line text; the processor parses and denylist-checks
//!   each line itself.

/// Streaming iterator for reading program lines from a BufRead source
pub struct LineIterator<R: std::io::BufRead> {
    reader: R,
    line_buffer: String,
}

impl<R: std::io::BufRead> LineIterator<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: String::new(),
        }
    }
}

impl<R: std::io::BufRead> Iterator for LineIterator<R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.line_buffer.clear();
        match self.reader.read_line(&mut self.line_buffer) {
            Ok(0) => None, // EOF
            Ok(_) => {
                let line = self
                    .line_buffer
                    .trim_end_matches('\n')
                    .trim_end_matches('\r');
                Some(line.to_string())
            }
            Err(_) => None,
        }
    }
}
