//! Line scanner for JSON Lines record files.
//!
//! Identifies the byte span of every non-blank line so that records can be
//! parsed on demand.

/// Byte span of one record line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// Start offset in bytes (inclusive).
    pub start_offset: usize,
    /// End offset in bytes (exclusive), without the line terminator.
    pub end_offset: usize,
    /// 1-based line number in the file, for diagnostics.
    pub line_number: usize,
}

impl LineSpan {
    /// Bytes of this line within `data`.
    #[must_use]
    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        data.get(self.start_offset..self.end_offset).unwrap_or(&[])
    }
}

/// Scanner for discovering record lines in JSON Lines data.
pub struct RecordScanner;

impl RecordScanner {
    /// Scans a complete record file for record lines.
    ///
    /// Blank lines (only whitespace) are skipped. `\r\n` terminators are
    /// accepted and a final line without a terminator is kept.
    #[must_use]
    pub fn scan_lines(data: &[u8]) -> Vec<LineSpan> {
        let mut spans = Vec::new();
        let mut line_start = 0;

        for (index, line) in data.split(|&byte| byte == b'\n').enumerate() {
            Self::push_line(&mut spans, line, line_start, index + 1);
            line_start += line.len() + 1;
        }

        spans
    }

    fn push_line(spans: &mut Vec<LineSpan>, line: &[u8], start: usize, line_number: usize) {
        let Some(first) = line.iter().position(|b| !b.is_ascii_whitespace()) else {
            return;
        };
        let last = line
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .unwrap_or(first);
        spans.push(LineSpan {
            start_offset: start + first,
            end_offset: start + last + 1,
            line_number,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_skips_blank_lines() {
        let data = b"{\"a\":1}\n\n   \n{\"b\":2}\r\n{\"c\":3}";
        let spans = RecordScanner::scan_lines(data);

        let lines: Vec<&[u8]> = spans.iter().map(|span| span.slice(data)).collect();
        assert_eq!(
            lines,
            vec![&b"{\"a\":1}"[..], &b"{\"b\":2}"[..], &b"{\"c\":3}"[..]]
        );
        let numbers: Vec<usize> = spans.iter().map(|span| span.line_number).collect();
        assert_eq!(numbers, vec![1, 4, 5]);
    }

    #[test]
    fn test_scan_trailing_newline() {
        let data = b"{\"a\":1}\n{\"b\":2}\n";
        let spans = RecordScanner::scan_lines(data);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].slice(data), b"{\"b\":2}");
        assert_eq!(spans[1].line_number, 2);
    }

    #[test]
    fn test_scan_empty() {
        assert!(RecordScanner::scan_lines(b"").is_empty());
        assert!(RecordScanner::scan_lines(b"\n \n").is_empty());
    }
}
