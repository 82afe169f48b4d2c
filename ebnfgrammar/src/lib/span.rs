#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A half-open byte range `start..end` into the grammar source. The parser
/// attaches one to every error it raises, and one to each production name so
/// that duplicate definitions can point back at the first; a zero-length
/// span marks a single position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// A span covering the bytes `start..end`.
    pub fn new(start: usize, end: usize) -> Span {
        assert!(start <= end, "span {}..{} ends before it starts", start, end);
        Span { start, end }
    }

    /// A zero-length span marking the single position `at`.
    pub fn point(at: usize) -> Span {
        Span { start: at, end: at }
    }

    /// Byte offset of the start of the span.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the span.
    pub fn end(&self) -> usize {
        self.end
    }

    /// The 1-based line this span starts on in `src`. The grammar format is
    /// line oriented, so diagnostics report lines rather than byte offsets.
    pub fn line_of(&self, src: &str) -> usize {
        src.as_bytes()[..self.start.min(src.len())]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
            + 1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_line_of() {
        let src = "a = b ;\nq = r ;\n";
        assert_eq!(Span::point(0).line_of(src), 1);
        assert_eq!(Span::new(8, 9).line_of(src), 2);
        // A span at (or past) the end of the source still reports a line.
        assert_eq!(Span::point(src.len()).line_of(src), 3);
    }
}
