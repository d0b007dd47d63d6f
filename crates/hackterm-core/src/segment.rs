//! Splitting message bodies into plain-text and code-block runs.
//!
//! The split is deliberately naive: every triple backtick toggles between
//! text and code, with no awareness of nesting, info strings or escaping.
//! Unbalanced fences need no special casing because splitting on the
//! delimiter always yields alternating runs.

/// Code fence delimiter.
pub const FENCE: &str = "```";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Text,
    Code,
}

/// A displayable run of a message's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub value: &'a str,
}

impl<'a> Segment<'a> {
    pub fn text(value: &'a str) -> Self {
        Self { kind: SegmentKind::Text, value }
    }

    pub fn code(value: &'a str) -> Self {
        Self { kind: SegmentKind::Code, value }
    }
}

/// Segment `content` for display.
///
/// Chunks at even positions are text, odd positions are code. Values are
/// trimmed. Blank text chunks are dropped; blank code chunks are kept since
/// an empty code block is still something to draw.
pub fn segment(content: &str) -> Vec<Segment<'_>> {
    content
        .split(FENCE)
        .enumerate()
        .filter_map(|(i, chunk)| {
            let value = chunk.trim();
            if i % 2 == 1 {
                Some(Segment::code(value))
            } else if value.is_empty() {
                None
            } else {
                Some(Segment::text(value))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_fence_yields_single_trimmed_text() {
        assert_eq!(segment("  hello world \n"), vec![Segment::text("hello world")]);
    }

    #[test]
    fn test_blank_content_yields_nothing() {
        assert!(segment("").is_empty());
        assert!(segment(" \n\t ").is_empty());
    }

    #[test]
    fn test_balanced_fences_alternate() {
        assert_eq!(
            segment("a```b```c"),
            vec![Segment::text("a"), Segment::code("b"), Segment::text("c")]
        );
    }

    #[test]
    fn test_unterminated_fence_still_alternates() {
        assert_eq!(segment("a```b"), vec![Segment::text("a"), Segment::code("b")]);

        let segments = segment("one```two```three```four");
        let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Text, SegmentKind::Code, SegmentKind::Text, SegmentKind::Code]
        );
        assert_eq!(segments[3].value, "four");
    }

    #[test]
    fn test_empty_code_block_is_kept() {
        assert_eq!(segment("```"), vec![Segment::code("")]);
        assert_eq!(
            segment("before``` \n ```after"),
            vec![Segment::text("before"), Segment::code(""), Segment::text("after")]
        );
    }

    #[test]
    fn test_leading_fence_drops_empty_text() {
        assert_eq!(
            segment("```rust\nfn main() {}\n```\nDone."),
            vec![Segment::code("rust\nfn main() {}"), Segment::text("Done.")]
        );
    }

    #[test]
    fn test_adjacent_fences_keep_parity() {
        // "``````" splits into three empty chunks: text, code, text.
        assert_eq!(segment("x``````y"), vec![
            Segment::text("x"),
            Segment::code(""),
            Segment::text("y"),
        ]);
    }

    #[test]
    fn test_segmenting_is_repeatable() {
        let content = "Fix:\n```js\nlet a = 1;\n```\nthen ```x";
        assert_eq!(segment(content), segment(content));
    }
}
