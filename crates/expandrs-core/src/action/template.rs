// Expandrs Template Scanner
// Splits expansion text into literal runs and embedded directives

use std::sync::OnceLock;

use regex::Regex;

/// One piece of a scanned expansion template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// `$cursor$` - removed from the text; its position becomes the caret
    /// offset after all other directives resolve.
    Cursor,
    /// `$clipboard$` - replaced with the system clipboard's text content.
    Clipboard,
    /// `$choice(id=N)$` - replaced with the message of an interactively
    /// selected option from the referenced choice configuration.
    Choice { id: u32 },
}

/// A scanned expansion template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when any directive is present.
    pub fn has_directives(&self) -> bool {
        self.segments
            .iter()
            .any(|s| !matches!(s, Segment::Literal(_)))
    }
}

fn directive_regex() -> &'static Regex {
    static DIRECTIVE: OnceLock<Regex> = OnceLock::new();
    DIRECTIVE.get_or_init(|| {
        // unknown $...$ runs are left literal by not matching here
        Regex::new(r"\$(cursor|clipboard|choice\(id=(\d+)\))\$")
            .unwrap_or_else(|e| panic!("directive regex is invalid: {e}"))
    })
}

/// Scan an expansion string into segments.
///
/// Unrecognized `$...$` sequences and stray `$` characters stay literal, so
/// templates without directives round-trip unchanged.
pub fn parse_template(text: &str) -> Template {
    let mut segments = Vec::new();
    let mut last_end = 0;

    for captures in directive_regex().captures_iter(text) {
        let whole = match captures.get(0) {
            Some(m) => m,
            None => continue,
        };
        if whole.start() > last_end {
            segments.push(Segment::Literal(text[last_end..whole.start()].to_string()));
        }
        last_end = whole.end();

        let segment = if let Some(id) = captures.get(2) {
            match id.as_str().parse::<u32>() {
                Ok(id) => Segment::Choice { id },
                // ids too large for u32 stay literal
                Err(_) => Segment::Literal(whole.as_str().to_string()),
            }
        } else {
            match captures.get(1).map(|m| m.as_str()) {
                Some("cursor") => Segment::Cursor,
                Some("clipboard") => Segment::Clipboard,
                _ => Segment::Literal(whole.as_str().to_string()),
            }
        };
        segments.push(segment);
    }

    if last_end < text.len() {
        segments.push(Segment::Literal(text[last_end..].to_string()));
    }

    Template { segments }
}
