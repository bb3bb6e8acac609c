// Expandrs Plain Surface
// Models a raw-value editable (input/textarea): one string plus a caret

use log::debug;

use crate::surface::{span_is_valid, EditableSurface, Span, SurfaceId};

/// Plain editable surface: a single text value and an integer caret.
#[derive(Debug)]
pub struct PlainSurface {
    id: SurfaceId,
    value: String,
    caret: usize,
    input_events: u64,
}

impl PlainSurface {
    /// Create an empty surface with the caret at 0.
    pub fn new() -> Self {
        Self {
            id: SurfaceId::next(),
            value: String::new(),
            caret: 0,
            input_events: 0,
        }
    }

    /// Create a surface holding `text` with the caret at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let value = text.into();
        let caret = value.len();
        Self {
            id: SurfaceId::next(),
            value,
            caret,
            input_events: 0,
        }
    }

    /// The full value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Insert text at the caret and advance past it. Test/driver helper
    /// simulating the user typing.
    pub fn type_str(&mut self, text: &str) {
        let caret = self.caret;
        self.value.insert_str(caret, text);
        self.caret = caret + text.len();
    }
}

impl Default for PlainSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl EditableSurface for PlainSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn text(&self) -> &str {
        &self.value
    }

    fn caret(&self) -> usize {
        self.caret
    }

    fn set_caret(&mut self, offset: usize) {
        self.caret = offset.min(self.value.len());
    }

    fn replace_range(&mut self, span: Span, new_text: &str) {
        if !span_is_valid(&self.value, span) {
            debug_assert!(false, "invalid span {:?} on {}", span, self.id);
            debug!("dropping invalid replacement {:?} on {}", span, self.id);
            return;
        }
        self.value.replace_range(span.start..span.end, new_text);
        if self.caret > self.value.len() {
            self.caret = self.value.len();
        }
    }

    fn notify_input(&mut self) {
        self.input_events += 1;
    }

    fn input_events(&self) -> u64 {
        self.input_events
    }
}
