// Expandrs Surface Layer
// Editable text surfaces and the transactional replacement adapter

pub mod adapter;
pub mod plain;
pub mod rich;

pub use adapter::{PendingExpansion, SurfaceAdapter};
pub use plain::PlainSurface;
pub use rich::RichSurface;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of an editable surface, used as the key of the undo side table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SurfaceId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Half-open byte span `[start, end)` within a surface's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Capability contract shared by plain and rich surfaces.
///
/// Offsets are byte offsets on char boundaries. For a rich surface the
/// methods operate on the text node the caret currently sits in; a word
/// spanning multiple text nodes is a documented limitation and is never
/// matched or replaced.
pub trait EditableSurface: Send {
    fn id(&self) -> SurfaceId;

    /// The editable text the caret is in (whole value for plain surfaces,
    /// current text node for rich ones).
    fn text(&self) -> &str;

    /// Caret offset within `text()`.
    fn caret(&self) -> usize;

    fn set_caret(&mut self, offset: usize);

    /// Replace `[span.start, span.end)` with `new_text`. Out-of-bounds or
    /// non-boundary spans are a programmer error and are dropped.
    fn replace_range(&mut self, span: Span, new_text: &str);

    /// Synthesize an input-change notification so host logic can react.
    fn notify_input(&mut self);

    /// Number of input notifications fired so far (observable in tests,
    /// standing in for the DOM `input` event stream).
    fn input_events(&self) -> u64;
}

pub(crate) fn span_is_valid(text: &str, span: Span) -> bool {
    span.start <= span.end
        && span.end <= text.len()
        && text.is_char_boundary(span.start)
        && text.is_char_boundary(span.end)
}
