// Expandrs Surface Adapter
// Transactional text replacement with single-step, reversible undo

use std::collections::HashMap;

use log::debug;

use crate::surface::{span_is_valid, EditableSurface, Span, SurfaceId};

/// Undo record for the most recent expansion on a surface.
///
/// `span` covers the inserted text in the post-expansion surface. The
/// record lives in the adapter's side table, not on the surface itself,
/// so host objects stay unpolluted and any number of surfaces can carry
/// independent records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExpansion {
    pub original_text: String,
    pub inserted_text: String,
    pub span: Span,
}

/// Applies expansions and reverses them on request.
///
/// Only the most recent expansion per surface is undoable; each apply
/// overwrites the previous record, and any unrelated edit should
/// invalidate it via [`SurfaceAdapter::invalidate`].
#[derive(Debug, Default)]
pub struct SurfaceAdapter {
    pending: HashMap<SurfaceId, PendingExpansion>,
}

impl SurfaceAdapter {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Replace `[span.start, span.end)` with `new_text`, set the caret to
    /// `span.start + cursor_offset`, record the undo state, and fire an
    /// input notification.
    ///
    /// Invalid spans are dropped without touching the undo table, so a
    /// programmer error cannot corrupt a previously recorded expansion.
    pub fn apply(
        &mut self,
        surface: &mut dyn EditableSurface,
        span: Span,
        new_text: &str,
        cursor_offset: usize,
    ) {
        if !span_is_valid(surface.text(), span) {
            debug_assert!(false, "invalid span {:?} on {}", span, surface.id());
            debug!("refusing to apply invalid span {:?} on {}", span, surface.id());
            return;
        }
        let original_text = surface.text()[span.start..span.end].to_string();

        surface.replace_range(span, new_text);
        surface.set_caret(span.start + cursor_offset.min(new_text.len()));
        surface.notify_input();

        self.pending.insert(
            surface.id(),
            PendingExpansion {
                original_text,
                inserted_text: new_text.to_string(),
                span: Span::new(span.start, span.start + new_text.len()),
            },
        );
    }

    /// Reverse the most recent expansion on this surface.
    ///
    /// Restores the original text, places the caret just after it, clears
    /// the record and returns true. Returns false when no record exists or
    /// the recorded span no longer holds the inserted text (stale record),
    /// leaving default backspace behavior to the caller.
    pub fn revert(&mut self, surface: &mut dyn EditableSurface) -> bool {
        let Some(record) = self.pending.remove(&surface.id()) else {
            return false;
        };
        if surface.text().get(record.span.start..record.span.end)
            != Some(record.inserted_text.as_str())
        {
            debug!("stale undo record on {}, leaving surface untouched", surface.id());
            return false;
        }

        surface.replace_range(record.span, &record.original_text);
        surface.set_caret(record.span.start + record.original_text.len());
        surface.notify_input();
        true
    }

    /// Drop the undo record for a surface (any unrelated edit invalidates
    /// it). Returns true when a record existed.
    pub fn invalidate(&mut self, id: SurfaceId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// The current undo record for a surface, if any.
    pub fn pending(&self, id: SurfaceId) -> Option<&PendingExpansion> {
        self.pending.get(&id)
    }

    pub fn has_pending(&self, id: SurfaceId) -> bool {
        self.pending.contains_key(&id)
    }
}
