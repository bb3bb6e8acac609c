// Expandrs Expansion Engine
// Wires matcher, rule evaluator, action processor, and surface adapter
// into the per-keystroke state machine

use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use strum_macros::{Display, EnumString};

use crate::action::{ActionOutcome, ActionProcessor, ChoicePresenter, ClipboardReader};
use crate::context::ResolutionContext;
use crate::evaluate::resolve_expansion;
use crate::matcher;
use crate::settings::Settings;
use crate::snapshot::SnapshotCache;
use crate::store::{AbbreviationStore, StoreEvent};
use crate::surface::{EditableSurface, Span, SurfaceAdapter, SurfaceId};

/// Keys that can fire an expansion, each independently toggleable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TriggerKey {
    Space,
    Tab,
    Enter,
}

impl TriggerKey {
    /// The literal character this key would have typed.
    pub fn literal(self) -> char {
        match self {
            TriggerKey::Space => ' ',
            TriggerKey::Tab => '\t',
            TriggerKey::Enter => '\n',
        }
    }
}

/// What a keystroke ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystrokeOutcome {
    /// Not our keystroke: trigger disabled, no word, or no matching
    /// abbreviation. Default key behavior proceeds.
    Ignored,
    /// A resolution is already in flight on this surface; the keystroke is
    /// dropped rather than interleaved. Surfaces are keyed by [`SurfaceId`],
    /// so this fires when a host drives one underlying editor through
    /// several handle objects reporting the same id; a single exclusive
    /// handle cannot race itself.
    Busy,
    /// The expansion was aborted (choice dismissed or prompt busy). No
    /// mutation was applied; the suppressed trigger character is lost.
    Aborted,
    /// The abbreviation was expanded and the trigger character re-inserted.
    Expanded { key: String, text: String },
    /// Backspace reverted the previous expansion.
    Reverted,
}

/// The expansion orchestrator.
///
/// Collaborators are injected, never ambient: the engine owns no global
/// state and can be constructed in isolation for tests. Methods take
/// `&self`; per-surface serialization is enforced with an in-flight set,
/// while different surfaces resolve independently.
pub struct ExpansionEngine {
    store: Arc<dyn AbbreviationStore>,
    settings: Arc<RwLock<Settings>>,
    snapshot: SnapshotCache,
    processor: ActionProcessor,
    adapter: Mutex<SurfaceAdapter>,
    in_flight: Mutex<HashSet<SurfaceId>>,
}

impl ExpansionEngine {
    pub fn new(
        store: Arc<dyn AbbreviationStore>,
        settings: Arc<RwLock<Settings>>,
        clipboard: Arc<dyn ClipboardReader>,
        choices: Arc<dyn ChoicePresenter>,
    ) -> Self {
        let processor = ActionProcessor::new(Arc::clone(&store), clipboard, choices);
        Self {
            store,
            settings,
            snapshot: SnapshotCache::new(),
            processor,
            adapter: Mutex::new(SurfaceAdapter::new()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// The engine's snapshot cache (read-only view for callers).
    pub fn snapshot(&self) -> &SnapshotCache {
        &self.snapshot
    }

    /// Pull a fresh abbreviation snapshot from the store.
    pub async fn reload_snapshot(&self) {
        self.snapshot.refresh(self.store.as_ref()).await;
    }

    /// React to a store push notification by refreshing the snapshot.
    pub async fn on_store_event(&self, event: StoreEvent) {
        match event {
            StoreEvent::AbbreviationsChanged | StoreEvent::DataSeeded => {
                self.reload_snapshot().await;
            }
        }
    }

    /// Handle a trigger keystroke on an editable surface.
    ///
    /// On a match the trigger's default effect is suppressed (the engine
    /// performs the insertion itself): the abbreviation is replaced, the
    /// trigger's literal character is re-inserted after the expansion, and
    /// a usage increment is dispatched fire-and-forget.
    pub async fn handle_trigger(
        &self,
        surface: &mut dyn EditableSurface,
        trigger: TriggerKey,
        ctx: &ResolutionContext,
    ) -> KeystrokeOutcome {
        if !self.settings.read().trigger_enabled(trigger) {
            return KeystrokeOutcome::Ignored;
        }

        let id = surface.id();
        if !self.in_flight.lock().insert(id) {
            debug!("{id} already resolving, dropping {trigger} keystroke");
            return KeystrokeOutcome::Busy;
        }
        let outcome = self.expand(surface, trigger, ctx).await;
        self.in_flight.lock().remove(&id);
        outcome
    }

    async fn expand(
        &self,
        surface: &mut dyn EditableSurface,
        trigger: TriggerKey,
        ctx: &ResolutionContext,
    ) -> KeystrokeOutcome {
        let caret = surface.caret();
        let (word, start) = match matcher::word_before_caret(surface.text(), caret) {
            Some(found) => found,
            None => return KeystrokeOutcome::Ignored,
        };
        let word = word.to_string();

        let snapshot = self.snapshot.load();
        let abbr = snapshot
            .iter()
            .find(|a| a.enabled() && matcher::matches(&word, a.key(), a.case_sensitive()));
        let Some(abbr) = abbr else {
            return KeystrokeOutcome::Ignored;
        };

        let expansion = resolve_expansion(abbr, ctx);
        let resolved = match self.processor.resolve(expansion).await {
            ActionOutcome::Resolved(resolved) => resolved,
            ActionOutcome::Aborted => {
                debug!("expansion of '{}' aborted", abbr.key());
                return KeystrokeOutcome::Aborted;
            }
        };

        self.adapter.lock().apply(
            surface,
            Span::new(start, caret),
            &resolved.text,
            resolved.cursor_offset,
        );

        // re-insert the suppressed trigger character after the expansion;
        // an explicit cursor placement inside the text takes precedence
        let end = start + resolved.text.len();
        let literal = trigger.literal();
        surface.replace_range(Span::new(end, end), literal.encode_utf8(&mut [0u8; 4]));
        if resolved.cursor_offset >= resolved.text.len() {
            surface.set_caret(end + literal.len_utf8());
        } else {
            surface.set_caret(start + resolved.cursor_offset);
        }

        self.dispatch_usage_increment(abbr.key());
        KeystrokeOutcome::Expanded {
            key: abbr.key().to_string(),
            text: resolved.text,
        }
    }

    /// Handle backspace on an editable surface.
    ///
    /// When undo is enabled and the surface carries an undo record, the
    /// previous expansion is reverted and default deletion is suppressed.
    pub fn handle_backspace(&self, surface: &mut dyn EditableSurface) -> KeystrokeOutcome {
        if !self.settings.read().undo_enabled() {
            return KeystrokeOutcome::Ignored;
        }
        if self.adapter.lock().revert(surface) {
            KeystrokeOutcome::Reverted
        } else {
            KeystrokeOutcome::Ignored
        }
    }

    /// Tell the engine about an unrelated edit on a surface, invalidating
    /// its undo record.
    pub fn note_edit(&self, id: SurfaceId) {
        self.adapter.lock().invalidate(id);
    }

    /// True when a surface has an undoable expansion.
    pub fn has_pending_undo(&self, id: SurfaceId) -> bool {
        self.adapter.lock().has_pending(id)
    }

    fn dispatch_usage_increment(&self, key: &str) {
        let store = Arc::clone(&self.store);
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.increment_usage(&key).await {
                warn!("usage increment for '{key}' failed: {e}");
            }
        });
    }
}
