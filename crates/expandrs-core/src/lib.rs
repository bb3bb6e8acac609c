// Expandrs Core Library
// Rule-based text-expansion engine: matching, rule resolution, action
// processing, and transactional surface edits

pub mod abbreviation;
pub mod action;
pub mod config;
pub mod context;
pub mod engine;
pub mod evaluate;
pub mod matcher;
pub mod rule;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod surface;
pub mod worker;

pub use abbreviation::{Abbreviation, AbbreviationError, ChoiceConfig, ChoiceOption};
pub use action::{
    ActionOutcome, ActionProcessor, ChoiceOutcome, ChoicePresenter, ClipboardError,
    ClipboardReader, ResolvedAction,
};
pub use config::{example_config_content, ConfigError, ConfigFile};
pub use context::ResolutionContext;
pub use engine::{ExpansionEngine, KeystrokeOutcome, TriggerKey};
pub use evaluate::{condition_matches, resolve_expansion};
pub use matcher::{matches, word_before_caret};
pub use rule::{
    Combined, DayOfWeek, DomainMatch, LeafCondition, Operator, Rule, RuleCondition, RuleError,
    RuleId, RuleKind, SpecialDate, SubCondition, TimeRange, MAX_PRIORITY,
};
pub use settings::{default_settings_content, Settings, SettingsError};
pub use snapshot::SnapshotCache;
pub use store::{AbbreviationStore, MemoryStore, StoreError, StoreEvent};
pub use surface::{
    EditableSurface, PendingExpansion, PlainSurface, RichSurface, Span, SurfaceAdapter, SurfaceId,
};
pub use worker::{BulkWorker, WorkerOp, WorkerRequest, WorkerResponse, WorkerResult};
