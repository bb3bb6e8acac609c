// Expandrs Memory Store
// In-process store with boundary validation and change broadcasting

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Local;
use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use tokio::sync::broadcast;

use crate::abbreviation::{Abbreviation, ChoiceConfig};
use crate::rule::RuleId;
use crate::store::{AbbreviationStore, StoreError, StoreEvent};

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct Inner {
    // IndexMap keeps declaration order, which the evaluator's tie-break
    // and the snapshot depend on
    abbreviations: IndexMap<String, Abbreviation>,
    choices: IndexMap<u32, ChoiceConfig>,
}

/// In-memory implementation of [`AbbreviationStore`].
///
/// Validates every abbreviation and rule on the way in, assigns rule ids,
/// and broadcasts [`StoreEvent`]s so subscribers can refresh their
/// snapshots.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    events: broadcast::Sender<StoreEvent>,
    next_rule_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(Inner::default()),
            events,
            next_rule_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Seed initial data in one shot and announce it.
    pub fn seed(
        &self,
        abbreviations: Vec<Abbreviation>,
        choices: Vec<ChoiceConfig>,
    ) -> Result<(), StoreError> {
        for abbr in abbreviations {
            self.insert_validated(abbr)?;
        }
        for choice in choices {
            self.insert_choice_validated(choice)?;
        }
        self.emit(StoreEvent::DataSeeded);
        Ok(())
    }

    /// Add one abbreviation (validated, rule ids assigned).
    pub fn add_abbreviation(&self, abbreviation: Abbreviation) -> Result<(), StoreError> {
        self.insert_validated(abbreviation)?;
        self.emit(StoreEvent::AbbreviationsChanged);
        Ok(())
    }

    /// Remove an abbreviation by key.
    pub fn remove_abbreviation(&self, key: &str) -> Result<(), StoreError> {
        let removed = self.inner.write().abbreviations.shift_remove(key);
        match removed {
            Some(_) => {
                self.emit(StoreEvent::AbbreviationsChanged);
                Ok(())
            }
            None => Err(StoreError::UnknownAbbreviation(key.to_string())),
        }
    }

    /// Toggle an abbreviation on or off.
    pub fn set_enabled(&self, key: &str, enabled: bool) -> Result<(), StoreError> {
        {
            let mut inner = self.inner.write();
            let abbr = inner
                .abbreviations
                .get_mut(key)
                .ok_or_else(|| StoreError::UnknownAbbreviation(key.to_string()))?;
            abbr.set_enabled(enabled);
        }
        self.emit(StoreEvent::AbbreviationsChanged);
        Ok(())
    }

    /// Add one choice configuration.
    pub fn add_choice_config(&self, config: ChoiceConfig) -> Result<(), StoreError> {
        self.insert_choice_validated(config)?;
        self.emit(StoreEvent::AbbreviationsChanged);
        Ok(())
    }

    /// Number of stored abbreviations.
    pub fn len(&self) -> usize {
        self.inner.read().abbreviations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().abbreviations.is_empty()
    }

    /// Case-insensitive substring search over keys, categories, and default
    /// expansions. Used by the bulk worker.
    pub fn search(&self, query: &str) -> Vec<String> {
        let needle = query.to_lowercase();
        self.inner
            .read()
            .abbreviations
            .values()
            .filter(|abbr| {
                abbr.key().to_lowercase().contains(&needle)
                    || abbr.category().to_lowercase().contains(&needle)
                    || abbr.expansion_default().to_lowercase().contains(&needle)
            })
            .map(|abbr| abbr.key().to_string())
            .collect()
    }

    fn insert_validated(&self, mut abbreviation: Abbreviation) -> Result<(), StoreError> {
        abbreviation
            .validate()
            .map_err(|source| StoreError::InvalidAbbreviation {
                key: abbreviation.key().to_string(),
                source,
            })?;
        for rule in abbreviation.rules_mut() {
            if rule.id() == RuleId::UNASSIGNED {
                rule.assign_id(RuleId(self.next_rule_id.fetch_add(1, Ordering::Relaxed)));
            }
        }

        let mut inner = self.inner.write();
        if inner.abbreviations.contains_key(abbreviation.key()) {
            return Err(StoreError::DuplicateKey(abbreviation.key().to_string()));
        }
        debug!(
            "storing abbreviation '{}' with {} rule(s)",
            abbreviation.key(),
            abbreviation.rules().len()
        );
        inner
            .abbreviations
            .insert(abbreviation.key().to_string(), abbreviation);
        Ok(())
    }

    fn insert_choice_validated(&self, config: ChoiceConfig) -> Result<(), StoreError> {
        if config.options().is_empty() {
            return Err(StoreError::EmptyChoiceConfig(config.id()));
        }
        let mut inner = self.inner.write();
        if inner.choices.contains_key(&config.id()) {
            return Err(StoreError::DuplicateChoiceId(config.id()));
        }
        inner.choices.insert(config.id(), config);
        Ok(())
    }

    fn emit(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AbbreviationStore for MemoryStore {
    async fn all_abbreviations(&self) -> Result<Vec<Abbreviation>, StoreError> {
        Ok(self.inner.read().abbreviations.values().cloned().collect())
    }

    async fn increment_usage(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let abbr = inner
            .abbreviations
            .get_mut(key)
            .ok_or_else(|| StoreError::UnknownAbbreviation(key.to_string()))?;
        abbr.record_use(Local::now());
        Ok(())
    }

    async fn choice_config(&self, id: u32) -> Result<Option<ChoiceConfig>, StoreError> {
        Ok(self.inner.read().choices.get(&id).cloned())
    }
}
