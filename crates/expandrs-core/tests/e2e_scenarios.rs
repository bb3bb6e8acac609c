// Expandrs End-to-End Test Scenarios
//
// These tests drive the full pipeline the way keystrokes would:
// word extraction -> match -> rule resolution -> action resolution ->
// surface mutation -> undo.
//
// Run with: cargo test --test e2e_scenarios

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;

use expandrs_core::{
    Abbreviation, ChoiceConfig, ChoiceOption, ChoiceOutcome, ChoicePresenter, ClipboardError,
    ClipboardReader, ConfigFile, DomainMatch, EditableSurface, ExpansionEngine, KeystrokeOutcome,
    MemoryStore, PlainSurface, ResolutionContext, RichSurface, Rule, RuleCondition, Settings,
    TimeRange, TriggerKey,
};

// =========================================================================
// Test Helpers
// =========================================================================

struct FixedClipboard(Option<&'static str>);

#[async_trait]
impl ClipboardReader for FixedClipboard {
    async fn read_text(&self) -> Result<String, ClipboardError> {
        match self.0 {
            Some(text) => Ok(text.to_string()),
            None => Err(ClipboardError::Unavailable("test clipboard".to_string())),
        }
    }
}

struct ScriptedChoices(ChoiceOutcome);

#[async_trait]
impl ChoicePresenter for ScriptedChoices {
    async fn present(&self, _options: &[ChoiceOption]) -> ChoiceOutcome {
        self.0
    }
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

fn ctx_at(now: NaiveDateTime, hostname: &str) -> ResolutionContext {
    ResolutionContext::new(now, hostname)
}

fn ctx(hostname: &str) -> ResolutionContext {
    // 2024-03-05 is a Tuesday
    ctx_at(at(2024, 3, 5, 12, 0), hostname)
}

async fn engine(
    store: Arc<MemoryStore>,
    clipboard: Option<&'static str>,
    choice: ChoiceOutcome,
) -> ExpansionEngine {
    let engine = ExpansionEngine::new(
        store,
        Arc::new(RwLock::new(Settings::new())),
        Arc::new(FixedClipboard(clipboard)),
        Arc::new(ScriptedChoices(choice)),
    );
    engine.reload_snapshot().await;
    engine
}

/// "addr" expands to the home address by default and to the office
/// address on the work domain.
fn addr_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let rule = Rule::new(
        RuleCondition::Domain(DomainMatch {
            domains: vec!["work.example.com".to_string()],
        }),
        "456 Office Blvd",
        0,
    );
    store
        .add_abbreviation(Abbreviation::new("addr", "123 Main St").with_rules(vec![rule]))
        .unwrap();
    store
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn addr_expands_per_hostname() {
    let engine = engine(addr_store(), None, ChoiceOutcome::Dismissed).await;

    let mut work = PlainSurface::with_text("addr");
    engine
        .handle_trigger(&mut work, TriggerKey::Space, &ctx("work.example.com"))
        .await;
    assert_eq!(work.value(), "456 Office Blvd ");

    let mut home = PlainSurface::with_text("addr");
    engine
        .handle_trigger(&mut home, TriggerKey::Space, &ctx("home.example.com"))
        .await;
    assert_eq!(home.value(), "123 Main St ");
}

#[tokio::test]
async fn time_range_boundary_is_inclusive() {
    let store = Arc::new(MemoryStore::new());
    let rule = Rule::new(
        RuleCondition::TimeRange(TimeRange {
            start_hour: 9,
            start_minute: 0,
            end_hour: 17,
            end_minute: 0,
        }),
        "On it",
        0,
    );
    store
        .add_abbreviation(Abbreviation::new("st", "Away").with_rules(vec![rule]))
        .unwrap();
    let engine = engine(store, None, ChoiceOutcome::Dismissed).await;

    let mut before = PlainSurface::with_text("st");
    engine
        .handle_trigger(
            &mut before,
            TriggerKey::Space,
            &ctx_at(at(2024, 3, 5, 8, 59), "x"),
        )
        .await;
    assert_eq!(before.value(), "Away ");

    let mut boundary = PlainSurface::with_text("st");
    engine
        .handle_trigger(
            &mut boundary,
            TriggerKey::Space,
            &ctx_at(at(2024, 3, 5, 9, 0), "x"),
        )
        .await;
    assert_eq!(boundary.value(), "On it ");
}

#[tokio::test]
async fn choice_selection_and_dismissal() {
    let seed = |store: &Arc<MemoryStore>| {
        store
            .add_abbreviation(Abbreviation::new("hi", "Hi $choice(id=1)$"))
            .unwrap();
        store
            .add_choice_config(ChoiceConfig::new(
                1,
                vec![
                    ChoiceOption {
                        title: "Formal".to_string(),
                        message: "Good day".to_string(),
                    },
                    ChoiceOption {
                        title: "Casual".to_string(),
                        message: "hey!".to_string(),
                    },
                ],
            ))
            .unwrap();
    };

    // selecting option 2 inserts option 2's message
    let store = Arc::new(MemoryStore::new());
    seed(&store);
    let select = engine(store, None, ChoiceOutcome::Selected(1)).await;
    let mut surface = PlainSurface::with_text("hi");
    let outcome = select
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("x"))
        .await;
    assert!(matches!(outcome, KeystrokeOutcome::Expanded { .. }));
    assert_eq!(surface.value(), "Hi hey! ");

    // pressing Escape aborts with no mutation at all
    let store = Arc::new(MemoryStore::new());
    seed(&store);
    let dismiss = engine(store, None, ChoiceOutcome::Dismissed).await;
    let mut surface = PlainSurface::with_text("hi");
    let outcome = dismiss
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("x"))
        .await;
    assert_eq!(outcome, KeystrokeOutcome::Aborted);
    assert_eq!(surface.value(), "hi");
    assert_eq!(surface.input_events(), 0);
}

#[tokio::test]
async fn clipboard_expansion_and_failure() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_abbreviation(Abbreviation::new("paste", "<$clipboard$>"))
        .unwrap();

    let ok = engine(Arc::clone(&store), Some("copied"), ChoiceOutcome::Dismissed).await;
    let mut surface = PlainSurface::with_text("paste");
    ok.handle_trigger(&mut surface, TriggerKey::Space, &ctx("x"))
        .await;
    assert_eq!(surface.value(), "<copied> ");

    let broken = engine(store, None, ChoiceOutcome::Dismissed).await;
    let mut surface = PlainSurface::with_text("paste");
    broken
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("x"))
        .await;
    assert_eq!(surface.value(), "<> ");
}

#[tokio::test]
async fn undo_round_trip_on_plain_surface() {
    let engine = engine(addr_store(), None, ChoiceOutcome::Dismissed).await;
    let mut surface = PlainSurface::with_text("note: addr");
    engine
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("home.example.com"))
        .await;
    assert_eq!(surface.value(), "note: 123 Main St ");

    assert_eq!(
        engine.handle_backspace(&mut surface),
        KeystrokeOutcome::Reverted
    );
    assert_eq!(surface.value(), "note: addr ");
    assert_eq!(surface.caret(), 10);

    // second backspace falls through to native behavior
    assert_eq!(
        engine.handle_backspace(&mut surface),
        KeystrokeOutcome::Ignored
    );
}

#[tokio::test]
async fn undo_round_trip_on_rich_surface() {
    let engine = engine(addr_store(), None, ChoiceOutcome::Dismissed).await;
    let mut surface = RichSurface::with_nodes(vec![
        "first paragraph".to_string(),
        "shipping to addr".to_string(),
    ]);
    engine
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("home.example.com"))
        .await;
    assert_eq!(surface.node_text(1), Some("shipping to 123 Main St "));
    assert_eq!(surface.node_text(0), Some("first paragraph"));

    assert_eq!(
        engine.handle_backspace(&mut surface),
        KeystrokeOutcome::Reverted
    );
    assert_eq!(surface.node_text(1), Some("shipping to addr "));
    assert_eq!(surface.caret(), 16);
}

#[tokio::test]
async fn rich_surface_word_in_other_node_not_matched() {
    let engine = engine(addr_store(), None, ChoiceOutcome::Dismissed).await;
    // caret sits in the second node; "addr" in the first is out of reach
    let mut surface = RichSurface::with_nodes(vec!["addr".to_string(), String::new()]);
    let outcome = engine
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("home.example.com"))
        .await;
    assert_eq!(outcome, KeystrokeOutcome::Ignored);
    assert_eq!(surface.node_text(0), Some("addr"));
}

#[tokio::test]
async fn config_driven_pipeline() {
    let toml = r#"
[[abbreviation]]
key = "brb"
expansion = "be right back"

[[abbreviation]]
key = "sig"
expansion = "Regards"

[[abbreviation.rule]]
kind = "domain"
expansion = "Kind regards from the office"
priority = 10
domains = ["work.example.com"]
"#;
    let store = Arc::new(MemoryStore::new());
    ConfigFile::from_toml_str(toml).unwrap().seed(&store).unwrap();
    let engine = engine(store, None, ChoiceOutcome::Dismissed).await;

    let mut surface = PlainSurface::with_text("brb");
    engine
        .handle_trigger(&mut surface, TriggerKey::Space, &ctx("anywhere.net"))
        .await;
    assert_eq!(surface.value(), "be right back ");

    let mut surface = PlainSurface::with_text("sig");
    engine
        .handle_trigger(&mut surface, TriggerKey::Enter, &ctx("work.example.com"))
        .await;
    assert_eq!(surface.value(), "Kind regards from the office\n");
}

#[tokio::test]
async fn case_sensitivity_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    store
        .add_abbreviation(Abbreviation::new("BRB", "be right back").with_case_sensitive(true))
        .unwrap();
    let engine = engine(store, None, ChoiceOutcome::Dismissed).await;

    let mut lower = PlainSurface::with_text("brb");
    assert_eq!(
        engine
            .handle_trigger(&mut lower, TriggerKey::Space, &ctx("x"))
            .await,
        KeystrokeOutcome::Ignored
    );

    let mut exact = PlainSurface::with_text("BRB");
    engine
        .handle_trigger(&mut exact, TriggerKey::Space, &ctx("x"))
        .await;
    assert_eq!(exact.value(), "be right back ");
}

#[tokio::test]
async fn surfaces_expand_independently() {
    let engine = engine(addr_store(), None, ChoiceOutcome::Dismissed).await;
    let mut a = PlainSurface::with_text("addr");
    let mut b = PlainSurface::with_text("addr");
    engine
        .handle_trigger(&mut a, TriggerKey::Space, &ctx("home.example.com"))
        .await;
    engine
        .handle_trigger(&mut b, TriggerKey::Space, &ctx("work.example.com"))
        .await;
    // each surface keeps its own undo record
    assert_eq!(engine.handle_backspace(&mut a), KeystrokeOutcome::Reverted);
    assert_eq!(a.value(), "addr ");
    assert_eq!(b.value(), "456 Office Blvd ");
    assert_eq!(engine.handle_backspace(&mut b), KeystrokeOutcome::Reverted);
    assert_eq!(b.value(), "addr ");
}
