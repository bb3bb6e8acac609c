// Expandrs Action Processing
// Directive scanning and resolution for expansion templates

pub mod processor;
pub mod template;

pub use processor::{
    ActionOutcome, ActionProcessor, ChoiceOutcome, ChoicePresenter, ClipboardError,
    ClipboardReader, ResolvedAction,
};
pub use template::{parse_template, Segment, Template};
