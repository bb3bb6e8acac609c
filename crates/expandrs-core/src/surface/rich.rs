// Expandrs Rich Surface
// Models a content-editable subtree as an ordered list of text nodes

use log::debug;

use crate::surface::{span_is_valid, EditableSurface, Span, SurfaceId};

/// Rich editable surface: ordered text nodes with a (node, offset) caret.
///
/// The [`EditableSurface`] view exposes only the text node the caret sits
/// in, so a word split across adjacent nodes is never matched or replaced.
/// That mirrors the original behavior and is a documented limitation.
#[derive(Debug)]
pub struct RichSurface {
    id: SurfaceId,
    nodes: Vec<String>,
    caret_node: usize,
    caret_offset: usize,
    input_events: u64,
}

impl RichSurface {
    /// Create a surface from text nodes with the caret at the end of the
    /// last node. An empty list gets one empty node.
    pub fn with_nodes(nodes: Vec<String>) -> Self {
        let nodes = if nodes.is_empty() {
            vec![String::new()]
        } else {
            nodes
        };
        let caret_node = nodes.len() - 1;
        let caret_offset = nodes[caret_node].len();
        Self {
            id: SurfaceId::next(),
            nodes,
            caret_node,
            caret_offset,
            input_events: 0,
        }
    }

    /// Create a surface with a single text node.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::with_nodes(vec![text.into()])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_text(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(String::as_str)
    }

    /// Index of the node holding the caret.
    pub fn caret_node(&self) -> usize {
        self.caret_node
    }

    /// Move the caret to `offset` within node `node`. Out-of-range inputs
    /// are clamped.
    pub fn set_caret_in_node(&mut self, node: usize, offset: usize) {
        let node = node.min(self.nodes.len() - 1);
        self.caret_node = node;
        self.caret_offset = offset.min(self.nodes[node].len());
    }

    /// Append a text node after the current ones.
    pub fn push_node(&mut self, text: impl Into<String>) {
        self.nodes.push(text.into());
    }
}

impl EditableSurface for RichSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn text(&self) -> &str {
        &self.nodes[self.caret_node]
    }

    fn caret(&self) -> usize {
        self.caret_offset
    }

    fn set_caret(&mut self, offset: usize) {
        self.caret_offset = offset.min(self.nodes[self.caret_node].len());
    }

    fn replace_range(&mut self, span: Span, new_text: &str) {
        let node = &mut self.nodes[self.caret_node];
        if !span_is_valid(node, span) {
            debug_assert!(false, "invalid span {:?} on {}", span, self.id);
            debug!("dropping invalid replacement {:?} on {}", span, self.id);
            return;
        }
        node.replace_range(span.start..span.end, new_text);
        if self.caret_offset > node.len() {
            self.caret_offset = node.len();
        }
    }

    fn notify_input(&mut self) {
        self.input_events += 1;
    }

    fn input_events(&self) -> u64 {
        self.input_events
    }
}
