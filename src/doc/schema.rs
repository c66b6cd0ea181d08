use serde::{Deserialize, Serialize};

/// Declaration of one structural node kind a document may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Kind name, e.g. `"paragraph"`.
    pub name: String,
    /// Whether nodes of this kind sit in inline content.
    pub inline: bool,
}

impl NodeSpec {
    /// A block-level node kind.
    pub fn block(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inline: false,
        }
    }

    /// An inline node kind.
    pub fn inline(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inline: true,
        }
    }
}

/// The set of node kinds a document may use.
///
/// Containment rules (which kind may nest inside which) are owned by the
/// host's validation layer; this schema only answers existence and
/// inline/block questions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    nodes: Vec<NodeSpec>,
}

impl Schema {
    pub fn new(nodes: impl IntoIterator<Item = NodeSpec>) -> Self {
        Self {
            nodes: nodes.into_iter().collect(),
        }
    }

    /// A minimal schema with `paragraph` and `heading` block kinds, enough
    /// for plain structured text.
    pub fn basic() -> Self {
        Self::new([NodeSpec::block("paragraph"), NodeSpec::block("heading")])
    }

    /// Look up a node kind by name.
    pub fn node(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.node(name).is_some()
    }

    /// Whether `name` is an inline kind. Unknown kinds count as block.
    pub fn is_inline(&self, name: &str) -> bool {
        self.node(name).is_some_and(|spec| spec.inline)
    }

    /// Add a node kind, replacing any existing spec with the same name.
    pub fn add(&mut self, spec: NodeSpec) {
        self.nodes.retain(|existing| existing.name != spec.name);
        self.nodes.push(spec);
    }

    pub fn specs(&self) -> &[NodeSpec] {
        &self.nodes
    }
}
