//! Rendered preview output

use serde::Serialize;

/// A property on a host element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prop {
    pub name: String,
    pub value: PropValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
    Object(Vec<(String, PropValue)>),
    List(Vec<PropValue>),
    /// An event handler or other callable; not invoked by the preview
    Function,
    /// An expression the sandbox does not evaluate, as source text
    Expr(String),
}

impl PropValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualNode {
    Element {
        tag: String,
        props: Vec<Prop>,
        children: Vec<VisualNode>,
    },
    Text {
        text: String,
    },
    /// Placeholder for an unevaluated expression child
    Opaque {
        source: String,
    },
}

impl VisualNode {
    pub fn prop(&self, name: &str) -> Option<&PropValue> {
        match self {
            VisualNode::Element { props, .. } => {
                props.iter().find(|p| p.name == name).map(|p| &p.value)
            }
            _ => None,
        }
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            VisualNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            VisualNode::Text { text } => out.push_str(text),
            VisualNode::Opaque { .. } => {}
        }
    }

    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a VisualNode)) {
        visit(self);
        if let VisualNode::Element { children, .. } = self {
            for child in children {
                child.walk(visit);
            }
        }
    }
}

/// A successfully rendered preview
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VisualTree {
    pub nodes: Vec<VisualNode>,
}

impl VisualTree {
    pub fn new(nodes: Vec<VisualNode>) -> Self {
        Self { nodes }
    }

    /// Concatenated text content, depth first
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.collect_text(&mut out);
        }
        out
    }

    /// All elements with the given tag, in document order
    pub fn find_by_tag(&self, tag: &str) -> Vec<&VisualNode> {
        let mut found = Vec::new();
        for node in &self.nodes {
            node.walk(&mut |n| {
                if matches!(n, VisualNode::Element { tag: t, .. } if t == tag) {
                    found.push(n);
                }
            });
        }
        found
    }

    /// Number of element nodes
    pub fn element_count(&self) -> usize {
        let mut count = 0;
        for node in &self.nodes {
            node.walk(&mut |n| {
                if matches!(n, VisualNode::Element { .. }) {
                    count += 1;
                }
            });
        }
        count
    }
}
