//! The rendering seam.
//!
//! The core never touches a real document: every node operation goes through
//! the [`Dom`] trait, addressed by opaque [`NodeId`] handles. Real embeddings
//! implement it over their host document; [`MemoryDom`] implements it over an
//! in-memory tree for tests and headless use.
//!
//! Operations on unknown node ids are tolerated as no-ops — a collaborator
//! may have dropped a subtree the core still holds handles into, and the
//! overlay must never take the host application down over rendering.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// Opaque handle to one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

/// Minimal document surface the overlay renders through.
pub trait Dom: Send + Sync {
    /// The overlay's mount point in the host tree.
    fn root(&self) -> NodeId;

    /// Create a detached node. `classes` is a space-separated list.
    fn create_node(&self, tag: &str, classes: &str, id: Option<&str>) -> NodeId;

    fn append_child(&self, parent: NodeId, child: NodeId);
    fn set_text(&self, node: NodeId, text: &str);
    fn add_class(&self, node: NodeId, class: &str);
    fn remove_class(&self, node: NodeId, class: &str);
    fn has_class(&self, node: NodeId, class: &str) -> bool;
    fn set_attr(&self, node: NodeId, name: &str, value: &str);
    fn show(&self, node: NodeId);
    fn hide(&self, node: NodeId);
    fn is_visible(&self, node: NodeId) -> bool;

    /// Detach `node` and drop its subtree.
    fn remove(&self, node: NodeId);

    fn child_count(&self, node: NodeId) -> usize;

    /// Drop every child of `node`, keeping the node itself.
    fn clear_children(&self, node: NodeId);

    /// Scroll `node` to its bottom edge. Optional; headless documents may
    /// ignore it.
    fn scroll_to_bottom(&self, _node: NodeId) {}
}

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    classes: Vec<String>,
    dom_id: Option<String>,
    text: String,
    attrs: HashMap<String, String>,
    visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory [`Dom`] implementation.
///
/// Nodes live in a creation-ordered map, which keeps lookups like
/// [`MemoryDom::find_by_class`] deterministic. The inherent methods beyond
/// the trait exist for inspection — tests assert against them.
#[derive(Debug)]
pub struct MemoryDom {
    nodes: Mutex<BTreeMap<NodeId, NodeData>>,
    next_id: Mutex<u64>,
    root: NodeId,
    scrolled: Mutex<Vec<NodeId>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    #[must_use]
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            root,
            NodeData {
                tag: "body".to_string(),
                visible: true,
                ..NodeData::default()
            },
        );
        Self {
            nodes: Mutex::new(nodes),
            next_id: Mutex::new(1),
            root,
            scrolled: Mutex::new(Vec::new()),
        }
    }

    /// All nodes carrying `class`, in creation order.
    #[must_use]
    pub fn find_by_class(&self, class: &str) -> Vec<NodeId> {
        self.nodes
            .lock()
            .iter()
            .filter(|(_, data)| data.classes.iter().any(|c| c == class))
            .map(|(id, _)| *id)
            .collect()
    }

    /// The node registered under a document id, e.g. `kbs-ctx-save`.
    #[must_use]
    pub fn find_by_id(&self, dom_id: &str) -> Option<NodeId> {
        self.nodes
            .lock()
            .iter()
            .find(|(_, data)| data.dom_id.as_deref() == Some(dom_id))
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn tag_of(&self, node: NodeId) -> String {
        self.nodes
            .lock()
            .get(&node)
            .map(|data| data.tag.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn text_of(&self, node: NodeId) -> String {
        self.nodes
            .lock()
            .get(&node)
            .map(|data| data.text.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn classes_of(&self, node: NodeId) -> Vec<String> {
        self.nodes
            .lock()
            .get(&node)
            .map(|data| data.classes.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn attr_of(&self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .lock()
            .get(&node)
            .and_then(|data| data.attrs.get(name).cloned())
    }

    #[must_use]
    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .lock()
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.lock().contains_key(&node)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.lock().len()
    }

    /// Nodes [`Dom::scroll_to_bottom`] was called on, in call order.
    #[must_use]
    pub fn scroll_log(&self) -> Vec<NodeId> {
        self.scrolled.lock().clone()
    }

    fn detach(nodes: &mut BTreeMap<NodeId, NodeData>, node: NodeId) {
        let parent = nodes.get(&node).and_then(|data| data.parent);
        if let Some(parent) = parent {
            if let Some(parent_data) = nodes.get_mut(&parent) {
                parent_data.children.retain(|child| *child != node);
            }
        }
    }

    fn drop_subtree(nodes: &mut BTreeMap<NodeId, NodeData>, node: NodeId) {
        let children = nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default();
        for child in children {
            Self::drop_subtree(nodes, child);
        }
        nodes.remove(&node);
    }
}

impl Dom for MemoryDom {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&self, tag: &str, classes: &str, id: Option<&str>) -> NodeId {
        let node = {
            let mut next = self.next_id.lock();
            let node = NodeId(*next);
            *next += 1;
            node
        };
        self.nodes.lock().insert(
            node,
            NodeData {
                tag: tag.to_string(),
                classes: classes.split_whitespace().map(str::to_string).collect(),
                dom_id: id.map(str::to_string),
                visible: true,
                ..NodeData::default()
            },
        );
        node
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.lock();
        if !nodes.contains_key(&parent) || !nodes.contains_key(&child) {
            return;
        }
        Self::detach(&mut nodes, child);
        if let Some(data) = nodes.get_mut(&child) {
            data.parent = Some(parent);
        }
        if let Some(data) = nodes.get_mut(&parent) {
            data.children.push(child);
        }
    }

    fn set_text(&self, node: NodeId, text: &str) {
        if let Some(data) = self.nodes.lock().get_mut(&node) {
            data.text = text.to_string();
        }
    }

    fn add_class(&self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.lock().get_mut(&node) {
            for name in class.split_whitespace() {
                if !data.classes.iter().any(|c| c == name) {
                    data.classes.push(name.to_string());
                }
            }
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        if let Some(data) = self.nodes.lock().get_mut(&node) {
            data.classes.retain(|c| c != class);
        }
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .lock()
            .get(&node)
            .is_some_and(|data| data.classes.iter().any(|c| c == class))
    }

    fn set_attr(&self, node: NodeId, name: &str, value: &str) {
        if let Some(data) = self.nodes.lock().get_mut(&node) {
            data.attrs.insert(name.to_string(), value.to_string());
        }
    }

    fn show(&self, node: NodeId) {
        if let Some(data) = self.nodes.lock().get_mut(&node) {
            data.visible = true;
        }
    }

    fn hide(&self, node: NodeId) {
        if let Some(data) = self.nodes.lock().get_mut(&node) {
            data.visible = false;
        }
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.nodes
            .lock()
            .get(&node)
            .is_some_and(|data| data.visible)
    }

    fn remove(&self, node: NodeId) {
        let mut nodes = self.nodes.lock();
        Self::detach(&mut nodes, node);
        Self::drop_subtree(&mut nodes, node);
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.nodes
            .lock()
            .get(&node)
            .map_or(0, |data| data.children.len())
    }

    fn clear_children(&self, node: NodeId) {
        let mut nodes = self.nodes.lock();
        let children = nodes
            .get(&node)
            .map(|data| data.children.clone())
            .unwrap_or_default();
        for child in children {
            Self::drop_subtree(&mut nodes, child);
        }
        if let Some(data) = nodes.get_mut(&node) {
            data.children.clear();
        }
    }

    fn scroll_to_bottom(&self, node: NodeId) {
        self.scrolled.lock().push(node);
    }
}
