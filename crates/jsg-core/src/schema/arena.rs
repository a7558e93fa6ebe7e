use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::SchemaType;

/// Handle to a node in a [`SchemaArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A value stored under a key of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Value(Value),
    Node(NodeId),
    List(Vec<Slot>),
}

impl From<NodeId> for Slot {
    fn from(id: NodeId) -> Self {
        Slot::Node(id)
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::Value(value)
    }
}

#[derive(Debug, Default)]
struct Node {
    entries: IndexMap<String, Slot>,
}

/// Owns every schema node built during one generation.
///
/// Nodes are ordered key/slot maps addressed by [`NodeId`]. A node can be
/// attached to its parent before it is populated, which is what lets a
/// definition be registered and then filled in while recursive visits refer
/// back to it.
#[derive(Debug, Default)]
pub struct SchemaArena {
    nodes: Vec<Node>,
}

impl SchemaArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn put(&mut self, id: NodeId, key: &str, value: impl Into<Value>) {
        self.node_mut(id)
            .entries
            .insert(key.to_string(), Slot::Value(value.into()));
    }

    pub fn put_type(&mut self, id: NodeId, ty: SchemaType) {
        self.put(id, "type", ty.as_str());
    }

    pub fn get(&self, id: NodeId, key: &str) -> Option<&Slot> {
        self.node(id).entries.get(key)
    }

    /// The string stored under `key`, if any.
    pub fn get_str(&self, id: NodeId, key: &str) -> Option<&str> {
        match self.get(id, key) {
            Some(Slot::Value(Value::String(s))) => Some(s),
            _ => None,
        }
    }

    pub fn contains(&self, id: NodeId, key: &str) -> bool {
        self.node(id).entries.contains_key(key)
    }

    pub fn is_empty(&self, id: NodeId) -> bool {
        self.node(id).entries.is_empty()
    }

    pub fn attach(&mut self, parent: NodeId, key: &str, child: NodeId) {
        self.node_mut(parent)
            .entries
            .insert(key.to_string(), Slot::Node(child));
    }

    /// The object child under `key`, created (or replacing a non-object)
    /// when missing.
    pub fn child(&mut self, parent: NodeId, key: &str) -> NodeId {
        if let Some(Slot::Node(existing)) = self.get(parent, key) {
            return *existing;
        }
        let child = self.create();
        self.attach(parent, key, child);
        child
    }

    /// Append to the list under `key`, creating the list when missing.
    pub fn append(&mut self, parent: NodeId, key: &str, item: impl Into<Slot>) {
        let item = item.into();
        let entries = &mut self.node_mut(parent).entries;
        match entries.get_mut(key) {
            Some(Slot::List(items)) => items.push(item),
            _ => {
                entries.insert(key.to_string(), Slot::List(vec![item]));
            }
        }
    }

    /// Make sure a list exists under `key`, leaving an existing one alone.
    pub fn list(&mut self, parent: NodeId, key: &str) {
        let entries = &mut self.node_mut(parent).entries;
        if !matches!(entries.get(key), Some(Slot::List(_))) {
            entries.insert(key.to_string(), Slot::List(Vec::new()));
        }
    }

    /// Whether the list under `key` holds the string `value`.
    pub fn list_contains(&self, id: NodeId, key: &str, value: &str) -> bool {
        match self.get(id, key) {
            Some(Slot::List(items)) => items
                .iter()
                .any(|i| matches!(i, Slot::Value(Value::String(s)) if s == value)),
            _ => false,
        }
    }

    pub fn clear(&mut self, id: NodeId) {
        self.node_mut(id).entries.clear();
    }

    /// Deep-merge `update` into the node: object fields merge recursively,
    /// anything else is overwritten. Non-object updates are ignored.
    pub fn merge(&mut self, id: NodeId, update: &Value) {
        let Value::Object(fields) = update else {
            return;
        };
        for (key, value) in fields {
            match self.node_mut(id).entries.get_mut(key) {
                Some(Slot::Node(child)) => {
                    let child = *child;
                    self.merge(child, value);
                }
                Some(Slot::Value(existing @ Value::Object(_))) => merge_value(existing, value),
                _ => {
                    self.node_mut(id)
                        .entries
                        .insert(key.clone(), Slot::Value(value.clone()));
                }
            }
        }
    }

    /// Render a node and everything below it as plain JSON.
    pub fn render(&self, id: NodeId) -> Value {
        let mut map = Map::new();
        for (key, slot) in &self.node(id).entries {
            map.insert(key.clone(), self.render_slot(slot));
        }
        Value::Object(map)
    }

    fn render_slot(&self, slot: &Slot) -> Value {
        match slot {
            Slot::Value(v) => v.clone(),
            Slot::Node(id) => self.render(*id),
            Slot::List(items) => Value::Array(items.iter().map(|i| self.render_slot(i)).collect()),
        }
    }
}

/// [`SchemaArena::merge`] for plain JSON values.
pub fn merge_value(main: &mut Value, update: &Value) {
    let (Value::Object(main), Value::Object(update)) = (main, update) else {
        return;
    };
    for (key, value) in update {
        match main.get_mut(key) {
            Some(existing @ Value::Object(_)) => merge_value(existing, value),
            _ => {
                main.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_attach_before_populate() {
        let mut arena = SchemaArena::new();
        let root = arena.create();
        let child = arena.create();
        arena.attach(root, "items", child);
        arena.put_type(child, SchemaType::String);
        assert_eq!(arena.render(root), json!({"items": {"type": "string"}}));
    }

    #[test]
    fn test_append_creates_list() {
        let mut arena = SchemaArena::new();
        let root = arena.create();
        arena.append(root, "required", json!("a"));
        arena.append(root, "required", json!("b"));
        assert!(arena.list_contains(root, "required", "b"));
        assert!(!arena.list_contains(root, "required", "c"));
        assert_eq!(arena.render(root), json!({"required": ["a", "b"]}));
    }

    #[test]
    fn test_merge_recurses_into_objects() {
        let mut arena = SchemaArena::new();
        let root = arena.create();
        arena.put(root, "type", "string");
        let options = arena.child(root, "options");
        arena.put(options, "hidden", true);
        arena.put(root, "extra", json!({"a": 1, "b": {"c": 2}}));

        arena.merge(
            root,
            &json!({
                "type": "integer",
                "options": {"collapsed": true},
                "extra": {"b": {"d": 3}},
                "pattern": "x"
            }),
        );

        assert_eq!(
            arena.render(root),
            json!({
                "type": "integer",
                "options": {"hidden": true, "collapsed": true},
                "extra": {"a": 1, "b": {"c": 2, "d": 3}},
                "pattern": "x"
            })
        );
    }

    #[test]
    fn test_merge_ignores_scalar_onto_object() {
        let mut main = json!({"a": {"b": 1}});
        merge_value(&mut main, &json!({"a": 5}));
        assert_eq!(main, json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_clear_keeps_attachment() {
        let mut arena = SchemaArena::new();
        let root = arena.create();
        let child = arena.child(root, "x");
        arena.put(child, "type", "object");
        arena.clear(child);
        arena.put(child, "const", 1);
        assert_eq!(arena.render(root), json!({"x": {"const": 1}}));
    }
}
