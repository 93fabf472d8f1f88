//! The document graph
//!
//! A flat store of typed nodes addressed by id, with ordered ownership
//! expressed through `Value::Ids` properties. The graph exposes exactly
//! the mutation surface the editing engine drives through operations:
//! create/delete a node, set a property, and positional edits on ordered
//! id collections. A parent index is kept in sync with `Ids` membership
//! so container roots can be resolved without scanning.
//!
//! Id references may dangle forward: a collection can reference a node
//! that is created later in the same operation sequence. Readers resolve
//! lazily and treat dangling ids as unresolvable. Edits that would make
//! a node transitively own itself are rejected before anything mutates.

use std::collections::HashMap;

use crate::errors::ModelError;
use crate::node::{Node, NodeId, Value};
use crate::path::Path;
use crate::schema::Schema;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentGraph {
    schema: Schema,
    nodes: HashMap<NodeId, Node>,
    parents: HashMap<NodeId, NodeId>,
}

impl DocumentGraph {
    pub fn new(schema: Schema) -> Self {
        DocumentGraph {
            schema,
            nodes: HashMap::new(),
            parents: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_strict(&self, id: &str) -> Result<&Node, ModelError> {
        self.nodes
            .get(id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))
    }

    /// The value at a property path, if the node and property both exist.
    pub fn value(&self, path: &Path) -> Option<&Value> {
        if !path.is_property() {
            return None;
        }
        self.get(path.node_id())?.property(path.property_name()?)
    }

    /// Inserts a new node. Links any `Ids` properties into the parent
    /// index (the referenced children need not exist yet) and, when a
    /// live collection already lists the new id, links the node to that
    /// owner.
    pub fn create(&mut self, node: Node) -> Result<(), ModelError> {
        if self.contains(&node.id) {
            return Err(ModelError::DuplicateNode(node.id));
        }
        let owner = self.owner_of(&node.id);
        for value in node.properties.values() {
            if let Value::Ids(children) = value {
                for child in children {
                    let cyclic = child == &node.id
                        || owner
                            .as_deref()
                            .map_or(false, |parent| self.would_create_cycle(child, parent));
                    if cyclic {
                        return Err(ModelError::CycleDetected {
                            id: child.clone(),
                            container: node.id.clone(),
                        });
                    }
                }
            }
        }
        if let Some(owner) = owner {
            self.parents.insert(node.id.clone(), owner);
        }
        for value in node.properties.values() {
            if let Value::Ids(children) = value {
                for child in children {
                    self.parents.insert(child.clone(), node.id.clone());
                }
            }
        }
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Removes a node and returns it. Children the node owned lose their
    /// parent link, and so does the node itself; its id may still be
    /// listed by the owning collection and must be removed separately.
    pub fn delete(&mut self, id: &str) -> Result<Node, ModelError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| ModelError::NodeNotFound(id.to_string()))?;
        for value in node.properties.values() {
            if let Value::Ids(children) = value {
                for child in children {
                    if self.parents.get(child).map(String::as_str) == Some(id) {
                        self.parents.remove(child);
                    }
                }
            }
        }
        self.parents.remove(id);
        Ok(node)
    }

    /// Sets a property, returning the previous value (`Null` when the
    /// property was absent). Swapping an `Ids` value relinks the parent
    /// index on both sides.
    pub fn set(&mut self, path: &Path, value: Value) -> Result<Value, ModelError> {
        let name = match (path.is_property(), path.property_name()) {
            (true, Some(name)) => name.to_string(),
            _ => return Err(ModelError::InvalidPath(path.clone())),
        };
        let owner = path.node_id().to_string();
        self.get_strict(&owner)?;
        if let Value::Ids(children) = &value {
            for child in children {
                if self.would_create_cycle(child, &owner) {
                    return Err(ModelError::CycleDetected {
                        id: child.clone(),
                        container: owner,
                    });
                }
            }
        }
        let node = self
            .nodes
            .get_mut(&owner)
            .ok_or_else(|| ModelError::NodeNotFound(owner.clone()))?;
        let old = node.set_property(name, value.clone());

        if let Value::Ids(old_children) = &old {
            for child in old_children {
                if self.parents.get(child) == Some(&owner) {
                    self.parents.remove(child);
                }
            }
        }
        if let Value::Ids(children) = &value {
            for child in children {
                self.parents.insert(child.clone(), owner.clone());
            }
        }
        Ok(old)
    }

    pub fn ids(&self, path: &Path) -> Result<&[NodeId], ModelError> {
        self.get_strict(path.node_id())?;
        self.value(path)
            .and_then(Value::as_ids)
            .ok_or_else(|| ModelError::MissingCollection(path.clone()))
    }

    pub fn text(&self, path: &Path) -> Result<&str, ModelError> {
        self.get_strict(path.node_id())?;
        self.value(path)
            .and_then(Value::as_text)
            .ok_or_else(|| ModelError::NotTextProperty(path.clone()))
    }

    /// Length of the text at `path`, counted in characters.
    pub fn text_len(&self, path: &Path) -> Result<usize, ModelError> {
        Ok(self.text(path)?.chars().count())
    }

    /// Inserts `id` at `index` of the ordered collection at `path`.
    /// Entries that would own one of their own ancestors are rejected.
    pub fn insert_at(&mut self, path: &Path, index: usize, id: NodeId) -> Result<(), ModelError> {
        let owner = path.node_id().to_string();
        let len = self.ids(path)?.len();
        if index > len {
            return Err(ModelError::IndexOutOfBounds {
                path: path.clone(),
                index,
                len,
            });
        }
        if self.would_create_cycle(&id, &owner) {
            return Err(ModelError::CycleDetected {
                id,
                container: owner,
            });
        }
        let entries = self.ids_mut(path)?;
        entries.insert(index, id.clone());
        self.parents.insert(id, owner);
        Ok(())
    }

    /// Removes and returns the entry at `index` of the collection at
    /// `path`.
    pub fn remove_at(&mut self, path: &Path, index: usize) -> Result<NodeId, ModelError> {
        let owner = path.node_id().to_string();
        let entries = self.ids_mut(path)?;
        if index >= entries.len() {
            return Err(ModelError::IndexOutOfBounds {
                path: path.clone(),
                index,
                len: entries.len(),
            });
        }
        let removed = entries.remove(index);
        if self.parents.get(&removed) == Some(&owner) {
            self.parents.remove(&removed);
        }
        Ok(removed)
    }

    pub fn append(&mut self, path: &Path, id: NodeId) -> Result<(), ModelError> {
        let index = self.ids(path)?.len();
        self.insert_at(path, index, id)
    }

    /// Position of `id` in the collection at `container_path`.
    pub fn position_of(&self, container_path: &Path, id: &str) -> Option<usize> {
        self.ids(container_path)
            .ok()?
            .iter()
            .position(|entry| entry == id)
    }

    /// The id of the node whose `Ids` property currently owns `id`.
    pub fn parent(&self, id: &str) -> Option<&NodeId> {
        self.parents.get(id)
    }

    /// Climbs the ownership chain from `id` to the entry of
    /// `container_path` that transitively owns it. A list item's root is
    /// its list; a top-level node is its own root.
    pub fn container_root(&self, container_path: &Path, id: &str) -> Option<NodeId> {
        let entries = self.ids(container_path).ok()?;
        let mut current = id.to_string();
        // Ownership chains are short; the cap only guards broken links.
        for _ in 0..=self.nodes.len() {
            if entries.iter().any(|entry| *entry == current) {
                return Some(current);
            }
            current = self.parents.get(&current)?.clone();
        }
        None
    }

    // True when linking `child` under `owner` would make `child` an
    // ancestor of itself.
    fn would_create_cycle(&self, child: &str, owner: &str) -> bool {
        let mut current = owner;
        // Ownership chains are short; the cap only guards broken links.
        for _ in 0..=self.nodes.len() {
            if current == child {
                return true;
            }
            match self.parents.get(current) {
                Some(parent) => current = parent.as_str(),
                None => return false,
            }
        }
        false
    }

    // The live node whose `Ids` property lists `id`, if any.
    fn owner_of(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().find_map(|(owner, node)| {
            let listed = node.properties.values().any(|value| {
                matches!(value, Value::Ids(children) if children.iter().any(|child| child == id))
            });
            listed.then(|| owner.clone())
        })
    }

    fn ids_mut(&mut self, path: &Path) -> Result<&mut Vec<NodeId>, ModelError> {
        let name = match (path.is_property(), path.property_name()) {
            (true, Some(name)) => name.to_string(),
            _ => return Err(ModelError::InvalidPath(path.clone())),
        };
        let node = self
            .nodes
            .get_mut(path.node_id())
            .ok_or_else(|| ModelError::NodeNotFound(path.node_id().to_string()))?;
        match node.properties.get_mut(&name) {
            Some(Value::Ids(entries)) => Ok(entries),
            _ => Err(ModelError::MissingCollection(path.clone())),
        }
    }
}
