// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The scene graph: node storage, hierarchy, world transforms and traversal.

use glam::Affine3A;

use crate::error::SceneError;
use crate::shape::Shape;
use crate::types::{
    EventKinds, NodeFlags, NodeId, PointerEvents, PointerEventsType, PointerPolicy, SceneNode,
    Transform,
};

/// Token returned by [`Scene::add_listener`], used to remove that registration again.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerToken(u32);

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: SceneNode,
    world: Affine3A,
    listeners: Vec<(ListenerToken, EventKinds)>,
    dirty: bool,
}

impl Node {
    fn new(generation: u32, local: SceneNode) -> Self {
        Self {
            generation,
            parent: None,
            children: Vec::new(),
            local,
            world: Affine3A::IDENTITY,
            listeners: Vec::new(),
            dirty: true,
        }
    }

    fn listener_kinds(&self) -> EventKinds {
        self.listeners
            .iter()
            .fold(EventKinds::empty(), |acc, (_, kinds)| acc | *kinds)
    }
}

/// A hierarchy of nodes with local transforms, shapes and pointer policies.
///
/// World transforms are cached and refreshed by [`Scene::commit`]; call it after
/// mutating transforms and before hit testing.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<Option<Node>>,
    free_list: Vec<usize>,
    roots: Vec<NodeId>,
    next_listener: u32,
    epoch: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("roots", &self.roots.len())
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new node as a child of `parent` (or as a root if `None`).
    ///
    /// A stale `parent` inserts the node as a root.
    pub fn insert(&mut self, parent: Option<NodeId>, local: SceneNode) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.nodes[idx].as_ref().map_or(0, |n| n.generation) + 1;
            self.nodes[idx] = Some(Node::new(generation, local));
            (idx, generation)
        } else {
            self.nodes.push(Some(Node::new(1, local)));
            (self.nodes.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId indices are 32-bit."
        )]
        let id = NodeId::new(idx as u32, generation);
        match parent {
            Some(p) if self.is_alive(p) => self.link_parent(id, p),
            Some(p) => {
                log::warn!("insert under stale parent {p:?}; inserting {id:?} as a root");
                self.roots.push(id);
            }
            None => self.roots.push(id),
        }
        id
    }

    /// Remove a node and its subtree. Returns the removed ids, parents first.
    pub fn remove(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut removed = Vec::new();
        if !self.is_alive(id) {
            return removed;
        }
        match self.node(id).parent {
            Some(parent) => self.unlink_parent(id, parent),
            None => self.roots.retain(|r| *r != id),
        }
        self.remove_subtree(id, &mut removed);
        log::debug!("removed {} node(s) rooted at {id:?}", removed.len());
        removed
    }

    fn remove_subtree(&mut self, id: NodeId, removed: &mut Vec<NodeId>) {
        removed.push(id);
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.remove_subtree(child, removed);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Move `id` under `new_parent` (or make it a root).
    ///
    /// A node has exactly one parent at a time; the previous link is dropped.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.is_alive(id) {
            return Err(SceneError::Stale(id));
        }
        if let Some(p) = new_parent {
            if !self.is_alive(p) {
                return Err(SceneError::Stale(p));
            }
            if self.is_ancestor_or_self(id, p) {
                return Err(SceneError::Cycle {
                    node: id,
                    parent: p,
                });
            }
        }
        match self.node(id).parent {
            Some(parent) => self.unlink_parent(id, parent),
            None => self.roots.retain(|r| *r != id),
        }
        match new_parent {
            Some(p) => self.link_parent(id, p),
            None => self.roots.push(id),
        }
        self.node_mut(id).dirty = true;
        Ok(())
    }

    /// Update the local transform.
    pub fn set_transform(&mut self, id: NodeId, transform: Transform) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.transform = transform;
            node.dirty = true;
        }
    }

    /// Update the collision shape.
    pub fn set_shape(&mut self, id: NodeId, shape: Option<Shape>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.shape = shape;
        }
    }

    /// Update the pointer participation (`None` inherits).
    pub fn set_pointer_events(&mut self, id: NodeId, value: Option<PointerEvents>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.pointer_events = value;
        }
    }

    /// Update the accepted pointer types (`None` inherits).
    pub fn set_pointer_events_type(&mut self, id: NodeId, value: Option<PointerEventsType>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.pointer_events_type = value;
        }
    }

    /// Update the hit priority (`None` inherits).
    pub fn set_pointer_events_order(&mut self, id: NodeId, value: Option<i32>) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.pointer_events_order = value;
        }
    }

    /// Update flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        if let Some(node) = self.node_opt_mut(id) {
            node.local.flags = flags;
        }
    }

    /// Record that something listens to `kinds` on `id`.
    ///
    /// Listening nodes (and their descendants) become pointer targets under the
    /// `Listener` policies. Returns `None` for a stale id.
    pub fn add_listener(&mut self, id: NodeId, kinds: EventKinds) -> Option<ListenerToken> {
        let token = ListenerToken(self.next_listener);
        let node = self.node_opt_mut(id)?;
        node.listeners.push((token, kinds));
        self.next_listener = self.next_listener.wrapping_add(1);
        Some(token)
    }

    /// Drop a registration made by [`Scene::add_listener`].
    pub fn remove_listener(&mut self, id: NodeId, token: ListenerToken) -> bool {
        let Some(node) = self.node_opt_mut(id) else {
            return false;
        };
        let before = node.listeners.len();
        node.listeners.retain(|(t, _)| *t != token);
        node.listeners.len() != before
    }

    /// Union of the event kinds registered on `id`.
    pub fn listeners(&self, id: NodeId) -> EventKinds {
        self.node_opt(id)
            .map_or(EventKinds::empty(), Node::listener_kinds)
    }

    /// Refresh cached world transforms of every dirty node and its descendants.
    ///
    /// Returns the number of nodes whose world transform was recomputed.
    pub fn commit(&mut self) -> usize {
        self.epoch = self.epoch.wrapping_add(1);
        let mut updated = 0;
        for root in self.roots.clone() {
            self.update_world_recursive(root, Affine3A::IDENTITY, false, &mut updated);
        }
        log::trace!("scene commit {}: {updated} node(s) updated", self.epoch);
        updated
    }

    fn update_world_recursive(
        &mut self,
        id: NodeId,
        parent_world: Affine3A,
        parent_changed: bool,
        updated: &mut usize,
    ) {
        let (world, changed, children) = {
            let node = self.node_mut(id);
            let changed = parent_changed || node.dirty;
            if changed {
                node.world = parent_world * node.local.transform.to_affine();
                node.dirty = false;
                *updated += 1;
            }
            (node.world, changed, node.children.clone())
        };
        for child in children {
            self.update_world_recursive(child, world, changed, updated);
        }
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node_opt(id).is_some()
    }

    /// Root nodes in insertion order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Parent of a live node.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id)?.parent
    }

    /// Children of a live node, in insertion order. Empty for stale ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Local data of a live node.
    pub fn local(&self, id: NodeId) -> Option<&SceneNode> {
        self.node_opt(id).map(|n| &n.local)
    }

    /// Local transform of a live node.
    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.local(id).map(|l| l.transform)
    }

    /// Cached local→world transform as of the last [`Scene::commit`].
    pub fn world_transform(&self, id: NodeId) -> Option<Affine3A> {
        self.node_opt(id).map(|n| n.world)
    }

    /// World transform of the parent space of `id` (identity for roots).
    pub fn parent_world_transform(&self, id: NodeId) -> Option<Affine3A> {
        let node = self.node_opt(id)?;
        Some(match node.parent {
            Some(p) => self.node(p).world,
            None => Affine3A::IDENTITY,
        })
    }

    /// Path from the root to `id` (inclusive). Empty for stale ids.
    pub fn path_to_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.is_alive(id) {
            return out;
        }
        let mut cur = id;
        loop {
            out.push(cur);
            match self.node(cur).parent {
                Some(p) => cur = p,
                None => break,
            }
        }
        out.reverse();
        out
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent_of(id);
        }
        false
    }

    /// Effective pointer policy of a live node, resolved through its ancestors.
    pub fn policy_of(&self, id: NodeId) -> Option<PointerPolicy> {
        let path = self.path_to_root(id);
        if path.is_empty() {
            return None;
        }
        Some(path.iter().fold(PointerPolicy::ROOT, |policy, n| {
            let node = self.node(*n);
            policy.inherit(&node.local, node.listener_kinds())
        }))
    }

    /// Visit every visible node depth first in scene-graph order, together with
    /// its resolved pointer policy. Invisible nodes are skipped with their subtree.
    pub fn visit(&self, mut f: impl FnMut(NodeId, &SceneNode, &PointerPolicy)) {
        for &root in &self.roots {
            self.visit_recursive(root, PointerPolicy::ROOT, &mut f);
        }
    }

    fn visit_recursive(
        &self,
        id: NodeId,
        parent_policy: PointerPolicy,
        f: &mut impl FnMut(NodeId, &SceneNode, &PointerPolicy),
    ) {
        let node = self.node(id);
        if !node.local.flags.contains(NodeFlags::VISIBLE) {
            return;
        }
        let policy = parent_policy.inherit(&node.local, node.listener_kinds());
        f(id, &node.local, &policy);
        for &child in &node.children {
            self.visit_recursive(child, policy, f);
        }
    }

    // --- internals ---

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn link_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.push(id);
        self.node_mut(id).parent = Some(parent);
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        self.node_mut(parent).children.retain(|c| *c != id);
        self.node_mut(id).parent = None;
    }
}
