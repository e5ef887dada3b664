// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event propagation and listener execution.
//!
//! ## Overview
//!
//! [`propagation`] computes the capture → target → bubble sequence of one
//! [`PointerEvent`] from the scene hierarchy. Non-bubbling kinds (`Enter`,
//! `Leave`) only visit the target.
//!
//! [`Listeners`] stores boxed handlers per node and walks that sequence:
//! - capture-phase handlers run during [`Phase::Capture`] and at the target,
//! - regular handlers run at the target and during [`Phase::Bubble`],
//! - [`Outcome::Stop`] skips the rest of the current phase,
//! - [`Outcome::StopAndConsume`] aborts every remaining phase and marks the event consumed.
//!
//! Registering a handler also registers the node as listening in the [`Scene`],
//! which is what makes it a pointer target under the `Listener` policies.

use std::collections::BTreeMap;

use reticle_scene::{EventKinds, ListenerToken, NodeId, Scene};

use crate::capture::CaptureRegistry;
use crate::types::PointerEvent;

/// Phases of event propagation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Root-to-parent traversal.
    Capture,
    /// The target node.
    Target,
    /// Parent-to-root traversal.
    Bubble,
}

/// Handler outcome controlling propagation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Continue within the current phase.
    Continue,
    /// Stop propagation within the current phase.
    Stop,
    /// Stop every remaining phase and mark the event consumed.
    StopAndConsume,
}

/// One step of a propagation sequence.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Step {
    /// Phase of this step.
    pub phase: Phase,
    /// Node visited.
    pub node: NodeId,
}

/// Capture → target → bubble steps for an event addressed to `target`.
///
/// Empty if `target` is not alive.
pub fn propagation(scene: &Scene, target: NodeId, bubbles: bool) -> Vec<Step> {
    let path = scene.path_to_root(target);
    let Some((&target, ancestors)) = path.split_last() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(if bubbles { path.len() * 2 - 1 } else { 1 });
    if bubbles {
        out.extend(ancestors.iter().map(|&node| Step {
            phase: Phase::Capture,
            node,
        }));
    }
    out.push(Step {
        phase: Phase::Target,
        node: target,
    });
    if bubbles {
        out.extend(ancestors.iter().rev().map(|&node| Step {
            phase: Phase::Bubble,
            node,
        }));
    }
    out
}

/// What a handler sees besides the event itself.
#[derive(Debug)]
pub struct EventContext<'a> {
    scene: &'a Scene,
    captures: &'a mut CaptureRegistry,
    event: &'a PointerEvent,
    current: NodeId,
    phase: Phase,
}

impl EventContext<'_> {
    /// Node whose handler is running.
    pub fn current_target(&self) -> NodeId {
        self.current
    }

    /// Phase of the running handler.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The scene, read-only during dispatch.
    pub fn scene(&self) -> &Scene {
        self.scene
    }

    /// Capture the event's pointer to `target`.
    pub fn set_pointer_capture(&mut self, target: NodeId) -> bool {
        self.captures.capture(
            self.scene,
            self.event.pointer_id,
            self.event.pointer_type,
            target,
        )
    }

    /// Release the event's pointer if `target` holds its capture.
    pub fn release_pointer_capture(&mut self, target: NodeId) -> bool {
        self.captures.release_if(self.event.pointer_id, target)
    }

    /// Returns true if `target` holds the capture of the event's pointer.
    pub fn has_pointer_capture(&self, target: NodeId) -> bool {
        self.captures.get(self.event.pointer_id) == Some(target)
    }
}

/// Boxed event handler.
pub type Handler = Box<dyn FnMut(&PointerEvent, &mut EventContext<'_>) -> Outcome>;

struct Entry {
    token: ListenerToken,
    kinds: EventKinds,
    use_capture: bool,
    handler: Handler,
}

/// Result of [`Listeners::dispatch`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Dispatched {
    /// Number of handlers invoked.
    pub delivered: usize,
    /// True if a handler returned [`Outcome::StopAndConsume`].
    pub consumed: bool,
}

/// Handlers registered per node.
#[derive(Default)]
pub struct Listeners {
    entries: BTreeMap<NodeId, Vec<Entry>>,
}

impl core::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let handlers: usize = self.entries.values().map(Vec::len).sum();
        f.debug_struct("Listeners")
            .field("nodes", &self.entries.len())
            .field("handlers", &handlers)
            .finish()
    }
}

impl Listeners {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a target/bubble-phase handler for `kinds` on `node`.
    pub fn add(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        kinds: EventKinds,
        handler: impl FnMut(&PointerEvent, &mut EventContext<'_>) -> Outcome + 'static,
    ) -> Option<ListenerToken> {
        self.insert(scene, node, kinds, false, Box::new(handler))
    }

    /// Register a capture-phase handler for `kinds` on `node`.
    pub fn add_capture(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        kinds: EventKinds,
        handler: impl FnMut(&PointerEvent, &mut EventContext<'_>) -> Outcome + 'static,
    ) -> Option<ListenerToken> {
        self.insert(scene, node, kinds, true, Box::new(handler))
    }

    fn insert(
        &mut self,
        scene: &mut Scene,
        node: NodeId,
        kinds: EventKinds,
        use_capture: bool,
        handler: Handler,
    ) -> Option<ListenerToken> {
        let token = scene.add_listener(node, kinds)?;
        self.entries.entry(node).or_default().push(Entry {
            token,
            kinds,
            use_capture,
            handler,
        });
        Some(token)
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn remove(&mut self, scene: &mut Scene, node: NodeId, token: ListenerToken) -> bool {
        scene.remove_listener(node, token);
        let Some(list) = self.entries.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| e.token != token);
        let removed = list.len() != before;
        if list.is_empty() {
            self.entries.remove(&node);
        }
        removed
    }

    /// Drop the handlers of removed nodes.
    pub fn prune(&mut self, scene: &Scene) {
        self.entries.retain(|node, _| scene.is_alive(*node));
    }

    /// Propagate `event` and run the matching handlers.
    pub fn dispatch(
        &mut self,
        scene: &Scene,
        captures: &mut CaptureRegistry,
        event: &PointerEvent,
    ) -> Dispatched {
        let mut result = Dispatched::default();
        let flag = event.kind.as_flag();
        let steps = propagation(scene, event.target, event.kind.bubbles());
        let mut stopped: Option<Phase> = None;
        for step in steps {
            if stopped == Some(step.phase) {
                continue;
            }
            let Some(list) = self.entries.get_mut(&step.node) else {
                continue;
            };
            let mut ctx = EventContext {
                scene,
                captures: &mut *captures,
                event,
                current: step.node,
                phase: step.phase,
            };
            for entry in list.iter_mut() {
                let runs = match step.phase {
                    Phase::Capture => entry.use_capture,
                    Phase::Target => true,
                    Phase::Bubble => !entry.use_capture,
                };
                if !runs || !entry.kinds.intersects(flag) {
                    continue;
                }
                result.delivered += 1;
                match (entry.handler)(event, &mut ctx) {
                    Outcome::Continue => {}
                    Outcome::Stop => stopped = Some(step.phase),
                    Outcome::StopAndConsume => {
                        result.consumed = true;
                        return result;
                    }
                }
            }
        }
        result
    }
}
