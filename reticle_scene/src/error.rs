// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::NodeId;

/// Errors from structural scene mutations.
///
/// Attribute setters silently ignore stale handles; only operations that could
/// corrupt the tree report an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// The handle refers to a removed node.
    #[error("node {0:?} is not alive")]
    Stale(NodeId),
    /// Reparenting would make a node its own ancestor.
    #[error("cannot parent {node:?} under its descendant {parent:?}")]
    Cycle {
        /// Node being moved.
        node: NodeId,
        /// Requested parent.
        parent: NodeId,
    },
}
