//! Transform hierarchy
//!
//! Every entity owns exactly one node in the scene's [`TransformTree`]. The
//! tree stores each node's local [`Pose`] plus non-owning parent/child links
//! and a lazily recomputed world matrix.
//!
//! # Invariants
//!
//! - A child's parent always lists that child, and vice versa.
//! - The tree never contains a cycle; [`TransformTree::set_parent`] rejects
//!   any link that would create one.
//! - A clean cached world matrix equals `parent.world * local` (or `local`
//!   for a root). Any local mutation or re-parent dirties the node and its
//!   whole subtree; the next read recomputes.
//!
//! Non-uniform scale is permitted but does not compose correctly under
//! rotation for descendants (the resulting shear is not representable in a
//! [`Pose`]).

use std::cell::Cell;

use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use thiserror::Error;

use crate::foundation::math::{quat_from_euler, Mat4, Point3, Pose, Quat, Vec3, FORWARD, RIGHT, UP};

new_key_type! {
    /// Stable handle to a node in a [`TransformTree`]
    pub struct TransformId;
}

/// Coordinate frame a relative operation is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    /// Relative to the node's parent (or its own axes, for rotations)
    #[default]
    Local,
    /// Relative to the global frame
    World,
}

/// What happens to a node's local pose when it changes parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReparentPolicy {
    /// Recompute the local pose so the world pose is unchanged
    #[default]
    PreserveWorld,
    /// Keep the local pose; the node moves with its new parent
    KeepLocal,
    /// Reset to identity relative to the new parent
    ResetLocal,
}

/// Hierarchy mutation failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyError {
    /// A handle does not refer to a live node
    #[error("transform node does not exist")]
    UnknownNode,

    /// The requested parent is the node itself or one of its descendants
    #[error("re-parenting would create a cycle")]
    WouldCycle,

    /// A parent's world matrix has no inverse (zero scale)
    #[error("parent world matrix is not invertible")]
    Singular,
}

#[derive(Debug)]
struct TransformNode {
    local: Pose,
    parent: Option<TransformId>,
    children: Vec<TransformId>,
    world: Cell<Mat4>,
    dirty: Cell<bool>,
}

impl TransformNode {
    fn new(local: Pose) -> Self {
        Self {
            local,
            parent: None,
            children: Vec::new(),
            world: Cell::new(Mat4::identity()),
            dirty: Cell::new(true),
        }
    }
}

/// Arena of transform nodes forming a forest
#[derive(Debug, Default)]
pub struct TransformTree {
    nodes: SlotMap<TransformId, TransformNode>,
    policy: ReparentPolicy,
    revision: u64,
}

impl TransformTree {
    /// Create an empty tree with the given re-parent policy
    pub fn new(policy: ReparentPolicy) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            policy,
            revision: 0,
        }
    }

    /// Insert a new root node
    pub fn insert(&mut self, local: Pose) -> TransformId {
        self.revision += 1;
        self.nodes.insert(TransformNode::new(local))
    }

    /// Remove a node, detaching it from its parent
    ///
    /// Children are re-rooted and keep their world pose; destroying a parent
    /// never destroys its children.
    pub fn remove(&mut self, id: TransformId) -> Option<Pose> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        let children = self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            let world = self.compute_world(child);
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = None;
                node.local = Pose::from_matrix(&world);
            }
            self.mark_dirty(child);
        }

        self.unlink_from_parent(id);
        self.revision += 1;
        self.nodes.remove(id).map(|node| node.local)
    }

    /// Whether the handle refers to a live node
    pub fn contains(&self, id: TransformId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current re-parent policy
    pub fn policy(&self) -> ReparentPolicy {
        self.policy
    }

    /// Change the re-parent policy for subsequent `set_parent` calls
    pub fn set_policy(&mut self, policy: ReparentPolicy) {
        self.policy = policy;
    }

    /// Monotonic counter bumped by every applied mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Local pose of a node
    pub fn local(&self, id: TransformId) -> Option<&Pose> {
        self.nodes.get(id).map(|n| &n.local)
    }

    /// Parent of a node
    pub fn parent(&self, id: TransformId) -> Option<TransformId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node, in attachment order
    pub fn children(&self, id: TransformId) -> &[TransformId] {
        match self.nodes.get(id) {
            Some(node) => &node.children,
            None => &[],
        }
    }

    /// Number of ancestors (a root has depth 0)
    pub fn depth(&self, id: TransformId) -> usize {
        let mut depth = 0;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.parent(parent);
        }
        depth
    }

    /// Whether `node` sits somewhere below `ancestor`
    pub fn is_descendant_of(&self, node: TransformId, ancestor: TransformId) -> bool {
        let mut current = self.parent(node);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.parent(parent);
        }
        false
    }

    /// Composed world matrix, recomputed if dirty
    pub fn world_matrix(&self, id: TransformId) -> Option<Mat4> {
        self.nodes.contains_key(id).then(|| self.compute_world(id))
    }

    /// World-space position
    pub fn world_position(&self, id: TransformId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| Vec3::new(m.m14, m.m24, m.m34))
    }

    /// World-space rotation, composed from ancestor rotations only
    pub fn world_rotation(&self, id: TransformId) -> Option<Quat> {
        let node = self.nodes.get(id)?;
        let parent = node
            .parent
            .and_then(|p| self.world_rotation(p))
            .unwrap_or_else(Quat::identity);
        Some(parent * node.local.rotation)
    }

    /// World-space forward (-Z) direction
    pub fn forward(&self, id: TransformId) -> Option<Vec3> {
        self.world_rotation(id).map(|r| r * FORWARD)
    }

    /// World-space right (+X) direction
    pub fn right(&self, id: TransformId) -> Option<Vec3> {
        self.world_rotation(id).map(|r| r * RIGHT)
    }

    /// World-space up (+Y) direction
    pub fn up(&self, id: TransformId) -> Option<Vec3> {
        self.world_rotation(id).map(|r| r * UP)
    }

    /// Mutable view over one node
    pub fn node_mut(&mut self, id: TransformId) -> Option<TransformMut<'_>> {
        self.contains(id).then(|| TransformMut { tree: self, id })
    }

    /// Re-link `id` under `parent` (or make it a root with `None`)
    ///
    /// Rejects links that would form a cycle and leaves the tree untouched.
    /// The node's local pose afterwards is decided by the tree's
    /// [`ReparentPolicy`].
    pub fn set_parent(&mut self, id: TransformId, parent: Option<TransformId>) -> Result<(), HierarchyError> {
        if !self.contains(id) {
            return Err(HierarchyError::UnknownNode);
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(HierarchyError::UnknownNode);
            }
            if parent == id || self.is_descendant_of(parent, id) {
                log::warn!("Rejected re-parent: {:?} is {:?} or one of its descendants", parent, id);
                return Err(HierarchyError::WouldCycle);
            }
        }
        if self.parent(id) == parent {
            return Ok(());
        }

        let local = match self.policy {
            ReparentPolicy::PreserveWorld => {
                let world = self.compute_world(id);
                match parent {
                    Some(parent) => {
                        let inverse = self
                            .compute_world(parent)
                            .try_inverse()
                            .ok_or(HierarchyError::Singular)?;
                        Pose::from_matrix(&(inverse * world))
                    }
                    None => Pose::from_matrix(&world),
                }
            }
            ReparentPolicy::KeepLocal => self.nodes.get(id).map(|n| n.local).unwrap_or_default(),
            ReparentPolicy::ResetLocal => Pose::identity(),
        };

        self.unlink_from_parent(id);
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.push(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = parent;
            node.local = local;
        }
        self.mark_dirty(id);
        self.revision += 1;
        Ok(())
    }

    /// Apply `f` to the local pose of `id` and dirty its subtree
    pub fn modify_local<F>(&mut self, id: TransformId, f: F) -> bool
    where
        F: FnOnce(&mut Pose),
    {
        let Some(node) = self.nodes.get_mut(id) else {
            log::warn!("Transform {:?} does not exist; modification ignored", id);
            return false;
        };
        f(&mut node.local);
        self.mark_dirty(id);
        self.revision += 1;
        true
    }

    fn compute_world(&self, id: TransformId) -> Mat4 {
        let Some(node) = self.nodes.get(id) else {
            return Mat4::identity();
        };
        if node.dirty.get() {
            let local = node.local.to_matrix();
            let world = match node.parent {
                Some(parent) => self.compute_world(parent) * local,
                None => local,
            };
            node.world.set(world);
            node.dirty.set(false);
        }
        node.world.get()
    }

    fn parent_world_inverse(&self, id: TransformId) -> Result<Mat4, HierarchyError> {
        match self.parent(id) {
            Some(parent) => self.compute_world(parent).try_inverse().ok_or(HierarchyError::Singular),
            None => Ok(Mat4::identity()),
        }
    }

    fn unlink_from_parent(&mut self, id: TransformId) {
        if let Some(parent) = self.parent(id) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.children.retain(|&child| child != id);
            }
        }
    }

    fn mark_dirty(&self, id: TransformId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                node.dirty.set(true);
                stack.extend_from_slice(&node.children);
            }
        }
    }
}

/// Mutable view over one transform node
///
/// Mutations return `&mut Self` so calls can be chained.
pub struct TransformMut<'a> {
    tree: &'a mut TransformTree,
    id: TransformId,
}

impl<'a> TransformMut<'a> {
    /// Handle of the viewed node
    pub fn id(&self) -> TransformId {
        self.id
    }

    /// Local pose
    pub fn local(&self) -> Pose {
        self.tree.local(self.id).copied().unwrap_or_default()
    }

    /// World matrix
    pub fn world_matrix(&self) -> Mat4 {
        self.tree.world_matrix(self.id).unwrap_or_else(Mat4::identity)
    }

    /// World-space position
    pub fn position(&self) -> Vec3 {
        self.tree.world_position(self.id).unwrap_or_else(Vec3::zeros)
    }

    /// World-space rotation
    pub fn rotation(&self) -> Quat {
        self.tree.world_rotation(self.id).unwrap_or_else(Quat::identity)
    }

    /// World-space forward direction
    pub fn forward(&self) -> Vec3 {
        self.rotation() * FORWARD
    }

    /// World-space right direction
    pub fn right(&self) -> Vec3 {
        self.rotation() * RIGHT
    }

    /// World-space up direction
    pub fn up(&self) -> Vec3 {
        self.rotation() * UP
    }

    /// Set the local translation
    pub fn translate_to(&mut self, position: Vec3) -> &mut Self {
        self.tree.modify_local(self.id, |pose| pose.position = position);
        self
    }

    /// Offset the translation
    ///
    /// A world-space delta is mapped into the parent frame (undoing the
    /// parent's rotation and scale) so that repeated world moves compose
    /// the same way at any hierarchy depth.
    pub fn translate_by(&mut self, delta: Vec3, space: Space) -> &mut Self {
        let local_delta = match space {
            Space::Local => delta,
            Space::World => match self.tree.parent_world_inverse(self.id) {
                Ok(inverse) => inverse.transform_vector(&delta),
                Err(err) => {
                    log::warn!("World translation of {:?} skipped: {}", self.id, err);
                    return self;
                }
            },
        };
        self.tree.modify_local(self.id, |pose| pose.position += local_delta);
        self
    }

    /// Apply an incremental XYZ Euler rotation (radians)
    ///
    /// Local space post-multiplies (rotate about the node's own axes); world
    /// space pre-multiplies (rotate about the global axes).
    pub fn rotate_euler_by(&mut self, angles: Vec3, space: Space) -> &mut Self {
        self.rotate_by(quat_from_euler(angles), space)
    }

    /// Apply an incremental rotation
    pub fn rotate_by(&mut self, rotation: Quat, space: Space) -> &mut Self {
        let parent_rotation = self
            .tree
            .parent(self.id)
            .and_then(|p| self.tree.world_rotation(p))
            .unwrap_or_else(Quat::identity);
        self.tree.modify_local(self.id, |pose| {
            pose.rotation = match space {
                Space::Local => pose.rotation * rotation,
                Space::World => parent_rotation.inverse() * rotation * parent_rotation * pose.rotation,
            };
            pose.rotation.renormalize_fast();
        });
        self
    }

    /// Set the local rotation
    pub fn rotate_to(&mut self, rotation: Quat) -> &mut Self {
        self.tree.modify_local(self.id, |pose| pose.rotation = rotation);
        self
    }

    /// Set the local scale
    pub fn scale_to(&mut self, scale: Vec3) -> &mut Self {
        self.tree.modify_local(self.id, |pose| pose.scale = scale);
        self
    }

    /// Replace the whole local pose
    pub fn set_local(&mut self, local: Pose) -> &mut Self {
        self.tree.modify_local(self.id, |pose| *pose = local);
        self
    }

    /// Orient so that forward points at `target` (world space)
    pub fn look_at(&mut self, target: Vec3, up: Vec3) -> &mut Self {
        let eye = self.position();
        let direction = target - eye;
        if direction.norm_squared() <= f32::EPSILON {
            return self;
        }
        // face_towards aligns +Z, so aim it away from the target
        let world = Quat::face_towards(&-direction, &up);
        let parent_rotation = self
            .tree
            .parent(self.id)
            .and_then(|p| self.tree.world_rotation(p))
            .unwrap_or_else(Quat::identity);
        self.rotate_to(parent_rotation.inverse() * world)
    }

    /// Move under a new parent (see [`TransformTree::set_parent`])
    pub fn set_parent(&mut self, parent: Option<TransformId>) -> Result<&mut Self, HierarchyError> {
        self.tree.set_parent(self.id, parent)?;
        Ok(self)
    }

    /// Transform a local point into world space
    pub fn to_world_point(&self, point: Vec3) -> Vec3 {
        self.world_matrix().transform_point(&Point3::from(point)).coords
    }
}
