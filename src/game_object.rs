use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::physics::{Body, Collider};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RenderLayer {
    Background,
    Debris,
    Creatures,
    Rig,
    Foreground,
}

impl RenderLayer {
    pub const fn order(self) -> i32 {
        match self {
            Self::Background => 0,
            Self::Debris => 1,
            Self::Creatures => 2,
            Self::Rig => 3,
            Self::Foreground => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Fish,
    Turtle,
    Trash,
    Hook,
    Pivot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

/// Parent relation. The child's world pose is derived from the parent's pose
/// and these local values by [`compose_pose`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Attachment {
    pub parent: ObjectId,
    pub local_offset: Vec2,
    pub local_rotation: f32,
}

#[derive(Clone, Debug)]
pub struct GameObject2D {
    pub name: String,
    pub kind: ObjectKind,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub layer: RenderLayer,
    pub z_index: i32,
    pub attachment: Option<Attachment>,
    pub body: Option<Body>,
    pub collider: Option<Collider>,
    pub drift_enabled: bool,
}

impl GameObject2D {
    pub fn new(
        name: impl Into<String>,
        kind: ObjectKind,
        position: Vec2,
        layer: RenderLayer,
        z_index: i32,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            rotation: 0.0,
            scale: Vec2::ONE,
            layer,
            z_index,
            attachment: None,
            body: None,
            collider: None,
            drift_enabled: true,
        }
    }

    pub fn render_sort_key(&self) -> (i32, i32) {
        (self.layer.order(), self.z_index)
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_collider(mut self, collider: Collider) -> Self {
        self.collider = Some(collider);
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }
}

/// World pose of a child given its parent's world pose and its local pose.
pub fn compose_pose(
    parent_position: Vec2,
    parent_rotation: f32,
    local_offset: Vec2,
    local_rotation: f32,
) -> (Vec2, f32) {
    let rotated = Vec2::from_angle(parent_rotation).rotate(local_offset);
    (parent_position + rotated, parent_rotation + local_rotation)
}

/// Inverse of [`compose_pose`]: the local pose that keeps `world` unchanged.
pub fn decompose_pose(
    parent_position: Vec2,
    parent_rotation: f32,
    world_position: Vec2,
    world_rotation: f32,
) -> (Vec2, f32) {
    let local = Vec2::from_angle(-parent_rotation).rotate(world_position - parent_position);
    (local, world_rotation - parent_rotation)
}

// Parent chains deeper than this are treated as broken and left unresolved.
const MAX_ATTACHMENT_DEPTH: usize = 16;

/// Scene storage. Iteration is ordered by id so runs are reproducible.
#[derive(Default)]
pub struct SceneObjects {
    objects: BTreeMap<ObjectId, GameObject2D>,
    next_id: u32,
}

impl SceneObjects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, object: GameObject2D) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.objects.insert(id, object);
        id
    }

    /// Removes the object and detaches anything that was parented to it.
    pub fn despawn(&mut self, id: ObjectId) -> Option<GameObject2D> {
        let removed = self.objects.remove(&id)?;
        for object in self.objects.values_mut() {
            if object.attachment.is_some_and(|a| a.parent == id) {
                object.attachment = None;
            }
        }
        Some(removed)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject2D> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut GameObject2D> {
        self.objects.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &GameObject2D)> {
        self.objects.iter().map(|(id, object)| (*id, object))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectId, &mut GameObject2D)> {
        self.objects.iter_mut().map(|(id, object)| (*id, object))
    }

    pub fn count_kind(&self, kind: ObjectKind) -> usize {
        self.objects.values().filter(|o| o.kind == kind).count()
    }

    /// Parents `child` under `parent`, keeping its current world pose.
    pub fn attach(&mut self, child: ObjectId, parent: ObjectId) -> Result<(), String> {
        if child == parent {
            return Err(format!("object {child:?} cannot be attached to itself"));
        }
        let (parent_position, parent_rotation) = self
            .get(parent)
            .map(|p| (p.position, p.rotation))
            .ok_or_else(|| format!("attach parent {parent:?} not found"))?;
        let object = self
            .get_mut(child)
            .ok_or_else(|| format!("attach child {child:?} not found"))?;

        let (local_offset, local_rotation) = decompose_pose(
            parent_position,
            parent_rotation,
            object.position,
            object.rotation,
        );
        object.attachment = Some(Attachment {
            parent,
            local_offset,
            local_rotation,
        });
        Ok(())
    }

    /// Clears the parent relation. The world pose stays where it was last resolved.
    pub fn detach(&mut self, child: ObjectId) -> Option<Attachment> {
        self.get_mut(child)?.attachment.take()
    }

    pub fn world_pose(&self, id: ObjectId) -> Option<(Vec2, f32)> {
        self.world_pose_at_depth(id, 0)
    }

    fn world_pose_at_depth(&self, id: ObjectId, depth: usize) -> Option<(Vec2, f32)> {
        let object = self.get(id)?;
        let Some(attachment) = object.attachment else {
            return Some((object.position, object.rotation));
        };
        if depth >= MAX_ATTACHMENT_DEPTH {
            return None;
        }

        let (parent_position, parent_rotation) =
            self.world_pose_at_depth(attachment.parent, depth + 1)?;
        Some(compose_pose(
            parent_position,
            parent_rotation,
            attachment.local_offset,
            attachment.local_rotation,
        ))
    }

    /// Recomputes world poses of all attached objects from their parents.
    pub fn resolve_attachments(&mut self) {
        let resolved: Vec<(ObjectId, (Vec2, f32))> = self
            .objects
            .iter()
            .filter(|(_, object)| object.is_attached())
            .filter_map(|(id, _)| self.world_pose(*id).map(|pose| (*id, pose)))
            .collect();

        for (id, (position, rotation)) in resolved {
            if let Some(object) = self.objects.get_mut(&id) {
                object.position = position;
                object.rotation = rotation;
            }
        }
    }
}
