use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use slotmap::SlotMap;

use crate::error::{HierarchyError, InvalidScaleError};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::renderable::{Renderable, RenderableId};
use crate::scene_graph::transform::Transform;

/// Nodes live in a slot map and are freed on despawn. Renderables are registered once
/// and never removed.
pub struct Scene {
    objects: SlotMap<ObjectId, Object3D>,
    renderables: Arena<Renderable>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            renderables: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.insert(object)
    }

    /// Allocates `object` and attaches it under `parent`.
    pub fn add_child(
        &mut self,
        parent: ObjectId,
        object: Object3D,
    ) -> Result<ObjectId, HierarchyError> {
        if self.get_object(parent).is_none() {
            return Err(HierarchyError::MissingObject(parent));
        }

        let object_id = self.add_object(object);
        self.set_object_parent(object_id, Some(parent))?;
        Ok(object_id)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects.iter()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Node slots currently reserved. Despawned slots are reused.
    pub fn object_capacity(&self) -> usize {
        self.objects.capacity()
    }

    pub fn add_renderable(&mut self, renderable: Renderable) -> RenderableId {
        self.renderables.alloc(renderable)
    }

    pub fn get_renderable(&self, id: RenderableId) -> Option<&Renderable> {
        self.renderables.get(id)
    }

    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self
            .objects()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.get_object(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.get_object(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// True if `ancestor` is `object_id` itself or lies on its parent chain.
    pub fn is_ancestor(&self, ancestor: ObjectId, object_id: ObjectId) -> bool {
        let mut current = Some(object_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get_object(id).and_then(|object| object.parent_id);
        }
        false
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(
        &mut self,
        child_id: ObjectId,
        new_parent_id: Option<ObjectId>,
    ) -> Result<(), HierarchyError> {
        let old_parent_id = self
            .get_object(child_id)
            .ok_or(HierarchyError::MissingObject(child_id))?
            .parent_id;

        if let Some(parent_id) = new_parent_id {
            if !self.contains(parent_id) {
                return Err(HierarchyError::MissingObject(parent_id));
            }
            if self.is_ancestor(child_id, parent_id) {
                return Err(HierarchyError::Cycle {
                    child: child_id,
                    parent: parent_id,
                });
            }
        }

        if let Some(old_parent) = old_parent_id.and_then(|id| self.get_object_mut(id)) {
            old_parent.child_ids.retain(|&id| id != child_id);
        }

        if let Some(child) = self.get_object_mut(child_id) {
            child.parent_id = new_parent_id;
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.get_object_mut(id)) {
            new_parent.child_ids.push(child_id);
        }

        self.invalidate_object_hierarchy(child_id);
        Ok(())
    }

    /// `object_id` followed by all of its descendants, depth first.
    pub fn descendants(&self, object_id: ObjectId) -> Vec<ObjectId> {
        let mut result = Vec::new();
        let mut stack = vec![object_id];

        while let Some(id) = stack.pop() {
            if let Some(object) = self.get_object(id) {
                result.push(id);
                stack.extend(object.child_ids.iter().rev());
            }
        }

        result
    }

    /// Detaches `object_id` from its parent and removes it together with its subtree.
    /// Returns the ids that were removed.
    pub fn despawn_recursive(&mut self, object_id: ObjectId) -> Vec<ObjectId> {
        let removed = self.descendants(object_id);
        if removed.is_empty() {
            return removed;
        }

        if let Err(err) = self.set_object_parent(object_id, None) {
            log::warn!("Failed to detach {:?} before despawn: {}", object_id, err);
        }

        for &id in &removed {
            self.objects.remove(id);
        }

        removed
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.get_object_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_rotation(&mut self, object_id: ObjectId, rotation: Quat) {
        if let Some(object) = self.get_object_mut(object_id) {
            object.transform.set_rotation(rotation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_scale(
        &mut self,
        object_id: ObjectId,
        scale: Vec3,
    ) -> Result<(), InvalidScaleError> {
        if let Some(object) = self.get_object_mut(object_id) {
            object.transform.set_scale(scale)?;
        }
        self.invalidate_object_hierarchy(object_id);
        Ok(())
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<(), InvalidScaleError> {
        if let Some(object) = self.get_object_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale)?;
        }
        self.invalidate_object_hierarchy(object_id);
        Ok(())
    }

    pub fn set_object_renderable(&mut self, object_id: ObjectId, renderable: Option<RenderableId>) {
        if let Some(object) = self.get_object_mut(object_id) {
            object.renderable_id = renderable;
        }
    }

    pub fn get_object_transform(&self, object_id: ObjectId) -> Option<&Transform> {
        self.get_object(object_id).map(|object| &object.transform)
    }

    /// World matrix composed from the parent chain. Does not rely on the cache, so it is
    /// valid between `late_update` calls.
    pub fn world_matrix(&self, object_id: ObjectId) -> Option<Mat4> {
        let object = self.get_object(object_id)?;
        let local = *object.transform.get_local_matrix();

        match object.parent_id {
            Some(parent_id) => Some(self.world_matrix(parent_id)? * local),
            None => Some(local),
        }
    }

    pub fn world_position(&self, object_id: ObjectId) -> Option<Vec3> {
        self.world_matrix(object_id)
            .map(|matrix| matrix.transform_point3(Vec3::ZERO))
    }

    pub fn early_update(&mut self) {
        for (_, object) in self.objects() {
            object.transform.reset_flags();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
