use glam::{Mat4, Quat, Vec3};
use std::cell::{Cell, Ref, RefCell};

use crate::error::InvalidScaleError;

/// Zero, negative and NaN components are rejected.
pub fn validate_scale(scale: Vec3) -> Result<Vec3, InvalidScaleError> {
    if scale.cmpgt(Vec3::ZERO).all() {
        Ok(scale)
    } else {
        Err(InvalidScaleError { scale })
    }
}

/// Local translation, rotation and scale relative to the parent node.
///
/// The local matrix is rebuilt lazily. The world matrix is written by
/// [`crate::scene_graph::Scene::late_update`] and only recomputed while dirty.
#[derive(Debug, Clone)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,

    local_matrix: RefCell<Mat4>,
    world_matrix: RefCell<Mat4>,
    local_dirty: Cell<bool>,
    world_dirty: Cell<bool>,
    has_changed_since_last_update: Cell<bool>,
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self::with_valid_scale(translation, Quat::IDENTITY, Vec3::ONE)
    }

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Result<Self, InvalidScaleError> {
        let scale = validate_scale(scale)?;
        Ok(Self::with_valid_scale(translation, rotation, scale))
    }

    fn with_valid_scale(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
            local_matrix: RefCell::new(Mat4::IDENTITY),
            world_matrix: RefCell::new(Mat4::IDENTITY),
            local_dirty: Cell::new(true),
            world_dirty: Cell::new(true),
            has_changed_since_last_update: Cell::new(true),
        }
    }

    pub fn get_local_matrix(&self) -> Ref<Mat4> {
        if self.local_dirty.get() {
            let matrix =
                Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation);

            self.local_matrix.replace(matrix);
            self.local_dirty.set(false);
            self.invalidate_world();
        }

        self.local_matrix.borrow()
    }

    pub fn get_world_matrix(&self) -> Ref<Mat4> {
        self.world_matrix.borrow()
    }

    pub fn set_world_matrix(&self, world_matrix: Mat4) {
        self.world_matrix.replace(world_matrix);
        self.world_dirty.set(false);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_local(&self) {
        self.local_dirty.set(true);
        self.world_dirty.set(true);
        self.has_changed_since_last_update.set(true);
    }

    pub fn invalidate_world(&self) {
        self.world_dirty.set(true);
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty.get()
    }

    /// Rotations are stored normalized; animation keys accumulate float error otherwise.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.invalidate_local();
    }

    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.invalidate_local();
    }

    pub fn set_scale(&mut self, scale: Vec3) -> Result<(), InvalidScaleError> {
        self.scale = validate_scale(scale)?;
        self.invalidate_local();
        Ok(())
    }

    /// Nothing is written unless `scale` is valid.
    pub fn set_transform(
        &mut self,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<(), InvalidScaleError> {
        self.scale = validate_scale(scale)?;
        self.translation = translation;
        self.set_rotation(rotation);
        Ok(())
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn reset_flags(&self) {
        self.has_changed_since_last_update.set(false);
    }

    pub fn has_changed(&self) -> bool {
        self.has_changed_since_last_update.get()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_normalized_on_write() {
        let mut transform = Transform::default();
        transform.set_rotation(Quat::from_xyzw(0.0, 2.0, 0.0, 2.0));

        assert!(transform.rotation().is_normalized());
    }

    #[test]
    fn local_matrix_tracks_changes() {
        let mut transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            transform.get_local_matrix().transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 3.0)
        );

        transform.set_scale(Vec3::splat(2.0)).unwrap();
        let point = transform.get_local_matrix().transform_point3(Vec3::X);
        assert!(point.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));
        assert!(transform.is_world_dirty());
    }

    #[test]
    fn non_positive_scale_is_rejected() {
        for scale in [Vec3::ZERO, Vec3::new(1.0, -1.0, 1.0), Vec3::splat(f32::NAN)] {
            assert!(Transform::new(Vec3::ZERO, Quat::IDENTITY, scale).is_err());
        }

        let mut transform = Transform::from_translation(Vec3::X);
        transform.reset_flags();

        let err = transform
            .set_transform(Vec3::Y, Quat::from_rotation_z(1.0), Vec3::ZERO)
            .unwrap_err();

        assert_eq!(err.scale, Vec3::ZERO);
        assert_eq!(transform.scale(), Vec3::ONE);
        assert_eq!(transform.translation(), Vec3::X);
        assert_eq!(transform.rotation(), Quat::IDENTITY);
        assert!(!transform.has_changed());
        assert!(transform.set_scale(Vec3::new(0.5, 0.0, 0.5)).is_err());
        assert_eq!(transform.scale(), Vec3::ONE);
    }

    #[test]
    fn reset_flags_clears_change_marker() {
        let transform = Transform::default();
        assert!(transform.has_changed());

        transform.reset_flags();
        assert!(!transform.has_changed());
    }
}
