use std::time::Duration;

use glam::Quat;
use rayon::prelude::*;
use slotmap::SlotMap;

use crate::animation::orbit::{Direction, OrbitAnimation};
use crate::error::InvalidPeriodError;
use crate::scene_graph::{ObjectId, Scene};

slotmap::new_key_type! {
    /// Cancels the orbit it was returned for. Stored on the pivot node.
    pub struct AnimationHandle;
}

/// Drives every orbit on the scene timeline.
///
/// Cancelled animations are removed; their handles stop resolving and cancelling them
/// again does nothing.
pub struct OrbitAnimator {
    animations: SlotMap<AnimationHandle, OrbitAnimation>,
}

impl OrbitAnimator {
    pub fn new() -> Self {
        Self {
            animations: SlotMap::with_key(),
        }
    }

    /// Starts a perpetual rotation of `pivot`. The first key is applied immediately.
    ///
    /// A pivot drives at most one orbit: an animation already attached to it is cancelled.
    pub fn start_orbit(
        &mut self,
        scene: &mut Scene,
        pivot: ObjectId,
        period: Duration,
        clockwise: bool,
        axis_tilt_degrees: f32,
    ) -> Result<AnimationHandle, InvalidPeriodError> {
        let animation = OrbitAnimation::new(
            pivot,
            period,
            Direction::from_clockwise(clockwise),
            axis_tilt_degrees,
        )?;

        let initial_rotation = animation.current_rotation();
        let handle = self.animations.insert(animation);

        let previous = scene
            .get_object_mut(pivot)
            .and_then(|object| object.animation.replace(handle));
        if let Some(previous) = previous {
            self.cancel(previous);
        }

        scene.set_object_rotation(pivot, initial_rotation);

        log::debug!(
            "Started orbit {:?} on {:?}: period {:?}, clockwise {}, tilt {}°",
            handle,
            pivot,
            period,
            clockwise,
            axis_tilt_degrees
        );

        Ok(handle)
    }

    /// Stops the animation. Safe to call repeatedly and after the pivot is gone.
    pub fn cancel(&mut self, handle: AnimationHandle) {
        if let Some(mut animation) = self.animations.remove(handle) {
            animation.cancel();
            log::debug!("Cancelled orbit {:?}", handle);
        }
    }

    /// The running animation behind `handle`.
    pub fn get(&self, handle: AnimationHandle) -> Option<&OrbitAnimation> {
        self.animations.get(handle)
    }

    pub fn is_running(&self, handle: AnimationHandle) -> bool {
        self.get(handle).is_some_and(|animation| animation.is_running())
    }

    pub fn active_count(&self) -> usize {
        self.animations.len()
    }

    /// Advances every running orbit by `dt` and writes the new pivot rotations.
    ///
    /// Sampling runs in parallel; the writes are applied serially. Orbits whose pivot has
    /// been despawned are cancelled here.
    pub fn tick(&mut self, scene: &mut Scene, dt: Duration) {
        let running: Vec<(AnimationHandle, &mut OrbitAnimation)> =
            self.animations.iter_mut().collect();
        let samples: Vec<(AnimationHandle, ObjectId, Quat)> = running
            .into_par_iter()
            .filter(|(_, animation)| animation.is_running())
            .map(|(handle, animation)| (handle, animation.pivot(), animation.advance(dt)))
            .collect();

        for (handle, pivot, rotation) in samples {
            if scene.contains(pivot) {
                scene.set_object_rotation(pivot, rotation);
            } else {
                log::warn!("Pivot {:?} is gone, reaping orbit {:?}", pivot, handle);
                self.animations.remove(handle);
            }
        }
    }
}

impl Default for OrbitAnimator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::scene_graph::{Object3D, Transform};

    fn scene_with_pivot() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        let pivot = scene.add_object(
            Object3D::named("pivot").with_transform(
                Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::splat(0.5))
                    .unwrap(),
            ),
        );
        (scene, pivot)
    }

    fn same_rotation(a: Quat, b: Quat) -> bool {
        a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
    }

    fn rotation(scene: &Scene, pivot: ObjectId) -> Quat {
        scene.get_object_transform(pivot).unwrap().rotation()
    }

    #[test]
    fn start_stores_handle_on_pivot() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();

        let handle = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(10), true, 0.0)
            .unwrap();

        assert_eq!(scene.get_object(pivot).unwrap().animation, Some(handle));
        assert!(animator.is_running(handle));
        assert_eq!(animator.active_count(), 1);
    }

    #[test]
    fn zero_period_leaves_pivot_untouched() {
        let (mut scene, pivot) = scene_with_pivot();
        scene.set_object_rotation(pivot, Quat::from_rotation_z(0.3));
        let before = rotation(&scene, pivot);
        let mut animator = OrbitAnimator::new();

        let err = animator
            .start_orbit(&mut scene, pivot, Duration::ZERO, false, 0.0)
            .unwrap_err();

        assert_eq!(err, InvalidPeriodError { millis: 0 });
        assert_eq!(rotation(&scene, pivot), before);
        assert_eq!(scene.get_object(pivot).unwrap().animation, None);
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn tick_only_touches_rotation() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();
        animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(4), false, 0.0)
            .unwrap();

        animator.tick(&mut scene, Duration::from_secs(1));

        let transform = scene.get_object_transform(pivot).unwrap();
        assert!(same_rotation(
            transform.rotation(),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)
        ));
        assert_eq!(transform.translation(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(transform.scale(), Vec3::splat(0.5));
    }

    #[test]
    fn cancel_freezes_rotation_and_is_idempotent() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();
        let handle = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(3), true, 0.0)
            .unwrap();

        animator.tick(&mut scene, Duration::from_millis(700));
        animator.cancel(handle);
        let frozen = rotation(&scene, pivot);

        animator.tick(&mut scene, Duration::from_millis(700));
        animator.cancel(handle);
        animator.cancel(handle);

        assert_eq!(rotation(&scene, pivot), frozen);
        assert!(!animator.is_running(handle));
        assert_eq!(animator.active_count(), 0);
    }

    #[test]
    fn orbits_run_independently() {
        let mut scene = Scene::new();
        let fast = scene.add_object(Object3D::named("fast"));
        let slow = scene.add_object(Object3D::named("slow"));
        let mut animator = OrbitAnimator::new();
        animator
            .start_orbit(&mut scene, fast, Duration::from_secs(2), false, 0.0)
            .unwrap();
        let slow_handle = animator
            .start_orbit(&mut scene, slow, Duration::from_secs(8), false, 0.0)
            .unwrap();

        animator.cancel(slow_handle);
        animator.tick(&mut scene, Duration::from_secs(1));

        assert!(same_rotation(
            rotation(&scene, fast),
            Quat::from_rotation_y(std::f32::consts::PI)
        ));
        assert!(same_rotation(rotation(&scene, slow), Quat::IDENTITY));
    }

    #[test]
    fn restarting_on_same_pivot_cancels_previous() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();
        let first = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(5), true, 0.0)
            .unwrap();
        let second = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(7), false, 10.0)
            .unwrap();

        assert!(!animator.is_running(first));
        assert!(animator.is_running(second));
        assert_eq!(scene.get_object(pivot).unwrap().animation, Some(second));
    }

    #[test]
    fn despawned_pivot_is_reaped_on_tick() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();
        let handle = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(5), true, 0.0)
            .unwrap();

        scene.despawn_recursive(pivot);
        animator.tick(&mut scene, Duration::from_millis(16));

        assert!(!animator.is_running(handle));
        assert!(animator.get(handle).is_none());
        assert_eq!(animator.active_count(), 0);
        animator.cancel(handle);
    }

    #[test]
    fn cancelled_handles_never_resolve_to_new_orbits() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();
        let old = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(5), true, 0.0)
            .unwrap();
        animator.cancel(old);

        let new = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(9), true, 0.0)
            .unwrap();
        animator.cancel(old);

        assert_ne!(old, new);
        assert!(animator.is_running(new));
        assert_eq!(animator.get(new).unwrap().period(), Duration::from_secs(9));
    }

    #[test]
    fn huge_frame_delta_stays_on_the_cycle() {
        let (mut scene, pivot) = scene_with_pivot();
        let mut animator = OrbitAnimator::new();
        let handle = animator
            .start_orbit(&mut scene, pivot, Duration::from_secs(1), false, 0.0)
            .unwrap();

        animator.tick(&mut scene, Duration::from_millis(1));
        animator.tick(&mut scene, Duration::MAX);

        // Duration::MAX is a whole number of seconds plus 999_999_999 ns.
        let elapsed = animator.get(handle).unwrap().elapsed();
        assert_eq!(elapsed, Duration::from_nanos(999_999));
        assert!(animator.is_running(handle));
    }
}
