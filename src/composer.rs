use std::time::Duration;

use glam::{Quat, Vec3};

use crate::animation::{AnimationHandle, OrbitAnimator};
use crate::error::{CompositionError, InvalidPeriodError};
use crate::scene_graph::{validate_scale, Object3D, ObjectId, RenderableId, Scene, Transform};

/// The stationary body at the origin of a system.
#[derive(Debug, Clone, PartialEq)]
pub struct CenterDescriptor {
    pub name: String,
    pub renderable: Option<RenderableId>,
    pub scale: Vec3,
}

impl CenterDescriptor {
    pub fn new(name: impl Into<String>, renderable: Option<RenderableId>, scale: Vec3) -> Self {
        Self {
            name: name.into(),
            renderable,
            scale,
        }
    }
}

/// One body placed around the center. A `None` period makes the body stationary.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitDescriptor {
    name: String,
    renderable: Option<RenderableId>,
    offset: Vec3,
    scale: Vec3,
    period: Option<Duration>,
    clockwise: bool,
    axis_tilt_degrees: f32,
}

impl OrbitDescriptor {
    pub fn new(
        name: impl Into<String>,
        renderable: Option<RenderableId>,
        offset: Vec3,
        scale: Vec3,
    ) -> Self {
        Self {
            name: name.into(),
            renderable,
            offset,
            scale,
            period: None,
            clockwise: true,
            axis_tilt_degrees: 0.0,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_direction(mut self, clockwise: bool) -> Self {
        self.clockwise = clockwise;
        self
    }

    pub fn with_axis_tilt(mut self, degrees: f32) -> Self {
        self.axis_tilt_degrees = degrees;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renderable(&self) -> Option<RenderableId> {
        self.renderable
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    pub fn clockwise(&self) -> bool {
        self.clockwise
    }

    pub fn axis_tilt_degrees(&self) -> f32 {
        self.axis_tilt_degrees
    }
}

fn is_positive(scale: Vec3) -> bool {
    validate_scale(scale).is_ok()
}

fn validate_renderable(
    scene: &Scene,
    name: &str,
    renderable: Option<RenderableId>,
) -> Result<RenderableId, CompositionError> {
    renderable
        .filter(|&id| scene.get_renderable(id).is_some())
        .ok_or_else(|| CompositionError::InvalidRenderable {
            body: name.to_string(),
        })
}

fn validate(
    scene: &Scene,
    center: &CenterDescriptor,
    bodies: &[OrbitDescriptor],
) -> Result<(), CompositionError> {
    validate_renderable(scene, &center.name, center.renderable)?;
    if !is_positive(center.scale) {
        return Err(CompositionError::InvalidScale {
            body: center.name.clone(),
        });
    }

    for body in bodies {
        validate_renderable(scene, &body.name, body.renderable)?;

        if !is_positive(body.scale) {
            return Err(CompositionError::InvalidScale {
                body: body.name.clone(),
            });
        }

        if body.period.is_some_and(|period| period.is_zero()) {
            return Err(CompositionError::InvalidPeriod {
                body: body.name.clone(),
                source: InvalidPeriodError::zero(),
            });
        }
    }

    Ok(())
}

/// Adds a pivot under `root` and the visible body under the pivot.
fn spawn_pivot_and_body(
    scene: &mut Scene,
    root: ObjectId,
    name: &str,
    renderable: RenderableId,
    offset: Vec3,
    scale: Vec3,
) -> Result<ObjectId, CompositionError> {
    let pivot = scene.add_child(root, Object3D::named(format!("{} pivot", name)))?;
    let body = Object3D::named(name)
        .with_transform(Transform::new(offset, Quat::IDENTITY, scale)?)
        .with_renderable(renderable);
    scene.add_child(pivot, body)?;
    Ok(pivot)
}

fn build(
    scene: &mut Scene,
    animator: &mut OrbitAnimator,
    root: ObjectId,
    center: &CenterDescriptor,
    bodies: &[OrbitDescriptor],
) -> Result<(), CompositionError> {
    let center_renderable = validate_renderable(scene, &center.name, center.renderable)?;
    spawn_pivot_and_body(
        scene,
        root,
        &center.name,
        center_renderable,
        Vec3::ZERO,
        center.scale,
    )?;

    for body in bodies {
        let renderable = validate_renderable(scene, &body.name, body.renderable)?;
        let pivot = spawn_pivot_and_body(
            scene,
            root,
            &body.name,
            renderable,
            body.offset,
            body.scale,
        )?;

        if let Some(period) = body.period {
            animator
                .start_orbit(
                    scene,
                    pivot,
                    period,
                    body.clockwise,
                    body.axis_tilt_degrees,
                )
                .map_err(|source| CompositionError::InvalidPeriod {
                    body: body.name.clone(),
                    source,
                })?;
        }

        log::debug!(
            "Composed {} at {:?} (period {:?})",
            body.name,
            body.offset,
            body.period
        );
    }

    Ok(())
}

/// Builds the root → pivot → body hierarchy for a system and starts every orbit.
///
/// The center gets its own pivot without an animation, so a system with N bodies has
/// 1 + N pivots under the root, in descriptor order. All descriptors are validated
/// before anything is spawned. On error the scene and animator are left as they were.
/// The returned root is not attached to any anchor.
pub fn compose_system(
    scene: &mut Scene,
    animator: &mut OrbitAnimator,
    center: &CenterDescriptor,
    bodies: &[OrbitDescriptor],
) -> Result<ObjectId, CompositionError> {
    validate(scene, center, bodies)?;

    let root = scene.add_object(Object3D::named(format!("{} system", center.name)));

    if let Err(err) = build(scene, animator, root, center, bodies) {
        teardown_system(scene, animator, root);
        return Err(err);
    }

    Ok(root)
}

/// Cancels every orbit below `root` and removes the subtree from the scene.
/// Returns the number of orbits that were cancelled.
pub fn teardown_system(scene: &mut Scene, animator: &mut OrbitAnimator, root: ObjectId) -> usize {
    let handles: Vec<AnimationHandle> = scene
        .descendants(root)
        .into_iter()
        .filter_map(|id| scene.get_object(id).and_then(|object| object.animation))
        .collect();

    for &handle in &handles {
        animator.cancel(handle);
    }

    let removed = scene.despawn_recursive(root);
    log::debug!(
        "Tore down {:?}: {} nodes, {} orbits",
        root,
        removed.len(),
        handles.len()
    );

    handles.len()
}
