use std::sync::Arc;
use std::time::Duration;

use glam::{Quat, Vec3};

use crate::animation::OrbitAnimator;
use crate::assets::{resolve_all, AssetResolver, ResolvedAssets};
use crate::composer::{compose_system, teardown_system};
use crate::config::OrreryConfig;
use crate::error::{CompositionError, PlacementError};
use crate::scene_graph::{validate_scale, Object3D, ObjectId, Scene, Transform};

/// A tap on a detected surface, already converted to a world-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRequest {
    pub hit_point: Vec3,
}

impl PlacementRequest {
    pub fn at(hit_point: Vec3) -> Self {
        Self { hit_point }
    }
}

/// A system living in the scene under its own anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedSystem {
    pub anchor: ObjectId,
    pub root: ObjectId,
}

pub struct Orrery {
    pub scene: Scene,
    pub animator: OrbitAnimator,
    config: OrreryConfig,
    resolver: Arc<dyn AssetResolver>,
    assets: ResolvedAssets,
    systems: Vec<PlacedSystem>,
}

impl Orrery {
    pub fn new(config: OrreryConfig, resolver: Arc<dyn AssetResolver>) -> Self {
        Self {
            scene: Scene::new(),
            animator: OrbitAnimator::new(),
            config,
            resolver,
            assets: ResolvedAssets::new(),
            systems: Vec::new(),
        }
    }

    pub fn config(&self) -> &OrreryConfig {
        &self.config
    }

    pub fn assets(&self) -> &ResolvedAssets {
        &self.assets
    }

    pub fn systems(&self) -> &[PlacedSystem] {
        &self.systems
    }

    /// Resolves whatever assets are not loaded yet. Nothing is registered unless the whole
    /// batch succeeds.
    async fn ensure_assets(&mut self) -> Result<(), PlacementError> {
        let identifiers = self.config.asset_identifiers();
        let missing = self
            .assets
            .missing(identifiers.iter().map(String::as_str));
        if missing.is_empty() {
            return Ok(());
        }

        log::info!("Resolving {} assets", missing.len());
        let models = resolve_all(
            Arc::clone(&self.resolver),
            &missing,
            self.config.load_timeout(),
        )
        .await?;
        self.assets.register(&mut self.scene, models);
        Ok(())
    }

    /// Loads assets, composes the system and attaches it under a new anchor at the tap.
    pub async fn place(&mut self, request: PlacementRequest) -> Result<PlacedSystem, PlacementError> {
        self.ensure_assets().await?;

        let center = self.config.center_descriptor(&self.assets);
        let bodies = self.config.descriptors(&self.assets)?;

        let root_scale = validate_scale(Vec3::splat(self.config.root.scale))
            .map_err(CompositionError::from)?;

        let root = compose_system(&mut self.scene, &mut self.animator, &center, &bodies)?;

        if let Err(err) = self.scene.set_object_transform(
            root,
            Vec3::from(self.config.root.offset),
            Quat::IDENTITY,
            root_scale,
        ) {
            teardown_system(&mut self.scene, &mut self.animator, root);
            return Err(CompositionError::from(err).into());
        }

        let anchor = self.scene.add_object(
            Object3D::named("anchor").with_transform(Transform::from_translation(
                request.hit_point + self.config.anchor_offset(),
            )),
        );

        if let Err(err) = self.scene.set_object_parent(root, Some(anchor)) {
            teardown_system(&mut self.scene, &mut self.animator, root);
            self.scene.despawn_recursive(anchor);
            return Err(CompositionError::from(err).into());
        }

        let system = PlacedSystem { anchor, root };
        self.systems.push(system);
        log::info!(
            "Placed {} with {} bodies at {:?}",
            center.name,
            bodies.len(),
            request.hit_point
        );

        Ok(system)
    }

    /// Host entry point for a tap. A failed placement is logged and leaves nothing behind.
    pub async fn on_anchor_requested(&mut self, request: PlacementRequest) -> Option<PlacedSystem> {
        match self.place(request).await {
            Ok(system) => Some(system),
            Err(err) => {
                log::error!("Not placing system at {:?}: {}", request.hit_point, err);
                None
            }
        }
    }

    /// Cancels the system's orbits and removes it together with its anchor.
    pub fn remove(&mut self, system: PlacedSystem) -> usize {
        self.systems.retain(|placed| *placed != system);
        let cancelled = teardown_system(&mut self.scene, &mut self.animator, system.root);
        self.scene.despawn_recursive(system.anchor);
        log::info!("Removed system {:?}, cancelled {} orbits", system.root, cancelled);
        cancelled
    }

    pub fn update(&mut self, dt: Duration) {
        self.animator.tick(&mut self.scene, dt);
    }

    /// World position of every body in a placed system, in composition order.
    pub fn body_positions(&self, system: PlacedSystem) -> Vec<(String, Vec3)> {
        let Some(root) = self.scene.get_object(system.root) else {
            return Vec::new();
        };

        root.children(&self.scene)
            .flat_map(|pivot| pivot.child_ids.iter().copied())
            .filter_map(|body| {
                let name = self.scene.get_object(body)?.name.clone();
                Some((name, self.scene.world_position(body)?))
            })
            .collect()
    }
}
