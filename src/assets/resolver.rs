use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use itertools::Itertools;
use tokio::task::JoinSet;

use crate::error::AssetResolutionError;
use crate::model::Model;
use crate::scene_graph::{Renderable, RenderableId, Scene};

/// Host collaborator that turns an asset identifier into decoded mesh data.
#[async_trait]
pub trait AssetResolver: Send + Sync {
    async fn resolve(&self, identifier: &str) -> Result<Model, AssetResolutionError>;
}

/// Asset identifier to the renderable registered for it.
#[derive(Debug, Default, Clone)]
pub struct ResolvedAssets {
    renderables: HashMap<String, RenderableId>,
}

impl ResolvedAssets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every model with the scene. Only call once the whole batch resolved.
    pub fn register(&mut self, scene: &mut Scene, models: Vec<(String, Model)>) {
        for (identifier, model) in models {
            let id = scene.add_renderable(Renderable::new(identifier.clone(), model));
            self.renderables.insert(identifier, id);
        }
    }

    pub fn get(&self, identifier: &str) -> Option<RenderableId> {
        self.renderables.get(identifier).copied()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.renderables.contains_key(identifier)
    }

    /// The identifiers from `wanted` that have not been resolved yet, without duplicates.
    pub fn missing<'a>(&self, wanted: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        wanted
            .into_iter()
            .filter(|identifier| !self.contains(identifier))
            .unique()
            .map(String::from)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }
}

/// Resolves every identifier concurrently and waits for all of them.
///
/// The first failure, or running past `timeout`, ends the wait. Requests still in flight
/// are aborted when the join set drops. Results come back in request order.
pub async fn resolve_all(
    resolver: Arc<dyn AssetResolver>,
    identifiers: &[String],
    timeout: Duration,
) -> Result<Vec<(String, Model)>, AssetResolutionError> {
    let unique: Vec<String> = identifiers.iter().unique().cloned().collect();
    let mut tasks = JoinSet::new();

    for (index, identifier) in unique.iter().cloned().enumerate() {
        let resolver = Arc::clone(&resolver);
        tasks.spawn(async move {
            let result = resolver.resolve(&identifier).await;
            (index, identifier, result)
        });
    }

    let join = async {
        let mut resolved: Vec<Option<(String, Model)>> = unique.iter().map(|_| None).collect();

        while let Some(joined) = tasks.join_next().await {
            let (index, identifier, result) =
                joined.map_err(|err| AssetResolutionError::Interrupted(err.to_string()))?;
            let model = result?;
            log::debug!(
                "Resolved {}: {} vertices, {} triangles",
                identifier,
                model.vertex_count(),
                model.triangle_count()
            );
            resolved[index] = Some((identifier, model));
        }

        Ok::<_, AssetResolutionError>(resolved.into_iter().flatten().collect::<Vec<_>>())
    };

    match tokio::time::timeout(timeout, join).await {
        Ok(result) => result,
        Err(_) => Err(AssetResolutionError::Timeout(timeout)),
    }
}
