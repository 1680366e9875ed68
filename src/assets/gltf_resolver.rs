use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;

use crate::assets::resolver::AssetResolver;
use crate::error::AssetResolutionError;
use crate::model::Model;

/// Loads `<asset_dir>/<identifier>` as glTF and decodes its first mesh.
pub struct GltfResolver {
    asset_dir: PathBuf,
}

impl GltfResolver {
    pub fn new(asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            asset_dir: asset_dir.into(),
        }
    }
}

fn load_model(identifier: &str, path: &Path) -> anyhow::Result<Model> {
    let (document, buffers, _images) =
        gltf::import(path).with_context(|| format!("Failed to import {}", path.display()))?;
    let mesh = document.meshes().next().context("No meshes in gltf")?;

    Model::from_gltf(identifier, mesh, &buffers)
}

#[async_trait]
impl AssetResolver for GltfResolver {
    async fn resolve(&self, identifier: &str) -> Result<Model, AssetResolutionError> {
        let path = self.asset_dir.join(identifier);
        let name = identifier.to_string();

        let loaded = tokio::task::spawn_blocking(move || load_model(&name, &path))
            .await
            .map_err(|err| AssetResolutionError::Interrupted(err.to_string()))?;

        loaded.map_err(|err| AssetResolutionError::Load {
            identifier: identifier.to_string(),
            message: format!("{:#}", err),
        })
    }
}
