mod gltf_resolver;
mod resolver;

pub use gltf_resolver::GltfResolver;
pub use resolver::{resolve_all, AssetResolver, ResolvedAssets};
