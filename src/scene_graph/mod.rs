pub mod object3d;
pub mod renderable;
pub mod scene;
pub mod transform;

pub use object3d::{Object3D, ObjectId};
pub use renderable::{Renderable, RenderableId};
pub use scene::Scene;
pub use transform::{validate_scale, Transform};
