use id_arena::Id;

use crate::model::Model;

pub type RenderableId = Id<Renderable>;

/// A loaded visual asset registered with the scene. Nodes refer to it by id only.
pub struct Renderable {
    pub name: String,
    pub model: Model,
}

impl Renderable {
    pub fn new(name: impl Into<String>, model: Model) -> Self {
        Self {
            name: name.into(),
            model,
        }
    }
}
