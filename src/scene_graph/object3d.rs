use crate::animation::AnimationHandle;
use crate::scene_graph::renderable::RenderableId;
use crate::scene_graph::scene::Scene;
use crate::scene_graph::transform::Transform;

slotmap::new_key_type! {
    /// Versioned key: a removed node's id never resolves to a later node.
    pub struct ObjectId;
}

#[derive(Default)]
pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub renderable_id: Option<RenderableId>,
    /// Animation driving this node's rotation, kept here so teardown can cancel it.
    pub animation: Option<AnimationHandle>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_renderable(mut self, renderable_id: RenderableId) -> Self {
        self.renderable_id = Some(renderable_id);
        self
    }

    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }

    pub fn children<'a, 'b>(&'a self, scene: &'b Scene) -> impl Iterator<Item = &'b Object3D> + 'b
    where
        'a: 'b,
    {
        self.child_ids
            .iter()
            .filter_map(move |id| scene.get_object(*id))
    }
}
