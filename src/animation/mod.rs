mod animator;
mod orbit;

pub use animator::{AnimationHandle, OrbitAnimator};
pub use orbit::{Direction, OrbitAnimation, PlaybackState, KEY_COUNT};
