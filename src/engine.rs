use std::time::Duration;

use crate::orrery::Orrery;

/// One frame: clear change flags, advance orbits, then propagate world transforms.
pub fn update(state: &mut Orrery, dt: Duration) -> anyhow::Result<()> {
    state.scene.early_update();
    state.update(dt);
    state.scene.late_update();

    Ok(())
}
