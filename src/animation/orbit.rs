use std::time::Duration;

use glam::{Quat, Vec3};

use crate::error::InvalidPeriodError;
use crate::scene_graph::ObjectId;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Number of key rotations spanning one revolution. Consecutive keys are 120° apart,
/// which keeps each slerp segment well under the 180° ambiguity.
pub const KEY_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn from_clockwise(clockwise: bool) -> Self {
        if clockwise {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        }
    }

    /// Sweep angle in degrees for a given fraction of a revolution.
    pub fn sweep_degrees(self, phase: f32) -> f32 {
        let angle = phase * 360.0;
        match self {
            Direction::Clockwise => 360.0 - angle,
            Direction::CounterClockwise => angle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Running,
    Cancelled,
}

/// A perpetual rotation of one pivot about its vertical axis.
///
/// The rotation is keyed at evenly spaced angles and interpolated linearly in time,
/// restarting from the first key every `period`.
#[derive(Debug, Clone)]
pub struct OrbitAnimation {
    pivot: ObjectId,
    period: Duration,
    direction: Direction,
    keys: [Quat; KEY_COUNT],
    elapsed: Duration,
    state: PlaybackState,
}

impl OrbitAnimation {
    pub fn new(
        pivot: ObjectId,
        period: Duration,
        direction: Direction,
        axis_tilt_degrees: f32,
    ) -> Result<Self, InvalidPeriodError> {
        if period.is_zero() {
            return Err(InvalidPeriodError::zero());
        }

        Ok(Self {
            pivot,
            period,
            direction,
            keys: build_keys(direction, axis_tilt_degrees),
            elapsed: Duration::ZERO,
            state: PlaybackState::Running,
        })
    }

    pub fn pivot(&self) -> ObjectId {
        self.pivot
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Time into the current revolution.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    /// Returns true if this call stopped a running animation.
    pub fn cancel(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = PlaybackState::Cancelled;
        was_running
    }

    /// Fraction of a revolution completed after `elapsed`, in `[0, 1)`.
    pub fn phase_at(&self, elapsed: Duration) -> f32 {
        let period = self.period.as_nanos();
        ((elapsed.as_nanos() % period) as f64 / period as f64) as f32
    }

    /// Pivot rotation `elapsed` after the animation started.
    pub fn sample(&self, elapsed: Duration) -> Quat {
        let segments = (KEY_COUNT - 1) as f32;
        let scaled = self.phase_at(elapsed) * segments;
        let index = (scaled.floor() as usize).min(KEY_COUNT - 2);
        let t = scaled - index as f32;

        self.keys[index].slerp(self.keys[index + 1], t).normalize()
    }

    pub fn current_rotation(&self) -> Quat {
        self.sample(self.elapsed)
    }

    /// Moves the animation forward by `dt` and returns the new rotation. Elapsed time is
    /// kept modulo the period so long-running orbits never lose precision.
    pub fn advance(&mut self, dt: Duration) -> Quat {
        if self.is_running() {
            // Two durations sum to well under u128::MAX nanoseconds.
            let wrapped = (self.elapsed.as_nanos() + dt.as_nanos()) % self.period.as_nanos();
            self.elapsed = duration_from_nanos(wrapped);
        }
        self.current_rotation()
    }
}

/// `nanos` must be below `Duration::MAX`.
fn duration_from_nanos(nanos: u128) -> Duration {
    Duration::new(
        (nanos / NANOS_PER_SEC) as u64,
        (nanos % NANOS_PER_SEC) as u32,
    )
}

fn build_keys(direction: Direction, axis_tilt_degrees: f32) -> [Quat; KEY_COUNT] {
    let tilt = Quat::from_axis_angle(Vec3::X, axis_tilt_degrees.to_radians());

    std::array::from_fn(|i| {
        let phase = i as f32 / (KEY_COUNT - 1) as f32;
        let angle = direction.sweep_degrees(phase);
        tilt * Quat::from_axis_angle(Vec3::Y, angle.to_radians())
    })
}
