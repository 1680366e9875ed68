use std::time::Duration;

use glam::Vec3;

use crate::scene_graph::ObjectId;

/// A non-positive orbital period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("orbital period must be positive, got {millis} ms")]
pub struct InvalidPeriodError {
    pub millis: i64,
}

impl InvalidPeriodError {
    pub fn zero() -> Self {
        Self { millis: 0 }
    }
}

/// Validates a signed millisecond period as it appears in configuration files.
pub fn period_from_millis(millis: i64) -> Result<Duration, InvalidPeriodError> {
    if millis <= 0 {
        return Err(InvalidPeriodError { millis });
    }
    Ok(Duration::from_millis(millis as u64))
}

/// A scale with a zero, negative or NaN component.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("scale must be positive on every axis, got {scale}")]
pub struct InvalidScaleError {
    pub scale: Vec3,
}

/// Failures from the asset collaborator, surfaced through the resolution join point.
#[derive(Debug, thiserror::Error)]
pub enum AssetResolutionError {
    #[error("failed to load asset {identifier}: {message}")]
    Load { identifier: String, message: String },

    #[error("asset resolution timed out after {0:?}")]
    Timeout(Duration),

    #[error("asset resolution task did not complete: {0}")]
    Interrupted(String),
}

/// Structural errors in the scene graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("object {0:?} does not exist")]
    MissingObject(ObjectId),

    #[error("cannot parent {child:?} under its own descendant {parent:?}")]
    Cycle { child: ObjectId, parent: ObjectId },
}

/// Rejections from system composition. Composition is atomic: when any of these is
/// returned the scene has not been modified.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompositionError {
    #[error("body {body} has no resolved renderable")]
    InvalidRenderable { body: String },

    #[error("body {body} has an invalid period")]
    InvalidPeriod {
        body: String,
        #[source]
        source: InvalidPeriodError,
    },

    #[error("body {body} has a non-positive scale")]
    InvalidScale { body: String },

    #[error(transparent)]
    Scale(#[from] InvalidScaleError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// Why a tap did not produce a placed system.
#[derive(Debug, thiserror::Error)]
pub enum PlacementError {
    #[error(transparent)]
    Asset(#[from] AssetResolutionError),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_from_millis_rejects_non_positive() {
        assert_eq!(period_from_millis(0), Err(InvalidPeriodError { millis: 0 }));
        assert_eq!(
            period_from_millis(-250),
            Err(InvalidPeriodError { millis: -250 })
        );
        assert_eq!(period_from_millis(1500), Ok(Duration::from_millis(1500)));
    }

    #[test]
    fn composition_error_keeps_period_source() {
        let err = CompositionError::InvalidPeriod {
            body: "Mars".into(),
            source: InvalidPeriodError { millis: -1 },
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("orbital period must be positive, got -1 ms")
        );
    }
}
