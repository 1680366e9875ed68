use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use glam::Vec3;
use itertools::Itertools;
use serde::Deserialize;

use crate::assets::ResolvedAssets;
use crate::composer::{CenterDescriptor, OrbitDescriptor};
use crate::error::{period_from_millis, CompositionError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OrreryConfig {
    pub asset_dir: PathBuf,
    pub load_timeout_ms: u64,
    /// Added to the tapped point when creating the anchor node.
    pub anchor_offset: [f32; 3],
    pub root: RootConfig,
    pub center: CenterConfig,
    pub bodies: Vec<BodyConfig>,
}

/// Local transform of the system root below its anchor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RootConfig {
    pub offset: [f32; 3],
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CenterConfig {
    pub name: String,
    pub asset: String,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BodyConfig {
    pub name: String,
    pub asset: String,
    pub offset: [f32; 3],
    pub scale: f32,
    /// Milliseconds per revolution. Omit for a stationary body.
    #[serde(default)]
    pub period_ms: Option<i64>,
    #[serde(default = "default_clockwise")]
    pub clockwise: bool,
    #[serde(default)]
    pub axis_tilt_degrees: f32,
}

fn default_clockwise() -> bool {
    true
}

impl BodyConfig {
    fn reference(name: &str, offset: [f32; 3], scale: f32, period_ms: i64) -> Self {
        Self {
            name: name.to_string(),
            asset: format!("{}.gltf", name),
            offset,
            scale,
            period_ms: Some(period_ms),
            clockwise: true,
            axis_tilt_degrees: 0.0,
        }
    }
}

impl Default for OrreryConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from("assets"),
            load_timeout_ms: 10_000,
            anchor_offset: [0.0, -5.0, 0.0],
            root: RootConfig {
                offset: [0.0, 1.0, 0.0],
                scale: 0.5,
            },
            center: CenterConfig {
                name: "Sol".to_string(),
                asset: "Sol.gltf".to_string(),
                scale: 1.0,
            },
            bodies: vec![
                BodyConfig::reference("Mercury", [0.5, 0.0, 0.0], 0.2, 25_000),
                BodyConfig::reference("Venus", [0.8, 0.0, 0.5], 0.3, 20_000),
                BodyConfig::reference("Earth", [1.2, 0.0, 0.0], 0.4, 15_000),
                BodyConfig::reference("Mars", [1.6, 0.0, 0.0], 0.3, 30_000),
                BodyConfig::reference("Jupiter", [2.1, 0.0, 0.0], 0.5, 12_000),
                BodyConfig::reference("Saturn", [2.8, 0.0, 0.0], 0.5, 27_000),
                BodyConfig::reference("Uranus", [3.8, 0.0, 0.0], 0.9, 23_000),
                BodyConfig::reference("Neptune", [4.6, 0.0, 0.0], 0.4, 10_000),
            ],
        }
    }
}

impl OrreryConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    pub fn anchor_offset(&self) -> Vec3 {
        Vec3::from(self.anchor_offset)
    }

    /// Every asset the system needs, center first, without duplicates.
    pub fn asset_identifiers(&self) -> Vec<String> {
        std::iter::once(&self.center.asset)
            .chain(self.bodies.iter().map(|body| &body.asset))
            .unique()
            .cloned()
            .collect()
    }

    pub fn center_descriptor(&self, assets: &ResolvedAssets) -> CenterDescriptor {
        CenterDescriptor::new(
            self.center.name.clone(),
            assets.get(&self.center.asset),
            Vec3::splat(self.center.scale),
        )
    }

    /// Turns the body table into descriptors. Unresolved assets become null renderables,
    /// which composition rejects.
    pub fn descriptors(
        &self,
        assets: &ResolvedAssets,
    ) -> Result<Vec<OrbitDescriptor>, CompositionError> {
        self.bodies
            .iter()
            .map(|body| {
                let descriptor = OrbitDescriptor::new(
                    body.name.clone(),
                    assets.get(&body.asset),
                    Vec3::from(body.offset),
                    Vec3::splat(body.scale),
                )
                .with_direction(body.clockwise)
                .with_axis_tilt(body.axis_tilt_degrees);

                match body.period_ms {
                    Some(millis) => {
                        let period = period_from_millis(millis).map_err(|source| {
                            CompositionError::InvalidPeriod {
                                body: body.name.clone(),
                                source,
                            }
                        })?;
                        Ok(descriptor.with_period(period))
                    }
                    None => Ok(descriptor),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::InvalidPeriodError;

    #[test]
    fn default_is_the_reference_system() {
        let config = OrreryConfig::default();
        let periods: Vec<i64> = config
            .bodies
            .iter()
            .filter_map(|body| body.period_ms)
            .collect();

        assert_eq!(
            periods,
            vec![25000, 20000, 15000, 30000, 12000, 27000, 23000, 10000]
        );
        assert_eq!(config.asset_identifiers().len(), 9);
        assert_eq!(config.asset_identifiers()[0], "Sol.gltf");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = OrreryConfig::from_toml_str(
            r#"
            load_timeout_ms = 250

            [[bodies]]
            name = "Moon"
            asset = "Moon.gltf"
            offset = [1.0, 0.0, 0.0]
            scale = 0.25
            period_ms = 4000
            clockwise = false
            axis_tilt_degrees = 5.0

            [[bodies]]
            name = "Station"
            asset = "Moon.gltf"
            offset = [0.0, 0.0, 2.0]
            scale = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.load_timeout(), Duration::from_millis(250));
        assert_eq!(config.center.name, "Sol");
        assert_eq!(config.bodies.len(), 2);
        assert!(!config.bodies[0].clockwise);
        assert!(config.bodies[1].clockwise);
        assert_eq!(config.bodies[1].period_ms, None);
        assert_eq!(
            config.asset_identifiers(),
            vec!["Sol.gltf".to_string(), "Moon.gltf".to_string()]
        );
    }

    #[test]
    fn negative_period_is_rejected() {
        let mut config = OrreryConfig::default();
        config.bodies[3].period_ms = Some(-30_000);

        let err = config.descriptors(&ResolvedAssets::new()).unwrap_err();

        assert_eq!(
            err,
            CompositionError::InvalidPeriod {
                body: "Mars".into(),
                source: InvalidPeriodError { millis: -30_000 },
            }
        );
    }

    #[test]
    fn unresolved_assets_become_null_renderables() {
        let config = OrreryConfig::default();
        let descriptors = config.descriptors(&ResolvedAssets::new()).unwrap();

        assert_eq!(descriptors.len(), 8);
        assert!(descriptors.iter().all(|d| d.renderable().is_none()));
        assert_eq!(descriptors[1].offset(), Vec3::new(0.8, 0.0, 0.5));
        assert_eq!(descriptors[7].period(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn load_reads_file_and_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "asset_dir = \"planets\"").unwrap();
        let config = OrreryConfig::load(file.path()).unwrap();
        assert_eq!(config.asset_dir, PathBuf::from("planets"));

        let mut broken = tempfile::NamedTempFile::new().unwrap();
        writeln!(broken, "bodies = 3").unwrap();
        let err = OrreryConfig::load(broken.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config"));
    }
}
