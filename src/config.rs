use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bloch::BlochProjector;
use crate::transition::DEFAULT_FRAMES;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Visual radius of the Bloch sphere in pixels.
    pub radius: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Measurement RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Pause between playback steps. Presentation only.
    pub step_delay_ms: u64,
    pub transition_frames: usize,
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            radius: 150.0,
            center_x: 200.0,
            center_y: 200.0,
            seed: None,
            step_delay_ms: 1200,
            transition_frames: DEFAULT_FRAMES,
            batch_size: 100,
        }
    }
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn projector(&self) -> BlochProjector {
        BlochProjector::new(self.radius, self.center_x, self.center_y)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_approx_eq;

    #[test]
    fn test_partial_json_uses_defaults() -> Result<()> {
        let config = Config::from_json(r#"{ "radius": 80.0, "seed": 5 }"#)?;

        assert_approx_eq!(80.0, config.radius);
        assert_eq!(Some(5), config.seed);
        assert_approx_eq!(200.0, config.center_x);
        assert_eq!(DEFAULT_FRAMES, config.transition_frames);
        assert_eq!(Duration::from_millis(1200), config.step_delay());
        Ok(())
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(Config::from_json("{ radius: }").is_err());
        assert!(Config::from_path("/nonexistent/bloch-sim.json").is_err());
    }

    #[test]
    fn test_projector_from_config() {
        let projector = Config::default().projector();
        assert_approx_eq!(150.0, projector.radius());
        assert_approx_eq!(200.0, projector.center().y);
    }
}
