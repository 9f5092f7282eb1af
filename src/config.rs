//! Start-up configuration.
//!
//! * Looks for `turing-rave.toml` in the cwd unless another path is given.
//! * Every field has a default so the file (and any key in it) is optional.
//!
//! Diffusion rates and the time step live here only: they define the model and
//! are not tunable once the simulation runs.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::params::SimulationParams;

pub const DEFAULT_PATH: &str = "turing-rave.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grid size in cells.
    pub width: usize,
    pub height: usize,
    /// Size of the displayed (and exported) frame in pixels.
    pub display_width: u32,
    pub display_height: u32,

    pub diffusion_a: f32,
    pub diffusion_b: f32,
    pub dt: f32,

    pub feed: f32,
    pub kill: f32,
    pub speed: f32,
    pub brush_size: f32,
    pub color_scheme: usize,

    /// Fixed seed for reproducible runs.
    pub seed: Option<u64>,

    pub sample_rate: u32,
    pub frame_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        let params = SimulationParams::default();

        Config {
            width: 256,
            height: 256,
            display_width: 768,
            display_height: 768,
            diffusion_a: params.diffusion_a,
            diffusion_b: params.diffusion_b,
            dt: params.dt,
            feed: params.feed,
            kill: params.kill,
            speed: params.speed,
            brush_size: 15.0,
            color_scheme: 0,
            seed: None,
            sample_rate: 44_100,
            frame_rate: 60,
        }
    }
}

impl Config {
    /// Loads from a TOML file. A missing default file gives the defaults, so
    /// does a file that doesn't parse (with a warning). An explicit path that
    /// can't be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let p = path.unwrap_or_else(|| Path::new(DEFAULT_PATH));

        let config = match fs::read_to_string(p) {
            Ok(text) => Config::from_toml(&text).unwrap_or_else(|err| {
                log::warn!("ignoring {}: {}", p.display(), err);
                Config::default()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound && path.is_none() => Config::default(),
            Err(err) => return Err(err.into()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| Error::Config(err.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.width < 3 || self.height < 3 {
            return Err(Error::Config(format!(
                "grid must be at least 3x3, got {}x{}",
                self.width, self.height
            )));
        }

        if self.display_width == 0 || self.display_height == 0 {
            return Err(Error::Config("display size must not be zero".to_string()));
        }

        if self.frame_rate == 0 || self.sample_rate == 0 {
            return Err(Error::Config(
                "frame and sample rates must not be zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Initial simulation parameters; feed, kill and speed go through the
    /// usual slider clamping.
    pub fn params(&self) -> SimulationParams {
        let mut params = SimulationParams {
            diffusion_a: self.diffusion_a,
            diffusion_b: self.diffusion_b,
            dt: self.dt,
            ..SimulationParams::default()
        };

        params.set_feed(self.feed);
        params.set_kill(self.kill);
        params.set_speed(self.speed);
        params
    }
}
