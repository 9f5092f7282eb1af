use rand::Rng;

use crate::error::{Error, Result};
use crate::f32range::F32Range;

pub const FEED_RANGE: F32Range = F32Range::new(0.01, 0.08);
pub const KILL_RANGE: F32Range = F32Range::new(0.04, 0.07);
pub const SPEED_RANGE: F32Range = F32Range::new(0.0, 5.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub feed: f32,
    pub kill: f32,
    pub diffusion_a: f32,
    pub diffusion_b: f32,
    pub dt: f32,
    pub speed: f32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        SimulationParams {
            feed: 0.055,
            kill: 0.062,
            diffusion_a: 1.0,
            diffusion_b: 0.5,
            dt: 1.0,
            speed: 1.0,
        }
    }
}

impl SimulationParams {
    pub fn set_feed(&mut self, feed: f32) {
        self.feed = FEED_RANGE.clamp(feed);
    }

    pub fn set_kill(&mut self, kill: f32) {
        self.kill = KILL_RANGE.clamp(kill);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = SPEED_RANGE.clamp(speed);
    }

    /// Presets bypass the slider clamp, they are tuned values.
    pub fn apply_preset(&mut self, preset: &Preset) {
        self.feed = preset.feed;
        self.kill = preset.kill;
    }

    pub fn randomize<R: Rng>(&mut self, rng: &mut R) {
        self.feed = 0.02 + rng.gen::<f32>() * 0.05;
        self.kill = 0.045 + rng.gen::<f32>() * 0.02;
    }

    pub fn feed_label(&self) -> String {
        format_param(self.feed)
    }

    pub fn kill_label(&self) -> String {
        format_param(self.kill)
    }

    pub fn speed_label(&self) -> String {
        format!("{:.1}x", self.speed)
    }
}

pub fn format_param(v: f32) -> String {
    format!("{:.3}", v)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub feed: f32,
    pub kill: f32,
}

#[rustfmt::skip]
pub const PRESETS: [Preset; 7] = [
    Preset { name: "Coral Growth", feed: 0.055,  kill: 0.062 },
    Preset { name: "Mitosis",      feed: 0.0367, kill: 0.0649 },
    Preset { name: "Fingerprints", feed: 0.037,  kill: 0.06 },
    Preset { name: "Spotted",      feed: 0.03,   kill: 0.062 },
    Preset { name: "Maze Runner",  feed: 0.029,  kill: 0.057 },
    Preset { name: "Worms",        feed: 0.078,  kill: 0.061 },
    Preset { name: "Bubbles",      feed: 0.025,  kill: 0.06 },
];

pub fn find_preset(name: &str) -> Result<&'static Preset> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| Error::UnknownPreset(name.to_string()))
}

/// What the pattern name label shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternLabel {
    Preset(&'static str),
    Custom,
    Random,
}

impl PatternLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternLabel::Preset(name) => name,
            PatternLabel::Custom => "Custom",
            PatternLabel::Random => "Random",
        }
    }
}
