use std::path::Path;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::audio::{self, AmbientPad, AudioModulator, AudioState, AudioSource};
use crate::color::{builtin_schemes, ColorScheme};
use crate::config::Config;
use crate::disturb::{self, Chemical};
use crate::error::{AudioError, Error, Result};
use crate::grid::Grid;
use crate::integrator;
use crate::params::{PatternLabel, Preset, SimulationParams, PRESETS};
use crate::render::{AudioVisualizer, ParameterMap, Renderer};

const PARAMETER_MAP_SIZE: (u32, u32) = (200, 150);
const VISUALIZER_SIZE: (u32, u32) = (256, 64);

/// Steps to run in one frame: two per unit of speed, at least one, scaled up
/// by the bass level while audio is live.
pub fn iterations(speed: f32, bass: Option<f32>) -> usize {
    let base = ((speed * 2.0).floor() as usize).max(1);

    match bass {
        Some(bass) => ((base as f32 * (1.0 + bass)).floor() as usize).max(1),
        None => base,
    }
}

/// Everything the app knows, owned in one place. The host calls `frame` once
/// per display refresh and forwards user input to the other methods.
pub struct Simulation {
    grid: Grid,
    params: SimulationParams,

    schemes: Vec<ColorScheme>,
    scheme: usize,
    label: PatternLabel,
    playing: bool,
    brush_size: f32,
    chemical: Chemical,

    renderer: Renderer,
    parameter_map: ParameterMap,
    visualizer: AudioVisualizer,
    audio: AudioModulator,

    sample_rate: u32,
    frame_rate: u32,
    frames: u64,
    rng: StdRng,
}

impl Simulation {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let schemes = builtin_schemes();
        if config.color_scheme >= schemes.len() {
            return Err(Error::UnknownScheme(config.color_scheme.to_string()));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut grid = Grid::new(config.width, config.height);
        grid.reset(&mut rng);

        let renderer = Renderer::new(&grid, config.display_width, config.display_height);
        let (map_w, map_h) = PARAMETER_MAP_SIZE;
        let (viz_w, viz_h) = VISUALIZER_SIZE;

        let params = config.params();
        let label = PRESETS
            .iter()
            .find(|p| p.feed == params.feed && p.kill == params.kill)
            .map_or(PatternLabel::Custom, |p| PatternLabel::Preset(p.name));

        log::info!(
            "{}x{} grid, feed {} kill {}",
            config.width,
            config.height,
            params.feed_label(),
            params.kill_label()
        );

        Ok(Simulation {
            grid,
            params,
            schemes,
            scheme: config.color_scheme,
            label,
            playing: true,
            brush_size: config.brush_size,
            chemical: Chemical::A,
            renderer,
            parameter_map: ParameterMap::new(map_w, map_h),
            visualizer: AudioVisualizer::new(viz_w, viz_h),
            audio: AudioModulator::new(),
            sample_rate: config.sample_rate,
            frame_rate: config.frame_rate,
            frames: 0,
            rng,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn parameter_map(&self) -> &ParameterMap {
        &self.parameter_map
    }

    pub fn visualizer(&self) -> &AudioVisualizer {
        &self.visualizer
    }

    pub fn audio(&self) -> &AudioModulator {
        &self.audio
    }

    pub fn scheme(&self) -> &ColorScheme {
        &self.schemes[self.scheme]
    }

    pub fn schemes(&self) -> &[ColorScheme] {
        &self.schemes
    }

    pub fn pattern_name(&self) -> &'static str {
        self.label.as_str()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// One display refresh: audio first, then the integration steps (unless
    /// paused), then everything is redrawn, paused or not.
    pub fn frame(&mut self) {
        let bass = match self.audio.analyse() {
            Some(levels) => {
                self.audio
                    .modulate(&mut self.params, &mut self.grid, &mut self.rng);
                Some(levels.bass)
            }
            None => None,
        };

        if self.playing {
            let n = iterations(self.params.speed, bass);
            integrator::simulate_n(&mut self.grid, &self.params, n);
        }

        self.render();
        self.frames += 1;
    }

    fn render(&mut self) {
        self.renderer
            .render(&self.grid, &self.schemes[self.scheme], self.audio.filter());
        self.parameter_map.draw(self.params.feed, self.params.kill);

        if self.audio.is_active() {
            self.visualizer.draw(self.audio.bins());
        }
    }

    pub fn toggle_play(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn reset(&mut self) {
        log::debug!("reseeding grid");
        self.grid.reset(&mut self.rng);
    }

    pub fn apply_preset(&mut self, preset: &Preset) {
        log::debug!("preset {}", preset.name);
        self.params.apply_preset(preset);
        self.label = PatternLabel::Preset(preset.name);
        self.parameter_map.draw(self.params.feed, self.params.kill);
    }

    pub fn set_feed(&mut self, feed: f32) {
        self.params.set_feed(feed);
        self.label = PatternLabel::Custom;
        self.parameter_map.draw(self.params.feed, self.params.kill);
    }

    pub fn set_kill(&mut self, kill: f32) {
        self.params.set_kill(kill);
        self.label = PatternLabel::Custom;
        self.parameter_map.draw(self.params.feed, self.params.kill);
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.params.set_speed(speed);
    }

    pub fn randomize(&mut self) {
        self.params.randomize(&mut self.rng);
        self.label = PatternLabel::Random;
        self.parameter_map.draw(self.params.feed, self.params.kill);
    }

    /// Click on the parameter map at `(x, y)` in map pixels.
    pub fn pick_parameters(&mut self, x: f32, y: f32) {
        let (feed, kill) = self.parameter_map.pick(x, y);
        self.params.set_feed(feed);
        self.params.set_kill(kill);
        self.label = PatternLabel::Custom;
        self.parameter_map.draw(self.params.feed, self.params.kill);
    }

    pub fn set_brush_size(&mut self, size: f32) {
        self.brush_size = size.max(0.0);
    }

    pub fn select_chemical(&mut self, chemical: Chemical) {
        self.chemical = chemical;
    }

    pub fn select_scheme(&mut self, index: usize) -> Result<()> {
        if index >= self.schemes.len() {
            return Err(Error::UnknownScheme(index.to_string()));
        }

        self.scheme = index;
        Ok(())
    }

    /// Pointer down or drag at `pointer`, in display pixels.
    pub fn paint(&mut self, pointer: (f32, f32)) {
        let (w, h) = self.renderer.display().dimensions();
        disturb::disturb_at_pointer(
            &mut self.grid,
            pointer,
            (w as f32, h as f32),
            self.brush_size,
            self.chemical,
        );
    }

    pub fn toggle_microphone(&mut self) -> std::result::Result<AudioState, AudioError> {
        self.audio.toggle_microphone(audio::open_microphone)
    }

    pub fn toggle_synth(&mut self) -> AudioState {
        let (sample_rate, frame_rate) = (self.sample_rate, self.frame_rate);
        let seed = self.rng.next_u64();

        self.audio.toggle_synth(|| -> Box<dyn AudioSource> {
            Box::new(AmbientPad::new(sample_rate, frame_rate, seed))
        })
    }

    /// Plugs in any other spectrum source, replacing the running one.
    pub fn start_audio(&mut self, source: Box<dyn AudioSource>) {
        self.audio.start(source);
    }

    pub fn stop_audio(&mut self) {
        self.audio.stop();
    }

    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.renderer.save_png(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            width: 32,
            height: 32,
            display_width: 64,
            display_height: 64,
            seed: Some(1),
            ..Config::default()
        }
    }

    #[test]
    fn iteration_counts() {
        assert_eq!(iterations(0.0, None), 1);
        assert_eq!(iterations(0.4, None), 1);
        assert_eq!(iterations(1.0, None), 2);
        assert_eq!(iterations(2.6, None), 5);
        assert_eq!(iterations(1.0, Some(0.0)), 2);
        assert_eq!(iterations(1.0, Some(1.0)), 4);
        assert_eq!(iterations(2.0, Some(0.5)), 6);
        assert_eq!(iterations(0.0, Some(0.4)), 1);
    }

    #[test]
    fn paused_frame_still_renders_paint() {
        let mut sim = Simulation::new(&config()).unwrap();
        sim.grid_mut().fill((1.0, 0.0));
        sim.toggle_play();

        sim.paint((2.0, 2.0));
        let before = sim.grid().clone();
        sim.frame();

        assert_eq!(sim.grid().b(), before.b());
        assert_eq!(sim.frames(), 1);
        // the painted corner shows the top color, the rest the bottom one
        let top = sim.scheme().colors()[2].to_rgba(255);
        assert_eq!(*sim.renderer().native().get_pixel(1, 1), top);
    }

    #[test]
    fn playing_frame_advances_grid() {
        let mut sim = Simulation::new(&config()).unwrap();
        let before = sim.grid().clone();
        sim.frame();
        assert_ne!(sim.grid().b(), before.b());
    }

    #[test]
    fn label_follows_parameter_source() {
        let mut sim = Simulation::new(&config()).unwrap();
        assert_eq!(sim.pattern_name(), "Coral Growth");

        sim.apply_preset(&PRESETS[1]);
        assert_eq!(sim.pattern_name(), "Mitosis");
        assert_eq!(sim.parameter_map().label(), "F: 0.037 | K: 0.065");

        sim.set_kill(0.05);
        assert_eq!(sim.pattern_name(), "Custom");

        sim.randomize();
        assert_eq!(sim.pattern_name(), "Random");

        sim.pick_parameters(0.0, 0.0);
        assert_eq!(sim.pattern_name(), "Custom");
        assert_eq!(sim.params().feed, 0.01);
        assert!((sim.params().kill - 0.07).abs() < 1e-6);
    }

    #[test]
    fn scheme_selection_is_checked() {
        let mut sim = Simulation::new(&config()).unwrap();
        assert!(sim.select_scheme(7).is_ok());
        assert_eq!(sim.scheme().name, "Rave Sunrise");
        assert!(sim.select_scheme(8).is_err());
        assert_eq!(sim.scheme().name, "Rave Sunrise");
    }

    #[test]
    fn synth_toggles_and_feeds_visualizer() {
        let mut sim = Simulation::new(&config()).unwrap();
        assert_eq!(sim.toggle_synth(), AudioState::SynthActive);

        for _ in 0..5 {
            sim.frame();
        }
        assert_eq!(sim.audio().bins().len(), 128);

        assert_eq!(sim.toggle_synth(), AudioState::Idle);
        assert!(sim.audio().bins().is_empty());
    }

    #[cfg(not(feature = "mic"))]
    #[test]
    fn microphone_without_backend_stays_idle() {
        let mut sim = Simulation::new(&config()).unwrap();
        sim.toggle_synth();

        assert!(matches!(sim.toggle_microphone(), Err(AudioError::Unsupported)));
        assert_eq!(sim.audio().state(), AudioState::Idle);
        assert_eq!(sim.audio().status(), audio::STATUS_DENIED);
    }

    #[test]
    fn bad_scheme_in_config() {
        let config = Config {
            color_scheme: 99,
            ..config()
        };
        assert!(Simulation::new(&config).is_err());
    }
}
