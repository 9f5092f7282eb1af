//! Audio-reactive modulation.
//!
//! A source (microphone or the built-in pad) supplies a byte magnitude
//! spectrum every frame. The spectrum is split into bass, mid and high energy
//! and those levels drive the simulation:
//!
//! * bass scales the number of steps per frame and, when loud, nudges `feed`
//!   upwards (it never relaxes back on its own);
//! * mid drives a brightness/saturation filter on the displayed image;
//! * high randomly drops small catalyst discs on the grid.

pub mod analyser;
#[cfg(feature = "mic")]
mod mic;
pub mod synth;

#[cfg(feature = "mic")]
pub use mic::Microphone;
pub use synth::AmbientPad;

use rand::Rng;

use crate::disturb;
use crate::error::AudioError;
use crate::grid::{Grid, SEED};
use crate::params::{SimulationParams, FEED_RANGE};

pub const MID_THRESHOLD: f32 = 0.3;
pub const HIGH_THRESHOLD: f32 = 0.5;
pub const HIGH_TRIGGER_CHANCE: f32 = 0.1;
pub const BASS_THRESHOLD: f32 = 0.6;
pub const BASS_FEED_GAIN: f32 = 0.0002;

pub const STATUS_IDLE: &str = "Click to enable audio";
pub const STATUS_MIC: &str = "Listening to you...";
pub const STATUS_SYNTH: &str = "Ambient synth playing...";
pub const STATUS_DENIED: &str = "Mic access denied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Microphone,
    Synth,
}

/// Anything that can hand over a fresh frequency spectrum once per frame.
pub trait AudioSource {
    fn kind(&self) -> SourceKind;

    /// Byte magnitudes, one per frequency bin, low frequencies first.
    fn frequency_data(&mut self) -> &[u8];

    /// Releases whatever the source holds; called right before it's dropped.
    fn stop(&mut self) {}
}

/// Opens the default capture device.
pub fn open_microphone() -> Result<Box<dyn AudioSource>, AudioError> {
    #[cfg(feature = "mic")]
    {
        Ok(Box::new(Microphone::open()?))
    }

    #[cfg(not(feature = "mic"))]
    {
        Err(AudioError::Unsupported)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandLevels {
    pub bass: f32,
    pub mid: f32,
    pub high: f32,
}

impl BandLevels {
    /// Mean energy of the first 10% of the bins, the next 40% and the rest,
    /// each normalized to `[0, 1]`.
    pub fn from_bins(bins: &[u8]) -> Self {
        let len = bins.len();
        let bass_end = len / 10;
        let mid_end = len / 2;

        let level = |band: &[u8]| {
            if band.is_empty() {
                return 0.0;
            }
            let sum: u32 = band.iter().map(|&b| u32::from(b)).sum();
            sum as f32 / (band.len() as f32 * 255.0)
        };

        BandLevels {
            bass: level(&bins[..bass_end]),
            mid: level(&bins[bass_end..mid_end]),
            high: level(&bins[mid_end..]),
        }
    }
}

/// Cosmetic filter applied to the displayed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualFilter {
    pub brightness: f32,
    pub saturation: f32,
}

impl VisualFilter {
    pub const NEUTRAL: VisualFilter = VisualFilter {
        brightness: 1.0,
        saturation: 1.0,
    };

    pub fn from_mid(mid: f32) -> Self {
        if mid > MID_THRESHOLD {
            let pulse = mid * 0.5;
            VisualFilter {
                brightness: 1.0 + pulse,
                saturation: 1.0 + pulse * 0.5,
            }
        } else {
            VisualFilter::NEUTRAL
        }
    }

    pub fn is_neutral(&self) -> bool {
        *self == VisualFilter::NEUTRAL
    }
}

impl Default for VisualFilter {
    fn default() -> Self {
        VisualFilter::NEUTRAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioState {
    Idle,
    MicActive,
    SynthActive,
}

/// Owns at most one live source and turns its spectrum into simulation
/// effects.
pub struct AudioModulator {
    source: Option<Box<dyn AudioSource>>,
    bins: Vec<u8>,
    levels: BandLevels,
    filter: VisualFilter,
    status: &'static str,
}

impl Default for AudioModulator {
    fn default() -> Self {
        AudioModulator::new()
    }
}

impl AudioModulator {
    pub fn new() -> Self {
        AudioModulator {
            source: None,
            bins: vec![],
            levels: BandLevels::default(),
            filter: VisualFilter::NEUTRAL,
            status: STATUS_IDLE,
        }
    }

    pub fn state(&self) -> AudioState {
        match self.source.as_ref().map(|s| s.kind()) {
            None => AudioState::Idle,
            Some(SourceKind::Microphone) => AudioState::MicActive,
            Some(SourceKind::Synth) => AudioState::SynthActive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    pub fn levels(&self) -> BandLevels {
        self.levels
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn filter(&self) -> VisualFilter {
        self.filter
    }

    pub fn status(&self) -> &'static str {
        self.status
    }

    /// Replaces whatever is running with `source`.
    pub fn start(&mut self, source: Box<dyn AudioSource>) {
        self.stop();

        self.status = match source.kind() {
            SourceKind::Microphone => STATUS_MIC,
            SourceKind::Synth => STATUS_SYNTH,
        };
        log::debug!("audio source started: {:?}", source.kind());
        self.source = Some(source);
    }

    pub fn stop(&mut self) {
        if let Some(mut source) = self.source.take() {
            log::debug!("audio source stopped: {:?}", source.kind());
            source.stop();
        }

        self.bins.clear();
        self.levels = BandLevels::default();
        self.filter = VisualFilter::NEUTRAL;
        self.status = STATUS_IDLE;
    }

    /// Mic button: stops the microphone when it's live, otherwise tears down
    /// the synth and tries to open the device. A failure leaves the modulator
    /// idle with a status message.
    pub fn toggle_microphone<F>(&mut self, open: F) -> Result<AudioState, AudioError>
    where
        F: FnOnce() -> Result<Box<dyn AudioSource>, AudioError>,
    {
        if self.state() == AudioState::MicActive {
            self.stop();
            return Ok(AudioState::Idle);
        }

        self.stop();
        match open() {
            Ok(source) => {
                self.start(source);
                Ok(self.state())
            }
            Err(err) => {
                log::warn!("microphone unavailable: {}", err);
                self.status = STATUS_DENIED;
                Err(err)
            }
        }
    }

    /// Synth button: stops the pad when it's playing, otherwise replaces the
    /// microphone (if any) with a fresh pad.
    pub fn toggle_synth<F>(&mut self, make: F) -> AudioState
    where
        F: FnOnce() -> Box<dyn AudioSource>,
    {
        if self.state() == AudioState::SynthActive {
            self.stop();
        } else {
            self.start(make());
        }

        self.state()
    }

    /// Pulls a spectrum from the live source and recomputes the band levels.
    pub fn analyse(&mut self) -> Option<BandLevels> {
        let source = self.source.as_mut()?;

        self.bins.clear();
        self.bins.extend_from_slice(source.frequency_data());
        self.levels = BandLevels::from_bins(&self.bins);

        Some(self.levels)
    }

    /// Applies the current band levels to the simulation. Does nothing while
    /// idle.
    pub fn modulate<R: Rng>(&mut self, params: &mut SimulationParams, grid: &mut Grid, rng: &mut R) {
        if !self.is_active() {
            return;
        }

        let BandLevels { bass, mid, high } = self.levels;

        self.filter = VisualFilter::from_mid(mid);

        if high > HIGH_THRESHOLD && rng.gen::<f32>() < HIGH_TRIGGER_CHANCE {
            let x = rng.gen_range(0..grid.width()) as i64;
            let y = rng.gen_range(0..grid.height()) as i64;
            let radius = 2 + (high * 5.0).floor() as i64;

            disturb::paint(grid, (x, y), radius, SEED);
        }

        if bass > BASS_THRESHOLD {
            let shift = (bass - BASS_THRESHOLD) * BASS_FEED_GAIN;
            params.feed = (params.feed + shift).min(FEED_RANGE.high());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Plays back a fixed spectrum.
    struct Fixed {
        kind: SourceKind,
        bins: Vec<u8>,
    }

    impl Fixed {
        fn boxed(kind: SourceKind, bins: Vec<u8>) -> Box<dyn AudioSource> {
            Box::new(Fixed { kind, bins })
        }
    }

    impl AudioSource for Fixed {
        fn kind(&self) -> SourceKind {
            self.kind
        }

        fn frequency_data(&mut self) -> &[u8] {
            &self.bins
        }
    }

    fn bins_with(bass: u8, mid: u8, high: u8) -> Vec<u8> {
        (0..128)
            .map(|i| match i {
                0..=11 => bass,
                12..=63 => mid,
                _ => high,
            })
            .collect()
    }

    #[test]
    fn band_split_on_128_bins() {
        let mut bins = vec![0u8; 128];
        for b in &mut bins[..=12] {
            *b = 255;
        }

        let levels = BandLevels::from_bins(&bins);
        assert_eq!(levels.bass, 1.0);
        assert!(levels.mid < 0.05);
        assert_eq!(levels.high, 0.0);
    }

    #[test]
    fn band_split_handles_tiny_inputs() {
        assert_eq!(BandLevels::from_bins(&[]), BandLevels::default());

        let levels = BandLevels::from_bins(&[255, 255, 255]);
        assert_eq!(levels.bass, 0.0);
        assert_eq!(levels.mid, 1.0);
        assert_eq!(levels.high, 1.0);
    }

    #[test]
    fn mid_filter_threshold() {
        assert!(VisualFilter::from_mid(0.3).is_neutral());
        let f = VisualFilter::from_mid(0.6);
        assert!((f.brightness - 1.3).abs() < 1e-6);
        assert!((f.saturation - 1.15).abs() < 1e-6);
    }

    #[test]
    fn sources_are_mutually_exclusive() {
        let mut audio = AudioModulator::new();
        assert_eq!(audio.state(), AudioState::Idle);
        assert_eq!(audio.status(), STATUS_IDLE);

        let state = audio.toggle_synth(|| Fixed::boxed(SourceKind::Synth, vec![]));
        assert_eq!(state, AudioState::SynthActive);
        assert_eq!(audio.status(), STATUS_SYNTH);

        let state = audio
            .toggle_microphone(|| Ok(Fixed::boxed(SourceKind::Microphone, vec![])))
            .unwrap();
        assert_eq!(state, AudioState::MicActive);

        // pressing mic again turns it off
        let state = audio.toggle_microphone(|| panic!("must not reopen")).unwrap();
        assert_eq!(state, AudioState::Idle);

        audio.toggle_synth(|| Fixed::boxed(SourceKind::Synth, vec![]));
        assert_eq!(audio.toggle_synth(|| panic!("must not restart")), AudioState::Idle);
    }

    #[test]
    fn denied_microphone_stays_idle() {
        let mut audio = AudioModulator::new();
        audio.toggle_synth(|| Fixed::boxed(SourceKind::Synth, vec![]));

        let res = audio.toggle_microphone(|| Err(AudioError::NoDevice));
        assert!(res.is_err());
        assert_eq!(audio.state(), AudioState::Idle);
        assert_eq!(audio.status(), STATUS_DENIED);
    }

    #[test]
    fn idle_modulator_changes_nothing() {
        let mut audio = AudioModulator::new();
        assert_eq!(audio.analyse(), None);

        let mut params = SimulationParams::default();
        let mut grid = Grid::new(16, 16);
        audio.modulate(&mut params, &mut grid, &mut StdRng::seed_from_u64(0));

        assert_eq!(params, SimulationParams::default());
        assert!(grid.cells().all(|(_, c)| c == (1.0, 0.0)));
    }

    #[test]
    fn loud_bass_nudges_feed_up_to_the_cap() {
        let mut audio = AudioModulator::new();
        audio.start(Fixed::boxed(SourceKind::Synth, bins_with(255, 0, 0)));
        audio.analyse();

        let mut params = SimulationParams::default();
        let mut grid = Grid::new(16, 16);
        let mut rng = StdRng::seed_from_u64(0);

        audio.modulate(&mut params, &mut grid, &mut rng);
        assert!((params.feed - (0.055 + 0.4 * 0.0002)).abs() < 1e-7);

        params.feed = 0.07999;
        audio.modulate(&mut params, &mut grid, &mut rng);
        assert_eq!(params.feed, 0.08);
    }

    #[test]
    fn quiet_bass_leaves_feed_alone() {
        let mut audio = AudioModulator::new();
        audio.start(Fixed::boxed(SourceKind::Synth, bins_with(150, 0, 0)));
        audio.analyse();

        let mut params = SimulationParams::default();
        audio.modulate(&mut params, &mut Grid::new(8, 8), &mut StdRng::seed_from_u64(0));
        assert_eq!(params.feed, 0.055);
    }

    #[test]
    fn highs_drop_catalyst_sometimes() {
        let mut audio = AudioModulator::new();
        audio.start(Fixed::boxed(SourceKind::Synth, bins_with(0, 0, 255)));
        audio.analyse();

        let mut params = SimulationParams::default();
        let mut grid = Grid::new(64, 64);
        let mut rng = StdRng::seed_from_u64(21);

        let mut hits = 0;
        for _ in 0..200 {
            let before = grid.b().iter().filter(|&&b| b == 1.0).count();
            audio.modulate(&mut params, &mut grid, &mut rng);
            let after = grid.b().iter().filter(|&&b| b == 1.0).count();
            if after > before {
                hits += 1;
            }
        }

        // 10% of 200 ticks, give or take
        assert!(hits > 5 && hits < 45, "hits = {}", hits);
        assert!(grid.cells().all(|(_, c)| c == (1.0, 0.0) || c == SEED));
    }

    #[test]
    fn full_highs_drop_a_radius_seven_disc() {
        let mut audio = AudioModulator::new();
        audio.start(Fixed::boxed(SourceKind::Synth, bins_with(0, 0, 255)));
        audio.analyse();
        assert_eq!(audio.levels().high, 1.0);

        let mut params = SimulationParams::default();
        let mut grid = Grid::new(64, 64);
        let mut rng = StdRng::seed_from_u64(4);

        let mut ticks = 0;
        while grid.cells().all(|(_, c)| c == (1.0, 0.0)) {
            audio.modulate(&mut params, &mut grid, &mut rng);
            ticks += 1;
            assert!(ticks < 1000, "highs never triggered");
        }

        let changed: Vec<_> = grid.cells().filter(|(_, c)| *c != (1.0, 0.0)).collect();
        // lattice points with dx² + dy² <= 7²
        assert_eq!(changed.len(), 149);
        assert!(changed.iter().all(|(_, c)| *c == SEED));
    }

    #[test]
    fn stop_resets_filter_and_levels() {
        let mut audio = AudioModulator::new();
        audio.start(Fixed::boxed(SourceKind::Microphone, bins_with(0, 200, 0)));
        audio.analyse();
        audio.modulate(
            &mut SimulationParams::default(),
            &mut Grid::new(8, 8),
            &mut StdRng::seed_from_u64(0),
        );
        assert!(!audio.filter().is_neutral());
        assert_eq!(audio.bins().len(), 128);

        audio.stop();
        assert!(audio.filter().is_neutral());
        assert_eq!(audio.levels(), BandLevels::default());
        assert!(audio.bins().is_empty());
    }
}
