//! Built-in ambient pad: a drone of detuning oscillators plus sub-bass pulses
//! at random intervals. Samples are generated on the pad's own clock, one
//! animation frame worth per call, and handed to the analyser.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::analyser::{Analyser, FFT_SIZE};
use super::{AudioSource, SourceKind};

const PAD_NOTES: [f32; 6] = [55.0, 82.5, 110.0, 165.0, 220.0, 330.0];
const PULSE_NOTES: [f32; 5] = [55.0, 65.4, 73.4, 82.4, 110.0];

const MASTER_GAIN: f32 = 0.15;
const PAD_GAIN: f32 = 0.3 / PAD_NOTES.len() as f32;

const PULSE_PEAK: f32 = 0.4;
const PULSE_FLOOR: f32 = 0.01;
const PULSE_ATTACK: f64 = 0.05;
const PULSE_DECAY_END: f64 = 0.8;
const PULSE_LENGTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

impl Waveform {
    fn sample(self, phase: f64) -> f32 {
        match self {
            Waveform::Sine => (phase * TAU).sin() as f32,
            Waveform::Triangle => (1.0 - 4.0 * (phase - 0.5).abs()) as f32,
        }
    }
}

#[derive(Debug, Clone)]
struct Voice {
    freq: f32,
    waveform: Waveform,
    phase: f64,
    lfo_freq: f32,
    lfo_depth: f32,
    lfo_phase: f64,
}

impl Voice {
    fn next(&mut self, sample_rate: f64) -> f32 {
        let lfo = (self.lfo_phase * TAU).sin() as f32;
        let freq = f64::from(self.freq + self.lfo_depth * lfo);

        let out = self.waveform.sample(self.phase);
        self.phase = (self.phase + freq / sample_rate).fract();
        self.lfo_phase = (self.lfo_phase + f64::from(self.lfo_freq) / sample_rate).fract();
        out
    }
}

#[derive(Debug, Clone)]
struct Pulse {
    freq: f32,
    phase: f64,
    started_at: f64,
}

impl Pulse {
    /// Gain envelope `t` seconds after the start: linear attack, exponential
    /// decay down to the floor, then silence once the note is stopped.
    fn envelope(t: f64) -> Option<f32> {
        if t < 0.0 || t >= PULSE_LENGTH {
            None
        } else if t < PULSE_ATTACK {
            Some(PULSE_PEAK * (t / PULSE_ATTACK) as f32)
        } else if t < PULSE_DECAY_END {
            let k = ((t - PULSE_ATTACK) / (PULSE_DECAY_END - PULSE_ATTACK)) as f32;
            Some(PULSE_PEAK * (PULSE_FLOOR / PULSE_PEAK).powf(k))
        } else {
            Some(PULSE_FLOOR)
        }
    }
}

pub struct AmbientPad {
    sample_rate: f64,
    frame_period: f64,
    clock: f64,
    rng: StdRng,

    voices: Vec<Voice>,
    pulses: Vec<Pulse>,
    next_pulse_at: Option<f64>,

    history: Vec<f32>,
    analyser: Analyser,
}

impl AmbientPad {
    /// Starts the pad; every call to `frequency_data` advances the clock by
    /// `1 / frame_rate` seconds.
    pub fn new(sample_rate: u32, frame_rate: u32, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let voices = PAD_NOTES
            .iter()
            .enumerate()
            .map(|(i, &freq)| Voice {
                freq,
                waveform: if (2..4).contains(&i) {
                    Waveform::Triangle
                } else {
                    Waveform::Sine
                },
                phase: 0.0,
                lfo_freq: 0.1 + rng.gen::<f32>() * 0.3,
                lfo_depth: freq * 0.02,
                lfo_phase: 0.0,
            })
            .collect();

        let mut pad = AmbientPad {
            sample_rate: f64::from(sample_rate.max(1)),
            frame_period: 1.0 / f64::from(frame_rate.max(1)),
            clock: 0.0,
            rng,
            voices,
            pulses: vec![],
            next_pulse_at: None,
            history: Vec::with_capacity(FFT_SIZE * 2),
            analyser: Analyser::new(),
        };

        // the first pulse fires right away and schedules the next one
        pad.fire_pulse();
        pad
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn is_running(&self) -> bool {
        !self.voices.is_empty()
    }

    pub fn next_pulse_at(&self) -> Option<f64> {
        self.next_pulse_at
    }

    pub fn active_pulses(&self) -> usize {
        self.pulses.len()
    }

    /// Silences every voice and cancels the pending pulse.
    pub fn stop(&mut self) {
        self.voices.clear();
        self.pulses.clear();
        self.next_pulse_at = None;
    }

    fn fire_pulse(&mut self) {
        let freq = PULSE_NOTES[self.rng.gen_range(0..PULSE_NOTES.len())];
        self.pulses.push(Pulse {
            freq,
            phase: 0.0,
            started_at: self.clock,
        });

        let wait = 0.5 + self.rng.gen::<f64>() * 1.5;
        self.next_pulse_at = Some(self.clock + wait);
    }

    fn next_sample(&mut self) -> f32 {
        if let Some(at) = self.next_pulse_at {
            if self.clock >= at {
                self.fire_pulse();
            }
        }

        let sample_rate = self.sample_rate;
        let mut out: f32 = self
            .voices
            .iter_mut()
            .map(|v| v.next(sample_rate) * PAD_GAIN)
            .sum();

        let clock = self.clock;
        self.pulses.retain(|p| Pulse::envelope(clock - p.started_at).is_some());
        for p in &mut self.pulses {
            if let Some(gain) = Pulse::envelope(clock - p.started_at) {
                out += (p.phase * TAU).sin() as f32 * gain;
            }
            p.phase = (p.phase + f64::from(p.freq) / sample_rate).fract();
        }

        self.clock += 1.0 / sample_rate;
        out * MASTER_GAIN
    }

    /// Renders one frame worth of samples into the history buffer.
    pub fn render_frame(&mut self) {
        let count = (self.frame_period * self.sample_rate).round() as usize;
        for _ in 0..count {
            let s = self.next_sample();
            self.history.push(s);
        }

        if self.history.len() > FFT_SIZE {
            let excess = self.history.len() - FFT_SIZE;
            self.history.drain(..excess);
        }
    }
}

impl AudioSource for AmbientPad {
    fn kind(&self) -> SourceKind {
        SourceKind::Synth
    }

    fn frequency_data(&mut self) -> &[u8] {
        self.render_frame();
        self.analyser.analyse(&self.history)
    }

    fn stop(&mut self) {
        AmbientPad::stop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        assert_eq!(Pulse::envelope(0.0), Some(0.0));
        assert!((Pulse::envelope(0.05).unwrap() - 0.4).abs() < 1e-6);
        assert!((Pulse::envelope(0.8).unwrap() - 0.01).abs() < 1e-6);
        assert!(Pulse::envelope(0.4).unwrap() < 0.4);
        assert!(Pulse::envelope(0.4).unwrap() > 0.01);
        assert_eq!(Pulse::envelope(1.0), None);
    }

    #[test]
    fn triangle_wave_range() {
        assert_eq!(Waveform::Triangle.sample(0.0), -1.0);
        assert_eq!(Waveform::Triangle.sample(0.5), 1.0);
        assert_eq!(Waveform::Triangle.sample(0.25), 0.0);
    }

    #[test]
    fn pulses_reschedule_themselves() {
        let mut pad = AmbientPad::new(8000, 60, 5);
        let first = pad.next_pulse_at().unwrap();
        assert!((0.5..=2.0).contains(&first));

        // run for five seconds of pad time
        for _ in 0..300 {
            pad.frequency_data();
        }
        let later = pad.next_pulse_at().unwrap();
        assert!(later > first);
        assert!(later > pad.clock());
        assert!(later - pad.clock() <= 2.0);
    }

    #[test]
    fn stop_cancels_pending_pulse() {
        let mut pad = AmbientPad::new(8000, 60, 9);
        pad.stop();
        assert!(!pad.is_running());
        assert_eq!(pad.next_pulse_at(), None);

        for _ in 0..180 {
            pad.frequency_data();
        }
        assert_eq!(pad.active_pulses(), 0);
        assert_eq!(pad.next_pulse_at(), None);
        assert!(pad.frequency_data().iter().all(|&b| b == 0));
    }

    #[test]
    fn pad_has_bass_heavy_spectrum() {
        let mut pad = AmbientPad::new(44100, 60, 1);
        let mut bins = vec![];
        for _ in 0..30 {
            bins = pad.frequency_data().to_vec();
        }

        let low: u32 = bins[..8].iter().map(|&b| u32::from(b)).sum();
        let high: u32 = bins[64..72].iter().map(|&b| u32::from(b)).sum();
        assert!(low > high);
    }
}
