//! Byte-scaled magnitude spectrum of the most recent block of samples.
//!
//! Behaves like a browser analyser node: Blackman window, radix-2 FFT,
//! magnitudes normalized by the block size, exponential smoothing between
//! frames and a dB to byte mapping between `MIN_DECIBELS` and `MAX_DECIBELS`.

use std::f32::consts::PI;

pub const FFT_SIZE: usize = 256;
pub const BIN_COUNT: usize = FFT_SIZE / 2;

const SMOOTHING: f32 = 0.8;
const MIN_DECIBELS: f32 = -100.0;
const MAX_DECIBELS: f32 = -30.0;

#[derive(Debug, Clone)]
pub struct Analyser {
    window: Vec<f32>,
    re: Vec<f32>,
    im: Vec<f32>,
    smoothed: Vec<f32>,
    bins: Vec<u8>,
}

impl Default for Analyser {
    fn default() -> Self {
        Analyser::new()
    }
}

impl Analyser {
    pub fn new() -> Self {
        Analyser {
            window: blackman_window(FFT_SIZE),
            re: vec![0.0; FFT_SIZE],
            im: vec![0.0; FFT_SIZE],
            smoothed: vec![0.0; BIN_COUNT],
            bins: vec![0; BIN_COUNT],
        }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    /// Analyses the last `FFT_SIZE` samples of `samples` (zero padded at the
    /// front when there are fewer) and returns the byte spectrum.
    pub fn analyse(&mut self, samples: &[f32]) -> &[u8] {
        let take = samples.len().min(FFT_SIZE);
        let pad = FFT_SIZE - take;
        let tail = &samples[samples.len() - take..];

        for i in 0..FFT_SIZE {
            let s = if i < pad { 0.0 } else { tail[i - pad] };
            self.re[i] = s * self.window[i];
            self.im[i] = 0.0;
        }

        fft_in_place(&mut self.re, &mut self.im);

        let scale = 1.0 / FFT_SIZE as f32;
        for k in 0..BIN_COUNT {
            let mag = (self.re[k] * self.re[k] + self.im[k] * self.im[k]).sqrt() * scale;
            self.smoothed[k] = SMOOTHING * self.smoothed[k] + (1.0 - SMOOTHING) * mag;
            self.bins[k] = to_byte(self.smoothed[k]);
        }

        &self.bins
    }
}

fn to_byte(magnitude: f32) -> u8 {
    if magnitude <= 0.0 {
        return 0;
    }

    let db = 20.0 * magnitude.log10();
    let scaled = 255.0 * (db - MIN_DECIBELS) / (MAX_DECIBELS - MIN_DECIBELS);
    scaled.max(0.0).min(255.0) as u8
}

fn blackman_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|n| {
            let t = 2.0 * PI * n as f32 / size as f32;
            0.42 - 0.5 * t.cos() + 0.08 * (2.0 * t).cos()
        })
        .collect()
}

/// Iterative Cooley-Tukey radix-2 FFT over split real/imaginary buffers.
fn fft_in_place(re: &mut [f32], im: &mut [f32]) {
    let n = re.len();
    debug_assert!(n.is_power_of_two());
    debug_assert_eq!(n, im.len());

    let mut j = 0;
    for i in 0..n {
        if i < j {
            re.swap(i, j);
            im.swap(i, j);
        }
        let mut m = n >> 1;
        while m >= 1 && j >= m {
            j -= m;
            m >>= 1;
        }
        j += m;
    }

    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle = -2.0 * PI / len as f32;
        let (wn_re, wn_im) = (angle.cos(), angle.sin());

        for start in (0..n).step_by(len) {
            let (mut w_re, mut w_im) = (1.0f32, 0.0f32);

            for k in 0..half {
                let (a, b) = (start + k, start + k + half);
                let t_re = re[b] * w_re - im[b] * w_im;
                let t_im = re[b] * w_im + im[b] * w_re;

                re[b] = re[a] - t_re;
                im[b] = im[a] - t_im;
                re[a] += t_re;
                im[a] += t_im;

                let next_re = w_re * wn_re - w_im * wn_im;
                w_im = w_re * wn_im + w_im * wn_re;
                w_re = next_re;
            }
        }

        len <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_bin: f32, amplitude: f32) -> Vec<f32> {
        (0..FFT_SIZE)
            .map(|i| amplitude * (2.0 * PI * freq_bin * i as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn silence_is_all_zero() {
        let mut analyser = Analyser::new();
        assert!(analyser.analyse(&[0.0; FFT_SIZE]).iter().all(|&b| b == 0));
        assert_eq!(analyser.bins().len(), BIN_COUNT);
    }

    #[test]
    fn fft_finds_the_tone() {
        let mut re = sine(8.0, 1.0);
        let mut im = vec![0.0; FFT_SIZE];
        fft_in_place(&mut re, &mut im);

        let mags: Vec<f32> = (0..BIN_COUNT)
            .map(|k| (re[k] * re[k] + im[k] * im[k]).sqrt())
            .collect();
        let peak = (0..BIN_COUNT)
            .max_by(|&a, &b| mags[a].partial_cmp(&mags[b]).unwrap())
            .unwrap();

        assert_eq!(peak, 8);
        assert!((mags[8] - FFT_SIZE as f32 / 2.0).abs() < 0.1);
    }

    #[test]
    fn loud_tone_lights_up_its_bin_after_smoothing() {
        let mut analyser = Analyser::new();
        let signal = sine(20.0, 0.8);
        for _ in 0..30 {
            analyser.analyse(&signal);
        }

        let bins = analyser.bins();
        assert!(bins[20] > 200, "bin 20 = {}", bins[20]);
        assert!(bins[100] < bins[20]);
    }

    #[test]
    fn short_input_is_padded() {
        let mut analyser = Analyser::new();
        let bins = analyser.analyse(&[0.5; 10]);
        assert_eq!(bins.len(), BIN_COUNT);
    }
}
