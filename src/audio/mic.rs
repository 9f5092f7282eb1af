use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use super::analyser::{Analyser, FFT_SIZE};
use super::{AudioSource, SourceKind};
use crate::error::AudioError;

const BACKLOG: usize = FFT_SIZE * 4;

/// Live capture from the default input device. Dropping it closes the stream
/// and releases the device.
pub struct Microphone {
    _stream: cpal::Stream,
    samples: Arc<Mutex<VecDeque<f32>>>,
    scratch: Vec<f32>,
    analyser: Analyser,
    pub device_name: String,
}

impl Microphone {
    pub fn open() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(AudioError::NoDevice)?;
        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown input device".to_owned());

        let supported_config = device
            .default_input_config()
            .map_err(|err| AudioError::Device(format!("failed to read input config: {}", err)))?;
        let config = supported_config.config();

        let samples = Arc::new(Mutex::new(VecDeque::with_capacity(BACKLOG)));

        let stream = match supported_config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, samples.clone())?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, samples.clone())?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, samples.clone())?,
            other => {
                return Err(AudioError::Device(format!(
                    "unsupported input sample format {:?}",
                    other
                )));
            }
        };

        stream
            .play()
            .map_err(|err| AudioError::Device(format!("failed to start capture: {}", err)))?;

        log::info!("capturing from {}", device_name);

        Ok(Microphone {
            _stream: stream,
            samples,
            scratch: Vec::with_capacity(FFT_SIZE),
            analyser: Analyser::new(),
            device_name,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Arc<Mutex<VecDeque<f32>>>,
) -> Result<cpal::Stream, AudioError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = usize::from(config.channels.max(1));

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let mut backlog = match samples.lock() {
                    Ok(backlog) => backlog,
                    Err(_) => return,
                };

                for frame in data.chunks(channels) {
                    let sum: f32 = frame.iter().map(|s| s.to_sample::<f32>()).sum();
                    backlog.push_back(sum / frame.len() as f32);
                }

                while backlog.len() > BACKLOG {
                    backlog.pop_front();
                }
            },
            move |err| {
                log::warn!("microphone stream error: {}", err);
            },
            None,
        )
        .map_err(|err| AudioError::Device(format!("failed to build input stream: {}", err)))
}

impl AudioSource for Microphone {
    fn kind(&self) -> SourceKind {
        SourceKind::Microphone
    }

    fn frequency_data(&mut self) -> &[u8] {
        self.scratch.clear();
        if let Ok(backlog) = self.samples.lock() {
            let skip = backlog.len().saturating_sub(FFT_SIZE);
            self.scratch.extend(backlog.iter().skip(skip));
        }

        self.analyser.analyse(&self.scratch)
    }
}
