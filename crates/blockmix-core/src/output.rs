//! CPAL audio output driving a [`SinkProcessor`].

use crate::config::MAX_BLOCK_SIZE;
use crate::{Error, Result, SinkProcessor};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Wrapper to hold `cpal::Stream` in a `Send` context.
///
/// # Safety
/// `cpal::Stream` is `!Send` due to platform internals. The handle is only
/// stored and dropped, never used from another thread.
struct StreamHandle(#[allow(dead_code)] cpal::Stream);

unsafe impl Send for StreamHandle {}

/// A running output stream. Dropping it stops playback on the device.
pub struct OutputStream {
    sample_rate: f64,
    channels: usize,
    _stream: StreamHandle,
}

impl OutputStream {
    /// Opens the output device and starts pulling audio from `sink`.
    ///
    /// The device must run at `sample_rate`; the engine does not convert rates
    /// on the way out.
    pub fn start(sink: SinkProcessor, device_index: Option<usize>, sample_rate: f64) -> Result<Self> {
        let device = get_device(device_index)?;
        let config = device.default_output_config()?;
        let device_rate = config.sample_rate().0 as f64;
        if (device_rate - sample_rate).abs() > f64::EPSILON {
            return Err(Error::InvalidDevice(format!(
                "device runs at {device_rate} Hz, engine at {sample_rate} Hz"
            )));
        }
        let channels = config.channels() as usize;

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config.into(), sink)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config.into(), sink)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config.into(), sink)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        stream.play()?;

        Ok(Self {
            sample_rate: device_rate,
            channels,
            _stream: StreamHandle(stream),
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }
}

/// Sample rate of the selected (or default) output device.
pub fn device_sample_rate(device_index: Option<usize>) -> Result<f64> {
    let config = get_device(device_index)?.default_output_config()?;
    Ok(config.sample_rate().0 as f64)
}

fn get_device(index: Option<usize>) -> Result<cpal::Device> {
    let host = cpal::default_host();

    match index {
        Some(i) => {
            let devices: Vec<_> = host.output_devices()?.collect();
            let count = devices.len();
            devices.into_iter().nth(i).ok_or_else(|| {
                Error::InvalidDevice(format!("Device index {i} out of range ({count} available)"))
            })
        }
        None => host
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into())),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut sink: SinkProcessor,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut scratch = vec![0.0f32; MAX_BLOCK_SIZE * channels];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                for chunk in data.chunks_mut(scratch.len()) {
                    let out = &mut scratch[..chunk.len()];
                    sink.process_interleaved(out, channels);
                    for (dst, &src) in chunk.iter_mut().zip(out.iter()) {
                        *dst = T::from_sample(src);
                    }
                }
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        |_err| {},
        None,
    )?;

    Ok(stream)
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0);
    }
}
