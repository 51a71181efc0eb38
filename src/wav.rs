use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use getset::{CopyGetters, Getters};
use hound::{SampleFormat, WavReader};
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};

/// Decoded audio of the first channel of a WAV file.
#[derive(Getters, CopyGetters, Debug, Clone)]
pub struct AudioBuffer {
    /// samples normalized to [-1, 1] for integer PCM.
    #[getset(get = "pub")]
    samples: Vec<f64>,

    /// sampling rate in Hz.
    #[getset(get_copy = "pub")]
    sample_rate: u32,

    /// bits per sample as stored in the file.
    #[getset(get_copy = "pub")]
    bit_depth: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32, bit_depth: u16) -> Self {
        Self {
            samples,
            sample_rate,
            bit_depth,
        }
    }

    /// Opens and decodes a WAV file.
    ///
    /// # Errors
    /// * `FileNotFound` - the path cannot be opened for reading
    /// * `UnsupportedFormat` - the header is invalid or the file holds no samples
    /// * `FileUnreadable` - sample data cannot be read after a valid header
    /// * `Allocation` - the sample buffer cannot be reserved
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(AnalysisError::FileNotFound)?;
        let reader = WavReader::new(BufReader::new(file))?;
        let spec = reader.spec();
        let length = reader.duration() as usize;
        if length == 0 {
            return Err(AnalysisError::UnsupportedFormat(format!(
                "{} holds no samples",
                path.display()
            )));
        }
        if spec.channels > 1 {
            warn!(
                path = %path.display(),
                channels = spec.channels,
                "multi-channel file, only the first channel is analyzed"
            );
        }
        debug!(
            path = %path.display(),
            sample_rate = spec.sample_rate,
            bit_depth = spec.bits_per_sample,
            length,
            "loading wav"
        );

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(length)
            .map_err(|e| AnalysisError::Allocation(e.to_string()))?;

        let channels = spec.channels.max(1) as usize;
        match spec.sample_format {
            SampleFormat::Float => {
                for x in reader.into_samples::<f32>().step_by(channels) {
                    samples.push(x? as f64);
                }
            }
            SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
                for x in reader.into_samples::<i32>().step_by(channels) {
                    samples.push(x? as f64 / max_val);
                }
            }
        }

        Ok(Self::new(samples, spec.sample_rate, spec.bits_per_sample))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}
