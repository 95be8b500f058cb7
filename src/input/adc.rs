//! Analog input sampling.
//!
//! The bridge reads one value per channel per cycle through the [`Sampler`]
//! trait. [`SysfsSampler`] reads Linux IIO-style attribute files, where each
//! channel is a file holding a single decimal number.

use crate::config::AdcConfig;
use crate::error::SampleError;
use std::fs;

/// Source of raw analog samples.
pub trait Sampler {
    /// Read the current value of a channel, in millivolts.
    fn sample(&mut self, channel: &str) -> Result<f64, SampleError>;
}

impl<S: Sampler + ?Sized> Sampler for &mut S {
    fn sample(&mut self, channel: &str) -> Result<f64, SampleError> {
        (**self).sample(channel)
    }
}

/// Reads channels from files named by a path template.
#[derive(Debug, Clone)]
pub struct SysfsSampler {
    path_template: String,
    scale: f64,
}

impl SysfsSampler {
    pub fn new(config: &AdcConfig) -> Self {
        Self {
            path_template: config.path_template.clone(),
            scale: config.scale,
        }
    }

    /// File backing a channel.
    pub fn path_for(&self, channel: &str) -> String {
        self.path_template.replace("{channel}", channel)
    }
}

impl Sampler for SysfsSampler {
    fn sample(&mut self, channel: &str) -> Result<f64, SampleError> {
        let path = self.path_for(channel);
        let raw = fs::read_to_string(&path).map_err(|source| SampleError::Read {
            path: path.clone(),
            source,
        })?;
        let value: f64 = raw.trim().parse().map_err(|_| SampleError::Parse {
            path,
            value: raw.trim().to_string(),
        })?;
        Ok(value * self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "adc-button-bridge-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_path_template() {
        let sampler = SysfsSampler::new(&AdcConfig {
            path_template: "/sys/bus/iio/devices/iio:device0/in_voltage{channel}_raw".to_string(),
            scale: 1.0,
        });
        assert_eq!(
            sampler.path_for("3"),
            "/sys/bus/iio/devices/iio:device0/in_voltage3_raw"
        );
    }

    #[test]
    fn test_reads_and_scales_value() {
        let dir = temp_dir("scale");
        fs::write(dir.join("AIn_1"), "1024\n").unwrap();

        let mut sampler = SysfsSampler::new(&AdcConfig {
            path_template: format!("{}/{{channel}}", dir.display()),
            scale: 0.5,
        });
        assert_eq!(sampler.sample("AIn_1").unwrap(), 512.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = temp_dir("missing");
        let mut sampler = SysfsSampler::new(&AdcConfig {
            path_template: format!("{}/{{channel}}", dir.display()),
            scale: 1.0,
        });
        assert!(matches!(
            sampler.sample("nope"),
            Err(SampleError::Read { .. })
        ));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let dir = temp_dir("garbage");
        fs::write(dir.join("AIn_2"), "n/a").unwrap();
        let mut sampler = SysfsSampler::new(&AdcConfig {
            path_template: format!("{}/{{channel}}", dir.display()),
            scale: 1.0,
        });
        assert!(matches!(
            sampler.sample("AIn_2"),
            Err(SampleError::Parse { value, .. }) if value == "n/a"
        ));
        fs::remove_dir_all(&dir).ok();
    }
}
