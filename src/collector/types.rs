//! Accelerometer sample types for the step agent.
//!
//! A sample carries three acceleration axes and a monotonic nanosecond
//! timestamp. Samples are immutable once received from a source.

use serde::{Deserialize, Serialize};

/// One 3-axis accelerometer reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Monotonic timestamp in nanoseconds (platform-defined epoch)
    pub timestamp_ns: u64,
    /// Acceleration along the device x axis (m/s²)
    pub x: f64,
    /// Acceleration along the device y axis (m/s²)
    pub y: f64,
    /// Acceleration along the device z axis (m/s²)
    pub z: f64,
}

impl Sample {
    pub fn new(timestamp_ns: u64, x: f64, y: f64, z: f64) -> Self {
        Self {
            timestamp_ns,
            x,
            y,
            z,
        }
    }

    /// The three axes as an array, in x, y, z order.
    pub fn axes(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// True when every axis is a finite number.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Parse a `timestamp_ns,x,y,z` line.
    pub fn from_csv_line(line: &str) -> Result<Self, SampleParseError> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(SampleParseError::FieldCount(fields.len()));
        }

        let timestamp_ns = fields[0]
            .parse::<u64>()
            .map_err(|_| SampleParseError::Timestamp(fields[0].to_string()))?;

        let mut axes = [0.0f64; 3];
        for (slot, raw) in axes.iter_mut().zip(&fields[1..]) {
            *slot = raw
                .parse::<f64>()
                .map_err(|_| SampleParseError::Axis(raw.to_string()))?;
        }

        Ok(Self::new(timestamp_ns, axes[0], axes[1], axes[2]))
    }
}

/// Errors from parsing a textual sample.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SampleParseError {
    #[error("expected 4 fields (timestamp_ns,x,y,z), found {0}")]
    FieldCount(usize),
    #[error("invalid timestamp: {0:?}")]
    Timestamp(String),
    #[error("invalid axis value: {0:?}")]
    Axis(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv_line() {
        let sample = Sample::from_csv_line("1000000000, 0.5, -1.25, 9.81").unwrap();
        assert_eq!(sample.timestamp_ns, 1_000_000_000);
        assert_eq!(sample.axes(), [0.5, -1.25, 9.81]);
    }

    #[test]
    fn test_parse_rejects_bad_lines() {
        assert_eq!(
            Sample::from_csv_line("1,2,3"),
            Err(SampleParseError::FieldCount(3))
        );
        assert!(matches!(
            Sample::from_csv_line("-5,0,0,0"),
            Err(SampleParseError::Timestamp(_))
        ));
        assert!(matches!(
            Sample::from_csv_line("5,0,abc,0"),
            Err(SampleParseError::Axis(_))
        ));
    }

    #[test]
    fn test_finite_check() {
        assert!(Sample::new(1, 0.0, 0.0, 9.81).is_finite());
        assert!(!Sample::new(1, f64::NAN, 0.0, 9.81).is_finite());
        assert!(!Sample::new(1, 0.0, f64::INFINITY, 9.81).is_finite());
    }
}
