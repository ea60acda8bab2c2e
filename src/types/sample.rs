//! Decoded telemetry sample

use serde::{Deserialize, Serialize};
use std::fmt;

/// One humidity/temperature reading as sent by the sensor.
///
/// Every field is optional because the device may omit any of them. A missing
/// field stays `None`; it is never defaulted to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSample {
    /// Relative humidity in percent.
    #[serde(default)]
    pub humidity: Option<f64>,

    /// Temperature in degrees Celsius.
    #[serde(default)]
    pub temperature: Option<f64>,

    /// Device timestamp.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl DataSample {
    /// Create a sample from its three readings.
    pub fn new(humidity: Option<f64>, temperature: Option<f64>, timestamp: Option<i64>) -> Self {
        Self { humidity, temperature, timestamp }
    }

    /// True when the frame carried none of the known fields.
    pub fn is_empty(&self) -> bool {
        self.humidity.is_none() && self.temperature.is_none() && self.timestamp.is_none()
    }
}

/// Writes `value` or `N/A` when absent.
struct OrNa<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for OrNa<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("N/A"),
        }
    }
}

impl fmt::Display for DataSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp: {}", OrNa(self.timestamp))?;
        writeln!(f, "Temperature: {}", OrNa(self.temperature))?;
        write!(f, "Humidity: {}", OrNa(self.humidity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_missing_fields_as_na() {
        let sample = DataSample::new(None, Some(21.5), None);
        assert_eq!(sample.to_string(), "Timestamp: N/A\nTemperature: 21.5\nHumidity: N/A");
    }

    #[test]
    fn display_full_sample() {
        let sample = DataSample::new(Some(55.0), Some(-3.25), Some(1_700_000_000));
        assert_eq!(
            sample.to_string(),
            "Timestamp: 1700000000\nTemperature: -3.25\nHumidity: 55"
        );
    }

    #[test]
    fn default_is_empty() {
        assert!(DataSample::default().is_empty());
        assert!(!DataSample::new(None, None, Some(0)).is_empty());
    }
}
