//! Modem configuration
//!
//! Wireless range depends on altitude and weather: modems high above the
//! ground reach further, storms shorten the reach. All values are in blocks.

use serde::{Deserialize, Serialize};

use crate::error::{ModemError, ModemResult};

/// Weather at a modem's position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Rain,
    /// Only thunderstorms reduce range; plain rain does not
    Thunder,
}

/// Range and channel limits for modems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Range at or below the high-altitude threshold
    pub range: f64,
    /// Range at the top of the world
    pub high_altitude_range: f64,
    /// Low-altitude range during a thunderstorm
    pub range_during_storm: f64,
    /// Top-of-world range during a thunderstorm
    pub high_altitude_range_during_storm: f64,
    /// Height above which range starts to grow
    pub high_altitude_threshold: f64,
    /// Height of the world; range peaks at `world_height - 1`
    pub world_height: f64,
    /// Channels a single modem may have open at once
    pub max_open_channels: usize,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            range: 64.0,
            high_altitude_range: 384.0,
            range_during_storm: 64.0,
            high_altitude_range_during_storm: 384.0,
            high_altitude_threshold: 96.0,
            world_height: 384.0,
            max_open_channels: 128,
        }
    }
}

impl ModemConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> ModemResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that ranges are usable and the altitude band is not empty
    pub fn validate(&self) -> ModemResult<()> {
        let ranges = [
            ("range", self.range),
            ("high_altitude_range", self.high_altitude_range),
            ("range_during_storm", self.range_during_storm),
            (
                "high_altitude_range_during_storm",
                self.high_altitude_range_during_storm,
            ),
        ];
        for (name, value) in ranges {
            if !value.is_finite() || value < 0.0 {
                return Err(ModemError::InvalidConfig(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if self.world_height - 1.0 <= self.high_altitude_threshold {
            return Err(ModemError::InvalidConfig(format!(
                "world_height ({}) must be above high_altitude_threshold ({}) + 1",
                self.world_height, self.high_altitude_threshold
            )));
        }
        if self.max_open_channels == 0 {
            return Err(ModemError::InvalidConfig(
                "max_open_channels must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Wireless range for a modem at `altitude` in the given weather
    ///
    /// Below the threshold the base range applies. Above it the range grows
    /// linearly towards the high-altitude range, reached at the top of the
    /// world, and never exceeds it.
    pub fn wireless_range(&self, altitude: f64, weather: Weather) -> f64 {
        let (low, high) = match weather {
            Weather::Thunder => (
                self.range_during_storm,
                self.high_altitude_range_during_storm,
            ),
            Weather::Clear | Weather::Rain => (self.range, self.high_altitude_range),
        };

        if altitude > self.high_altitude_threshold && high > low {
            let band = (self.world_height - 1.0) - self.high_altitude_threshold;
            let range = low + (altitude - self.high_altitude_threshold) * ((high - low) / band);
            return range.min(high);
        }
        low
    }

    /// Set the clear-weather ranges
    pub fn with_ranges(mut self, range: f64, high_altitude_range: f64) -> Self {
        self.range = range;
        self.high_altitude_range = high_altitude_range;
        self
    }

    /// Set the thunderstorm ranges
    pub fn with_storm_ranges(mut self, range: f64, high_altitude_range: f64) -> Self {
        self.range_during_storm = range;
        self.high_altitude_range_during_storm = high_altitude_range;
        self
    }

    pub fn with_max_open_channels(mut self, max: usize) -> Self {
        self.max_open_channels = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ModemConfig::default();
        assert_eq!(config.range, 64.0);
        assert_eq!(config.high_altitude_range, 384.0);
        assert_eq!(config.max_open_channels, 128);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_range_below_threshold() {
        let config = ModemConfig::default();
        assert_eq!(config.wireless_range(0.0, Weather::Clear), 64.0);
        assert_eq!(config.wireless_range(96.0, Weather::Clear), 64.0);
    }

    #[test]
    fn test_range_grows_with_altitude() {
        let config = ModemConfig::default();
        let top = config.world_height - 1.0;
        let middle = (96.0 + top) / 2.0;

        assert_eq!(config.wireless_range(top, Weather::Clear), 384.0);
        assert!((config.wireless_range(middle, Weather::Clear) - 224.0).abs() < 1e-9);
        // Clamped above the world
        assert_eq!(config.wireless_range(10_000.0, Weather::Clear), 384.0);
    }

    #[test]
    fn test_storm_ranges() {
        let config = ModemConfig::default().with_storm_ranges(16.0, 32.0);
        assert_eq!(config.wireless_range(0.0, Weather::Thunder), 16.0);
        assert_eq!(config.wireless_range(0.0, Weather::Rain), 64.0);
        assert_eq!(
            config.wireless_range(config.world_height - 1.0, Weather::Thunder),
            32.0
        );
    }

    #[test]
    fn test_flat_band_uses_low_range() {
        let config = ModemConfig::default().with_ranges(100.0, 50.0);
        assert_eq!(config.wireless_range(300.0, Weather::Clear), 100.0);
    }

    #[test]
    fn test_from_json_partial() {
        let config = ModemConfig::from_json(r#"{ "range": 32.0, "max_open_channels": 4 }"#).unwrap();
        assert_eq!(config.range, 32.0);
        assert_eq!(config.max_open_channels, 4);
        assert_eq!(config.high_altitude_range, 384.0);
    }

    #[test]
    fn test_from_json_rejects_bad_values() {
        assert!(matches!(
            ModemConfig::from_json(r#"{ "range": -1.0 }"#),
            Err(ModemError::InvalidConfig(_))
        ));
        assert!(matches!(
            ModemConfig::from_json(r#"{ "world_height": 50.0 }"#),
            Err(ModemError::InvalidConfig(_))
        ));
        assert!(matches!(
            ModemConfig::from_json(r#"{ "max_open_channels": 0 }"#),
            Err(ModemError::InvalidConfig(_))
        ));
        assert!(matches!(
            ModemConfig::from_json("{ nope"),
            Err(ModemError::ConfigParse(_))
        ));
    }
}
