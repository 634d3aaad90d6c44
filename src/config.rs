//! Loads the configuration of the program.

use std::fmt;
use std::path::Path;

use ec_worldgen_city::CityLayout;

use crate::camera::FlightConfig;
use crate::world::StreamingConfig;

/// The path of the default configuration file.
pub const CONFIG_PATH: &str = "assets/config.ron";

/// An error that might occur while loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    Io(std::io::Error),
    /// The configuration file is not valid RON, or has unknown fields.
    Parse(ron::error::SpannedError),
    /// The configuration is well-formed but one of its values is unusable.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read the configuration: {err}"),
            Self::Parse(err) => write!(f, "failed to parse the configuration: {err}"),
            Self::Invalid(reason) => write!(f, "invalid configuration: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

/// The configuration of the program.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// The seed of the world. A random one is picked when absent.
    pub seed: Option<u64>,
    /// The number of ticks to simulate.
    pub ticks: u32,
    /// The number of ticks per simulated second.
    pub tick_rate: f32,
    /// The path of the building prototype manifest.
    pub prototypes: String,
    /// How chunks are streamed around the viewpoint.
    pub streaming: StreamingConfig,
    /// How the city is laid out in every chunk.
    pub layout: CityLayout,
    /// The path followed by the viewpoint.
    pub flight: FlightConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            ticks: 1200,
            tick_rate: 60.0,
            prototypes: crate::assets::PROTOTYPES_PATH.to_owned(),
            streaming: StreamingConfig::default(),
            layout: CityLayout::default(),
            flight: FlightConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from the provided file.
    ///
    /// A missing file is not an error: the default configuration is returned instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                ec_log::info!("'{}' not found, using the default configuration", path.display());
                return Ok(Self::default());
            }
            Err(err) => return Err(ConfigError::Io(err)),
        };

        ec_log::trace!("loading configuration from '{}'...", path.display());
        Self::from_ron_str(&text)
    }

    /// Parses and validates a configuration written in RON.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::de::from_str(text).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values of the configuration can be used together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.streaming.validate().map_err(ConfigError::Invalid)?;
        self.layout
            .validate()
            .map_err(|err| ConfigError::Invalid(err.0))?;
        self.flight.validate().map_err(ConfigError::Invalid)?;

        if (self.layout.chunk_size() - self.streaming.chunk_size).abs() > 1e-3 {
            return Err(ConfigError::Invalid(
                "`layout.grid_size * layout.cell_size` must equal `streaming.chunk_size`",
            ));
        }
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::Invalid("`tick_rate` must be a positive number"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.streaming.chunk_size, config.layout.chunk_size());
    }

    #[test]
    fn empty_document_gives_defaults() {
        let config = Config::from_ron_str("()").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_document() {
        let config = Config::from_ron_str(
            "(seed: Some(12), streaming: (view_radius: 2, prefetch_workers: 1))",
        )
        .unwrap();
        assert_eq!(config.seed, Some(12));
        assert_eq!(config.streaming.view_radius, 2);
        assert_eq!(config.streaming.prefetch_workers, 1);
        assert_eq!(config.streaming.flush_threshold, 8);
        assert_eq!(config.layout, CityLayout::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = Config::from_ron_str("(streaming: (radius: 2))").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn mismatched_chunk_size_is_rejected() {
        let err = Config::from_ron_str("(streaming: (chunk_size: 100.0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load("this/file/does/not/exist.ron").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bundled_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CONFIG_PATH);
        assert!(Config::load(path).is_ok());
    }
}
