use std::fmt;
use std::path::Path;

use glam::Vec3;

use ec_core::{BuildingPrototype, PrototypePool};

/// The path of the default building prototype manifest.
pub const PROTOTYPES_PATH: &str = "assets/buildings.ron";

/// An error that might occur while loading the building prototypes.
#[derive(Debug)]
pub enum AssetError {
    /// The manifest could not be read.
    Io(std::io::Error),
    /// The manifest is not valid RON.
    Parse(ron::error::SpannedError),
    /// The manifest does not list any prototype.
    Empty,
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read the prototype manifest: {err}"),
            Self::Parse(err) => write!(f, "failed to parse the prototype manifest: {err}"),
            Self::Empty => f.write_str("the prototype manifest is empty"),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Empty => None,
        }
    }
}

/// An entry of the prototype manifest.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PrototypeEntry {
    name: String,
    /// The size of the model, in model units.
    size: [f32; 3],
    /// The origin of the model. Only its vertical component is used.
    #[serde(default)]
    origin: [f32; 3],
}

/// Loads the building prototypes listed in the manifest at `path`.
pub fn load_prototypes(path: impl AsRef<Path>) -> Result<PrototypePool, AssetError> {
    let path = path.as_ref();
    ec_log::trace!("loading building prototypes from '{}'...", path.display());

    let text = std::fs::read_to_string(path).map_err(AssetError::Io)?;
    let pool = parse_prototypes(&text)?;

    ec_log::info!("loaded {} building prototypes", pool.len());
    Ok(pool)
}

/// Parses a prototype manifest written in RON.
pub fn parse_prototypes(text: &str) -> Result<PrototypePool, AssetError> {
    let entries: Vec<PrototypeEntry> = ron::de::from_str(text).map_err(AssetError::Parse)?;

    let prototypes = entries
        .into_iter()
        .map(|e| BuildingPrototype::new(e.name, Vec3::from(e.size), Vec3::from(e.origin)))
        .collect();

    PrototypePool::new(prototypes).map_err(|_| AssetError::Empty)
}
