use crate::{models::*, HarvesterError, Result};
use geo::Point;
use geojson::{feature::Id, Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};
use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Appended to the primary path to name the minified twin
pub const MINIFIED_SUFFIX: &str = ".min.json";

/// Key used for the line appended to the automation channel
pub const CHANNEL_KEY: &str = "min_json_path";

/// Where the minified path is published
#[derive(Debug, Clone)]
enum Channel {
    /// Environment variable naming the channel file
    Env(String),
    File(PathBuf),
}

/// Writes cleaned datasets as a GeoJSON artifact pair
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    channel: Channel,
}

impl Default for ArtifactWriter {
    fn default() -> Self {
        Self::new("GITHUB_OUTPUT")
    }
}

impl ArtifactWriter {
    /// Create a writer that publishes to the file named by `channel_var`
    pub fn new(channel_var: impl Into<String>) -> Self {
        Self {
            channel: Channel::Env(channel_var.into()),
        }
    }

    /// Create a writer that publishes straight to `channel_file`
    pub fn with_channel_file(channel_file: impl Into<PathBuf>) -> Self {
        Self {
            channel: Channel::File(channel_file.into()),
        }
    }

    /// Write the full and minified artifacts, then try to register the
    /// minified path with the automation channel.
    ///
    /// The destination directory must already exist. Both files are staged
    /// before either is moved into place, so a failed run leaves no new
    /// full file without its minified twin.
    pub fn write(&self, dataset: &CleanedDataset, path: &Path) -> Result<ArtifactPaths> {
        let dir = parent_dir(path);
        if !dir.is_dir() {
            return Err(HarvesterError::Persistence(format!(
                "destination directory {:?} does not exist",
                dir
            )));
        }

        let collection = to_feature_collection(dataset);
        let full = serde_json::to_string_pretty(&collection)
            .map_err(|e| HarvesterError::Persistence(e.to_string()))?;
        let minified = serde_json::to_string(&collection)
            .map_err(|e| HarvesterError::Persistence(e.to_string()))?;

        let minified_path = minified_path(path);
        let staged_full = stage(path, full.as_bytes())?;
        let staged_minified = stage(&minified_path, minified.as_bytes())?;

        for target in [path, minified_path.as_path()] {
            if target.is_dir() {
                return Err(HarvesterError::Persistence(format!(
                    "{:?} is a directory",
                    target
                )));
            }
        }

        staged_full
            .persist(path)
            .map_err(|e| persistence(path, e.error))?;
        if let Err(e) = staged_minified.persist(&minified_path) {
            if let Err(remove) = std::fs::remove_file(path) {
                warn!("Could not remove {:?} after failed write: {}", path, remove);
            }
            return Err(persistence(&minified_path, e.error));
        }

        info!(
            "Wrote {} features to {:?} and {:?}",
            dataset.len(),
            path,
            minified_path
        );

        let registered = self.register(&minified_path);

        Ok(ArtifactPaths {
            full: path.to_path_buf(),
            minified: minified_path,
            registered,
        })
    }

    /// Append `min_json_path=<path>` to the channel file. Never fails the write.
    fn register(&self, minified: &Path) -> bool {
        let channel = match &self.channel {
            Channel::File(path) => path.clone(),
            Channel::Env(var) => match std::env::var_os(var) {
                Some(channel) => PathBuf::from(channel),
                None => {
                    debug!("{} not set, skipping registration", var);
                    return false;
                }
            },
        };

        let line = format!("{}={}\n", CHANNEL_KEY, minified.display());
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&channel)
            .and_then(|mut file| file.write_all(line.as_bytes()));

        match result {
            Ok(()) => {
                info!("Registered {:?} with {:?}", minified, channel);
                true
            }
            Err(e) => {
                warn!("Could not append to {:?}: {}", channel, e);
                false
            }
        }
    }
}

/// Path of the minified twin for `path`
pub fn minified_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(MINIFIED_SUFFIX);
    PathBuf::from(name)
}

/// Convert a cleaned dataset into a feature collection, one feature per row
pub fn to_feature_collection(dataset: &CleanedDataset) -> FeatureCollection {
    let features = dataset
        .rows()
        .iter()
        .map(|row| Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Point(vec![
                row.geometry.x(),
                row.geometry.y(),
            ]))),
            id: Some(Id::Number(row.id.into())),
            properties: Some(properties(row)),
            foreign_members: None,
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn properties(row: &CleanedRow) -> JsonObject {
    let tags = row
        .tags
        .iter()
        .map(|(key, value)| (key.clone(), JsonValue::String(value.clone())))
        .collect();

    let mut properties = JsonObject::new();
    properties.insert("type".to_string(), row.element_type.as_str().into());
    properties.insert("id".to_string(), row.id.into());
    properties.insert("lat".to_string(), row.lat.into());
    properties.insert("lon".to_string(), row.lon.into());
    properties.insert("tags".to_string(), JsonValue::Object(tags));
    properties.insert(
        "drinking_water".to_string(),
        row.drinking_water.clone().into(),
    );
    properties
}

/// Read a written artifact back into a cleaned dataset
pub fn read_dataset(path: &Path) -> Result<CleanedDataset> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| HarvesterError::Persistence(format!("{:?}: {}", path, e)))?;
    let geojson: GeoJson = contents
        .parse()
        .map_err(|e| HarvesterError::MalformedInput(format!("{:?}: {}", path, e)))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        _ => {
            return Err(HarvesterError::MalformedInput(format!(
                "{:?} is not a feature collection",
                path
            )))
        }
    };

    let rows = collection
        .features
        .iter()
        .map(from_feature)
        .collect::<Result<Vec<_>>>()?;

    Ok(CleanedDataset::new(rows))
}

fn from_feature(feature: &Feature) -> Result<CleanedRow> {
    let geometry = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(geojson::Value::Point(position)) if position.len() >= 2 => {
            Point::new(position[0], position[1])
        }
        _ => return Err(malformed("feature geometry is not a point")),
    };

    let properties = feature
        .properties
        .as_ref()
        .ok_or_else(|| malformed("feature has no properties"))?;

    let element_type = ElementType::deserialize(property(properties, "type")?)
        .map_err(|e| malformed(&e.to_string()))?;
    let tags = Tags::deserialize(property(properties, "tags")?)
        .map_err(|e| malformed(&e.to_string()))?;

    Ok(CleanedRow {
        element_type,
        id: property(properties, "id")?
            .as_i64()
            .ok_or_else(|| malformed("`id` is not an integer"))?,
        lat: property(properties, "lat")?
            .as_f64()
            .ok_or_else(|| malformed("`lat` is not a number"))?,
        lon: property(properties, "lon")?
            .as_f64()
            .ok_or_else(|| malformed("`lon` is not a number"))?,
        tags,
        drinking_water: property(properties, "drinking_water")?
            .as_str()
            .ok_or_else(|| malformed("`drinking_water` is not a string"))?
            .to_string(),
        geometry,
    })
}

fn property<'a>(properties: &'a JsonObject, key: &str) -> Result<&'a JsonValue> {
    properties
        .get(key)
        .ok_or_else(|| malformed(&format!("missing property `{}`", key)))
}

fn malformed(message: &str) -> HarvesterError {
    HarvesterError::MalformedInput(message.to_string())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Write `contents` to a temp file beside `path`, ready to be persisted
fn stage(path: &Path, contents: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(parent_dir(path)).map_err(|e| persistence(path, e))?;
    file.write_all(contents).map_err(|e| persistence(path, e))?;
    Ok(file)
}

fn persistence(path: &Path, e: std::io::Error) -> HarvesterError {
    HarvesterError::Persistence(format!("{:?}: {}", path, e))
}
