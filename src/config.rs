use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strum::{Display, EnumString};

use crate::{loader::DEFAULT_EDGE_BATCH_SIZE, IngestError, IngestResult};

pub const CONFIG_FILE: &str = "graphseed.toml";
pub const HOME_ENV: &str = "GRAPHSEED_HOME";

/// What to do with a relationship referencing an id absent from its bundle.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DanglingReferencePolicy {
    /// drop the relationship with a warning
    #[default]
    Skip,
    /// abort the ingestion with `DataLoadFailure`
    Fail,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    /// where new graph stores are created
    pub datasets_dir: PathBuf,
    /// root of the knowledge-graph benchmark datasets
    pub kg_datasets_dir: PathBuf,
    pub edge_batch_size: usize,
    /// fixed seed for reproducible sampling, entropy otherwise
    pub sampling_seed: Option<u64>,
    pub dangling_references: DanglingReferencePolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            datasets_dir: PathBuf::from("./datasets"),
            kg_datasets_dir: PathBuf::from("./dglke_datasets"),
            edge_batch_size: DEFAULT_EDGE_BATCH_SIZE,
            sampling_seed: None,
            dangling_references: DanglingReferencePolicy::default(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RawIngestConfig {
    datasets_dir: Option<String>,
    env_datasets_dir: Option<String>,
    kg_datasets_dir: Option<String>,
    env_kg_datasets_dir: Option<String>,
    edge_batch_size: Option<usize>,
    sampling_seed: Option<u64>,
    env_sampling_seed: Option<String>,
    dangling_references: Option<DanglingReferencePolicy>,
}

impl IngestConfig {
    /// Reads `graphseed.toml` and `.env` under `path`. Relative directories are resolved
    /// against `path`. A missing config file gives the defaults.
    pub fn from_dir(path: &Path) -> IngestResult<Self> {
        let config_path = path.join(CONFIG_FILE);
        let dotenv_path = path.join(".env");
        dotenv::from_path(dotenv_path.as_path()).ok();

        let raw_config = if config_path.is_file() {
            read_toml_to_raw_config(config_path.as_path())?
        } else {
            debug!("No {} found, using defaults", config_path.display());
            RawIngestConfig::default()
        };
        let config = raw_to_config(raw_config, path)?;
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Loads the configuration of `home`, or of `$GRAPHSEED_HOME` when not given. Without
    /// either, the defaults apply relative to the working directory.
    pub fn init(home: Option<&Path>) -> IngestResult<Self> {
        if let Some(home) = home {
            return Self::from_dir(home);
        }
        match std::env::var(HOME_ENV) {
            Ok(home) => Self::from_dir(Path::new(&home)),
            Err(_) => {
                debug!("{HOME_ENV} is not set, using default configuration");
                Ok(Self::default())
            }
        }
    }
}

fn read_toml_to_raw_config(filename: &Path) -> IngestResult<RawIngestConfig> {
    let config: RawIngestConfig = toml::from_str(std::fs::read_to_string(filename)?.as_str())
        .map_err(|e| IngestError::Config(format!("{}: {e}", filename.display())))?;
    Ok(config)
}

/// A literal value, or else the variable named by its `env_` counterpart.
fn value_or_env(value: Option<String>, env_name: Option<String>) -> Option<String> {
    value.or_else(|| env_name.and_then(|name| dotenv::var(name).ok()))
}

fn raw_to_config(raw_config: RawIngestConfig, home: &Path) -> IngestResult<IngestConfig> {
    let defaults = IngestConfig::default();
    let directory = |value: Option<String>, default: PathBuf| {
        let dir = value.map(PathBuf::from).unwrap_or(default);
        if dir.is_relative() {
            home.join(dir)
        } else {
            dir
        }
    };

    let edge_batch_size = raw_config
        .edge_batch_size
        .unwrap_or(defaults.edge_batch_size);
    if edge_batch_size == 0 {
        return Err(IngestError::Config(
            "edge_batch_size must be greater than 0".to_string(),
        ));
    }
    let sampling_seed = match raw_config.sampling_seed {
        Some(seed) => Some(seed),
        None => value_or_env(None, raw_config.env_sampling_seed)
            .map(|seed| {
                seed.trim().parse::<u64>().map_err(|e| {
                    IngestError::Config(format!("sampling seed `{seed}` is not a u64: {e}"))
                })
            })
            .transpose()?,
    };

    Ok(IngestConfig {
        datasets_dir: directory(
            value_or_env(raw_config.datasets_dir, raw_config.env_datasets_dir),
            defaults.datasets_dir,
        ),
        kg_datasets_dir: directory(
            value_or_env(raw_config.kg_datasets_dir, raw_config.env_kg_datasets_dir),
            defaults.kg_datasets_dir,
        ),
        edge_batch_size,
        sampling_seed,
        dangling_references: raw_config.dangling_references.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use super::*;

    #[test]
    fn test_parse_toml() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let config =
            read_toml_to_raw_config(dir.join("demos/quickstart/graphseed.toml").as_path()).unwrap();
        assert_eq!(config.edge_batch_size, Some(50));
        assert_eq!(
            config.env_kg_datasets_dir.as_deref(),
            Some("GRAPHSEED_KG_DATASETS_DIR")
        );
    }

    #[test]
    fn test_from_dir_resolves_env_and_relative_paths() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("demos/quickstart");
        let config = IngestConfig::from_dir(&dir).unwrap();
        assert_eq!(config.datasets_dir, dir.join("datasets"));
        // set in the quickstart .env
        assert_eq!(config.kg_datasets_dir, dir.join("../../tests/fixtures"));
        assert_eq!(config.dangling_references, DanglingReferencePolicy::Skip);
        assert_eq!(config.sampling_seed, Some(7));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = IngestConfig::from_dir(dir.path()).unwrap();
        assert_eq!(config.edge_batch_size, DEFAULT_EDGE_BATCH_SIZE);
        assert_eq!(config.kg_datasets_dir, dir.path().join("./dglke_datasets"));
        assert_eq!(config.sampling_seed, None);
    }

    #[test]
    fn test_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "edge_batch_size = 0\n").unwrap();
        let err = IngestConfig::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));

        fs::write(dir.path().join(CONFIG_FILE), "dangling_references = \"maybe\"\n").unwrap();
        let err = IngestConfig::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, IngestError::Config(_)));

        fs::write(dir.path().join(CONFIG_FILE), "dangling_references = \"fail\"\n").unwrap();
        let config = IngestConfig::from_dir(dir.path()).unwrap();
        assert_eq!(config.dangling_references, DanglingReferencePolicy::Fail);
    }
}
