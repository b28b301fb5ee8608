//! Configuration loading and parsing.
//!
//! Every key is optional; command-line flags take precedence over the file and the file
//! takes precedence over built-in defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chart_types::MetadataField;
use serde::Deserialize;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PROPAGATE_SOURCE: &str = "Signe/2026-W04.json";
const DEFAULT_ENRICH_SNAPSHOT: &str = "Walter/2026-W04.json";

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct SyncConfig {
    /// Root directory holding one sub-directory per chart collection.
    pub data_dir: Option<String>,
    /// Defaults for `propagate`.
    pub propagate: Option<PropagateConfig>,
    /// Defaults for `enrich`.
    pub enrich: Option<EnrichConfig>,
    /// Spotify endpoint overrides.
    pub spotify: Option<SpotifyConfig>,
}

/// Propagation defaults.
#[derive(Debug, Default, Deserialize)]
pub struct PropagateConfig {
    /// Source snapshot, relative to `data_dir` unless absolute.
    pub source: Option<String>,
    /// Target collection directories, relative to `data_dir` unless absolute.
    pub targets: Option<Vec<String>>,
    /// Field to copy (`image_url`, `spotify_url`, `title`, `artists`).
    pub field: Option<String>,
}

/// Enrichment defaults.
#[derive(Debug, Default, Deserialize)]
pub struct EnrichConfig {
    /// Snapshot to enrich, relative to `data_dir` unless absolute.
    pub snapshot: Option<String>,
    /// Track ids eligible for provider lookups.
    pub track_ids: Option<Vec<String>>,
}

/// Spotify endpoint configuration.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SpotifyConfig {
    /// Token endpoint (defaults to https://accounts.spotify.com/api/token).
    pub token_url: Option<String>,
    /// Web API base URL (defaults to https://api.spotify.com/v1).
    pub api_base_url: Option<String>,
}

impl SyncConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<SyncConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Load the config file when one was given, otherwise use defaults.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Resolve the data directory: CLI flag, then config, then `./data`.
pub fn data_dir_from_config(cfg: &SyncConfig, cli: Option<&Path>) -> PathBuf {
    if let Some(dir) = cli {
        return dir.to_path_buf();
    }
    cfg.data_dir
        .as_deref()
        .map(str::trim)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Resolve the propagation source snapshot.
pub fn propagate_source_from_config(
    cfg: &SyncConfig,
    data_dir: &Path,
    cli: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    let configured = cfg
        .propagate
        .as_ref()
        .and_then(|p| p.source.as_deref())
        .unwrap_or(DEFAULT_PROPAGATE_SOURCE);
    resolve_in(data_dir, configured)
}

/// Resolve the target collection directories.
///
/// Falls back to the source snapshot's own collection when nothing is configured.
pub fn propagate_targets_from_config(
    cfg: &SyncConfig,
    data_dir: &Path,
    source: &Path,
    cli: &[PathBuf],
) -> Vec<PathBuf> {
    if !cli.is_empty() {
        return cli.to_vec();
    }
    if let Some(targets) = cfg
        .propagate
        .as_ref()
        .and_then(|p| p.targets.as_ref())
        .filter(|t| !t.is_empty())
    {
        return targets.iter().map(|t| resolve_in(data_dir, t)).collect();
    }
    let own_collection = source
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    vec![own_collection]
}

/// Resolve the field to propagate; defaults to `image_url`.
pub fn propagate_field_from_config(
    cfg: &SyncConfig,
    cli: Option<MetadataField>,
) -> Result<MetadataField> {
    if let Some(field) = cli {
        return Ok(field);
    }
    match cfg.propagate.as_ref().and_then(|p| p.field.as_deref()) {
        Some(name) => parse_field(name),
        None => Ok(MetadataField::ImageUrl),
    }
}

/// Resolve the snapshot to enrich.
pub fn enrich_snapshot_from_config(
    cfg: &SyncConfig,
    data_dir: &Path,
    cli: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    let configured = cfg
        .enrich
        .as_ref()
        .and_then(|e| e.snapshot.as_deref())
        .unwrap_or(DEFAULT_ENRICH_SNAPSHOT);
    resolve_in(data_dir, configured)
}

/// Resolve the enrichment allow-list. CLI ids replace the configured list.
pub fn enrich_track_ids_from_config(cfg: &SyncConfig, cli: &[String]) -> Vec<String> {
    let source: Vec<String> = if cli.is_empty() {
        cfg.enrich
            .as_ref()
            .and_then(|e| e.track_ids.clone())
            .unwrap_or_default()
    } else {
        cli.to_vec()
    };
    let mut ids: Vec<String> = Vec::with_capacity(source.len());
    for id in source {
        let id = id.trim().to_string();
        if !id.is_empty() && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Parse a field name as written in config files.
pub fn parse_field(name: &str) -> Result<MetadataField> {
    let field = match name.trim().replace('-', "_").as_str() {
        "image_url" => MetadataField::ImageUrl,
        "spotify_url" => MetadataField::SpotifyUrl,
        "title" => MetadataField::Title,
        "artists" => MetadataField::Artists,
        other => bail!("unknown metadata field {other:?}"),
    };
    Ok(field)
}

fn resolve_in(data_dir: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        data_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> SyncConfig {
        toml::from_str(raw).unwrap()
    }

    #[test]
    fn defaults_apply_without_config() {
        let cfg = SyncConfig::default();
        let data_dir = data_dir_from_config(&cfg, None);
        assert_eq!(data_dir, PathBuf::from("data"));
        let source = propagate_source_from_config(&cfg, &data_dir, None);
        assert_eq!(source, PathBuf::from("data/Signe/2026-W04.json"));
        let targets = propagate_targets_from_config(&cfg, &data_dir, &source, &[]);
        assert_eq!(targets, vec![PathBuf::from("data/Signe")]);
        assert_eq!(
            enrich_snapshot_from_config(&cfg, &data_dir, None),
            PathBuf::from("data/Walter/2026-W04.json")
        );
        assert_eq!(
            propagate_field_from_config(&cfg, None).unwrap(),
            MetadataField::ImageUrl
        );
    }

    #[test]
    fn config_values_resolve_relative_to_data_dir() {
        let cfg = parse(
            r#"
            data_dir = "/srv/charts"

            [propagate]
            source = "Signe/2026-W04.json"
            targets = ["Walter", "/abs/Other"]
            field = "spotify-url"
            "#,
        );
        let data_dir = data_dir_from_config(&cfg, None);
        let source = propagate_source_from_config(&cfg, &data_dir, None);
        assert_eq!(source, PathBuf::from("/srv/charts/Signe/2026-W04.json"));
        let targets = propagate_targets_from_config(&cfg, &data_dir, &source, &[]);
        assert_eq!(
            targets,
            vec![PathBuf::from("/srv/charts/Walter"), PathBuf::from("/abs/Other")]
        );
        assert_eq!(
            propagate_field_from_config(&cfg, None).unwrap(),
            MetadataField::SpotifyUrl
        );
    }

    #[test]
    fn cli_overrides_config() {
        let cfg = parse(
            r#"
            data_dir = "/srv/charts"
            [enrich]
            track_ids = ["A", "B"]
            "#,
        );
        let data_dir = data_dir_from_config(&cfg, Some(Path::new("/tmp/data")));
        assert_eq!(data_dir, PathBuf::from("/tmp/data"));
        let ids = enrich_track_ids_from_config(&cfg, &["C".to_string()]);
        assert_eq!(ids, vec!["C".to_string()]);
    }

    #[test]
    fn track_ids_are_trimmed_and_deduplicated() {
        let cfg = parse(
            r#"
            [enrich]
            track_ids = [" A ", "B", "A", ""]
            "#,
        );
        let ids = enrich_track_ids_from_config(&cfg, &[]);
        assert_eq!(ids, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn parse_field_rejects_unknown() {
        assert_eq!(parse_field("artists").unwrap(), MetadataField::Artists);
        assert!(parse_field("placement").is_err());
    }
}
