//! `chart-sync` — patch weekly chart snapshot files in place.
//!
//! ## Commands
//! - `propagate` (alias `copy-images`): copy a field from one week into the other weeks.
//! - `enrich`: resolve unknown titles/artists from Spotify for an allow-list of tracks.
//! - `fetch-track`: print one track's metadata as JSON.
//! - `audit`: list entries still missing metadata.
//!
//! Files are only rewritten when at least one entry changed.

use anyhow::{Context, Result};
use chart_sync::cli::{Args, Command};
use chart_sync::config::{self, SyncConfig};
use chart_sync::store::Snapshot;
use chart_sync::{audit, enrich, reconcile, spotify};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,chart_sync=info")
        }))
        .with_target(false)
        .init();

    let cfg = SyncConfig::load_optional(args.config.as_deref())?;
    let data_dir = config::data_dir_from_config(&cfg, args.data_dir.as_deref());

    match args.cmd {
        Command::Propagate {
            source,
            targets,
            field,
        } => {
            let source = config::propagate_source_from_config(&cfg, &data_dir, source.as_deref());
            let targets =
                config::propagate_targets_from_config(&cfg, &data_dir, &source, &targets);
            let field = config::propagate_field_from_config(&cfg, field.map(Into::into))?;
            let report = reconcile::run_batch(&source, &targets, field)?;
            tracing::info!(
                "done: updated {} entries across {} files",
                report.total_filled(),
                report.saved_count()
            );
        }
        Command::Enrich { path, track_ids } => {
            let path = config::enrich_snapshot_from_config(&cfg, &data_dir, path.as_deref());
            let allow_list = config::enrich_track_ids_from_config(&cfg, &track_ids);
            let mut snapshot = Snapshot::load(&path)?;
            tracing::info!(snapshot = %path.display(), tracks = allow_list.len(), "updating tracks");
            if allow_list.is_empty() {
                tracing::warn!("no track ids configured; pass --track-id or set [enrich] track_ids");
            }

            let provider = spotify::select_provider(&cfg.spotify.unwrap_or_default());
            let outcome = enrich::enrich_snapshot(&mut snapshot, &allow_list, provider.as_ref());
            if snapshot.save_if_dirty()? {
                tracing::info!(
                    updated = outcome.updated,
                    failed = outcome.failed,
                    "updated {} tracks in {}",
                    outcome.updated,
                    path.display()
                );
            } else {
                tracing::info!(failed = outcome.failed, "no tracks were updated");
            }
        }
        Command::FetchTrack { track_id } => {
            let provider = spotify::select_provider(&cfg.spotify.unwrap_or_default());
            let meta = provider
                .fetch_track(&track_id)
                .with_context(|| format!("fetch track {track_id}"))?;
            let out = serde_json::to_string_pretty(&meta).context("encode track info")?;
            println!("{out}");
        }
        Command::Audit { path } => {
            let path = config::enrich_snapshot_from_config(&cfg, &data_dir, path.as_deref());
            let snapshot = Snapshot::load(&path)?;
            let report = audit::audit_document(&snapshot.document);
            for entry in &report {
                let missing: Vec<String> = entry.missing.iter().map(|f| f.to_string()).collect();
                tracing::info!(
                    placement = entry.placement,
                    track_id = entry.track_id.as_deref().unwrap_or("-"),
                    missing = %missing.join(","),
                    "incomplete entry"
                );
            }
            let ids = audit::enrichable_track_ids(&report);
            tracing::info!(
                snapshot = %snapshot.id,
                incomplete = report.len(),
                enrichable = ids.len(),
                "audit done"
            );
            if !ids.is_empty() {
                println!("track_ids = {}", serde_json::to_string(&ids).context("encode ids")?);
            }
        }
    }

    Ok(())
}
