//! Filling unresolved chart entries from an external track metadata provider.
//!
//! Only entries on an explicit allow-list are considered, and only while their title or
//! artists are still unknown. A successful lookup overwrites title, artists and link.

use std::collections::BTreeSet;

use anyhow::Result;
use chart_types::ChartEntry;
use serde::Serialize;

use crate::store::Snapshot;

/// Metadata resolved for a single track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artists: Vec<String>,
    pub spotify_url: String,
}

/// Something that can resolve a track id to its metadata.
pub trait TrackMetadataProvider {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;
    /// Look up one track. Errors are per-track; callers decide whether to continue.
    fn fetch_track(&self, track_id: &str) -> Result<TrackMetadata>;
}

/// Counters for one enrichment run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnrichOutcome {
    /// Entries overwritten with provider data.
    pub updated: usize,
    /// Eligible entries whose lookup failed.
    pub failed: usize,
}

/// Returns `true` when an entry still lacks a title or artists.
pub fn needs_enrichment(entry: &ChartEntry) -> bool {
    entry.title().is_none() || entry.artists().is_empty()
}

/// Resolve missing metadata for allow-listed entries of `snapshot`.
///
/// Marks the snapshot dirty when at least one entry was updated; saving is left to the caller.
pub fn enrich_snapshot(
    snapshot: &mut Snapshot,
    allow_list: &[String],
    provider: &dyn TrackMetadataProvider,
) -> EnrichOutcome {
    let allowed: BTreeSet<&str> = allow_list.iter().map(String::as_str).collect();
    let mut outcome = EnrichOutcome::default();

    for entry in &mut snapshot.document.entries {
        let Some(track_id) = entry.track_id().map(str::to_string) else {
            continue;
        };
        if !allowed.contains(track_id.as_str()) || !needs_enrichment(entry) {
            continue;
        }
        tracing::info!(
            track_id = %track_id,
            placement = entry.placement(),
            provider = provider.name(),
            "fetching track info"
        );
        match provider.fetch_track(&track_id) {
            Ok(meta) => {
                entry.set_title(&meta.title);
                entry.set_artists(&meta.artists);
                entry.set_spotify_url(&meta.spotify_url);
                outcome.updated += 1;
                tracing::info!(
                    track_id = %track_id,
                    title = %meta.title,
                    artists = %meta.artists.join(", "),
                    "updated"
                );
            }
            Err(err) => {
                outcome.failed += 1;
                tracing::warn!(track_id = %track_id, "failed to fetch track info: {err:#}");
            }
        }
    }

    if outcome.updated > 0 {
        snapshot.mark_dirty();
    }
    outcome
}
