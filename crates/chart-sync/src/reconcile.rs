//! Propagation of metadata between chart snapshots.
//!
//! A source snapshot is indexed by track id, then every target entry sharing a track id has
//! the selected field filled in, but only when the target's value is absent. Present values
//! are never overwritten, so repeated runs settle after the first pass.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chart_types::{ChartDocument, FieldValue, MetadataField};

use crate::store::{self, Snapshot, SnapshotId};

/// Track id → present value for one field, built from a source snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataIndex {
    field: MetadataField,
    values: BTreeMap<String, FieldValue>,
}

impl MetadataIndex {
    /// Index every entry that has both a track id and a present value for `field`.
    ///
    /// When a track appears more than once the first occurrence wins.
    pub fn build(source: &ChartDocument, field: MetadataField) -> Self {
        let mut values = BTreeMap::new();
        for entry in &source.entries {
            let Some(track_id) = entry.track_id() else {
                continue;
            };
            if let Some(value) = entry.field(field) {
                values.entry(track_id.to_string()).or_insert(value);
            }
        }
        Self { field, values }
    }

    /// Field this index was built for.
    pub fn field(&self) -> MetadataField {
        self.field
    }

    /// Source value for `track_id`, if the source had one.
    pub fn get(&self, track_id: &str) -> Option<&FieldValue> {
        self.values.get(track_id)
    }

    /// Number of indexed tracks.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when the source had no present value for the field.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Indexed track ids in sorted order.
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// Outcome of propagating into one document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Entries whose field was filled.
    pub filled: usize,
    /// Matching entries left alone because they already had a value.
    pub skipped: usize,
}

/// Fill absent fields of `target` from `index`. Returns what changed.
pub fn propagate(target: &mut ChartDocument, index: &MetadataIndex) -> PropagationOutcome {
    let field = index.field();
    let mut outcome = PropagationOutcome::default();
    if index.is_empty() {
        tracing::debug!(%field, "source has no values, nothing to propagate");
        return outcome;
    }
    for entry in &mut target.entries {
        let Some(track_id) = entry.track_id() else {
            continue;
        };
        let Some(value) = index.get(track_id) else {
            continue;
        };
        if entry.field(field).is_some() {
            tracing::debug!(
                track_id,
                title = entry.display_title(),
                %field,
                "already has a value, skipping"
            );
            outcome.skipped += 1;
            continue;
        }
        tracing::info!(
            track_id,
            title = entry.display_title(),
            %field,
            "filled from source"
        );
        entry.set_field(field, value);
        outcome.filled += 1;
    }
    outcome
}

/// Propagate into a loaded snapshot and mark it dirty when anything was filled.
pub fn propagate_snapshot(target: &mut Snapshot, index: &MetadataIndex) -> PropagationOutcome {
    let outcome = propagate(&mut target.document, index);
    if outcome.filled > 0 {
        target.mark_dirty();
    }
    outcome
}

/// Per-target result of a batch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetReport {
    pub id: SnapshotId,
    pub path: PathBuf,
    pub filled: usize,
    pub skipped: usize,
    /// `true` when the file was rewritten.
    pub saved: bool,
}

/// Result of propagating one source into many targets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of tracks in the source index.
    pub indexed: usize,
    pub targets: Vec<TargetReport>,
}

impl BatchReport {
    /// Total entries filled across all targets.
    pub fn total_filled(&self) -> usize {
        self.targets.iter().map(|t| t.filled).sum()
    }

    /// Targets that were rewritten.
    pub fn saved_count(&self) -> usize {
        self.targets.iter().filter(|t| t.saved).count()
    }
}

/// Collect target snapshot paths from collection directories, excluding the source.
///
/// Collections are visited in the given order and weeks in lexicographic order.
pub fn collect_targets(source: &Path, collections: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::new();
    for dir in collections {
        for path in store::list_week_files(dir)? {
            if store::same_file(&path, source) {
                continue;
            }
            if targets.iter().any(|seen: &PathBuf| store::same_file(seen, &path)) {
                continue;
            }
            targets.push(path);
        }
    }
    Ok(targets)
}

/// Propagate `field` from the snapshot at `source` into every week of `collections`.
///
/// Each target is saved as soon as it is processed, so targets finished before an error
/// keep their changes.
pub fn run_batch(
    source: &Path,
    collections: &[PathBuf],
    field: MetadataField,
) -> Result<BatchReport> {
    let source_snapshot = Snapshot::load(source)?;
    let index = MetadataIndex::build(&source_snapshot.document, field);
    tracing::info!(
        source = %source_snapshot.id,
        tracks = index.len(),
        %field,
        "indexed source snapshot"
    );

    let mut report = BatchReport {
        indexed: index.len(),
        targets: Vec::new(),
    };
    for path in collect_targets(source, collections)? {
        let mut target = Snapshot::load(&path)?;
        let outcome = propagate_snapshot(&mut target, &index);
        let saved = target.save_if_dirty()?;
        if saved {
            tracing::info!(snapshot = %target.id, filled = outcome.filled, "saved");
        } else {
            tracing::info!(snapshot = %target.id, "no updates needed");
        }
        report.targets.push(TargetReport {
            id: target.id,
            path,
            filled: outcome.filled,
            skipped: outcome.skipped,
            saved,
        });
    }
    tracing::info!(
        filled = report.total_filled(),
        saved = report.saved_count(),
        targets = report.targets.len(),
        "propagation done"
    );
    Ok(report)
}
