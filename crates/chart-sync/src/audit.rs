//! Read-only report of chart entries that still lack metadata.

use chart_types::{ChartDocument, MetadataField};

use crate::enrich::needs_enrichment;

const AUDITED_FIELDS: [MetadataField; 3] = [
    MetadataField::Title,
    MetadataField::Artists,
    MetadataField::ImageUrl,
];

/// One entry with at least one absent field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingEntry {
    pub placement: Option<i64>,
    pub track_id: Option<String>,
    pub missing: Vec<MetadataField>,
    /// Title or artists are unknown, so the entry qualifies for enrichment.
    pub enrichable: bool,
}

/// List entries missing a title, artists or image, ordered by placement.
pub fn audit_document(doc: &ChartDocument) -> Vec<MissingEntry> {
    let mut out: Vec<MissingEntry> = doc
        .entries
        .iter()
        .filter_map(|entry| {
            let missing: Vec<MetadataField> = AUDITED_FIELDS
                .into_iter()
                .filter(|field| entry.field(*field).is_none())
                .collect();
            if missing.is_empty() {
                return None;
            }
            Some(MissingEntry {
                placement: entry.placement(),
                track_id: entry.track_id().map(str::to_string),
                missing,
                enrichable: needs_enrichment(entry),
            })
        })
        .collect();
    out.sort_by_key(|entry| entry.placement.unwrap_or(i64::MAX));
    out
}

/// Track ids of entries that enrichment would consider, in report order.
pub fn enrichable_track_ids(report: &[MissingEntry]) -> Vec<String> {
    report
        .iter()
        .filter(|entry| entry.enrichable)
        .filter_map(|entry| entry.track_id.clone())
        .collect()
}
