//! Snapshot files on disk.
//!
//! Layout is `<data_dir>/<collection>/<year>-W<week>.json`. Documents are rewritten with
//! two-space indentation and literal non-ASCII text, and only when something changed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chart_types::ChartDocument;

/// Identifies one week's chart for one collection.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId {
    /// Collection (directory) name, e.g. `Signe`.
    pub collection: String,
    /// Week label, e.g. `2026-W04`.
    pub week: String,
}

impl SnapshotId {
    /// Derive the id from a snapshot path.
    pub fn from_path(path: &Path) -> Self {
        let collection = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let week = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { collection, week }
    }
}

impl std::fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.collection.is_empty() {
            f.write_str(&self.week)
        } else {
            write!(f, "{}/{}", self.collection, self.week)
        }
    }
}

/// A chart document loaded into memory together with its location and dirty flag.
#[derive(Debug)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub path: PathBuf,
    pub document: ChartDocument,
    dirty: bool,
}

impl Snapshot {
    /// Wrap an in-memory document. Nothing is read from disk.
    pub fn new(path: PathBuf, document: ChartDocument) -> Self {
        Self {
            id: SnapshotId::from_path(&path),
            path,
            document,
            dirty: false,
        }
    }

    /// Read and parse a snapshot file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            bail!("snapshot not found: {}", path.display());
        }
        let document = read_document(path)?;
        Ok(Self::new(path.to_path_buf(), document))
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the snapshot back if any entry changed. Returns whether a write happened.
    pub fn save_if_dirty(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        write_document(&self.path, &self.document)?;
        self.dirty = false;
        Ok(true)
    }
}

/// Parse a chart document from disk.
pub fn read_document(path: &Path) -> Result<ChartDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse snapshot {}", path.display()))
}

/// Serialize a chart document to disk.
pub fn write_document(path: &Path, document: &ChartDocument) -> Result<()> {
    let body = serde_json::to_string_pretty(document)
        .with_context(|| format!("encode snapshot {}", path.display()))?;
    std::fs::write(path, body).with_context(|| format!("write snapshot {}", path.display()))
}

/// Returns `true` for file names like `2026-W04.json`.
pub fn is_week_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".json") else {
        return false;
    };
    let bytes = stem.as_bytes();
    bytes.len() == 8
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && &bytes[4..6] == b"-W"
        && bytes[6..].iter().all(u8::is_ascii_digit)
}

/// List week files of a collection directory in lexicographic order.
pub fn list_week_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("collection directory not found: {}", dir.display());
    }
    let mut files = Vec::new();
    let read_dir =
        std::fs::read_dir(dir).with_context(|| format!("read collection {}", dir.display()))?;
    for entry in read_dir {
        let entry = entry.with_context(|| format!("read collection {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_week = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_week_file_name);
        if is_week {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Compare two snapshot paths, resolving symlinks and relative segments when possible.
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::scratch_dir;
    use super::*;

    #[test]
    fn is_week_file_name_matches_pattern() {
        assert!(is_week_file_name("2026-W04.json"));
        assert!(!is_week_file_name("2026-W4.json"));
        assert!(!is_week_file_name("2026-W04.json.bak"));
        assert!(!is_week_file_name("notes.json"));
        assert!(!is_week_file_name("2026-W04.txt"));
    }

    #[test]
    fn list_week_files_sorts_and_filters() {
        let root = scratch_dir("list");
        for name in ["2026-W03.json", "2026-W01.json", "readme.json", "2025-W52.json"] {
            std::fs::write(root.join(name), "{}").unwrap();
        }
        let files = list_week_files(&root).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["2025-W52.json", "2026-W01.json", "2026-W03.json"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let root = scratch_dir("missing");
        let err = Snapshot::load(&root.join("2026-W04.json")).unwrap_err();
        assert!(err.to_string().contains("snapshot not found"));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let root = scratch_dir("malformed");
        let path = root.join("2026-W04.json");
        std::fs::write(&path, "{ \"entries\": [").unwrap();
        assert!(Snapshot::load(&path).is_err());
    }

    #[test]
    fn save_writes_only_when_dirty() {
        let root = scratch_dir("save").join("Walter");
        std::fs::create_dir_all(&root).unwrap();
        let path = root.join("2026-W04.json");
        let original = "{\"week\":\"2026-W04\",\"entries\":[]}";
        std::fs::write(&path, original).unwrap();

        let mut snapshot = Snapshot::load(&path).unwrap();
        assert_eq!(snapshot.id.collection, "Walter");
        assert_eq!(snapshot.id.week, "2026-W04");
        assert!(!snapshot.save_if_dirty().unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        snapshot.mark_dirty();
        assert!(snapshot.save_if_dirty().unwrap());
        assert!(!snapshot.is_dirty());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "{\n  \"week\": \"2026-W04\",\n  \"entries\": []\n}"
        );
    }

    #[test]
    fn write_keeps_non_ascii_literal() {
        let root = scratch_dir("utf8");
        let path = root.join("2026-W04.json");
        std::fs::write(&path, r#"{"entries":[{"title":"—","artists":["Sigur Rós"]}]}"#).unwrap();
        let doc = read_document(&path).unwrap();
        write_document(&path, &doc).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"title\": \"—\""));
        assert!(written.contains("Sigur Rós"));
    }
}
