//! Analysis-facing sample list: a tab-separated index of persisted samples.
//!
//! Four columns: `sample_name`, `sample_kind`, `beam_mode`, `output_path`.
//! Rows are upserted keyed by (name, kind, beam) and the whole file is
//! rewritten sorted by (kind, beam, name) on every update.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use bb_core::{Error, Result};

use crate::types::Sample;

/// One row of the sample list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleListEntry {
    /// Sample name.
    pub sample_name: String,
    /// Canonical kind name.
    pub kind: String,
    /// Canonical beam mode name.
    pub beam: String,
    /// Path of the persisted sample container.
    pub output_path: String,
}

/// Read a sample list.
///
/// Blank lines and `#` comments are skipped, as is a first data row whose
/// first field is literally `sample_name` (a header). With `allow_missing`,
/// a nonexistent file reads as the empty list.
pub fn read_sample_list(
    path: &Path,
    allow_missing: bool,
    require_nonempty: bool,
) -> Result<Vec<SampleListEntry>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if allow_missing && e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::open(path, e)),
    };

    let mut entries = Vec::new();
    let mut first_data_row = true;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(Error::Input(format!(
                "malformed sample list entry in {}: {line}",
                path.display()
            )));
        }

        if first_data_row && fields[0] == "sample_name" {
            first_data_row = false;
            continue;
        }
        first_data_row = false;

        entries.push(SampleListEntry {
            sample_name: fields[0].to_string(),
            kind: fields[1].to_string(),
            beam: fields[2].to_string(),
            output_path: fields[3].to_string(),
        });
    }

    if require_nonempty && entries.is_empty() {
        return Err(Error::Input(format!("sample list is empty: {}", path.display())));
    }
    Ok(entries)
}

/// Rewrite the sample list, sorted by (kind, beam, name), with a commented
/// header line.
pub fn write_sample_list(path: &Path, mut entries: Vec<SampleListEntry>) -> Result<()> {
    entries.sort_by(|a, b| {
        (&a.kind, &a.beam, &a.sample_name).cmp(&(&b.kind, &b.beam, &b.sample_name))
    });

    let mut text = String::from("# sample_name\tsample_kind\tbeam_mode\toutput_path\n");
    for entry in &entries {
        text.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            entry.sample_name, entry.kind, entry.beam, entry.output_path
        ));
    }
    fs::write(path, text).map_err(|e| Error::open(path, e))?;
    Ok(())
}

/// Upsert one sample's row, keyed by (name, kind, beam), and rewrite the
/// list sorted. Two entries sharing a name but differing in kind or beam
/// stay distinct rows.
pub fn upsert_sample_list(path: &Path, sample: &Sample, output_path: &str) -> Result<()> {
    let mut entries = read_sample_list(path, true, false)?;
    let kind = sample.kind.name();
    let beam = sample.beam.name();

    match entries.iter_mut().find(|e| {
        e.sample_name == sample.sample_name && e.kind == kind && e.beam == beam
    }) {
        Some(entry) => entry.output_path = output_path.to_string(),
        None => entries.push(SampleListEntry {
            sample_name: sample.sample_name.clone(),
            kind: kind.to_string(),
            beam: beam.to_string(),
            output_path: output_path.to_string(),
        }),
    }

    write_sample_list(path, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bb_core::{BeamMode, SampleKind};

    fn sample(name: &str, kind: SampleKind, beam: BeamMode) -> Sample {
        Sample {
            sample_name: name.to_string(),
            kind,
            beam,
            fragments: Vec::new(),
            subrun_pot_sum: 0.0,
            db_tortgt_pot_sum: 0.0,
            db_tor101_pot_sum: 0.0,
            normalization: 1.0,
            normalized_pot_sum: 0.0,
        }
    }

    #[test]
    fn upsert_inserts_updates_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.tsv");

        upsert_sample_list(&path, &sample("nu", SampleKind::Overlay, BeamMode::Bnb), "/out/nu")
            .unwrap();
        upsert_sample_list(&path, &sample("beam", SampleKind::Data, BeamMode::Bnb), "/out/beam")
            .unwrap();
        upsert_sample_list(&path, &sample("nu", SampleKind::Overlay, BeamMode::Bnb), "/out/nu2")
            .unwrap();

        let entries = read_sample_list(&path, false, true).unwrap();
        assert_eq!(entries.len(), 2);
        // Sorted by (kind, beam, name): data before overlay.
        assert_eq!(entries[0].sample_name, "beam");
        assert_eq!(entries[1].sample_name, "nu");
        assert_eq!(entries[1].output_path, "/out/nu2");
    }

    #[test]
    fn same_name_different_kind_stays_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.tsv");

        upsert_sample_list(&path, &sample("nu", SampleKind::Data, BeamMode::Bnb), "/out/a")
            .unwrap();
        upsert_sample_list(&path, &sample("nu", SampleKind::Overlay, BeamMode::Bnb), "/out/b")
            .unwrap();

        let entries = read_sample_list(&path, false, true).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn header_and_comments_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        std::fs::write(
            &path,
            "# a comment\n\nsample_name\tsample_kind\tbeam_mode\toutput_path\nnu\tdata\tbnb\t/out/nu\n",
        )
        .unwrap();

        let entries = read_sample_list(&path, false, true).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sample_name, "nu");
    }

    #[test]
    fn malformed_row_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        std::fs::write(&path, "nu\tdata\tbnb\n").unwrap();
        assert!(read_sample_list(&path, false, false).is_err());
    }

    #[test]
    fn missing_file_reads_empty_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.tsv");
        assert!(read_sample_list(&path, true, false).unwrap().is_empty());
        assert!(read_sample_list(&path, false, false).is_err());
    }
}
