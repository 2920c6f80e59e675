//! Filelist and stage-spec parsing for the CLI.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Read a newline-delimited list of paths. Blank lines and `#` comments are
/// ignored; an empty resulting list is fatal.
pub fn read_path_list(path: &PathBuf) -> Result<Vec<PathBuf>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to open filelist: {}", path.display()))?;

    let files: Vec<PathBuf> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect();

    if files.is_empty() {
        bail!("filelist is empty: {}", path.display());
    }
    Ok(files)
}

/// Parse a `NAME:FILELIST_PATH` stage specification. Both parts are
/// required and non-empty.
pub fn parse_stage_spec(spec: &str) -> Result<(String, PathBuf)> {
    let Some((name, filelist)) = spec.split_once(':') else {
        bail!("bad stage spec (expected NAME:FILELIST): {spec}");
    };
    let name = name.trim();
    let filelist = filelist.trim();
    if name.is_empty() || filelist.is_empty() {
        bail!("bad stage spec (expected NAME:FILELIST): {spec}");
    }
    Ok((name.to_string(), PathBuf::from(filelist)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_spec_parses_both_halves() {
        let (name, filelist) = parse_stage_spec("run1_bnb: /lists/run1.list").unwrap();
        assert_eq!(name, "run1_bnb");
        assert_eq!(filelist, PathBuf::from("/lists/run1.list"));
    }

    #[test]
    fn stage_spec_requires_both_halves() {
        assert!(parse_stage_spec("no_separator").is_err());
        assert!(parse_stage_spec(":/lists/run1.list").is_err());
        assert!(parse_stage_spec("run1:").is_err());
    }

    #[test]
    fn path_list_skips_blanks_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.list");
        std::fs::write(&path, "# header\n/a.parquet\n\n  /b.parquet  \n").unwrap();

        let files = read_path_list(&path).unwrap();
        assert_eq!(files, vec![PathBuf::from("/a.parquet"), PathBuf::from("/b.parquet")]);
    }

    #[test]
    fn empty_path_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("files.list");
        std::fs::write(&path, "# only a comment\n").unwrap();
        assert!(read_path_list(&path).is_err());
    }
}
