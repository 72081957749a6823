//! Atomic table writers.
//!
//! Every output is written to a temporary file in the destination directory
//! and renamed into place on commit, so a failed run never leaves a partial
//! table behind under the final name.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Separator between items of a list-valued cell
pub const LIST_SEPARATOR: &str = ",";

/// Placeholder for a missing value
pub const MISSING: &str = "NA";

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Streaming TSV writer committed atomically
pub struct TableWriter {
    writer: BufWriter<NamedTempFile>,
    path: PathBuf,
    rows: usize,
}

impl TableWriter {
    /// Start a table at `path` and write its header row
    ///
    /// # Errors
    ///
    /// Returns an IO error if the temporary file cannot be created.
    pub fn create(path: &Path, header: &[&str]) -> std::io::Result<Self> {
        let dir = parent_dir(path);
        let file = NamedTempFile::new_in(dir)?;
        let mut writer = Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
            rows: 0,
        };
        writer.write_line(header.iter().copied())?;
        Ok(writer)
    }

    /// Append one data row
    ///
    /// # Errors
    ///
    /// Returns an IO error if the write fails.
    pub fn write_row<I, S>(&mut self, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.write_line(fields)?;
        self.rows += 1;
        Ok(())
    }

    fn write_line<I, S>(&mut self, fields: I) -> std::io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.writer.write_all(field.as_ref().as_bytes())?;
        }
        self.writer.write_all(b"\n")
    }

    /// Data rows written so far
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and move the table into place
    ///
    /// # Errors
    ///
    /// Returns an IO error if flushing or renaming fails.
    pub fn commit(self) -> std::io::Result<PathBuf> {
        let file = self.writer.into_inner().map_err(|e| e.into_error())?;
        file.persist(&self.path).map_err(|e| e.error)?;
        tracing::debug!(path = %self.path.display(), rows = self.rows, "Committed table");
        Ok(self.path)
    }
}

/// Write a whole text file atomically
///
/// # Errors
///
/// Returns an IO error if the file cannot be written or renamed into place.
pub fn write_text_atomic(path: &Path, contents: &str) -> std::io::Result<PathBuf> {
    let dir = parent_dir(path);
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(path.to_path_buf())
}

/// Format a rate with fixed precision
#[must_use]
pub fn format_rate(value: f64) -> String {
    format!("{value:.6}")
}

/// Format an optional rate, `NA` when absent
#[must_use]
pub fn format_optional_rate(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), format_rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_writer_commits_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.tsv");

        let mut writer = TableWriter::create(&path, &["orthogroup", "rate"]).unwrap();
        writer.write_row(["OG1", "1.000000"]).unwrap();
        writer.write_row(vec!["OG2".to_string(), format_rate(0.5)]).unwrap();
        assert!(!path.exists());
        assert_eq!(writer.rows(), 2);

        let committed = writer.commit().unwrap();
        assert_eq!(committed, path);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "orthogroup\trate\nOG1\t1.000000\nOG2\t0.500000\n");
    }

    #[test]
    fn test_dropped_writer_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ocl.tsv");
        {
            let mut writer = TableWriter::create(&path, &["a"]).unwrap();
            writer.write_row(["x"]).unwrap();
        }
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_write_text_atomic_and_formatting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology_001.newick");
        write_text_atomic(&path, "(A,B);\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "(A,B);\n");

        assert_eq!(format_optional_rate(None), "NA");
        assert_eq!(format_optional_rate(Some(0.25)), "0.250000");
    }
}
