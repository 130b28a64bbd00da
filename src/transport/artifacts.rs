use async_trait::async_trait;
use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::models::SavedArtifact;

/// Filename a downloaded report PDF is saved under.
pub fn pdf_filename(report_id: i64, report_name: &str) -> String {
    format!("{}_{}.pdf", report_name, report_id)
}

/// Filename a downloaded chart image is saved under. `chart_type` is passed
/// through unchecked.
pub fn chart_filename(report_id: i64, chart_type: &str, report_name: &str) -> String {
    format!("{}_chart_{}_{}.png", chart_type, report_name, report_id)
}

/// Destination for downloaded binary artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, filename: &str, contents: Bytes) -> io::Result<SavedArtifact>;
}

/// Saves artifacts into a directory.
///
/// Contents are first written to a hidden staging file which is renamed into
/// place once complete. The staging file is removed on every other path.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Path-safe form of a filename. Only used for the on-disk location.
fn disk_name(filename: &str) -> String {
    let name: String = filename
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match name.as_str() {
        "" | "." | ".." => format!("artifact{}", name.replace('.', "_")),
        _ => name,
    }
}

/// Staging file removed on drop unless committed.
struct StagedFile {
    path: PathBuf,
    committed: bool,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    async fn commit(mut self, target: &Path) -> io::Result<()> {
        tokio::fs::rename(&self.path, target).await?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Released staging file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to release staging file: {}", e),
        }
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(&self, filename: &str, contents: Bytes) -> io::Result<SavedArtifact> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let name = disk_name(filename);
        let target = self.dir.join(&name);
        let staged = StagedFile::new(self.dir.join(format!(".{}.part", name)));

        let mut file = tokio::fs::File::create(&staged.path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        drop(file);

        staged.commit(&target).await?;

        Ok(SavedArtifact {
            filename: filename.to_string(),
            path: target,
            bytes: contents.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn filenames_follow_download_conventions() {
        assert_eq!(pdf_filename(42, "Monthly"), "Monthly_42.pdf");
        assert_eq!(
            chart_filename(42, "revenue", "Monthly"),
            "revenue_chart_Monthly_42.png"
        );
        assert_eq!(
            chart_filename(7, "products", "Q1 Sales"),
            "products_chart_Q1 Sales_7.png"
        );
    }

    #[rstest]
    #[case("Monthly_42.pdf", "Monthly_42.pdf")]
    #[case("../etc/passwd_1.pdf", ".._etc_passwd_1.pdf")]
    #[case("a\\b_2.pdf", "a_b_2.pdf")]
    #[case("..", "artifact__")]
    fn disk_names_stay_inside_directory(#[case] filename: &str, #[case] expected: &str) {
        assert_eq!(disk_name(filename), expected);
    }

    #[tokio::test]
    async fn save_writes_file_and_leaves_no_staging_file() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectorySink::new(tmp.path().join("downloads"));

        let saved = sink
            .save("Monthly_42.pdf", Bytes::from_static(b"%PDF-1.7"))
            .await
            .unwrap();

        assert_eq!(saved.filename, "Monthly_42.pdf");
        assert_eq!(saved.bytes, 8);
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"%PDF-1.7");
        assert_eq!(entries(sink.dir()), vec!["Monthly_42.pdf".to_string()]);
    }

    #[tokio::test]
    async fn failed_commit_releases_staging_file() {
        let tmp = TempDir::new().unwrap();
        let sink = DirectorySink::new(tmp.path());
        // A directory in the way makes the final rename fail.
        std::fs::create_dir(tmp.path().join("Monthly_42.pdf")).unwrap();

        let result = sink
            .save("Monthly_42.pdf", Bytes::from_static(b"%PDF-1.7"))
            .await;

        assert!(result.is_err());
        assert_eq!(entries(tmp.path()), vec!["Monthly_42.pdf".to_string()]);
    }
}
