// crates/orgvault-backup/src/archive.rs
// ============================================================================
// Module: Archive Sink
// Description: Scoped tar.gz sink that never exposes a partial archive.
// Purpose: Stage archive bytes under a working name and publish them with a
//          rename only after every artifact was appended.
// Dependencies: flate2, tar
// ============================================================================

//! ## Overview
//! The sink writes to `<name>.partial` in the target directory and renames
//! to the final name in [`ArchiveSink::finish`]. On every other exit path
//! (an append error, an orchestrator abort, a panic unwinding through the
//! scope) the `Drop` impl removes the partial file, so the catalog can
//! never list a half-written archive as valid.
//!
//! Artifact files are stored under their base name only; names are
//! timestamp-and-tenant-qualified upstream, so the flat namespace cannot
//! collide within one run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::Builder;

use crate::error::BackupError;

// ============================================================================
// SECTION: Archive Sink
// ============================================================================

/// Scoped writer assembling one compressed archive.
///
/// # Invariants
/// - The final path exists only after `finish` returned `Ok`.
/// - The partial path never survives the sink's scope.
pub struct ArchiveSink {
    /// Staging path written until `finish`.
    partial_path: PathBuf,
    /// Final path published by `finish`.
    final_path: PathBuf,
    /// The tar builder over the gzip encoder; `None` once consumed.
    builder: Option<Builder<GzEncoder<File>>>,
    /// Set once the final rename succeeded.
    finished: bool,
}

impl ArchiveSink {
    /// Opens a sink for `name` inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when the staging file cannot be created.
    pub fn create(dir: &Path, name: &str) -> Result<Self, BackupError> {
        let partial_path = dir.join(format!("{name}.partial"));
        let final_path = dir.join(name);
        let file = File::create(&partial_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        Ok(Self {
            partial_path,
            final_path,
            builder: Some(Builder::new(encoder)),
            finished: false,
        })
    }

    /// Appends one artifact file under its base name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when the source cannot be read or the
    /// archive cannot be written.
    pub fn append_file(&mut self, name: &str, source: &Path) -> Result<(), BackupError> {
        let Some(builder) = self.builder.as_mut() else {
            return Err(BackupError::Io("archive sink already finished".to_string()));
        };
        let mut file = File::open(source)?;
        builder.append_file(name, &mut file)?;
        Ok(())
    }

    /// Flushes the archive and publishes it under its final name.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] when flushing or the rename fails; the
    /// partial file is removed in that case.
    pub fn finish(mut self) -> Result<PathBuf, BackupError> {
        let Some(builder) = self.builder.take() else {
            return Err(BackupError::Io("archive sink already finished".to_string()));
        };
        let encoder = builder.into_inner()?;
        let file = encoder.finish()?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&self.partial_path, &self.final_path)?;
        self.finished = true;
        Ok(self.final_path.clone())
    }
}

impl Drop for ArchiveSink {
    fn drop(&mut self) {
        if !self.finished {
            // Abandoned scope: drop the staged bytes so the catalog never
            // sees them.
            drop(self.builder.take());
            let _ = std::fs::remove_file(&self.partial_path);
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::ArchiveSink;

    type TestResult = Result<(), String>;

    #[test]
    fn abandoned_sink_leaves_no_partial_file() -> TestResult {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let source = dir.path().join("artifact.db");
        std::fs::write(&source, b"payload").map_err(|err| err.to_string())?;
        {
            let mut sink = ArchiveSink::create(dir.path(), "run.tar.gz")
                .map_err(|err| err.to_string())?;
            sink.append_file("artifact.db", &source).map_err(|err| err.to_string())?;
            // Dropped without finish.
        }
        if dir.path().join("run.tar.gz.partial").exists() {
            return Err("partial file survived an abandoned sink".to_string());
        }
        if dir.path().join("run.tar.gz").exists() {
            return Err("final archive appeared without finish".to_string());
        }
        Ok(())
    }

    #[test]
    fn finished_sink_publishes_only_the_final_name() -> TestResult {
        let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
        let source = dir.path().join("artifact.db");
        let mut file = std::fs::File::create(&source).map_err(|err| err.to_string())?;
        file.write_all(b"payload").map_err(|err| err.to_string())?;
        drop(file);
        let mut sink =
            ArchiveSink::create(dir.path(), "run.tar.gz").map_err(|err| err.to_string())?;
        sink.append_file("artifact.db", &source).map_err(|err| err.to_string())?;
        let published = sink.finish().map_err(|err| err.to_string())?;
        if !published.is_file() {
            return Err("final archive missing after finish".to_string());
        }
        if dir.path().join("run.tar.gz.partial").exists() {
            return Err("partial file survived finish".to_string());
        }
        Ok(())
    }
}
