//! Summary Writer - Atomic Plain-Text Collection Summary
//!
//! Rewrites the diagnostic summary file after every cycle. The file is
//! written to a temporary sibling first and then renamed, so readers
//! always see either the previous or the new summary.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use tokio::fs;
use tracing::{debug, instrument};

use crate::domain::snapshot::Snapshot;

/// Render a snapshot as the human-readable summary text.
pub fn render_summary(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Collection summary - {}",
        snapshot
            .collected_at()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let _ = writeln!(out, "Cycle: {}", snapshot.cycle_id());
    let _ = writeln!(
        out,
        "Duration: {:.2} seconds",
        snapshot.duration().as_secs_f64()
    );

    for (family, record) in snapshot.iter() {
        let status = if record.is_synthetic() {
            "SIMULATED"
        } else {
            "SUCCESS"
        };
        let _ = writeln!(out, "\n[{}] - {status}", family.key().to_uppercase());
        for (name, value) in record.fields() {
            let _ = writeln!(out, "  {name}: {value}");
        }
    }
    out
}

/// Atomic writer for the summary file.
pub struct SummaryWriter {
    /// Final summary path.
    path: PathBuf,
}

impl SummaryWriter {
    /// Create a writer targeting `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Per-cycle temporary sibling, so overlapping cycles never share one.
    fn tmp_path(&self, snapshot: &Snapshot) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.tmp", snapshot.cycle_id()));
        PathBuf::from(tmp)
    }

    /// Target path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render and write the summary atomically (tmp → rename).
    ///
    /// # Errors
    /// Fails when the parent directory cannot be created or the file
    /// cannot be written or renamed.
    #[instrument(skip(self, snapshot), fields(cycle_id = %snapshot.cycle_id()))]
    pub async fn write(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create summary directory")?;
        }

        let tmp_path = self.tmp_path(snapshot);
        fs::write(&tmp_path, render_summary(snapshot))
            .await
            .context("Failed to write tmp summary file")?;

        fs::rename(&tmp_path, &self.path)
            .await
            .context("Failed to rename summary file")?;

        debug!(path = %self.path.display(), "Summary written");
        Ok(())
    }
}
