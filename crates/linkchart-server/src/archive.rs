use linkchart_core::{rename_in_reports, LinkchartError, Report, ReportArchive, Result};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockWriteGuard};
use std::time::SystemTime;
use tracing::{info, warn};

/// Identity of one version of the archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok()?,
            len: meta.len(),
        })
    }
}

#[derive(Debug)]
struct Snapshot {
    reports: Vec<Report>,
    stamp: Option<FileStamp>,
}

/// Report archive backed by a JSON array on disk.
///
/// The file is re-read whenever its modification time or length changes,
/// so reports appended by other tools show up on the next read. Renames
/// are written back through a temp file so a crash never leaves a
/// half-written archive.
pub struct JsonFileArchive {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl JsonFileArchive {
    /// Open the archive at `path`. A missing file is an empty archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let stamp = FileStamp::of(&path);
        let reports = Self::read(&path)?;
        info!("Loaded {} report(s) from {}", reports.len(), path.display());
        Ok(Self {
            path,
            snapshot: RwLock::new(Snapshot { reports, stamp }),
        })
    }

    fn read(path: &Path) -> Result<Vec<Report>> {
        if !path.exists() {
            warn!("No report archive at {}; starting empty", path.display());
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self, reports: &[Report]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(reports)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn snapshot_mut(&self) -> Result<RwLockWriteGuard<'_, Snapshot>> {
        self.snapshot.write().map_err(|_| LinkchartError::LockPoisoned)
    }

    /// Re-read the file into `snapshot` if it changed since the last read.
    fn refresh(&self, snapshot: &mut Snapshot) -> Result<bool> {
        let stamp = FileStamp::of(&self.path);
        if stamp == snapshot.stamp {
            return Ok(false);
        }
        snapshot.reports = Self::read(&self.path)?;
        snapshot.stamp = stamp;
        info!(
            "Reloaded {} report(s) from {}",
            snapshot.reports.len(),
            self.path.display()
        );
        Ok(true)
    }

    /// Re-read the file now if it changed. Returns the report count.
    pub fn reload(&self) -> Result<usize> {
        let mut snapshot = self.snapshot_mut()?;
        self.refresh(&mut snapshot)?;
        Ok(snapshot.reports.len())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportArchive for JsonFileArchive {
    fn reports(&self) -> Result<Vec<Report>> {
        {
            let snapshot = self.snapshot.read().map_err(|_| LinkchartError::LockPoisoned)?;
            if snapshot.stamp == FileStamp::of(&self.path) {
                return Ok(snapshot.reports.clone());
            }
        }
        let mut snapshot = self.snapshot_mut()?;
        self.refresh(&mut snapshot)?;
        Ok(snapshot.reports.clone())
    }

    fn rename_entity(&self, old: &str, new: &str) -> Result<usize> {
        let mut snapshot = self.snapshot_mut()?;
        self.refresh(&mut snapshot)?;

        let mut updated = snapshot.reports.clone();
        let renamed = rename_in_reports(&mut updated, old, new);
        if renamed > 0 {
            self.write(&updated)?;
            snapshot.reports = updated;
            snapshot.stamp = FileStamp::of(&self.path);
        }
        info!("Renamed {} mention(s) of '{}' to '{}'", renamed, old, new);
        Ok(renamed)
    }
}
