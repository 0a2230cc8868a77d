//! The report archive seam.
//!
//! The engine only reads reports. The single write it may trigger is an
//! entity rename, which the archive performs on its own records.

use crate::error::{LinkchartError, Result};
use crate::types::Report;
use log::info;
use std::sync::RwLock;

/// Source of investigation reports
pub trait ReportArchive: Send + Sync {
    /// All reports, in archive order.
    fn reports(&self) -> Result<Vec<Report>>;

    /// Rewrite every mention named exactly `old` to `new` across stored
    /// reports. Returns the number of mentions rewritten.
    fn rename_entity(&self, old: &str, new: &str) -> Result<usize>;
}

/// Rename mentions in place. Shared by archive implementations.
pub fn rename_in_reports(reports: &mut [Report], old: &str, new: &str) -> usize {
    let mut renamed = 0;
    for report in reports.iter_mut() {
        for entity in report.entities.iter_mut().filter(|e| e.name == old) {
            entity.name = new.to_string();
            renamed += 1;
        }
    }
    renamed
}

/// Archive held in memory
#[derive(Debug, Default)]
pub struct MemoryArchive {
    reports: RwLock<Vec<Report>>,
}

impl MemoryArchive {
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            reports: RwLock::new(reports),
        }
    }

    pub fn push(&self, report: Report) -> Result<()> {
        self.reports
            .write()
            .map_err(|_| LinkchartError::LockPoisoned)?
            .push(report);
        Ok(())
    }
}

impl ReportArchive for MemoryArchive {
    fn reports(&self) -> Result<Vec<Report>> {
        Ok(self
            .reports
            .read()
            .map_err(|_| LinkchartError::LockPoisoned)?
            .clone())
    }

    fn rename_entity(&self, old: &str, new: &str) -> Result<usize> {
        let mut reports = self.reports.write().map_err(|_| LinkchartError::LockPoisoned)?;
        let renamed = rename_in_reports(&mut reports, old, new);
        info!("Renamed {} mention(s) of '{}' to '{}'", renamed, old, new);
        Ok(renamed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entity;

    #[test]
    fn test_rename_rewrites_exact_matches() {
        let archive = MemoryArchive::new(vec![
            Report::new("r1", "One")
                .with_entity(Entity::person("Jon Smith"))
                .with_entity(Entity::person("Jon Smithers")),
            Report::new("r2", "Two").with_entity(Entity::person("Jon Smith")),
        ]);

        assert_eq!(archive.rename_entity("Jon Smith", "John Smith").unwrap(), 2);

        let reports = archive.reports().unwrap();
        assert_eq!(reports[0].entities[0].name, "John Smith");
        assert_eq!(reports[0].entities[1].name, "Jon Smithers");
        assert_eq!(reports[1].entities[0].name, "John Smith");
        assert_eq!(archive.rename_entity("Nobody", "Somebody").unwrap(), 0);
    }
}
