use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use indexmap::IndexMap;
use log::{info, warn};
use rayon::prelude::*;

use crate::cache::{Cache, ImportStamp};
use crate::catalog::{parse_catalog, CATALOG_FORMAT_VERSION};
use crate::config::ImportSettings;
use crate::domain::UnitProfile;
use crate::errors::read_to_string;

pub const CATALOG_STAMP: &str = "catalog";
pub const UNITS_KEY: &str = "units";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPlan {
    /// Discard previously imported units and keep only this run's output
    Full,
    /// Upsert this run's units into the previous import by content id
    Incremental,
}

/// A version mismatch (or no previous import) means earlier output cannot be merged
pub fn plan_import(stamp: Option<&ImportStamp>, current_version: u32) -> ImportPlan {
    match stamp {
        Some(stamp) if stamp.format_version == current_version => ImportPlan::Incremental,
        _ => ImportPlan::Full,
    }
}

#[derive(Debug)]
pub struct CatalogImportReport {
    pub plan: ImportPlan,
    pub documents: usize,
    pub failed: Vec<PathBuf>,
    pub units: usize,
    /// False when a full import had failures and must be retried
    pub complete: bool,
}

pub struct CatalogImportService {
    cache: Cache,
    extensions: Vec<&'static str>,
}

impl CatalogImportService {
    pub fn new(settings: &ImportSettings) -> Result<Self> {
        Ok(Self {
            cache: Cache::new(&settings.cache_dir)?,
            extensions: settings.catalog_extensions.clone(),
        })
    }

    pub fn run(&self, catalog_dir: &Path) -> Result<CatalogImportReport> {
        info!("=== Starting Catalog Import ===\n");

        // Step 1: Find documents
        let paths = self.list_documents(catalog_dir)?;
        if paths.is_empty() {
            bail!("No catalog documents found in {}", catalog_dir.display());
        }
        info!("  → Found {} catalog documents\n", paths.len());

        // Step 2: Read and parse in parallel
        let (parsed, failed) = parse_documents(&paths);
        if parsed.is_empty() {
            bail!("None of the {} catalog documents could be parsed", paths.len());
        }

        // Step 3: Decide between full and incremental import
        let previous = self.cache.load_stamp(CATALOG_STAMP)?;
        let plan = plan_import(previous.as_ref(), CATALOG_FORMAT_VERSION);
        info!(
            "  → Import plan: {:?} (stored version {:?}, parser version {})\n",
            plan,
            previous.as_ref().map(|s| s.format_version),
            CATALOG_FORMAT_VERSION
        );

        // A full import may only drop cached units once it has seen every
        // document. Until then, keep the previous units and leave the stamp
        // stale so the next run retries the full import.
        let complete = plan == ImportPlan::Incremental || failed.is_empty();
        let merge_plan = if complete { plan } else { ImportPlan::Incremental };

        // Step 4: Merge and save
        let units = self.merge_units(merge_plan, parsed.iter().flatten())?;
        self.cache.save_parsed(UNITS_KEY, &units)?;
        if complete {
            self.cache.save_stamp(
                CATALOG_STAMP,
                &ImportStamp {
                    format_version: CATALOG_FORMAT_VERSION,
                    imported_at: Utc::now(),
                    documents: parsed.len(),
                },
            )?;
        } else {
            warn!(
                "Full import incomplete ({} failed documents); previous units kept, stamp not updated",
                failed.len()
            );
        }

        info!("=== Catalog Import Complete: {} units ===", units.len());
        Ok(CatalogImportReport {
            plan,
            documents: paths.len(),
            failed,
            units: units.len(),
            complete,
        })
    }

    fn list_documents(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to list catalog directory {}", dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.has_catalog_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn has_catalog_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(ext))
            })
    }

    fn merge_units<'a>(
        &self,
        plan: ImportPlan,
        fresh: impl Iterator<Item = &'a UnitProfile>,
    ) -> Result<Vec<UnitProfile>> {
        let mut merged: IndexMap<String, UnitProfile> = IndexMap::new();

        if plan == ImportPlan::Incremental {
            let previous: Vec<UnitProfile> = self.cache.load_parsed(UNITS_KEY)?.unwrap_or_default();
            for unit in previous {
                merged.insert(unit.content_id.clone(), unit);
            }
        }

        for unit in fresh {
            merged.insert(unit.content_id.clone(), unit.clone());
        }

        Ok(merged.into_values().collect())
    }
}

/// Parse every document independently; unreadable ones are reported, not fatal
fn parse_documents(paths: &[PathBuf]) -> (Vec<Vec<UnitProfile>>, Vec<PathBuf>) {
    let results: Vec<(PathBuf, Result<Vec<UnitProfile>>)> = paths
        .par_iter()
        .map(|path| {
            let units = read_to_string(path).and_then(|xml| {
                parse_catalog(&xml).with_context(|| format!("Failed to parse {}", path.display()))
            });
            (path.clone(), units)
        })
        .collect();

    let mut parsed = Vec::new();
    let mut failed = Vec::new();
    for (path, result) in results {
        match result {
            Ok(units) => {
                info!("  → {}: {} units", path.display(), units.len());
                parsed.push(units);
            }
            Err(e) => {
                warn!("Skipping catalog document {}: {:#}", path.display(), e);
                failed.push(path);
            }
        }
    }
    (parsed, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MARINES: &str = r#"<catalogue id="sm" name="Space Marines">
  <sharedSelectionEntries>
    <selectionEntry type="unit" id="intercessors" name="Intercessor Squad">
      <costs><cost name="pts" value="90"/></costs>
    </selectionEntry>
  </sharedSelectionEntries>
</catalogue>"#;

    const ORKS: &str = r#"<catalogue id="orks" name="Orks">
  <sharedSelectionEntries>
    <selectionEntry type="unit" id="boyz" name="Boyz">
      <costs><cost name="pts" value="80"/></costs>
    </selectionEntry>
  </sharedSelectionEntries>
</catalogue>"#;

    fn service(cache_dir: &Path) -> CatalogImportService {
        CatalogImportService::new(&ImportSettings {
            cache_dir: cache_dir.to_path_buf(),
            catalog_extensions: vec!["cat"],
        })
        .unwrap()
    }

    fn cached_units(cache_dir: &Path) -> Vec<UnitProfile> {
        Cache::new(cache_dir)
            .unwrap()
            .load_parsed(UNITS_KEY)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_plan_import() {
        let stamp = ImportStamp {
            format_version: CATALOG_FORMAT_VERSION,
            imported_at: Utc::now(),
            documents: 1,
        };
        let stale = ImportStamp {
            format_version: CATALOG_FORMAT_VERSION - 1,
            ..stamp.clone()
        };

        assert_eq!(plan_import(None, CATALOG_FORMAT_VERSION), ImportPlan::Full);
        assert_eq!(plan_import(Some(&stale), CATALOG_FORMAT_VERSION), ImportPlan::Full);
        assert_eq!(plan_import(Some(&stamp), CATALOG_FORMAT_VERSION), ImportPlan::Incremental);
    }

    #[test]
    fn test_first_import_then_incremental_merge() {
        let catalogs = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(catalogs.path().join("marines.cat"), MARINES).unwrap();
        fs::write(catalogs.path().join("notes.txt"), "ignored").unwrap();

        let first = service(cache.path()).run(catalogs.path()).unwrap();
        assert_eq!(first.plan, ImportPlan::Full);
        assert_eq!(first.documents, 1);
        assert_eq!(first.units, 1);

        fs::remove_file(catalogs.path().join("marines.cat")).unwrap();
        fs::write(catalogs.path().join("orks.cat"), ORKS).unwrap();

        let second = service(cache.path()).run(catalogs.path()).unwrap();
        assert_eq!(second.plan, ImportPlan::Incremental);

        let names: Vec<String> = cached_units(cache.path()).into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Intercessor Squad", "Boyz"]);
    }

    #[test]
    fn test_reimport_is_idempotent() {
        let catalogs = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(catalogs.path().join("marines.cat"), MARINES).unwrap();

        service(cache.path()).run(catalogs.path()).unwrap();
        let first = cached_units(cache.path());
        service(cache.path()).run(catalogs.path()).unwrap();

        assert_eq!(cached_units(cache.path()), first);
    }

    #[test]
    fn test_version_change_forces_full_import() {
        let catalogs = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        fs::write(catalogs.path().join("orks.cat"), ORKS).unwrap();

        let cache = Cache::new(cache_dir.path()).unwrap();
        cache
            .save_stamp(
                CATALOG_STAMP,
                &ImportStamp {
                    format_version: CATALOG_FORMAT_VERSION + 1,
                    imported_at: Utc::now(),
                    documents: 1,
                },
            )
            .unwrap();
        let stale: Vec<UnitProfile> = parse_catalog(MARINES).unwrap();
        cache.save_parsed(UNITS_KEY, &stale).unwrap();

        let report = service(cache_dir.path()).run(catalogs.path()).unwrap();

        assert_eq!(report.plan, ImportPlan::Full);
        let names: Vec<String> = cached_units(cache_dir.path()).into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Boyz"]);
    }

    #[test]
    fn test_broken_document_does_not_stop_others() {
        let catalogs = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(catalogs.path().join("a_broken.cat"), "<catalogue id=\"x\"><oops></catalogue>").unwrap();
        fs::write(catalogs.path().join("orks.cat"), ORKS).unwrap();

        let report = service(cache.path()).run(catalogs.path()).unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.failed, vec![catalogs.path().join("a_broken.cat")]);
        assert_eq!(report.units, 1);
        assert!(!report.complete);
        assert_eq!(Cache::new(cache.path()).unwrap().load_stamp(CATALOG_STAMP).unwrap(), None);
    }

    #[test]
    fn test_failed_full_import_keeps_units_and_retries() {
        let catalogs = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        fs::write(catalogs.path().join("marines.cat"), MARINES).unwrap();
        fs::write(catalogs.path().join("orks.cat"), ORKS).unwrap();
        service(cache_dir.path()).run(catalogs.path()).unwrap();

        let cache = Cache::new(cache_dir.path()).unwrap();
        let stale = ImportStamp {
            format_version: CATALOG_FORMAT_VERSION - 1,
            imported_at: Utc::now(),
            documents: 2,
        };
        cache.save_stamp(CATALOG_STAMP, &stale).unwrap();
        fs::write(catalogs.path().join("marines.cat"), "<catalogue id=\"sm\"><oops></catalogue>").unwrap();

        let report = service(cache_dir.path()).run(catalogs.path()).unwrap();

        assert_eq!(report.plan, ImportPlan::Full);
        assert!(!report.complete);
        let names: Vec<String> = cached_units(cache_dir.path()).into_iter().map(|u| u.name).collect();
        assert_eq!(names, vec!["Intercessor Squad", "Boyz"]);
        assert_eq!(cache.load_stamp(CATALOG_STAMP).unwrap(), Some(stale));

        fs::write(catalogs.path().join("marines.cat"), MARINES).unwrap();
        let retry = service(cache_dir.path()).run(catalogs.path()).unwrap();

        assert_eq!(retry.plan, ImportPlan::Full);
        assert!(retry.complete);
        let stamp = cache.load_stamp(CATALOG_STAMP).unwrap().unwrap();
        assert_eq!(stamp.format_version, CATALOG_FORMAT_VERSION);
    }

    #[test]
    fn test_empty_directory_is_an_error() {
        let catalogs = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();

        assert!(service(cache.path()).run(catalogs.path()).is_err());
    }
}
