//! Catalog loading from per-faculty course files

use courserec_core::{Catalog, CourseRecord, DuplicatePolicy, Error, Result};
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Course files in `dir`, sorted by file name so ids are stable across runs
pub fn course_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(Error::Storage(format!(
            "no course files (*.json) found in {}",
            dir.display()
        )));
    }
    Ok(files)
}

/// Read one file holding a JSON array of course records
pub fn read_course_file<P: AsRef<Path>>(path: P) -> Result<Vec<CourseRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let records: Vec<CourseRecord> = serde_json::from_reader(reader)
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
    debug!("Read {} course records from {}", records.len(), path.display());
    Ok(records)
}

/// Build the catalog from every course file in `dir`.
///
/// Files are parsed in parallel but concatenated in file name order, so
/// catalog ids do not depend on scheduling.
pub fn load_catalog<P: AsRef<Path>>(dir: P, policy: DuplicatePolicy) -> Result<Catalog> {
    let files = course_files(&dir)?;
    let per_file: Vec<Vec<CourseRecord>> = files
        .par_iter()
        .map(|path| read_course_file(path))
        .collect::<Result<_>>()?;

    let total: usize = per_file.iter().map(Vec::len).sum();
    let catalog = Catalog::from_records(per_file.into_iter().flatten(), policy)?;
    info!(
        "Loaded {} courses from {} files ({} records)",
        catalog.len(),
        files.len(),
        total
    );
    Ok(catalog)
}
