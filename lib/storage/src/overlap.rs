//! Keyword overlap matrices
//!
//! Entry `(i, j)` counts the keywords courses `i` and `j` share, after
//! lowercasing and stemming. The diagonal holds each course's own keyword
//! count. The weighted variant sums the inverse document frequency of each
//! shared keyword instead, so rare keywords count for more.

use ahash::AHashMap;
use courserec_core::{Catalog, CsrMatrix, Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// On-disk triplet form of an overlap matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlapFile {
    pub size: usize,
    pub entries: Vec<(usize, usize, f32)>,
}

/// Count shared keywords for every pair of courses
pub fn build_overlap(catalog: &Catalog) -> CsrMatrix {
    let matrix = build_with(catalog, |_| 1.0);
    info!(
        "Built keyword overlap for {} courses ({} entries)",
        matrix.size(),
        matrix.nnz()
    );
    matrix
}

/// Sum `ln((1 + n) / (1 + df)) + 1` over the keywords each pair shares,
/// where `df` is the number of courses carrying the keyword
pub fn build_weighted_overlap(catalog: &Catalog) -> CsrMatrix {
    let n = catalog.len() as f32;
    let matrix = build_with(catalog, |df| ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0);
    info!(
        "Built idf-weighted keyword overlap for {} courses ({} entries)",
        matrix.size(),
        matrix.nnz()
    );
    matrix
}

/// Accumulate `weight(df)` for every keyword a pair of courses shares
fn build_with(catalog: &Catalog, weight: impl Fn(usize) -> f32 + Sync) -> CsrMatrix {
    let keyword_sets: Vec<_> = catalog.iter().map(|c| c.keyword_set()).collect();

    // keyword -> courses carrying it
    let mut postings: AHashMap<&str, Vec<u32>> = AHashMap::new();
    for (i, set) in keyword_sets.iter().enumerate() {
        for keyword in set {
            postings.entry(keyword.as_str()).or_default().push(i as u32);
        }
    }

    let rows: Vec<Vec<(u32, f32)>> = keyword_sets
        .par_iter()
        .map(|set| {
            let mut sums: AHashMap<u32, f32> = AHashMap::new();
            for keyword in set {
                if let Some(courses) = postings.get(keyword.as_str()) {
                    let w = weight(courses.len());
                    for &j in courses {
                        *sums.entry(j).or_insert(0.0) += w;
                    }
                }
            }
            let mut row: Vec<(u32, f32)> = sums.into_iter().collect();
            row.sort_unstable_by_key(|(j, _)| *j);
            row
        })
        .collect();

    CsrMatrix::from_rows(rows)
}

pub fn load_overlap<P: AsRef<Path>>(path: P) -> Result<CsrMatrix> {
    let path = path.as_ref();
    let file: OverlapFile = serde_json::from_reader(BufReader::new(File::open(path)?))
        .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
    let matrix = CsrMatrix::from_triplets(file.size, file.entries)?;
    info!("Loaded overlap matrix {} ({} entries)", path.display(), matrix.nnz());
    Ok(matrix)
}

pub fn save_overlap<P: AsRef<Path>>(path: P, matrix: &CsrMatrix) -> Result<()> {
    let entries = (0..matrix.size())
        .filter_map(|i| matrix.row(i).map(|row| (i, row)))
        .flat_map(|(i, row)| row.iter().map(move |(j, v)| (i, j, v)))
        .collect();
    let file = OverlapFile {
        size: matrix.size(),
        entries,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, &file)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use courserec_core::{CourseRecord, DuplicatePolicy};
    use tempfile::TempDir;

    fn catalog() -> Catalog {
        let with_keywords = |code: &str, keywords: &[&str]| {
            let mut r = CourseRecord::new(code, code);
            r.keywords = keywords.iter().map(|k| k.to_string()).collect();
            r
        };
        Catalog::from_records(
            vec![
                with_keywords("A", &["Graphs", "logic", "proofs"]),
                with_keywords("B", &["graphs ", "algorithms"]),
                with_keywords("C", &["poetry"]),
                with_keywords("D", &["LOGIC", "graphs", "proofs", "sets"]),
            ],
            DuplicatePolicy::FirstWins,
        )
        .unwrap()
    }

    #[test]
    fn test_build_counts_shared_keywords() {
        let m = build_overlap(&catalog());
        assert_eq!(m.size(), 4);
        assert_eq!(m.get(0, 0), 3.0);
        assert_eq!(m.get(0, 1), 1.0);
        assert_eq!(m.get(0, 2), 0.0);
        assert_eq!(m.get(0, 3), 3.0);
        assert_eq!(m.get(3, 0), 3.0);
        assert_eq!(m.get(1, 3), 1.0);
        assert_eq!(m.row(2).unwrap().nnz(), 1);
    }

    #[test]
    fn test_inflected_keywords_are_shared() {
        let with_keywords = |code: &str, keywords: &[&str]| {
            let mut r = CourseRecord::new(code, code);
            r.keywords = keywords.iter().map(|k| k.to_string()).collect();
            r
        };
        let catalog = Catalog::from_records(
            vec![
                with_keywords("A", &["graph", "Proof", "neural network"]),
                with_keywords("B", &["Graphs", "proofs", "Neural Networks"]),
            ],
            DuplicatePolicy::FirstWins,
        )
        .unwrap();

        assert_eq!(build_overlap(&catalog).get(0, 1), 3.0);
    }

    #[test]
    fn test_weighted_overlap_favors_rare_keywords() {
        let m = build_weighted_overlap(&catalog());
        // "graphs" is on three of four courses, "logic" and "proofs" on two
        let common = (5.0f32 / 4.0).ln() + 1.0;
        let rare = (5.0f32 / 3.0).ln() + 1.0;
        assert!((m.get(0, 1) - common).abs() < 1e-5);
        assert!((m.get(0, 3) - (common + 2.0 * rare)).abs() < 1e-5);
        assert_eq!(m.get(0, 2), 0.0);
        // a keyword unique to C outweighs one shared by three courses
        assert!(m.get(2, 2) > m.get(0, 1));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overlap.json");
        let built = build_overlap(&catalog());

        save_overlap(&path, &built).unwrap();
        assert_eq!(load_overlap(&path).unwrap(), built);
    }

    #[test]
    fn test_load_rejects_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("overlap.json");
        std::fs::write(&path, r#"{"size": 2, "entries": [[0, 1, 2.0], [3, 0, 1.0]]}"#).unwrap();
        assert!(matches!(load_overlap(&path), Err(Error::ShapeMismatch { .. })));
    }
}
