//! Embedding files
//!
//! Two on-disk layouts are understood, picked by file extension:
//! - `.json`: an array of rows, `[[f32, ...], ...]`
//! - anything else: a bincode [`EmbeddingSnapshot`]

use courserec_core::{EmbeddingMatrix, Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Flat, row-major embedding dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSnapshot {
    pub dim: usize,
    pub rows: usize,
    pub data: Vec<f32>,
}

impl EmbeddingSnapshot {
    pub fn from_matrix(matrix: &EmbeddingMatrix) -> Self {
        Self {
            dim: matrix.dim(),
            rows: matrix.rows(),
            data: matrix.as_flat().to_vec(),
        }
    }

    pub fn into_matrix(self) -> Result<EmbeddingMatrix> {
        if self.dim * self.rows != self.data.len() {
            return Err(Error::ShapeMismatch {
                what: "embedding snapshot",
                expected: self.dim * self.rows,
                actual: self.data.len(),
            });
        }
        EmbeddingMatrix::new(self.dim, self.data)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn load_embeddings<P: AsRef<Path>>(path: P) -> Result<EmbeddingMatrix> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let matrix = if is_json(path) {
        let rows: Vec<Vec<f32>> = serde_json::from_reader(reader)
            .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
        EmbeddingMatrix::from_rows(rows)?
    } else {
        let snapshot: EmbeddingSnapshot = bincode::deserialize_from(reader)
            .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;
        snapshot.into_matrix()?
    };

    info!(
        "Loaded {} embeddings of dim {} from {}",
        matrix.rows(),
        matrix.dim(),
        path.display()
    );
    Ok(matrix)
}

pub fn save_embeddings<P: AsRef<Path>>(path: P, matrix: &EmbeddingMatrix) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    if is_json(path) {
        let rows: Vec<&[f32]> = (0..matrix.rows()).filter_map(|i| matrix.row(i)).collect();
        serde_json::to_writer(&mut writer, &rows)?;
    } else {
        bincode::serialize_into(&mut writer, &EmbeddingSnapshot::from_matrix(matrix))
            .map_err(|e| Error::Serialization(e.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(vec![vec![0.5, -1.0, 2.0], vec![0.0, 0.25, 1.5]]).unwrap()
    }

    #[test]
    fn test_bincode_and_json_agree() {
        let dir = TempDir::new().unwrap();
        let bin = dir.path().join("emb.bin");
        let json = dir.path().join("emb.json");

        save_embeddings(&bin, &sample()).unwrap();
        save_embeddings(&json, &sample()).unwrap();

        let from_bin = load_embeddings(&bin).unwrap();
        let from_json = load_embeddings(&json).unwrap();
        assert_eq!(from_bin.as_flat(), sample().as_flat());
        assert_eq!(from_json.as_flat(), from_bin.as_flat());
        assert_eq!(from_bin.dim(), 3);
    }

    #[test]
    fn test_inconsistent_snapshot_rejected() {
        let snapshot = EmbeddingSnapshot {
            dim: 4,
            rows: 2,
            data: vec![0.0; 6],
        };
        assert!(matches!(snapshot.into_matrix(), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_ragged_json_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ragged.json");
        std::fs::write(&path, "[[1.0, 2.0], [3.0]]").unwrap();
        assert!(matches!(load_embeddings(&path), Err(Error::InvalidDimension { .. })));
    }
}
