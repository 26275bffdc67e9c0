use crate::course::CourseId;
use crate::sparse::{CsrMatrix, SparseRow};
use crate::{Error, Result};
use tracing::{info, warn};

/// Row-major embedding matrix, one row per course id.
/// Row norms are computed once at construction.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingMatrix {
    dim: usize,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Wrap a flat buffer of `rows * dim` values
    pub fn new(dim: usize, data: Vec<f32>) -> Result<Self> {
        if dim == 0 {
            if data.is_empty() {
                return Ok(Self::default());
            }
            return Err(Error::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        if data.len() % dim != 0 {
            return Err(Error::ShapeMismatch {
                what: "embedding buffer",
                expected: (data.len() / dim + 1) * dim,
                actual: data.len(),
            });
        }

        let norms = data.chunks_exact(dim).map(crate::simd::norm_simd).collect();
        Ok(Self { dim, data, norms })
    }

    /// Build from nested rows, all of which must share one dimension
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map(Vec::len).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(Error::InvalidDimension {
                    expected: dim,
                    actual: row.len(),
                });
            }
            data.extend(row);
        }
        Self::new(dim, data)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.norms.len()
    }

    #[inline]
    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.rows() {
            return None;
        }
        Some(&self.data[i * self.dim..(i + 1) * self.dim])
    }

    #[inline]
    pub fn norm(&self, i: usize) -> Option<f32> {
        self.norms.get(i).copied()
    }

    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    fn degenerate_count(&self) -> usize {
        self.norms.iter().filter(|n| **n <= f32::EPSILON).count()
    }
}

/// Per-course feature data, aligned with catalog ids.
///
/// Immutable after construction. Construction fails if either source does
/// not match the catalog size.
#[derive(Debug, Default)]
pub struct FeatureStore {
    embeddings: EmbeddingMatrix,
    overlap: CsrMatrix,
    /// Keyword overlap weighted by inverse document frequency
    weighted_overlap: Option<CsrMatrix>,
}

impl FeatureStore {
    pub fn new(catalog_len: usize, embeddings: EmbeddingMatrix, overlap: CsrMatrix) -> Result<Self> {
        if embeddings.rows() != catalog_len {
            return Err(Error::ShapeMismatch {
                what: "embeddings",
                expected: catalog_len,
                actual: embeddings.rows(),
            });
        }
        if overlap.size() != catalog_len {
            return Err(Error::ShapeMismatch {
                what: "overlap matrix",
                expected: catalog_len,
                actual: overlap.size(),
            });
        }

        let degenerate = embeddings.degenerate_count();
        if degenerate > 0 {
            warn!(
                "{} of {} embeddings have zero norm and will never be recommended",
                degenerate,
                embeddings.rows()
            );
        }
        info!(
            "Feature store ready: {} courses, dim {}, {} overlap entries",
            catalog_len,
            embeddings.dim(),
            overlap.nnz()
        );

        Ok(Self {
            embeddings,
            overlap,
            weighted_overlap: None,
        })
    }

    /// Attach the idf-weighted overlap matrix; it must match the catalog size
    pub fn with_weighted_overlap(mut self, matrix: CsrMatrix) -> Result<Self> {
        if matrix.size() != self.overlap.size() {
            return Err(Error::ShapeMismatch {
                what: "weighted overlap matrix",
                expected: self.overlap.size(),
                actual: matrix.size(),
            });
        }
        self.weighted_overlap = Some(matrix);
        Ok(self)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.embeddings.rows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.embeddings.dim()
    }

    #[inline]
    pub fn embedding_of(&self, id: CourseId) -> Option<&[f32]> {
        self.embeddings.row(id.index())
    }

    #[inline]
    pub fn norm_of(&self, id: CourseId) -> Option<f32> {
        self.embeddings.norm(id.index())
    }

    /// Whether the embedding exists and has non-zero length
    #[inline]
    pub fn is_usable(&self, id: CourseId) -> bool {
        self.norm_of(id).map(|n| n > f32::EPSILON).unwrap_or(false)
    }

    /// Cosine similarity between two stored embeddings using cached norms
    pub fn cosine(&self, a: CourseId, b: CourseId) -> Option<f32> {
        let (va, vb) = (self.embedding_of(a)?, self.embedding_of(b)?);
        let (na, nb) = (self.norm_of(a)?, self.norm_of(b)?);
        if na <= f32::EPSILON || nb <= f32::EPSILON {
            return None;
        }
        Some(crate::simd::dot_product_simd(va, vb) / (na * nb))
    }

    pub fn overlap_row(&self, id: CourseId) -> Option<SparseRow<'_>> {
        self.overlap.row(id.index())
    }

    pub fn overlap(&self) -> &CsrMatrix {
        &self.overlap
    }

    pub fn weighted_overlap(&self) -> Option<&CsrMatrix> {
        self.weighted_overlap.as_ref()
    }

    pub fn embeddings(&self) -> &EmbeddingMatrix {
        &self.embeddings
    }
}
