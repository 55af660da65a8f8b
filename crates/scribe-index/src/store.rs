//! Flat inner-product vector index over L2-normalized rows.

use std::cmp::Ordering;

use uuid::Uuid;

use crate::error::{IndexError, Result};

/// Row id reported for rows whose score is not a finite number.
pub const SENTINEL_ROW: i64 = -1;

const MAGIC: &[u8; 8] = b"SCRBIDX1";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8 + 4 + 4 + 8 + 16;

/// Scale `vector` to unit length in place. Zero vectors are left untouched.
pub fn normalize_l2(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Exhaustive inner-product index. Row numbers are assigned in insertion order
/// and are the only link to the parallel metadata list.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dim: usize,
    rows: usize,
    data: Vec<f32>,
}

impl FlatIndex {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            rows: 0,
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append `vectors` in order, normalizing each.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DimensionMismatch` if any vector has the wrong
    /// length. Nothing is appended in that case.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dim) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: bad.len(),
            });
        }
        self.data.reserve(vectors.len() * self.dim);
        for vector in vectors {
            let start = self.data.len();
            self.data.extend_from_slice(vector);
            normalize_l2(&mut self.data[start..]);
        }
        self.rows += vectors.len();
        Ok(())
    }

    fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Top `min(k, len)` rows by inner product with the normalized `query`,
    /// best first. Equal scores keep the lower row id first.
    ///
    /// # Errors
    ///
    /// Returns `IndexError::DimensionMismatch` if `query` has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<(Vec<f32>, Vec<i64>)> {
        if query.len() != self.dim {
            return Err(IndexError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        let k = k.min(self.rows);
        if k == 0 {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut query = query.to_vec();
        normalize_l2(&mut query);

        let mut scored: Vec<(usize, f32)> = (0..self.rows)
            .map(|i| {
                let score = self.row(i).iter().zip(&query).map(|(a, b)| a * b).sum();
                (i, score)
            })
            .collect();

        // Finite scores first, descending; non-finite rows sink to the end.
        scored.sort_by(|(ia, sa), (ib, sb)| {
            match (sa.is_finite(), sb.is_finite()) {
                (true, true) => sb.partial_cmp(sa).unwrap_or(Ordering::Equal),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => Ordering::Equal,
            }
            .then(ia.cmp(ib))
        });
        scored.truncate(k);

        let scores = scored.iter().map(|(_, s)| *s).collect();
        let ids = scored
            .iter()
            .map(|(i, s)| {
                if s.is_finite() {
                    i64::try_from(*i).unwrap_or(SENTINEL_ROW)
                } else {
                    SENTINEL_ROW
                }
            })
            .collect();
        Ok((scores, ids))
    }

    /// Serialize the index stamped with `build_id`.
    #[must_use]
    pub fn encode(&self, build_id: Uuid) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        #[allow(clippy::cast_possible_truncation)]
        out.extend_from_slice(&(self.dim as u32).to_le_bytes());
        out.extend_from_slice(&(self.rows as u64).to_le_bytes());
        out.extend_from_slice(build_id.as_bytes());
        for v in &self.data {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Parse bytes produced by [`FlatIndex::encode`].
    ///
    /// # Errors
    ///
    /// Returns `IndexError::ArtifactCorrupt` on a bad magic, unknown version,
    /// or a length that disagrees with the header.
    pub fn decode(bytes: &[u8]) -> Result<(Self, Uuid)> {
        if bytes.len() < HEADER_LEN {
            return Err(IndexError::ArtifactCorrupt(format!(
                "index file too short: {} bytes",
                bytes.len()
            )));
        }
        let (header, body) = bytes.split_at(HEADER_LEN);
        if &header[..8] != MAGIC {
            return Err(IndexError::ArtifactCorrupt("bad index file magic".into()));
        }
        let version = u32::from_le_bytes(fixed(&header[8..12]));
        if version != FORMAT_VERSION {
            return Err(IndexError::ArtifactCorrupt(format!(
                "unsupported index format version {version}"
            )));
        }
        let dim = u32::from_le_bytes(fixed(&header[12..16])) as usize;
        let rows = usize::try_from(u64::from_le_bytes(fixed(&header[16..24])))
            .map_err(|_| IndexError::ArtifactCorrupt("row count overflows usize".into()))?;
        let build_id = Uuid::from_bytes(fixed(&header[24..40]));

        let expected = rows
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| IndexError::ArtifactCorrupt("index header overflows".into()))?;
        if body.len() != expected {
            return Err(IndexError::ArtifactCorrupt(format!(
                "index body is {} bytes, header declares {rows} rows of dimension {dim}",
                body.len()
            )));
        }

        let data = body
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes(fixed(b)))
            .collect();
        Ok((Self { dim, rows, data }, build_id))
    }
}

fn fixed<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
