//! Exact nearest-neighbor search by Euclidean distance.
//!
//! The index is the candidate slice itself, built per call, so results for one
//! scope can never include vectors from another.

use crate::error::{IndexError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position in the candidate list.
    pub index: usize,
    pub distance: f32,
}

/// Rank `candidates` by ascending L2 distance to `query` and keep the first `k`.
/// Equal distances keep input order.
///
/// # Errors
///
/// Returns [`IndexError::Dimension`] if any candidate's length differs from the
/// query's.
pub fn nearest<V: AsRef<[f32]>>(
    candidates: &[V],
    query: &[f32],
    k: usize,
) -> Result<Vec<Neighbor>> {
    if k == 0 || candidates.is_empty() {
        return Ok(Vec::new());
    }

    let mut ranked = Vec::with_capacity(candidates.len());
    for (index, candidate) in candidates.iter().enumerate() {
        let candidate = candidate.as_ref();
        if candidate.len() != query.len() {
            return Err(IndexError::Dimension {
                expected: query.len(),
                actual: candidate.len(),
            });
        }
        ranked.push(Neighbor {
            index,
            distance: l2_distance(candidate, query),
        });
    }

    // stable: ties keep input order
    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked.truncate(k);
    Ok(ranked)
}

#[must_use]
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
