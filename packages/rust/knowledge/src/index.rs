//! Exact nearest-neighbor index over fixed-dimension vectors.

use std::collections::VecDeque;

use seoscribe_shared::{DocumentId, Result, SeoscribeError};

/// Best match returned by [`FlatL2Index::search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: DocumentId,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// Brute-force squared-L2 index with a capacity bound.
///
/// Slots are kept in insertion order. When full, the oldest slot is evicted
/// to make room, so the newest vector is always present.
#[derive(Debug, Clone)]
pub struct FlatL2Index {
    dimension: usize,
    capacity: usize,
    slots: VecDeque<(DocumentId, Vec<f32>)>,
}

impl FlatL2Index {
    /// `capacity` is clamped to at least one slot.
    pub fn new(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            capacity: capacity.max(1),
            slots: VecDeque::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a vector, returning the ids of any slots evicted to make room.
    pub fn add(&mut self, id: DocumentId, vector: Vec<f32>) -> Result<Vec<DocumentId>> {
        self.check_dimension(&vector)?;

        let mut evicted = Vec::new();
        while self.slots.len() >= self.capacity {
            if let Some((old_id, _)) = self.slots.pop_front() {
                evicted.push(old_id);
            }
        }
        self.slots.push_back((id, vector));
        Ok(evicted)
    }

    /// Nearest slot to `query`. Ties resolve to the earliest inserted slot.
    pub fn search(&self, query: &[f32]) -> Result<Option<Neighbor>> {
        self.check_dimension(query)?;

        let mut best: Option<Neighbor> = None;
        for (id, vector) in &self.slots {
            let distance = squared_l2(query, vector);
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(Neighbor { id: *id, distance });
            }
        }
        Ok(best)
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(SeoscribeError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
