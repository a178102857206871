//! Known / unknown split of the variable indices.

use crate::error::{QuadError, QuadResult};

/// Where a variable lives after partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Position in the caller's `known` list (and therefore the row of `Y`).
    Known(usize),
    /// Position in the ascending `unknown` list (and the solve space).
    Unknown(usize),
}

/// Partition of `[0, n)` into fixed and free variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablePartition {
    known: Vec<usize>,
    unknown: Vec<usize>,
    slots: Vec<Slot>,
}

impl VariablePartition {
    /// Split `0..n` given the fixed indices.
    ///
    /// `known` keeps the caller's order; `unknown` is ascending.
    pub fn new(n: usize, known: &[usize]) -> QuadResult<Self> {
        let mut slots: Vec<Option<Slot>> = vec![None; n];
        for (pos, &index) in known.iter().enumerate() {
            if index >= n {
                return Err(QuadError::KnownOutOfRange { index, n });
            }
            if slots[index].is_some() {
                return Err(QuadError::DuplicateKnown(index));
            }
            slots[index] = Some(Slot::Known(pos));
        }

        let mut unknown = Vec::with_capacity(n - known.len());
        let mut resolved = Vec::with_capacity(n);
        for (index, slot) in slots.into_iter().enumerate() {
            let slot = match slot {
                Some(slot) => slot,
                None => {
                    unknown.push(index);
                    Slot::Unknown(unknown.len() - 1)
                }
            };
            resolved.push(slot);
        }

        Ok(Self {
            known: known.to_vec(),
            unknown,
            slots: resolved,
        })
    }

    pub fn n(&self) -> usize {
        self.slots.len()
    }

    pub fn known(&self) -> &[usize] {
        &self.known
    }

    pub fn unknown(&self) -> &[usize] {
        &self.unknown
    }

    pub fn num_known(&self) -> usize {
        self.known.len()
    }

    pub fn num_unknown(&self) -> usize {
        self.unknown.len()
    }

    /// Slot of a global variable index. Panics if `index >= n`.
    pub fn slot(&self, index: usize) -> Slot {
        self.slots[index]
    }
}
