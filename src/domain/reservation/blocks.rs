use crate::utils::content_range::ContentRange;
use thiserror::Error;

/// One chunk that has been staged against the blob store but not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedBlock {
    pub id: String,
    pub start: u64,
    /// Inclusive.
    pub end: u64,
    pub size: u64,
}

impl StagedBlock {
    pub fn new(id: impl Into<String>, range: &ContentRange) -> Self {
        StagedBlock {
            id: id.into(),
            start: range.start(),
            end: range.end(),
            size: range.size(),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("declared size {declared} does not match the {uploaded} bytes uploaded")]
pub struct SizeMismatch {
    pub declared: u64,
    pub uploaded: u64,
}

/// Returned when the block list is held by a commit in progress.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("a commit is already in progress")]
pub struct Sealed;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SealError {
    #[error(transparent)]
    Sealed(#[from] Sealed),

    #[error(transparent)]
    SizeMismatch(#[from] SizeMismatch),
}

/// The staged blocks of a single reservation, in arrival order.
///
/// Overlapping or duplicate ranges are accepted as-is; they only surface as a
/// size mismatch when the list is finalized. While sealed for a commit the list
/// accepts no new blocks.
#[derive(Debug, Default)]
pub struct BlockList {
    blocks: Vec<StagedBlock>,
    sealed: bool,
}

impl BlockList {
    pub fn append(&mut self, block: StagedBlock) -> Result<(), Sealed> {
        if self.sealed {
            return Err(Sealed);
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Orders the blocks for commit and seals the list. A size mismatch leaves
    /// it open.
    pub fn seal(&mut self, declared_size: u64) -> Result<Vec<String>, SealError> {
        if self.sealed {
            return Err(Sealed.into());
        }
        let ordered = self.finalize_order(declared_size)?;
        self.sealed = true;
        Ok(ordered)
    }

    pub fn unseal(&mut self) {
        self.sealed = false;
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.blocks.iter().map(|b| b.size).sum()
    }

    /// Returns the block ids ordered by start offset, provided the staged sizes
    /// add up to `declared_size`. The list itself is left untouched either way.
    pub fn finalize_order(&self, declared_size: u64) -> Result<Vec<String>, SizeMismatch> {
        let uploaded = self.total_size();
        if uploaded != declared_size {
            return Err(SizeMismatch {
                declared: declared_size,
                uploaded,
            });
        }

        let mut ordered: Vec<&StagedBlock> = self.blocks.iter().collect();
        ordered.sort_by_key(|b| b.start);
        Ok(ordered.into_iter().map(|b| b.id.clone()).collect())
    }
}
