// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filter edges: one costed, size-bounded conversion between two media types.

use crate::media::MediaTypeId;

/// Stable handle for a filter inside one [`FilterGraph`](crate::FilterGraph).
///
/// Handles are never reused; removing a filter leaves its slot empty.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FilterId(pub(crate) u32);

impl FilterId {
    /// Position of the filter in the graph arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Raw handle value (for diagnostics).
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// A conversion edge `source -> dest` run by an external program.
///
/// The program string is opaque here; the declaration loader has already
/// checked that it names something runnable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Input media type.
    pub source: MediaTypeId,
    /// Output media type.
    pub dest: MediaTypeId,
    /// Relative cost of running the program. Lower is preferred.
    pub cost: u32,
    /// Largest input, in bytes, the program accepts. `0` means unlimited.
    pub max_size: u64,
    /// Converter program to run.
    pub program: String,
}

impl Filter {
    /// True when an input of `size` bytes fits this filter's limit.
    ///
    /// A `size` of `0` means the caller does not know or care, so it always fits.
    pub fn accepts_size(&self, size: u64) -> bool {
        self.max_size == 0 || self.max_size >= size
    }
}
