// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by views and index mappings.

use thiserror::Error;

/// Error returned by view lookups and view construction.
///
/// Every variant signals a programming error on the caller's side; nothing is
/// clamped or retried internally.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum ViewError {
    /// A view index was outside `0..len`.
    #[error("view index {index} out of range for view of length {len}")]
    ViewIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The view length at the time of the call.
        len: usize,
    },
    /// A source index was outside `0..len`.
    #[error("source index {index} out of range for source of length {len}")]
    SourceIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The source length at the time of the call.
        len: usize,
    },
    /// The view was constructed from a source list that no longer exists.
    #[error("cannot build a view over a source list that has been dropped")]
    SourceDropped,
}

impl ViewError {
    /// Returns `true` for either out-of-range variant.
    #[must_use]
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            Self::ViewIndexOutOfRange { .. } | Self::SourceIndexOutOfRange { .. }
        )
    }
}
