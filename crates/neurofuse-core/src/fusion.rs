//! Modality fusion
//!
//! Joins the normalized FA and LFP cohort matrices side by side. Rows stay
//! subjects; FA columns come first, LFP columns after.

use ndarray::{concatenate, s, Array2, ArrayView2, Axis};

use crate::error::{FusionError, FusionResult};

/// Concatenate `fa` and `lfp` column-wise.
///
/// # Errors
///
/// [`FusionError::RowMismatch`] when the matrices hold different numbers of
/// subjects.
pub fn fuse(fa: &Array2<f64>, lfp: &Array2<f64>) -> FusionResult<Array2<f64>> {
    let mismatch = FusionError::RowMismatch { fa_rows: fa.nrows(), lfp_rows: lfp.nrows() };
    if fa.nrows() != lfp.nrows() {
        return Err(mismatch);
    }
    concatenate(Axis(1), &[fa.view(), lfp.view()]).map_err(|_| mismatch)
}

/// Fused cohort matrix that remembers where the FA block ends.
#[derive(Clone, Debug, PartialEq)]
pub struct FusedMatrix {
    data: Array2<f64>,
    fa_features: usize,
}

impl FusedMatrix {
    /// Fuse `fa` and `lfp`, keeping the column boundary.
    ///
    /// # Errors
    ///
    /// See [`fuse`].
    pub fn new(fa: &Array2<f64>, lfp: &Array2<f64>) -> FusionResult<Self> {
        Ok(Self { data: fuse(fa, lfp)?, fa_features: fa.ncols() })
    }

    /// Full subjects × features matrix.
    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Number of subjects (rows).
    #[must_use]
    pub fn n_subjects(&self) -> usize {
        self.data.nrows()
    }

    /// Number of FA columns.
    #[must_use]
    pub fn fa_features(&self) -> usize {
        self.fa_features
    }

    /// Number of LFP columns.
    #[must_use]
    pub fn lfp_features(&self) -> usize {
        self.data.ncols() - self.fa_features
    }

    /// FA block.
    #[must_use]
    pub fn fa_block(&self) -> ArrayView2<'_, f64> {
        self.data.slice(s![.., ..self.fa_features])
    }

    /// LFP block.
    #[must_use]
    pub fn lfp_block(&self) -> ArrayView2<'_, f64> {
        self.data.slice(s![.., self.fa_features..])
    }

    /// Take the underlying matrix.
    #[must_use]
    pub fn into_inner(self) -> Array2<f64> {
        self.data
    }
}
