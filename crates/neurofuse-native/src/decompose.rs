//! Joint decomposition of the fused matrix
//!
//! The decomposition itself is delegated to `linfa-ica`'s FastICA. The
//! pipeline hands over the transposed fused matrix, so features are the
//! samples and subjects are the mixed signals, and gets back one column of
//! source activations per component (features × components).

use linfa::dataset::DatasetBase;
use linfa::traits::{Fit, Predict};
use linfa_ica::fast_ica::{FastIca, GFunc};
use ndarray::{Array2, ArrayView2};
use tracing::{debug, warn};

use crate::error::{DecompositionError, DecompositionResult};

/// A matrix decomposition: `(samples × signals, k) -> samples × k`.
pub trait Decomposer {
    /// Extract `n_components` components from `data`.
    ///
    /// # Errors
    ///
    /// [`DecompositionError`] if `n_components` is zero or the algorithm fails.
    fn decompose(&self, data: ArrayView2<'_, f64>, n_components: usize) -> DecompositionResult<Array2<f64>>;
}

/// FastICA with the log-cosh contrast function.
///
/// A component count above `min(samples, signals)` is lowered to that bound
/// with a warning.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FastIcaDecomposer {
    /// Seed for the unmixing matrix initialization
    pub seed: usize,
    /// Log-cosh contrast parameter
    pub alpha: f64,
    /// Iteration limit
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
}

impl Default for FastIcaDecomposer {
    fn default() -> Self {
        Self { seed: 42, alpha: 1.0, max_iter: 200, tol: 1e-4 }
    }
}

impl FastIcaDecomposer {
    /// FastICA with default parameters and the given seed.
    #[must_use]
    pub fn with_seed(seed: usize) -> Self {
        Self { seed, ..Self::default() }
    }
}

impl Decomposer for FastIcaDecomposer {
    fn decompose(&self, data: ArrayView2<'_, f64>, n_components: usize) -> DecompositionResult<Array2<f64>> {
        let (rows, cols) = data.dim();
        let available = rows.min(cols);
        if n_components == 0 || available == 0 {
            return Err(DecompositionError::InvalidComponentCount { requested: n_components, rows, cols });
        }
        let n_components = if n_components > available {
            warn!(
                requested = n_components,
                used = available,
                rows,
                cols,
                "Too many components requested, using min(samples, signals)"
            );
            available
        } else {
            n_components
        };

        debug!(rows, cols, n_components, "Fitting FastICA");
        let ica = FastIca::<f64>::params()
            .ncomponents(n_components)
            .gfunc(GFunc::Logcosh(self.alpha))
            .max_iter(self.max_iter)
            .tol(self.tol)
            .random_state(self.seed)
            .fit(&DatasetBase::from(data))
            .map_err(|e| DecompositionError::Fit(e.to_string()))?;

        Ok(ica.predict(&data.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two independent sources (sine and square wave) mixed into three signals.
    fn mixed_signals(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 3), |(i, j)| {
            let t = i as f64 * 8.0 / n as f64;
            let sine = (2.0 * t).sin();
            let square = if (4.0 * t).sin() > 0.0 { 1.0 } else { -1.0 };
            let noise = ((i * 7 + j * 13) % 17) as f64 / 170.0;
            match j {
                0 => sine + square + noise,
                1 => 0.5 * sine + 2.0 * square + noise,
                _ => 1.5 * sine - 0.7 * square + noise,
            }
        })
    }

    #[test]
    fn test_fast_ica_output_shape_and_finite() {
        let data = mixed_signals(500);
        let sources = FastIcaDecomposer::default().decompose(data.view(), 2).unwrap();

        assert_eq!(sources.dim(), (500, 2));
        assert!(sources.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_fast_ica_is_deterministic_for_a_seed() {
        let data = mixed_signals(300);
        let ica = FastIcaDecomposer::with_seed(7);
        let a = ica.decompose(data.view(), 2).unwrap();
        let b = ica.decompose(data.view(), 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_components_rejected() {
        let data = mixed_signals(50);
        assert!(matches!(
            FastIcaDecomposer::default().decompose(data.view(), 0),
            Err(DecompositionError::InvalidComponentCount { requested: 0, rows: 50, cols: 3 })
        ));

        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            FastIcaDecomposer::default().decompose(empty.view(), 2),
            Err(DecompositionError::InvalidComponentCount { requested: 2, rows: 0, cols: 3 })
        ));
    }

    #[test]
    fn test_component_count_clamped_to_signals() {
        // Fewer signals (subjects) than the default 11 components
        let data = mixed_signals(300);
        let sources = FastIcaDecomposer::default().decompose(data.view(), 11).unwrap();
        assert_eq!(sources.dim(), (300, 3));
        assert!(sources.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_large_seed() {
        let data = mixed_signals(200);
        let sources = FastIcaDecomposer::with_seed(usize::MAX).decompose(data.view(), 2).unwrap();
        assert_eq!(sources.dim(), (200, 2));
    }
}
