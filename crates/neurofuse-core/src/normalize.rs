//! Per-modality standardization
//!
//! Each modality matrix is z-scored on its own before fusion so that neither
//! modality dominates the joint decomposition by scale alone.

use ndarray::{Array2, ArrayViewMut, Dimension};
use serde::{Deserialize, Serialize};

/// Axis along which mean and standard deviation are computed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormAxis {
    /// One mean and std over every entry of the matrix
    #[default]
    Global,
    /// Per column (each feature across subjects)
    Features,
    /// Per row (each subject across its features)
    Subjects,
}

/// Standardize `matrix` to zero mean and unit variance along `axis`.
///
/// Uses the population standard deviation. A lane with zero or non-finite
/// spread normalizes to all zeros, and any other non-finite result is set to
/// 0. The input is not modified.
pub fn normalize(matrix: &Array2<f64>, axis: NormAxis) -> Array2<f64> {
    let mut out = matrix.clone();
    match axis {
        NormAxis::Global => standardize(out.view_mut()),
        NormAxis::Features => out.columns_mut().into_iter().for_each(standardize),
        NormAxis::Subjects => out.rows_mut().into_iter().for_each(standardize),
    }
    out
}

fn standardize<D: Dimension>(mut values: ArrayViewMut<'_, f64, D>) {
    let Some(mean) = values.mean() else {
        return;
    };
    let std = values.std(0.0);
    // A constant lane can leave `mean` one ulp off its value while `std` is 0
    if std == 0.0 || !std.is_finite() {
        values.fill(0.0);
        return;
    }
    values.mapv_inplace(|x| {
        let z = (x - mean) / std;
        if z.is_finite() {
            z
        } else {
            0.0
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_constant_matrix_normalizes_to_zero() {
        let m = Array2::from_elem((3, 4), 5.0);
        for axis in [NormAxis::Global, NormAxis::Features, NormAxis::Subjects] {
            let z = normalize(&m, axis);
            assert!(z.iter().all(|&v| v == 0.0), "axis {axis:?} gave {z:?}");
        }
    }

    #[test]
    fn test_inexact_constant_normalizes_to_zero() {
        for v in [0.1, 0.3, 0.7, 1.1, 0.45] {
            let m = Array2::from_elem((3, 7), v);
            for axis in [NormAxis::Global, NormAxis::Features, NormAxis::Subjects] {
                let z = normalize(&m, axis);
                assert!(z.iter().all(|&x| x == 0.0), "value {v}, axis {axis:?} gave {z:?}");
            }
        }
    }

    #[test]
    fn test_constant_column_among_varying_ones() {
        let m = array![[0.1, 1.0], [0.1, 3.0], [0.1, 5.0]];
        let z = normalize(&m, NormAxis::Features);
        assert!(z.column(0).iter().all(|&x| x == 0.0));
        assert!(z.iter().all(|x| x.is_finite()));
        assert!((z[[2, 1]] - 1.5_f64.sqrt()).abs() < EPS);
    }

    #[test]
    fn test_non_finite_input_is_zeroed() {
        let m = array![[f64::INFINITY, 1.0], [2.0, 3.0]];
        let z = normalize(&m, NormAxis::Subjects);
        assert_eq!(z.row(0).to_vec(), vec![0.0, 0.0]);
        assert_eq!(z.row(1).to_vec(), vec![-1.0, 1.0]);
    }

    #[test]
    fn test_global_normalization() {
        let m = array![[1.0, 2.0], [3.0, 4.0]];
        let z = normalize(&m, NormAxis::Global);

        // mean 2.5, population std sqrt(1.25)
        let std = 1.25_f64.sqrt();
        let expected = array![[-1.5 / std, -0.5 / std], [0.5 / std, 1.5 / std]];
        for (a, b) in z.iter().zip(expected.iter()) {
            assert!((a - b).abs() < EPS);
        }
        assert!(z.mean().unwrap().abs() < EPS);
        assert!((z.std(0.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_feature_axis_standardizes_columns() {
        let m = array![[1.0, 10.0, 7.0], [3.0, 30.0, 7.0]];
        let z = normalize(&m, NormAxis::Features);
        assert_eq!(z, array![[-1.0, -1.0, 0.0], [1.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_subject_axis_standardizes_rows() {
        let m = array![[1.0, 3.0], [4.0, 4.0]];
        let z = normalize(&m, NormAxis::Subjects);
        assert_eq!(z, array![[-1.0, 1.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_input_untouched() {
        let m = array![[1.0, 2.0], [3.0, 4.0]];
        let copy = m.clone();
        let _ = normalize(&m, NormAxis::Global);
        assert_eq!(m, copy);
    }

    #[test]
    fn test_empty_matrix() {
        let m = Array2::<f64>::zeros((0, 3));
        assert_eq!(normalize(&m, NormAxis::Global).shape(), &[0, 3]);
    }
}
