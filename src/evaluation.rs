//! Comparison of a solved layout against ground truth.
use crate::error::{LayoutError, Result};
use crate::image::{ImageF32, ImageView, LabelMap};

/// Fraction of pixels on which two label maps agree.
pub fn agreement_fraction(a: &LabelMap, b: &LabelMap) -> Result<f64> {
    if !a.same_size(b) {
        return Err(LayoutError::ShapeMismatch {
            what: "orientation map",
            expected: a.size(),
            found: b.size(),
        });
    }
    if a.data.is_empty() {
        return Ok(1.0);
    }
    let agree = a.data.iter().zip(&b.data).filter(|(x, y)| x == y).count();
    Ok(agree as f64 / a.data.len() as f64)
}

/// `1 - agreement` between a solved and a ground-truth orientation map.
pub fn labelling_error(estimated: &LabelMap, ground_truth: &LabelMap) -> Result<f64> {
    Ok(1.0 - agreement_fraction(estimated, ground_truth)?)
}

/// Relative depth error `|gt - est| / gt` per pixel. Pixels where either
/// depth is non-finite or the ground truth is not positive are set to NaN
/// and skipped by [`mean_error`].
pub fn depth_errors(ground_truth: &ImageF32, estimated: &ImageF32) -> Result<ImageF32> {
    if !ground_truth.same_size(estimated) {
        return Err(LayoutError::ShapeMismatch {
            what: "estimated depth",
            expected: ground_truth.size(),
            found: estimated.size(),
        });
    }
    let mut errors = ImageF32::new(ground_truth.w, ground_truth.h);
    for ((err, &gt), &est) in errors
        .data
        .iter_mut()
        .zip(&ground_truth.data)
        .zip(&estimated.data)
    {
        *err = if gt.is_finite() && est.is_finite() && gt > 0.0 {
            (gt - est).abs() / gt
        } else {
            f32::NAN
        };
    }
    Ok(errors)
}

/// Mean over the finite entries of an error map; `0` when there are none.
pub fn mean_error(errors: &ImageF32) -> f64 {
    let (sum, n) = errors
        .data
        .iter()
        .filter(|e| e.is_finite())
        .fold((0.0f64, 0usize), |(s, n), &e| (s + e as f64, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelling_error_counts_disagreeing_pixels() {
        let a = LabelMap::new(4, 1, 2);
        let mut b = a.clone();
        b.set(0, 0, 1);
        assert!((labelling_error(&a, &b).unwrap() - 0.25).abs() < 1e-12);
        assert!(agreement_fraction(&a, &LabelMap::new(2, 2, 2)).is_err());
    }

    #[test]
    fn depth_errors_skip_invalid_pixels() {
        let gt = ImageF32::from_vec(3, 1, vec![2.0, f32::INFINITY, 4.0]).unwrap();
        let est = ImageF32::from_vec(3, 1, vec![1.0, 1.0, 5.0]).unwrap();
        let errors = depth_errors(&gt, &est).unwrap();
        assert_eq!(errors.get(0, 0), 0.5);
        assert!(errors.get(1, 0).is_nan());
        assert!((mean_error(&errors) - 0.375).abs() < 1e-9);
    }
}
