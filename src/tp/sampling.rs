//! Adaptive pressure subsampling for the hybrid profile.

/// Select layer indices where `reference` changes by at least `threshold`
/// from the last selected layer.
///
/// A layer is also selected once `max_run` layers have passed without a
/// selection. The first and last layers are always selected, so consecutive
/// indices never differ by more than `max_run`.
pub fn sample_grid(reference: &[f64], threshold: f64, max_run: usize) -> Vec<usize> {
    let n = reference.len();
    if n < 2 {
        return (0..n).collect();
    }

    let mut index = vec![0];
    let mut last = 0;
    for i in 1..n - 1 {
        if (reference[i] - reference[last]).abs() >= threshold || i - last >= max_run {
            index.push(i);
            last = i;
        }
    }
    index.push(n - 1);
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_reference_forces_runs() {
        let index = sample_grid(&[1.; 25], 0.05, 10);
        assert_eq!(index, vec![0, 10, 20, 24]);
    }

    #[test]
    fn steep_reference_keeps_every_layer() {
        let reference: Vec<f64> = (0..6).map(|i| f64::from(i) * 0.1).collect();
        assert_eq!(sample_grid(&reference, 0.05, 10), vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn threshold_measured_from_last_selection() {
        // Changes of 0.03 per layer cross 0.05 every second layer
        let reference: Vec<f64> = (0..7).map(|i| 1. - f64::from(i) * 0.03).collect();
        assert_eq!(sample_grid(&reference, 0.05, 10), vec![0, 2, 4, 6]);
    }

    #[test]
    fn tiny_grids() {
        assert!(sample_grid(&[], 0.05, 10).is_empty());
        assert_eq!(sample_grid(&[1.], 0.05, 10), vec![0]);
        assert_eq!(sample_grid(&[1., 1.], 0.05, 10), vec![0, 1]);
    }
}
