use crate::domain::recommendation::{AllocationProfile, AssetClassWeight, Instrument};
use anyhow::ensure;

// Weights are rebalanced in integer tenths of a percent so the exact-sum-100
// invariant cannot drift through float rounding.
const TOTAL_TENTHS: i64 = 1000;

/// Rescale weights so they sum to exactly 100.0.
///
/// Each weight is scaled by `100/raw_sum` and rounded to one decimal; the
/// rounding residual is folded into the single largest weight (first
/// occurrence wins ties). Deterministic, idempotent, and non-negative for any
/// non-negative input with a positive sum.
pub fn normalize_to_100(weights: &[f64]) -> anyhow::Result<Vec<f64>> {
    ensure!(!weights.is_empty(), "cannot normalize an empty weight set");
    ensure!(
        weights.iter().all(|w| w.is_finite() && *w >= 0.0),
        "weights must be finite and non-negative"
    );
    let raw_sum: f64 = weights.iter().sum();
    ensure!(raw_sum > 0.0, "weight sum must be positive (got {raw_sum})");

    let mut tenths: Vec<i64> = weights
        .iter()
        .map(|w| (w * 100.0 / raw_sum * 10.0).round() as i64)
        .collect();

    let residual = TOTAL_TENTHS - tenths.iter().sum::<i64>();
    if residual != 0 {
        let largest = tenths
            .iter()
            .enumerate()
            .max_by(|(ai, av), (bi, bv)| av.cmp(bv).then(bi.cmp(ai)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        tenths[largest] += residual;
        ensure!(
            tenths[largest] >= 0,
            "rounding residual {residual} would drive a weight negative"
        );
    }

    Ok(tenths.into_iter().map(|t| t as f64 / 10.0).collect())
}

/// Normalize both weight sets of a profile independently.
pub fn normalize_profile(profile: &AllocationProfile) -> anyhow::Result<AllocationProfile> {
    let class_weights: Vec<f64> = profile
        .asset_classes
        .iter()
        .map(|c| c.weight_percent)
        .collect();
    let instrument_weights: Vec<f64> = profile
        .instruments
        .iter()
        .map(|i| i.weight_percent)
        .collect();

    let asset_classes = profile
        .asset_classes
        .iter()
        .zip(normalize_to_100(&class_weights)?)
        .map(|(c, weight_percent)| AssetClassWeight {
            asset_class: c.asset_class.clone(),
            weight_percent,
        })
        .collect();

    let instruments = profile
        .instruments
        .iter()
        .zip(normalize_to_100(&instrument_weights)?)
        .map(|(i, weight_percent)| Instrument {
            ticker: i.ticker.clone(),
            name: i.name.clone(),
            weight_percent,
            rationale: i.rationale.clone(),
        })
        .collect();

    Ok(AllocationProfile {
        profile: profile.profile,
        asset_classes,
        instruments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenths_sum(weights: &[f64]) -> i64 {
        weights.iter().map(|w| (w * 10.0).round() as i64).sum()
    }

    #[test]
    fn already_normalized_is_untouched() {
        let input = vec![50.0, 30.0, 20.0];
        let out = normalize_to_100(&input).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn sum_97_scales_and_rounds() {
        // 30/97, 30/97, 37/97 of 100, rounded to one decimal, residual to the
        // largest entry.
        let out = normalize_to_100(&[30.0, 30.0, 37.0]).unwrap();
        assert_eq!(out, vec![30.9, 30.9, 38.2]);
        assert_eq!(tenths_sum(&out), 1000);
    }

    #[test]
    fn residual_goes_to_first_largest_on_ties() {
        let out = normalize_to_100(&[25.0, 25.0, 25.0, 24.0]).unwrap();
        // Scaled: 25.3, 25.3, 25.3, 24.2 — one tenth over; the first of the
        // tied largest entries absorbs it.
        assert_eq!(out, vec![25.2, 25.3, 25.3, 24.2]);
        assert_eq!(tenths_sum(&out), 1000);
    }

    #[test]
    fn idempotent() {
        let once = normalize_to_100(&[30.0, 30.0, 37.0]).unwrap();
        let twice = normalize_to_100(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn output_sums_to_100_for_arbitrary_positive_inputs() {
        for input in [
            vec![1.0, 1.0, 1.0],
            vec![0.3, 0.3, 0.4],
            vec![99.0, 0.5, 0.5],
            vec![12.34, 56.78, 9.01, 3.21],
            vec![100.0],
        ] {
            let out = normalize_to_100(&input).unwrap();
            assert_eq!(tenths_sum(&out), 1000, "input {input:?}");
            assert!((out.iter().sum::<f64>() - 100.0).abs() < 1e-9);
            assert!(out.iter().all(|w| *w >= 0.0));
        }
    }

    #[test]
    fn zero_weights_are_kept_at_zero() {
        let out = normalize_to_100(&[60.0, 0.0, 40.0]).unwrap();
        assert_eq!(out, vec![60.0, 0.0, 40.0]);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(normalize_to_100(&[]).is_err());
        assert!(normalize_to_100(&[0.0, 0.0]).is_err());
        assert!(normalize_to_100(&[50.0, -1.0]).is_err());
        assert!(normalize_to_100(&[f64::NAN]).is_err());
    }
}
