//! Tests for the rescale step

use approx::assert_abs_diff_eq;
use ndarray::array;
use proptest::prelude::*;

use super::*;
use crate::error::WeightingError;

fn cats(codes: &[i64]) -> Vec<Option<Category>> {
    codes.iter().map(|&c| Category::from_code(c, -1)).collect()
}

fn even_sex() -> PopulationTable {
    PopulationTable::new("SEX", [(0, 0.5), (1, 0.5)]).unwrap()
}

#[test]
fn test_balanced_sample_is_left_unchanged() {
    let mut store = WeightStore::uniform(4)
        .with_field("SEX", cats(&[0, 1, 0, 1]))
        .unwrap();
    let outcome = rescale(&mut store, &even_sex()).unwrap();

    assert_eq!(outcome.factors.values().copied().collect::<Vec<_>>(), vec![1.0, 1.0]);
    assert_eq!(store.weights(), &array![1.0, 1.0, 1.0, 1.0]);
}

#[test]
fn test_three_to_one_sample() {
    let mut store = WeightStore::uniform(4)
        .with_field("SEX", cats(&[0, 0, 0, 1]))
        .unwrap();
    rescale(&mut store, &even_sex()).unwrap();

    let w = store.weights();
    for i in 0..3 {
        assert_abs_diff_eq!(w[i], 0.5 * 4.0 / 3.0, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(w[3], 2.0, epsilon = 1e-12);

    let freq = FrequencyTable::estimate(&store, "SEX", Some(&even_sex())).unwrap();
    assert_abs_diff_eq!(freq.proportion(Category::new(0)), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(freq.proportion(Category::new(1)), 0.5, epsilon = 1e-12);
}

#[test]
fn test_missing_records_are_untouched() {
    let mut store = WeightStore::with_weights(array![1.0, 1.0, 3.0, 1.0])
        .unwrap()
        .with_field("SEX", cats(&[0, 0, -1, 1]))
        .unwrap();
    let outcome = rescale(&mut store, &even_sex()).unwrap();

    assert_eq!(store.weights()[2], 3.0);
    assert_abs_diff_eq!(outcome.mass_before, 3.0);
    assert_abs_diff_eq!(outcome.mass_after, 3.0, epsilon = 1e-12);
}

#[test]
fn test_unobserved_population_category_is_rejected() {
    let mut store = WeightStore::uniform(3)
        .with_field("SEX", cats(&[0, 0, 0]))
        .unwrap();
    let before = store.clone();
    let err = rescale(&mut store, &even_sex()).unwrap_err();

    assert!(matches!(
        err,
        WeightingError::Configuration(ConfigurationError::UnobservedCategory { .. })
    ));
    assert_eq!(store, before);
}

fn sample() -> impl Strategy<Value = (Vec<i64>, Vec<f64>)> {
    (2usize..60).prop_flat_map(|n| {
        (
            prop::collection::vec(-1i64..3, n),
            prop::collection::vec(0.1f64..10.0, n),
        )
    })
}

proptest! {
    #[test]
    fn prop_rescale_invariants((codes, weights) in sample()) {
        let observed: std::collections::HashSet<i64> =
            codes.iter().copied().filter(|&c| c >= 0).collect();
        prop_assume!(!observed.is_empty());

        // a reference over exactly the observed categories
        let share = 1.0 / observed.len() as f64;
        let mut observed: Vec<i64> = observed.into_iter().collect();
        observed.sort_unstable();
        let reference =
            PopulationTable::new("AGE", observed.iter().map(|&c| (c, share))).unwrap();

        let mut store = WeightStore::with_weights(weights.into())
            .unwrap()
            .with_field("AGE", cats(&codes))
            .unwrap();
        let before = store.clone();
        let outcome = rescale(&mut store, &reference).unwrap();

        // positivity
        prop_assert!(store.weights().iter().all(|&w| w > 0.0 && w.is_finite()));

        // mass conservation within the valid subpopulation
        prop_assert!((outcome.mass_before - outcome.mass_after).abs() < 1e-9 * outcome.mass_before.max(1.0));

        // exact match right after the step
        let freq = FrequencyTable::estimate(&store, "AGE", Some(&reference)).unwrap();
        for (category, proportion) in reference.iter() {
            prop_assert!((freq.proportion(category) - proportion).abs() < 1e-9);
        }

        // missing records untouched
        for (i, code) in codes.iter().enumerate() {
            if *code < 0 {
                prop_assert_eq!(store.weights()[i], before.weights()[i]);
            }
        }
    }
}
