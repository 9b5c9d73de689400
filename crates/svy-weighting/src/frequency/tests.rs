//! Tests for frequency estimation

use approx::assert_abs_diff_eq;
use ndarray::array;

use super::*;
use crate::error::WeightingError;

fn cats(codes: &[i64]) -> Vec<Option<Category>> {
    codes.iter().map(|&c| Category::from_code(c, -1)).collect()
}

fn store() -> WeightStore {
    WeightStore::with_weights(array![1.0, 2.0, 3.0, 4.0, 5.0])
        .unwrap()
        .with_field("AGE", cats(&[2, 1, 2, -1, 1]))
        .unwrap()
}

#[test]
fn test_counts_and_proportions_skip_missing() {
    let table = FrequencyTable::estimate(&store(), "AGE", None).unwrap();

    assert_eq!(table.len(), 2);
    assert_abs_diff_eq!(table.total, 11.0);
    assert_abs_diff_eq!(table.count(Category::new(1)), 7.0);
    assert_abs_diff_eq!(table.count(Category::new(2)), 4.0);
    assert_abs_diff_eq!(table.proportion(Category::new(1)), 7.0 / 11.0);
    // ascending code order without a reference
    assert_eq!(
        table.iter().map(|(c, _)| c.code()).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[test]
fn test_reference_categories_listed_even_if_unobserved() {
    let reference = PopulationTable::new("AGE", [(2, 0.4), (1, 0.4), (3, 0.2)]).unwrap();
    let table = FrequencyTable::estimate(&store(), "AGE", Some(&reference)).unwrap();

    assert_eq!(
        table.iter().map(|(c, _)| c.code()).collect::<Vec<_>>(),
        vec![2, 1, 3]
    );
    assert_eq!(table.count(Category::new(3)), 0.0);
    assert_eq!(table.proportion(Category::new(3)), 0.0);
}

#[test]
fn test_unmapped_category_is_configuration_error() {
    let reference = PopulationTable::new("AGE", [(1, 1.0)]).unwrap();
    let err = FrequencyTable::estimate(&store(), "AGE", Some(&reference)).unwrap_err();
    assert_eq!(
        err,
        WeightingError::from(ConfigurationError::UnmappedCategory {
            variable: "AGE".to_string(),
            category: Category::new(2),
        })
    );
}

#[test]
fn test_all_missing_gives_zero_total() {
    let store = WeightStore::uniform(2)
        .with_field("EDU", vec![None, None])
        .unwrap();
    let table = FrequencyTable::estimate(&store, "EDU", None).unwrap();
    assert!(table.is_empty());
    assert_eq!(table.total, 0.0);
}

#[test]
fn test_unknown_field() {
    assert!(FrequencyTable::estimate(&store(), "AREA", None).is_err());
}
