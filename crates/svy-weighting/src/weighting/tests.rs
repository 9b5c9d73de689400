//! Tests for weighting jobs

use approx::assert_abs_diff_eq;

use super::*;
use crate::error::{ConfigurationError, WeightingError};
use crate::population::{PopulationTable, StratumEntry, StratumTable};
use crate::raking::{AGE, AREA, EDU, SEX};
use svy_core::data::{Category, DataError, DataFrameBuilder};

fn small_frame() -> DataFrame {
    DataFrameBuilder::new()
        .with_column("SEX", Series::int(vec![0, 1, 0, 0]))
        .unwrap()
        .with_column("AGE", Series::int(vec![1, 1, 1, 2]))
        .unwrap()
        .with_column("AREA", Series::int(vec![3, 3, 3, 1]))
        .unwrap()
        .build()
        .unwrap()
}

/// 200 respondents, 65% SEX=0, AGE spread evenly
fn survey_frame() -> DataFrame {
    let sex: Vec<i64> = (0..200).map(|i| if i < 130 { 0 } else { 1 }).collect();
    let age: Vec<i64> = (0..200).map(|i| i % 3).collect();
    DataFrameBuilder::new()
        .with_column("SEX", Series::int(sex))
        .unwrap()
        .with_column("AGE", Series::int(age))
        .unwrap()
        .build()
        .unwrap()
}

fn strata() -> StratumTable {
    StratumTable::new([
        ("013", StratumEntry { group: 1, ratio: 0.5 }),
        ("113", StratumEntry { group: 1, ratio: 0.5 }),
        ("021", StratumEntry { group: 2, ratio: 0.5 }),
    ])
    .unwrap()
}

fn population() -> Population {
    Population::new()
        .with_control(PopulationTable::new(SEX, [(0, 0.5), (1, 0.5)]).unwrap())
        .unwrap()
        .with_control(PopulationTable::new(AGE, [(0, 0.2), (1, 0.3), (2, 0.5)]).unwrap())
        .unwrap()
        .with_strata(strata())
}

fn sex_age() -> WeightingConfig {
    WeightingConfig::default().with_controls([SEX, AGE])
}

#[test]
fn test_post_stratification_sets_weight_and_strata() {
    let weighting = Weighting::new(small_frame(), population());
    let df = weighting.post_stratification().unwrap();

    assert_eq!(df.ncols(), 5);
    let strata = df.column("strata").unwrap().codes("strata").unwrap();
    assert_eq!(strata, vec![1, 1, 1, 2]);

    let weights = df.column("weight").unwrap().to_float().unwrap();
    assert_abs_diff_eq!(weights[0], 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(weights[3], 2.0, epsilon = 1e-12);

    // the frame held by the job is untouched
    assert_eq!(weighting.data(), &small_frame());
}

#[test]
fn test_post_stratification_needs_stratum_table() {
    let population = Population::new()
        .with_control(PopulationTable::new(SEX, [(0, 0.5), (1, 0.5)]).unwrap())
        .unwrap();
    let err = Weighting::new(small_frame(), population)
        .post_stratification()
        .unwrap_err();
    assert_eq!(
        err,
        WeightingError::from(ConfigurationError::MissingReference("strata".to_string()))
    );
}

#[test]
fn test_post_stratification_reports_unmatched_row() {
    let df = small_frame()
        .with_column("weight", Series::float(vec![1.0; 4]))
        .unwrap();
    let mut df = df;
    df.set_column("AREA", Series::int(vec![3, 3, 9, 1])).unwrap();

    let err = Weighting::new(df, population()).post_stratification().unwrap_err();
    assert_eq!(
        err,
        WeightingError::from(ConfigurationError::UnmatchedStratum {
            row: 2,
            key: "019".to_string(),
        })
    );
}

#[test]
fn test_raking_from_uniform_weights() {
    let weighting = Weighting::new(survey_frame(), population()).with_config(sex_age());
    let (df, outcome) = weighting.raking().unwrap();

    assert!(outcome.is_converged());
    assert!(outcome.passes() >= 2);

    let weights = df.column("weight").unwrap().to_float().unwrap();
    assert_eq!(weights.len(), 200);
    assert!(weights.iter().all(|&w| w > 0.0));
    assert!(!weighting.data().has_column("weight"));
}

#[test]
fn test_raking_starts_from_existing_weights() {
    let balanced = population();
    let weighting = Weighting::new(survey_frame(), balanced.clone()).with_config(sex_age());
    let (raked, _) = weighting.raking().unwrap();

    // a second run over its own output has nothing left to do
    let (again, outcome) = Weighting::new(raked.clone(), balanced)
        .with_config(sex_age())
        .raking()
        .unwrap();
    assert!(outcome.is_converged());
    assert_eq!(outcome.passes(), 0);
    assert_eq!(again, raked);
}

#[test]
fn test_raking_custom_columns_and_sentinel() {
    let mut sex: Vec<Option<Category>> = (0..40)
        .map(|i| Some(Category::new(if i < 30 { 0 } else { 1 })))
        .collect();
    sex[0] = None;
    let df = DataFrameBuilder::new()
        .with_categories("SEX", &sex, 9)
        .unwrap()
        .build()
        .unwrap();
    let config = WeightingConfig::default()
        .with_controls([SEX])
        .with_sentinel(9)
        .with_weight_column("w");

    let (df, outcome) = Weighting::new(df, population()).with_config(config).raking().unwrap();

    assert!(outcome.is_converged());
    let weights = df.column("w").unwrap().to_float().unwrap();
    // the respondent with no answer keeps the starting weight
    assert_eq!(weights[0], 1.0);
    assert_abs_diff_eq!(weights[1], 19.5 / 29.0, epsilon = 1e-12);
}

/// 240 respondents over all four default controls, every tenth EDU answer missing
fn full_survey_frame() -> DataFrame {
    let n = 240;
    let sex: Vec<i64> = (0..n).map(|i| if i % 5 < 3 { 0 } else { 1 }).collect();
    let age: Vec<i64> = (0..n).map(|i| i % 3).collect();
    let edu: Vec<i64> = (0..n)
        .map(|i| if i % 10 == 7 { MISSING_CODE } else { (i / 2) % 4 })
        .collect();
    let area: Vec<i64> = (0..n).map(|i| (i / 3) % 2).collect();
    DataFrameBuilder::new()
        .with_column("SEX", Series::int(sex))
        .unwrap()
        .with_column("AGE", Series::int(age))
        .unwrap()
        .with_column("EDU", Series::int(edu))
        .unwrap()
        .with_column("AREA", Series::int(area))
        .unwrap()
        .build()
        .unwrap()
}

#[test]
fn test_raking_default_controls_with_missing_answers() {
    let population = Population::new()
        .with_control(PopulationTable::new(SEX, [(0, 0.5), (1, 0.5)]).unwrap())
        .unwrap()
        .with_control(PopulationTable::new(AGE, [(0, 0.3), (1, 0.3), (2, 0.4)]).unwrap())
        .unwrap()
        .with_control(
            PopulationTable::new(EDU, [(0, 0.1), (1, 0.2), (2, 0.3), (3, 0.4)]).unwrap(),
        )
        .unwrap()
        .with_control(PopulationTable::new(AREA, [(0, 0.45), (1, 0.55)]).unwrap())
        .unwrap();

    let weighting = Weighting::new(full_survey_frame(), population);
    assert_eq!(weighting.config().controls, vec![SEX, AGE, EDU, AREA]);
    let (df, outcome) = weighting.raking().unwrap();

    assert!(outcome.is_converged());
    assert!(outcome.passes() >= 1);
    let report = outcome.report();
    let checked: Vec<_> = report.p_values.keys().map(String::as_str).collect();
    assert_eq!(checked, vec![SEX, AGE, EDU, AREA]);
    assert!(report.p_values.values().all(|&p| p > 0.05));
    // SEX is 60/40 against 50/50, so it is the first one adjusted
    assert_eq!(report.adjusted[0], SEX);

    let weights = df.column("weight").unwrap().to_float().unwrap();
    assert!(weights.iter().all(|&w| w.is_finite() && w > 0.0));
    // no EDU answer, yet the SEX adjustment still moved the weight
    assert!((weights[7] - 1.0).abs() > 1e-6);
    let edu = df.column("EDU").unwrap().codes("EDU").unwrap();
    assert_eq!(edu[7], MISSING_CODE);
}

#[test]
fn test_raking_errors() {
    // no reference for EDU
    let weighting = Weighting::new(survey_frame(), population());
    assert!(matches!(
        weighting.raking(),
        Err(WeightingError::Configuration(ConfigurationError::MissingReference(_)))
    ));

    // non-positive starting weight
    let df = survey_frame()
        .with_column("weight", Series::float(vec![0.0; 200]))
        .unwrap();
    let err = Weighting::new(df, population())
        .with_config(sex_age())
        .raking()
        .unwrap_err();
    assert!(matches!(
        err,
        WeightingError::Data(DataError::InvalidValue { row: 0, .. })
    ));
}

#[test]
fn test_config_deserialize_with_defaults() {
    let json = r#"{"controls": ["SEX", "AREA"], "raking": {"max_passes": 10}}"#;
    let config: WeightingConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.controls, vec!["SEX", "AREA"]);
    assert_eq!(config.raking.max_passes, 10);
    assert_eq!(config.weight_column, "weight");
    assert_eq!(config.sentinel, -1);
    assert_eq!(config.stratum_fields, StratumAssigner::default());
}
