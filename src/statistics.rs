use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::record::{ColumnInference, Record, Value, ValueKey, infer_columns};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub average: String, // two decimals, e.g. "27.50"
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub unique: usize,
    pub most_common: Value,
    pub most_common_count: usize,
}

/// Summary metrics of a whole dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_records: usize,
    pub total_columns: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
    pub numeric: Vec<NumericSummary>,
    pub categorical: Vec<CategoricalSummary>,
}

impl Statistics {
    /// Returns `None` for an empty dataset.
    pub fn compute(records: &[Record], inference: ColumnInference) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let columns = infer_columns(records, inference);

        let numeric_names: Vec<&str> = columns
            .iter()
            .filter(|c| c.kind.is_numeric())
            .map(|c| c.name.as_str())
            .collect();
        let categorical_names: Vec<&str> = columns
            .iter()
            .filter(|c| c.kind.is_categorical())
            .map(|c| c.name.as_str())
            .collect();

        let numeric = numeric_names
            .iter()
            .filter_map(|name| Self::numeric_summary(records, name))
            .collect();
        let categorical = categorical_names
            .iter()
            .filter_map(|name| Self::categorical_summary(records, name))
            .collect();

        let stats = Statistics {
            total_records: records.len(),
            total_columns: columns.len(),
            numeric_columns: numeric_names.len(),
            categorical_columns: categorical_names.len(),
            numeric,
            categorical,
        };
        trace!(
            "Statistics: {} records, {} numeric, {} categorical",
            stats.total_records, stats.numeric_columns, stats.categorical_columns
        );
        Some(stats)
    }

    // Only finite numbers take part, nulls and text in a numeric column are skipped.
    fn numeric_summary(records: &[Record], name: &str) -> Option<NumericSummary> {
        let values: Vec<f64> = records
            .iter()
            .filter_map(|r| r.value(name).as_number())
            .collect();
        if values.is_empty() {
            return None;
        }

        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(NumericSummary {
            column: name.to_string(),
            average: fixed_2(sum / values.len() as f64),
            min,
            max,
        })
    }

    fn categorical_summary(records: &[Record], name: &str) -> Option<CategoricalSummary> {
        // Insertion ordered counter: ties on the count go to the value seen first.
        let mut positions: HashMap<ValueKey, usize> = HashMap::new();
        let mut counts: Vec<(&Value, usize)> = Vec::new();
        for record in records.iter() {
            let value = record.value(name);
            match positions.get(&value.key()) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    positions.insert(value.key(), counts.len());
                    counts.push((value, 1));
                }
            }
        }

        let mut best: Option<(&Value, usize)> = None;
        for &(value, count) in counts.iter() {
            if best.is_none_or(|(_, c)| count > c) {
                best = Some((value, count));
            }
        }

        best.map(|(value, count)| CategoricalSummary {
            column: name.to_string(),
            unique: counts.len(),
            most_common: value.clone(),
            most_common_count: count,
        })
    }

    #[cfg(test)]
    pub fn numeric_for(&self, column: &str) -> Option<&NumericSummary> {
        self.numeric.iter().find(|s| s.column == column)
    }

    #[cfg(test)]
    pub fn categorical_for(&self, column: &str) -> Option<&CategoricalSummary> {
        self.categorical.iter().find(|s| s.column == column)
    }
}

/// Two decimal places with ties rounded away from zero. Exact ties at the
/// third decimal are odd multiples of 1/8, everything else formats as is.
fn fixed_2(x: f64) -> String {
    if (x * 8.0).fract() == 0.0 && (x * 4.0).fract() != 0.0 {
        return format!("{:.2}", (x * 100.0).round() / 100.0);
    }
    format!("{x:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Vec<Record> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn empty_dataset_has_no_statistics() {
        assert_eq!(Statistics::compute(&[], ColumnInference::FirstRecord), None);
    }

    #[test]
    fn two_people() {
        let records = parse(r#"[{"name":"Al","age":30},{"name":"Bo","age":25}]"#);
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();

        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.total_columns, 2);
        assert_eq!(stats.numeric_columns, 1);
        assert_eq!(stats.categorical_columns, 1);
        assert_eq!(
            stats.numeric_for("age"),
            Some(&NumericSummary {
                column: "age".into(),
                average: "27.50".into(),
                min: 25.0,
                max: 30.0,
            })
        );
        assert_eq!(stats.categorical_for("name").map(|c| c.unique), Some(2));
    }

    #[test]
    fn average_ties_round_away_from_zero() {
        for (json, expected) in [
            (r#"[{"v":0},{"v":0.25}]"#, "0.13"),
            (r#"[{"v":27},{"v":27.25}]"#, "27.13"),
            (r#"[{"v":1},{"v":1.25}]"#, "1.13"),
            (r#"[{"v":-1},{"v":-1.25}]"#, "-1.13"),
            (r#"[{"v":1},{"v":2}]"#, "1.50"),
        ] {
            let stats = Statistics::compute(&parse(json), ColumnInference::FirstRecord).unwrap();
            assert_eq!(stats.numeric_for("v").unwrap().average, expected, "{json}");
        }
    }

    #[test]
    fn near_ties_keep_their_decimal_value() {
        // 2.675 is stored slightly below the tie
        assert_eq!(fixed_2(2.675), "2.67");
        assert_eq!(fixed_2(0.375), "0.38");
        assert_eq!(fixed_2(0.25), "0.25");
        assert_eq!(fixed_2(1e20), "100000000000000000000.00");
    }

    #[test]
    fn most_common_tie_goes_to_first_seen() {
        let records = parse(r#"[{"c":"b"},{"c":"a"},{"c":"b"},{"c":"a"}]"#);
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        let c = stats.categorical_for("c").unwrap();
        assert_eq!(c.most_common, Value::Text("b".into()));
        assert_eq!(c.most_common_count, 2);
        assert_eq!(c.unique, 2);
    }

    #[test]
    fn most_common_prefers_higher_count() {
        let records = parse(r#"[{"c":"x"},{"c":"y"},{"c":"y"}]"#);
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        let c = stats.categorical_for("c").unwrap();
        assert_eq!(c.most_common, Value::Text("y".into()));
        assert_eq!(c.most_common_count, 2);
    }

    #[test]
    fn invalid_numbers_are_skipped() {
        let records = parse(
            r#"[{"price":10},{"price":null},{"price":"free"},{"price":4.5},{"other":1}]"#,
        );
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        let price = stats.numeric_for("price").unwrap();
        assert_eq!(price.average, "7.25");
        assert_eq!(price.min, 4.5);
        assert_eq!(price.max, 10.0);
        assert_eq!(stats.total_records, 5);
    }

    #[test]
    fn numeric_column_without_valid_values_has_no_summary() {
        let records = vec![
            Record::new().with("a", Value::Number(f64::NAN)).with("b", Value::Text("x".into())),
            Record::new().with("a", Value::Null).with("b", Value::Text("y".into())),
        ];
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        assert_eq!(stats.numeric_columns, 1);
        assert_eq!(stats.numeric_for("a"), None);
        assert!(stats.numeric.is_empty());
        assert_eq!(stats.categorical.len(), 1);
    }

    #[test]
    fn average_lies_between_min_and_max() {
        let records = parse(
            r#"[{"v":-3.25},{"v":17},{"v":0},{"v":1e3},{"v":42.125},{"v":-7}]"#,
        );
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        let v = stats.numeric_for("v").unwrap();
        let avg: f64 = v.average.parse().unwrap();
        assert!(v.min <= avg && avg <= v.max);
        assert_eq!(v.min, -7.0);
        assert_eq!(v.max, 1000.0);
    }

    #[test]
    fn typed_values_are_not_coerced() {
        let records = parse(r#"[{"flag":true},{"flag":"true"},{"flag":true}]"#);
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        let flag = stats.categorical_for("flag").unwrap();
        assert_eq!(flag.unique, 2);
        assert_eq!(flag.most_common, Value::Bool(true));
        assert_eq!(flag.most_common_count, 2);
    }

    #[test]
    fn null_first_value_excludes_column() {
        let records = parse(r#"[{"a":null,"b":"x"},{"a":5,"b":"y"}]"#);
        let stats = Statistics::compute(&records, ColumnInference::FirstRecord).unwrap();
        assert_eq!(stats.total_columns, 2);
        assert_eq!(stats.numeric_columns, 0);
        assert_eq!(stats.categorical_columns, 1);

        let stats = Statistics::compute(&records, ColumnInference::FullScan).unwrap();
        assert_eq!(stats.numeric_columns, 1);
        assert_eq!(stats.numeric_for("a").unwrap().average, "5.00");
    }
}
