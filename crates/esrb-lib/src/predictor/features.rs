//! Feature extraction for ML inference
//!
//! Maps a `GameInfo` onto the ordered feature columns recorded in a
//! `DataSchema`. The same extractor is used when building training matrices
//! and when running inference, so both sides always agree on column order.

use crate::error::{PredictorError, Result};
use crate::models::{canonical_column, GameInfo, DESCRIPTOR_COLUMNS, LABEL_COLUMN};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Input schema captured from the training data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSchema {
    /// Descriptor columns used as model inputs, in model input order
    pub feature_columns: Vec<String>,
    /// Name of the label column
    pub label_column: String,
}

impl DataSchema {
    /// Schema over every known descriptor
    pub fn full() -> Self {
        Self {
            feature_columns: DESCRIPTOR_COLUMNS.iter().map(|c| c.to_string()).collect(),
            label_column: LABEL_COLUMN.to_string(),
        }
    }

    /// Build a schema from a CSV header row.
    ///
    /// Descriptor columns are kept in header order; unknown columns are ignored.
    /// The label column must be present.
    pub fn from_header<'a>(headers: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut feature_columns: Vec<String> = Vec::new();
        let mut has_label = false;

        for header in headers {
            let column = canonical_column(header);
            if column == LABEL_COLUMN {
                has_label = true;
            } else if DESCRIPTOR_COLUMNS.contains(&column)
                && !feature_columns.iter().any(|c| c == column)
            {
                feature_columns.push(column.to_string());
            }
        }

        if !has_label {
            return Err(PredictorError::Schema(format!(
                "missing label column '{}'",
                LABEL_COLUMN
            )));
        }
        if feature_columns.is_empty() {
            return Err(PredictorError::Schema(
                "no content descriptor columns found".to_string(),
            ));
        }

        Ok(Self {
            feature_columns,
            label_column: LABEL_COLUMN.to_string(),
        })
    }

    pub fn num_features(&self) -> usize {
        self.feature_columns.len()
    }
}

/// Extracts model input vectors from content descriptor records
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    indices: Vec<usize>,
}

impl FeatureExtractor {
    /// Bind an extractor to a schema, failing on columns `GameInfo` cannot supply
    pub fn new(schema: &DataSchema) -> Result<Self> {
        let indices = schema
            .feature_columns
            .iter()
            .map(|column| {
                DESCRIPTOR_COLUMNS
                    .iter()
                    .position(|known| *known == canonical_column(column))
                    .ok_or_else(|| {
                        PredictorError::Schema(format!("unknown feature column '{}'", column))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { indices })
    }

    pub fn num_features(&self) -> usize {
        self.indices.len()
    }

    /// Feature vector for a single game
    pub fn extract(&self, game: &GameInfo) -> Vec<f64> {
        let flags = game.descriptors();
        self.indices
            .iter()
            .map(|&i| if flags[i] { 1.0 } else { 0.0 })
            .collect()
    }

    /// Feature matrix with one row per game
    pub fn extract_batch<'a>(&self, games: impl IntoIterator<Item = &'a GameInfo>) -> Array2<f64> {
        let mut data = Vec::new();
        let mut rows = 0;
        for game in games {
            data.extend(self.extract(game));
            rows += 1;
        }
        Array2::from_shape_vec((rows, self.num_features()), data)
            .unwrap_or_else(|_| Array2::zeros((0, self.num_features())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_from_header_keeps_header_order() {
        let schema =
            DataSchema::from_header(["title", "console", "violence", "blood", "esrb_rating"])
                .unwrap();
        assert_eq!(schema.feature_columns, vec!["violence", "blood"]);
        assert_eq!(schema.label_column, LABEL_COLUMN);
    }

    #[test]
    fn test_schema_canonicalizes_typo_column() {
        let schema = DataSchema::from_header(["strong_janguage", "esrb_rating"]).unwrap();
        assert_eq!(schema.feature_columns, vec!["strong_language"]);
    }

    #[test]
    fn test_schema_requires_label() {
        let err = DataSchema::from_header(["title", "violence"]).unwrap_err();
        assert!(matches!(err, PredictorError::Schema(_)));
    }

    #[test]
    fn test_schema_requires_features() {
        let err = DataSchema::from_header(["title", "esrb_rating"]).unwrap_err();
        assert!(matches!(err, PredictorError::Schema(_)));
    }

    #[test]
    fn test_extract_follows_schema_order() {
        let schema = DataSchema {
            feature_columns: vec!["violence".into(), "blood".into(), "nudity".into()],
            label_column: LABEL_COLUMN.into(),
        };
        let extractor = FeatureExtractor::new(&schema).unwrap();
        let game = GameInfo::new("x").with("blood").with("nudity");
        assert_eq!(extractor.extract(&game), vec![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_extract_batch_shape() {
        let extractor = FeatureExtractor::new(&DataSchema::full()).unwrap();
        let games = vec![GameInfo::new("a"), GameInfo::new("b").with("violence")];
        let matrix = extractor.extract_batch(&games);
        assert_eq!(matrix.dim(), (2, DESCRIPTOR_COLUMNS.len()));
        assert_eq!(matrix.row(1).sum(), 1.0);
    }

    #[test]
    fn test_unknown_schema_column_rejected() {
        let schema = DataSchema {
            feature_columns: vec!["console".into()],
            label_column: LABEL_COLUMN.into(),
        };
        assert!(FeatureExtractor::new(&schema).is_err());
    }
}
