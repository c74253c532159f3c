//! CSV loading for labelled and unlabelled game data
//!
//! Files are comma separated with a required header row. Quoted fields are
//! allowed and whitespace around cells is trimmed. Descriptor cells accept
//! `0`/`1`, `true`/`false`, `yes`/`no` or an empty cell (false).

use crate::error::{PredictorError, Result};
use crate::models::{canonical_column, GameInfo, GameRating, TITLE_COLUMN};
use crate::predictor::{DataSchema, FeatureExtractor};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Default fraction of rows held out when splitting a single file
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Shuffle seed for [`LabeledDataset::train_test_split`] when none is configured
pub const DEFAULT_SEED: u64 = 42;

/// Labelled rows loaded under a fixed schema
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    schema: DataSchema,
    rows: Vec<GameRating>,
}

impl LabeledDataset {
    pub fn new(schema: DataSchema, rows: Vec<GameRating>) -> Self {
        Self { schema, rows }
    }

    /// Load a training file, deriving the schema from its header
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PredictorError::io(path, e))?;
        Self::from_reader(file, path, None)
    }

    /// Load a file that must provide every column of `schema`
    pub fn from_csv_with_schema(path: impl AsRef<Path>, schema: &DataSchema) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PredictorError::io(path, e))?;
        Self::from_reader(file, path, Some(schema))
    }

    /// Parse CSV from any reader. `source` is only used in error messages.
    pub fn from_reader<R: Read>(
        reader: R,
        source: &Path,
        schema: Option<&DataSchema>,
    ) -> Result<Self> {
        let mut csv_reader = csv_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| csv_error(source, e))?
            .iter()
            .map(|h| canonical_column(h).to_string())
            .collect();

        let schema = match schema {
            Some(schema) => {
                for column in schema
                    .feature_columns
                    .iter()
                    .chain(std::iter::once(&schema.label_column))
                {
                    if !headers.iter().any(|h| h == column) {
                        return Err(PredictorError::Schema(format!(
                            "{} is missing column '{}'",
                            source.display(),
                            column
                        )));
                    }
                }
                schema.clone()
            }
            None => DataSchema::from_header(headers.iter().map(String::as_str))?,
        };

        let label_index = headers
            .iter()
            .position(|h| *h == schema.label_column)
            .ok_or_else(|| {
                PredictorError::Schema(format!("missing label column '{}'", schema.label_column))
            })?;

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| csv_error(source, e))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let game = parse_game(&headers, &record, source, line)?;

            let label = record.get(label_index).unwrap_or("").trim();
            if label.is_empty() {
                return Err(PredictorError::InvalidLabel {
                    label: label.to_string(),
                    line,
                });
            }

            rows.push(GameRating {
                game,
                esrb_rating: label.to_string(),
            });
        }

        info!(
            path = %source.display(),
            rows = rows.len(),
            features = schema.num_features(),
            "Loaded labelled dataset"
        );

        Ok(Self { schema, rows })
    }

    pub fn schema(&self) -> &DataSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[GameRating] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Labels in row order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.esrb_rating.as_str())
    }

    /// Distinct labels in order of first appearance
    pub fn classes(&self) -> Vec<String> {
        let mut classes: Vec<String> = Vec::new();
        for label in self.labels() {
            if !classes.iter().any(|c| c == label) {
                classes.push(label.to_string());
            }
        }
        classes
    }

    /// Feature matrix in schema column order
    pub fn features(&self) -> Result<Array2<f64>> {
        let extractor = FeatureExtractor::new(&self.schema)?;
        Ok(extractor.extract_batch(self.rows.iter().map(|r| &r.game)))
    }

    /// Shuffle with a fixed seed and split off `test_fraction` of the rows.
    ///
    /// Returns `(train, test)`. Both halves keep at least one row when the
    /// dataset has two or more rows.
    pub fn train_test_split(&self, test_fraction: f64, seed: u64) -> (Self, Self) {
        let mut rows = self.rows.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        rows.shuffle(&mut rng);

        let fraction = test_fraction.clamp(0.0, 1.0);
        let mut test_len = (rows.len() as f64 * fraction).round() as usize;
        if rows.len() >= 2 {
            test_len = test_len.clamp(1, rows.len() - 1);
        }
        let train_rows = rows.split_off(test_len);

        debug!(
            train = train_rows.len(),
            test = rows.len(),
            "Split dataset"
        );

        (
            Self::new(self.schema.clone(), train_rows),
            Self::new(self.schema.clone(), rows),
        )
    }
}

/// Load unlabelled games from a CSV file. A label column, if present, is ignored.
pub fn load_games(path: impl AsRef<Path>) -> Result<Vec<GameInfo>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PredictorError::io(path, e))?;
    read_games(file, path)
}

/// Parse unlabelled games from any reader
pub fn read_games<R: Read>(reader: R, source: &Path) -> Result<Vec<GameInfo>> {
    let mut csv_reader = csv_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(|e| csv_error(source, e))?
        .iter()
        .map(|h| canonical_column(h).to_string())
        .collect();

    let mut games = Vec::new();
    for record in csv_reader.records() {
        let record = record.map_err(|e| csv_error(source, e))?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        games.push(parse_game(&headers, &record, source, line)?);
    }
    Ok(games)
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn csv_error(source: &Path, err: csv::Error) -> PredictorError {
    PredictorError::Csv {
        path: source.to_path_buf(),
        message: err.to_string(),
    }
}

fn parse_game(
    headers: &[String],
    record: &csv::StringRecord,
    source: &Path,
    line: u64,
) -> Result<GameInfo> {
    let mut game = GameInfo::default();
    for (column, cell) in headers.iter().zip(record.iter()) {
        if column == TITLE_COLUMN {
            game.title = cell.to_string();
            continue;
        }
        if game.descriptor(column).is_none() {
            continue;
        }
        let value = parse_flag(cell).ok_or_else(|| PredictorError::Csv {
            path: source.to_path_buf(),
            message: format!("line {}: invalid value '{}' for column '{}'", line, cell, column),
        })?;
        game.set_descriptor(column, value);
    }
    Ok(game)
}

/// Parse a descriptor cell
pub fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" => Some(false),
        "1" | "true" | "yes" | "y" => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
title,console,violence,blood,strong_janguage,esrb_rating
\"Quiet Farm, Deluxe\",0,0,0,0,E
Space Brawl,1,1,0,0,T
Grim Harvest,0,1,1,1,M
Pixel Quest,1,0,0,0,E
";

    fn load(text: &str) -> Result<LabeledDataset> {
        LabeledDataset::from_reader(text.as_bytes(), Path::new("sample.csv"), None)
    }

    #[test]
    fn test_load_derives_schema_from_header() {
        let dataset = load(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(
            dataset.schema().feature_columns,
            vec!["violence", "blood", "strong_language"]
        );
        assert_eq!(dataset.rows()[0].game.title, "Quiet Farm, Deluxe");
        assert!(dataset.rows()[2].game.strong_language);
    }

    #[test]
    fn test_classes_in_first_appearance_order() {
        let dataset = load(SAMPLE).unwrap();
        assert_eq!(dataset.classes(), vec!["E", "T", "M"]);
    }

    #[test]
    fn test_features_matrix() {
        let dataset = load(SAMPLE).unwrap();
        let x = dataset.features().unwrap();
        assert_eq!(x.dim(), (4, 3));
        assert_eq!(x.row(2).to_vec(), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_empty_label_rejected() {
        let err = load("title,violence,esrb_rating\nx,1,\n").unwrap_err();
        assert!(matches!(err, PredictorError::InvalidLabel { line: 2, .. }));
    }

    #[test]
    fn test_bad_flag_rejected() {
        let err = load("title,violence,esrb_rating\nx,maybe,T\n").unwrap_err();
        assert!(matches!(err, PredictorError::Csv { .. }));
    }

    #[test]
    fn test_schema_enforced_on_validation_file() {
        let schema = load(SAMPLE).unwrap().schema().clone();
        let err = LabeledDataset::from_reader(
            "title,violence,esrb_rating\nx,1,T\n".as_bytes(),
            Path::new("validation.csv"),
            Some(&schema),
        )
        .unwrap_err();
        assert!(matches!(err, PredictorError::Schema(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = LabeledDataset::from_csv("/nonexistent/ESRB.csv").unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_train_test_split_is_deterministic() {
        let dataset = load(SAMPLE).unwrap();
        let (train_a, test_a) = dataset.train_test_split(0.25, 7);
        let (train_b, test_b) = dataset.train_test_split(0.25, 7);
        assert_eq!(train_a.len(), 3);
        assert_eq!(test_a.len(), 1);
        assert_eq!(train_a.rows(), train_b.rows());
        assert_eq!(test_a.rows(), test_b.rows());
    }

    #[test]
    fn test_read_games_ignores_label() {
        let games = read_games(SAMPLE.as_bytes(), Path::new("games.csv")).unwrap();
        assert_eq!(games.len(), 4);
        assert!(games[1].violence);
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("2"), None);
    }
}
