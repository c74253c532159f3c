//! Core data models for the ESRB predictor
//!
//! `GameInfo` is the fixed content-descriptor record fed to the classifier.
//! Every descriptor is an independent flag; the CSV column name of a
//! descriptor is its snake_case field name, the JSON name is camelCase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the label column in training files
pub const LABEL_COLUMN: &str = "esrb_rating";

/// Name of the title column in training files
pub const TITLE_COLUMN: &str = "title";

macro_rules! content_descriptors {
    ($($field:ident),+ $(,)?) => {
        /// Content descriptors for a single game
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase", default)]
        pub struct GameInfo {
            pub title: String,
            $(pub $field: bool,)+
        }

        /// CSV column names of every content descriptor, in feature order
        pub const DESCRIPTOR_COLUMNS: &[&str] = &[$(stringify!($field)),+];

        impl GameInfo {
            /// Descriptor flags in `DESCRIPTOR_COLUMNS` order
            pub fn descriptors(&self) -> Vec<bool> {
                vec![$(self.$field),+]
            }

            /// Look up a descriptor by column name
            pub fn descriptor(&self, column: &str) -> Option<bool> {
                match canonical_column(column) {
                    $(stringify!($field) => Some(self.$field),)+
                    _ => None,
                }
            }

            /// Set a descriptor by column name. Returns false for unknown columns.
            pub fn set_descriptor(&mut self, column: &str, value: bool) -> bool {
                match canonical_column(column) {
                    $(stringify!($field) => {
                        self.$field = value;
                        true
                    })+
                    _ => false,
                }
            }
        }
    };
}

content_descriptors!(
    alcohol_reference,
    animated_blood,
    blood,
    blood_and_gore,
    cartoon_violence,
    crude_humor,
    drug_reference,
    fantasy_violence,
    intense_violence,
    language,
    lyrics,
    mature_humor,
    mild_blood,
    mild_cartoon_violence,
    mild_fantasy_violence,
    mild_language,
    mild_lyrics,
    mild_suggestive_themes,
    mild_violence,
    no_descriptors,
    nudity,
    partial_nudity,
    sexual_content,
    sexual_themes,
    simulated_gambling,
    strong_language,
    strong_sexual_content,
    suggestive_themes,
    use_of_alcohol,
    use_of_drugs_and_alcohol,
    violence,
);

/// Normalize a header cell to the descriptor column it refers to.
///
/// The public Kaggle dataset misspells `strong_language` as `strong_janguage`.
pub fn canonical_column(column: &str) -> &str {
    match column.trim() {
        "strong_janguage" => "strong_language",
        other => other,
    }
}

impl GameInfo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder-style descriptor setter, ignores unknown columns
    pub fn with(mut self, column: &str) -> Self {
        self.set_descriptor(column, true);
        self
    }

    /// Column names of all descriptors that are set
    pub fn active_descriptors(&self) -> Vec<&'static str> {
        DESCRIPTOR_COLUMNS
            .iter()
            .zip(self.descriptors())
            .filter_map(|(column, set)| set.then_some(*column))
            .collect()
    }
}

/// A labelled training row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRating {
    #[serde(flatten)]
    pub game: GameInfo,
    pub esrb_rating: String,
}

/// ESRB rating categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EsrbRating {
    #[serde(rename = "E")]
    Everyone,
    #[serde(rename = "E10+", alias = "ET")]
    EveryoneTenPlus,
    #[serde(rename = "T")]
    Teen,
    #[serde(rename = "M")]
    Mature,
}

impl EsrbRating {
    /// Canonical label
    pub fn label(&self) -> &'static str {
        match self {
            EsrbRating::Everyone => "E",
            EsrbRating::EveryoneTenPlus => "E10+",
            EsrbRating::Teen => "T",
            EsrbRating::Mature => "M",
        }
    }

    /// Returns true if `label` denotes this rating, accepting known aliases
    pub fn matches(&self, label: &str) -> bool {
        label.parse::<EsrbRating>().map(|r| r == *self).unwrap_or(false)
    }
}

impl fmt::Display for EsrbRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EsrbRating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "E" => Ok(EsrbRating::Everyone),
            "E10+" | "ET" | "E10" => Ok(EsrbRating::EveryoneTenPlus),
            "T" => Ok(EsrbRating::Teen),
            "M" => Ok(EsrbRating::Mature),
            other => Err(format!("Unknown ESRB rating '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_columns_match_fields() {
        let game = GameInfo::default();
        assert_eq!(game.descriptors().len(), DESCRIPTOR_COLUMNS.len());
        for column in DESCRIPTOR_COLUMNS {
            assert_eq!(game.descriptor(column), Some(false));
        }
    }

    #[test]
    fn test_set_descriptor_by_column() {
        let mut game = GameInfo::new("Shoddy Surgeon Simulator");
        assert!(game.set_descriptor("blood_and_gore", true));
        assert!(game.set_descriptor("strong_janguage", true));
        assert!(!game.set_descriptor("console", true));

        assert!(game.blood_and_gore);
        assert!(game.strong_language);
        assert_eq!(game.active_descriptors(), vec!["blood_and_gore", "strong_language"]);
    }

    #[test]
    fn test_game_info_json_is_camel_case_with_defaults() {
        let game: GameInfo =
            serde_json::from_str(r#"{"title":"Kinda Sus","mildCartoonViolence":true}"#).unwrap();
        assert_eq!(game.title, "Kinda Sus");
        assert!(game.mild_cartoon_violence);
        assert!(!game.violence);

        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["mildCartoonViolence"], true);
        assert_eq!(json["useOfDrugsAndAlcohol"], false);
    }

    #[test]
    fn test_game_rating_flattens_game() {
        let rating: GameRating =
            serde_json::from_str(r#"{"title":"x","blood":true,"esrbRating":"T"}"#).unwrap();
        assert!(rating.game.blood);
        assert_eq!(rating.esrb_rating, "T");
    }

    #[test]
    fn test_rating_parse_aliases() {
        assert_eq!("ET".parse::<EsrbRating>().unwrap(), EsrbRating::EveryoneTenPlus);
        assert_eq!("e10+".parse::<EsrbRating>().unwrap(), EsrbRating::EveryoneTenPlus);
        assert_eq!(" m ".parse::<EsrbRating>().unwrap(), EsrbRating::Mature);
        assert!("RP".parse::<EsrbRating>().is_err());
        assert!(EsrbRating::Teen.matches("t"));
        assert_eq!(EsrbRating::EveryoneTenPlus.to_string(), "E10+");
    }
}
