//! Built-in games used when no input file is given

use esrb_lib::GameInfo;

/// A handful of made-up games spanning the rating range
pub fn sample_games() -> Vec<GameInfo> {
    vec![
        GameInfo::new("Teen Side Scroller")
            .with("cartoon_violence")
            .with("mild_language")
            .with("crude_humor")
            .with("violence")
            .with("mild_suggestive_themes"),
        GameInfo::new("Kinda Sus").with("mild_cartoon_violence"),
        GameInfo::new("The Earthlings are Coming")
            .with("mild_violence")
            .with("mild_fantasy_violence"),
        GameInfo::new("Shoddy Surgeon Simulator")
            .with("blood_and_gore")
            .with("drug_reference")
            .with("partial_nudity"),
        GameInfo::new("Assistant to the Lawn Service Manager 2022")
            .with("mild_language")
            .with("crude_humor")
            .with("alcohol_reference"),
        GameInfo::new("Intense Shoot-o-rama: Why would anyone play this edition")
            .with("blood_and_gore")
            .with("drug_reference")
            .with("alcohol_reference")
            .with("nudity")
            .with("strong_language")
            .with("sexual_content")
            .with("sexual_themes")
            .with("mature_humor")
            .with("intense_violence")
            .with("crude_humor"),
    ]
}
