//! Interactive train / save / load / predict menu

use crate::progress::ConsoleProgressReporter;
use crate::samples::sample_games;
use esrb_lib::{EsrbPredictor, GameClassificationResult, ModelWrapper, PredictorError};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

/// Files the menu reads and writes
#[derive(Debug, Clone)]
pub struct MenuFiles {
    pub model: PathBuf,
    pub training_data: PathBuf,
    pub validation_data: PathBuf,
}

/// Menu actions, selected case-insensitively by their first letter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Train,
    Save,
    Load,
    Predict,
    Quit,
}

impl Action {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_uppercase().as_str() {
            "T" => Some(Action::Train),
            "S" => Some(Action::Save),
            "L" => Some(Action::Load),
            "P" => Some(Action::Predict),
            "Q" => Some(Action::Quit),
            _ => None,
        }
    }
}

pub struct Menu<R, W> {
    input: R,
    output: W,
    predictor: EsrbPredictor,
    files: MenuFiles,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W, predictor: EsrbPredictor, files: MenuFiles) -> Self {
        Self {
            input,
            output,
            predictor,
            files,
        }
    }

    /// Run until the user quits or input ends
    pub fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "Welcome to the ESRB Predictor")?;

        loop {
            self.print_options()?;
            let Some(line) = self.read_line()? else {
                return Ok(());
            };
            writeln!(self.output)?;

            let outcome = match Action::parse(&line) {
                Some(Action::Train) => self.train(),
                Some(Action::Save) => self.save(),
                Some(Action::Load) => self.load(),
                Some(Action::Predict) => self.predict(),
                Some(Action::Quit) => {
                    writeln!(self.output, "Thanks for using the classifier!")?;
                    return Ok(());
                }
                None => {
                    writeln!(self.output, "Invalid input. Please type T, S, L, P, or Q")?;
                    Ok(())
                }
            };

            match outcome {
                Ok(()) => {}
                Err(MenuError::Io(e)) => return Err(e),
                Err(MenuError::EndOfInput) => return Ok(()),
            }
        }
    }

    fn print_options(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "What would you like to do?")?;
        writeln!(self.output)?;
        writeln!(self.output, "(T)rain a model")?;
        writeln!(self.output, "(S)ave the model to disk")?;
        writeln!(self.output, "(L)oad the last saved model from disk")?;
        writeln!(self.output, "(P)redict ESRB ratings")?;
        writeln!(self.output, "(Q)uit")?;
        writeln!(self.output)?;
        write!(self.output, "> ")?;
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn train(&mut self) -> Result<(), MenuError> {
        writeln!(self.output, "How many seconds do you want to train? (10 Recommended)")?;
        let line = self.read_line()?.ok_or(MenuError::EndOfInput)?;
        writeln!(self.output)?;

        let seconds: i64 = match line.parse() {
            Ok(seconds) => seconds,
            Err(_) => {
                writeln!(self.output, "Invalid input. Expecting a positive whole number.")?;
                return Ok(());
            }
        };
        if seconds <= 0 {
            writeln!(self.output, "You must train for at least one second")?;
            return Ok(());
        }

        let time_text = if seconds == 1 {
            "1 second".to_string()
        } else {
            format!("{} seconds", seconds)
        };
        writeln!(self.output, "Training model now.... This will take around {}", time_text)?;
        writeln!(self.output)?;

        let result = self.predictor.train_with_progress(
            &self.files.training_data,
            &self.files.validation_data,
            Duration::from_secs(seconds.unsigned_abs()),
            &mut ConsoleProgressReporter::new(&mut self.output),
        );

        match result {
            Ok(summary) => {
                writeln!(self.output)?;
                writeln!(self.output, "Training completed!")?;
                writeln!(self.output)?;
                writeln!(
                    self.output,
                    "{}",
                    summary.best_metrics.confusion_matrix.formatted_table()
                )?;
            }
            Err(e) => writeln!(self.output, "Could not train the model: {}", e)?,
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), MenuError> {
        match self.predictor.save(&self.files.model) {
            Ok(()) => writeln!(self.output, "Model saved.")?,
            Err(e) if e.is_not_ready() => writeln!(self.output, "{}", e)?,
            Err(e) => writeln!(
                self.output,
                "Could not save the model to {}: {}",
                self.files.model.display(),
                detail(&e)
            )?,
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), MenuError> {
        match self.predictor.load(&self.files.model) {
            Ok(()) => writeln!(self.output, "Model loaded.")?,
            Err(e) => writeln!(
                self.output,
                "Could not load the model from {}: {}",
                self.files.model.display(),
                detail(&e)
            )?,
        }
        Ok(())
    }

    fn predict(&mut self) -> Result<(), MenuError> {
        let games = sample_games();
        let results: Vec<GameClassificationResult> = match self.predictor.classify_many(&games) {
            Ok(results) => results.collect(),
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                return Ok(());
            }
        };

        for result in results {
            writeln!(
                self.output,
                "Predicting rating of {} for \"{}\" with a confidence score of {:.2}%",
                result.esrb_rating(),
                result.title,
                result.confidence() * 100.0
            )?;
        }
        Ok(())
    }

    pub fn into_predictor(self) -> EsrbPredictor {
        self.predictor
    }
}

/// Underlying cause for I/O failures, the full message otherwise
fn detail(err: &PredictorError) -> String {
    match err {
        PredictorError::Io { source, .. } => source.to_string(),
        other => other.to_string(),
    }
}

enum MenuError {
    Io(io::Error),
    EndOfInput,
}

impl From<io::Error> for MenuError {
    fn from(e: io::Error) -> Self {
        MenuError::Io(e)
    }
}
