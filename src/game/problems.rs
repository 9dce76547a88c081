//! Arithmetic problem data: loading the bank and picking questions
//!
//! The bank is a JSON document grouping problems by category ("type") and
//! difficulty:
//!
//! ```json
//! { "levels": [ { "type": "addition", "difficulties": [
//!     { "difficulty": "easy", "problems": [
//!         { "question": "2 + 3", "correctAnswer": 5, "choices": [5, 4, 7] }
//!     ] }
//! ] } ] }
//! ```

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use super::config::Selection;

/// Errors raised while loading the problem bank
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("failed to read problem file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse problem data: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("problem data contains no problems")]
    Empty,
}

/// A numeric answer as it appears in the data file
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answer(pub f64);

impl Answer {
    /// This answer moved by a whole offset
    pub fn offset(self, by: i32) -> Answer {
        Answer(self.0 + f64::from(by))
    }
}

impl From<i32> for Answer {
    fn from(value: i32) -> Self {
        Answer(f64::from(value))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{:.0}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProblem {
    question: String,
    correct_answer: Answer,
    #[serde(default)]
    choices: Option<Vec<Answer>>,
}

#[derive(Debug, Clone, Deserialize)]
struct DifficultyBucket {
    difficulty: String,
    #[serde(default)]
    problems: Vec<RawProblem>,
}

#[derive(Debug, Clone, Deserialize)]
struct Category {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    difficulties: Vec<DifficultyBucket>,
}

#[derive(Debug, Clone, Deserialize)]
struct BankDocument {
    levels: Vec<Category>,
}

/// A question ready to be shown, with its answer choices
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Question text with `×` and `÷` as operators
    pub question: String,
    pub correct_answer: Answer,
    /// Shuffled, deduplicated choices; never empty
    pub choices: Vec<Answer>,
}

impl Problem {
    pub fn new(question: impl Into<String>, correct_answer: Answer, choices: Vec<Answer>) -> Self {
        let choices = if choices.is_empty() {
            vec![correct_answer]
        } else {
            choices
        };
        Self {
            question: question.into(),
            correct_answer,
            choices,
        }
    }
}

/// All problems loaded from the data file
#[derive(Debug, Clone)]
pub struct ProblemBank {
    levels: Vec<Category>,
}

impl ProblemBank {
    /// Load the bank from a JSON file
    pub fn load(path: &Path) -> Result<Self, ProblemError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProblemError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse the bank from JSON text
    pub fn from_json(text: &str) -> Result<Self, ProblemError> {
        let document: BankDocument = serde_json::from_str(text)?;
        let bank = Self {
            levels: document.levels,
        };

        if bank.problem_count() == 0 {
            return Err(ProblemError::Empty);
        }

        Ok(bank)
    }

    pub fn problem_count(&self) -> usize {
        self.levels
            .iter()
            .flat_map(|c| &c.difficulties)
            .map(|d| d.problems.len())
            .sum()
    }

    /// Every correct answer and listed choice in the bank
    pub fn answers(&self) -> impl Iterator<Item = Answer> + '_ {
        self.levels
            .iter()
            .flat_map(|c| &c.difficulties)
            .flat_map(|d| &d.problems)
            .flat_map(|p| {
                std::iter::once(p.correct_answer).chain(p.choices.iter().flatten().copied())
            })
    }

    /// Category names in file order
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for category in &self.levels {
            if !names.contains(&category.kind) {
                names.push(category.kind.clone());
            }
        }
        names
    }

    /// Distinct difficulty names across all categories, in file order
    pub fn difficulties(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for bucket in self.levels.iter().flat_map(|c| &c.difficulties) {
            if !names.contains(&bucket.difficulty) {
                names.push(bucket.difficulty.clone());
            }
        }
        names
    }

    /// Pick a random problem honouring the filters.
    ///
    /// A category is drawn first, then a difficulty inside it, then a problem
    /// inside that bucket. Empty buckets are never drawn. When the filters
    /// leave nothing to draw from, the difficulty filter is dropped first and
    /// then the category filter.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        problem_type: &Selection,
        difficulty: &Selection,
        rng: &mut R,
    ) -> Problem {
        let attempts = [
            (problem_type, difficulty),
            (problem_type, &Selection::Mixed),
            (&Selection::Mixed, &Selection::Mixed),
        ];

        for (type_filter, difficulty_filter) in attempts {
            if let Some(raw) = self.draw(type_filter, difficulty_filter, rng) {
                return Self::prepare(raw, rng);
            }
        }

        // Unreachable for a bank built through `from_json`, which rejects
        // documents without problems.
        Problem::new("?", Answer(0.0), Vec::new())
    }

    fn draw<R: Rng + ?Sized>(
        &self,
        type_filter: &Selection,
        difficulty_filter: &Selection,
        rng: &mut R,
    ) -> Option<&RawProblem> {
        let has_problems = |b: &&DifficultyBucket| {
            difficulty_filter.accepts(&b.difficulty) && !b.problems.is_empty()
        };

        let categories: Vec<&Category> = self
            .levels
            .iter()
            .filter(|c| type_filter.accepts(&c.kind))
            .filter(|c| c.difficulties.iter().any(|b| has_problems(&b)))
            .collect();
        let category: &Category = *categories.choose(rng)?;

        let buckets: Vec<&DifficultyBucket> =
            category.difficulties.iter().filter(has_problems).collect();
        let bucket: &DifficultyBucket = *buckets.choose(rng)?;

        bucket.problems.choose(rng)
    }

    fn prepare<R: Rng + ?Sized>(raw: &RawProblem, rng: &mut R) -> Problem {
        let mut choices: Vec<Answer> = Vec::new();
        for choice in raw.choices.iter().flatten() {
            if !choices.contains(choice) {
                choices.push(*choice);
            }
        }
        choices.shuffle(rng);

        Problem::new(
            display_question(&raw.question),
            raw.correct_answer,
            choices,
        )
    }
}

/// Replace the ASCII operators with their display symbols
pub fn display_question(question: &str) -> String {
    question.replace('/', "÷").replace('*', "×")
}
