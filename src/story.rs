//! Story data model
//!
//! Wire names follow the generator's structured-output contract, so the same
//! types are used to parse generated JSON and to serve snapshots to clients.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;

/// Number of turns in every session. The last turn's choice triggers analysis.
pub const TOTAL_TURNS: usize = 5;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;

static COMPATIBILITY_RATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+%$").unwrap_or_else(|e| unreachable!("static pattern: {e}"))
});

/// One selectable action within a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneOption {
    pub id: String,
    pub text: String,
    /// Short personality label, passed back to the generator as context
    pub trait_signal: String,
}

impl SceneOption {
    #[cfg(test)]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        trait_signal: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            trait_signal: trait_signal.into(),
        }
    }
}

/// Setting tag for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundTheme {
    #[serde(rename = "n109-zone")]
    N109Zone,
    #[serde(rename = "combat")]
    Combat,
    #[serde(rename = "mansion")]
    Mansion,
}

impl BackgroundTheme {
    pub const ALL: [BackgroundTheme; 3] = [Self::N109Zone, Self::Combat, Self::Mansion];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::N109Zone => "n109-zone",
            Self::Combat => "combat",
            Self::Mansion => "mansion",
        }
    }
}

/// One narrative beat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub narrative: String,
    pub question: String,
    pub options: Vec<SceneOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_theme: Option<BackgroundTheme>,
}

impl Scene {
    /// Look up one of this scene's options by id
    pub fn option(&self, id: &str) -> Option<&SceneOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Check the structural shape the generator promised.
    pub fn validate(&self) -> Result<(), SchemaError> {
        require_text("narrative", &self.narrative)?;
        require_text("question", &self.question)?;

        let count = self.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            return Err(SchemaError::OptionCount(count));
        }

        let mut seen = HashSet::new();
        for option in &self.options {
            require_text("options[].id", &option.id)?;
            require_text("options[].text", &option.text)?;
            require_text("options[].traitSignal", &option.trait_signal)?;
            if !seen.insert(option.id.as_str()) {
                return Err(SchemaError::DuplicateOptionId(option.id.clone()));
            }
        }
        Ok(())
    }
}

/// A resolved turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceRecord {
    pub turn_index: usize,
    pub choice_text: String,
    pub trait_signal: String,
}

impl ChoiceRecord {
    pub fn new(turn_index: usize, option: &SceneOption) -> Self {
        Self {
            turn_index,
            choice_text: option.text.clone(),
            trait_signal: option.trait_signal.clone(),
        }
    }
}

/// Evol category assigned by the analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolType {
    Energy,
    Resonance,
    Aether,
    Gravity,
    Shadow,
    Blood,
}

impl EvolType {
    pub const ALL: [EvolType; 6] = [
        Self::Energy,
        Self::Resonance,
        Self::Aether,
        Self::Gravity,
        Self::Shadow,
        Self::Blood,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "Energy",
            Self::Resonance => "Resonance",
            Self::Aether => "Aether",
            Self::Gravity => "Gravity",
            Self::Shadow => "Shadow",
            Self::Blood => "Blood",
        }
    }
}

/// The only companion this timeline knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Companion {
    Sylus,
}

impl Companion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sylus => "Sylus",
        }
    }
}

/// End-of-session summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub hunter_title: String,
    pub evol_type: EvolType,
    pub description: String,
    pub notable_traits: Vec<String>,
    pub destined_companion: Companion,
    pub weapon: String,
    /// Always `<integer>%`
    pub compatibility_rate: String,
}

impl AnalysisResult {
    pub fn validate(&self) -> Result<(), SchemaError> {
        require_text("hunterTitle", &self.hunter_title)?;
        require_text("description", &self.description)?;
        require_text("weapon", &self.weapon)?;
        for t in &self.notable_traits {
            require_text("notableTraits[]", t)?;
        }
        if !COMPATIBILITY_RATE.is_match(&self.compatibility_rate) {
            return Err(SchemaError::CompatibilityRate(
                self.compatibility_rate.clone(),
            ));
        }
        Ok(())
    }

    /// Numeric part of the compatibility rate
    #[cfg(test)]
    pub fn compatibility_percent(&self) -> Option<u32> {
        self.compatibility_rate.strip_suffix('%')?.parse().ok()
    }
}

/// Structural problems in generated content
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("field `{0}` is empty")]
    EmptyField(&'static str),
    #[error("scene has {0} options, expected {MIN_OPTIONS} to {MAX_OPTIONS}")]
    OptionCount(usize),
    #[error("option id `{0}` appears more than once")]
    DuplicateOptionId(String),
    #[error("compatibility rate `{0}` is not of the form <integer>%")]
    CompatibilityRate(String),
}

fn require_text(field: &'static str, value: &str) -> Result<(), SchemaError> {
    if value.trim().is_empty() {
        Err(SchemaError::EmptyField(field))
    } else {
        Ok(())
    }
}
