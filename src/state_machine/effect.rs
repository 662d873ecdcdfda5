//! Effects produced by state transitions

use crate::story::ChoiceRecord;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the generator for the scene of `turn`
    RequestScene {
        epoch: u64,
        turn: usize,
        history: Vec<ChoiceRecord>,
    },

    /// Ask the generator for the end-of-session analysis
    RequestAnalysis {
        epoch: u64,
        history: Vec<ChoiceRecord>,
    },

    /// Tell connected clients that generation failed
    NotifyFailure { message: String },
}

impl Effect {
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Effect::RequestScene { epoch, .. } | Effect::RequestAnalysis { epoch, .. } => {
                Some(*epoch)
            }
            Effect::NotifyFailure { .. } => None,
        }
    }
}
