//! Events that can occur in a session

use crate::story::{AnalysisResult, Scene};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Start,
    SelectOption {
        option_id: String,
    },
    Back,
    Restart,

    // Generator events, tagged with the epoch they were requested under
    SceneGenerated {
        epoch: u64,
        turn: usize,
        scene: Scene,
    },
    AnalysisGenerated {
        epoch: u64,
        result: AnalysisResult,
    },
    GenerationFailed {
        epoch: u64,
        message: String,
    },
}

impl Event {
    /// Generator events arrive from spawned tasks rather than from the user
    pub fn is_generation(&self) -> bool {
        matches!(
            self,
            Event::SceneGenerated { .. }
                | Event::AnalysisGenerated { .. }
                | Event::GenerationFailed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::SelectOption { .. } => "select_option",
            Event::Back => "back",
            Event::Restart => "restart",
            Event::SceneGenerated { .. } => "scene_generated",
            Event::AnalysisGenerated { .. } => "analysis_generated",
            Event::GenerationFailed { .. } => "generation_failed",
        }
    }
}
