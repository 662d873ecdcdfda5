//! Pure state transition function
//!
//! The turn controller (start, select, generation results) and the undo
//! controller (back) are both arms of [`transition`]. Nothing here performs
//! I/O; generation is requested through [`Effect`]s and its outcome comes
//! back as another [`Event`].

use super::state::{Phase, SessionState};
use super::{Effect, Event};
use crate::story::{ChoiceRecord, TOTAL_TURNS};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot choose an option while the session is {phase}")]
    NotPlaying { phase: Phase },
    #[error("Scene is still being generated")]
    SceneNotReady,
    #[error("Option `{id}` is not offered by the current scene")]
    UnknownOption { id: String },
    /// A generation result from before the latest start/restart
    #[error("Discarding result from epoch {epoch} (current epoch {current})")]
    StaleGeneration { epoch: u64, current: u64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
pub fn transition(
    state: &SessionState,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match event {
        // ============================================================
        // Lifecycle
        // ============================================================
        Event::Start => {
            let epoch = state.epoch + 1;
            Ok(
                TransitionResult::new(SessionState::fresh(epoch, Phase::Playing)).with_effect(
                    Effect::RequestScene {
                        epoch,
                        turn: 0,
                        history: vec![],
                    },
                ),
            )
        }

        Event::Restart => Ok(TransitionResult::new(SessionState::fresh(
            state.epoch + 1,
            Phase::Intro,
        ))),

        // ============================================================
        // Turn controller
        // ============================================================
        Event::SelectOption { option_id } => select_option(state, &option_id),

        Event::SceneGenerated { epoch, turn, scene } => {
            check_epoch(state, epoch)?;
            if !(state.phase == Phase::Playing && state.current_scene.is_none()) {
                return Err(TransitionError::InvalidTransition(format!(
                    "scene arrived while {} with a scene loaded",
                    state.phase
                )));
            }
            if turn != state.turn {
                return Err(TransitionError::InvalidTransition(format!(
                    "scene for turn {turn} arrived while on turn {}",
                    state.turn
                )));
            }
            let mut next = state.clone();
            next.current_scene = Some(scene);
            Ok(TransitionResult::new(next))
        }

        Event::AnalysisGenerated { epoch, result } => {
            check_epoch(state, epoch)?;
            if state.phase != Phase::Analyzing {
                return Err(TransitionError::InvalidTransition(format!(
                    "analysis arrived while {}",
                    state.phase
                )));
            }
            let mut next = state.clone();
            next.result = Some(result);
            next.phase = Phase::Result;
            Ok(TransitionResult::new(next))
        }

        Event::GenerationFailed { epoch, message } => {
            check_epoch(state, epoch)?;
            if !state.is_awaiting() {
                return Err(TransitionError::InvalidTransition(format!(
                    "generation failure arrived while {} with nothing pending",
                    state.phase
                )));
            }
            // The choice that triggered the request stays recorded
            let mut next = state.clone();
            next.phase = Phase::Error;
            next.current_scene = None;
            next.result = None;
            next.failure = Some(message.clone());
            Ok(TransitionResult::new(next).with_effect(Effect::NotifyFailure { message }))
        }

        // ============================================================
        // Undo controller
        // ============================================================
        Event::Back => {
            if !state.can_go_back() {
                return Ok(TransitionResult::new(state.clone()));
            }
            let mut next = state.clone();
            next.current_scene = next.scene_stack.pop();
            next.history.pop();
            next.turn -= 1;
            Ok(TransitionResult::new(next))
        }
    }
}

fn select_option(
    state: &SessionState,
    option_id: &str,
) -> Result<TransitionResult, TransitionError> {
    if state.phase != Phase::Playing {
        return Err(TransitionError::NotPlaying { phase: state.phase });
    }
    let Some(scene) = &state.current_scene else {
        return Err(TransitionError::SceneNotReady);
    };
    let Some(option) = scene.option(option_id) else {
        return Err(TransitionError::UnknownOption {
            id: option_id.to_string(),
        });
    };

    let mut next = state.clone();
    next.history.push(ChoiceRecord::new(state.turn, option));
    next.scene_stack.push(scene.clone());
    next.current_scene = None;

    if state.turn + 1 >= TOTAL_TURNS {
        next.phase = Phase::Analyzing;
        let history = next.history.clone();
        return Ok(TransitionResult::new(next).with_effect(Effect::RequestAnalysis {
            epoch: state.epoch,
            history,
        }));
    }

    next.turn += 1;
    let effect = Effect::RequestScene {
        epoch: state.epoch,
        turn: next.turn,
        history: next.history.clone(),
    };
    Ok(TransitionResult::new(next).with_effect(effect))
}

fn check_epoch(state: &SessionState, epoch: u64) -> Result<(), TransitionError> {
    if epoch == state.epoch {
        Ok(())
    } else {
        Err(TransitionError::StaleGeneration {
            epoch,
            current: state.epoch,
        })
    }
}
