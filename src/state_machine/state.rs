//! Session state types

use crate::story::{AnalysisResult, ChoiceRecord, Scene, TOTAL_TURNS};
use serde::{Deserialize, Serialize};

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Intro,
    Playing,
    Analyzing,
    /// Terminal, success
    Result,
    /// Terminal, failure
    Error,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Intro => "INTRO",
            Phase::Playing => "PLAYING",
            Phase::Analyzing => "ANALYZING",
            Phase::Result => "RESULT",
            Phase::Error => "ERROR",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Result | Phase::Error)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The whole mutable state of one story session.
///
/// Fields are only written by [`super::transition`]; everything else reads
/// through the accessors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub(super) phase: Phase,
    pub(super) turn: usize,
    pub(super) history: Vec<ChoiceRecord>,
    /// Previously shown scenes, most recent last
    pub(super) scene_stack: Vec<Scene>,
    /// `None` while a scene request is in flight
    pub(super) current_scene: Option<Scene>,
    pub(super) result: Option<AnalysisResult>,
    /// Bumped on every start/restart; generation results carry the epoch
    /// they were requested under.
    pub(super) epoch: u64,
    pub(super) failure: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank state for a new epoch
    pub(super) fn fresh(epoch: u64, phase: Phase) -> Self {
        Self {
            phase,
            epoch,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn history(&self) -> &[ChoiceRecord] {
        &self.history
    }

    #[cfg(test)]
    pub fn scene_stack(&self) -> &[Scene] {
        &self.scene_stack
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.current_scene.as_ref()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Message of the generation failure that put the session in `ERROR`
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// A generation request is in flight
    pub fn is_awaiting(&self) -> bool {
        match self.phase {
            Phase::Playing => self.current_scene.is_none(),
            Phase::Analyzing => true,
            _ => false,
        }
    }

    pub fn can_select(&self) -> bool {
        self.phase == Phase::Playing && self.current_scene.is_some()
    }

    pub fn can_go_back(&self) -> bool {
        self.can_select() && self.turn > 0 && !self.scene_stack.is_empty()
    }

    /// Caption for the pending step, if any
    pub fn loading_caption(&self) -> Option<&'static str> {
        if !self.is_awaiting() {
            return None;
        }
        Some(match (self.phase, self.turn) {
            (Phase::Analyzing, _) => "正在計算共鳴指數...",
            (_, 0) => "正在定位秦徹座標...",
            (_, t) if t == TOTAL_TURNS - 1 => "警告：決戰時刻逼近...",
            _ => "Evol 波動檢測中...",
        })
    }
}
