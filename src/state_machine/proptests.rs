//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::story::{
    AnalysisResult, BackgroundTheme, Companion, EvolType, Scene, SceneOption, TOTAL_TURNS,
};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_option(id: &'static str) -> impl Strategy<Value = SceneOption> {
    ("[a-zA-Z ]{1,20}", "[A-Z][a-z]{2,10}")
        .prop_map(move |(text, signal)| SceneOption::new(id, text, signal))
}

fn arb_scene() -> impl Strategy<Value = Scene> {
    (
        "[a-zA-Z ]{1,40}",
        "[a-zA-Z ]{1,20}",
        prop_oneof![
            (arb_option("a"), arb_option("b")).prop_map(|(a, b)| vec![a, b]),
            (arb_option("a"), arb_option("b"), arb_option("c")).prop_map(|(a, b, c)| vec![a, b, c]),
            (arb_option("a"), arb_option("b"), arb_option("c"), arb_option("d"))
                .prop_map(|(a, b, c, d)| vec![a, b, c, d]),
        ],
        proptest::option::of(proptest::sample::select(BackgroundTheme::ALL.to_vec())),
    )
        .prop_map(|(narrative, question, options, background_theme)| Scene {
            narrative,
            question,
            options,
            background_theme,
        })
}

fn arb_analysis() -> impl Strategy<Value = AnalysisResult> {
    (
        "[a-zA-Z ]{1,20}",
        proptest::sample::select(EvolType::ALL.to_vec()),
        0u32..=100,
    )
        .prop_map(|(title, evol_type, rate)| AnalysisResult {
            hunter_title: title,
            evol_type,
            description: "d".to_string(),
            notable_traits: vec!["Bold".to_string()],
            destined_companion: Companion::Sylus,
            weapon: "Whip".to_string(),
            compatibility_rate: format!("{rate}%"),
        })
}

/// Abstract step; generation steps are resolved against the current epoch
/// and turn when applied, unless marked stale.
#[derive(Debug, Clone)]
enum Step {
    Start,
    Restart,
    Back,
    Select(&'static str),
    Scene(Scene, bool),
    Analysis(AnalysisResult, bool),
    Fail(bool),
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        1 => Just(Step::Start),
        1 => Just(Step::Restart),
        3 => Just(Step::Back),
        4 => proptest::sample::select(vec!["a", "b", "c", "d", "z"]).prop_map(Step::Select),
        4 => (arb_scene(), any::<bool>()).prop_map(|(s, stale)| Step::Scene(s, stale)),
        2 => (arb_analysis(), any::<bool>()).prop_map(|(r, stale)| Step::Analysis(r, stale)),
        1 => any::<bool>().prop_map(Step::Fail),
    ]
}

fn to_event(state: &SessionState, step: Step) -> Event {
    let epoch_for = |stale: bool| {
        if stale {
            state.epoch().wrapping_sub(1)
        } else {
            state.epoch()
        }
    };
    match step {
        Step::Start => Event::Start,
        Step::Restart => Event::Restart,
        Step::Back => Event::Back,
        Step::Select(id) => Event::SelectOption {
            option_id: id.to_string(),
        },
        Step::Scene(scene, stale) => Event::SceneGenerated {
            epoch: epoch_for(stale),
            turn: state.turn(),
            scene,
        },
        Step::Analysis(result, stale) => Event::AnalysisGenerated {
            epoch: epoch_for(stale),
            result,
        },
        Step::Fail(stale) => Event::GenerationFailed {
            epoch: epoch_for(stale),
            message: "generation failed".to_string(),
        },
    }
}

// ============================================================================
// Invariant Checkers
// ============================================================================

fn check_invariants(state: &SessionState) -> Result<(), String> {
    if state.turn() >= TOTAL_TURNS {
        return Err(format!("turn {} out of range", state.turn()));
    }
    if state.phase() == Phase::Playing && state.current_scene().is_some() {
        if state.history().len() != state.turn() {
            return Err("history length differs from turn".to_string());
        }
        if state.scene_stack().len() != state.turn() {
            return Err("scene stack length differs from turn".to_string());
        }
    }
    if !state.phase().is_terminal() && state.scene_stack().len() != state.history().len() {
        return Err("scene stack and history diverged".to_string());
    }
    if state.result().is_some() != (state.phase() == Phase::Result) {
        return Err("result present outside RESULT".to_string());
    }
    if state.phase() == Phase::Analyzing && state.history().len() != TOTAL_TURNS {
        return Err("analyzing before all turns resolved".to_string());
    }
    if state.phase() == Phase::Error && state.current_scene().is_some() {
        return Err("scene exposed in ERROR".to_string());
    }
    for (i, record) in state.history().iter().enumerate() {
        if record.turn_index != i {
            return Err(format!("history entry {i} has turn index {}", record.turn_index));
        }
    }
    Ok(())
}

fn run(steps: Vec<Step>) -> Result<SessionState, TestCaseError> {
    let mut state = SessionState::new();
    for step in steps {
        let event = to_event(&state, step);
        if let Ok(result) = transition(&state, event) {
            state = result.new_state;
            if let Err(msg) = check_invariants(&state) {
                return Err(TestCaseError::fail(format!("{msg}: {state:?}")));
            }
        }
    }
    Ok(state)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: every reachable state is well formed
    #[test]
    fn prop_transitions_preserve_invariants(steps in proptest::collection::vec(arb_step(), 0..40)) {
        run(steps)?;
    }

    // Invariant 2: select then back is the identity on a loaded turn
    #[test]
    fn prop_select_then_back_restores(
        steps in proptest::collection::vec(arb_step(), 0..40),
        next in arb_scene(),
        pick in proptest::sample::select(vec!["a", "b"]),
    ) {
        let before = run(steps)?;
        if !(before.can_select() && before.turn() + 1 < TOTAL_TURNS) {
            return Ok(());
        }

        let selected = transition(&before, Event::SelectOption { option_id: pick.to_string() })
            .unwrap()
            .new_state;
        let loaded = transition(&selected, Event::SceneGenerated {
            epoch: selected.epoch(),
            turn: selected.turn(),
            scene: next,
        })
        .unwrap()
        .new_state;
        let back = transition(&loaded, Event::Back).unwrap();

        prop_assert!(back.effects.is_empty());
        prop_assert_eq!(back.new_state, before);
    }

    // Invariant 3: back never touches the generator and is a no-op when unavailable
    #[test]
    fn prop_back_is_local(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let state = run(steps)?;
        let result = transition(&state, Event::Back).unwrap();
        prop_assert!(result.effects.is_empty());
        if !state.can_go_back() {
            prop_assert_eq!(result.new_state, state);
        } else {
            prop_assert_eq!(result.new_state.turn(), state.turn() - 1);
        }
    }

    // Invariant 4: results from an older epoch never change the state
    #[test]
    fn prop_stale_generation_rejected(
        steps in proptest::collection::vec(arb_step(), 0..40),
        scene in arb_scene(),
        analysis in arb_analysis(),
    ) {
        let state = run(steps)?;
        let stale = state.epoch().wrapping_sub(1);
        for event in [
            Event::SceneGenerated { epoch: stale, turn: state.turn(), scene },
            Event::AnalysisGenerated { epoch: stale, result: analysis },
            Event::GenerationFailed { epoch: stale, message: "late".to_string() },
        ] {
            let is_stale = matches!(
                transition(&state, event),
                Err(TransitionError::StaleGeneration { .. })
            );
            prop_assert!(is_stale);
        }
    }

    // Invariant 5: the final choice always leads to analysis, never another scene
    #[test]
    fn prop_final_turn_goes_to_analysis(
        scenes in proptest::collection::vec(arb_scene(), TOTAL_TURNS),
        picks in proptest::collection::vec(proptest::sample::select(vec!["a", "b"]), TOTAL_TURNS),
    ) {
        let mut state = transition(&SessionState::new(), Event::Start).unwrap().new_state;
        for (turn, (scene, pick)) in scenes.into_iter().zip(picks).enumerate() {
            state = transition(&state, Event::SceneGenerated {
                epoch: state.epoch(),
                turn,
                scene,
            })
            .unwrap()
            .new_state;
            let result = transition(&state, Event::SelectOption { option_id: pick.to_string() }).unwrap();
            state = result.new_state;

            if turn + 1 == TOTAL_TURNS {
                prop_assert_eq!(state.phase(), Phase::Analyzing);
                let is_analysis = matches!(&result.effects[..], [Effect::RequestAnalysis { .. }]);
                prop_assert!(is_analysis);
            } else {
                prop_assert_eq!(state.phase(), Phase::Playing);
                prop_assert_eq!(state.turn(), turn + 1);
            }
        }
        prop_assert_eq!(state.history().len(), TOTAL_TURNS);
    }

    // Invariant 6: any failure while awaiting lands in ERROR with nothing exposed
    #[test]
    fn prop_failure_absorbed(steps in proptest::collection::vec(arb_step(), 0..40)) {
        let state = run(steps)?;
        if !state.is_awaiting() {
            return Ok(());
        }
        let failed = transition(&state, Event::GenerationFailed {
            epoch: state.epoch(),
            message: "down".to_string(),
        })
        .unwrap()
        .new_state;
        prop_assert_eq!(failed.phase(), Phase::Error);
        prop_assert!(failed.current_scene().is_none());
        prop_assert!(failed.result().is_none());
        prop_assert_eq!(failed.history(), state.history());
    }
}
