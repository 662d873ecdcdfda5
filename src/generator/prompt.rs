//! Prompt construction for scenes and the final analysis

use crate::story::{ChoiceRecord, TOTAL_TURNS};
use std::fmt::Write;

pub const NARRATOR_SYSTEM: &str = "You narrate the N109 Zone. Sylus (秦徹) is the only male lead in this \
timeline and every scene centres on him. Tone: mature dark romance with sci-fi action.";

pub const ANALYST_SYSTEM: &str = "You are the Onychinus database. Judge how well the user would survive \
at Sylus's side.";

/// Which prompt a turn gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chapter {
    Opening,
    Middle,
    Finale,
}

impl Chapter {
    pub fn for_turn(turn: usize) -> Self {
        if turn == 0 {
            Chapter::Opening
        } else if turn + 1 < TOTAL_TURNS {
            Chapter::Middle
        } else {
            Chapter::Finale
        }
    }
}

pub fn scene_prompt(turn: usize, history: &[ChoiceRecord]) -> String {
    let chapter = turn + 1;
    match Chapter::for_turn(turn) {
        Chapter::Opening => format!(
            "Write the OPENING SCENE (chapter 1/{TOTAL_TURNS}) of a Love and Deepspace story \
             starring SYLUS (秦徹).\n\n\
             Setting: the N109 Zone. Dark, neon-lit, dangerous.\n\
             Situation: the user crosses paths with Sylus during a negotiation, a capture, a \
             ballroom infiltration or a joint mission. Keep the tension high, whether danger or \
             attraction.\n\n\
             Give exactly 3 options, each a different way of handling him:\n\
             1. Aggressive and confident, challenging him.\n\
             2. Cautious and observant, reading him.\n\
             3. Manipulative and seductive, playing his game.\n\n\
             Respond with JSON only, written in Traditional Chinese. Tone: mature, cinematic."
        ),
        Chapter::Middle => format!(
            "Continue the N109 Zone story with Sylus. Chapter {chapter}/{TOTAL_TURNS}.\n\n\
             Previous choices:\n{}\n\n\
             Goal: deepen the interaction and raise the stakes. Show how Sylus reacts to the \
             user's earlier choices. Defiance may amuse or irritate him; submission may make him \
             demanding or protective.\n\n\
             Respond with JSON only, written in Traditional Chinese.",
            history_lines(history, true)
        ),
        Chapter::Finale => format!(
            "FINAL CHAPTER ({chapter}/{TOTAL_TURNS}): the climax with Sylus.\n\n\
             Previous choices:\n{}\n\n\
             The last decision settles the relationship. Give 4 options:\n\
             1. PARTNERSHIP: equals who rule the N109 Zone together.\n\
             2. SUBMISSION: belonging to him and finding safety in his control.\n\
             3. DOMINANCE/RISK: a gun pressed to his heart, a game of love and death.\n\
             4. INDEPENDENCE: using him for her own ends and leaving a mystery behind.\n\n\
             Respond with JSON only, written in Traditional Chinese. Emotional and dramatic.",
            history_lines(history, false)
        ),
    }
}

pub fn analysis_prompt(history: &[ChoiceRecord]) -> String {
    let mut decisions = String::new();
    for h in history {
        let _ = writeln!(
            decisions,
            "Scene {}: the user chose \"{}\" ({})",
            h.turn_index, h.choice_text, h.trait_signal
        );
    }

    format!(
        "Analyse the USER PERSONA from their story with Sylus.\n\n\
         Story decisions:\n{decisions}\n\
         Decide:\n\
         1. A striking hunter title (for example \"The Iron Rose\" or \"The Shadow Queen\").\n\
         2. The Evol type that fits them (Blood for intense and passionate, Shadow for \
         secretive, Energy for bold).\n\
         3. Their dynamic with Sylus: his equal, his weakness, or his predator?\n\n\
         Respond with JSON only, written in Traditional Chinese. destinedCompanion is always \
         \"Sylus\"."
    )
}

fn history_lines(history: &[ChoiceRecord], with_traits: bool) -> String {
    history
        .iter()
        .map(|h| {
            if with_traits {
                format!(
                    "Chapter {} choice: {} ({})",
                    h.turn_index + 1,
                    h.choice_text,
                    h.trait_signal
                )
            } else {
                format!("Chapter {} choice: {}", h.turn_index + 1, h.choice_text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
