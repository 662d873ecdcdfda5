//! Session runtime executor

use super::{Envelope, SessionEvent, SessionSnapshot};
use crate::generator::ContentGenerator;
use crate::state_machine::{transition, Effect, Event, SessionState, TransitionError};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Owns one session's state and drives it from incoming events
pub struct SessionRuntime {
    session_id: String,
    state: SessionState,
    generator: Arc<dyn ContentGenerator>,
    event_rx: mpsc::Receiver<Envelope>,
    /// Weak so that dropping every handle stops the runtime
    event_tx: mpsc::WeakSender<Envelope>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    broadcast_tx: broadcast::Sender<SessionEvent>,
}

impl SessionRuntime {
    pub fn new(
        session_id: String,
        generator: Arc<dyn ContentGenerator>,
        event_rx: mpsc::Receiver<Envelope>,
        event_tx: mpsc::WeakSender<Envelope>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        broadcast_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            session_id,
            state: SessionState::new(),
            generator,
            event_rx,
            event_tx,
            snapshot_tx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.session_id, "Starting session runtime");

        while let Some(envelope) = self.event_rx.recv().await {
            self.process(envelope);
        }

        tracing::info!(session_id = %self.session_id, "Session runtime stopped");
    }

    fn process(&mut self, envelope: Envelope) {
        let Envelope { event, reply } = envelope;
        let from_generator = event.is_generation();
        let event_name = event.name();

        let outcome = match transition(&self.state, event) {
            Ok(result) => {
                self.state = result.new_state;
                let snapshot = SessionSnapshot::of(&self.session_id, &self.state);
                tracing::debug!(
                    session_id = %self.session_id,
                    event = event_name,
                    phase = %self.state.phase(),
                    turn = self.state.turn(),
                    epoch = self.state.epoch(),
                    "Applied event"
                );
                if self.state.phase().is_terminal() && from_generator {
                    tracing::info!(
                        session_id = %self.session_id,
                        phase = %self.state.phase(),
                        choices = self.state.history().len(),
                        "Session reached an ending"
                    );
                }
                self.snapshot_tx.send_replace(snapshot.clone());
                let _ = self.broadcast_tx.send(SessionEvent::StateChange {
                    snapshot: snapshot.clone(),
                });

                for effect in result.effects {
                    self.execute_effect(effect);
                }
                Ok(snapshot)
            }
            Err(e @ TransitionError::StaleGeneration { .. }) => {
                tracing::debug!(session_id = %self.session_id, event = event_name, "{e}");
                Err(e)
            }
            Err(e) => {
                if from_generator {
                    tracing::warn!(session_id = %self.session_id, event = event_name, error = %e, "Dropped generation result");
                } else {
                    tracing::info!(session_id = %self.session_id, event = event_name, error = %e, "Rejected event");
                }
                Err(e)
            }
        };

        if let Some(reply) = reply {
            let _ = reply.send(outcome);
        }
    }

    fn execute_effect(&self, effect: Effect) {
        tracing::debug!(session_id = %self.session_id, epoch = ?effect.epoch(), ?effect, "Executing effect");

        match effect {
            Effect::RequestScene { .. } | Effect::RequestAnalysis { .. } => {
                self.spawn_generation(effect);
            }
            Effect::NotifyFailure { message } => {
                let _ = self.broadcast_tx.send(SessionEvent::Error { message });
            }
        }
    }

    /// Run one generation request in the background and post its outcome
    /// back as an epoch-tagged event
    fn spawn_generation(&self, effect: Effect) {
        let Some(tx) = self.event_tx.upgrade() else {
            return;
        };
        let generator = Arc::clone(&self.generator);
        let session_id = self.session_id.clone();

        tokio::spawn(async move {
            let event = match effect {
                Effect::RequestScene {
                    epoch,
                    turn,
                    history,
                } => match generator.generate_scene(turn, &history).await {
                    Ok(scene) => Event::SceneGenerated { epoch, turn, scene },
                    Err(e) => {
                        tracing::warn!(session_id = %session_id, epoch, turn, error = %e, "Scene generation failed");
                        Event::GenerationFailed {
                            epoch,
                            message: e.message,
                        }
                    }
                },
                Effect::RequestAnalysis { epoch, history } => {
                    match generator.generate_analysis(&history).await {
                        Ok(result) => Event::AnalysisGenerated { epoch, result },
                        Err(e) => {
                            tracing::warn!(session_id = %session_id, epoch, error = %e, "Analysis generation failed");
                            Event::GenerationFailed {
                                epoch,
                                message: e.message,
                            }
                        }
                    }
                }
                Effect::NotifyFailure { .. } => return,
            };

            if tx.send(Envelope::internal(event)).await.is_err() {
                tracing::debug!(session_id = %session_id, "Session gone before generation finished");
            }
        });
    }
}
