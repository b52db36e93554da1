use party_shared::shared_sequence::{ChooseOutcome, Phase, RevealTicket, Sequence, SequenceEvent, SequenceView};
use party_shared::ContentItem;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::RevealTiming;

const EVENT_CAPACITY: usize = 64;

/// Drives one Sequence with real timers and publishes its state changes.
pub struct RevealSession {
    name: String,
    sequence: Arc<Mutex<Sequence>>,
    timing: RevealTiming,
    events: broadcast::Sender<SequenceEvent>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl RevealSession {
    pub fn new(name: impl Into<String>, sequence: Sequence, timing: RevealTiming) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            name: name.into(),
            sequence: Arc::new(Mutex::new(sequence)),
            timing,
            events,
            timers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequenceEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SequenceEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Announces the options of the stage the sequence is waiting on.
    pub async fn start(&self) {
        let sequence = self.sequence.lock().await;
        if let Some(event) = sequence.progress_event() {
            self.emit(event);
        }
    }

    pub async fn phase(&self) -> Phase {
        self.sequence.lock().await.phase()
    }

    pub async fn view(&self) -> SequenceView {
        self.sequence.lock().await.view()
    }

    pub async fn results(&self) -> Option<Vec<ContentItem>> {
        let sequence = self.sequence.lock().await;
        sequence.results().map(|items| items.into_iter().cloned().collect())
    }

    /// Picks option `option` of the current stage. An accepted pick starts the
    /// reveal hold; the stage locks and the next one is offered once the timers fire.
    pub async fn pick(&self, option: usize) -> ChooseOutcome {
        let outcome = {
            let mut sequence = self.sequence.lock().await;
            let stage = sequence.current_stage().unwrap_or(0);
            sequence.choose(stage, option)
        };

        if let ChooseOutcome::Accepted { ticket, item } = &outcome {
            info!("🎲 {}: stage {} revealing '{}'", self.name, ticket.stage, item.title());
            self.emit(SequenceEvent::Revealing { stage: ticket.stage, item: item.clone() });
            self.schedule(*ticket).await;
        }
        outcome
    }

    async fn schedule(&self, ticket: RevealTicket) {
        let sequence = Arc::clone(&self.sequence);
        let events = self.events.clone();
        let timing = self.timing;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(timing.hold).await;
            {
                let mut sequence = sequence.lock().await;
                match sequence.finish_reveal(ticket) {
                    Some(item) => {
                        let _ = events.send(SequenceEvent::StageLocked { stage: ticket.stage, item });
                    }
                    None => {
                        debug!("Reveal timer for stage {} superseded", ticket.stage);
                        return;
                    }
                }
            }

            tokio::time::sleep(timing.pause).await;
            let mut sequence = sequence.lock().await;
            if sequence.finish_pause(ticket).is_some() {
                if let Some(event) = sequence.progress_event() {
                    let _ = events.send(event);
                }
            }
        });

        let mut timers = self.timers.lock().await;
        timers.retain(|timer| !timer.is_finished());
        timers.push(handle);
    }

    /// Cancels every pending timer. The sequence keeps whatever phase it reached.
    pub async fn stop(&self) {
        let mut timers = self.timers.lock().await;
        if !timers.is_empty() {
            debug!("{}: cancelling {} timer(s)", self.name, timers.len());
        }
        for timer in timers.drain(..) {
            timer.abort();
        }
    }

    /// Starts a fresh round. Pending timers are cancelled; any that already woke
    /// up are rejected by the generation check.
    pub async fn restart(&self) -> u64 {
        let mut sequence = self.sequence.lock().await;
        for timer in self.timers.lock().await.drain(..) {
            timer.abort();
        }
        let generation = sequence.restart();
        info!("🔁 {}: restarted (generation {})", self.name, generation);
        self.emit(SequenceEvent::Restarted { generation });
        if let Some(event) = sequence.offer_event(0) {
            self.emit(event);
        }
        generation
    }
}
