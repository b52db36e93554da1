use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::constants::OFFER_COUNT;
use crate::content::{ContentItem, ContentPool, StageDefinition};
use crate::shared_selector::Selector;

/// Where a sequence currently is. Indices refer to stages.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending(usize),
    Revealing(usize),
    Locked(usize),
    Complete,
}

#[derive(Debug, Clone)]
pub struct Stage {
    pub title: String,
    pub category: String,
    offered: Vec<ContentItem>,
    chosen: Option<ContentItem>,
}

impl Stage {
    pub fn offered(&self) -> &[ContentItem] {
        &self.offered
    }

    pub fn chosen(&self) -> Option<&ContentItem> {
        self.chosen.as_ref()
    }
}

/// Handed out when a choice is accepted. Timer callbacks pass it back so that
/// a callback scheduled before a restart cannot touch the new round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealTicket {
    pub stage: usize,
    pub generation: u64,
}

/// Why a click did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    WrongStage,
    AlreadyRevealing,
    StageLocked,
    Complete,
    NoSuchOption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooseOutcome {
    Accepted { ticket: RevealTicket, item: ContentItem },
    Ignored(Ignored),
}

/// State changes published to whatever renders the sequence.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum SequenceEvent {
    StageOffered { stage: usize, title: String, options: Vec<ContentItem> },
    Revealing { stage: usize, item: ContentItem },
    StageLocked { stage: usize, item: ContentItem },
    Completed { results: Vec<ContentItem> },
    Restarted { generation: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a sequence needs at least one stage")]
    NoStages,
    #[error("stage '{stage}' has no content in category '{category}'")]
    EmptyPool { stage: String, category: String },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StageView {
    pub title: String,
    pub offered: Vec<ContentItem>,
    pub chosen: Option<ContentItem>,
}

/// Serializable snapshot for presentation layers.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SequenceView {
    pub phase: Phase,
    pub generation: u64,
    pub stages: Vec<StageView>,
}

#[derive(Debug, Clone)]
pub struct Sequence {
    stages: Vec<Stage>,
    phase: Phase,
    generation: u64,
    offer_count: usize,
    pending: Option<ContentItem>,
    selector: Selector,
}

impl Sequence {
    pub fn new(definitions: &[StageDefinition], pools: &ContentPool) -> Result<Self, SequenceError> {
        Self::with_selector(definitions, Selector::new(pools.clone()), OFFER_COUNT)
    }

    pub fn with_seed(
        definitions: &[StageDefinition],
        pools: &ContentPool,
        offer_count: usize,
        seed: u64,
    ) -> Result<Self, SequenceError> {
        Self::with_selector(definitions, Selector::with_seed(pools.clone(), seed), offer_count)
    }

    pub fn with_offer_count(
        definitions: &[StageDefinition],
        pools: &ContentPool,
        offer_count: usize,
    ) -> Result<Self, SequenceError> {
        Self::with_selector(definitions, Selector::new(pools.clone()), offer_count)
    }

    /// Builds a sequence whose stage offers are drawn by `selector`, now and on every restart.
    pub fn with_selector(
        definitions: &[StageDefinition],
        selector: Selector,
        offer_count: usize,
    ) -> Result<Self, SequenceError> {
        if definitions.is_empty() {
            return Err(SequenceError::NoStages);
        }

        let stages = definitions
            .iter()
            .map(|def| match selector.pool(&def.category) {
                Some(pool) if !pool.is_empty() => Ok(Stage {
                    title: def.title.clone(),
                    category: def.category.clone(),
                    offered: Vec::new(),
                    chosen: None,
                }),
                _ => Err(SequenceError::EmptyPool {
                    stage: def.title.clone(),
                    category: def.category.clone(),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut sequence = Self {
            stages,
            phase: Phase::Pending(0),
            generation: 0,
            offer_count: offer_count.max(1),
            pending: None,
            selector,
        };
        sequence.draw_offers();
        Ok(sequence)
    }

    fn draw_offers(&mut self) {
        for stage in &mut self.stages {
            stage.offered = self.selector.offer(&stage.category, self.offer_count);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// The stage currently waiting for a choice, if any.
    pub fn current_stage(&self) -> Option<usize> {
        match self.phase {
            Phase::Pending(i) | Phase::Revealing(i) | Phase::Locked(i) => Some(i),
            Phase::Complete => None,
        }
    }

    /// Ordered results, one per stage. Only available once the sequence is complete.
    pub fn results(&self) -> Option<Vec<&ContentItem>> {
        if !self.is_complete() {
            return None;
        }
        self.stages.iter().map(Stage::chosen).collect()
    }

    /// A click on option `option` of stage `stage`. Only the first click on the
    /// pending stage is accepted; everything else is a no-op.
    pub fn choose(&mut self, stage: usize, option: usize) -> ChooseOutcome {
        let reason = match self.phase {
            Phase::Complete => Some(Ignored::Complete),
            Phase::Pending(current) if current == stage => None,
            Phase::Revealing(current) if current == stage => Some(Ignored::AlreadyRevealing),
            Phase::Locked(current) if current == stage => Some(Ignored::StageLocked),
            _ if stage < self.current_stage().unwrap_or(0) => Some(Ignored::StageLocked),
            _ => Some(Ignored::WrongStage),
        };
        if let Some(reason) = reason {
            log::debug!("Ignoring choice {} on stage {}: {:?}", option, stage, reason);
            return ChooseOutcome::Ignored(reason);
        }

        let item = match self.stages[stage].offered.get(option) {
            Some(item) => item.clone(),
            None => return ChooseOutcome::Ignored(Ignored::NoSuchOption),
        };

        log::info!("Stage {} revealing '{}'", stage, item.title());
        self.pending = Some(item.clone());
        self.phase = Phase::Revealing(stage);
        ChooseOutcome::Accepted {
            ticket: RevealTicket { stage, generation: self.generation },
            item,
        }
    }

    fn is_current(&self, ticket: RevealTicket) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "Dropping stale ticket for stage {} (generation {} vs {})",
                ticket.stage, ticket.generation, self.generation
            );
            return false;
        }
        true
    }

    /// End of the reveal hold: records the pending choice and locks the stage.
    /// Returns the locked item, or `None` when the ticket is stale.
    pub fn finish_reveal(&mut self, ticket: RevealTicket) -> Option<ContentItem> {
        if !self.is_current(ticket) || self.phase != Phase::Revealing(ticket.stage) {
            return None;
        }
        let item = self.pending.take()?;
        self.stages[ticket.stage].chosen = Some(item.clone());
        self.phase = Phase::Locked(ticket.stage);
        log::info!("Stage {} locked on '{}'", ticket.stage, item.title());
        Some(item)
    }

    /// End of the inter-stage pause: moves on to the next stage or completes.
    pub fn finish_pause(&mut self, ticket: RevealTicket) -> Option<Phase> {
        if !self.is_current(ticket) || self.phase != Phase::Locked(ticket.stage) {
            return None;
        }
        let next = ticket.stage + 1;
        self.phase = if next < self.stages.len() {
            Phase::Pending(next)
        } else {
            log::info!("Sequence complete after {} stages", self.stages.len());
            Phase::Complete
        };
        Some(self.phase)
    }

    /// Chooses `option` on the current stage and resolves it immediately, skipping
    /// the reveal animation.
    pub fn advance(&mut self, option: usize) -> Result<Phase, Ignored> {
        let stage = match self.phase {
            Phase::Pending(i) => i,
            Phase::Revealing(_) => return Err(Ignored::AlreadyRevealing),
            Phase::Locked(_) => return Err(Ignored::StageLocked),
            Phase::Complete => return Err(Ignored::Complete),
        };
        let ticket = match self.choose(stage, option) {
            ChooseOutcome::Accepted { ticket, .. } => ticket,
            ChooseOutcome::Ignored(reason) => return Err(reason),
        };
        self.finish_reveal(ticket);
        self.finish_pause(ticket).ok_or(Ignored::StageLocked)
    }

    /// Clears every result, draws fresh offers and starts over. Outstanding
    /// tickets from the previous round become stale.
    pub fn restart(&mut self) -> u64 {
        self.generation += 1;
        self.pending = None;
        for stage in &mut self.stages {
            stage.chosen = None;
        }
        self.draw_offers();
        self.phase = Phase::Pending(0);
        log::info!("Sequence restarted (generation {})", self.generation);
        self.generation
    }

    /// Event announcing the options of `stage`.
    pub fn offer_event(&self, stage: usize) -> Option<SequenceEvent> {
        self.stages.get(stage).map(|s| SequenceEvent::StageOffered {
            stage,
            title: s.title.clone(),
            options: s.offered.clone(),
        })
    }

    /// Event for the current phase after a pause elapsed.
    pub fn progress_event(&self) -> Option<SequenceEvent> {
        match self.phase {
            Phase::Pending(stage) => self.offer_event(stage),
            Phase::Complete => self.results().map(|results| SequenceEvent::Completed {
                results: results.into_iter().cloned().collect(),
            }),
            _ => None,
        }
    }

    pub fn view(&self) -> SequenceView {
        SequenceView {
            phase: self.phase,
            generation: self.generation,
            stages: self
                .stages
                .iter()
                .map(|s| StageView {
                    title: s.title.clone(),
                    offered: s.offered.clone(),
                    chosen: s.chosen.clone(),
                })
                .collect(),
        }
    }
}
