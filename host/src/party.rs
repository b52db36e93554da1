use party_shared::constants::NO_CONTENT_MESSAGE;
use party_shared::preferences::PreferenceSheet;
use party_shared::shared_sequence::{ChooseOutcome, Ignored, Phase, Sequence, SequenceEvent};
use party_shared::{ContentDocument, Draw, Selector};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::commands::{Command, HELP};
use crate::config::HostConfig;
use crate::session::RevealSession;

pub enum Outcome {
    Reply(Vec<String>),
    Quit,
}

fn reply(line: impl Into<String>) -> Outcome {
    Outcome::Reply(vec![line.into()])
}

/// Everything one running host owns: content, selector, preferences and the active game.
pub struct Party {
    config: HostConfig,
    document: ContentDocument,
    selector: Selector,
    preferences: PreferenceSheet,
    session: Option<Arc<RevealSession>>,
    renderer: Option<JoinHandle<()>>,
}

impl Party {
    pub fn new(config: HostConfig, document: ContentDocument) -> Self {
        let selector = match config.seed {
            Some(seed) => Selector::with_seed(document.pools.clone(), seed),
            None => Selector::new(document.pools.clone()),
        };
        Self {
            config,
            document,
            selector,
            preferences: PreferenceSheet::new(),
            session: None,
            renderer: None,
        }
    }

    pub fn preferences(&self) -> &PreferenceSheet {
        &self.preferences
    }

    pub fn session(&self) -> Option<&Arc<RevealSession>> {
        self.session.as_ref()
    }

    pub async fn execute(&mut self, command: Command) -> Outcome {
        match command {
            Command::Help => reply(HELP),
            Command::Categories => self.categories(),
            Command::Draw(category) => self.draw(&category),
            Command::Play(name) => self.play(&name).await,
            Command::Pick(option) => self.pick(option).await,
            Command::Restart => match &self.session {
                Some(session) => {
                    session.restart().await;
                    Outcome::Reply(vec![])
                }
                None => reply("No game running. Use 'play <game>' first."),
            },
            Command::Status { json } => self.status(json).await,
            Command::Mark { tag, item } => {
                self.preferences.mark(item.clone(), tag);
                reply(format!("Tagged '{}' as {}", item, tag))
            }
            Command::Unmark(item) => match self.preferences.clear(&item) {
                Some(_) => reply(format!("Removed tag from '{}'", item)),
                None => reply(format!("'{}' has no tag", item)),
            },
            Command::Preferences => {
                if self.preferences.is_empty() {
                    return reply("No tags yet.");
                }
                Outcome::Reply(
                    self.preferences
                        .iter()
                        .map(|(item, tag)| format!("  {:<8} {}", tag.to_string(), item))
                        .collect(),
                )
            }
            Command::Export(path) => self.export(path).await,
            Command::Import(path) => self.import(path).await,
            Command::Quit => {
                if let Some(session) = self.session.take() {
                    session.stop().await;
                }
                self.stop_renderer();
                Outcome::Quit
            }
        }
    }

    fn categories(&self) -> Outcome {
        let mut lines = vec!["Categories:".to_string()];
        lines.extend(self.selector.categories().map(|category| {
            let size = self.selector.pool(category).map(|pool| pool.len()).unwrap_or(0);
            format!("  {} ({} cards)", category, size)
        }));
        lines.push("Games:".to_string());
        lines.extend(self.document.sequences.iter().map(|(name, stages)| {
            let titles: Vec<&str> = stages.iter().map(|stage| stage.title.as_str()).collect();
            format!("  {} ({})", name, titles.join(" → "))
        }));
        Outcome::Reply(lines)
    }

    fn draw(&mut self, category: &str) -> Outcome {
        let line = match self.selector.select(category) {
            Draw::Item { item, .. } => format!("🃏 {}", item),
            Draw::NoContent => NO_CONTENT_MESSAGE.to_string(),
        };
        let left = self.selector.remaining(category);
        Outcome::Reply(vec![line, format!("   ({} left before the pile reshuffles)", left)])
    }

    async fn play(&mut self, name: &str) -> Outcome {
        let stages = match self.document.sequences.get(name) {
            Some(stages) => stages,
            None => return reply(format!("Unknown game '{}'. Type 'categories' to list games.", name)),
        };

        let built = match self.config.seed {
            Some(seed) => Sequence::with_seed(stages, &self.document.pools, self.config.offer_count, seed),
            None => Sequence::with_offer_count(stages, &self.document.pools, self.config.offer_count),
        };
        let sequence = match built {
            Ok(sequence) => sequence,
            Err(e) => {
                warn!("Cannot start '{}': {}", name, e);
                return reply(format!("Cannot start '{}': {}", name, e));
            }
        };

        if let Some(previous) = self.session.take() {
            previous.stop().await;
        }
        self.stop_renderer();
        let session = Arc::new(RevealSession::new(name, sequence, self.config.timing));
        self.renderer = Some(tokio::spawn(render(session.subscribe())));
        session.start().await;
        info!("Started game '{}'", name);
        self.session = Some(session);
        Outcome::Reply(vec![])
    }

    async fn pick(&mut self, option: usize) -> Outcome {
        let session = match &self.session {
            Some(session) => session,
            None => return reply("No game running. Use 'play <game>' first."),
        };
        match session.pick(option).await {
            ChooseOutcome::Accepted { .. } => Outcome::Reply(vec![]),
            ChooseOutcome::Ignored(reason) => reply(ignored_message(reason)),
        }
    }

    async fn status(&self, json: bool) -> Outcome {
        let session = match &self.session {
            Some(session) => session,
            None => return reply("No game running."),
        };
        let view = session.view().await;
        if json {
            return match serde_json::to_string_pretty(&view) {
                Ok(text) => reply(text),
                Err(e) => reply(format!("❌ Could not encode status: {}", e)),
            };
        }
        let mut lines = vec![format!("{}: {}", session.name(), describe_phase(view.phase))];
        for (i, stage) in view.stages.iter().enumerate() {
            let chosen = stage
                .chosen
                .as_ref()
                .map(|item| item.to_string())
                .unwrap_or_else(|| "…".to_string());
            lines.push(format!("  {}. {}: {}", i + 1, stage.title, chosen));
        }
        if let Some(results) = session.results().await {
            let titles: Vec<&str> = results.iter().map(|item| item.title()).collect();
            lines.push(format!("Result: {}", titles.join(" + ")));
        }
        Outcome::Reply(lines)
    }

    async fn export(&self, path: Option<String>) -> Outcome {
        let path = path.map(PathBuf::from).unwrap_or_else(|| self.config.preferences_path.clone());
        let json = match self.preferences.to_json() {
            Ok(json) => json,
            Err(e) => return reply(format!("❌ Export failed: {}", e)),
        };
        match tokio::fs::write(&path, json).await {
            Ok(()) => {
                info!("Exported {} preferences to {}", self.preferences.len(), path.display());
                reply(format!("✅ Saved {} tags to {}", self.preferences.len(), path.display()))
            }
            Err(e) => {
                warn!("Export to {} failed: {}", path.display(), e);
                reply(format!("❌ Export failed: {}", e))
            }
        }
    }

    async fn import(&mut self, path: Option<String>) -> Outcome {
        let path = path.map(PathBuf::from).unwrap_or_else(|| self.config.preferences_path.clone());
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => return reply(format!("❌ Import failed: {}", e)),
        };
        match self.preferences.import_json(&text) {
            Ok(count) => reply(format!("✅ Loaded {} tags from {}", count, path.display())),
            Err(e) => {
                warn!("Rejected import from {}: {}", path.display(), e);
                reply(format!("❌ Import failed: {}", e))
            }
        }
    }

    fn stop_renderer(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.abort();
        }
    }
}

pub fn ignored_message(reason: Ignored) -> &'static str {
    match reason {
        Ignored::WrongStage => "That stage is not open yet.",
        Ignored::AlreadyRevealing => "Hold on, the last pick is still being revealed.",
        Ignored::StageLocked => "That stage is already locked in.",
        Ignored::Complete => "This round is over. Type 'restart' to play again.",
        Ignored::NoSuchOption => "There is no option with that number.",
    }
}

fn describe_phase(phase: Phase) -> String {
    match phase {
        Phase::Pending(i) => format!("waiting for a pick on stage {}", i + 1),
        Phase::Revealing(i) => format!("revealing stage {}", i + 1),
        Phase::Locked(i) => format!("stage {} locked", i + 1),
        Phase::Complete => "complete".to_string(),
    }
}

pub fn render_event(event: &SequenceEvent) -> Vec<String> {
    match event {
        SequenceEvent::StageOffered { stage, title, options } => {
            let mut lines = vec![format!("▶ Stage {}: {}", stage + 1, title)];
            lines.extend(
                options
                    .iter()
                    .enumerate()
                    .map(|(i, option)| format!("  [{}] {}", i + 1, option.title())),
            );
            lines
        }
        SequenceEvent::Revealing { item, .. } => vec![format!("✨ Revealing {} ...", item.title())],
        SequenceEvent::StageLocked { stage, item } => {
            vec![format!("🔒 Stage {} locked: {}", stage + 1, item)]
        }
        SequenceEvent::Completed { results } => {
            let mut lines = vec!["🎉 Result:".to_string()];
            lines.extend(results.iter().map(|item| format!("  • {}", item)));
            lines
        }
        SequenceEvent::Restarted { .. } => vec!["🔁 New round!".to_string()],
    }
}

async fn render(mut events: broadcast::Receiver<SequenceEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                for line in render_event(&event) {
                    println!("{}", line);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Renderer skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::parse;
    use party_shared::constants::FALLBACK_ITEM_TEXT;
    use party_shared::preferences::PreferenceTag;
    use std::time::Duration;

    fn party() -> Party {
        let config = HostConfig { seed: Some(3), ..HostConfig::default() };
        Party::new(config, ContentDocument::fallback())
    }

    async fn run(party: &mut Party, line: &str) -> Vec<String> {
        let command = parse(line).unwrap().unwrap();
        match party.execute(command).await {
            Outcome::Reply(lines) => lines,
            Outcome::Quit => vec!["<quit>".to_string()],
        }
    }

    #[tokio::test]
    async fn test_draw_from_fallback_and_missing_category() {
        let mut party = party();
        let lines = run(&mut party, "draw default").await;
        assert!(lines[0].contains(FALLBACK_ITEM_TEXT));
        let lines = run(&mut party, "draw nothing").await;
        assert_eq!(lines[0], NO_CONTENT_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_fallback_game_to_completion() {
        let mut party = party();
        assert!(run(&mut party, "pick 1").await[0].contains("No game running"));

        run(&mut party, "play default").await;
        assert!(run(&mut party, "pick 1").await.is_empty());
        assert_eq!(
            run(&mut party, "pick 1").await,
            vec![ignored_message(Ignored::AlreadyRevealing).to_string()]
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        let session = party.session().unwrap();
        assert_eq!(session.phase().await, Phase::Complete);
        assert!(run(&mut party, "status").await[0].contains("complete"));

        run(&mut party, "restart").await;
        assert_eq!(party.session().unwrap().phase().await, Phase::Pending(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_json_serializes_view() {
        let mut party = party();
        run(&mut party, "play default").await;
        let lines = run(&mut party, "status --json").await;
        let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert!(value.get("phase").is_some());
        assert_eq!(value["stages"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_replaying_stops_previous_timers() {
        let mut party = party();
        run(&mut party, "play default").await;
        run(&mut party, "pick 1").await;
        let previous = Arc::clone(party.session().unwrap());

        run(&mut party, "play default").await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(previous.phase().await, Phase::Revealing(0));
        assert_eq!(party.session().unwrap().phase().await, Phase::Pending(0));
    }

    #[tokio::test]
    async fn test_unknown_game() {
        let mut party = party();
        assert!(run(&mut party, "play roulette").await[0].contains("Unknown game"));
    }

    #[tokio::test]
    async fn test_export_then_import_round_trip() {
        let path = std::env::temp_dir().join(format!("party-prefs-{}.json", std::process::id()));
        let path_arg = path.display().to_string();

        let mut party = party();
        run(&mut party, "mark favorite Blindfold").await;
        run(&mut party, "mark no Ice cube").await;
        assert!(run(&mut party, &format!("export {}", path_arg)).await[0].starts_with("✅"));

        let mut other = self::party();
        assert!(run(&mut other, &format!("import {}", path_arg)).await[0].starts_with("✅"));
        assert_eq!(other.preferences().get("Blindfold"), Some(PreferenceTag::Favorite));
        assert_eq!(other.preferences().get("Ice cube"), Some(PreferenceTag::No));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_bad_import_leaves_tags_alone() {
        let path = std::env::temp_dir().join(format!("party-bad-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"tags": {"Feather": "like"}}"#).unwrap();

        let mut party = party();
        run(&mut party, "mark maybe Feather").await;
        let lines = run(&mut party, &format!("import {}", path.display())).await;
        assert!(lines[0].starts_with("❌"));
        assert_eq!(party.preferences().get("Feather"), Some(PreferenceTag::Maybe));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_render_completed() {
        let event = SequenceEvent::Completed {
            results: vec![
                party_shared::ContentItem::text("Neck"),
                party_shared::ContentItem::text("Gentle"),
            ],
        };
        assert_eq!(render_event(&event), vec!["🎉 Result:", "  • Neck", "  • Gentle"]);
    }
}
