//! Lesson service: the phase transition engine.
//!
//! Drives one tutoring unit through its learning and assignment phases.
//! Each turn is a single logical critical section per unit key: read state,
//! request a completion, parse signals, apply the transition rules, persist
//! once. Completion failures degrade to a fallback message with no state
//! mutation, so retrying a failed turn is always safe.

use crate::prompt::PromptRenderer;
use sensei_core::completion::{CompletionClient, PromptContext};
use sensei_core::error::Result;
use sensei_core::marker::parse_completion;
use sensei_core::phase::{SignalPolicy, apply_signals};
use sensei_core::session::{
    AssignmentCounts, ChatEntry, Phase, SessionPatch, SessionStore, UnitSession,
};
use sensei_core::unit::{UnitKey, UnitMetadata};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Returned to the learner when the completion capability is unavailable.
/// The turn is treated as not having happened.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I'm having trouble thinking right now. Your progress is safe - please try again in a moment.";

/// How many trailing chat log entries accompany each completion request.
const PROMPT_LOG_WINDOW: usize = 10;

/// Result of starting (or restarting) a unit.
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutput {
    pub message: String,
    pub phase: Phase,
    pub counts: AssignmentCounts,
}

/// Result of one conversational turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub message: String,
    pub phase: Phase,
    pub phase_changed: bool,
    pub counts: AssignmentCounts,
    pub unit_complete: bool,
}

/// A unit's persisted conversation and progress, without side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryOutput {
    pub history: Vec<ChatEntry>,
    pub phase: Phase,
    pub counts: AssignmentCounts,
}

/// The tutoring engine exposed to the surrounding API layer.
pub struct LessonService {
    store: Arc<dyn SessionStore>,
    completion: Arc<dyn CompletionClient>,
    prompts: PromptRenderer,
    policy: SignalPolicy,
    /// Per-unit-key critical sections; different keys proceed in parallel.
    locks: Mutex<HashMap<UnitKey, Arc<Mutex<()>>>>,
}

impl LessonService {
    /// Creates a service over the given store and completion backend.
    pub fn new(store: Arc<dyn SessionStore>, completion: Arc<dyn CompletionClient>) -> Result<Self> {
        Ok(Self {
            store,
            completion,
            prompts: PromptRenderer::new()?,
            policy: SignalPolicy::default(),
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a service with the default file store and the HTTP
    /// completion client configured from environment variables.
    pub async fn try_default() -> Result<Self> {
        let store = sensei_infrastructure::DirSessionStore::default_location().await?;
        let completion = sensei_interaction::ChatApiClient::try_from_env()?;
        Self::new(Arc::new(store), Arc::new(completion))
    }

    /// Overrides the signal application policy.
    pub fn with_policy(mut self, policy: SignalPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Starts (or restarts) a unit from scratch.
    ///
    /// Resets the stored state, then seeds the conversation with one opening
    /// tutor message. If the completion capability fails, the unit is still
    /// reset but no message is persisted and the fallback line is returned.
    pub async fn start_unit(&self, key: &UnitKey, metadata: &UnitMetadata) -> Result<StartOutput> {
        let lock = self.key_lock(key).await;
        let guard = lock.lock().await;
        let result = self.start_unit_locked(key, metadata).await;
        drop(guard);
        self.prune_key_lock(key, lock).await;
        result
    }

    async fn start_unit_locked(
        &self,
        key: &UnitKey,
        metadata: &UnitMetadata,
    ) -> Result<StartOutput> {
        let fresh = self.store.reset(key).await?;
        tracing::debug!(unit = %key, "unit reset for start");

        let system = self.prompts.render_opening(metadata)?;
        let ctx = PromptContext::new(system, Vec::new());

        let raw = match self.completion.complete(&ctx).await {
            Ok(raw) => raw,
            Err(e) if e.is_completion() => {
                tracing::warn!(unit = %key, error = %e, "opening completion failed");
                return Ok(StartOutput {
                    message: FALLBACK_MESSAGE.to_string(),
                    phase: fresh.phase,
                    counts: fresh.counts,
                });
            }
            Err(e) => return Err(e),
        };

        // Tokens in an opening message carry no meaning; strip them anyway.
        let parsed = parse_completion(&raw);
        let session = self
            .store
            .append_log(key, vec![ChatEntry::assistant(parsed.text.clone())])
            .await?;

        Ok(StartOutput {
            message: parsed.text,
            phase: session.phase,
            counts: session.counts,
        })
    }

    /// Runs one conversational turn for a unit.
    ///
    /// On completion failure the store is left byte-for-byte untouched and
    /// the learner receives [`FALLBACK_MESSAGE`]; phase and counts echo the
    /// pre-turn state.
    pub async fn turn(
        &self,
        key: &UnitKey,
        user_message: &str,
        metadata: &UnitMetadata,
    ) -> Result<TurnOutput> {
        let lock = self.key_lock(key).await;
        let guard = lock.lock().await;
        let result = self.turn_locked(key, user_message, metadata).await;
        drop(guard);
        self.prune_key_lock(key, lock).await;
        result
    }

    async fn turn_locked(
        &self,
        key: &UnitKey,
        user_message: &str,
        metadata: &UnitMetadata,
    ) -> Result<TurnOutput> {
        let session = self.store.read(key).await?;
        let user_entry = ChatEntry::user(user_message);

        let raw = match self.request_completion(&session, &user_entry, metadata).await {
            Ok(raw) => raw,
            Err(e) if e.is_completion() => {
                tracing::warn!(unit = %key, error = %e, "turn completion failed, no state mutated");
                return Ok(TurnOutput {
                    message: FALLBACK_MESSAGE.to_string(),
                    phase: session.phase,
                    phase_changed: false,
                    counts: session.counts,
                    unit_complete: false,
                });
            }
            Err(e) => return Err(e),
        };

        let parsed = parse_completion(&raw);
        let transition = apply_signals(session.phase, session.counts, &parsed.signals, &self.policy);

        if transition.phase_changed {
            tracing::info!(unit = %key, from = ?session.phase, to = ?transition.phase, "phase advanced");
        }

        // One persisted write per turn: phase, counts, and both log entries.
        let updated = self
            .store
            .write(
                key,
                SessionPatch::new()
                    .phase(transition.phase)
                    .counts(transition.counts)
                    .append([user_entry, ChatEntry::assistant(parsed.text.clone())]),
            )
            .await?;

        Ok(TurnOutput {
            message: parsed.text,
            phase: updated.phase,
            phase_changed: transition.phase_changed,
            counts: updated.counts,
            unit_complete: transition.unit_complete,
        })
    }

    /// Returns the persisted conversation and progress for a unit.
    ///
    /// Read-only: no lock, no completion call, no mutation.
    pub async fn history(&self, key: &UnitKey) -> Result<HistoryOutput> {
        let session = self.store.read(key).await?;
        Ok(HistoryOutput {
            history: session.chat_log,
            phase: session.phase,
            counts: session.counts,
        })
    }

    async fn request_completion(
        &self,
        session: &UnitSession,
        user_entry: &ChatEntry,
        metadata: &UnitMetadata,
    ) -> Result<String> {
        let system = self
            .prompts
            .render_phase(session.phase, metadata, &session.counts)?;

        let mut history: Vec<ChatEntry> = session.trailing_log(PROMPT_LOG_WINDOW).to_vec();
        history.push(user_entry.clone());

        self.completion
            .complete(&PromptContext::new(system, history))
            .await
    }

    async fn key_lock(&self, key: &UnitKey) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the caller's handle and evicts the map entry once nothing
    /// else holds or awaits this key's lock, so the map does not grow with
    /// every unit ever touched.
    async fn prune_key_lock(&self, key: &UnitKey, lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut locks = self.locks.lock().await;
        if locks
            .get(key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensei_core::session::MAX_CHAT_LOG;
    use sensei_infrastructure::DirSessionStore;
    use sensei_interaction::ScriptedClient;
    use tempfile::TempDir;

    struct Fixture {
        service: LessonService,
        store: Arc<DirSessionStore>,
        script: Arc<ScriptedClient>,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DirSessionStore::new(dir.path()).await.unwrap());
        let script = Arc::new(ScriptedClient::new());
        let service = LessonService::new(store.clone(), script.clone()).unwrap();
        Fixture {
            service,
            store,
            script,
            _dir: dir,
        }
    }

    fn key() -> UnitKey {
        UnitKey::new("student-1", "algebra", "linear-equations").unwrap()
    }

    fn metadata() -> UnitMetadata {
        UnitMetadata {
            concepts: vec!["slope".to_string()],
            goal: "Graph a line".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_unit_seeds_opening_message() {
        let f = fixture().await;
        f.script.push_text("Welcome! Let's talk about slope.").await;

        let out = f.service.start_unit(&key(), &metadata()).await.unwrap();

        assert_eq!(out.message, "Welcome! Let's talk about slope.");
        assert_eq!(out.phase, Phase::Learning);
        assert_eq!(out.counts, AssignmentCounts::default());

        let history = f.service.history(&key()).await.unwrap();
        assert_eq!(history.history.len(), 1);
        assert_eq!(history.history[0].role, sensei_core::session::ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_start_unit_resets_previous_progress() {
        let f = fixture().await;

        // Drive the unit into assignment phase with one completed item.
        f.script.push_text("LEARNING_PHASE_COMPLETE").await;
        f.service.turn(&key(), "ready", &metadata()).await.unwrap();
        f.script.push_text("ASSIGNMENT_COMPLETE").await;
        f.service.turn(&key(), "answer", &metadata()).await.unwrap();

        f.script.push_text("Fresh start!").await;
        let out = f.service.start_unit(&key(), &metadata()).await.unwrap();

        assert_eq!(out.phase, Phase::Learning);
        assert_eq!(out.counts, AssignmentCounts::default());
        let history = f.service.history(&key()).await.unwrap();
        assert_eq!(history.history.len(), 1);
    }

    #[tokio::test]
    async fn test_full_lesson_scenario() {
        let f = fixture().await;
        let key = key();
        let meta = metadata();

        // Fresh unit.
        f.script.push_text("Hello, let's begin.").await;
        let start = f.service.start_unit(&key, &meta).await.unwrap();
        assert_eq!(start.phase, Phase::Learning);
        assert_eq!(start.counts, AssignmentCounts { completed: 0, total: 0 });

        // Learning phase completes.
        f.script.push_text("Great job! LEARNING_PHASE_COMPLETE").await;
        let turn = f.service.turn(&key, "I understand slope now", &meta).await.unwrap();
        assert_eq!(turn.message, "Great job!");
        assert_eq!(turn.phase, Phase::Assignment);
        assert!(turn.phase_changed);

        // Four assignments in a row.
        for i in 1..=4u32 {
            f.script.push_text("Nice work. ASSIGNMENT_COMPLETE").await;
            let turn = f.service.turn(&key, "my answer", &meta).await.unwrap();
            assert_eq!(turn.message, "Nice work.");
            assert_eq!(turn.counts, AssignmentCounts { completed: i, total: i });
            assert!(!turn.phase_changed);
        }

        // Mastery.
        f.script.push_text("You've mastered this! SUBTOPIC_COMPLETE").await;
        let turn = f.service.turn(&key, "final answer", &meta).await.unwrap();
        assert!(turn.unit_complete);
        assert_eq!(turn.phase, Phase::Assignment);
        assert_eq!(turn.counts, AssignmentCounts { completed: 4, total: 4 });
    }

    #[tokio::test]
    async fn test_advance_token_is_noop_once_in_assignment() {
        let f = fixture().await;

        f.script.push_text("LEARNING_PHASE_COMPLETE").await;
        let first = f.service.turn(&key(), "ready", &metadata()).await.unwrap();
        assert!(first.phase_changed);

        f.script.push_text("again LEARNING_PHASE_COMPLETE").await;
        let second = f.service.turn(&key(), "hm", &metadata()).await.unwrap();
        assert!(!second.phase_changed);
        assert_eq!(second.phase, Phase::Assignment);
    }

    #[tokio::test]
    async fn test_failed_completion_mutates_nothing() {
        let f = fixture().await;
        let key = key();

        f.script.push_text("LEARNING_PHASE_COMPLETE").await;
        f.service.turn(&key, "ready", &metadata()).await.unwrap();
        let before = f.store.read(&key).await.unwrap();

        f.script.push_failure().await;
        let out = f.service.turn(&key, "lost message", &metadata()).await.unwrap();

        assert_eq!(out.message, FALLBACK_MESSAGE);
        assert!(!out.message.is_empty());
        assert_eq!(out.phase, before.phase);
        assert_eq!(out.counts, before.counts);
        assert!(!out.phase_changed);
        assert!(!out.unit_complete);

        // Byte-for-byte identical, including last_activity.
        let after = f.store.read(&key).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_turn_persists_both_log_entries_once() {
        let f = fixture().await;

        f.script.push_text("The slope is the steepness.").await;
        f.service.turn(&key(), "what is slope?", &metadata()).await.unwrap();

        let history = f.service.history(&key()).await.unwrap();
        assert_eq!(history.history.len(), 2);
        assert_eq!(history.history[0].content, "what is slope?");
        assert_eq!(history.history[1].content, "The slope is the steepness.");
    }

    #[tokio::test]
    async fn test_log_stays_bounded_over_long_conversations() {
        let f = fixture().await;

        for i in 0..40 {
            f.script.push_text(format!("reply {i}")).await;
            f.service
                .turn(&key(), &format!("message {i}"), &metadata())
                .await
                .unwrap();
        }

        let history = f.service.history(&key()).await.unwrap();
        assert_eq!(history.history.len(), MAX_CHAT_LOG);
        // 80 entries total; the most recent 50 survive in order.
        assert_eq!(history.history[0].content, "reply 14");
        assert_eq!(history.history[49].content, "reply 39");
    }

    #[tokio::test]
    async fn test_concurrent_turns_on_one_key_serialize() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(DirSessionStore::new(dir.path()).await.unwrap());
        let script = Arc::new(ScriptedClient::new());
        let service = Arc::new(LessonService::new(store.clone(), script.clone()).unwrap());
        let key = key();

        // Enter assignment phase first.
        script.push_text("LEARNING_PHASE_COMPLETE").await;
        service.turn(&key, "ready", &metadata()).await.unwrap();

        script.push_text("ASSIGNMENT_COMPLETE").await;
        script.push_text("ASSIGNMENT_COMPLETE").await;

        let (a, b) = tokio::join!(
            {
                let service = service.clone();
                let key = key.clone();
                async move { service.turn(&key, "answer one", &metadata()).await }
            },
            {
                let service = service.clone();
                let key = key.clone();
                async move { service.turn(&key, "answer two", &metadata()).await }
            },
        );
        a.unwrap();
        b.unwrap();

        // Neither increment was lost to a stale read.
        let session = store.read(&key).await.unwrap();
        assert_eq!(session.counts, AssignmentCounts { completed: 2, total: 2 });
        assert_eq!(session.chat_log.len(), 6);
    }

    #[tokio::test]
    async fn test_legacy_metadata_shape_reaches_the_prompt() {
        let f = fixture().await;
        let meta = UnitMetadata::from_value(serde_json::json!({
            "objective": "Understand slope",
            "assignments": ["Find the slope of y = 3x"],
        }));

        f.script.push_text("Let's practice.").await;
        let out = f.service.turn(&key(), "hello", &meta).await.unwrap();
        assert_eq!(out.message, "Let's practice.");
        assert_eq!(meta.goal, "Understand slope");
    }

    #[tokio::test]
    async fn test_key_locks_do_not_accumulate() {
        let f = fixture().await;

        for student in ["s1", "s2", "s3"] {
            let key = UnitKey::new(student, "algebra", "slope").unwrap();
            f.script.push_text("reply").await;
            f.service.turn(&key, "hello", &metadata()).await.unwrap();
        }

        assert!(f.service.locks.lock().await.is_empty());

        // Serialization still holds for turns that do overlap.
        let service = Arc::new(f.service);
        let key = key();
        f.script.push_text("LEARNING_PHASE_COMPLETE").await;
        service.turn(&key, "ready", &metadata()).await.unwrap();
        f.script.push_text("ASSIGNMENT_COMPLETE").await;
        f.script.push_text("ASSIGNMENT_COMPLETE").await;

        let (a, b) = tokio::join!(
            {
                let service = service.clone();
                let key = key.clone();
                async move { service.turn(&key, "one", &metadata()).await }
            },
            {
                let service = service.clone();
                let key = key.clone();
                async move { service.turn(&key, "two", &metadata()).await }
            },
        );
        a.unwrap();
        b.unwrap();

        let session = f.store.read(&key).await.unwrap();
        assert_eq!(session.counts, AssignmentCounts { completed: 2, total: 2 });
        assert!(service.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_history_of_fresh_unit_is_default() {
        let f = fixture().await;
        let out = f.service.history(&key()).await.unwrap();

        assert!(out.history.is_empty());
        assert_eq!(out.phase, Phase::Learning);
        assert_eq!(out.counts, AssignmentCounts::default());
    }

    #[tokio::test]
    async fn test_start_unit_fallback_still_resets() {
        let f = fixture().await;

        f.script.push_text("LEARNING_PHASE_COMPLETE").await;
        f.service.turn(&key(), "ready", &metadata()).await.unwrap();

        f.script.push_failure().await;
        let out = f.service.start_unit(&key(), &metadata()).await.unwrap();

        assert_eq!(out.message, FALLBACK_MESSAGE);
        assert_eq!(out.phase, Phase::Learning);

        // Unit was reset, but no opening message was persisted.
        let history = f.service.history(&key()).await.unwrap();
        assert!(history.history.is_empty());
        assert_eq!(history.phase, Phase::Learning);
    }
}
