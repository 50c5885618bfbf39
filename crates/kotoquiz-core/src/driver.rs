//! Async session driver.
//!
//! Owns the event loop around a [`QuizSession`]: spawns question bank loads,
//! ticks the session clock once a second, holds feedback on screen for a short
//! delay after each answer, and reacts to player input. The clock and any
//! pending delay belong to the loop, so ending or restarting a session drops
//! them all at once.
//!
//! Loads run as detached tasks tagged with a token. Restarting issues a new
//! token; a load that finishes under an old token is discarded.

use std::future::pending;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use tokio::sync::mpsc;
use tokio::time::{interval_at, sleep, Instant, Interval, Sleep};
use uuid::Uuid;

use crate::bank::{QuestionBank, DEFAULT_SESSION_LENGTH};
use crate::distractor::{DistractorSelector, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW};
use crate::error::QuizError;
use crate::ledger::{CurrencyLedger, DEFAULT_GOLD_CAP};
use crate::model::{DifficultySpec, LevelTable, Question};
use crate::save::SaveStore;
use crate::session::{format_clock, Phase, QuizSession, SessionSummary};
use crate::store::ProfileStore;
use crate::traits::{Presenter, QuestionSource};

/// Tunable game parameters.
#[derive(Debug, Clone)]
pub struct GameRules {
    /// Questions per session.
    pub session_length: usize,
    /// Upper bound of the gold balance.
    pub gold_cap: u32,
    /// Distractor window on each side of the current question.
    pub distractor_window: usize,
    /// Resamples before accepting overlapping options.
    pub distractor_attempts: usize,
    /// Partitions per level tag.
    pub levels: LevelTable,
    /// How long answer feedback stays up before the next step.
    pub feedback_delay: Duration,
    /// Session clock resolution.
    pub tick_interval: Duration,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            session_length: DEFAULT_SESSION_LENGTH,
            gold_cap: DEFAULT_GOLD_CAP,
            distractor_window: DEFAULT_WINDOW,
            distractor_attempts: DEFAULT_MAX_ATTEMPTS,
            levels: LevelTable::default(),
            feedback_delay: Duration::from_millis(500),
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Input from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInput {
    /// Pick the option at this index.
    Choose(usize),
    /// Abandon the current session and start over on the same difficulty.
    Restart,
    /// Abandon the current session and stop.
    Quit,
}

/// How a call to [`SessionDriver::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionReport {
    Completed(SessionSummary),
    Abandoned,
}

struct LoadResult {
    token: Uuid,
    result: Result<Vec<Question>, QuizError>,
}

/// Runs quiz sessions against a question source, ledger, and save store.
pub struct SessionDriver {
    bank: QuestionBank,
    ledger: CurrencyLedger,
    saves: SaveStore,
    presenter: Arc<dyn Presenter>,
    rules: GameRules,
    rng: ChaCha20Rng,
}

impl SessionDriver {
    pub fn new(
        source: Arc<dyn QuestionSource>,
        store: ProfileStore,
        presenter: Arc<dyn Presenter>,
        rules: GameRules,
    ) -> Self {
        let bank = QuestionBank::new(source)
            .with_levels(rules.levels.clone())
            .with_session_length(rules.session_length);
        Self {
            bank,
            ledger: CurrencyLedger::load(store.clone(), rules.gold_cap),
            saves: SaveStore::new(store),
            presenter,
            rules,
            rng: ChaCha20Rng::seed_from_u64(rand::random()),
        }
    }

    /// Make every random choice reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
        self
    }

    pub fn ledger(&self) -> &CurrencyLedger {
        &self.ledger
    }

    pub fn saves(&self) -> &SaveStore {
        &self.saves
    }

    /// Play one session of `spec`, reading player input from `inputs`.
    ///
    /// Returns when the session completes, or when the player quits (or the
    /// input channel closes). A failed load is reported to the presenter and
    /// returned as an error; no session is started.
    pub async fn run(
        &mut self,
        spec: &DifficultySpec,
        inputs: &mut mpsc::Receiver<PlayerInput>,
    ) -> Result<SessionReport, QuizError> {
        let (load_tx, mut load_rx) = mpsc::channel::<LoadResult>(4);
        let mut load_token = self.request_load(spec, &load_tx);

        let mut session: Option<QuizSession> = None;
        let mut ticker: Option<Interval> = None;
        let mut feedback: Option<Pin<Box<Sleep>>> = None;

        loop {
            if let Some(active) = session.as_mut() {
                if active.phase() == Phase::AwaitingQuestion {
                    let presented = active.present(&mut self.rng)?;
                    self.presenter.on_question(&presented);
                }
            }

            tokio::select! {
                Some(loaded) = load_rx.recv() => {
                    if loaded.token != load_token {
                        tracing::debug!(token = %loaded.token, "discarding stale question bank load");
                        continue;
                    }
                    match loaded.result {
                        Ok(questions) => {
                            let selector = DistractorSelector::new(
                                self.rules.distractor_window,
                                self.rules.distractor_attempts,
                            );
                            let started = QuizSession::with_selector(questions, selector)?;
                            tracing::info!(session = %started.id(), difficulty = %spec, "session started");
                            session = Some(started);
                            ticker = Some(self.start_clock());
                            self.presenter.on_timer(0, &format_clock(0));
                            self.presenter.on_gold(self.ledger.get(), 0);
                        }
                        Err(e) => {
                            self.presenter.on_load_failed(&e);
                            return Err(e);
                        }
                    }
                }

                _ = next_tick(&mut ticker) => {
                    if let Some(seconds) = session.as_mut().and_then(QuizSession::tick) {
                        self.presenter.on_timer(seconds, &format_clock(seconds));
                    }
                }

                _ = delay_elapsed(&mut feedback) => {
                    feedback = None;
                    let Some(active) = session.as_mut() else { continue };
                    if active.advance()? == Phase::Complete {
                        let summary = active.finish(&mut self.ledger, &self.saves)?;
                        self.presenter.on_gold(summary.balance, summary.reward.bonus_gold);
                        self.presenter.on_summary(&summary);
                        return Ok(SessionReport::Completed(summary));
                    }
                }

                input = inputs.recv() => match input {
                    Some(PlayerInput::Choose(choice)) => {
                        let Some(active) = session.as_mut() else {
                            tracing::debug!(choice, "ignoring answer while loading");
                            continue;
                        };
                        if active.phase() != Phase::AwaitingAnswer {
                            tracing::debug!(choice, "ignoring answer while options are disabled");
                            continue;
                        }
                        match active.submit(choice, &mut self.ledger) {
                            Ok(outcome) => {
                                self.presenter.on_answer(&outcome);
                                if outcome.gold_awarded > 0 {
                                    self.presenter.on_gold(outcome.balance, outcome.gold_awarded);
                                }
                                feedback = Some(Box::pin(sleep(self.rules.feedback_delay)));
                            }
                            Err(QuizError::InvalidChoice { choice, available }) => {
                                tracing::debug!(choice, available, "ignoring out-of-range answer");
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Some(PlayerInput::Restart) => {
                        self.abandon(session.take());
                        ticker = None;
                        feedback = None;
                        load_token = self.request_load(spec, &load_tx);
                        self.presenter.on_timer(0, &format_clock(0));
                    }
                    Some(PlayerInput::Quit) | None => {
                        self.abandon(session.take());
                        return Ok(SessionReport::Abandoned);
                    }
                },
            }
        }
    }

    /// Spawn a bank load and return the token its result will carry.
    fn request_load(&mut self, spec: &DifficultySpec, tx: &mpsc::Sender<LoadResult>) -> Uuid {
        let token = Uuid::new_v4();
        tracing::debug!(%token, difficulty = %spec, "question bank load requested");

        let bank = self.bank.clone();
        let wanted = spec.clone();
        let tx = tx.clone();
        let mut rng = ChaCha20Rng::seed_from_u64(self.rng.gen());

        tokio::spawn(async move {
            let result = bank.load(&wanted, &mut rng).await;
            // The driver may have moved on; a closed channel is fine.
            let _ = tx.send(LoadResult { token, result }).await;
        });

        token
    }

    fn start_clock(&self) -> Interval {
        let period = self.rules.tick_interval;
        interval_at(Instant::now() + period, period)
    }

    fn abandon(&mut self, session: Option<QuizSession>) {
        let Some(session) = session else { return };
        if session.has_answers() && !session.is_complete() {
            tracing::info!(session = %session.id(), "session abandoned");
            self.saves.record_abandoned();
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => pending().await,
    }
}

async fn delay_elapsed(delay: &mut Option<Pin<Box<Sleep>>>) {
    match delay {
        Some(sleep) => sleep.as_mut().await,
        None => pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::SourceError;
    use crate::model::PartitionRef;
    use crate::reward::RewardTier;
    use crate::session::{AnswerOutcome, PresentedQuestion};
    use crate::store::MemoryStore;

    fn questions(prefix: &str, count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| Question::new(&format!("{prefix}{i}"), "よみ", &format!("yomi{i}"), "意", "meaning"))
            .collect()
    }

    /// Serves a fixed pool; the first fetch can be held back.
    struct ScriptedSource {
        first: Vec<Question>,
        rest: Vec<Question>,
        first_delay: Duration,
        calls: AtomicU32,
    }

    #[async_trait]
    impl QuestionSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch(&self, _: &PartitionRef) -> Result<Vec<Question>, SourceError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                sleep(self.first_delay).await;
                Ok(self.first.clone())
            } else {
                Ok(self.rest.clone())
            }
        }
    }

    struct EmptySource;

    #[async_trait]
    impl QuestionSource for EmptySource {
        fn name(&self) -> &str {
            "empty"
        }

        async fn fetch(&self, partition: &PartitionRef) -> Result<Vec<Question>, SourceError> {
            Err(SourceError::NotFound(partition.path()))
        }
    }

    /// Plays along: answers each question as scripted and records what it saw.
    struct ScriptedPlayer {
        tx: mpsc::Sender<PlayerInput>,
        miss_first_attempt: bool,
        restart_on_question: Mutex<Option<usize>>,
        seen: Mutex<Vec<PresentedQuestion>>,
        answers: Mutex<Vec<AnswerOutcome>>,
        load_failures: AtomicU32,
    }

    impl ScriptedPlayer {
        fn new(tx: mpsc::Sender<PlayerInput>) -> Self {
            Self {
                tx,
                miss_first_attempt: false,
                restart_on_question: Mutex::new(None),
                seen: Mutex::new(Vec::new()),
                answers: Mutex::new(Vec::new()),
                load_failures: AtomicU32::new(0),
            }
        }
    }

    impl Presenter for ScriptedPlayer {
        fn on_question(&self, question: &PresentedQuestion) {
            self.seen.lock().unwrap().push(question.clone());
            let restart = {
                let mut slot = self.restart_on_question.lock().unwrap();
                if *slot == Some(question.index) {
                    slot.take();
                    true
                } else {
                    false
                }
            };
            let input = if restart {
                PlayerInput::Restart
            } else if self.miss_first_attempt && !question.retry && question.options.len() > 1 {
                PlayerInput::Choose((question.options.correct_index + 1) % question.options.len())
            } else {
                PlayerInput::Choose(question.options.correct_index)
            };
            self.tx.try_send(input).unwrap();
        }

        fn on_answer(&self, outcome: &AnswerOutcome) {
            self.answers.lock().unwrap().push(*outcome);
        }

        fn on_gold(&self, _: u32, _: u32) {}
        fn on_timer(&self, _: u32, _: &str) {}
        fn on_summary(&self, _: &SessionSummary) {}

        fn on_load_failed(&self, _: &QuizError) {
            self.load_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn driver_with(
        source: Arc<dyn QuestionSource>,
        player: Arc<ScriptedPlayer>,
    ) -> (Arc<MemoryStore>, SessionDriver) {
        let backing = Arc::new(MemoryStore::new());
        let store = ProfileStore::new(backing.clone(), "driver");
        let driver = SessionDriver::new(source, store, player, GameRules::default()).with_seed(42);
        (backing, driver)
    }

    fn scripted(first: Vec<Question>, rest: Vec<Question>, first_delay: Duration) -> Arc<ScriptedSource> {
        Arc::new(ScriptedSource {
            first,
            rest,
            first_delay,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn perfect_session_completes_with_elite_reward() {
        let (tx, mut rx) = mpsc::channel(8);
        let player = Arc::new(ScriptedPlayer::new(tx));
        let source = scripted(questions("q", 40), questions("q", 40), Duration::ZERO);
        let (_, mut driver) = driver_with(source, player.clone());

        let spec: DifficultySpec = "n3".parse().unwrap();
        let report = driver.run(&spec, &mut rx).await.unwrap();

        let SessionReport::Completed(summary) = report else {
            panic!("expected completion, got {report:?}");
        };
        assert_eq!(summary.question_count, 20);
        assert_eq!(summary.correct_count, 20);
        // 20 answers x 500ms feedback.
        assert!(summary.elapsed_seconds <= 11, "elapsed {}", summary.elapsed_seconds);
        assert_eq!(summary.reward.tier, RewardTier::Elite);
        assert_eq!(summary.reward.bonus_gold, 40);
        assert_eq!(driver.ledger().get(), 60);

        let saved = driver.saves().load();
        assert_eq!(saved.win_count, 1);
        assert_eq!(saved.learned_words.len(), 20);
        assert_eq!(saved.fastest_record, summary.elapsed_seconds);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_first_attempts_earn_nothing() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut player = ScriptedPlayer::new(tx);
        player.miss_first_attempt = true;
        let player = Arc::new(player);
        let source = scripted(questions("w", 20), questions("w", 20), Duration::ZERO);
        let (_, mut driver) = driver_with(source, player.clone());

        let spec: DifficultySpec = "n2".parse().unwrap();
        let report = driver.run(&spec, &mut rx).await.unwrap();
        let SessionReport::Completed(summary) = report else {
            panic!("expected completion");
        };

        assert_eq!(summary.correct_count, 0);
        assert_eq!(summary.reward.final_gold, 0);
        assert_eq!(driver.ledger().get(), 0);
        assert_eq!(player.answers.lock().unwrap().len(), 40);
        assert!(driver.saves().load().learned_words.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_bank_reports_load_failure() {
        let (tx, mut rx) = mpsc::channel(8);
        let player = Arc::new(ScriptedPlayer::new(tx));
        let (_, mut driver) = driver_with(Arc::new(EmptySource), player.clone());

        let spec: DifficultySpec = "n1".parse().unwrap();
        let err = driver.run(&spec, &mut rx).await.unwrap_err();
        assert!(matches!(err, QuizError::BankUnavailable(_)));
        assert_eq!(player.load_failures.load(Ordering::SeqCst), 1);
        assert!(player.seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_mid_session_discards_tallies_and_counts_loss() {
        let (tx, mut rx) = mpsc::channel(8);
        let player = ScriptedPlayer::new(tx);
        *player.restart_on_question.lock().unwrap() = Some(3);
        let player = Arc::new(player);
        let source = scripted(questions("r", 20), questions("r", 20), Duration::ZERO);
        let (_, mut driver) = driver_with(source, player.clone());

        let spec: DifficultySpec = "n3".parse().unwrap();
        let report = driver.run(&spec, &mut rx).await.unwrap();
        let SessionReport::Completed(summary) = report else {
            panic!("expected completion");
        };

        assert_eq!(summary.correct_count, 20);
        // Three gold from the abandoned run, 20 + 40 from the finished one.
        assert_eq!(driver.ledger().get(), 63);
        let saved = driver.saves().load();
        assert_eq!(saved.lose_count, 1);
        assert_eq!(saved.win_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_load_is_discarded_after_restart() {
        let (tx, mut rx) = mpsc::channel(8);
        let player = Arc::new(ScriptedPlayer::new(tx.clone()));
        let source = scripted(
            questions("stale", 20),
            questions("fresh", 20),
            Duration::from_secs(5),
        );
        let (_, mut driver) = driver_with(source, player.clone());

        // Restart before the slow first load can finish.
        tx.try_send(PlayerInput::Restart).unwrap();

        let spec: DifficultySpec = "n3".parse().unwrap();
        let report = driver.run(&spec, &mut rx).await.unwrap();
        assert!(matches!(report, SessionReport::Completed(_)));

        let seen = player.seen.lock().unwrap();
        assert_eq!(seen.len(), 20);
        for question in seen.iter() {
            let correct = &question.options.options[question.options.correct_index];
            assert!(correct.kanji.starts_with("fresh"), "saw {}", correct.kanji);
        }
        assert_eq!(driver.saves().load().lose_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn quit_before_answering_is_not_a_loss() {
        let (tx, mut rx) = mpsc::channel(8);
        let player = Arc::new(ScriptedPlayer::new(tx.clone()));
        let source = scripted(questions("q", 5), questions("q", 5), Duration::from_secs(1));
        let (_, mut driver) = driver_with(source, player);

        tx.try_send(PlayerInput::Quit).unwrap();
        let spec: DifficultySpec = "n3".parse().unwrap();
        let report = driver.run(&spec, &mut rx).await.unwrap();
        assert_eq!(report, SessionReport::Abandoned);
        assert_eq!(driver.saves().load().lose_count, 0);
    }
}
