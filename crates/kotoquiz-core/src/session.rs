//! The quiz session state machine.
//!
//! ```text
//! AwaitingQuestion --present--> AwaitingAnswer --submit--> Feedback
//!        ^                                                   |
//!        +------------------- advance -----------------------+--> Complete
//! ```
//!
//! A wrong answer leads back to `AwaitingQuestion` on the same index with the
//! same options; a correct one moves to the next index, or to `Complete` after
//! the last question. The session is pure state: timing and delays are driven
//! from outside (see [`crate::driver`]).

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::distractor::DistractorSelector;
use crate::error::QuizError;
use crate::ledger::CurrencyLedger;
use crate::model::{display_text, OptionSet, Question};
use crate::reward::{calculate_reward, Reward};
use crate::save::{SaveStore, SessionStats};

/// Gold paid immediately for a first-try-correct answer.
pub const GOLD_PER_CORRECT: u32 = 1;

/// Where the session is in its question/answer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingQuestion,
    AwaitingAnswer,
    Feedback { correct: bool },
    Complete,
}

impl Phase {
    fn describe(self) -> &'static str {
        match self {
            Phase::AwaitingQuestion => "awaiting a question",
            Phase::AwaitingAnswer => "awaiting an answer",
            Phase::Feedback { .. } => "showing feedback",
            Phase::Complete => "complete",
        }
    }
}

/// Everything the presentation layer needs to show one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentedQuestion {
    /// Zero-based position in the session.
    pub index: usize,
    /// Questions in the session.
    pub total: usize,
    /// One Chinese synonym, or a single space.
    pub prompt: String,
    /// English gloss, or a single space.
    pub english: String,
    pub options: OptionSet,
    /// Whether this is a retry after a wrong answer.
    pub retry: bool,
}

impl PresentedQuestion {
    /// `"3/20"`-style progress text.
    pub fn progress_label(&self) -> String {
        format!("{}/{}", self.index + 1, self.total)
    }
}

/// Result of one answer submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub index: usize,
    pub choice: usize,
    pub correct: bool,
    pub correct_index: usize,
    /// Whether this answer counted toward the score.
    pub counted: bool,
    /// Gold actually credited by this answer.
    pub gold_awarded: u32,
    /// Balance after the answer.
    pub balance: u32,
}

/// End-of-session results, produced once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub reward: Reward,
    pub elapsed_seconds: u32,
    pub correct_count: u32,
    pub question_count: u32,
    /// Balance after the bonus was credited.
    pub balance: u32,
}

impl SessionSummary {
    pub fn total_gold(&self) -> u32 {
        self.reward.base_gold + self.reward.bonus_gold
    }

    pub fn clock(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

/// Format seconds as zero-padded `mm:ss`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One run through a fixed list of questions.
pub struct QuizSession {
    id: Uuid,
    questions: Vec<Question>,
    current_index: usize,
    elapsed_seconds: u32,
    correct_count: u32,
    has_tried_wrong_on_current: bool,
    selector: DistractorSelector,
    current: Option<PresentedQuestion>,
    phase: Phase,
    answered_any: bool,
    reward_issued: bool,
}

impl QuizSession {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        Self::with_selector(questions, DistractorSelector::default())
    }

    pub fn with_selector(
        mut questions: Vec<Question>,
        selector: DistractorSelector,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::EmptySession);
        }
        for q in &mut questions {
            q.answered_correctly = None;
        }
        Ok(Self {
            id: Uuid::new_v4(),
            questions,
            current_index: 0,
            elapsed_seconds: 0,
            correct_count: 0,
            has_tried_wrong_on_current: false,
            selector,
            current: None,
            phase: Phase::AwaitingQuestion,
            answered_any: false,
            reward_issued: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn has_tried_wrong_on_current(&self) -> bool {
        self.has_tried_wrong_on_current
    }

    /// Whether any answer has been submitted in this session.
    pub fn has_answers(&self) -> bool {
        self.answered_any
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Advance the clock by one second. No effect once complete.
    pub fn tick(&mut self) -> Option<u32> {
        if self.is_complete() {
            return None;
        }
        self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
        Some(self.elapsed_seconds)
    }

    /// Show the current question and start accepting an answer.
    ///
    /// After a wrong answer the same prompt and options are shown again.
    pub fn present<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<PresentedQuestion, QuizError> {
        self.expect_phase(Phase::AwaitingQuestion, "present a question")?;

        if let Some(current) = &mut self.current {
            current.retry = true;
            let again = current.clone();
            self.phase = Phase::AwaitingAnswer;
            return Ok(again);
        }

        let index = self.current_index;
        let selection = self
            .selector
            .select(&self.questions, index, rng)
            .ok_or(QuizError::EmptySession)?;

        let question = &self.questions[index];
        let prompt = question
            .chinese_synonyms()
            .choose(rng)
            .map(|s| s.to_string())
            .unwrap_or_else(|| " ".to_string());

        let presented = PresentedQuestion {
            index,
            total: self.questions.len(),
            prompt,
            english: display_text(&question.english),
            options: selection.options,
            retry: false,
        };

        tracing::debug!(index, attempts = selection.attempts, "question presented");
        self.current = Some(presented.clone());
        self.phase = Phase::AwaitingAnswer;
        Ok(presented)
    }

    /// Score `choice` against the current question.
    pub fn submit(
        &mut self,
        choice: usize,
        ledger: &mut CurrencyLedger,
    ) -> Result<AnswerOutcome, QuizError> {
        self.expect_phase(Phase::AwaitingAnswer, "submit an answer")?;
        let Some(current) = &self.current else {
            return Err(QuizError::InvalidPhase {
                action: "submit an answer",
                phase: "awaiting a question",
            });
        };

        let available = current.options.len();
        if choice >= available {
            return Err(QuizError::InvalidChoice { choice, available });
        }
        let correct_index = current.options.correct_index;
        let correct = choice == correct_index;
        let index = self.current_index;

        let question = &mut self.questions[index];
        if question.answered_correctly.is_none() {
            question.answered_correctly = Some(correct);
        }
        self.answered_any = true;

        let counted = correct && !self.has_tried_wrong_on_current;
        let before = ledger.get();
        if counted {
            self.correct_count += 1;
            ledger.add(GOLD_PER_CORRECT);
        } else if !correct {
            self.has_tried_wrong_on_current = true;
        }
        let balance = ledger.get();

        self.phase = Phase::Feedback { correct };
        tracing::debug!(index, choice, correct, counted, "answer submitted");

        Ok(AnswerOutcome {
            index,
            choice,
            correct,
            correct_index,
            counted,
            gold_awarded: balance - before,
            balance,
        })
    }

    /// Leave the feedback phase: next question, retry, or completion.
    pub fn advance(&mut self) -> Result<Phase, QuizError> {
        let Phase::Feedback { correct } = self.phase else {
            return Err(QuizError::InvalidPhase {
                action: "advance",
                phase: self.phase.describe(),
            });
        };

        if correct {
            self.current_index += 1;
            self.has_tried_wrong_on_current = false;
            self.current = None;
            self.phase = if self.current_index >= self.questions.len() {
                tracing::info!(
                    session = %self.id,
                    elapsed = self.elapsed_seconds,
                    correct = self.correct_count,
                    "session complete"
                );
                Phase::Complete
            } else {
                Phase::AwaitingQuestion
            };
        } else {
            self.phase = Phase::AwaitingQuestion;
        }

        Ok(self.phase)
    }

    /// Statistics recorded in the save data.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            elapsed_seconds: self.elapsed_seconds,
            correct_count: self.correct_count,
            question_count: self.questions.len() as u32,
            learned: self
                .questions
                .iter()
                .filter(|q| q.answered_correctly == Some(true))
                .map(|q| q.kanji.clone())
                .collect(),
        }
    }

    /// Apply the end-of-session reward, then record the session.
    ///
    /// The ledger is credited before the save record is written. Runs once;
    /// later calls fail with [`QuizError::RewardAlreadyIssued`].
    pub fn finish(
        &mut self,
        ledger: &mut CurrencyLedger,
        saves: &SaveStore,
    ) -> Result<SessionSummary, QuizError> {
        self.expect_phase(Phase::Complete, "finish the session")?;
        if self.reward_issued {
            return Err(QuizError::RewardAlreadyIssued);
        }

        let question_count = self.questions.len() as u32;
        let reward = calculate_reward(self.correct_count, self.elapsed_seconds, question_count);
        ledger.add(reward.bonus_gold);
        self.reward_issued = true;

        saves.record_completed(&self.stats());

        Ok(SessionSummary {
            session_id: self.id,
            reward,
            elapsed_seconds: self.elapsed_seconds,
            correct_count: self.correct_count,
            question_count,
            balance: ledger.get(),
        })
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), QuizError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(QuizError::InvalidPhase {
                action,
                phase: self.phase.describe(),
            })
        }
    }
}

/// Shuffle `pool` and keep at most `length` questions.
pub fn sample_session<R: Rng + ?Sized>(
    mut pool: Vec<Question>,
    length: usize,
    rng: &mut R,
) -> Vec<Question> {
    pool.shuffle(rng);
    pool.truncate(length);
    pool
}
