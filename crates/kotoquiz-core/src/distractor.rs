//! Wrong-answer selection for multiple-choice questions.
//!
//! Distractors are drawn from the questions near the current one in the
//! session, so they come from the same slice of the bank. The selector tries
//! to keep consecutive questions from showing any of the same options, but
//! gives up after a fixed number of resamples and accepts the overlap.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::model::{OptionSet, Question, Signature};

/// Positions on either side of the current question eligible as distractors.
pub const DEFAULT_WINDOW: usize = 40;
/// Resampling attempts before an overlapping option set is accepted.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;
/// Wrong answers per question.
pub const DISTRACTOR_COUNT: usize = 3;

/// The options chosen for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub options: OptionSet,
    /// Attempts used, `1..=max_attempts`.
    pub attempts: usize,
    /// Whether the accepted set shares a signature with the previous question's.
    pub overlapped: bool,
}

/// Picks distractors and remembers the last accepted option set.
#[derive(Debug, Clone)]
pub struct DistractorSelector {
    window: usize,
    max_attempts: usize,
    previous: HashSet<Signature>,
}

impl Default for DistractorSelector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_ATTEMPTS)
    }
}

impl DistractorSelector {
    pub fn new(window: usize, max_attempts: usize) -> Self {
        Self {
            window,
            max_attempts: max_attempts.max(1),
            previous: HashSet::new(),
        }
    }

    /// Signatures of the most recently accepted option set.
    pub fn previous(&self) -> &HashSet<Signature> {
        &self.previous
    }

    /// Forget the previous option set.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Build the option set for `questions[index]`.
    ///
    /// Returns `None` when `index` is out of range.
    pub fn select<R: Rng + ?Sized>(
        &mut self,
        questions: &[Question],
        index: usize,
        rng: &mut R,
    ) -> Option<Selection> {
        let correct = questions.get(index)?;
        let mut pool = self.candidate_pool(questions, index);

        let mut distractors: Vec<&Question> = Vec::new();
        let mut signatures: HashSet<Signature> = HashSet::new();
        let mut overlapped = false;
        let mut attempts = 0;

        while attempts < self.max_attempts {
            attempts += 1;
            pool.shuffle(rng);
            distractors = pool.iter().take(DISTRACTOR_COUNT).copied().collect();

            signatures = std::iter::once(correct)
                .chain(distractors.iter().copied())
                .map(Question::signature)
                .collect();
            overlapped = signatures.iter().any(|s| self.previous.contains(s));
            if !overlapped {
                break;
            }
        }

        if overlapped {
            tracing::debug!(
                index,
                attempts,
                "accepting option set that overlaps the previous question"
            );
        }

        // Slot 0 is the correct answer until shuffled.
        let mut order: Vec<usize> = (0..=distractors.len()).collect();
        order.shuffle(rng);
        let correct_index = order.iter().position(|&slot| slot == 0).unwrap_or(0);
        let options = order
            .iter()
            .map(|&slot| match slot {
                0 => correct.option_view(),
                n => distractors[n - 1].option_view(),
            })
            .collect();

        self.previous = signatures;

        Some(Selection {
            options: OptionSet {
                options,
                correct_index,
            },
            attempts,
            overlapped,
        })
    }

    /// Questions within the window around `index`, excluding the current
    /// question and anything that displays identically to it or to an
    /// earlier candidate.
    fn candidate_pool<'a>(&self, questions: &'a [Question], index: usize) -> Vec<&'a Question> {
        let correct_sig = questions[index].signature();
        let start = index.saturating_sub(self.window);
        let end = index.saturating_add(self.window).min(questions.len() - 1);

        let mut seen: HashSet<Signature> = HashSet::new();
        questions[start..=end]
            .iter()
            .enumerate()
            .filter(|(offset, _)| start + offset != index)
            .map(|(_, q)| q)
            .filter(|q| {
                let sig = q.signature();
                sig != correct_sig && seen.insert(sig)
            })
            .collect()
    }
}
