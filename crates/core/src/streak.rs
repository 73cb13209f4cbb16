//! Daily challenges and completion streaks.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Consecutive-day completion counters for the daily challenge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStreak {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
    pub total_days_completed: u32,
}

impl UserStreak {
    /// Counts `today` as completed. The streak continues when yesterday's
    /// challenge was completed and restarts at 1 otherwise.
    ///
    /// Returns `false` and leaves the counters alone when `today` has
    /// already been recorded.
    pub fn record_completion(&mut self, today: NaiveDate, completed_yesterday: bool) -> bool {
        if self.last_completed_date == Some(today) {
            return false;
        }

        self.current_streak = if completed_yesterday {
            self.current_streak + 1
        } else {
            1
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.total_days_completed += 1;
        self.last_completed_date = Some(today);
        true
    }
}

/// The question picked for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChallenge {
    pub date: NaiveDate,
    pub question_id: u64,
    pub is_completed: bool,
    pub user_answer: Option<String>,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl DailyChallenge {
    pub fn new(date: NaiveDate, question_id: u64) -> Self {
        Self {
            date,
            question_id,
            is_completed: false,
            user_answer: None,
            score: None,
            created_at: Utc::now(),
        }
    }

    pub fn complete(&mut self, answer: &str, score: i32) {
        self.is_completed = true;
        self.user_answer = Some(answer.to_string());
        self.score = Some(score);
    }
}

/// Every daily challenge so far and the streak they add up to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeLog {
    pub streak: UserStreak,
    pub challenges: Vec<DailyChallenge>,
}

impl ChallengeLog {
    pub fn challenge_for(&self, date: NaiveDate) -> Option<&DailyChallenge> {
        self.challenges.iter().find(|c| c.date == date)
    }

    pub fn is_completed(&self, date: NaiveDate) -> bool {
        self.challenge_for(date).is_some_and(|c| c.is_completed)
    }

    pub fn next_question_id(&self) -> u64 {
        self.challenges
            .iter()
            .map(|c| c.question_id)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Marks the challenge for `today` completed, creating it if needed,
    /// and moves the streak forward.
    pub fn complete_today(
        &mut self,
        today: NaiveDate,
        question_id: u64,
        answer: &str,
        score: i32,
    ) -> &UserStreak {
        let completed_yesterday = today.pred_opt().is_some_and(|d| self.is_completed(d));

        match self.challenges.iter_mut().find(|c| c.date == today) {
            Some(challenge) => challenge.complete(answer, score),
            None => {
                let mut challenge = DailyChallenge::new(today, question_id);
                challenge.complete(answer, score);
                self.challenges.push(challenge);
            }
        }

        if !self.streak.record_completion(today, completed_yesterday) {
            tracing::debug!(%today, "Challenge already counted for today");
        }
        &self.streak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_streak_continues_after_yesterday() {
        let mut streak = UserStreak::default();
        assert!(streak.record_completion(day(1), false));
        assert!(streak.record_completion(day(2), true));
        assert!(streak.record_completion(day(3), true));

        assert_eq!(streak.current_streak, 3);
        assert_eq!(streak.longest_streak, 3);
        assert_eq!(streak.total_days_completed, 3);
        assert_eq!(streak.last_completed_date, Some(day(3)));
    }

    #[test]
    fn test_missed_day_resets_current_but_keeps_longest() {
        let mut streak = UserStreak::default();
        streak.record_completion(day(1), false);
        streak.record_completion(day(2), true);
        streak.record_completion(day(5), false);

        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.total_days_completed, 3);
    }

    #[test]
    fn test_same_day_is_counted_once() {
        let mut streak = UserStreak::default();
        streak.record_completion(day(1), false);
        assert!(!streak.record_completion(day(1), false));
        assert_eq!(streak.total_days_completed, 1);
        assert_eq!(streak.current_streak, 1);
    }

    #[test]
    fn test_complete_daily_challenge() {
        let mut challenge = DailyChallenge::new(day(4), 17);
        assert!(!challenge.is_completed);

        challenge.complete("Because incentives matter.", 8);
        assert!(challenge.is_completed);
        assert_eq!(challenge.user_answer.as_deref(), Some("Because incentives matter."));
        assert_eq!(challenge.score, Some(8));
        assert_eq!(challenge.question_id, 17);
    }

    #[test]
    fn test_challenge_log_builds_streak_across_days() {
        let mut log = ChallengeLog::default();
        assert_eq!(log.next_question_id(), 1);

        let first_id = log.next_question_id();
        log.complete_today(day(1), first_id, "first", 6);
        let streak = log.complete_today(day(2), 2, "second", 7);
        assert_eq!(streak.current_streak, 2);

        // Day 3 skipped.
        let streak = log.complete_today(day(4), 3, "third", 8).clone();
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.total_days_completed, 3);

        assert!(log.is_completed(day(2)));
        assert!(!log.is_completed(day(3)));
        assert_eq!(log.challenge_for(day(4)).and_then(|c| c.score), Some(8));
        assert_eq!(log.next_question_id(), 4);
    }

    #[test]
    fn test_repeated_completion_updates_answer_but_not_streak() {
        let mut log = ChallengeLog::default();
        log.complete_today(day(1), 1, "draft", 4);
        let streak = log.complete_today(day(1), 1, "final", 9).clone();

        assert_eq!(log.challenges.len(), 1);
        assert_eq!(log.challenges[0].user_answer.as_deref(), Some("final"));
        assert_eq!(streak.total_days_completed, 1);
    }
}
