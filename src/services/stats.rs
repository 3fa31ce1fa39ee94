use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::db::models::{CompletedAttemptRow, LeaderboardAttemptRow};
use crate::models::LeaderboardPeriod;
use crate::names::{LEADERBOARD_SIZE, SCORE_SERIES_LEN};

const UNCATEGORIZED: &str = "Uncategorized";
const HIGHLIGHT_COUNT: usize = 3;

/// Seconds an attempt took: the recorded time, else the wall-clock span.
pub fn attempt_seconds(
    time_taken: Option<i64>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
) -> i64 {
    time_taken
        .or_else(|| completed_at.map(|done| (done - started_at).num_seconds()))
        .unwrap_or(0)
        .max(0)
}

fn mean_rounded(values: impl Iterator<Item = i64>) -> i64 {
    let (sum, n) = values.fold((0i64, 0i64), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return 0;
    }
    (sum as f64 / n as f64).round_ties_even() as i64
}

// ---------------------------------------------------------------------------
// Per-user stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Achievement {
    FirstQuiz,
    TenQuizzes,
    PerfectScore,
    Explorer,
}

impl Achievement {
    pub const ALL: &'static [Achievement] = &[
        Achievement::FirstQuiz,
        Achievement::TenQuizzes,
        Achievement::PerfectScore,
        Achievement::Explorer,
    ];

    /// Locale key suffix.
    pub fn key(&self) -> &'static str {
        match self {
            Achievement::FirstQuiz => "first_quiz",
            Achievement::TenQuizzes => "ten_quizzes",
            Achievement::PerfectScore => "perfect_score",
            Achievement::Explorer => "explorer",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Achievement::FirstQuiz => "\u{1F389}",
            Achievement::TenQuizzes => "\u{1F3C5}",
            Achievement::PerfectScore => "\u{1F4AF}",
            Achievement::Explorer => "\u{1F9ED}",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBreakdown {
    pub name: String,
    pub count: i64,
    pub average_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScorePoint {
    pub label: String,
    pub score: i64,
}

#[derive(Debug, Clone)]
pub struct UserStats {
    pub completed: usize,
    pub average_score: i64,
    pub total_time_secs: i64,
    pub categories: Vec<CategoryBreakdown>,
    pub series: Vec<ScorePoint>,
    pub achievements: Vec<AchievementStatus>,
    pub best: Vec<CompletedAttemptRow>,
    pub weakest: Vec<CompletedAttemptRow>,
}

/// Aggregate a user's completed attempts, given newest first.
pub fn user_stats(attempts: &[CompletedAttemptRow]) -> UserStats {
    let average_score = mean_rounded(attempts.iter().map(|a| a.score));
    let total_time_secs = attempts
        .iter()
        .map(|a| attempt_seconds(a.time_taken, a.started_at, a.completed_at))
        .sum();

    let mut by_category: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for a in attempts {
        let name = a.category_name.as_deref().unwrap_or(UNCATEGORIZED);
        by_category.entry(name).or_default().push(a.score);
    }
    let mut categories: Vec<CategoryBreakdown> = by_category
        .into_iter()
        .map(|(name, scores)| CategoryBreakdown {
            name: name.to_string(),
            count: scores.len() as i64,
            average_score: mean_rounded(scores.into_iter()),
        })
        .collect();
    // stable: equal counts stay in name order
    categories.sort_by(|a, b| b.count.cmp(&a.count));

    let series = attempts
        .iter()
        .take(SCORE_SERIES_LEN)
        .rev()
        .map(|a| ScorePoint {
            label: a.completed_at.unwrap_or(a.started_at).format("%b %d").to_string(),
            score: a.score,
        })
        .collect();

    let distinct_categories: HashSet<Option<&str>> =
        attempts.iter().map(|a| a.category_name.as_deref()).collect();
    let achievements = Achievement::ALL
        .iter()
        .map(|&achievement| AchievementStatus {
            achievement,
            unlocked: match achievement {
                Achievement::FirstQuiz => !attempts.is_empty(),
                Achievement::TenQuizzes => attempts.len() >= 10,
                Achievement::PerfectScore => attempts.iter().any(|a| a.score >= 100),
                Achievement::Explorer => distinct_categories.len() >= 3,
            },
        })
        .collect();

    let mut best = attempts.to_vec();
    best.sort_by(|a, b| b.score.cmp(&a.score));
    best.truncate(HIGHLIGHT_COUNT);

    let mut weakest = attempts.to_vec();
    weakest.sort_by(|a, b| a.score.cmp(&b.score));
    weakest.truncate(HIGHLIGHT_COUNT);

    UserStats {
        completed: attempts.len(),
        average_score,
        total_time_secs,
        categories,
        series,
        achievements,
        best,
        weakest,
    }
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

/// Start of the period in UTC: Monday 00:00 for the week, the 1st 00:00 for
/// the month. `None` means no lower bound.
pub fn period_start(period: LeaderboardPeriod, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let first_day = match period {
        LeaderboardPeriod::AllTime => return None,
        LeaderboardPeriod::ThisWeek => {
            today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
        }
        LeaderboardPeriod::ThisMonth => today.with_day(1)?,
    };
    first_day.and_hms_opt(0, 0, 0).map(|d| d.and_utc())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Medal::Gold => "\u{1F947}",
            Medal::Silver => "\u{1F948}",
            Medal::Bronze => "\u{1F949}",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub medal: Option<Medal>,
    pub user_id: i64,
    pub display_name: String,
    pub total_score: i64,
    /// Percent, one decimal.
    pub accuracy: f64,
    pub perfect_count: i64,
    pub quiz_count: i64,
    pub average_score: i64,
    pub time_spent_secs: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub period: LeaderboardPeriod,
    pub entries: Vec<LeaderboardEntry>,
    /// The requester's row, present whenever they have attempts in the period.
    pub me: Option<LeaderboardEntry>,
}

impl Leaderboard {
    /// Whether the requester's row is already visible in `entries`.
    pub fn me_listed(&self) -> bool {
        self.me
            .as_ref()
            .is_some_and(|me| self.entries.iter().any(|e| e.user_id == me.user_id))
    }
}

#[derive(Default)]
struct Totals {
    display_name: String,
    total_score: i64,
    correct: i64,
    questions: i64,
    perfect: i64,
    quizzes: i64,
    time: i64,
}

pub fn leaderboard(
    attempts: &[LeaderboardAttemptRow],
    period: LeaderboardPeriod,
    now: DateTime<Utc>,
    requester: i64,
) -> Leaderboard {
    let start = period_start(period, now);

    let mut per_user: HashMap<i64, Totals> = HashMap::new();
    for a in attempts {
        let finished = a.completed_at.unwrap_or(a.started_at);
        if start.is_some_and(|start| finished < start) {
            continue;
        }

        let totals = per_user.entry(a.user_id).or_default();
        totals.display_name.clone_from(&a.display_name);
        totals.total_score += a.score;
        totals.correct += a.correct_count;
        totals.questions += a.total;
        totals.perfect += i64::from(a.score >= 100);
        totals.quizzes += 1;
        totals.time += attempt_seconds(a.time_taken, a.started_at, a.completed_at);
    }

    let mut ranked: Vec<LeaderboardEntry> = per_user
        .into_iter()
        .map(|(user_id, t)| LeaderboardEntry {
            rank: 0,
            medal: None,
            user_id,
            accuracy: if t.questions > 0 {
                (t.correct as f64 * 1000.0 / t.questions as f64).round() / 10.0
            } else {
                0.0
            },
            average_score: (t.total_score as f64 / t.quizzes as f64).round_ties_even() as i64,
            display_name: t.display_name,
            total_score: t.total_score,
            perfect_count: t.perfect,
            quiz_count: t.quizzes,
            time_spent_secs: t.time,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then(b.accuracy.partial_cmp(&a.accuracy).unwrap_or(Ordering::Equal))
            .then_with(|| a.display_name.cmp(&b.display_name))
    });

    for (i, entry) in ranked.iter_mut().enumerate() {
        entry.rank = i + 1;
        entry.medal = Medal::for_rank(entry.rank);
    }

    let me = ranked.iter().find(|e| e.user_id == requester).cloned();
    ranked.truncate(LEADERBOARD_SIZE);

    Leaderboard {
        period,
        entries: ranked,
        me,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        // 2024-05-01 is a Wednesday
        chrono::NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn completed(score: i64, category: Option<&str>, day: u32) -> CompletedAttemptRow {
        CompletedAttemptRow {
            id: i64::from(day),
            quiz_id: 1,
            quiz_title: "Quiz".to_string(),
            category_name: category.map(str::to_string),
            score,
            correct_count: score / 10,
            total: 10,
            started_at: at(day, 9),
            completed_at: Some(at(day, 10)),
            time_taken: Some(60),
        }
    }

    fn board_row(user_id: i64, name: &str, score: i64, correct: i64, day: u32) -> LeaderboardAttemptRow {
        LeaderboardAttemptRow {
            user_id,
            display_name: name.to_string(),
            score,
            correct_count: correct,
            total: 100,
            started_at: at(day, 9),
            completed_at: Some(at(day, 10)),
            time_taken: Some(120),
        }
    }

    #[test]
    fn attempt_time_falls_back_to_span() {
        assert_eq!(attempt_seconds(Some(42), at(1, 9), None), 42);
        assert_eq!(attempt_seconds(None, at(1, 9), Some(at(1, 10))), 3600);
        assert_eq!(attempt_seconds(None, at(1, 9), None), 0);
    }

    #[test]
    fn user_stats_aggregate_newest_first_rows() {
        let rows = vec![
            completed(100, Some("Science"), 5),
            completed(50, Some("History"), 4),
            completed(75, Some("Science"), 3),
        ];
        let stats = user_stats(&rows);

        assert_eq!(stats.completed, 3);
        assert_eq!(stats.average_score, 75);
        assert_eq!(stats.total_time_secs, 180);
        assert_eq!(
            stats.categories[0],
            CategoryBreakdown {
                name: "Science".to_string(),
                count: 2,
                average_score: 88,
            }
        );
        let labels: Vec<_> = stats.series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["May 03", "May 04", "May 05"]);
        assert_eq!(stats.best[0].score, 100);
        assert_eq!(stats.weakest[0].score, 50);
    }

    #[test]
    fn series_keeps_only_the_latest_scores() {
        let rows: Vec<_> = (1..=20).rev().map(|d| completed(d as i64, None, d)).collect();
        let stats = user_stats(&rows);

        assert_eq!(stats.series.len(), SCORE_SERIES_LEN);
        assert_eq!(stats.series.first().unwrap().score, 9);
        assert_eq!(stats.series.last().unwrap().score, 20);
    }

    #[test]
    fn achievements_unlock_on_their_rules() {
        let unlocked = |rows: &[CompletedAttemptRow]| -> Vec<Achievement> {
            user_stats(rows)
                .achievements
                .into_iter()
                .filter(|a| a.unlocked)
                .map(|a| a.achievement)
                .collect()
        };

        assert!(unlocked(&[]).is_empty());
        assert_eq!(unlocked(&[completed(40, None, 1)]), [Achievement::FirstQuiz]);
        assert_eq!(
            unlocked(&[
                completed(100, Some("A"), 1),
                completed(40, Some("B"), 2),
                completed(40, Some("C"), 3),
            ]),
            [
                Achievement::FirstQuiz,
                Achievement::PerfectScore,
                Achievement::Explorer
            ]
        );
        let ten: Vec<_> = (1..=10).map(|d| completed(10, None, d)).collect();
        assert!(unlocked(&ten).contains(&Achievement::TenQuizzes));
    }

    #[test]
    fn period_starts_at_monday_and_first_of_month() {
        let now = at(15, 18);
        assert_eq!(period_start(LeaderboardPeriod::AllTime, now), None);
        assert_eq!(period_start(LeaderboardPeriod::ThisWeek, now), Some(at(13, 0)));
        assert_eq!(period_start(LeaderboardPeriod::ThisMonth, now), Some(at(1, 0)));
    }

    #[test]
    fn leaderboard_sorts_by_score_then_accuracy() {
        let rows = vec![
            board_row(1, "low", 50, 90, 2),
            board_row(2, "mid", 80, 70, 2),
            board_row(3, "top", 80, 95, 2),
        ];
        let board = leaderboard(&rows, LeaderboardPeriod::AllTime, at(20, 0), 1);

        let order: Vec<_> = board.entries.iter().map(|e| e.user_id).collect();
        assert_eq!(order, [3, 2, 1]);
        assert_eq!(board.entries[0].medal, Some(Medal::Gold));
        assert_eq!(board.entries[2].rank, 3);
        assert_eq!(board.me.as_ref().map(|m| m.rank), Some(3));
        assert!(board.me_listed());
    }

    #[test]
    fn leaderboard_totals_and_period_filter() {
        let rows = vec![
            board_row(1, "ann", 100, 2, 14),
            board_row(1, "ann", 50, 1, 14),
            board_row(1, "ann", 90, 9, 2),
        ];
        let all = leaderboard(&rows, LeaderboardPeriod::AllTime, at(15, 12), 1);
        let me = all.me.unwrap();
        assert_eq!(me.total_score, 240);
        assert_eq!(me.quiz_count, 3);
        assert_eq!(me.perfect_count, 1);
        assert_eq!(me.average_score, 80);
        assert_eq!(me.accuracy, 4.0);
        assert_eq!(me.time_spent_secs, 360);

        let week = leaderboard(&rows, LeaderboardPeriod::ThisWeek, at(15, 12), 1);
        assert_eq!(week.entries[0].total_score, 150);
        assert_eq!(week.entries[0].accuracy, 1.5);
    }

    #[test]
    fn leaderboard_keeps_requester_outside_top() {
        let rows: Vec<_> = (1..=60)
            .map(|id| board_row(id, &format!("user{id:02}"), 1000 - id, 50, 3))
            .collect();
        let board = leaderboard(&rows, LeaderboardPeriod::AllTime, at(20, 0), 60);

        assert_eq!(board.entries.len(), LEADERBOARD_SIZE);
        assert_eq!(board.me.as_ref().map(|m| m.rank), Some(60));
        assert!(!board.me_listed());
    }
}
