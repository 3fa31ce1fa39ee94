use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Normalized shape of an AI-generated question set, as stored in
/// `ai_question_drafts.parsed`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDraft {
    #[serde(default)]
    pub items: Vec<DraftItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftItem {
    pub question: String,
    pub choices: Vec<String>,
    pub correct_index: usize,
    #[serde(default = "default_points")]
    pub points: i64,
    #[serde(default)]
    pub explanation: String,
}

fn default_points() -> i64 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownVariant;

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unknown variant")
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),* $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),*
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)*
                    _ => Err(UnknownVariant),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(Difficulty {
    Easy => "easy",
    Medium => "medium",
    Hard => "hard",
});

text_enum!(QuizStatus {
    Draft => "draft",
    Active => "active",
    Archived => "archived",
});

text_enum!(QuestionType {
    MultipleChoice => "multiple_choice",
    TrueFalse => "true_false",
    ShortAnswer => "short_answer",
});

text_enum!(HistoryStatus {
    Completed => "completed",
    Ongoing => "ongoing",
});

text_enum!(HistorySort {
    DateDesc => "-date",
    DateAsc => "date",
    ScoreDesc => "-score",
    ScoreAsc => "score",
    TimeDesc => "-time",
    TimeAsc => "time",
});

text_enum!(LeaderboardPeriod {
    AllTime => "all_time",
    ThisWeek => "this_week",
    ThisMonth => "this_month",
});

impl Default for HistorySort {
    fn default() -> Self {
        HistorySort::DateDesc
    }
}

impl Default for LeaderboardPeriod {
    fn default() -> Self {
        LeaderboardPeriod::AllTime
    }
}

impl Difficulty {
    pub fn title(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Percentage score, rounded half to even; zero when there are no questions.
pub fn score_percent(correct: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (100.0 * correct as f64 / total as f64).round_ties_even() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_enums_parse_their_own_labels() {
        for d in Difficulty::ALL {
            assert_eq!(d.as_str().parse::<Difficulty>(), Ok(*d));
        }
        assert_eq!("archived".parse::<QuizStatus>(), Ok(QuizStatus::Archived));
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn draft_item_defaults_points_and_explanation() {
        let item: DraftItem =
            serde_json::from_str(r#"{"question":"Q","choices":["a","b"],"correct_index":1}"#)
                .unwrap();
        assert_eq!(item.points, 1);
        assert_eq!(item.explanation, "");
    }

    #[test]
    fn score_rounds_half_to_even() {
        assert_eq!(score_percent(1, 8), 12);
        assert_eq!(score_percent(3, 8), 38);
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(5, 5), 100);
        assert_eq!(score_percent(0, 0), 0);
    }
}
