use std::collections::HashMap;

use maud::{html, Markup};
use rust_i18n::t;

use crate::{
    db::{
        models::{Category, CompletedAttemptRow, HistoryRow, PeerCount},
        HistoryFilter,
    },
    models::{HistorySort, HistoryStatus, LeaderboardPeriod},
    names,
    services::stats::{attempt_seconds, Leaderboard, LeaderboardEntry, UserStats},
    utils,
};

fn sort_key(sort: HistorySort) -> &'static str {
    match sort {
        HistorySort::DateDesc => "history.sort.date_desc",
        HistorySort::DateAsc => "history.sort.date_asc",
        HistorySort::ScoreDesc => "history.sort.score_desc",
        HistorySort::ScoreAsc => "history.sort.score_asc",
        HistorySort::TimeDesc => "history.sort.time_desc",
        HistorySort::TimeAsc => "history.sort.time_asc",
    }
}

fn history_link(row: &HistoryRow) -> String {
    if row.is_completed {
        names::result_url(row.id)
    } else {
        names::quiz_session_url(row.quiz_id)
    }
}

fn history_time(row: &HistoryRow) -> String {
    if row.is_completed {
        utils::format_clock(Some(attempt_seconds(
            row.time_taken,
            row.started_at,
            row.completed_at,
        )))
    } else {
        utils::format_clock(None)
    }
}

pub fn history(
    rows: &[HistoryRow],
    categories: &[Category],
    filter: &HistoryFilter,
    peers: &HashMap<i64, PeerCount>,
    locale: &str,
) -> Markup {
    html! {
        h1 { (t!("history.title", locale = locale)) }

        form method="get" action=(names::HISTORY_URL) {
            div.grid {
                input type="search" name="q" value=(filter.q.as_deref().unwrap_or(""))
                      placeholder=(t!("history.search", locale = locale))
                      aria-label=(t!("history.search", locale = locale));
                select name="category" aria-label=(t!("history.category", locale = locale)) {
                    option value="" { (t!("history.all_categories", locale = locale)) }
                    @for c in categories {
                        option value=(c.id) selected[filter.category_id == Some(c.id)] { (c.name) }
                    }
                }
                select name="status" aria-label=(t!("history.status", locale = locale)) {
                    option value="" { (t!("history.all_statuses", locale = locale)) }
                    @for s in HistoryStatus::ALL {
                        @let key = format!("history.status_{}", s.as_str());
                        option value=(s.as_str()) selected[filter.status == Some(*s)] {
                            (t!(&key, locale = locale))
                        }
                    }
                }
                select name="sort" aria-label=(t!("history.sort_label", locale = locale)) {
                    @for s in HistorySort::ALL {
                        option value=(s.as_str()) selected[filter.sort == *s] {
                            (t!(sort_key(*s), locale = locale))
                        }
                    }
                }
                button type="submit" { (t!("history.apply", locale = locale)) }
            }
        }

        @if rows.is_empty() {
            p.muted { (t!("history.empty", locale = locale)) }
        } @else {
            table {
                thead {
                    tr {
                        th { (t!("history.quiz", locale = locale)) }
                        th { (t!("history.category", locale = locale)) }
                        th { (t!("history.started", locale = locale)) }
                        th { (t!("history.status", locale = locale)) }
                        th { (t!("history.score", locale = locale)) }
                        th { (t!("history.time", locale = locale)) }
                        th { (t!("history.peers", locale = locale)) }
                    }
                }
                tbody {
                    @for row in rows {
                        tr {
                            td { a href=(history_link(row)) { (row.quiz_title) } }
                            td { (row.category_name.as_deref().unwrap_or("—")) }
                            td { (row.started_at.format("%Y-%m-%d %H:%M")) }
                            td {
                                @if row.is_completed {
                                    (t!("history.status_completed", locale = locale))
                                } @else {
                                    (t!("history.in_progress", locale = locale, current = row.current_index + 1, total = row.total))
                                }
                            }
                            td {
                                @if row.is_completed { (row.score) "%" } @else { "—" }
                            }
                            td { (history_time(row)) }
                            td {
                                @if let Some(peer) = peers.get(&row.quiz_id) {
                                    small {
                                        (t!("history.peer_counts", locale = locale, ongoing = peer.ongoing, completed = peer.completed))
                                    }
                                } @else {
                                    small.muted { "—" }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn attempt_list(rows: &[CompletedAttemptRow]) -> Markup {
    html! {
        ul {
            @for row in rows {
                li {
                    a href=(names::result_url(row.id)) { (row.quiz_title) }
                    " · " strong { (row.score) "%" }
                }
            }
        }
    }
}

pub fn stats(stats: &UserStats, recent: &[HistoryRow], locale: &str) -> Markup {
    html! {
        h1 { (t!("stats.title", locale = locale)) }

        div.grid {
            article {
                header { (t!("stats.completed", locale = locale)) }
                h2 { (stats.completed) }
            }
            article {
                header { (t!("stats.average", locale = locale)) }
                h2 { (stats.average_score) "%" }
            }
            article {
                header { (t!("stats.total_time", locale = locale)) }
                h2 { (utils::format_duration(stats.total_time_secs)) }
            }
        }

        @if stats.completed == 0 {
            p.muted { (t!("stats.empty", locale = locale)) }
        }

        @if !stats.series.is_empty() {
            section {
                h3 { (t!("stats.progress", locale = locale)) }
                div.score-chart {
                    @for point in &stats.series {
                        div.bar style=(format!("height: {}%", point.score.clamp(2, 100)))
                            title=(format!("{}: {}%", point.label, point.score)) {
                            small { (point.score) }
                        }
                    }
                }
            }
        }

        @if !stats.categories.is_empty() {
            section {
                h3 { (t!("stats.by_category", locale = locale)) }
                table {
                    thead {
                        tr {
                            th { (t!("history.category", locale = locale)) }
                            th { (t!("stats.attempts", locale = locale)) }
                            th { (t!("stats.average", locale = locale)) }
                        }
                    }
                    tbody {
                        @for c in &stats.categories {
                            tr {
                                td { (c.name) }
                                td { (c.count) }
                                td { (c.average_score) "%" }
                            }
                        }
                    }
                }
            }
        }

        section {
            h3 { (t!("stats.achievements", locale = locale)) }
            div.achievements.grid {
                @for status in &stats.achievements {
                    @let key = status.achievement.key();
                    @let title_key = format!("achievements.{key}");
                    @let desc_key = format!("achievements.{key}_desc");
                    article.locked[!status.unlocked] {
                        header { (status.achievement.icon()) " " strong { (t!(&title_key, locale = locale)) } }
                        small { (t!(&desc_key, locale = locale)) }
                    }
                }
            }
        }

        div.grid {
            section {
                h3 { (t!("stats.best", locale = locale)) }
                (attempt_list(&stats.best))
            }
            section {
                h3 { (t!("stats.weakest", locale = locale)) }
                (attempt_list(&stats.weakest))
            }
        }

        section {
            h3 { (t!("stats.recent", locale = locale)) }
            @if recent.is_empty() {
                p.muted { (t!("history.empty", locale = locale)) }
            }
            ul {
                @for row in recent {
                    li {
                        a href=(history_link(row)) { (row.quiz_title) }
                        " · "
                        @if row.is_completed {
                            (row.score) "%"
                        } @else {
                            (t!("history.status_ongoing", locale = locale))
                        }
                        " · "
                        small.muted { (row.started_at.format("%Y-%m-%d")) }
                    }
                }
            }
            a href=(names::HISTORY_URL) { (t!("stats.see_history", locale = locale)) }
        }
    }
}

fn leaderboard_row(entry: &LeaderboardEntry, requester: i64) -> Markup {
    html! {
        tr.me[entry.user_id == requester] {
            td {
                @if let Some(medal) = entry.medal { (medal.emoji()) " " }
                (entry.rank)
            }
            td { (entry.display_name) }
            td { (entry.total_score) }
            td { (format!("{:.1}%", entry.accuracy)) }
            td { (entry.perfect_count) }
            td { (entry.quiz_count) }
            td { (entry.average_score) "%" }
            td { (utils::format_duration(entry.time_spent_secs)) }
        }
    }
}

pub fn leaderboard(board: &Leaderboard, requester: i64, locale: &str) -> Markup {
    html! {
        h1 { (t!("leaderboard.title", locale = locale)) }

        nav {
            ul {
                @for period in LeaderboardPeriod::ALL {
                    @let key = format!("leaderboard.{}", period.as_str());
                    li {
                        @if *period == board.period {
                            strong { (t!(&key, locale = locale)) }
                        } @else {
                            a href=(format!("{}?period={}", names::LEADERBOARD_URL, period.as_str())) {
                                (t!(&key, locale = locale))
                            }
                        }
                    }
                }
            }
        }

        @if board.entries.is_empty() {
            p.muted { (t!("leaderboard.empty", locale = locale)) }
        } @else {
            table {
                thead {
                    tr {
                        th { (t!("leaderboard.rank", locale = locale)) }
                        th { (t!("leaderboard.player", locale = locale)) }
                        th { (t!("leaderboard.total_score", locale = locale)) }
                        th { (t!("leaderboard.accuracy", locale = locale)) }
                        th { (t!("leaderboard.perfect", locale = locale)) }
                        th { (t!("leaderboard.quizzes", locale = locale)) }
                        th { (t!("leaderboard.average", locale = locale)) }
                        th { (t!("leaderboard.time", locale = locale)) }
                    }
                }
                tbody {
                    @for entry in &board.entries {
                        (leaderboard_row(entry, requester))
                    }
                    @if !board.me_listed() {
                        @if let Some(me) = &board.me {
                            tr { td colspan="8" { "…" } }
                            (leaderboard_row(me, requester))
                        }
                    }
                }
            }
        }
    }
}
