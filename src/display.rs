//! Display boundary: plain rows and text tables for rankings and history

use crate::types::{Match, MatchId, Player, Rating, RatingChangeRecord, Team};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const RULE_WIDTH: usize = 80;

/// One line of the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    /// 1-based position in the ranked list
    pub rank: usize,
    pub name: String,
    pub rating: Rating,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

/// One line of a player's rating history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub match_id: MatchId,
    pub old_rating: Rating,
    pub new_rating: Rating,
    pub rating_change: Rating,
    pub recorded_at: DateTime<Utc>,
}

/// One line of a match list, with names already resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRow {
    pub match_date: NaiveDate,
    pub team1: String,
    pub team2: String,
    pub winning_team: Team,
    pub score: String,
}

impl MatchRow {
    /// Build a row, naming each team with `name_of`
    pub fn new(record: &Match, name_of: impl Fn(&uuid::Uuid) -> String) -> Self {
        let team_name = |team: Team| {
            let [p1, p2] = record.team(team).players;
            format!("{} & {}", name_of(&p1), name_of(&p2))
        };

        Self {
            match_date: record.match_date,
            team1: team_name(Team::Team1),
            team2: team_name(Team::Team2),
            winning_team: record.winning_team,
            score: record.match_score(),
        }
    }
}

/// Number an already ranked player list
pub fn ranking_rows(players: &[Player]) -> Vec<RankingRow> {
    players
        .iter()
        .enumerate()
        .map(|(i, p)| RankingRow {
            rank: i + 1,
            name: p.name.clone(),
            rating: p.current_rating,
            games_played: p.games_played,
            wins: p.wins,
            losses: p.losses,
            win_rate: p.win_rate(),
        })
        .collect()
}

pub fn history_rows(records: &[RatingChangeRecord]) -> Vec<HistoryRow> {
    records
        .iter()
        .map(|r| HistoryRow {
            match_id: r.match_id,
            old_rating: r.old_rating,
            new_rating: r.new_rating,
            rating_change: r.rating_change,
            recorded_at: r.recorded_at,
        })
        .collect()
}

pub fn render_rankings(rows: &[RankingRow], title: &str) -> String {
    if rows.is_empty() {
        return "No players found.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "{:<6} {:<25} {:<8} {:<8} {:<10} {:<8}",
        "Rank", "Player", "Elo", "Played", "W-L", "Win %"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for row in rows {
        let _ = writeln!(
            out,
            "{:<6} {:<25} {:<8} {:<8} {:<10} {:.1}%",
            row.rank,
            row.name,
            row.rating,
            row.games_played,
            format!("{}-{}", row.wins, row.losses),
            row.win_rate * 100.0
        );
    }

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

pub fn render_history(player_name: &str, rows: &[HistoryRow]) -> String {
    if rows.is_empty() {
        return format!("No match history found for {}\n", player_name);
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out, "RATING HISTORY FOR {}", player_name.to_uppercase());
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(
        out,
        "{:<38} {:<8} {:<8} {:<8} {:<20}",
        "Match ID", "Old", "New", "Change", "Date"
    );
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));

    for row in rows {
        let _ = writeln!(
            out,
            "{:<38} {:<8} {:<8} {:<8} {:<20}",
            row.match_id.to_string(),
            row.old_rating,
            row.new_rating,
            format!("{:+}", row.rating_change),
            row.recorded_at.format("%Y-%m-%d %H:%M").to_string()
        );
    }

    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    out
}

pub fn render_matches(rows: &[MatchRow]) -> String {
    if rows.is_empty() {
        return "No matches recorded.\n".to_string();
    }

    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "{}  {} vs {}  winner: {}  score: {}",
            row.match_date, row.team1, row.team2, row.winning_team, row.score
        );
    }
    out
}
