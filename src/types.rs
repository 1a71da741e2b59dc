use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type RoomId = String;
pub type PlayerId = String;
pub type CardId = String;
pub type VoteId = String;

/// Bump when the snapshot shape changes in a way old readers can't handle.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Setup,
    P1Write,
    P1Vote,
    P1Review,
    P1Results,
    P2Rank,
    P2Discuss,
    Reveal,
}

/// The five fixed reaction symbols voters can spend their budget on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Laugh,
    Heart,
    Wow,
    Think,
    Fire,
}

impl Reaction {
    pub const ALL: [Reaction; 5] = [
        Reaction::Laugh,
        Reaction::Heart,
        Reaction::Wow,
        Reaction::Think,
        Reaction::Fire,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoteMode {
    PerRound,
    PerRoundAndFinal,
    FinalOnly,
}

/// What a voting session covers: one round's cards, or every card written.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    Round(u32),
    Final,
}

impl SessionScope {
    /// Stable key votes are tagged with, e.g. `round:2` or `final`.
    pub fn key(&self) -> String {
        match self {
            SessionScope::Round(n) => format!("round:{}", n),
            SessionScope::Final => "final".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub p1_rounds: u32,
    /// Advisory only; the engine has no timers. The driver enforces it.
    pub seconds_per_turn: u32,
    pub vote_mode: VoteMode,
    pub max_reactions_per_voter: u32,
    pub deck_desired: usize,
    pub deck_max: usize,
    pub allow_self_vote: bool,
    pub show_theme_in_voting: bool,
    /// One slot per round; empty string means "draw from the theme bank".
    pub p1_theme_slots: Vec<String>,
    pub p2_theme_slot: String,
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            p1_rounds: 3,
            seconds_per_turn: 60,
            vote_mode: VoteMode::PerRound,
            max_reactions_per_voter: 3,
            deck_desired: 8,
            deck_max: 12,
            allow_self_vote: false,
            show_theme_in_voting: true,
            p1_theme_slots: Vec::new(),
            p2_theme_slot: String::new(),
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

/// One written contribution. Append-only for the lifetime of the room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionCard {
    pub id: CardId,
    /// Monotonic per-room counter; doubles as the creation-order tiebreaker.
    pub display_id: u32,
    pub author_id: PlayerId,
    pub round: u32,
    pub text: String,
    pub created_at: String,
}

/// One reaction cast by one voter on one card. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vote {
    pub id: VoteId,
    pub session_key: String,
    pub voter_id: PlayerId,
    pub voter_name: String,
    pub card_id: CardId,
    pub reaction: Reaction,
    pub created_at: String,
}

/// Transient state for one pass of reaction-casting.
/// Exists only while `phase == p1_vote`; dropped once the session concludes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VotingSession {
    pub scope: SessionScope,
    pub card_ids: Vec<CardId>,
    pub voter_ids: Vec<PlayerId>,
    pub active_voter: usize,
    pub votes_used: HashMap<PlayerId, u32>,
    pub voter_done: HashMap<PlayerId, bool>,
    pub locked: bool,
    pub hide_theme: bool,
}

impl VotingSession {
    pub fn used_by(&self, voter_id: &str) -> u32 {
        self.votes_used.get(voter_id).copied().unwrap_or(0)
    }

    pub fn is_done(&self, voter_id: &str) -> bool {
        self.voter_done.get(voter_id).copied().unwrap_or(false)
    }
}

/// One player's full secret permutation of the phase-2 deck.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRanking {
    pub player_id: PlayerId,
    pub ordering: Vec<CardId>,
    pub created_at: String,
}

/// A card with a raw vote total attached (phase-1 tallies).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardPoints {
    pub card_id: CardId,
    pub author_id: PlayerId,
    pub points: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase1Summary {
    pub top3: Vec<CardPoints>,
    pub best_per_reaction: HashMap<Reaction, CardPoints>,
    pub crowd_favorite: Option<CardPoints>,
}

/// A card with its average secret-ranking score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CardAverage {
    pub card_id: CardId,
    pub author_id: PlayerId,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase2Summary {
    /// Objective order: descending average, ties by ascending display id.
    pub averages: Vec<CardAverage>,
    /// The card left on top of the open-discussion ordering.
    pub winner_card_id: CardId,
    pub winner_author_id: PlayerId,
    pub collective_win: bool,
}

/// The final tally. Computed once at finalize time, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevealSummary {
    pub phase1: Phase1Summary,
    pub phase2: Phase2Summary,
    pub computed_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase1State {
    /// 1-based; 0 while still in setup.
    pub round: u32,
    pub active_writer: usize,
    pub theme: String,
    pub cards: Vec<ActionCard>,
    pub votes: Vec<Vote>,
    pub session: Option<VotingSession>,
    pub summary: Option<Phase1Summary>,
    /// Set once a final-scoped session has run, so it never runs twice.
    pub final_session_done: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Phase2State {
    pub theme: String,
    pub deck: Vec<CardId>,
    pub active_ranker: usize,
    pub rankings: Vec<PlayerRanking>,
    /// The group's shared, visible ordering during open discussion.
    pub table_order: Vec<CardId>,
    pub finalized: bool,
}

/// The aggregate root: one instance per room, owned by the reducer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub schema_version: u32,
    pub room_id: RoomId,
    pub phase: Phase,
    pub config: GameConfig,
    pub players: Vec<Player>,
    pub p1: Phase1State,
    pub p2: Phase2State,
    pub reveal: Option<RevealSummary>,
    pub next_display_id: u32,
    pub next_vote_no: u32,
    pub created_at: String,
    pub updated_at: String,
}

impl GameState {
    pub fn new(room_id: impl Into<RoomId>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            schema_version: SCHEMA_VERSION,
            room_id: room_id.into(),
            phase: Phase::Setup,
            config: GameConfig::default(),
            players: Vec::new(),
            p1: Phase1State {
                round: 0,
                active_writer: 0,
                theme: String::new(),
                cards: Vec::new(),
                votes: Vec::new(),
                session: None,
                summary: None,
                final_session_done: false,
            },
            p2: Phase2State {
                theme: String::new(),
                deck: Vec::new(),
                active_ranker: 0,
                rankings: Vec::new(),
                table_order: Vec::new(),
                finalized: false,
            },
            reveal: None,
            next_display_id: 1,
            next_vote_no: 1,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&ActionCard> {
        self.p1.cards.iter().find(|c| c.id == card_id)
    }

    /// The player whose turn it is to write, if any.
    pub fn active_writer(&self) -> Option<&Player> {
        self.players.get(self.p1.active_writer)
    }

    pub fn active_ranker(&self) -> Option<&Player> {
        self.players.get(self.p2.active_ranker)
    }

    pub fn ranking_for(&self, player_id: &str) -> Option<&PlayerRanking> {
        self.p2.rankings.iter().find(|r| r.player_id == player_id)
    }
}
