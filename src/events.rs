use crate::types::*;
use serde::{Deserialize, Serialize};

/// Everything the external driver can dispatch into the reducer.
///
/// Each variant carries only the fields its transition needs. The wire shape
/// matches the UI's dispatch payloads (`{"t": "p1_submit", ...}`); an
/// unrecognized tag decodes to `Unknown`, which the reducer absorbs without
/// touching state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Event {
    /// Unconditional hard reset back to a fresh setup for this room.
    ResetAll {
        room_id: RoomId,
    },
    SetupStart {
        players: Vec<String>,
        vote_mode: VoteMode,
        p1_rounds: u32,
        seconds_per_turn: u32,
        max_reactions_per_voter: u32,
        deck_desired: usize,
        deck_max: usize,
        allow_self_vote: bool,
        show_theme_in_voting: bool,
        p1_theme_slots: Vec<String>,
        p2_theme: String,
        seed: Option<u64>,
    },
    /// Generic continuation signal; only meaningful in `p1_review`.
    Next,
    SetActiveVoter {
        voter_id: PlayerId,
    },
    P1Submit {
        player_id: PlayerId,
        text: String,
    },
    P1Skip {
        player_id: PlayerId,
    },
    P1StartVoting {
        scope: Option<SessionScope>,
    },
    P1CastReaction {
        voter_id: PlayerId,
        card_id: CardId,
        reaction: Reaction,
    },
    P1SkipVoter {
        voter_id: PlayerId,
    },
    P1NextVoter,
    P1EndVoting,
    P2Start,
    P2SetOrdering {
        ordering: Vec<CardId>,
    },
    P2Move {
        from: usize,
        to: usize,
    },
    P2SubmitRanking {
        player_id: PlayerId,
        ordering: Vec<CardId>,
    },
    P2SkipRanking {
        player_id: PlayerId,
    },
    P2Finalize,
    #[serde(other)]
    Unknown,
}
