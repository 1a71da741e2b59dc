//! Secret ranking and the open-discussion reorder.

use crate::random::{mix_seed, seeded_shuffle};
use crate::types::*;

/// One official submission per player per phase-2 cycle: the pointer
/// advances unconditionally, so a resubmission never finds its turn again.
pub(super) fn submit_ranking(
    state: &mut GameState,
    player_id: &str,
    ordering: &[CardId],
) -> Result<(), &'static str> {
    if state.phase != Phase::P2Rank {
        return Err("not in the ranking phase");
    }
    let ranker = state.active_ranker().ok_or("no active ranker")?;
    if ranker.id != player_id {
        return Err("not this player's turn to rank");
    }

    let ordering = sanitize_ordering(&state.p2.deck, ordering);
    state.p2.rankings.push(PlayerRanking {
        player_id: player_id.to_string(),
        ordering,
        created_at: chrono::Utc::now().to_rfc3339(),
    });

    advance_ranker(state);
    Ok(())
}

/// The active ranker opts out; their ranking is simply absent from the
/// average (a neutral placeholder stands in at scoring time).
pub(super) fn skip_ranking(state: &mut GameState, player_id: &str) -> Result<(), &'static str> {
    if state.phase != Phase::P2Rank {
        return Err("not in the ranking phase");
    }
    let ranker = state.active_ranker().ok_or("no active ranker")?;
    if ranker.id != player_id {
        return Err("not this player's turn to rank");
    }
    advance_ranker(state);
    Ok(())
}

/// Replace the whole open-discussion ordering (drag-and-drop drop event).
pub(super) fn set_table_order(
    state: &mut GameState,
    ordering: &[CardId],
) -> Result<(), &'static str> {
    if state.phase != Phase::P2Discuss {
        return Err("not in the discussion phase");
    }
    state.p2.table_order = sanitize_ordering(&state.p2.deck, ordering);
    Ok(())
}

/// Move one card within the open-discussion ordering.
pub(super) fn move_card(state: &mut GameState, from: usize, to: usize) -> Result<(), &'static str> {
    if state.phase != Phase::P2Discuss {
        return Err("not in the discussion phase");
    }
    let len = state.p2.table_order.len();
    if from >= len || to >= len {
        return Err("move out of bounds");
    }
    let card = state.p2.table_order.remove(from);
    state.p2.table_order.insert(to, card);
    Ok(())
}

fn advance_ranker(state: &mut GameState) {
    state.p2.active_ranker += 1;
    if state.p2.active_ranker >= state.players.len() {
        finish_ranking(state);
    }
}

/// All rankers done: reshuffle the deck (seeded by room seed and card
/// count) and hand the table to the group.
fn finish_ranking(state: &mut GameState) {
    let salt = state.p1.cards.len() as u64;
    let mut deck = state.p2.deck.clone();
    seeded_shuffle(&mut deck, mix_seed(state.config.seed, salt));
    state.p2.table_order = deck.clone();
    state.p2.deck = deck;
    state.phase = Phase::P2Discuss;
    tracing::debug!(room = %state.room_id, rankings = state.p2.rankings.len(), "discussion opened");
}

/// Force an arbitrary id list into an exact permutation of the deck:
/// foreign ids are dropped, duplicates collapse to their first occurrence,
/// and missing deck ids are appended in canonical deck order.
pub fn sanitize_ordering(deck: &[CardId], ordering: &[CardId]) -> Vec<CardId> {
    let mut result: Vec<CardId> = Vec::with_capacity(deck.len());
    for id in ordering {
        if deck.contains(id) && !result.contains(id) {
            result.push(id.clone());
        }
    }
    for id in deck {
        if !result.contains(id) {
            result.push(id.clone());
        }
    }
    result
}
