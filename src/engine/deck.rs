//! Phase-2 deck construction: curate the cards that graduate from phase 1.

use crate::random::{mix_seed, seeded_shuffle};
use crate::themes::{self, ThemesProvider};
use crate::types::*;
use std::collections::HashMap;

/// Salt for the initial deck shuffle, so rankers don't see score order.
const DECK_SHUFFLE_SALT: u64 = 0x0d5c;

/// Leave phase-1 results: build the deck, resolve the phase-2 theme, and
/// open secret ranking with the first player.
pub(super) fn start_phase2(
    state: &mut GameState,
    themes: &dyn ThemesProvider,
) -> Result<(), &'static str> {
    if state.phase != Phase::P1Results {
        return Err("phase 2 starts from phase-1 results");
    }
    if state.p1.cards.is_empty() {
        return Err("no cards to build a deck from");
    }

    let mut deck = build_deck(state);
    seeded_shuffle(&mut deck, mix_seed(state.config.seed, DECK_SHUFFLE_SALT));

    tracing::info!(room = %state.room_id, deck = deck.len(), "phase 2 started");

    state.p2.theme = themes::phase2_theme(&state.config, themes);
    state.p2.table_order = deck.clone();
    state.p2.deck = deck;
    state.p2.active_ranker = 0;
    state.p2.rankings.clear();
    state.p2.finalized = false;
    state.phase = Phase::P2Rank;
    Ok(())
}

/// Curate the deck from phase-1 votes:
/// top 3 by total, the best card per reaction, one card per author, then
/// fill by descending total until the target size. With no votes at all,
/// fall back to creation order. Duplicates are dropped keeping first-seen
/// order at every step.
///
/// `deck_max` is an absolute cap: the deck is truncated to it keeping
/// first-seen order, so author representation is best-effort and loses to
/// the cap when they conflict.
pub fn build_deck(state: &GameState) -> Vec<CardId> {
    let cards = &state.p1.cards;
    let votes = &state.p1.votes;
    let target = deck_target(state);

    // Creation order is the canonical fallback and the tiebreaker.
    let mut by_total: Vec<&ActionCard> = cards.iter().collect();
    let totals = total_counts(votes);
    by_total.sort_by(|a, b| {
        let ta = totals.get(&a.id).copied().unwrap_or(0);
        let tb = totals.get(&b.id).copied().unwrap_or(0);
        tb.cmp(&ta).then(a.display_id.cmp(&b.display_id))
    });

    let mut deck: Vec<CardId> = Vec::new();

    if votes.is_empty() {
        for card in cards {
            if deck.len() >= target {
                break;
            }
            push_unique(&mut deck, &card.id);
        }
        return deck;
    }

    // 1. Top 3 by total reaction count.
    for card in by_total.iter().filter(|c| totals.contains_key(&c.id)).take(3) {
        push_unique(&mut deck, &card.id);
    }

    // 2. The single best card for each reaction type.
    for reaction in Reaction::ALL {
        if let Some(card_id) = reaction_best(state, reaction) {
            push_unique(&mut deck, &card_id);
        }
    }

    // 3. Every author gets represented by their own best card.
    for player in &state.players {
        let already_in = deck
            .iter()
            .any(|id| state.card(id).map(|c| c.author_id == player.id).unwrap_or(false));
        if already_in {
            continue;
        }
        if let Some(best) = by_total.iter().find(|c| c.author_id == player.id) {
            push_unique(&mut deck, &best.id);
        }
    }

    // 4. Fill remaining slots in descending total order.
    for card in &by_total {
        if deck.len() >= target {
            break;
        }
        push_unique(&mut deck, &card.id);
    }

    // Steps 1-3 push unconditionally, so the guarantees can overshoot the
    // configured ceiling. The cap wins.
    deck.truncate(state.config.deck_max);
    deck
}

/// Desired deck size: `max(players + 1, 8)`, clamped to what the config
/// allows and bounded absolutely by `deck_max`.
fn deck_target(state: &GameState) -> usize {
    let players = state.players.len();
    let hi = state.config.deck_desired.max(players);
    (players + 1)
        .max(8)
        .clamp(players, hi)
        .min(state.config.deck_max)
}

fn total_counts(votes: &[Vote]) -> HashMap<CardId, u32> {
    let mut counts: HashMap<CardId, u32> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.card_id.clone()).or_insert(0) += 1;
    }
    counts
}

/// The card with the most votes of one reaction type, ties by creation order.
fn reaction_best(state: &GameState, reaction: Reaction) -> Option<CardId> {
    let mut counts: HashMap<&CardId, u32> = HashMap::new();
    for vote in state.p1.votes.iter().filter(|v| v.reaction == reaction) {
        *counts.entry(&vote.card_id).or_insert(0) += 1;
    }
    state
        .p1
        .cards
        .iter()
        .filter_map(|c| counts.get(&c.id).map(|n| (c, *n)))
        .max_by(|(a, na), (b, nb)| na.cmp(nb).then(b.display_id.cmp(&a.display_id)))
        .map(|(c, _)| c.id.clone())
}

fn push_unique(deck: &mut Vec<CardId>, id: &str) {
    if !deck.iter().any(|d| d == id) {
        deck.push(id.to_string());
    }
}
