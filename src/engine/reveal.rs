//! Scoring: the phase-1 summary, rank-to-score conversion, winner and
//! collective-win resolution.

use crate::types::*;
use std::collections::HashMap;

/// Neutral stand-in for a player who never submitted a ranking. Diluting
/// the average beats distorting it.
const NEUTRAL_SCORE: f64 = 50.0;

/// Enter `p1_results` with the phase-1 summary computed.
pub(super) fn enter_results(state: &mut GameState) {
    state.p1.summary = Some(phase1_summary(state));
    state.phase = Phase::P1Results;
    tracing::debug!(room = %state.room_id, "phase-1 results computed");
}

/// Tally phase 1. When a final session ran its votes are the reference;
/// otherwise every phase-1 vote counts. (The live round-winner selector
/// deliberately uses a different, per-round definition.)
pub(super) fn phase1_summary(state: &GameState) -> Phase1Summary {
    let final_votes: Vec<&Vote> = state
        .p1
        .votes
        .iter()
        .filter(|v| v.session_key == SessionScope::Final.key())
        .collect();
    let pool: Vec<&Vote> = if final_votes.is_empty() {
        state.p1.votes.iter().collect()
    } else {
        final_votes
    };

    let mut totals: HashMap<&CardId, u32> = HashMap::new();
    for vote in &pool {
        *totals.entry(&vote.card_id).or_insert(0) += 1;
    }

    let mut ranked: Vec<(&ActionCard, u32)> = state
        .p1
        .cards
        .iter()
        .filter_map(|c| totals.get(&c.id).map(|n| (c, *n)))
        .collect();
    ranked.sort_by(|(a, na), (b, nb)| nb.cmp(na).then(a.display_id.cmp(&b.display_id)));

    let to_points = |(card, points): &(&ActionCard, u32)| CardPoints {
        card_id: card.id.clone(),
        author_id: card.author_id.clone(),
        points: *points,
    };

    let top3: Vec<CardPoints> = ranked.iter().take(3).map(to_points).collect();
    let crowd_favorite = ranked.first().map(to_points);

    let mut best_per_reaction = HashMap::new();
    for reaction in Reaction::ALL {
        let mut counts: HashMap<&CardId, u32> = HashMap::new();
        for vote in pool.iter().filter(|v| v.reaction == reaction) {
            *counts.entry(&vote.card_id).or_insert(0) += 1;
        }
        let best = state
            .p1
            .cards
            .iter()
            .filter_map(|c| counts.get(&c.id).map(|n| (c, *n)))
            .max_by(|(a, na), (b, nb)| na.cmp(nb).then(b.display_id.cmp(&a.display_id)));
        if let Some(entry) = best {
            best_per_reaction.insert(reaction, to_points(&entry));
        }
    }

    Phase1Summary {
        top3,
        best_per_reaction,
        crowd_favorite,
    }
}

/// Convert a deck position to a score: top of an N-card deck is 100,
/// bottom is 0, evenly spaced, rounded to one decimal.
pub fn rank_score(deck_len: usize, idx: usize) -> f64 {
    if deck_len <= 1 {
        return 100.0;
    }
    let raw = (deck_len - 1 - idx) as f64 / (deck_len - 1) as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

/// Finalize: average the secret rankings, resolve the winner from the open
/// discussion, and check the collective-win condition. Terminal.
pub(super) fn finalize(state: &mut GameState) -> Result<(), &'static str> {
    if state.phase != Phase::P2Discuss {
        return Err("finalize only from the discussion phase");
    }
    if state.p2.table_order.is_empty() {
        return Err("nothing on the table");
    }

    let deck = &state.p2.deck;
    let n = deck.len();

    let mut averages: Vec<CardAverage> = deck
        .iter()
        .map(|card_id| {
            let sum: f64 = state
                .players
                .iter()
                .map(|player| match state.ranking_for(&player.id) {
                    Some(ranking) => ranking
                        .ordering
                        .iter()
                        .position(|id| id == card_id)
                        .map(|idx| rank_score(n, idx))
                        .unwrap_or(NEUTRAL_SCORE),
                    None => NEUTRAL_SCORE,
                })
                .sum();
            let card = state.card(card_id);
            CardAverage {
                card_id: card_id.clone(),
                author_id: card.map(|c| c.author_id.clone()).unwrap_or_default(),
                average: sum / state.players.len() as f64,
            }
        })
        .collect();

    // Objective order: descending average, ties by creation order.
    averages.sort_by(|a, b| {
        b.average
            .partial_cmp(&a.average)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let da = state.card(&a.card_id).map(|c| c.display_id).unwrap_or(0);
                let db = state.card(&b.card_id).map(|c| c.display_id).unwrap_or(0);
                da.cmp(&db)
            })
    });

    let winner_card_id = state.p2.table_order[0].clone();
    let winner_author_id = state
        .card(&winner_card_id)
        .map(|c| c.author_id.clone())
        .unwrap_or_default();

    // A collective win needs public and private agreement: the table's top
    // card is the objective top card, and every non-author ranked it first.
    let objective_top = averages.first().map(|a| a.card_id.clone());
    let public_agreement = objective_top.as_deref() == Some(winner_card_id.as_str());
    let private_unanimity = state
        .players
        .iter()
        .filter(|p| p.id != winner_author_id)
        .all(|p| {
            state
                .ranking_for(&p.id)
                .map(|r| r.ordering.first() == Some(&winner_card_id))
                .unwrap_or(false)
        });
    let collective_win = public_agreement && private_unanimity;

    let phase1 = state
        .p1
        .summary
        .clone()
        .unwrap_or_else(|| phase1_summary(state));

    tracing::info!(
        room = %state.room_id,
        winner = %winner_card_id,
        collective_win,
        "game finalized"
    );

    state.reveal = Some(RevealSummary {
        phase1,
        phase2: Phase2Summary {
            averages,
            winner_card_id,
            winner_author_id,
            collective_win,
        },
        computed_at: chrono::Utc::now().to_rfc3339(),
    });
    state.p2.finalized = true;
    state.phase = Phase::Reveal;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::*;
    use super::super::*;
    use super::*;
    use crate::events::Event;

    #[test]
    fn test_rank_score_spacing() {
        assert_eq!(rank_score(2, 0), 100.0);
        assert_eq!(rank_score(2, 1), 0.0);
        assert_eq!(rank_score(5, 0), 100.0);
        assert_eq!(rank_score(5, 2), 50.0);
        assert_eq!(rank_score(5, 4), 0.0);
        // Thirds round to one decimal.
        assert_eq!(rank_score(4, 1), 66.7);
        assert_eq!(rank_score(4, 2), 33.3);
        // Degenerate single-card deck.
        assert_eq!(rank_score(1, 0), 100.0);
    }

    fn discussion_state() -> GameState {
        let themes = fixed_themes();
        let state = run(vec![setup_event(&["Ana", "Bruno"], VoteMode::PerRound, 1)]);
        let mut state = write_round(state, &["a", "b"]);
        state = reduce(&state, Event::P1EndVoting, &themes);
        state = reduce(&state, Event::Next, &themes);
        reduce(&state, Event::P2Start, &themes)
    }

    #[test]
    fn test_opposite_rankings_average_to_midpoint() {
        let themes = fixed_themes();
        let state = discussion_state();
        let deck = state.p2.deck.clone();
        assert_eq!(deck.len(), 2);
        let reversed: Vec<CardId> = deck.iter().rev().cloned().collect();

        let state = reduce(
            &state,
            Event::P2SubmitRanking {
                player_id: "p1".to_string(),
                ordering: deck.clone(),
            },
            &themes,
        );
        let state = reduce(
            &state,
            Event::P2SubmitRanking {
                player_id: "p2".to_string(),
                ordering: reversed,
            },
            &themes,
        );
        let state = reduce(&state, Event::P2Finalize, &themes);

        assert_eq!(state.phase, Phase::Reveal);
        let summary = state.reveal.as_ref().unwrap();
        for entry in &summary.phase2.averages {
            assert_eq!(entry.average, 50.0);
        }
        // Perfectly tied averages: objective order falls back to creation
        // order.
        assert_eq!(summary.phase2.averages[0].card_id, "card_1");
    }

    #[test]
    fn test_missing_ranking_contributes_neutral_midpoint() {
        let themes = fixed_themes();
        let state = discussion_state();
        let deck = state.p2.deck.clone();
        let state = reduce(
            &state,
            Event::P2SubmitRanking {
                player_id: "p1".to_string(),
                ordering: deck.clone(),
            },
            &themes,
        );
        let state = reduce(
            &state,
            Event::P2SkipRanking {
                player_id: "p2".to_string(),
            },
            &themes,
        );
        let state = reduce(&state, Event::P2Finalize, &themes);
        let summary = state.reveal.as_ref().unwrap();
        // One ranking of [top, bottom] plus one neutral 50: (100+50)/2 and
        // (0+50)/2.
        let by_card: std::collections::HashMap<&str, f64> = summary
            .phase2
            .averages
            .iter()
            .map(|a| (a.card_id.as_str(), a.average))
            .collect();
        assert_eq!(by_card[deck[0].as_str()], 75.0);
        assert_eq!(by_card[deck[1].as_str()], 25.0);
    }

    #[test]
    fn test_finalize_is_terminal_except_reset() {
        let themes = fixed_themes();
        let mut state = discussion_state();
        for player in ["p1", "p2"] {
            state = reduce(
                &state,
                Event::P2SkipRanking {
                    player_id: player.to_string(),
                },
                &themes,
            );
        }
        let state = reduce(&state, Event::P2Finalize, &themes);
        assert_eq!(state.phase, Phase::Reveal);
        assert!(state.p2.finalized);

        // Another finalize, or any phase event, changes nothing.
        let frozen = reduce(&state, Event::P2Finalize, &themes);
        assert_eq!(frozen.phase, Phase::Reveal);
        assert_eq!(frozen.reveal, state.reveal);

        let reset = reduce(
            &state,
            Event::ResetAll {
                room_id: "room_test".to_string(),
            },
            &themes,
        );
        assert_eq!(reset.phase, Phase::Setup);
    }
}
