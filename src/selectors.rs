//! Read-only derived views over `GameState`. Nothing here mutates anything;
//! the UI calls these every render.

use crate::types::*;
use std::collections::HashMap;

/// Per-card reaction breakdown for one voting session.
pub type ReactionTally = HashMap<CardId, HashMap<Reaction, u32>>;

/// The current round's live winner by raw vote count. This is a per-round
/// readout and intentionally simpler than the cross-session phase-1 summary.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundWinner {
    pub card_id: CardId,
    pub author_name: String,
    pub points: u32,
}

pub fn card_by_id<'a>(state: &'a GameState, card_id: &str) -> Option<&'a ActionCard> {
    state.card(card_id)
}

/// Setup is allowed to start once at least two real names are present.
pub fn can_start_game(names: &[String]) -> bool {
    names.iter().filter(|n| !n.trim().is_empty()).count() >= 2
}

pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Setup => "Lobby",
        Phase::P1Write => "Writing",
        Phase::P1Vote => "Reactions",
        Phase::P1Review => "Round Review",
        Phase::P1Results => "Phase 1 Results",
        Phase::P2Rank => "Secret Ranking",
        Phase::P2Discuss => "Table Talk",
        Phase::Reveal => "The Reveal",
    }
}

/// Reaction counts per card for the session matching `key`, defaulting to
/// the current round's session.
pub fn session_tally(state: &GameState, key: Option<&str>) -> ReactionTally {
    let default_key = SessionScope::Round(state.p1.round).key();
    let key = key.unwrap_or(&default_key);

    let mut tally: ReactionTally = HashMap::new();
    for vote in state.p1.votes.iter().filter(|v| v.session_key == key) {
        *tally
            .entry(vote.card_id.clone())
            .or_default()
            .entry(vote.reaction)
            .or_insert(0) += 1;
    }
    tally
}

/// Winner of the current round by total vote count (ties by creation
/// order). None when the round has no votes yet.
pub fn round_winner(state: &GameState) -> Option<RoundWinner> {
    let key = SessionScope::Round(state.p1.round).key();
    let mut totals: HashMap<&CardId, u32> = HashMap::new();
    for vote in state.p1.votes.iter().filter(|v| v.session_key == key) {
        *totals.entry(&vote.card_id).or_insert(0) += 1;
    }

    state
        .p1
        .cards
        .iter()
        .filter_map(|c| totals.get(&c.id).map(|n| (c, *n)))
        .max_by(|(a, na), (b, nb)| na.cmp(nb).then(b.display_id.cmp(&a.display_id)))
        .map(|(card, points)| RoundWinner {
            card_id: card.id.clone(),
            author_name: state
                .player(&card.author_id)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            points,
        })
}

/// Display name of the final winner's author, once the reveal exists.
pub fn final_winner_name(state: &GameState) -> Option<String> {
    let reveal = state.reveal.as_ref()?;
    state
        .player(&reveal.phase2.winner_author_id)
        .map(|p| p.name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> GameState {
        let mut state = GameState::new("room_sel");
        state.players = vec![
            Player {
                id: "p1".to_string(),
                name: "Ana".to_string(),
            },
            Player {
                id: "p2".to_string(),
                name: "Bruno".to_string(),
            },
        ];
        state.p1.round = 1;
        for (i, author) in ["p1", "p2"].iter().enumerate() {
            let display_id = (i + 1) as u32;
            state.p1.cards.push(ActionCard {
                id: format!("card_{}", display_id),
                display_id,
                author_id: author.to_string(),
                round: 1,
                text: format!("text {}", display_id),
                created_at: chrono::Utc::now().to_rfc3339(),
            });
        }
        state
    }

    fn add_vote(state: &mut GameState, voter: &str, card: &str, reaction: Reaction, key: &str) {
        let vote_no = state.next_vote_no;
        state.next_vote_no += 1;
        state.p1.votes.push(Vote {
            id: format!("vote_{}", vote_no),
            session_key: key.to_string(),
            voter_id: voter.to_string(),
            voter_name: voter.to_string(),
            card_id: card.to_string(),
            reaction,
            created_at: chrono::Utc::now().to_rfc3339(),
        });
    }

    #[test]
    fn test_can_start_game() {
        assert!(!can_start_game(&[]));
        assert!(!can_start_game(&["Ana".to_string(), "   ".to_string()]));
        assert!(can_start_game(&["Ana".to_string(), "Bruno".to_string()]));
    }

    #[test]
    fn test_phase_labels_are_human() {
        assert_eq!(phase_label(Phase::Setup), "Lobby");
        assert_eq!(phase_label(Phase::P2Discuss), "Table Talk");
    }

    #[test]
    fn test_session_tally_scoped_to_key() {
        let mut state = sample_state();
        add_vote(&mut state, "p2", "card_1", Reaction::Laugh, "round:1");
        add_vote(&mut state, "p2", "card_1", Reaction::Heart, "round:1");
        add_vote(&mut state, "p1", "card_2", Reaction::Laugh, "final");

        let tally = session_tally(&state, None);
        assert_eq!(tally["card_1"][&Reaction::Laugh], 1);
        assert_eq!(tally["card_1"][&Reaction::Heart], 1);
        assert!(!tally.contains_key("card_2"));

        let final_tally = session_tally(&state, Some("final"));
        assert_eq!(final_tally["card_2"][&Reaction::Laugh], 1);
    }

    #[test]
    fn test_round_winner_uses_raw_counts() {
        let mut state = sample_state();
        assert_eq!(round_winner(&state), None);

        add_vote(&mut state, "p2", "card_1", Reaction::Laugh, "round:1");
        add_vote(&mut state, "p2", "card_1", Reaction::Heart, "round:1");
        add_vote(&mut state, "p1", "card_2", Reaction::Fire, "round:1");

        let winner = round_winner(&state).unwrap();
        assert_eq!(winner.card_id, "card_1");
        assert_eq!(winner.points, 2);
        assert_eq!(winner.author_name, "Ana");
    }

    #[test]
    fn test_round_winner_tie_goes_to_earlier_card() {
        let mut state = sample_state();
        add_vote(&mut state, "p2", "card_1", Reaction::Laugh, "round:1");
        add_vote(&mut state, "p1", "card_2", Reaction::Laugh, "round:1");
        let winner = round_winner(&state).unwrap();
        assert_eq!(winner.card_id, "card_1");
    }

    #[test]
    fn test_final_winner_name() {
        let mut state = sample_state();
        assert_eq!(final_winner_name(&state), None);
        state.reveal = Some(RevealSummary {
            phase1: Phase1Summary {
                top3: Vec::new(),
                best_per_reaction: HashMap::new(),
                crowd_favorite: None,
            },
            phase2: Phase2Summary {
                averages: Vec::new(),
                winner_card_id: "card_2".to_string(),
                winner_author_id: "p2".to_string(),
                collective_win: false,
            },
            computed_at: chrono::Utc::now().to_rfc3339(),
        });
        assert_eq!(final_winner_name(&state), Some("Bruno".to_string()));
    }
}
