//! The state machine. One pure entry point: `reduce(state, event) -> state`.
//!
//! Every transition lives in a submodule, split the same way the phases are:
//! writing turns, the voting protocol, phase-2 deck construction, secret
//! ranking, and the reveal math. Nothing in here blocks, spawns, or touches
//! the clock beyond stamping timestamps; all waiting is represented as state.

mod deck;
mod ranking;
mod reveal;
mod voting;
mod writing;

pub use deck::build_deck;
pub use ranking::sanitize_ordering;
pub use reveal::rank_score;

use crate::events::Event;
use crate::themes::ThemesProvider;
use crate::types::*;

/// Apply one event. Invalid events (wrong phase, wrong actor, unknown ids)
/// return the state unchanged; a pass-the-device UI produces stale clicks
/// and double-submissions, and those must be absorbed, not surfaced.
pub fn reduce(state: &GameState, event: Event, themes: &dyn ThemesProvider) -> GameState {
    let mut next = state.clone();
    match apply(&mut next, event, themes) {
        Ok(()) => {
            next.updated_at = chrono::Utc::now().to_rfc3339();
            next
        }
        Err(why) => {
            tracing::debug!(room = %state.room_id, phase = ?state.phase, why, "event rejected");
            state.clone()
        }
    }
}

fn apply(
    state: &mut GameState,
    event: Event,
    themes: &dyn ThemesProvider,
) -> Result<(), &'static str> {
    match event {
        Event::ResetAll { room_id } => {
            if room_id != state.room_id {
                return Err("reset for a different room");
            }
            tracing::info!(room = %room_id, "hard reset");
            *state = GameState::new(room_id);
            Ok(())
        }
        Event::SetupStart {
            players,
            vote_mode,
            p1_rounds,
            seconds_per_turn,
            max_reactions_per_voter,
            deck_desired,
            deck_max,
            allow_self_vote,
            show_theme_in_voting,
            p1_theme_slots,
            p2_theme,
            seed,
        } => writing::setup_start(
            state,
            writing::SetupPayload {
                players,
                vote_mode,
                p1_rounds,
                seconds_per_turn,
                max_reactions_per_voter,
                deck_desired,
                deck_max,
                allow_self_vote,
                show_theme_in_voting,
                p1_theme_slots,
                p2_theme,
                seed,
            },
            themes,
        ),
        Event::Next => writing::review_next(state, themes),
        Event::SetActiveVoter { voter_id } => voting::set_active_voter(state, &voter_id),
        Event::P1Submit { player_id, text } => {
            writing::submit_card(state, &player_id, &text, themes)
        }
        Event::P1Skip { player_id } => writing::skip_writer(state, &player_id, themes),
        Event::P1StartVoting { scope } => writing::start_voting(state, scope),
        Event::P1CastReaction {
            voter_id,
            card_id,
            reaction,
        } => voting::cast_reaction(state, &voter_id, &card_id, reaction),
        Event::P1SkipVoter { voter_id } => voting::skip_voter(state, &voter_id),
        Event::P1NextVoter => voting::next_voter(state),
        Event::P1EndVoting => voting::end_voting(state),
        Event::P2Start => deck::start_phase2(state, themes),
        Event::P2SetOrdering { ordering } => ranking::set_table_order(state, &ordering),
        Event::P2Move { from, to } => ranking::move_card(state, from, to),
        Event::P2SubmitRanking {
            player_id,
            ordering,
        } => ranking::submit_ranking(state, &player_id, &ordering),
        Event::P2SkipRanking { player_id } => ranking::skip_ranking(state, &player_id),
        Event::P2Finalize => reveal::finalize(state),
        // Unknown event tags are absorbed, same as any other stale input.
        Event::Unknown => Err("unknown event"),
    }
}
