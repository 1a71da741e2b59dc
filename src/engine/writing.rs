//! Setup and the phase-1 writing loop: turn order, round ends, and the
//! review continuation.

use super::{reveal, voting};
use crate::random::fresh_room_seed;
use crate::themes::{self, ThemesProvider};
use crate::types::*;

pub(super) struct SetupPayload {
    pub players: Vec<String>,
    pub vote_mode: VoteMode,
    pub p1_rounds: u32,
    pub seconds_per_turn: u32,
    pub max_reactions_per_voter: u32,
    pub deck_desired: usize,
    pub deck_max: usize,
    pub allow_self_vote: bool,
    pub show_theme_in_voting: bool,
    pub p1_theme_slots: Vec<String>,
    pub p2_theme: String,
    pub seed: Option<u64>,
}

pub(super) fn setup_start(
    state: &mut GameState,
    payload: SetupPayload,
    themes: &dyn ThemesProvider,
) -> Result<(), &'static str> {
    if state.phase != Phase::Setup {
        return Err("setup only from a fresh room");
    }

    let names: Vec<String> = payload
        .players
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    if names.len() < 2 {
        return Err("need at least two players");
    }

    state.players = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Player {
            id: format!("p{}", i + 1),
            name,
        })
        .collect();

    let p1_rounds = payload.p1_rounds.max(1);
    let mut slots = payload.p1_theme_slots;
    slots.resize(p1_rounds as usize, String::new());

    state.config = GameConfig {
        p1_rounds,
        seconds_per_turn: payload.seconds_per_turn,
        vote_mode: payload.vote_mode,
        max_reactions_per_voter: payload.max_reactions_per_voter.max(1),
        deck_desired: payload.deck_desired.max(1),
        // The deck must be able to hold one card per player.
        deck_max: payload
            .deck_max
            .max(payload.deck_desired.max(1))
            .max(state.players.len()),
        allow_self_vote: payload.allow_self_vote,
        show_theme_in_voting: payload.show_theme_in_voting,
        p1_theme_slots: slots,
        p2_theme_slot: payload.p2_theme,
        seed: payload.seed.unwrap_or_else(fresh_room_seed),
    };

    tracing::info!(
        room = %state.room_id,
        players = state.players.len(),
        rounds = state.config.p1_rounds,
        seed = state.config.seed,
        "game started"
    );

    begin_round(state, 1, themes);
    Ok(())
}

/// Record the active writer's card and advance the turn pointer.
pub(super) fn submit_card(
    state: &mut GameState,
    player_id: &str,
    text: &str,
    themes: &dyn ThemesProvider,
) -> Result<(), &'static str> {
    if state.phase != Phase::P1Write {
        return Err("not in the writing phase");
    }
    let writer = state.active_writer().ok_or("no active writer")?;
    if writer.id != player_id {
        return Err("not this player's turn");
    }
    let text = text.trim();
    if text.is_empty() {
        return Err("empty card text");
    }

    let display_id = state.next_display_id;
    state.next_display_id += 1;
    state.p1.cards.push(ActionCard {
        id: format!("card_{}", display_id),
        display_id,
        author_id: player_id.to_string(),
        round: state.p1.round,
        text: text.to_string(),
        created_at: chrono::Utc::now().to_rfc3339(),
    });

    advance_writer(state, themes);
    Ok(())
}

/// The active writer passes without contributing this round.
pub(super) fn skip_writer(
    state: &mut GameState,
    player_id: &str,
    themes: &dyn ThemesProvider,
) -> Result<(), &'static str> {
    if state.phase != Phase::P1Write {
        return Err("not in the writing phase");
    }
    let writer = state.active_writer().ok_or("no active writer")?;
    if writer.id != player_id {
        return Err("not this player's turn");
    }
    advance_writer(state, themes);
    Ok(())
}

/// Explicitly open a voting session. Normally the round end does this on its
/// own; the driver uses this to re-enter voting from review (e.g. a final
/// pass) or with an explicit scope.
pub(super) fn start_voting(
    state: &mut GameState,
    scope: Option<SessionScope>,
) -> Result<(), &'static str> {
    if state.phase != Phase::P1Write && state.phase != Phase::P1Review {
        return Err("voting can only start from writing or review");
    }
    if state.p1.session.is_some() {
        return Err("a voting session is already running");
    }
    let scope = scope.unwrap_or(SessionScope::Round(state.p1.round));
    if let SessionScope::Round(n) = scope {
        if n == 0 || n > state.p1.round {
            return Err("unknown round");
        }
    }
    if scope == SessionScope::Final && state.p1.final_session_done {
        return Err("final voting already ran");
    }
    voting::open_session(state, scope);
    Ok(())
}

/// The generic continuation signal, valid only in review: next round if any
/// remain, else a final session (per_round_and_final, once), else results.
pub(super) fn review_next(
    state: &mut GameState,
    themes: &dyn ThemesProvider,
) -> Result<(), &'static str> {
    if state.phase != Phase::P1Review {
        return Err("nothing to continue here");
    }
    if state.p1.round < state.config.p1_rounds {
        begin_round(state, state.p1.round + 1, themes);
    } else if state.config.vote_mode == VoteMode::PerRoundAndFinal && !state.p1.final_session_done {
        voting::open_session(state, SessionScope::Final);
    } else {
        reveal::enter_results(state);
    }
    Ok(())
}

fn begin_round(state: &mut GameState, round: u32, themes: &dyn ThemesProvider) {
    state.p1.round = round;
    state.p1.active_writer = 0;
    state.p1.theme = themes::round_theme(&state.config, themes, round);
    state.phase = Phase::P1Write;
    tracing::debug!(room = %state.room_id, round, theme = %state.p1.theme, "round started");
}

/// Move the turn pointer; a full pass over the player list ends the round.
fn advance_writer(state: &mut GameState, themes: &dyn ThemesProvider) {
    state.p1.active_writer += 1;
    if state.p1.active_writer < state.players.len() {
        return;
    }

    let last_round = state.p1.round >= state.config.p1_rounds;
    match state.config.vote_mode {
        // No per-round voting: straight into the next round's writing.
        VoteMode::FinalOnly if !last_round => begin_round(state, state.p1.round + 1, themes),
        VoteMode::FinalOnly => voting::open_session(state, SessionScope::Final),
        _ => {
            let round = state.p1.round;
            voting::open_session(state, SessionScope::Round(round));
        }
    }
}
