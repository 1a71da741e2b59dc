//! The reaction-voting protocol: budget-limited casts, voter advancement,
//! and session conclusion.

use super::reveal;
use crate::types::*;
use std::collections::HashMap;

/// Open a session over the cards the scope covers. An empty card set
/// concludes on the spot, so a round where everyone skipped never strands
/// the machine in `p1_vote`.
pub(super) fn open_session(state: &mut GameState, scope: SessionScope) {
    let card_ids: Vec<CardId> = match scope {
        SessionScope::Round(n) => state
            .p1
            .cards
            .iter()
            .filter(|c| c.round == n)
            .map(|c| c.id.clone())
            .collect(),
        SessionScope::Final => state.p1.cards.iter().map(|c| c.id.clone()).collect(),
    };

    if card_ids.is_empty() {
        tracing::debug!(room = %state.room_id, ?scope, "no cards to vote on, skipping session");
        finish(state, scope);
        return;
    }

    let voter_ids: Vec<PlayerId> = state.players.iter().map(|p| p.id.clone()).collect();
    let votes_used: HashMap<PlayerId, u32> = voter_ids.iter().map(|id| (id.clone(), 0)).collect();
    let voter_done: HashMap<PlayerId, bool> =
        voter_ids.iter().map(|id| (id.clone(), false)).collect();

    state.p1.session = Some(VotingSession {
        scope,
        card_ids,
        voter_ids,
        active_voter: 0,
        votes_used,
        voter_done,
        locked: false,
        hide_theme: !state.config.show_theme_in_voting,
    });
    state.phase = Phase::P1Vote;
    tracing::debug!(room = %state.room_id, ?scope, "voting session opened");
}

/// One reaction from the active voter onto one eligible card.
pub(super) fn cast_reaction(
    state: &mut GameState,
    voter_id: &str,
    card_id: &str,
    reaction: Reaction,
) -> Result<(), &'static str> {
    if state.phase != Phase::P1Vote {
        return Err("not in a voting phase");
    }
    let session = state.p1.session.as_ref().ok_or("no voting session")?;
    if session.locked {
        return Err("session is locked");
    }
    let active = session
        .voter_ids
        .get(session.active_voter)
        .ok_or("no active voter")?;
    if active != voter_id {
        return Err("not the active voter");
    }
    if session.is_done(voter_id) {
        return Err("voter already done");
    }
    if session.used_by(voter_id) >= state.config.max_reactions_per_voter {
        return Err("reaction budget exhausted");
    }
    if !session.card_ids.iter().any(|id| id == card_id) {
        return Err("card not in this session");
    }
    let session_key = session.scope.key();

    let card = state.card(card_id).ok_or("unknown card")?;
    if card.author_id == voter_id && !state.config.allow_self_vote {
        return Err("self-votes are disabled");
    }

    // Stacking distinct reactions on one card is fine; the exact same
    // (voter, card, reaction) in one session is a stale double-click.
    let duplicate = state.p1.votes.iter().any(|v| {
        v.session_key == session_key
            && v.voter_id == voter_id
            && v.card_id == card_id
            && v.reaction == reaction
    });
    if duplicate {
        return Err("duplicate reaction");
    }

    let voter_name = state
        .player(voter_id)
        .map(|p| p.name.clone())
        .unwrap_or_default();
    let vote_no = state.next_vote_no;
    state.next_vote_no += 1;
    state.p1.votes.push(Vote {
        id: format!("vote_{}", vote_no),
        session_key,
        voter_id: voter_id.to_string(),
        voter_name,
        card_id: card_id.to_string(),
        reaction,
        created_at: chrono::Utc::now().to_rfc3339(),
    });

    let max = state.config.max_reactions_per_voter;
    let session = state.p1.session.as_mut().expect("session checked above");
    let used = session.votes_used.entry(voter_id.to_string()).or_insert(0);
    *used += 1;
    if *used >= max {
        session.voter_done.insert(voter_id.to_string(), true);
        advance_active(session);
    }
    conclude_if_complete(state);
    Ok(())
}

/// The active voter gives up their remaining budget.
pub(super) fn skip_voter(state: &mut GameState, voter_id: &str) -> Result<(), &'static str> {
    if state.phase != Phase::P1Vote {
        return Err("not in a voting phase");
    }
    let session = state.p1.session.as_mut().ok_or("no voting session")?;
    if session.locked {
        return Err("session is locked");
    }
    let active = session
        .voter_ids
        .get(session.active_voter)
        .ok_or("no active voter")?;
    if active != voter_id {
        return Err("not the active voter");
    }
    session.voter_done.insert(voter_id.to_string(), true);
    advance_active(session);
    conclude_if_complete(state);
    Ok(())
}

/// Advance to the next voter with budget left, without marking anyone done.
pub(super) fn next_voter(state: &mut GameState) -> Result<(), &'static str> {
    if state.phase != Phase::P1Vote {
        return Err("not in a voting phase");
    }
    let session = state.p1.session.as_mut().ok_or("no voting session")?;
    if session.locked {
        return Err("session is locked");
    }
    advance_active(session);
    conclude_if_complete(state);
    Ok(())
}

/// Hand the turn to a specific voter (pass-the-device order is social,
/// not strict).
pub(super) fn set_active_voter(state: &mut GameState, voter_id: &str) -> Result<(), &'static str> {
    if state.phase != Phase::P1Vote {
        return Err("not in a voting phase");
    }
    let session = state.p1.session.as_mut().ok_or("no voting session")?;
    if session.locked {
        return Err("session is locked");
    }
    let idx = session
        .voter_ids
        .iter()
        .position(|id| id == voter_id)
        .ok_or("unknown voter")?;
    if session.is_done(voter_id) {
        return Err("voter already done");
    }
    session.active_voter = idx;
    Ok(())
}

/// Force-conclude the session regardless of who still has budget.
pub(super) fn end_voting(state: &mut GameState) -> Result<(), &'static str> {
    if state.phase != Phase::P1Vote {
        return Err("not in a voting phase");
    }
    let session = state.p1.session.as_mut().ok_or("no voting session")?;
    session.locked = true;
    let scope = session.scope;
    state.p1.session = None;
    finish(state, scope);
    Ok(())
}

/// Move the pointer to the next not-done voter after the current one.
fn advance_active(session: &mut VotingSession) {
    let n = session.voter_ids.len();
    for step in 1..=n {
        let idx = (session.active_voter + step) % n;
        if !session.is_done(&session.voter_ids[idx]) {
            session.active_voter = idx;
            return;
        }
    }
}

fn conclude_if_complete(state: &mut GameState) {
    let complete = state
        .p1
        .session
        .as_ref()
        .map(|s| s.voter_ids.iter().all(|v| s.is_done(v)))
        .unwrap_or(false);
    if !complete {
        return;
    }
    let session = state.p1.session.take().expect("session checked above");
    finish(state, session.scope);
}

/// Where a concluded session lands: round scope reviews, final scope goes
/// straight to phase-1 results.
fn finish(state: &mut GameState, scope: SessionScope) {
    state.p1.session = None;
    match scope {
        SessionScope::Round(_) => state.phase = Phase::P1Review,
        SessionScope::Final => {
            state.p1.final_session_done = true;
            reveal::enter_results(state);
        }
    }
    tracing::debug!(room = %state.room_id, ?scope, "voting session concluded");
}
