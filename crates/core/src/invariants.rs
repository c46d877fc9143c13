// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster-wide safety checks
//!
//! These need a view of every process at once, so they run in tests,
//! simulations and monitors, never inside a single process's handlers.

use crate::rank::Rank;
use crate::state::ProcessState;
use thiserror::Error;

/// A broken protocol invariant
///
/// Always a protocol or transport bug, never a condition to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("token duplicated: held by {holders:?} with {in_flight} in flight")]
    TokenDuplicated { holders: Vec<Rank>, in_flight: usize },
    #[error("token lost: no holder and none in flight")]
    TokenLost,
    #[error("critical section shared by {inside:?}")]
    SharedCriticalSection { inside: Vec<Rank> },
    #[error("token arrived at {rank} which already holds it")]
    TokenReceivedTwice { rank: Rank },
    #[error("father of {rank} points outside the cluster: {father}")]
    DanglingFather { rank: Rank, father: Rank },
    #[error("father chain from {start} does not terminate within {limit} hops")]
    FatherCycle { start: Rank, limit: usize },
    #[error("{rank} queued successor {next} without requesting")]
    SuccessorWithoutRequest { rank: Rank, next: Rank },
    #[error("quiescent father chain from {start} ends at {tail} instead of token holder {holder}")]
    ChainMissesHolder { start: Rank, tail: Rank, holder: Rank },
}

/// Holders plus in-flight tokens must be exactly one
pub fn check_token_conservation(
    states: &[ProcessState],
    in_flight: usize,
) -> Result<(), InvariantViolation> {
    let holders: Vec<Rank> = states.iter().filter(|s| s.token).map(|s| s.pid).collect();
    match holders.len() + in_flight {
        0 => Err(InvariantViolation::TokenLost),
        1 => Ok(()),
        _ => Err(InvariantViolation::TokenDuplicated { holders, in_flight }),
    }
}

/// At most one process may be authorized to enter
pub fn check_mutual_exclusion(states: &[ProcessState]) -> Result<(), InvariantViolation> {
    let inside: Vec<Rank> = states
        .iter()
        .filter(|s| s.may_enter())
        .map(|s| s.pid)
        .collect();
    if inside.len() > 1 {
        return Err(InvariantViolation::SharedCriticalSection { inside });
    }
    Ok(())
}

/// Follow `father` pointers from `start` to the tail
///
/// Returns the ranks visited after `start`, ending at the tail. The walk
/// gives up after `size - 1` hops, which only a cycle can exceed.
pub fn father_chain(states: &[ProcessState], start: Rank) -> Result<Vec<Rank>, InvariantViolation> {
    let limit = states.len().saturating_sub(1);
    let mut chain = Vec::new();
    let mut current = start;

    while let Some(father) = states.get(current.index()).and_then(|s| s.father) {
        if father.index() >= states.len() {
            return Err(InvariantViolation::DanglingFather {
                rank: current,
                father,
            });
        }
        if chain.len() == limit {
            return Err(InvariantViolation::FatherCycle { start, limit });
        }
        chain.push(father);
        current = father;
    }

    Ok(chain)
}

/// Every father chain must terminate
pub fn check_father_chains(states: &[ProcessState]) -> Result<(), InvariantViolation> {
    for state in states {
        father_chain(states, state.pid)?;
    }
    Ok(())
}

/// A queued successor is only ever recorded by a requester, which will hold
/// the token before it releases and hands it on
pub fn check_successors(states: &[ProcessState]) -> Result<(), InvariantViolation> {
    for state in states {
        if let (Some(next), false) = (state.next, state.requesting) {
            return Err(InvariantViolation::SuccessorWithoutRequest {
                rank: state.pid,
                next,
            });
        }
    }
    Ok(())
}

/// Invariants that hold between any two message steps
pub fn check_all(states: &[ProcessState], tokens_in_flight: usize) -> Result<(), InvariantViolation> {
    check_token_conservation(states, tokens_in_flight)?;
    check_mutual_exclusion(states)?;
    check_successors(states)?;
    check_father_chains(states)
}

/// Once nobody requests and nothing is in flight, every chain ends at the holder
pub fn check_quiescent(states: &[ProcessState]) -> Result<(), InvariantViolation> {
    check_all(states, 0)?;

    let Some(holder) = states.iter().find(|s| s.token).map(|s| s.pid) else {
        return Err(InvariantViolation::TokenLost);
    };

    for state in states {
        let tail = father_chain(states, state.pid)?
            .last()
            .copied()
            .unwrap_or(state.pid);
        if tail != holder {
            return Err(InvariantViolation::ChainMissesHolder {
                start: state.pid,
                tail,
                holder,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "invariants_tests.rs"]
mod tests;
