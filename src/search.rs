use std::cmp::Reverse;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::board::Board;
use crate::evaluation::evaluate_position;
use crate::movegen::{find_legal_moves, Move};

pub const DEFAULT_DEPTH: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Plies searched from the root.
    pub depth: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }
}

/// A legal move together with its ordering hint. Captures are killer moves:
/// they are tried first and are never searched at reduced depth.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    mv: Move,
    killer: bool,
}

/// Fixed depth alpha-beta search. The random generator only shuffles quiet
/// moves, so a seeded generator makes the search reproducible.
pub struct Search<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    nodes_searched: u64,
}

impl<'r, R: Rng + ?Sized> Search<'r, R> {
    pub fn new(rng: &'r mut R) -> Self {
        Self {
            rng,
            nodes_searched: 0,
        }
    }

    /// Returns the best move found at `depth` plies, or `None` when the side to
    /// move has no legal moves.
    pub fn find_best_move(&mut self, board: &Board, depth: u32) -> Option<Move> {
        self.nodes_searched = 0;

        let mut best: Option<(Move, i32)> = None;
        let mut alpha = i32::MIN;

        for candidate in self.order_moves(board) {
            let child = board.apply(candidate.mv);
            let score = self.alphabeta(
                &child,
                candidate,
                depth.saturating_sub(1),
                alpha,
                i32::MAX,
                false,
                false,
            );

            // ties keep the earlier move
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((candidate.mv, score));
                alpha = score;
            }
        }

        match best {
            Some((mv, score)) => {
                debug!(depth, nodes = self.nodes_searched, score, best = %mv, "search finished");
                Some(mv)
            }
            None => {
                debug!(depth, "no legal moves at the root");
                None
            }
        }
    }

    pub fn nodes_searched(&self) -> u64 {
        self.nodes_searched
    }

    fn alphabeta(
        &mut self,
        board: &Board,
        last: Candidate,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximising: bool,
        reduced: bool,
    ) -> i32 {
        self.nodes_searched += 1;

        if depth == 0 {
            // the evaluation favours the side that just moved
            let score = evaluate_position(board);
            return if maximising { -score } else { score };
        }

        let (depth, reduced) = if reduces(last, depth, reduced) {
            (depth - 2, true)
        } else {
            (depth - 1, reduced)
        };

        // no moves means checkmate or stalemate; both score as the worst outcome
        // for the side to move
        let candidates = self.order_moves(board);

        if maximising {
            let mut value = i32::MIN;
            for candidate in candidates {
                let child = board.apply(candidate.mv);
                let score = self.alphabeta(&child, candidate, depth, alpha, beta, false, reduced);
                value = value.max(score);
                alpha = alpha.max(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        } else {
            let mut value = i32::MAX;
            for candidate in candidates {
                let child = board.apply(candidate.mv);
                let score = self.alphabeta(&child, candidate, depth, alpha, beta, true, reduced);
                value = value.min(score);
                beta = beta.min(value);
                if alpha >= beta {
                    break;
                }
            }
            value
        }
    }

    /// Killer moves first, strongest promotion first among them, then the
    /// remaining promotions, then every quiet move in random order.
    fn order_moves(&mut self, board: &Board) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = find_legal_moves(board)
            .into_iter()
            .map(|mv| Candidate {
                mv,
                killer: board.is_capture(&mv),
            })
            .collect();

        candidates.sort_by_key(|candidate| (Reverse(candidate.killer), Reverse(candidate.mv.promotion)));

        let quiet_start = candidates
            .iter()
            .position(|candidate| !candidate.killer && candidate.mv.promotion.is_none())
            .unwrap_or(candidates.len());
        candidates[quiet_start..].shuffle(&mut *self.rng);

        candidates
    }
}

/// Late move reduction: a quiet move into a node of depth 2 to 4 has its
/// subtree searched two plies shallower, at most once per line.
fn reduces(last: Candidate, depth: u32, reduced: bool) -> bool {
    !reduced && !last.killer && last.mv.promotion.is_none() && (2..=4).contains(&depth)
}

/// Picks a move for the side to move by searching `depth` plies.
pub fn evaluate<R: Rng + ?Sized>(board: &Board, depth: u32, rng: &mut R) -> Option<Move> {
    Search::new(rng).find_best_move(board, depth)
}
