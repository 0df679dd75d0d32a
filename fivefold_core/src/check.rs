//! Single-board and cross-timeline attack and check queries.
//!
//! Attack queries ignore legality: a piece "attacks" every square its
//! movement pattern reaches, whether or not moving there would expose its
//! own king. Threats cross timelines by re-rooting a piece's candidates
//! onto the queried board, so a queen two timelines over projects onto
//! the same `(x, y)` geometry it covers at home.

use crate::board::{Board, Side, Vec4};
use crate::game::Game;
use crate::move_gen;

/// Returns true if a piece of `by` on `board` attacks the square
/// `(x, y)` of that same board.
pub fn attacks_square(board: &Board, x: i32, y: i32, by: Side) -> bool {
    board
        .pieces()
        .filter(|(piece, _, _)| piece.side == by)
        .any(|(_, px, py)| {
            move_gen::piece_targets(board, px, py, None)
                .iter()
                .any(|target| target.xy() == (x, y))
        })
}

/// Returns true if a piece of `by` on another timeline attacks the
/// position `target` on `target_board`.
///
/// Only the current boards of active timelines project threats, and only
/// those whose player has already moved relative to the queried board --
/// their side to move differs from the target board's. The board at the
/// target's own `(l, t)` slot is skipped here: the caller evaluates the
/// target board itself with [`attacks_square`], which also makes this
/// query correct for simulated clones standing in for their slot.
pub fn attacked_from_other_timelines(
    game: &Game,
    target: Vec4,
    by: Side,
    target_board: &Board,
) -> bool {
    for timeline in game.active_timelines() {
        let board = timeline.current_board();
        if (board.l(), board.t()) == (target_board.l(), target_board.t()) {
            continue;
        }
        if board.to_move() == target_board.to_move() {
            continue;
        }
        let hit = board
            .pieces()
            .filter(|(piece, _, _)| piece.side == by)
            .any(|(_, px, py)| {
                move_gen::piece_targets(board, px, py, Some(target.l))
                    .iter()
                    .any(|candidate| candidate.xy() == target.xy())
            });
        if hit {
            return true;
        }
    }
    false
}

/// Returns true if `side`'s king on `board` is attacked, on the board
/// itself or from another timeline. A board without that king is not in
/// check.
pub fn king_in_check(game: &Game, board: &Board, side: Side) -> bool {
    let Some(king) = board.find_king(side) else {
        return false;
    };
    attacks_square(board, king.x, king.y, side.opponent())
        || attacked_from_other_timelines(game, king, side.opponent(), board)
}

/// Returns true if moving the piece on `from` to `to`'s square would
/// leave the mover's own king attacked.
///
/// The test applies the bare geometric mutation on a clone of the source
/// board -- capture whatever sits on the target square, relocate the
/// piece -- and re-runs the check query on the clone. Promotion, castling
/// rook movement and en-passant removal do not change the attack geometry
/// this test cares about, and the other timelines' current boards are
/// untouched by a move that has not been submitted, so the single-board
/// simulation is exact for the mover's own king.
pub fn move_leaves_king_in_check(game: &Game, board: &Board, from: Vec4, to: Vec4) -> bool {
    let Some(piece) = board.piece_at(from.x, from.y) else {
        return false;
    };
    let mut probe = board.clone();
    probe.take_piece(to.x, to.y);
    probe.take_piece(from.x, from.y);
    probe.set_piece(to.x, to.y, piece.moved());
    king_in_check(game, &probe, piece.side)
}
