//! Candidate-move enumeration.
//!
//! Each function returns a finite list of candidate targets for one piece,
//! as positions stamped with a timeline and the next turn index. Targets
//! are candidates only: the move engine and the check detector decide
//! which of them are playable.

use arrayvec::ArrayVec;

use crate::board::{Board, CastleRights, PieceKind, Side, Vec4};
use crate::check;
use crate::game::Game;

/// Upper bound on the number of candidate targets a single piece can
/// emit. A queen in the open tops out at 27; 32 leaves headroom for the
/// king's castling targets.
pub const MAX_TARGETS: usize = 32;

pub type TargetVec = ArrayVec<Vec4, MAX_TARGETS>;

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
const KING_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Enumerates the candidate targets of the piece on `(x, y)`.
///
/// Geometry and occupancy are evaluated on `board`; the emitted targets
/// carry `(l', board.t + 1)` where `l'` is `board`'s own timeline unless
/// the query is re-rooted to a foreign one via `reroot` (as the check
/// detector does when projecting attacks across timelines). Castling is
/// not emitted here -- it is a same-timeline move only and needs game
/// context, see [`castling_targets`].
///
/// Returns an empty list if `(x, y)` holds no piece.
pub fn piece_targets(board: &Board, x: i32, y: i32, reroot: Option<i32>) -> TargetVec {
    let mut out = TargetVec::new();
    let Some(piece) = board.piece_at(x, y) else {
        return out;
    };
    let l = reroot.unwrap_or_else(|| board.l());
    let t = board.t() + 1;

    match piece.kind {
        PieceKind::Rook => ray_targets(board, x, y, piece.side, &ROOK_DIRECTIONS, l, t, &mut out),
        PieceKind::Bishop => {
            ray_targets(board, x, y, piece.side, &BISHOP_DIRECTIONS, l, t, &mut out)
        }
        PieceKind::Queen => {
            ray_targets(board, x, y, piece.side, &ROOK_DIRECTIONS, l, t, &mut out);
            ray_targets(board, x, y, piece.side, &BISHOP_DIRECTIONS, l, t, &mut out);
        }
        PieceKind::Knight => {
            offset_targets(board, x, y, piece.side, &KNIGHT_OFFSETS, l, t, &mut out)
        }
        PieceKind::King => offset_targets(board, x, y, piece.side, &KING_OFFSETS, l, t, &mut out),
        PieceKind::Pawn => pawn_targets(board, x, y, piece.side, piece.has_moved, l, t, &mut out),
    }

    out
}

/// Walks each direction until the first blocker: empty squares are
/// emitted and the walk continues, an enemy is emitted and terminates the
/// ray, a friendly piece terminates it silently.
#[allow(clippy::too_many_arguments)]
fn ray_targets(
    board: &Board,
    x: i32,
    y: i32,
    side: Side,
    directions: &[(i32, i32)],
    l: i32,
    t: i32,
    out: &mut TargetVec,
) {
    for &(dx, dy) in directions {
        let (mut cx, mut cy) = (x + dx, y + dy);
        while board.is_empty(cx, cy) {
            out.push(Vec4::new(cx, cy, l, t));
            cx += dx;
            cy += dy;
        }
        if board.is_enemy(cx, cy, side) {
            out.push(Vec4::new(cx, cy, l, t));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn offset_targets(
    board: &Board,
    x: i32,
    y: i32,
    side: Side,
    offsets: &[(i32, i32)],
    l: i32,
    t: i32,
    out: &mut TargetVec,
) {
    for &(dx, dy) in offsets {
        let (cx, cy) = (x + dx, y + dy);
        if board.is_empty(cx, cy) || board.is_enemy(cx, cy, side) {
            out.push(Vec4::new(cx, cy, l, t));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn pawn_targets(
    board: &Board,
    x: i32,
    y: i32,
    side: Side,
    has_moved: bool,
    l: i32,
    t: i32,
    out: &mut TargetVec,
) {
    let dir = side.forward();

    if board.is_empty(x, y + dir) {
        out.push(Vec4::new(x, y + dir, l, t));
        if !has_moved && y == side.pawn_rank() && board.is_empty(x, y + 2 * dir) {
            out.push(Vec4::new(x, y + 2 * dir, l, t));
        }
    }

    for dx in [-1, 1] {
        if board.is_enemy(x + dx, y + dir, side) {
            out.push(Vec4::new(x + dx, y + dir, l, t));
        }
    }

    if let Some(target) = en_passant_target(board, x, y, side) {
        out.push(Vec4::new(target.x, target.y, l, t));
    }
}

/// The en-passant capture square available to the pawn on `(x, y)`, if
/// any.
///
/// The board's en-passant marker is honoured only when it was stamped for
/// this exact board, and only by a pawn standing beside the double-pushed
/// pawn: one file away, one rank short of the marker in its own forward
/// direction. The capture lands on the marker square itself (the square
/// the enemy pawn passed over).
pub fn en_passant_target(board: &Board, x: i32, y: i32, side: Side) -> Option<Vec4> {
    let marker = board.en_passant()?;
    if (marker.l, marker.t) != (board.l(), board.t()) {
        return None;
    }
    if (x - marker.x).abs() == 1 && y + side.forward() == marker.y {
        Some(marker)
    } else {
        None
    }
}

/// Enumerates the castling targets of the king on `(x, y)`.
///
/// Emitted only for a same-timeline move by the side to move on `board`,
/// with the king and rook unmoved on their home squares, the squares
/// between them empty, the king not currently in check (including checks
/// projected from other timelines), and every square the king passes
/// through or lands on safe -- each is probed by relocating the king on a
/// cloned board and re-running the check detector.
pub fn castling_targets(game: &Game, board: &Board, x: i32, y: i32) -> TargetVec {
    let mut out = TargetVec::new();
    let Some(piece) = board.piece_at(x, y) else {
        return out;
    };
    let side = piece.side;
    if piece.kind != PieceKind::King || piece.has_moved {
        return out;
    }
    if board.to_move() != side || (x, y) != (4, side.home_rank()) {
        return out;
    }
    if check::king_in_check(game, board, side) {
        return out;
    }

    // Kingside: rook on the h-file, f and g empty, king crosses f to g.
    if board.castle_rights().contains(CastleRights::kingside(side))
        && rook_ready(board, 7, y, side)
        && board.is_empty(5, y)
        && board.is_empty(6, y)
        && king_path_is_safe(game, board, side, x, y, &[5, 6])
    {
        out.push(Vec4::new(6, y, board.l(), board.t() + 1));
    }

    // Queenside: rook on the a-file, b, c and d empty, king crosses d to
    // c. The b-file square only needs to be empty.
    if board.castle_rights().contains(CastleRights::queenside(side))
        && rook_ready(board, 0, y, side)
        && board.is_empty(1, y)
        && board.is_empty(2, y)
        && board.is_empty(3, y)
        && king_path_is_safe(game, board, side, x, y, &[3, 2])
    {
        out.push(Vec4::new(2, y, board.l(), board.t() + 1));
    }

    out
}

fn rook_ready(board: &Board, x: i32, y: i32, side: Side) -> bool {
    matches!(
        board.piece_at(x, y),
        Some(piece) if piece.kind == PieceKind::Rook && piece.side == side && !piece.has_moved
    )
}

fn king_path_is_safe(
    game: &Game,
    board: &Board,
    side: Side,
    king_x: i32,
    king_y: i32,
    path: &[i32],
) -> bool {
    for &px in path {
        let mut probe = board.clone();
        let king = probe
            .take_piece(king_x, king_y)
            .expect("castling probe: king vanished from its home square");
        probe.set_piece(px, king_y, king);
        if check::king_in_check(game, &probe, side) {
            return false;
        }
    }
    true
}
