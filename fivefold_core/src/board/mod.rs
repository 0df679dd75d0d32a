//! The board snapshot and its component types.

mod castling;
mod piece;
mod position;
pub mod wire;

pub use castling::CastleRights;
pub use piece::{Piece, PieceKind, PromotionPiece, Side};
pub use position::{square_in_bounds, Vec4};

use std::fmt::Display;

/// One 8x8 snapshot in the game graph.
///
/// A board belongs to the timeline slot that owns it and is never mutated
/// once a successor has been derived from it; the move engine
/// clones-on-write, so every move produces fresh snapshots and leaves
/// historical ones untouched except for their `active` flag.
///
/// `to_move` is the side that plays *on* this board and always satisfies
/// the parity law [`Side::to_move_on`]. `active` marks boards the game is
/// still played on; a board loses it when a move derives a successor from
/// it, and regains it when that move is undone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    l: i32,
    t: i32,
    to_move: Side,
    squares: [Option<Piece>; 64],
    active: bool,
    castle_rights: CastleRights,
    en_passant: Option<Vec4>,
}

impl Board {
    /// Builds a board from an initial setup, deriving the side to move
    /// from the parity law and the castle rights from the placement (a
    /// wing grants its right only when the king and the matching rook
    /// stand on their home squares, unmoved).
    pub fn from_setup(l: i32, t: i32, squares: [Option<Piece>; 64]) -> Self {
        let mut board = Self {
            l,
            t,
            to_move: Side::to_move_on(l, t),
            squares,
            active: true,
            castle_rights: CastleRights::empty(),
            en_passant: None,
        };
        board.castle_rights = board.derive_initial_rights();
        board
    }

    /// Derives the successor snapshot of this board on its own timeline:
    /// same pieces, `t + 1`, side to move flipped by parity, en passant
    /// cleared.
    pub fn successor(&self) -> Self {
        Self {
            l: self.l,
            t: self.t + 1,
            to_move: Side::to_move_on(self.l, self.t + 1),
            squares: self.squares,
            active: true,
            castle_rights: self.castle_rights,
            en_passant: None,
        }
    }

    /// Derives the first board of a freshly spawned timeline from this
    /// snapshot: same pieces, re-homed to `(new_l, t + 1)`.
    pub fn branch_to(&self, new_l: i32) -> Self {
        Self {
            l: new_l,
            t: self.t + 1,
            to_move: Side::to_move_on(new_l, self.t + 1),
            squares: self.squares,
            active: true,
            castle_rights: self.castle_rights,
            en_passant: None,
        }
    }

    pub fn l(&self) -> i32 {
        self.l
    }

    pub fn t(&self) -> i32 {
        self.t
    }

    /// The side to move on this board.
    pub fn to_move(&self) -> Side {
        self.to_move
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn castle_rights(&self) -> CastleRights {
        self.castle_rights
    }

    pub(crate) fn remove_castle_rights(&mut self, rights: CastleRights) {
        self.castle_rights.remove(rights);
    }

    /// The square a pawn passed over with a double push on the move that
    /// produced this board, stamped with this board's `(l, t)`. Set only
    /// on the board created by the double push and cleared on every
    /// successor.
    pub fn en_passant(&self) -> Option<Vec4> {
        self.en_passant
    }

    pub(crate) fn set_en_passant(&mut self, target: Option<Vec4>) {
        self.en_passant = target;
    }

    /// The piece on `(x, y)`. Out-of-bounds coordinates answer [`None`];
    /// board queries never fault.
    pub fn piece_at(&self, x: i32, y: i32) -> Option<Piece> {
        if square_in_bounds(x, y) {
            self.squares[index(x, y)]
        } else {
            None
        }
    }

    /// True if `(x, y)` is an on-board square with nothing on it.
    /// Off-board squares are not reported empty, so ray walks stop at the
    /// edge.
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        square_in_bounds(x, y) && self.squares[index(x, y)].is_none()
    }

    /// True if `(x, y)` holds a piece belonging to the opponent of
    /// `side`. Out of bounds answers false.
    pub fn is_enemy(&self, x: i32, y: i32, side: Side) -> bool {
        self.piece_at(x, y)
            .map(|piece| piece.side != side)
            .unwrap_or(false)
    }

    /// Iterates over all pieces on the board and their squares.
    pub fn pieces(&self) -> impl Iterator<Item = (Piece, i32, i32)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(i, piece)| piece.map(|p| (p, (i % 8) as i32, (i / 8) as i32)))
    }

    /// Finds the king of the given side, as a position on this board.
    pub fn find_king(&self, side: Side) -> Option<Vec4> {
        self.pieces()
            .find(|(piece, _, _)| piece.is_king() && piece.side == side)
            .map(|(_, x, y)| Vec4::new(x, y, self.l, self.t))
    }

    pub(crate) fn set_piece(&mut self, x: i32, y: i32, piece: Piece) {
        debug_assert!(square_in_bounds(x, y));
        self.squares[index(x, y)] = Some(piece);
    }

    pub(crate) fn take_piece(&mut self, x: i32, y: i32) -> Option<Piece> {
        if square_in_bounds(x, y) {
            self.squares[index(x, y)].take()
        } else {
            None
        }
    }

    fn derive_initial_rights(&self) -> CastleRights {
        let mut rights = CastleRights::empty();
        for side in [Side::White, Side::Black] {
            let home = side.home_rank();
            let king_at_home = matches!(
                self.piece_at(4, home),
                Some(piece) if piece.is_king() && piece.side == side && !piece.has_moved
            );
            if !king_at_home {
                continue;
            }
            for (corner, right) in [
                (7, CastleRights::kingside(side)),
                (0, CastleRights::queenside(side)),
            ] {
                let rook_at_home = matches!(
                    self.piece_at(corner, home),
                    Some(piece)
                        if piece.kind == PieceKind::Rook && piece.side == side && !piece.has_moved
                );
                if rook_at_home {
                    rights |= right;
                }
            }
        }
        rights
    }
}

fn index(x: i32, y: i32) -> usize {
    (y * 8 + x) as usize
}

impl Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..8 {
            for x in 0..8 {
                match self.piece_at(x, y) {
                    Some(piece) => write!(f, "{piece}")?,
                    None => f.write_str(".")?,
                }
            }
            if y < 7 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
