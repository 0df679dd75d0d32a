use std::fmt::{Display, Write};

use num_derive::{FromPrimitive, ToPrimitive};

/// Represents a player. Black is 0 and White is 1, matching the wire
/// format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Side {
    Black = 0,
    #[default]
    White = 1,
}

impl Side {
    pub const fn is_white(self) -> bool {
        matches!(self, Side::White)
    }

    pub const fn is_black(self) -> bool {
        !self.is_white()
    }

    pub const fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The side that owns timelines with the given index: White owns the
    /// main timeline and every timeline it spawned (`l >= 0`), Black owns
    /// the negative ones.
    pub const fn owner_of_timeline(l: i32) -> Self {
        if l >= 0 {
            Side::White
        } else {
            Side::Black
        }
    }

    /// The side to move on the board at `(l, t)`.
    ///
    /// This parity law is the single source of truth for a board's side to
    /// move: `(t + owner_of_timeline(l)) mod 2`, with Black on even and
    /// White on odd. Timelines owned by Black run half a turn offset from
    /// White's, which is what the owner term encodes.
    pub const fn to_move_on(l: i32, t: i32) -> Self {
        if (t + Self::owner_of_timeline(l) as i32).rem_euclid(2) == 0 {
            Side::Black
        } else {
            Side::White
        }
    }

    /// The direction this side's pawns advance in: Black moves towards
    /// higher ranks, White towards lower ones.
    pub const fn forward(self) -> i32 {
        match self {
            Side::Black => 1,
            Side::White => -1,
        }
    }

    /// The rank this side's pieces start on.
    pub const fn home_rank(self) -> i32 {
        match self {
            Side::Black => 0,
            Side::White => 7,
        }
    }

    /// The rank this side's pawns start on.
    pub const fn pawn_rank(self) -> i32 {
        match self {
            Side::Black => 1,
            Side::White => 6,
        }
    }

    /// The rank on which this side's pawns promote.
    pub const fn promotion_rank(self) -> i32 {
        self.opponent().home_rank()
    }

    pub const fn try_from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Side::Black),
            1 => Some(Side::White),
            _ => None,
        }
    }
}

/// The type of a piece, without its side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// The name used for this piece kind in the wire format.
    pub const fn name(self) -> &'static str {
        match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Rook => "rook",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        }
    }

    pub fn try_from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// One-letter form, uppercase for White and lowercase for Black. Used
    /// by the board's text rendering.
    pub const fn as_char(self, side: Side) -> char {
        let c = match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        };
        if side.is_white() {
            c
        } else {
            c.to_ascii_lowercase()
        }
    }
}

/// A typed occupant of one square.
///
/// Pieces are plain values stored in a board's square array; a piece's
/// position and owning board are implied by the square that holds it.
/// Cloning a board clones its pieces, `has_moved` included -- there is no
/// shared piece identity across board snapshots, so callers identify a
/// piece by its current position and resolve it at command time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
    pub has_moved: bool,
}

impl Piece {
    /// A piece that has not moved yet.
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self {
            side,
            kind,
            has_moved: false,
        }
    }

    pub const fn white(kind: PieceKind) -> Self {
        Self::new(Side::White, kind)
    }

    pub const fn black(kind: PieceKind) -> Self {
        Self::new(Side::Black, kind)
    }

    /// Returns a copy of this piece with `has_moved` set.
    pub const fn moved(self) -> Self {
        Self {
            has_moved: true,
            ..self
        }
    }

    pub const fn is_king(self) -> bool {
        matches!(self.kind, PieceKind::King)
    }

    pub const fn is_pawn(self) -> bool {
        matches!(self.kind, PieceKind::Pawn)
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_char(self.kind.as_char(self.side))
    }
}

/// A piece a pawn may promote to, with the numeric codes used by the wire
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
pub enum PromotionPiece {
    Queen = 1,
    Knight = 2,
    Rook = 3,
    Bishop = 4,
}

impl PromotionPiece {
    pub const fn kind(self) -> PieceKind {
        match self {
            PromotionPiece::Queen => PieceKind::Queen,
            PromotionPiece::Knight => PieceKind::Knight,
            PromotionPiece::Rook => PieceKind::Rook,
            PromotionPiece::Bishop => PieceKind::Bishop,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_traits::{FromPrimitive, ToPrimitive};
    use pretty_assertions::assert_eq;

    #[test]
    fn side_opponent() {
        assert_eq!(Side::White.opponent(), Side::Black);
        assert_eq!(Side::Black.opponent(), Side::White);
    }

    #[test]
    fn timeline_ownership() {
        assert_eq!(Side::owner_of_timeline(0), Side::White);
        assert_eq!(Side::owner_of_timeline(3), Side::White);
        assert_eq!(Side::owner_of_timeline(-1), Side::Black);
    }

    #[test]
    fn to_move_parity_on_main_timeline() {
        // White opens at t = 0, then the sides alternate.
        assert_eq!(Side::to_move_on(0, 0), Side::White);
        assert_eq!(Side::to_move_on(0, 1), Side::Black);
        assert_eq!(Side::to_move_on(0, 2), Side::White);
        // The seed board before the start of the game.
        assert_eq!(Side::to_move_on(0, -1), Side::Black);
    }

    #[test]
    fn to_move_parity_is_offset_on_black_timelines() {
        // Black-owned timelines run half a turn behind.
        assert_eq!(Side::to_move_on(-1, 0), Side::Black);
        assert_eq!(Side::to_move_on(-1, 1), Side::White);
        assert_eq!(Side::to_move_on(-2, 4), Side::Black);
    }

    #[test]
    fn pawn_geometry() {
        assert_eq!(Side::White.forward(), -1);
        assert_eq!(Side::Black.forward(), 1);
        assert_eq!(Side::White.pawn_rank(), 6);
        assert_eq!(Side::Black.pawn_rank(), 1);
        assert_eq!(Side::White.promotion_rank(), 0);
        assert_eq!(Side::Black.promotion_rank(), 7);
    }

    #[test]
    fn piece_kind_names_round_trip() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::try_from_name(kind.name()), Some(kind));
        }
        assert_eq!(PieceKind::try_from_name("unicorn"), None);
    }

    #[test]
    fn piece_display() {
        assert_eq!(Piece::white(PieceKind::Knight).to_string(), "N");
        assert_eq!(Piece::black(PieceKind::Queen).to_string(), "q");
    }

    #[test]
    fn moved_preserves_identity() {
        let pawn = Piece::white(PieceKind::Pawn);
        assert!(!pawn.has_moved);
        let pawn = pawn.moved();
        assert!(pawn.has_moved);
        assert_eq!(pawn.kind, PieceKind::Pawn);
        assert_eq!(pawn.side, Side::White);
    }

    #[test]
    fn promotion_codes() {
        let cases = [
            (1, PromotionPiece::Queen),
            (2, PromotionPiece::Knight),
            (3, PromotionPiece::Rook),
            (4, PromotionPiece::Bishop),
        ];
        for (code, piece) in cases {
            assert_eq!(PromotionPiece::from_u8(code), Some(piece));
            assert_eq!(piece.to_u8(), Some(code));
        }
        assert_eq!(PromotionPiece::from_u8(0), None);
        assert_eq!(PromotionPiece::from_u8(5), None);
    }
}
