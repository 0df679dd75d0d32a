use bitflags::bitflags;

use super::Side;

bitflags! {
    /// Which castling moves are still available to each player.
    ///
    /// A right is held as long as the king and the matching rook have not
    /// moved from their home squares (and the rook has not been captured
    /// there). Temporary obstructions -- pieces in between, the king
    /// passing through an attacked square -- are checked at move
    /// generation time and do not affect these flags.
    ///
    /// The mask layout is fixed by the engine's conventions: bit 0 is
    /// black-kingside, bit 1 black-queenside, bit 2 white-kingside, bit 3
    /// white-queenside.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CastleRights: u8 {
        const BLACK_KINGSIDE  = 0b0001;
        const BLACK_QUEENSIDE = 0b0010;
        const WHITE_KINGSIDE  = 0b0100;
        const WHITE_QUEENSIDE = 0b1000;

        const BLACK = Self::BLACK_KINGSIDE.bits() | Self::BLACK_QUEENSIDE.bits();
        const WHITE = Self::WHITE_KINGSIDE.bits() | Self::WHITE_QUEENSIDE.bits();
    }
}

impl Default for CastleRights {
    fn default() -> Self {
        Self::all()
    }
}

impl CastleRights {
    pub const fn kingside(side: Side) -> Self {
        match side {
            Side::Black => Self::BLACK_KINGSIDE,
            Side::White => Self::WHITE_KINGSIDE,
        }
    }

    pub const fn queenside(side: Side) -> Self {
        match side {
            Side::Black => Self::BLACK_QUEENSIDE,
            Side::White => Self::WHITE_QUEENSIDE,
        }
    }

    pub const fn both(side: Side) -> Self {
        match side {
            Side::Black => Self::BLACK,
            Side::White => Self::WHITE,
        }
    }

    /// The right lost when a rook leaves (or is captured on) the square
    /// `(x, y)`, if that square is one of the four home corners.
    pub fn for_rook_home(x: i32, y: i32) -> Self {
        match (x, y) {
            (0, 0) => Self::BLACK_QUEENSIDE,
            (7, 0) => Self::BLACK_KINGSIDE,
            (0, 7) => Self::WHITE_QUEENSIDE,
            (7, 7) => Self::WHITE_KINGSIDE,
            _ => Self::empty(),
        }
    }
}
