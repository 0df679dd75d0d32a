use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Piece, PieceKind, Side};

/// Initial-setup variants. All of them place the standard pawn ranks and
/// the king on its home square; they differ in which pieces fill the rest
/// of the back rank at `t = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[default]
    Standard,
    NoBishops,
    NoKnights,
    NoRooks,
    NoQueens,
    KnightsVsBishops,
    SimpleSet,
    Random,
}

impl Variant {
    /// The initial square array for a board of this variant.
    ///
    /// `seed` only matters for [`Variant::Random`]; the same seed always
    /// draws the same setup.
    pub fn initial_squares(self, seed: u64) -> [Option<Piece>; 64] {
        let mut squares = [None; 64];
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let black_rank = self.back_rank(Side::Black, &mut rng);
        let white_rank = match self {
            // The random draw is mirrored, not rolled per side.
            Variant::Random => black_rank,
            _ => self.back_rank(Side::White, &mut rng),
        };

        for (side, back) in [(Side::Black, black_rank), (Side::White, white_rank)] {
            let home = side.home_rank();
            for (x, kind) in back.into_iter().enumerate() {
                squares[square(x as i32, home)] = kind.map(|kind| Piece::new(side, kind));
            }
            for x in 0..8 {
                squares[square(x, side.pawn_rank())] = Some(Piece::new(side, PieceKind::Pawn));
            }
        }

        squares
    }

    fn back_rank(self, side: Side, rng: &mut ChaCha8Rng) -> [Option<PieceKind>; 8] {
        use PieceKind::*;

        let standard = [
            Some(Rook),
            Some(Knight),
            Some(Bishop),
            Some(Queen),
            Some(King),
            Some(Bishop),
            Some(Knight),
            Some(Rook),
        ];

        match self {
            Variant::Standard => standard,
            Variant::NoBishops => drop_kind(standard, Bishop),
            Variant::NoKnights => drop_kind(standard, Knight),
            Variant::NoRooks => drop_kind(standard, Rook),
            Variant::NoQueens => drop_kind(standard, Queen),
            Variant::KnightsVsBishops => {
                // White fields knights on every minor-piece square, Black
                // bishops.
                let minor = match side {
                    Side::White => Knight,
                    Side::Black => Bishop,
                };
                [
                    Some(Rook),
                    Some(minor),
                    Some(minor),
                    Some(Queen),
                    Some(King),
                    Some(minor),
                    Some(minor),
                    Some(Rook),
                ]
            }
            Variant::SimpleSet => [
                Some(Rook),
                None,
                None,
                Some(Queen),
                Some(King),
                None,
                None,
                Some(Rook),
            ],
            Variant::Random => {
                let pool = [Rook, Knight, Bishop, Queen];
                let mut rank = [None; 8];
                for (x, slot) in rank.iter_mut().enumerate() {
                    *slot = if x == 4 {
                        Some(King)
                    } else {
                        Some(pool[rng.gen_range(0..pool.len())])
                    };
                }
                rank
            }
        }
    }
}

fn drop_kind(rank: [Option<PieceKind>; 8], kind: PieceKind) -> [Option<PieceKind>; 8] {
    rank.map(|slot| slot.filter(|&k| k != kind))
}

fn square(x: i32, y: i32) -> usize {
    (y * 8 + x) as usize
}
