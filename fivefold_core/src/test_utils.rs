use std::fmt::Debug;

use pretty_assertions::assert_eq;

use crate::board::{Board, Piece};

pub fn assert_in_any_order<T: Eq + Ord + Debug>(
    values: impl IntoIterator<Item = T>,
    expected: impl IntoIterator<Item = T>,
) {
    let mut values = values.into_iter().collect::<Vec<_>>();
    values.sort();

    let mut expected = expected.into_iter().collect::<Vec<_>>();
    expected.sort();

    assert_eq!(values, expected);
}

/// Builds a board at `(l, t)` holding exactly the given pieces.
pub fn board_with(l: i32, t: i32, pieces: &[(i32, i32, Piece)]) -> Board {
    let mut squares = [None; 64];
    for &(x, y, piece) in pieces {
        squares[(y * 8 + x) as usize] = Some(piece);
    }
    Board::from_setup(l, t, squares)
}
