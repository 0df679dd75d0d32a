use crate::board::Board;

/// An ordered run of boards sharing one timeline index, keyed by turn
/// number.
///
/// Boards are append-only at the end of the run; the move engine derives
/// a successor from the current board and pushes it, and undo pops it
/// back off. `start` is the turn of the first board -- the main timeline
/// starts at `-1` with its seed board, spawned timelines start wherever
/// their branch point put them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    l: i32,
    start: i32,
    boards: Vec<Board>,
}

impl Timeline {
    pub fn new(l: i32, start: i32) -> Self {
        Self {
            l,
            start,
            boards: Vec::new(),
        }
    }

    pub fn l(&self) -> i32 {
        self.l
    }

    /// The turn of the first board in this timeline.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// The turn of the current (last) board.
    ///
    /// Panics if the timeline has no boards, a state that only occurs
    /// mid-undo, before an emptied timeline is removed from the game.
    pub fn end(&self) -> i32 {
        debug_assert!(!self.boards.is_empty(), "timeline {} has no boards", self.l);
        self.start + self.boards.len() as i32 - 1
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// The board at turn `t`, if this timeline holds one.
    pub fn board(&self, t: i32) -> Option<&Board> {
        let slot = usize::try_from(t - self.start).ok()?;
        self.boards.get(slot)
    }

    pub(crate) fn board_mut(&mut self, t: i32) -> Option<&mut Board> {
        let slot = usize::try_from(t - self.start).ok()?;
        self.boards.get_mut(slot)
    }

    /// The current board of this timeline.
    ///
    /// Panics if the timeline has no boards (see [`Self::end`]).
    pub fn current_board(&self) -> &Board {
        self.boards
            .last()
            .unwrap_or_else(|| panic!("timeline {} has no boards", self.l))
    }

    pub(crate) fn current_board_mut(&mut self) -> &mut Board {
        let l = self.l;
        self.boards
            .last_mut()
            .unwrap_or_else(|| panic!("timeline {l} has no boards"))
    }

    /// Appends `board` as the new current board. The board must continue
    /// the run: its turn is the slot after the current end.
    pub(crate) fn push_board(&mut self, board: Board) {
        debug_assert_eq!(board.l(), self.l);
        debug_assert_eq!(
            board.t(),
            self.start + self.boards.len() as i32,
            "timeline {} boards must be appended in turn order",
            self.l
        );
        self.boards.push(board);
    }

    /// Removes and returns the current board.
    pub(crate) fn pop_board(&mut self) -> Option<Board> {
        self.boards.pop()
    }

    /// Iterates over the boards of this timeline in turn order.
    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.boards.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::{Piece, PieceKind};
    use crate::test_utils::board_with;
    use pretty_assertions::assert_eq;

    fn king_board(l: i32, t: i32) -> Board {
        board_with(l, t, &[(4, 7, Piece::white(PieceKind::King))])
    }

    #[test]
    fn slot_arithmetic() {
        let mut timeline = Timeline::new(0, -1);
        timeline.push_board(king_board(0, -1));
        timeline.push_board(king_board(0, 0));
        timeline.push_board(king_board(0, 1));

        assert_eq!(timeline.start(), -1);
        assert_eq!(timeline.end(), 1);
        assert_eq!(timeline.board(0).map(|b| b.t()), Some(0));
        assert_eq!(timeline.board(2), None);
        assert_eq!(timeline.board(-2), None);
        assert_eq!(timeline.current_board().t(), 1);
    }

    #[test]
    fn spawned_timeline_starts_mid_history() {
        let mut timeline = Timeline::new(-1, 4);
        timeline.push_board(king_board(-1, 4));

        assert_eq!(timeline.start(), 4);
        assert_eq!(timeline.end(), 4);
        assert_eq!(timeline.board(3), None);
        assert_eq!(timeline.board(4).map(|b| b.t()), Some(4));
    }

    #[test]
    fn push_then_pop_restores_the_run() {
        let mut timeline = Timeline::new(0, -1);
        timeline.push_board(king_board(0, -1));
        timeline.push_board(king_board(0, 0));
        let before = timeline.clone();

        timeline.push_board(king_board(0, 1));
        let popped = timeline.pop_board();

        assert_eq!(popped.map(|b| b.t()), Some(1));
        assert_eq!(timeline, before);
    }
}
