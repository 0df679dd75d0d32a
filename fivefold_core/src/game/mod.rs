//! The game aggregate: timelines, the turn/submit cycle and terminal
//! state detection.

mod moves;
mod options;
mod timeline;
mod variant;

pub use moves::{BoardId, MoveRecord, NullMove, RegularMove};
pub use options::{Clock, GameOptions, SubmitOutcome, TimeControl, WinReason};
pub use timeline::Timeline;
pub use variant::Variant;

use tracing::{debug, info};

use crate::board::{Board, Piece, PromotionPiece, Side, Vec4};
use crate::check;
use crate::move_gen;

/// The whole state of one game: a branching graph of board snapshots,
/// owned through two timeline lists indexed by `|l|`.
///
/// The game is the single owner of every timeline, board and piece.
/// Mutating operations reject bad input by returning `false` (or a
/// result with `submitted: false`) and leave the state untouched; they
/// never panic on caller mistakes. All public operations are synchronous
/// and the type is single-threaded by design.
pub struct Game {
    options: GameOptions,
    local_players: [bool; 2],
    turn: Side,
    present: i32,
    /// Timelines with `l >= 0`; index `l`.
    white_timelines: Vec<Timeline>,
    /// Timelines with `l < 0`; index `-l - 1`.
    black_timelines: Vec<Timeline>,
    current_turn_moves: Vec<MoveRecord>,
    displayed_checks: Vec<Vec4>,
    finished: bool,
    clock: Option<Box<dyn Clock>>,
}

impl Game {
    /// Builds a fresh game: the main timeline with an inactive seed board
    /// at `t = -1` and the variant's initial board at `t = 0`, White to
    /// move.
    pub fn new(options: GameOptions, local_players: [bool; 2]) -> Self {
        let squares = options.variant.initial_squares(options.seed);

        let mut main = Timeline::new(0, -1);
        let mut seed = Board::from_setup(0, -1, squares);
        seed.set_active(false);
        main.push_board(seed);
        main.push_board(Board::from_setup(0, 0, squares));

        let finished = options.finished;
        let mut game = Self {
            options,
            local_players,
            turn: Side::White,
            present: 0,
            white_timelines: vec![main],
            black_timelines: Vec::new(),
            current_turn_moves: Vec::new(),
            displayed_checks: Vec::new(),
            finished,
            clock: None,
        };
        game.recompute_present();
        game.recompute_displayed_checks();
        game
    }

    /// Attaches the external clock collaborator driven around `submit`.
    pub fn set_clock(&mut self, clock: Box<dyn Clock>) {
        self.clock = Some(clock);
    }

    pub fn options(&self) -> &GameOptions {
        &self.options
    }

    pub fn local_players(&self) -> [bool; 2] {
        self.local_players
    }

    /// The side whose submit cycle is running.
    pub fn turn(&self) -> Side {
        self.turn
    }

    /// The minimum current turn across the active timelines.
    pub fn present(&self) -> i32 {
        self.present
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The moves made so far in the running submit cycle.
    pub fn current_turn_moves(&self) -> &[MoveRecord] {
        &self.current_turn_moves
    }

    /// King positions currently under attack, one per active board whose
    /// side to move is in check. Recomputed after every mutation.
    pub fn displayed_checks(&self) -> &[Vec4] {
        &self.displayed_checks
    }

    /// The timeline with index `l`, if it exists.
    pub fn timeline(&self, l: i32) -> Option<&Timeline> {
        if l >= 0 {
            self.white_timelines.get(l as usize)
        } else {
            self.black_timelines.get((-l - 1) as usize)
        }
    }

    /// Iterates over every timeline in ascending `l` order.
    pub fn timelines(&self) -> impl Iterator<Item = &Timeline> {
        self.black_timelines
            .iter()
            .rev()
            .chain(self.white_timelines.iter())
    }

    /// Number of timelines the given side has spawned.
    pub fn timeline_count(&self, side: Side) -> i32 {
        match side {
            Side::White => self.white_timelines.len() as i32 - 1,
            Side::Black => self.black_timelines.len() as i32,
        }
    }

    /// True if the timeline exists and lies in the symmetric active
    /// range: `|l| <= min(spawned per side) + 1`. Only active timelines
    /// are played on, project attacks, and count toward the present.
    pub fn timeline_is_active(&self, l: i32) -> bool {
        self.timeline(l).is_some() && l.abs() <= self.active_spread()
    }

    fn active_spread(&self) -> i32 {
        self.timeline_count(Side::White)
            .min(self.timeline_count(Side::Black))
            + 1
    }

    /// Indices of the active timelines, ascending.
    pub fn active_timeline_indices(&self) -> Vec<i32> {
        let neg = self.timeline_count(Side::Black);
        let pos = self.timeline_count(Side::White);
        let spread = self.active_spread();
        (-neg..=pos).filter(|l| l.abs() <= spread).collect()
    }

    /// Iterates over the active timelines.
    pub fn active_timelines(&self) -> impl Iterator<Item = &Timeline> + '_ {
        self.active_timeline_indices()
            .into_iter()
            .map(|l| self.timeline(l).expect("active timeline must exist"))
    }

    /// The board at `(l, t)`, if that slot exists.
    pub fn board_at(&self, l: i32, t: i32) -> Option<&Board> {
        self.timeline(l)?.board(t)
    }

    /// The piece standing on `pos`, resolved at call time.
    pub fn get_piece(&self, pos: Vec4) -> Option<Piece> {
        self.board_at(pos.l, pos.t)?.piece_at(pos.x, pos.y)
    }

    /// Every target the piece on `from` may legally move to: candidate
    /// targets on its own timeline (an advance on a current board, a
    /// branch on a historical one), castling, and hops onto other active
    /// timelines sitting level with this one -- all filtered so that no
    /// move leaves the mover's own king attacked.
    pub fn legal_moves_for(&self, from: Vec4) -> Vec<Vec4> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }
        let Some(board) = self.board_at(from.l, from.t) else {
            return out;
        };
        let Some(piece) = board.piece_at(from.x, from.y) else {
            return out;
        };
        if piece.side != self.turn || board.to_move() != self.turn {
            return out;
        }
        if !self.timeline_is_active(from.l) || self.timeline_moved_this_cycle(from.l) {
            return out;
        }

        for target in move_gen::piece_targets(board, from.x, from.y, None) {
            if moves::classify(self, from, target).is_none() {
                continue;
            }
            if check::move_leaves_king_in_check(self, board, from, target) {
                continue;
            }
            out.push(target);
        }

        let on_current_board = self
            .timeline(from.l)
            .map(|timeline| timeline.end() == from.t)
            .unwrap_or(false);
        if on_current_board {
            out.extend(move_gen::castling_targets(self, board, from.x, from.y));

            for l in self.active_timeline_indices() {
                if l == from.l {
                    continue;
                }
                for target in move_gen::piece_targets(board, from.x, from.y, Some(l)) {
                    if moves::classify(self, from, target) != Some(moves::MoveCase::Hop) {
                        continue;
                    }
                    // The landing square is resolved on the target
                    // timeline's current board; a friendly occupant
                    // blocks the hop.
                    let occupant = self
                        .board_at(l, from.t)
                        .and_then(|b| b.piece_at(target.x, target.y));
                    if occupant.map(|p| p.side == piece.side).unwrap_or(false) {
                        continue;
                    }
                    if check::move_leaves_king_in_check(self, board, from, target) {
                        continue;
                    }
                    out.push(target);
                }
            }
        }

        out
    }

    /// Makes a move for the side to move. Returns false -- leaving the
    /// state untouched -- if the game is over, the piece cannot be
    /// resolved, it is not this piece's side or board to play, the
    /// piece's timeline already moved this cycle, or the target fails the
    /// candidate and self-check filters.
    pub fn make_move(&mut self, from: Vec4, to: Vec4, promotion: Option<PromotionPiece>) -> bool {
        self.make_move_ex(from, to, promotion, false)
    }

    /// [`Self::make_move`], with the move marked as coming from a remote
    /// player.
    pub fn make_remote_move(
        &mut self,
        from: Vec4,
        to: Vec4,
        promotion: Option<PromotionPiece>,
    ) -> bool {
        self.make_move_ex(from, to, promotion, true)
    }

    fn make_move_ex(
        &mut self,
        from: Vec4,
        to: Vec4,
        promotion: Option<PromotionPiece>,
        remote: bool,
    ) -> bool {
        if !self.legal_moves_for(from).contains(&to) {
            return false;
        }
        let case = moves::classify(self, from, to).expect("legal move must classify");
        let record = moves::execute(self, case, from, to, promotion, remote);
        self.current_turn_moves.push(record);
        self.recompute_present();
        self.recompute_displayed_checks();
        true
    }

    /// Takes back the most recent move of the running cycle. Returns
    /// false if there is nothing to undo -- submission is the commit
    /// point, and committed moves are gone for good.
    pub fn undo(&mut self) -> bool {
        if self.finished {
            return false;
        }
        let Some(record) = self.current_turn_moves.pop() else {
            return false;
        };
        moves::undo(self, &record);
        self.recompute_present();
        self.recompute_displayed_checks();
        true
    }

    /// Ends the current side's cycle: every active timeline awaiting this
    /// side that received no move is padded with a null move, the move
    /// buffer commits, the present is recomputed and the turn flips. If
    /// the opponent then has no legal move the game terminates --
    /// checkmate if they are in check, stalemate otherwise.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.finished {
            return SubmitOutcome::rejected();
        }
        let ready = self
            .active_timeline_indices()
            .into_iter()
            .all(|l| match self.timeline(l) {
                Some(timeline) => !timeline.is_empty() && timeline.end() >= self.present,
                None => false,
            });
        if !ready {
            return SubmitOutcome::rejected();
        }

        let elapsed_ms = self.clock.as_mut().map(|clock| clock.stop_time());
        let time_gained_cap = self
            .options
            .time
            .as_ref()
            .filter(|time| time.running_clocks)
            .and_then(|time| time.running_clock_time);

        let to_pad: Vec<i32> = self
            .active_timeline_indices()
            .into_iter()
            .filter(|&l| {
                let timeline = self.timeline(l).expect("active timeline must exist");
                timeline.current_board().to_move() == self.turn
                    && !self.timeline_moved_this_cycle(l)
            })
            .collect();
        let padded = to_pad.len();
        for l in to_pad {
            let record = moves::execute_null(self, l);
            self.current_turn_moves.push(record);
        }

        self.current_turn_moves.clear();
        self.recompute_present();
        self.turn = self.turn.opponent();
        self.recompute_displayed_checks();

        debug!(turn = ?self.turn, present = self.present, padded, "turn submitted");

        if !self.has_legal_moves() {
            let in_check = self.side_in_check(self.turn);
            self.finish(in_check);
        }

        if !self.finished {
            if let Some(clock) = self.clock.as_mut() {
                let grace = self
                    .options
                    .time
                    .as_ref()
                    .and_then(|time| time.running_clock_grace_time);
                clock.start_time(grace, None);
            }
        }

        SubmitOutcome {
            submitted: true,
            elapsed_ms,
            time_gained_cap,
        }
    }

    /// True if the side to move has any legal move on the current boards
    /// of the active timelines.
    pub fn has_legal_moves(&self) -> bool {
        for l in self.active_timeline_indices() {
            let timeline = self.timeline(l).expect("active timeline must exist");
            let board = timeline.current_board();
            if board.to_move() != self.turn {
                continue;
            }
            let t = board.t();
            let own_squares: Vec<(i32, i32)> = board
                .pieces()
                .filter(|(piece, _, _)| piece.side == self.turn)
                .map(|(_, x, y)| (x, y))
                .collect();
            for (x, y) in own_squares {
                if !self.legal_moves_for(Vec4::new(x, y, l, t)).is_empty() {
                    return true;
                }
            }
        }
        false
    }

    /// True if the side to move is mated: no legal move and in check.
    pub fn is_checkmate(&self) -> bool {
        match self.options.win_reason {
            Some(WinReason::Checkmate) => true,
            Some(_) => false,
            None => !self.has_legal_moves() && self.side_in_check(self.turn),
        }
    }

    /// True if the side to move is stalemated: no legal move, not in
    /// check.
    pub fn is_stalemate(&self) -> bool {
        match self.options.win_reason {
            Some(WinReason::Stalemate) => true,
            Some(_) => false,
            None => !self.has_legal_moves() && !self.side_in_check(self.turn),
        }
    }

    fn side_in_check(&self, side: Side) -> bool {
        self.active_timeline_indices().into_iter().any(|l| {
            let board = self
                .timeline(l)
                .expect("active timeline must exist")
                .current_board();
            board.to_move() == side && check::king_in_check(self, board, side)
        })
    }

    fn finish(&mut self, checkmated: bool) {
        self.finished = true;
        self.options.finished = true;
        self.options.win_cause = Some(0);
        if checkmated {
            self.options.winner = Some(self.turn.opponent().index() as i8);
            self.options.win_reason = Some(WinReason::Checkmate);
        } else {
            self.options.winner = Some(-1);
            self.options.win_reason = Some(WinReason::Stalemate);
        }
        info!(
            winner = ?self.options.winner,
            reason = ?self.options.win_reason,
            "game over"
        );
    }

    fn timeline_moved_this_cycle(&self, l: i32) -> bool {
        self.current_turn_moves
            .iter()
            .any(|record| record.touches_timeline(l))
    }

    fn recompute_present(&mut self) {
        let mut present = i32::MAX;
        for l in self.active_timeline_indices() {
            let timeline = self.timeline(l).expect("active timeline must exist");
            if timeline.is_empty() {
                continue;
            }
            present = present.min(timeline.end());
        }
        if present == i32::MAX {
            present = 0;
        }
        self.present = present.max(0);
    }

    fn recompute_displayed_checks(&mut self) {
        let mut checks = Vec::new();
        for l in self.active_timeline_indices() {
            let board = self
                .timeline(l)
                .expect("active timeline must exist")
                .current_board();
            if check::king_in_check(self, board, board.to_move()) {
                if let Some(king) = board.find_king(board.to_move()) {
                    checks.push(king);
                }
            }
        }
        self.displayed_checks = checks;
    }

    pub(crate) fn timeline_mut(&mut self, l: i32) -> &mut Timeline {
        let timeline = if l >= 0 {
            self.white_timelines.get_mut(l as usize)
        } else {
            self.black_timelines.get_mut((-l - 1) as usize)
        };
        timeline.unwrap_or_else(|| panic!("no timeline {l}"))
    }

    pub(crate) fn board_mut_at(&mut self, l: i32, t: i32) -> Option<&mut Board> {
        if l >= 0 {
            self.white_timelines.get_mut(l as usize)?.board_mut(t)
        } else {
            self.black_timelines.get_mut((-l - 1) as usize)?.board_mut(t)
        }
    }

    /// The index the next timeline spawned by `side` will get.
    pub(crate) fn next_timeline_index(&self, side: Side) -> i32 {
        match side {
            Side::White => self.timeline_count(Side::White) + 1,
            Side::Black => -(self.timeline_count(Side::Black) + 1),
        }
    }

    pub(crate) fn insert_timeline(&mut self, timeline: Timeline) {
        let l = timeline.l();
        if l >= 0 {
            debug_assert_eq!(l as usize, self.white_timelines.len());
            self.white_timelines.push(timeline);
        } else {
            debug_assert_eq!((-l - 1) as usize, self.black_timelines.len());
            self.black_timelines.push(timeline);
        }
    }

    /// Removes a timeline that undo emptied out. It must be the outermost
    /// timeline of its side.
    pub(crate) fn remove_empty_timeline(&mut self, l: i32) {
        let timeline = self.timeline(l).unwrap_or_else(|| panic!("no timeline {l}"));
        if !timeline.is_empty() {
            return;
        }
        if l >= 0 {
            debug_assert_eq!(l as usize, self.white_timelines.len() - 1);
            self.white_timelines.pop();
        } else {
            debug_assert_eq!((-l - 1) as usize, self.black_timelines.len() - 1);
            self.black_timelines.pop();
        }
    }

    #[cfg(test)]
    pub(crate) fn flip_turn_for_test(&mut self) {
        self.turn = self.turn.opponent();
    }
}
