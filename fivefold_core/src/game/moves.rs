//! The move engine: classification, execution and undo.
//!
//! Executing a move never mutates an existing snapshot's pieces. The
//! engine derives fresh boards from the snapshots involved, appends them
//! to their timelines and flips the originals inactive; the move record
//! keeps the ledger of what was appended and what was deactivated so that
//! undo can reverse it exactly.

use tracing::debug;

use crate::board::{Board, CastleRights, Piece, PieceKind, PromotionPiece, Vec4};
use crate::move_gen;

use super::{Game, Timeline};

/// Identifies one board snapshot by its timeline slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardId {
    pub l: i32,
    pub t: i32,
}

impl BoardId {
    pub const fn new(l: i32, t: i32) -> Self {
        Self { l, t }
    }
}

/// One entry in the per-cycle move buffer.
///
/// Null moves are not user-facing; they are the padding `submit` uses to
/// advance every active timeline uniformly, kept as their own variant
/// rather than a fake piece move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveRecord {
    Regular(RegularMove),
    Null(NullMove),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegularMove {
    pub from: Vec4,
    pub to: Vec4,
    /// The mover as it stood on the source board when the move was made.
    pub piece: Piece,
    pub promotion: Option<PromotionPiece>,
    pub inter_dimensional: bool,
    pub remote: bool,
    pub source_board: BoardId,
    /// The board the piece actually landed on. For a branching move this
    /// is the first board of the spawned timeline, not the slot named by
    /// `to`.
    pub target_board: BoardId,
    pub(crate) used_boards: Vec<BoardId>,
    pub(crate) created_boards: Vec<BoardId>,
    pub(crate) spawned_timeline: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullMove {
    pub l: i32,
    pub(crate) used_board: BoardId,
    pub(crate) created_board: BoardId,
}

impl MoveRecord {
    pub fn is_null(&self) -> bool {
        matches!(self, MoveRecord::Null(_))
    }

    /// True if this move advanced or consumed the given timeline this
    /// cycle -- as the source of a piece move (including a branch played
    /// on one of its historical boards) or by receiving a created board.
    pub(crate) fn touches_timeline(&self, l: i32) -> bool {
        match self {
            MoveRecord::Regular(m) => {
                m.from.l == l || m.created_boards.iter().any(|id| id.l == l)
            }
            MoveRecord::Null(m) => m.l == l,
        }
    }
}

/// How a proposed move relates to the game graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MoveCase {
    /// A move on the current board of its own timeline; the timeline
    /// advances one turn.
    Advance,
    /// A move from the current board of one timeline onto the current
    /// board of another at the same turn; both timelines advance.
    Hop,
    /// A move played on a historical board; a new timeline branches off
    /// it.
    Branch,
}

/// Classifies a proposed move, or rejects it when no case fits the state
/// of the timelines involved.
pub(crate) fn classify(game: &Game, from: Vec4, to: Vec4) -> Option<MoveCase> {
    if to.t != from.t + 1 {
        return None;
    }
    let source_timeline = game.timeline(from.l)?;
    if !game.timeline_is_active(from.l) {
        return None;
    }
    source_timeline.board(from.t)?;

    if to.l == from.l {
        if source_timeline.end() == from.t {
            Some(MoveCase::Advance)
        } else {
            // The source board has successors; playing on it branches.
            Some(MoveCase::Branch)
        }
    } else {
        let target_timeline = game.timeline(to.l)?;
        if !game.timeline_is_active(to.l) {
            return None;
        }
        // A hop lands on the target timeline's next slot, so its current
        // board must sit level with the source.
        if target_timeline.end() != from.t {
            return None;
        }
        if target_timeline.current_board().to_move() != game.turn() {
            return None;
        }
        Some(MoveCase::Hop)
    }
}

/// Executes a validated move and returns its record.
///
/// The caller has already established that the move is a legal candidate;
/// a piece missing from the source board here is a state error, not a
/// rejected input.
pub(crate) fn execute(
    game: &mut Game,
    case: MoveCase,
    from: Vec4,
    to: Vec4,
    promotion: Option<PromotionPiece>,
    remote: bool,
) -> MoveRecord {
    let source = game
        .board_at(from.l, from.t)
        .unwrap_or_else(|| panic!("move execution: no board at ({}, {})", from.l, from.t))
        .clone();
    let piece = source
        .piece_at(from.x, from.y)
        .unwrap_or_else(|| panic!("move execution: no piece at {from}"));

    debug!(%from, %to, case = ?case, "executing move");

    let record = match case {
        MoveCase::Advance => {
            let mut next = source.successor();
            apply_move(&mut next, &source, from, to, promotion);

            let timeline = game.timeline_mut(from.l);
            timeline
                .board_mut(from.t)
                .expect("source board vanished during execution")
                .set_active(false);
            timeline.push_board(next);

            RegularMove {
                from,
                to,
                piece,
                promotion,
                inter_dimensional: false,
                remote,
                source_board: BoardId::new(from.l, from.t),
                target_board: BoardId::new(from.l, from.t + 1),
                used_boards: vec![BoardId::new(from.l, from.t)],
                created_boards: vec![BoardId::new(from.l, from.t + 1)],
                spawned_timeline: None,
            }
        }
        MoveCase::Hop => {
            let target = game
                .board_at(to.l, from.t)
                .unwrap_or_else(|| panic!("hop execution: no board at ({}, {})", to.l, from.t))
                .clone();

            let mut source_next = source.successor();
            let mover = source_next
                .take_piece(from.x, from.y)
                .expect("mover vanished from source successor");
            remove_departure_rights(&mut source_next, mover, from.x, from.y);

            let mut target_next = target.successor();
            capture_on(&mut target_next, to.x, to.y);
            place_arrival(&mut target_next, mover, to.x, to.y, promotion);

            let source_timeline = game.timeline_mut(from.l);
            source_timeline
                .board_mut(from.t)
                .expect("source board vanished during execution")
                .set_active(false);
            source_timeline.push_board(source_next);

            let target_timeline = game.timeline_mut(to.l);
            target_timeline
                .board_mut(from.t)
                .expect("target board vanished during execution")
                .set_active(false);
            target_timeline.push_board(target_next);

            RegularMove {
                from,
                to,
                piece,
                promotion,
                inter_dimensional: true,
                remote,
                source_board: BoardId::new(from.l, from.t),
                target_board: BoardId::new(to.l, from.t + 1),
                used_boards: vec![
                    BoardId::new(from.l, from.t),
                    BoardId::new(to.l, from.t),
                ],
                created_boards: vec![
                    BoardId::new(from.l, from.t + 1),
                    BoardId::new(to.l, from.t + 1),
                ],
                spawned_timeline: None,
            }
        }
        MoveCase::Branch => {
            let new_l = game.next_timeline_index(piece.side);
            let mut branch = source.branch_to(new_l);
            apply_move(&mut branch, &source, from, to, promotion);

            let mut timeline = Timeline::new(new_l, from.t + 1);
            timeline.push_board(branch);
            game.insert_timeline(timeline);

            debug!(l = new_l, start = from.t + 1, "timeline spawned");

            RegularMove {
                from,
                to,
                piece,
                promotion,
                inter_dimensional: true,
                remote,
                source_board: BoardId::new(from.l, from.t),
                target_board: BoardId::new(new_l, from.t + 1),
                // The source board was already historical; this move
                // deactivated nothing.
                used_boards: Vec::new(),
                created_boards: vec![BoardId::new(new_l, from.t + 1)],
                spawned_timeline: Some(new_l),
            }
        }
    };

    MoveRecord::Regular(record)
}

/// Advances timeline `l` by one turn without relocating a piece.
pub(crate) fn execute_null(game: &mut Game, l: i32) -> MoveRecord {
    let timeline = game.timeline_mut(l);
    let t = timeline.end();
    let next = timeline.current_board().successor();
    timeline.current_board_mut().set_active(false);
    timeline.push_board(next);

    MoveRecord::Null(NullMove {
        l,
        used_board: BoardId::new(l, t),
        created_board: BoardId::new(l, t + 1),
    })
}

/// Reverses a move: created boards are popped and destroyed, a spawned
/// timeline that emptied out is removed, and every board the move
/// deactivated is reactivated. Originals were never mutated, so nothing
/// else needs rolling back.
pub(crate) fn undo(game: &mut Game, record: &MoveRecord) {
    let (created, used, spawned) = match record {
        MoveRecord::Regular(m) => (
            m.created_boards.clone(),
            m.used_boards.clone(),
            m.spawned_timeline,
        ),
        MoveRecord::Null(m) => (vec![m.created_board], vec![m.used_board], None),
    };

    for id in created.iter().rev() {
        let timeline = game.timeline_mut(id.l);
        let popped = timeline
            .pop_board()
            .unwrap_or_else(|| panic!("undo: timeline {} has no board to pop", id.l));
        debug_assert_eq!(popped.t(), id.t, "undo popped a board out of order");
    }

    if let Some(l) = spawned {
        game.remove_empty_timeline(l);
    }

    for id in used {
        game.board_mut_at(id.l, id.t)
            .unwrap_or_else(|| panic!("undo: used board ({}, {}) missing", id.l, id.t))
            .set_active(true);
    }
}

/// Applies the full piece mutation for a same-board move onto `next`, the
/// snapshot derived from `source`: capture, en passant, castling rook
/// relocation, promotion, castle-rights and en-passant bookkeeping.
fn apply_move(
    next: &mut Board,
    source: &Board,
    from: Vec4,
    to: Vec4,
    promotion: Option<PromotionPiece>,
) {
    let piece = next
        .take_piece(from.x, from.y)
        .unwrap_or_else(|| panic!("apply: no piece at {from}"));

    remove_departure_rights(next, piece, from.x, from.y);
    capture_on(next, to.x, to.y);

    // En passant: the pawn lands on the marker square and the pawn that
    // double-pushed past it is lifted off the mover's own rank.
    if piece.is_pawn() {
        if let Some(marker) = move_gen::en_passant_target(source, from.x, from.y, piece.side) {
            if (to.x, to.y) == marker.xy() {
                next.take_piece(marker.x, from.y)
                    .expect("en passant: no pawn to capture");
            }
        }
    }

    // Castling relocates the rook as well; the king's departure already
    // cleared the rights.
    if piece.is_king() && (to.x - from.x).abs() == 2 {
        let (rook_from, rook_to) = if to.x > from.x { (7, 5) } else { (0, 3) };
        let rook = next
            .take_piece(rook_from, from.y)
            .expect("castling: rook missing from its corner");
        next.set_piece(rook_to, from.y, rook.moved());
    }

    place_arrival(next, piece, to.x, to.y, promotion);

    if piece.is_pawn() && (to.y - from.y).abs() == 2 {
        next.set_en_passant(Some(Vec4::new(
            from.x,
            (from.y + to.y) / 2,
            next.l(),
            next.t(),
        )));
    }
}

/// Clears the castle rights a piece forfeits by leaving `(x, y)`.
fn remove_departure_rights(board: &mut Board, piece: Piece, x: i32, y: i32) {
    match piece.kind {
        PieceKind::King => board.remove_castle_rights(CastleRights::both(piece.side)),
        PieceKind::Rook => board
            .remove_castle_rights(CastleRights::for_rook_home(x, y) & CastleRights::both(piece.side)),
        _ => {}
    }
}

/// Removes whatever sits on the target square, clearing the defender's
/// castle right if it was a rook at home.
fn capture_on(board: &mut Board, x: i32, y: i32) {
    if let Some(victim) = board.take_piece(x, y) {
        if victim.kind == PieceKind::Rook {
            board.remove_castle_rights(
                CastleRights::for_rook_home(x, y) & CastleRights::both(victim.side),
            );
        }
    }
}

/// Puts the mover down on its destination square, promoting a pawn that
/// reached its last rank (queen unless the caller chose otherwise).
fn place_arrival(board: &mut Board, piece: Piece, x: i32, y: i32, promotion: Option<PromotionPiece>) {
    if piece.is_pawn() && y == piece.side.promotion_rank() {
        let kind = promotion.unwrap_or(PromotionPiece::Queen).kind();
        board.set_piece(x, y, Piece::new(piece.side, kind).moved());
    } else {
        board.set_piece(x, y, piece.moved());
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::board::Side;
    use crate::game::GameOptions;
    use pretty_assertions::assert_eq;

    fn standard_game() -> Game {
        Game::new(GameOptions::default(), [true, true])
    }

    fn advance(game: &mut Game, from: (i32, i32), to: (i32, i32)) -> MoveRecord {
        let t = game.timeline(0).unwrap().end();
        let from = Vec4::new(from.0, from.1, 0, t);
        let to = Vec4::new(to.0, to.1, 0, t + 1);
        let case = classify(game, from, to).expect("move should classify");
        let record = execute(game, case, from, to, None, false);
        game.flip_turn_for_test();
        record
    }

    #[test]
    fn advance_appends_a_successor_and_retires_the_source() {
        let mut game = standard_game();
        let from = Vec4::new(4, 6, 0, 0);
        let to = Vec4::new(4, 5, 0, 1);

        assert_eq!(classify(&game, from, to), Some(MoveCase::Advance));
        let record = execute(&mut game, MoveCase::Advance, from, to, None, false);

        let timeline = game.timeline(0).unwrap();
        assert_eq!(timeline.end(), 1);
        let next = timeline.board(1).unwrap();
        assert_eq!(next.piece_at(4, 5).map(|p| p.kind), Some(PieceKind::Pawn));
        assert!(next.piece_at(4, 5).unwrap().has_moved);
        assert!(next.is_empty(4, 6));
        assert_eq!(next.to_move(), Side::Black);
        assert!(!timeline.board(0).unwrap().is_active());

        match &record {
            MoveRecord::Regular(m) => {
                assert_eq!(m.used_boards, vec![BoardId::new(0, 0)]);
                assert_eq!(m.created_boards, vec![BoardId::new(0, 1)]);
                assert!(!m.inter_dimensional);
            }
            MoveRecord::Null(_) => panic!("expected a regular move"),
        }
    }

    #[test]
    fn undo_restores_the_previous_state_exactly() {
        let mut game = standard_game();
        let before: Vec<Timeline> = game.timelines().cloned().collect();

        let from = Vec4::new(4, 6, 0, 0);
        let to = Vec4::new(4, 5, 0, 1);
        let record = execute(&mut game, MoveCase::Advance, from, to, None, false);
        undo(&mut game, &record);

        let after: Vec<Timeline> = game.timelines().cloned().collect();
        assert_eq!(after, before);
    }

    #[test]
    fn capture_removes_the_victim() {
        let mut game = standard_game();
        // 1. e4 d5 2. exd5
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (3, 1), (3, 3));
        advance(&mut game, (4, 4), (3, 3));

        let board = game.timeline(0).unwrap().board(3).unwrap();
        let pawn = board.piece_at(3, 3).unwrap();
        assert_eq!((pawn.kind, pawn.side), (PieceKind::Pawn, Side::White));
        assert!(board.is_empty(4, 4));
        // Still 31 pieces: one black pawn gone.
        assert_eq!(board.pieces().count(), 31);
    }

    #[test]
    fn en_passant_lifts_the_passed_pawn() {
        let mut game = standard_game();
        // 1. e4 a6 2. e5 d5 3. exd6
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (0, 1), (0, 2));
        advance(&mut game, (4, 4), (4, 3));
        advance(&mut game, (3, 1), (3, 3));

        let board = game.timeline(0).unwrap().board(4).unwrap();
        assert_eq!(board.en_passant(), Some(Vec4::new(3, 2, 0, 4)));

        advance(&mut game, (4, 3), (3, 2));
        let board = game.timeline(0).unwrap().board(5).unwrap();
        assert_eq!(board.piece_at(3, 2).map(|p| p.kind), Some(PieceKind::Pawn));
        // The double-pushed black pawn is gone from (3, 3).
        assert!(board.is_empty(3, 3));
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn promotion_replaces_the_pawn() {
        let mut game = standard_game();
        // March the a-pawn through b7 to promotion on b8.
        advance(&mut game, (0, 6), (0, 4));
        advance(&mut game, (7, 1), (7, 2));
        advance(&mut game, (0, 4), (0, 3));
        advance(&mut game, (7, 2), (7, 3));
        advance(&mut game, (0, 3), (0, 2));
        advance(&mut game, (7, 3), (7, 4));
        advance(&mut game, (0, 2), (1, 1));
        advance(&mut game, (7, 4), (7, 5));

        let from = Vec4::new(1, 1, 0, 8);
        let to = Vec4::new(0, 0, 0, 9);
        assert_eq!(classify(&game, from, to), Some(MoveCase::Advance));
        execute(
            &mut game,
            MoveCase::Advance,
            from,
            to,
            Some(PromotionPiece::Knight),
            false,
        );

        let board = game.timeline(0).unwrap().board(9).unwrap();
        let promoted = board.piece_at(0, 0).unwrap();
        assert_eq!(promoted.kind, PieceKind::Knight);
        assert_eq!(promoted.side, Side::White);
        assert!(promoted.has_moved);
    }

    #[test]
    fn king_move_clears_both_rights_and_rook_move_one() {
        let mut game = standard_game();
        // 1. e4 ... 2. Ke2 -- the white king steps up.
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (0, 1), (0, 2));
        advance(&mut game, (4, 7), (4, 6));

        let board = game.timeline(0).unwrap().board(3).unwrap();
        assert!(!board.castle_rights().contains(CastleRights::WHITE_KINGSIDE));
        assert!(!board
            .castle_rights()
            .contains(CastleRights::WHITE_QUEENSIDE));
        assert!(board.castle_rights().contains(CastleRights::BLACK_KINGSIDE));

        // Black clears h7 and steps the kingside rook out, dropping only
        // that right.
        advance(&mut game, (7, 1), (7, 3));
        advance(&mut game, (0, 6), (0, 5));
        advance(&mut game, (7, 0), (7, 2));
        let board = game.timeline(0).unwrap().board(6).unwrap();
        assert!(!board.castle_rights().contains(CastleRights::BLACK_KINGSIDE));
        assert!(board
            .castle_rights()
            .contains(CastleRights::BLACK_QUEENSIDE));
    }

    #[test]
    fn rights_decrease_monotonically_along_a_timeline() {
        let mut game = standard_game();
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (4, 1), (4, 3));
        advance(&mut game, (4, 7), (4, 6));
        advance(&mut game, (4, 0), (4, 1));
        advance(&mut game, (4, 6), (4, 7));

        let timeline = game.timeline(0).unwrap();
        let mut previous = CastleRights::all();
        for board in timeline.boards() {
            assert!(previous.contains(board.castle_rights()));
            previous = board.castle_rights();
        }
    }

    #[test]
    fn branch_spawns_a_timeline_from_a_historical_board() {
        let mut game = standard_game();
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (4, 1), (4, 3));

        // White now plays on the historical t = 0 board.
        let from = Vec4::new(6, 7, 0, 0);
        let to = Vec4::new(5, 5, 0, 1);
        assert_eq!(classify(&game, from, to), Some(MoveCase::Branch));
        let record = execute(&mut game, MoveCase::Branch, from, to, None, false);

        assert_eq!(game.timeline_count(Side::White), 1);
        let branch = game.timeline(1).expect("timeline 1 should exist");
        assert_eq!(branch.start(), 1);
        assert_eq!(branch.end(), 1);
        let board = branch.board(1).unwrap();
        assert_eq!(board.piece_at(5, 5).map(|p| p.kind), Some(PieceKind::Knight));
        assert!(board.is_empty(6, 7));

        // The historical source board stays inactive and untouched.
        let source = game.timeline(0).unwrap().board(0).unwrap();
        assert!(!source.is_active());
        assert_eq!(source.piece_at(6, 7).map(|p| p.kind), Some(PieceKind::Knight));

        match &record {
            MoveRecord::Regular(m) => {
                assert!(m.inter_dimensional);
                assert!(m.used_boards.is_empty());
                assert_eq!(m.created_boards, vec![BoardId::new(1, 1)]);
                assert_eq!(m.spawned_timeline, Some(1));
            }
            MoveRecord::Null(_) => panic!("expected a regular move"),
        }
    }

    #[test]
    fn undoing_a_branch_removes_the_spawned_timeline() {
        let mut game = standard_game();
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (4, 1), (4, 3));
        let before: Vec<Timeline> = game.timelines().cloned().collect();

        let from = Vec4::new(6, 7, 0, 0);
        let to = Vec4::new(5, 5, 0, 1);
        let record = execute(&mut game, MoveCase::Branch, from, to, None, false);
        undo(&mut game, &record);

        let after: Vec<Timeline> = game.timelines().cloned().collect();
        assert_eq!(after, before);
        assert_eq!(game.timeline_count(Side::White), 0);
    }

    #[test]
    fn hop_advances_both_timelines() {
        let mut game = standard_game();
        advance(&mut game, (4, 6), (4, 4));
        advance(&mut game, (4, 1), (4, 3));

        // Spawn a second timeline, then bring both level at t = 2.
        let branch_from = Vec4::new(6, 7, 0, 0);
        let branch_to = Vec4::new(5, 5, 0, 1);
        execute(&mut game, MoveCase::Branch, branch_from, branch_to, None, false);
        execute_null(&mut game, 1);

        assert_eq!(game.timeline(0).unwrap().end(), 2);
        assert_eq!(game.timeline(1).unwrap().end(), 2);

        // The white queen's knight hops from the main timeline to the
        // branch.
        let from = Vec4::new(1, 7, 0, 2);
        let to = Vec4::new(2, 5, 1, 3);
        assert_eq!(classify(&game, from, to), Some(MoveCase::Hop));
        let record = execute(&mut game, MoveCase::Hop, from, to, None, false);

        let source_next = game.timeline(0).unwrap().board(3).unwrap();
        assert!(source_next.is_empty(1, 7));
        let target_next = game.timeline(1).unwrap().board(3).unwrap();
        assert_eq!(
            target_next.piece_at(2, 5).map(|p| p.kind),
            Some(PieceKind::Knight)
        );

        match &record {
            MoveRecord::Regular(m) => {
                assert!(m.inter_dimensional);
                assert_eq!(
                    m.created_boards,
                    vec![BoardId::new(0, 3), BoardId::new(1, 3)]
                );
                assert_eq!(m.used_boards, vec![BoardId::new(0, 2), BoardId::new(1, 2)]);
            }
            MoveRecord::Null(_) => panic!("expected a regular move"),
        }

        // And undo restores both timelines.
        undo(&mut game, &record);
        assert_eq!(game.timeline(0).unwrap().end(), 2);
        assert_eq!(game.timeline(1).unwrap().end(), 2);
        assert!(game.timeline(0).unwrap().board(2).unwrap().is_active());
        assert!(game.timeline(1).unwrap().board(2).unwrap().is_active());
    }

    #[test]
    fn null_move_advances_without_relocating() {
        let mut game = standard_game();
        let record = execute_null(&mut game, 0);

        let timeline = game.timeline(0).unwrap();
        assert_eq!(timeline.end(), 1);
        assert_eq!(
            timeline.board(1).unwrap().pieces().count(),
            timeline.board(0).unwrap().pieces().count()
        );
        assert!(!timeline.board(0).unwrap().is_active());
        assert!(record.is_null());

        undo(&mut game, &record);
        assert_eq!(game.timeline(0).unwrap().end(), 0);
        assert!(game.timeline(0).unwrap().board(0).unwrap().is_active());
    }

    #[test]
    fn classify_rejects_malformed_targets() {
        let game = standard_game();
        // Wrong turn stamp.
        assert_eq!(
            classify(&game, Vec4::new(4, 6, 0, 0), Vec4::new(4, 5, 0, 2)),
            None
        );
        // No such timeline.
        assert_eq!(
            classify(&game, Vec4::new(4, 6, 0, 0), Vec4::new(4, 5, 3, 1)),
            None
        );
        // No board at the source turn.
        assert_eq!(
            classify(&game, Vec4::new(4, 6, 0, 5), Vec4::new(4, 5, 0, 6)),
            None
        );
    }
}
