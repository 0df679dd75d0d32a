//! JSON wire format for moves, used for persistence and replay.
//!
//! The shape is fixed: camelCase field names, promotion codes 1..4
//! (queen, knight, rook, bishop), sides as 0 (Black) and 1 (White).
//! Serialize -> deserialize -> re-serialize is a fixed point.

use num_traits::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::{MoveRecord, RegularMove};

use super::{PieceKind, PromotionPiece, Side, Vec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireVec4 {
    pub x: i32,
    pub y: i32,
    pub l: i32,
    pub t: i32,
}

impl From<Vec4> for WireVec4 {
    fn from(pos: Vec4) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            l: pos.l,
            t: pos.t,
        }
    }
}

impl From<WireVec4> for Vec4 {
    fn from(pos: WireVec4) -> Self {
        Self::new(pos.x, pos.y, pos.l, pos.t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePiece {
    #[serde(rename = "type")]
    pub kind: String,
    pub side: u8,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireBoard {
    pub l: i32,
    pub t: i32,
}

/// One move as it travels over the wire.
///
/// All optional fields are omitted from the JSON when absent; which of
/// them are required depends on the move kind and is enforced by the
/// conversion to [`MoveProposal`], not by the deserializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WireMove {
    pub null_move: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<WireVec4>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<WireVec4>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promote: Option<u8>,
    pub remote_move: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_piece: Option<WirePiece>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_board: Option<WireBoard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_board: Option<WireBoard>,
    pub is_inter_dimensional_move: bool,
}

/// Errors raised at the deserialization boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireMoveError {
    #[error("null move without a timeline index")]
    NullMoveWithoutTimeline,
    #[error("move without a target position")]
    MissingTarget,
    #[error("move without a source position")]
    MissingSource,
    #[error("move without a source piece")]
    MissingSourcePiece,
    #[error("move without a source board")]
    MissingSourceBoard,
    #[error("unknown piece name {0:?}")]
    UnknownPieceName(String),
    #[error("invalid side {0}")]
    InvalidSide(u8),
    #[error("invalid promotion code {0}")]
    InvalidPromotion(u8),
    #[error("malformed JSON: {0}")]
    Json(String),
}

/// A validated, replayable move description decoded from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveProposal {
    Null {
        l: i32,
    },
    Regular {
        from: Vec4,
        to: Vec4,
        promotion: Option<PromotionPiece>,
        remote: bool,
    },
}

impl WireMove {
    pub fn from_json(json: &str) -> Result<Self, WireMoveError> {
        serde_json::from_str(json).map_err(|err| WireMoveError::Json(err.to_string()))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("wire move serialization cannot fail")
    }
}

impl TryFrom<WireMove> for MoveProposal {
    type Error = WireMoveError;

    fn try_from(wire: WireMove) -> Result<Self, Self::Error> {
        if wire.null_move {
            let l = wire.l.ok_or(WireMoveError::NullMoveWithoutTimeline)?;
            return Ok(MoveProposal::Null { l });
        }

        let to = wire.to.ok_or(WireMoveError::MissingTarget)?;
        let from = wire.from.ok_or(WireMoveError::MissingSource)?;
        let piece = wire.source_piece.ok_or(WireMoveError::MissingSourcePiece)?;
        wire.source_board.ok_or(WireMoveError::MissingSourceBoard)?;

        PieceKind::try_from_name(&piece.kind)
            .ok_or_else(|| WireMoveError::UnknownPieceName(piece.kind.clone()))?;
        Side::try_from_index(piece.side).ok_or(WireMoveError::InvalidSide(piece.side))?;

        let promotion = wire
            .promote
            .map(|code| PromotionPiece::from_u8(code).ok_or(WireMoveError::InvalidPromotion(code)))
            .transpose()?;

        Ok(MoveProposal::Regular {
            from: from.into(),
            to: to.into(),
            promotion,
            remote: wire.remote_move,
        })
    }
}

impl From<&MoveRecord> for WireMove {
    fn from(record: &MoveRecord) -> Self {
        match record {
            MoveRecord::Null(null) => WireMove {
                null_move: true,
                l: Some(null.l),
                ..Default::default()
            },
            MoveRecord::Regular(m) => WireMove::from_regular(m),
        }
    }
}

impl WireMove {
    fn from_regular(m: &RegularMove) -> Self {
        WireMove {
            null_move: false,
            l: None,
            from: Some(m.from.into()),
            to: Some(m.to.into()),
            promote: m.promotion.and_then(|p| p.to_u8()),
            remote_move: m.remote,
            source_piece: Some(WirePiece {
                kind: m.piece.kind.name().to_owned(),
                side: m.piece.side.index() as u8,
                x: m.from.x,
                y: m.from.y,
            }),
            source_board: Some(WireBoard {
                l: m.source_board.l,
                t: m.source_board.t,
            }),
            target_board: Some(WireBoard {
                l: m.target_board.l,
                t: m.target_board.t,
            }),
            is_inter_dimensional_move: m.inter_dimensional,
        }
    }
}
