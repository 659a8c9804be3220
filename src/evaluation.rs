use crate::board::{Board, PieceKind};

/// Material weight of a piece. The king is never captured so it scores nothing.
pub fn piece_value(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 3,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 5,
        PieceKind::Queen => 8,
        PieceKind::King => 0,
    }
}

/// Material balance from the point of view of the side that just moved, i.e.
/// the side that is not on move.
pub fn evaluate_position(board: &Board) -> i32 {
    board
        .squares
        .iter()
        .filter_map(|piece| Some((piece.color()?, piece.kind()?)))
        .map(|(color, kind)| {
            let value = piece_value(kind);
            if color == board.active {
                -value
            } else {
                value
            }
        })
        .sum()
}
