use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::board::{Board, Color, Piece, PieceKind, Square, CASTLES};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveParseError {
    #[error("move `{0}` must be 4 or 5 characters long")]
    InvalidLength(String),
    #[error("invalid square `{0}`")]
    InvalidSquare(String),
    #[error("invalid promotion piece `{0}`")]
    InvalidPromotion(char),
}

/// A move from one square to another, with the piece a pawn promotes to if
/// any. Whether the move is legal depends on the board it is played on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn new_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
        }
    }

    /// Coordinate notation, e.g. `e2e4` or `h7h8q`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(MoveParseError::InvalidLength(s.to_string()));
        }

        let from = s[0..2].parse()?;
        let to = s[2..4].parse()?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c @ ('r' | 'n' | 'b' | 'q')) => PieceKind::from_char(c),
            Some(c) => return Err(MoveParseError::InvalidPromotion(c)),
        };

        Ok(Move { from, to, promotion })
    }
}

const STRAIGHT: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (-1, 0),
    (1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
];

/// Reports whether the active side's king on `king` would be safe if the piece
/// on `vacated_from` moved to `candidate_to`.
///
/// Walks the eight rays out from the king and checks the knight squares
/// around it, so no attack map or board copy is needed. A missing king is
/// always safe. To ask whether a square is attacked outright, pass the square
/// as `king` and `None` for `candidate_to`.
pub fn king_is_safe(
    board: &Board,
    king: Option<Square>,
    vacated_from: Option<Square>,
    candidate_to: Option<Square>,
) -> bool {
    let Some(king) = king else {
        return true;
    };

    let rays_safe = STRAIGHT
        .iter()
        .map(|&direction| (direction, false))
        .chain(DIAGONAL.iter().map(|&direction| (direction, true)))
        .all(|(direction, diagonal)| {
            ray_is_safe(board, king, direction, diagonal, vacated_from, candidate_to)
        });
    if !rays_safe {
        return false;
    }

    let enemy = board.active.opposite();
    !KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(df, dr)| king.offset(df, dr))
        .any(|square| Some(square) != candidate_to && board.piece_at(square).is(enemy, PieceKind::Knight))
}

fn ray_is_safe(
    board: &Board,
    king: Square,
    (df, dr): (i8, i8),
    diagonal: bool,
    vacated_from: Option<Square>,
    candidate_to: Option<Square>,
) -> bool {
    let mut current = king;
    while let Some(square) = current.offset(df, dr) {
        current = square;

        // the moving piece blocks this ray once it lands
        if Some(square) == candidate_to {
            return true;
        }

        let piece = board.piece_at(square);
        if piece.is_empty() || Some(square) == vacated_from {
            continue;
        }

        return match (piece.color(), piece.kind()) {
            (Some(color), Some(kind)) if color != board.active => {
                !attacks_along_ray(board, king, square, kind, diagonal)
            }
            _ => true,
        };
    }
    true
}

/// Whether an enemy `kind` on `from` hits `king` along the ray between them.
fn attacks_along_ray(board: &Board, king: Square, from: Square, kind: PieceKind, diagonal: bool) -> bool {
    let adjacent = king.file_distance(from).max(king.rank_distance(from)) == 1;
    match kind {
        PieceKind::Queen => true,
        PieceKind::Rook => !diagonal,
        PieceKind::Bishop => diagonal,
        PieceKind::King => adjacent,
        // enemy pawns capture towards us, so they sit one rank ahead of the king
        PieceKind::Pawn => {
            diagonal && adjacent && king.signed_rank_distance(from) == board.active.forward()
        }
        PieceKind::Knight => false,
    }
}

/// Collects moves that leave the active king safe.
struct MoveGenerator<'a> {
    board: &'a Board,
    king: Option<Square>,
    moves: Vec<Move>,
}

impl<'a> MoveGenerator<'a> {
    fn new(board: &'a Board) -> Self {
        Self {
            board,
            king: board.find_king(board.active),
            moves: Vec::with_capacity(48),
        }
    }

    fn add_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) {
        if king_is_safe(self.board, self.king, Some(from), Some(to)) {
            self.moves.push(Move { from, to, promotion });
        }
    }

    fn add_king_move(&mut self, from: Square, to: Square) {
        if king_is_safe(self.board, Some(to), Some(from), None) {
            self.moves.push(Move::new(from, to));
        }
    }

    // the captured pawn leaves its own square too, which the oracle cannot see
    fn add_en_passant(&mut self, from: Square, to: Square) {
        let mut after = *self.board;
        after.squares[to.offset_rank(-self.board.active.forward()).index()] = Piece::EMPTY;
        if king_is_safe(&after, self.king, Some(from), Some(to)) {
            self.moves.push(Move::new(from, to));
        }
    }

    fn is_enemy(&self, square: Square) -> bool {
        matches!(self.board.piece_at(square).color(), Some(color) if color != self.board.active)
    }

    fn is_empty(&self, square: Square) -> bool {
        self.board.piece_at(square).is_empty()
    }

    fn add_pawn_moves(&mut self, from: Square) {
        let active = self.board.active;
        let forward = active.forward();
        let (start_rank, last_rank) = match active {
            Color::White => (1, 7),
            Color::Black => (6, 0),
        };

        let Some(up1) = from.offset(0, forward) else {
            return;
        };

        if self.is_empty(up1) {
            self.add_pawn_move(from, up1, last_rank);

            if from.rank() == start_rank {
                let up2 = up1.offset_rank(forward);
                if self.is_empty(up2) {
                    self.add_move(from, up2, None);
                }
            }
        }

        for side in [-1, 1] {
            let Some(target) = up1.offset(side, 0) else {
                continue;
            };
            if self.is_enemy(target) {
                self.add_pawn_move(from, target, last_rank);
            } else if Some(target) == self.board.en_passant {
                self.add_en_passant(from, target);
            }
        }
    }

    fn add_pawn_move(&mut self, from: Square, to: Square, last_rank: u8) {
        if to.rank() == last_rank {
            for promotion in PROMOTIONS {
                self.add_move(from, to, Some(promotion));
            }
        } else {
            self.add_move(from, to, None);
        }
    }

    fn add_ray_moves(&mut self, from: Square, directions: &[(i8, i8)]) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                current = to;
                if self.is_empty(to) {
                    self.add_move(from, to, None);
                    continue;
                }
                if self.is_enemy(to) {
                    self.add_move(from, to, None);
                }
                break;
            }
        }
    }

    fn add_knight_moves(&mut self, from: Square) {
        for &(df, dr) in &KNIGHT_OFFSETS {
            if let Some(to) = from.offset(df, dr) {
                if self.is_empty(to) || self.is_enemy(to) {
                    self.add_move(from, to, None);
                }
            }
        }
    }

    fn add_king_moves(&mut self, from: Square) {
        for &(df, dr) in &KING_OFFSETS {
            if let Some(to) = from.offset(df, dr) {
                if self.is_empty(to) || self.is_enemy(to) {
                    self.add_king_move(from, to);
                }
            }
        }
        self.add_castling_moves(from);
    }

    fn add_castling_moves(&mut self, from: Square) {
        let board = self.board;
        for castle in CASTLES.iter() {
            if castle.color != board.active
                || castle.king_from != from
                || !board.castling.contains(castle.right)
                || !board.piece_at(castle.rook_from).is(board.active, PieceKind::Rook)
            {
                continue;
            }

            let rank = from.rank();
            let (low, high) = if castle.rook_from.file() < from.file() {
                (castle.rook_from.file() + 1, from.file())
            } else {
                (from.file() + 1, castle.rook_from.file())
            };
            let path_clear = (low..high).all(|file| self.is_empty(Square::new(file, rank)));
            if !path_clear {
                continue;
            }

            // the king may not castle out of, through, or into check
            let unattacked = king_is_safe(board, Some(from), None, None)
                && king_is_safe(board, Some(castle.rook_to), Some(from), None)
                && king_is_safe(board, Some(castle.king_to), Some(from), None);
            if unattacked {
                self.moves.push(Move::new(from, castle.king_to));
            }
        }
    }
}

/// Every legal move for the side to move. An empty result means the game is
/// over, either by checkmate or stalemate.
pub fn find_legal_moves(board: &Board) -> Vec<Move> {
    let mut generator = MoveGenerator::new(board);

    for square in Square::all() {
        let piece = board.piece_at(square);
        if piece.color() != Some(board.active) {
            continue;
        }

        match piece.kind() {
            Some(PieceKind::Pawn) => generator.add_pawn_moves(square),
            Some(PieceKind::Rook) => generator.add_ray_moves(square, &STRAIGHT),
            Some(PieceKind::Knight) => generator.add_knight_moves(square),
            Some(PieceKind::Bishop) => generator.add_ray_moves(square, &DIAGONAL),
            Some(PieceKind::Queen) => {
                generator.add_ray_moves(square, &STRAIGHT);
                generator.add_ray_moves(square, &DIAGONAL);
            }
            Some(PieceKind::King) => generator.add_king_moves(square),
            None => {}
        }
    }

    generator.moves
}

pub fn is_in_check(board: &Board) -> bool {
    !king_is_safe(board, board.find_king(board.active), None, None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    /// The colour that delivered mate.
    Checkmate(Color),
    Stalemate,
}

/// Tells checkmate from stalemate for callers reporting a result. The search
/// does not use this and scores both alike.
pub fn game_state(board: &Board) -> GameState {
    if !find_legal_moves(board).is_empty() {
        GameState::Ongoing
    } else if is_in_check(board) {
        GameState::Checkmate(board.active.opposite())
    } else {
        GameState::Stalemate
    }
}

/// Counts the leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(board: &Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = find_legal_moves(board);
    if depth == 1 {
        return moves.len() as u64;
    }

    moves
        .into_iter()
        .map(|mv| perft(&board.apply(mv), depth - 1))
        .sum()
}
