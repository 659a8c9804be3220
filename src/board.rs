use std::fmt;
use std::str::FromStr;

use crate::movegen::{Move, MoveParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black = 0,
    White = 1,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank direction this colour's pawns advance in.
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PieceKind {
    Pawn = 1,
    Rook = 2,
    Knight = 3,
    Bishop = 4,
    Queen = 5,
    King = 6,
}

impl PieceKind {
    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'r' => Some(PieceKind::Rook),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

/// A coloured piece packed into one byte: bit 0 is the colour and bits 1-3 the
/// kind. The all-zero value is the empty square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Piece(u8);

impl Piece {
    pub const EMPTY: Piece = Piece(0);

    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Piece(color as u8 | (kind as u8) << 1)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn color(&self) -> Option<Color> {
        match (self.is_empty(), self.0 & 1) {
            (true, _) => None,
            (false, 1) => Some(Color::White),
            (false, _) => Some(Color::Black),
        }
    }

    pub fn kind(&self) -> Option<PieceKind> {
        match self.0 >> 1 {
            1 => Some(PieceKind::Pawn),
            2 => Some(PieceKind::Rook),
            3 => Some(PieceKind::Knight),
            4 => Some(PieceKind::Bishop),
            5 => Some(PieceKind::Queen),
            6 => Some(PieceKind::King),
            _ => None,
        }
    }

    pub fn is(&self, color: Color, kind: PieceKind) -> bool {
        *self == Piece::new(color, kind)
    }

    pub fn is_kind(&self, kind: PieceKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Upper case for white, lower case for black, '.' for empty.
    pub fn to_char(&self) -> char {
        match (self.color(), self.kind()) {
            (Some(Color::White), Some(kind)) => kind.to_char().to_ascii_uppercase(),
            (Some(Color::Black), Some(kind)) => kind.to_char(),
            _ => '.',
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(color, kind))
    }
}

/// A square index in `0..64`; a1 is 0 and h8 is 63.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

macro_rules! squares {
    ($($name:ident = $index:expr),* $(,)?) => {
        impl Square {
            $(pub const $name: Square = Square($index);)*
        }
    };
}

squares! {
    A1 = 0, B1 = 1, C1 = 2, D1 = 3, E1 = 4, F1 = 5, G1 = 6, H1 = 7,
    A2 = 8, B2 = 9, C2 = 10, D2 = 11, E2 = 12, F2 = 13, G2 = 14, H2 = 15,
    A3 = 16, B3 = 17, C3 = 18, D3 = 19, E3 = 20, F3 = 21, G3 = 22, H3 = 23,
    A4 = 24, B4 = 25, C4 = 26, D4 = 27, E4 = 28, F4 = 29, G4 = 30, H4 = 31,
    A5 = 32, B5 = 33, C5 = 34, D5 = 35, E5 = 36, F5 = 37, G5 = 38, H5 = 39,
    A6 = 40, B6 = 41, C6 = 42, D6 = 43, E6 = 44, F6 = 45, G6 = 46, H6 = 47,
    A7 = 48, B7 = 49, C7 = 50, D7 = 51, E7 = 52, F7 = 53, G7 = 54, H7 = 55,
    A8 = 56, B8 = 57, C8 = 58, D8 = 59, E8 = 60, F8 = 61, G8 = 62, H8 = 63,
}

impl Square {
    /// Caller guarantees `file` and `rank` are both in `0..8`.
    pub const fn new(file: u8, rank: u8) -> Self {
        Square(rank * 8 + file)
    }

    /// Bounds-checked constructor for signed grid coordinates.
    pub fn try_new(file: i8, rank: i8) -> Option<Self> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub fn rank(&self) -> u8 {
        self.0 / 8
    }

    pub fn file(&self) -> u8 {
        self.0 % 8
    }

    /// The square `delta` ranks away; the caller keeps it on the board.
    pub fn offset_rank(&self, delta: i8) -> Square {
        let index = self.0 as i16 + delta as i16 * 8;
        debug_assert!((0..64).contains(&index), "{} moved {} ranks off the board", self, delta);
        Square(index as u8)
    }

    /// The square `delta` files away; the caller keeps it on the board.
    pub fn offset_file(&self, delta: i8) -> Square {
        let file = self.file() as i8 + delta;
        debug_assert!((0..8).contains(&file), "{} moved {} files off the board", self, delta);
        Square((self.0 as i8 + delta) as u8)
    }

    pub fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Square> {
        Square::try_new(self.file() as i8 + file_delta, self.rank() as i8 + rank_delta)
    }

    pub fn rank_distance(&self, other: Square) -> u8 {
        self.rank().abs_diff(other.rank())
    }

    pub fn file_distance(&self, other: Square) -> u8 {
        self.file().abs_diff(other.file())
    }

    pub fn signed_rank_distance(&self, to: Square) -> i8 {
        to.rank() as i8 - self.rank() as i8
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, (b'1' + self.rank()) as char)
    }
}

impl FromStr for Square {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(MoveParseError::InvalidSquare(s.to_string()));
        }
        match (bytes[0], bytes[1]) {
            (file @ b'a'..=b'h', rank @ b'1'..=b'8') => Ok(Square::new(file - b'a', rank - b'1')),
            _ => Err(MoveParseError::InvalidSquare(s.to_string())),
        }
    }
}

/// Four castling rights, cleared one way only over the course of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_SHORT: CastlingRights = CastlingRights(0b0001);
    pub const WHITE_LONG: CastlingRights = CastlingRights(0b0010);
    pub const BLACK_SHORT: CastlingRights = CastlingRights(0b0100);
    pub const BLACK_LONG: CastlingRights = CastlingRights(0b1000);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    pub fn contains(&self, other: CastlingRights) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn remove(&mut self, other: CastlingRights) {
        self.0 &= !other.0;
    }

    pub fn union(self, other: CastlingRights) -> CastlingRights {
        CastlingRights(self.0 | other.0)
    }

    /// Rights lost when a piece leaves or is captured on `square`.
    fn lost_at(square: Square) -> CastlingRights {
        match square {
            Square::E1 => CastlingRights::WHITE_SHORT.union(CastlingRights::WHITE_LONG),
            Square::H1 => CastlingRights::WHITE_SHORT,
            Square::A1 => CastlingRights::WHITE_LONG,
            Square::E8 => CastlingRights::BLACK_SHORT.union(CastlingRights::BLACK_LONG),
            Square::H8 => CastlingRights::BLACK_SHORT,
            Square::A8 => CastlingRights::BLACK_LONG,
            _ => CastlingRights::NONE,
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        CastlingRights::ALL
    }
}

/// Where the king and rook travel for each castling move.
pub struct Castle {
    pub color: Color,
    pub right: CastlingRights,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,
}

pub const CASTLES: [Castle; 4] = [
    Castle {
        color: Color::White,
        right: CastlingRights::WHITE_SHORT,
        king_from: Square::E1,
        king_to: Square::G1,
        rook_from: Square::H1,
        rook_to: Square::F1,
    },
    Castle {
        color: Color::White,
        right: CastlingRights::WHITE_LONG,
        king_from: Square::E1,
        king_to: Square::C1,
        rook_from: Square::A1,
        rook_to: Square::D1,
    },
    Castle {
        color: Color::Black,
        right: CastlingRights::BLACK_SHORT,
        king_from: Square::E8,
        king_to: Square::G8,
        rook_from: Square::H8,
        rook_to: Square::F8,
    },
    Castle {
        color: Color::Black,
        right: CastlingRights::BLACK_LONG,
        king_from: Square::E8,
        king_to: Square::C8,
        rook_from: Square::A8,
        rook_to: Square::D8,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    pub active: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub squares: [Piece; 64],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    pub fn new(
        active: Color,
        squares: [Piece; 64],
        castling: CastlingRights,
        en_passant: Option<Square>,
    ) -> Self {
        Self {
            active,
            castling,
            en_passant,
            squares,
        }
    }

    /// The standard starting position.
    pub fn initial() -> Self {
        let mut squares = [Piece::EMPTY; 64];
        for (file, &kind) in BACK_RANK.iter().enumerate() {
            let file = file as u8;
            squares[Square::new(file, 0).index()] = Piece::new(Color::White, kind);
            squares[Square::new(file, 1).index()] = Piece::new(Color::White, PieceKind::Pawn);
            squares[Square::new(file, 6).index()] = Piece::new(Color::Black, PieceKind::Pawn);
            squares[Square::new(file, 7).index()] = Piece::new(Color::Black, kind);
        }
        Board::new(Color::White, squares, CastlingRights::ALL, None)
    }

    /// Replays whitespace separated coordinate moves such as `"e2e4 c7c5 a7a8q"`
    /// from the starting position. Moves are not checked for legality.
    pub fn from_move_list(text: &str) -> Result<Self, MoveParseError> {
        let mut board = Board::initial();
        for token in text.split_whitespace() {
            board.apply_move_mut(token.parse()?);
        }
        Ok(board)
    }

    pub fn piece_at(&self, square: Square) -> Piece {
        self.squares[square.index()]
    }

    fn set(&mut self, square: Square, piece: Piece) {
        self.squares[square.index()] = piece;
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        Square::all().find(|&square| self.piece_at(square).is(color, PieceKind::King))
    }

    /// Whether playing `mv` takes a piece, en passant included.
    pub fn is_capture(&self, mv: &Move) -> bool {
        let target = self.piece_at(mv.to);
        match target.color() {
            Some(color) => color != self.active,
            None => Some(mv.to) == self.en_passant && self.piece_at(mv.from).is_kind(PieceKind::Pawn),
        }
    }

    /// Returns a copy of the board with `mv` played.
    pub fn apply(mut self, mv: Move) -> Board {
        self.apply_move_mut(mv);
        self
    }

    fn apply_move_mut(&mut self, mv: Move) {
        self.apply_move(mv.from, mv.to, mv.promotion);
    }

    /// Plays a move in place. The board trusts its input: `from` must hold a
    /// piece of the side to move and the move must be legal.
    pub fn apply_move(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) {
        self.castling.remove(CastlingRights::lost_at(from));
        self.castling.remove(CastlingRights::lost_at(to));

        let moving = self.piece_at(from);
        let castle = CASTLES
            .iter()
            .find(|castle| castle.king_from == from && castle.king_to == to);

        match castle {
            Some(castle) if moving.is_kind(PieceKind::King) => {
                let rook = self.piece_at(castle.rook_from);
                self.set(castle.king_from, Piece::EMPTY);
                self.set(castle.rook_from, Piece::EMPTY);
                self.set(castle.king_to, moving);
                self.set(castle.rook_to, rook);
            }
            _ => {
                let is_pawn = moving.is_kind(PieceKind::Pawn);
                if is_pawn && Some(to) == self.en_passant {
                    let captured = to.offset_rank(-self.active.forward());
                    self.set(captured, Piece::EMPTY);
                }

                let placed = match promotion {
                    Some(kind) => Piece::new(self.active, kind),
                    None => moving,
                };
                self.set(to, placed);
                self.set(from, Piece::EMPTY);
            }
        }

        self.en_passant = if moving.is_kind(PieceKind::Pawn) && from.rank_distance(to) == 2 {
            Some(from.offset_rank(self.active.forward()))
        } else {
            None
        };

        self.active = self.active.opposite();
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::initial()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            let row: Vec<String> = (0..8)
                .map(|file| self.piece_at(Square::new(file, rank)).to_char().to_string())
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

/// Builds a board from eight rows listed from rank 1 up to rank 8, one
/// character per file (`'.'` for empty). Used to set up test positions.
#[cfg(test)]
pub(crate) fn board_from_layout(
    active: Color,
    rows: [&str; 8],
    castling: CastlingRights,
    en_passant: Option<Square>,
) -> Board {
    let mut squares = [Piece::EMPTY; 64];
    for (rank, row) in rows.iter().enumerate() {
        for (file, c) in row.chars().filter(|c| !c.is_whitespace()).enumerate() {
            squares[Square::new(file as u8, rank as u8).index()] =
                Piece::from_char(c).unwrap_or(Piece::EMPTY);
        }
    }
    Board::new(active, squares, castling, en_passant)
}
