pub mod board;
pub mod evaluation;
pub mod movegen;
pub mod search;
pub mod uci;

pub use board::{Board, CastlingRights, Color, Piece, PieceKind, Square};
pub use evaluation::evaluate_position;
pub use movegen::{find_legal_moves, game_state, perft, GameState, Move, MoveParseError};
pub use search::{evaluate, Search, SearchConfig};
