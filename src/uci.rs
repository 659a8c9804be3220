use std::io::{BufRead, Write};

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::board::Board;
use crate::movegen::{game_state, GameState, MoveParseError};
use crate::search::{Search, SearchConfig};

#[derive(Debug, Error)]
pub enum UciError {
    #[error("unsupported position `{0}`, only `startpos` is understood")]
    UnsupportedPosition(String),
    #[error("bad move in position command: {0}")]
    BadMove(#[from] MoveParseError),
    #[error("invalid search depth `{0}`")]
    InvalidDepth(String),
    #[error("unknown command `{0}`")]
    UnknownCommand(String),
}

/// Line oriented driver for the subset of UCI the engine understands.
pub struct UciHandler {
    board: Board,
    rng: StdRng,
    seed: u64,
    config: SearchConfig,
}

impl UciHandler {
    pub fn new(config: SearchConfig, seed: u64) -> Self {
        UciHandler {
            board: Board::initial(),
            rng: StdRng::seed_from_u64(seed),
            seed,
            config,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Reads commands until `quit` or end of input. Rejected commands are
    /// logged and otherwise ignored, as UCI expects.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        info!(seed = self.seed, depth = self.config.depth, "engine started");
        writeln!(output, "info string rng seed {}", self.seed)?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => write!(output, "{}", response)?,
                Err(err) => warn!(command, %err, "command rejected"),
            }
            output.flush()?;
        }

        info!("engine stopped");
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String, UciError> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Ok(String::new());
        };

        match name {
            "uci" => Ok(self.handle_uci()),
            "isready" => Ok("readyok\n".to_string()),
            "ucinewgame" => Ok(self.handle_ucinewgame()),
            "position" => self.handle_position(args),
            "go" => self.handle_go(args),
            "quit" => Ok(String::new()),
            _ => Err(UciError::UnknownCommand(command.to_string())),
        }
    }

    fn handle_uci(&self) -> String {
        format!(
            "id name pawnsmith {}\nid author the pawnsmith developers\nuciok\n",
            env!("CARGO_PKG_VERSION")
        )
    }

    fn handle_ucinewgame(&mut self) -> String {
        self.board = Board::initial();
        String::new()
    }

    /// `position startpos [moves ...]`. The board is left untouched when the
    /// command is rejected.
    fn handle_position(&mut self, args: &[&str]) -> Result<String, UciError> {
        match args {
            ["startpos"] => self.board = Board::initial(),
            ["startpos", "moves", moves @ ..] => {
                self.board = Board::from_move_list(&moves.join(" "))?;
            }
            _ => return Err(UciError::UnsupportedPosition(args.join(" "))),
        }
        Ok(String::new())
    }

    /// `go [depth N]`. Clock parameters are accepted and ignored since every
    /// search runs to a fixed depth.
    fn handle_go(&mut self, args: &[&str]) -> Result<String, UciError> {
        let mut depth = self.config.depth;
        if let Some(index) = args.iter().position(|&arg| arg == "depth") {
            let value = args.get(index + 1).copied().unwrap_or_default();
            depth = value
                .parse()
                .map_err(|_| UciError::InvalidDepth(value.to_string()))?;
        }

        let mut search = Search::new(&mut self.rng);
        match search.find_best_move(&self.board, depth) {
            Some(mv) => {
                info!(depth, nodes = search.nodes_searched(), best = %mv, "search done");
                Ok(format!("bestmove {}\n", mv))
            }
            None => {
                let state = game_state(&self.board);
                info!(?state, "no move to play");
                let reason = match state {
                    GameState::Checkmate(winner) => format!("checkmate, {:?} wins", winner),
                    _ => "stalemate".to_string(),
                };
                Ok(format!("info string {}\nbestmove 0000\n", reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::movegen::{find_legal_moves, Move};
    use std::io::Cursor;

    fn handler() -> UciHandler {
        UciHandler::new(SearchConfig { depth: 2 }, 17)
    }

    fn best_move(response: &str) -> Move {
        let line = response
            .lines()
            .find(|line| line.starts_with("bestmove"))
            .unwrap();
        line["bestmove ".len()..].parse().unwrap()
    }

    #[test]
    fn test_handshake() {
        let mut uci = handler();
        let response = uci.handle_command("uci").unwrap();
        assert!(response.starts_with("id name pawnsmith"));
        assert!(response.ends_with("uciok\n"));
        assert_eq!(uci.handle_command("isready").unwrap(), "readyok\n");
        assert_eq!(uci.handle_command("   ").unwrap(), "");
    }

    #[test]
    fn test_position_with_moves() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4 e7e5 g1f3").unwrap();
        assert_eq!(uci.board().active, Color::Black);
        assert_eq!(*uci.board(), Board::from_move_list("e2e4 e7e5 g1f3").unwrap());

        uci.handle_command("ucinewgame").unwrap();
        assert_eq!(*uci.board(), Board::initial());
    }

    #[test]
    fn test_rejected_positions_keep_board() {
        let mut uci = handler();
        uci.handle_command("position startpos moves d2d4").unwrap();
        let before = *uci.board();

        let fen = uci.handle_command("position fen 8/8/8/8/8/8/8/8 w - - 0 1");
        assert!(matches!(fen, Err(UciError::UnsupportedPosition(_))));

        let bad = uci.handle_command("position startpos moves e2e4 e7e9");
        assert!(matches!(bad, Err(UciError::BadMove(MoveParseError::InvalidSquare(_)))));

        assert_eq!(*uci.board(), before);
    }

    #[test]
    fn test_go_returns_legal_move() {
        let mut uci = handler();
        uci.handle_command("position startpos moves e2e4 d7d5").unwrap();
        let response = uci.handle_command("go depth 1").unwrap();
        let mv = best_move(&response);
        assert!(find_legal_moves(uci.board()).contains(&mv));
    }

    #[test]
    fn test_go_ignores_clock() {
        let mut uci = handler();
        let response = uci.handle_command("go wtime 1000 btime 1000 depth 1").unwrap();
        assert!(find_legal_moves(uci.board()).contains(&best_move(&response)));
    }

    #[test]
    fn test_go_invalid_depth() {
        let mut uci = handler();
        assert!(matches!(uci.handle_command("go depth x"), Err(UciError::InvalidDepth(_))));
        assert!(matches!(uci.handle_command("go depth"), Err(UciError::InvalidDepth(_))));
    }

    #[test]
    fn test_go_after_checkmate() {
        let mut uci = handler();
        uci.handle_command("position startpos moves f2f3 e7e5 g2g4 d8h4").unwrap();
        let response = uci.handle_command("go").unwrap();
        assert!(response.contains("checkmate, Black wins"));
        assert!(response.ends_with("bestmove 0000\n"));
    }

    #[test]
    fn test_unknown_command() {
        let mut uci = handler();
        assert!(matches!(uci.handle_command("register later"), Err(UciError::UnknownCommand(_))));
    }

    #[test]
    fn test_run_session() {
        let input = Cursor::new("uci\nbogus\nposition startpos\ngo depth 1\nquit\nisready\n");
        let mut output = Vec::new();
        handler().run(input, &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "info string rng seed 17");
        assert!(lines.contains(&"uciok"));
        assert!(lines.last().unwrap().starts_with("bestmove "));
        assert!(!lines.contains(&"readyok"));
    }

    #[test]
    fn test_same_seed_same_reply() {
        let mut first = handler();
        let mut second = handler();
        for uci in [&mut first, &mut second] {
            uci.handle_command("position startpos moves e2e4").unwrap();
        }
        assert_eq!(
            first.handle_command("go depth 2").unwrap(),
            second.handle_command("go depth 2").unwrap()
        );
    }
}
