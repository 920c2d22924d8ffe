use chess::{Board, ChessMove, Color, Piece};
use std::str::FromStr;

use crate::error::GameError;

/// A board together with the move clocks `chess::Board` does not track.
///
/// `Board`'s own FEN output always ends in `0 1`; the backend gets the real
/// half-move clock and full-move number from here instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Position {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }
}

impl Position {
    /// Parse a FEN string. Missing clock fields default to `0 1`, and the
    /// literal `start`/`startpos` is accepted for the initial position.
    pub fn from_fen(fen: &str) -> Result<Self, GameError> {
        let fen = fen.trim();
        if fen.eq_ignore_ascii_case("start") || fen.eq_ignore_ascii_case("startpos") {
            return Ok(Position::default());
        }

        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(GameError::InvalidFen {
                fen: fen.to_string(),
                reason: "expected at least 4 fields".to_string(),
            });
        }

        let board_fen = format!("{} 0 1", fields[..4].join(" "));
        let board = Board::from_str(&board_fen).map_err(|e| GameError::InvalidFen {
            fen: fen.to_string(),
            reason: e.to_string(),
        })?;

        let halfmove_clock = parse_clock(fen, fields.get(4), 0)?;
        let fullmove_number = parse_clock(fen, fields.get(5), 1)?.max(1);

        Ok(Position {
            board,
            halfmove_clock,
            fullmove_number,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Zobrist hash of the placement, side to move, castling and en passant.
    pub fn hash(&self) -> u64 {
        self.board.get_hash()
    }

    pub fn fen(&self) -> String {
        let board_fen = self.board.to_string();
        let placement: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            placement.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Play a legal move and return the resulting position.
    pub fn play(&self, mv: ChessMove) -> Result<Position, GameError> {
        if !self.board.legal(mv) {
            return Err(GameError::IllegalMove {
                mv: mv.to_string(),
                fen: self.fen(),
            });
        }

        let resets_clock = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(mv.get_dest()).is_some();

        let fullmove_number = match self.board.side_to_move() {
            Color::White => self.fullmove_number,
            Color::Black => self.fullmove_number + 1,
        };

        Ok(Position {
            board: self.board.make_move_new(mv),
            halfmove_clock: if resets_clock { 0 } else { self.halfmove_clock + 1 },
            fullmove_number,
        })
    }
}

fn parse_clock(fen: &str, field: Option<&&str>, default: u32) -> Result<u32, GameError> {
    match field {
        None => Ok(default),
        Some(value) => value.parse::<u32>().map_err(|_| GameError::InvalidFen {
            fen: fen.to_string(),
            reason: format!("invalid move counter '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Square;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn mv(from: Square, to: Square) -> ChessMove {
        ChessMove::new(from, to, None)
    }

    #[test]
    fn default_is_the_initial_position() {
        assert_eq!(Position::default().fen(), START_FEN);
        assert_eq!(Position::from_fen("start").unwrap(), Position::default());
    }

    #[test]
    fn clocks_follow_the_moves() {
        let pos = Position::default()
            .play(mv(Square::G1, Square::F3))
            .unwrap();
        assert_eq!(pos.halfmove_clock(), 1);
        assert_eq!(pos.fullmove_number(), 1);

        let pos = pos.play(mv(Square::G8, Square::F6)).unwrap();
        assert_eq!(pos.halfmove_clock(), 2);
        assert_eq!(pos.fullmove_number(), 2);

        let pos = pos.play(mv(Square::E2, Square::E4)).unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert!(pos.fen().ends_with(" 0 2"));
    }

    #[test]
    fn fen_keeps_supplied_clocks() {
        let fen = "8/8/8/4k3/8/8/4K3/4R3 w - - 37 81";
        let pos = Position::from_fen(fen).unwrap();
        assert_eq!(pos.halfmove_clock(), 37);
        assert_eq!(pos.fullmove_number(), 81);
        assert_eq!(pos.fen(), fen);
    }

    #[test]
    fn rejects_illegal_moves_and_bad_fen() {
        let err = Position::default().play(mv(Square::E2, Square::E5)).unwrap_err();
        assert!(matches!(err, GameError::IllegalMove { .. }));

        assert!(Position::from_fen("not a fen").is_err());
        assert!(Position::from_fen("8/8/8/8/8/8/8/8 w - - x 1").is_err());
    }
}
