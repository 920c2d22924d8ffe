//! The recorded line of a game and reconstruction of any position on it.
//!
//! A `GameRecord` never stores intermediate boards: every position is
//! rebuilt by replaying the recorded moves from the starting position, so
//! the position shown for an index cannot drift from the move list.

use chess::{ChessMove, Color, Square};

use crate::error::GameError;
use crate::game::notation::{self, from_to, to_san, to_uci};
use crate::game::pgn::PgnGame;
use crate::game::position::Position;
use crate::game::utils::{get_game_status, GameStatus};

/// Number of moves sent to the backend as `previous_moves`.
pub const CONTEXT_MOVES: usize = 5;

/// One move of the line, with the notations the UI and backend need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub chess_move: ChessMove,
    pub san: String,
    pub uci: String,
    pub color: Color,
    pub move_number: u32,
}

impl MoveRecord {
    pub fn from_square(&self) -> Square {
        self.chess_move.get_source()
    }

    pub fn to_square(&self) -> Square {
        self.chess_move.get_dest()
    }

    /// `e2e4` style pair without promotion
    pub fn from_to(&self) -> String {
        from_to(self.chess_move)
    }

    /// Move-list label: `"12."` on White moves, nothing on Black moves.
    pub fn label(&self) -> Option<String> {
        match self.color {
            Color::White => Some(format!("{}.", self.move_number)),
            Color::Black => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GameRecord {
    start: Position,
    moves: Vec<MoveRecord>,
    headers: Vec<(String, String)>,
}

impl GameRecord {
    pub fn from_position(start: Position) -> Self {
        GameRecord {
            start,
            moves: Vec::new(),
            headers: Vec::new(),
        }
    }

    /// Replay a parsed PGN game, honouring a `FEN` setup tag.
    pub fn from_pgn(game: &PgnGame) -> Result<Self, GameError> {
        let start = match game.setup_fen() {
            Some(fen) => Position::from_fen(fen).map_err(|e| GameError::Pgn {
                ply: 0,
                reason: e.to_string(),
            })?,
            None => Position::default(),
        };

        let mut record = GameRecord::from_position(start);
        record.headers = game.headers.clone();

        let mut position = start;
        for (ply, san) in game.moves.iter().enumerate() {
            let mv = notation::parse_san(position.board(), san).map_err(|e| GameError::Pgn {
                ply: ply + 1,
                reason: e.to_string(),
            })?;
            position = record.append(&position, mv)?;
        }
        Ok(record)
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Cursor of the final position: `None` when no move was recorded.
    pub fn last_index(&self) -> Option<usize> {
        self.moves.len().checked_sub(1)
    }

    pub fn check_index(&self, index: usize) -> Result<(), GameError> {
        if index < self.moves.len() {
            Ok(())
        } else {
            Err(GameError::IndexOutOfRange {
                index,
                len: self.moves.len(),
            })
        }
    }

    /// Rebuild the position after move `cursor` (`None`: the start) by
    /// replaying the line from the starting position.
    pub fn position_at(&self, cursor: Option<usize>) -> Result<Position, GameError> {
        Ok(self.replay(cursor)?.last().copied().unwrap_or(self.start))
    }

    /// Every position from the start up to and including `cursor`.
    fn replay(&self, cursor: Option<usize>) -> Result<Vec<Position>, GameError> {
        let count = match cursor {
            Some(index) => {
                self.check_index(index)?;
                index + 1
            }
            None => 0,
        };

        let mut positions = Vec::with_capacity(count + 1);
        positions.push(self.start);
        let mut position = self.start;
        for record in &self.moves[..count] {
            position = position.play(record.chess_move)?;
            positions.push(position);
        }
        Ok(positions)
    }

    /// Game status after move `cursor`, with repetition counted over the
    /// line that led there.
    pub fn status_at(&self, cursor: Option<usize>) -> Result<GameStatus, GameError> {
        let positions = self.replay(cursor)?;
        let current = positions.last().copied().unwrap_or(self.start);
        let repetitions = positions
            .iter()
            .filter(|p| p.hash() == current.hash())
            .count();
        Ok(get_game_status(
            current.board(),
            current.halfmove_clock(),
            repetitions,
        ))
    }

    /// Record `mv` as the move after `cursor`. Moves already recorded past
    /// the cursor are discarded first. Returns the new move's index.
    pub fn play_at(&mut self, cursor: Option<usize>, mv: ChessMove) -> Result<usize, GameError> {
        let position = self.position_at(cursor)?;
        self.moves.truncate(cursor.map_or(0, |index| index + 1));
        self.append(&position, mv)?;
        Ok(self.moves.len() - 1)
    }

    fn append(&mut self, position: &Position, mv: ChessMove) -> Result<Position, GameError> {
        let next = position.play(mv)?;
        self.moves.push(MoveRecord {
            chess_move: mv,
            san: to_san(position.board(), mv),
            uci: to_uci(mv),
            color: position.side_to_move(),
            move_number: position.fullmove_number(),
        });
        Ok(next)
    }

    /// The last `CONTEXT_MOVES` moves leading to `cursor` as space
    /// separated from-to pairs, or an empty string at the start.
    pub fn previous_moves(&self, cursor: Option<usize>) -> String {
        let end = cursor.map_or(0, |index| (index + 1).min(self.moves.len()));
        let begin = end.saturating_sub(CONTEXT_MOVES);
        self.moves[begin..end]
            .iter()
            .map(MoveRecord::from_to)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pgn::parse_pgn;

    fn play_line(sans: &[&str]) -> GameRecord {
        let mut record = GameRecord::default();
        let mut cursor = None;
        for san in sans {
            let position = record.position_at(cursor).unwrap();
            let mv = notation::parse_san(position.board(), san).unwrap();
            cursor = Some(record.play_at(cursor, mv).unwrap());
        }
        record
    }

    #[test]
    fn replays_every_index() {
        let record = play_line(&["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert_eq!(record.len(), 5);
        assert_eq!(record.position_at(None).unwrap(), Position::default());
        assert_eq!(
            record.position_at(Some(1)).unwrap().fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        assert_eq!(
            record.position_at(Some(4)).unwrap().fen(),
            "r1bqkbnr/pppp1ppp/2n5/1B2p3/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 3 3"
        );
        assert!(matches!(
            record.position_at(Some(5)),
            Err(GameError::IndexOutOfRange { index: 5, len: 5 })
        ));
    }

    #[test]
    fn scrubbing_back_and_forth_is_deterministic() {
        let record = play_line(&["d4", "Nf6", "c4", "e6", "Nc3", "Bb4"]);
        let forward = record.position_at(Some(5)).unwrap();
        let _ = record.position_at(None).unwrap();
        let _ = record.position_at(Some(2)).unwrap();
        assert_eq!(record.position_at(Some(5)).unwrap(), forward);
    }

    #[test]
    fn playing_from_an_earlier_index_replaces_the_tail() {
        let mut record = play_line(&["e4", "e5", "Nf3", "Nc6"]);
        let position = record.position_at(Some(1)).unwrap();
        let mv = notation::parse_san(position.board(), "Bc4").unwrap();
        assert_eq!(record.play_at(Some(1), mv).unwrap(), 2);
        let sans: Vec<&str> = record.moves().iter().map(|m| m.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Bc4"]);

        let start = record.position_at(None).unwrap();
        let mv = notation::parse_san(start.board(), "d4").unwrap();
        assert_eq!(record.play_at(None, mv).unwrap(), 0);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn labels_and_context_window() {
        let record = play_line(&["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4"]);
        assert_eq!(record.moves()[0].label().as_deref(), Some("1."));
        assert_eq!(record.moves()[1].label(), None);
        assert_eq!(record.moves()[6].label().as_deref(), Some("4."));
        assert_eq!(record.moves()[6].color, Color::White);

        assert_eq!(record.previous_moves(None), "");
        assert_eq!(record.previous_moves(Some(0)), "e2e4");
        assert_eq!(
            record.previous_moves(Some(6)),
            "g1f3 b8c6 f1b5 a7a6 b5a4"
        );
    }

    #[test]
    fn loads_pgn_and_reaches_the_final_position() {
        let pgn = "[Event \"Scholar\"]\n1. e4 e5 2. Qh5 Nc6 3. Bc4 Nf6 4. Qxf7# 1-0";
        let record = GameRecord::from_pgn(&parse_pgn(pgn).unwrap()).unwrap();
        assert_eq!(record.len(), 7);
        assert_eq!(record.last_index(), Some(6));
        assert_eq!(record.moves()[6].san, "Qxf7#");
        let status = record.status_at(record.last_index()).unwrap();
        assert_eq!(status, GameStatus::Checkmate { winner: Color::White });
        assert_eq!(record.headers()[0], ("Event".to_string(), "Scholar".to_string()));
    }

    #[test]
    fn loads_pgn_from_a_setup_position() {
        let pgn = "[SetUp \"1\"]\n[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 12 40\"]\n\n40... Kd7 41. e4 *";
        let record = GameRecord::from_pgn(&parse_pgn(pgn).unwrap()).unwrap();
        assert_eq!(record.moves()[0].color, Color::Black);
        assert_eq!(record.moves()[0].move_number, 40);
        assert_eq!(record.moves()[0].label(), None);
        assert_eq!(record.moves()[1].label().as_deref(), Some("41."));
        assert_eq!(
            record.position_at(Some(1)).unwrap().fen(),
            "8/3k4/8/8/4P3/8/8/4K3 b - - 0 41"
        );
    }

    #[test]
    fn reports_the_bad_ply_in_a_pgn() {
        let err = GameRecord::from_pgn(&parse_pgn("1. e4 e5 2. Ke3").unwrap()).unwrap_err();
        assert!(matches!(err, GameError::Pgn { ply: 3, .. }));
    }

    #[test]
    fn detects_threefold_repetition() {
        let record = play_line(&["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1", "Ng8"]);
        assert_eq!(
            record.status_at(record.last_index()).unwrap(),
            GameStatus::ThreefoldRepetition
        );
        assert!(!record.status_at(Some(3)).unwrap().is_over());
    }
}
