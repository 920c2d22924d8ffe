//! PGN import on top of `pgn-reader`: tag pairs and the mainline SAN of the
//! first game. Legality is checked later, when the moves are replayed.

use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};

use crate::error::GameError;

/// The first game of a PGN text: tag pairs and mainline SAN tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub headers: Vec<(String, String)>,
    pub moves: Vec<String>,
}

impl PgnGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Starting FEN when the game was set up from a custom position.
    pub fn setup_fen(&self) -> Option<&str> {
        let fen = self.header("FEN")?;
        match self.header("SetUp") {
            Some("0") => None,
            _ => Some(fen),
        }
    }
}

/// Collects headers and mainline moves; variations are skipped.
#[derive(Default)]
struct GameCollector {
    game: PgnGame,
}

impl Visitor for GameCollector {
    type Result = PgnGame;

    fn begin_game(&mut self) {
        self.game = PgnGame::default();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        self.game.headers.push((
            String::from_utf8_lossy(key).into_owned(),
            value.decode_utf8_lossy().into_owned(),
        ));
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn san(&mut self, san_plus: SanPlus) {
        self.game.moves.push(san_plus.to_string());
    }

    fn end_game(&mut self) -> Self::Result {
        std::mem::take(&mut self.game)
    }
}

/// Parse the first game in `text`.
pub fn parse_pgn(text: &str) -> Result<PgnGame, GameError> {
    let text = strip_en_passant_markers(text.trim_start_matches('\u{feff}'));
    if text.trim().is_empty() {
        return Err(no_game());
    }

    let mut reader = BufferedReader::new_cursor(text.as_bytes());
    let game = reader
        .read_game(&mut GameCollector::default())
        .map_err(|e| GameError::Pgn {
            ply: 0,
            reason: e.to_string(),
        })?
        .ok_or_else(no_game)?;

    if game.headers.is_empty() && game.moves.is_empty() {
        return Err(no_game());
    }
    Ok(game)
}

fn no_game() -> GameError {
    GameError::Pgn {
        ply: 0,
        reason: "no tags or moves found".to_string(),
    }
}

/// Drop the `e.p.` annotation some exporters write after en passant
/// captures as a token of its own.
fn strip_en_passant_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for piece in text.split_inclusive(char::is_whitespace) {
        match piece.strip_prefix("e.p.") {
            Some(rest) if rest.trim().is_empty() => out.push_str(rest),
            _ => out.push_str(piece),
        }
    }
    out
}
