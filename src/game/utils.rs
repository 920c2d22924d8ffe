use chess::{BitBoard, Board, BoardStatus, Color, Piece, EMPTY};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Capitalised colour name, as the analysis backend expects it
pub fn color_label(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// How a position stands once draw rules that need the game's history are
/// taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress(Color),
    Check(Color),
    Checkmate { winner: Color },
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

impl GameStatus {
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::InProgress(_) | GameStatus::Check(_))
    }

    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate
                | GameStatus::InsufficientMaterial
                | GameStatus::FiftyMoveRule
                | GameStatus::ThreefoldRepetition
        )
    }

    /// Status string sent to the page
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::InProgress(Color::White) => "white_turn",
            GameStatus::InProgress(Color::Black) => "black_turn",
            GameStatus::Check(_) => "check",
            GameStatus::Checkmate { winner: Color::White } => "white_wins",
            GameStatus::Checkmate { winner: Color::Black } => "black_wins",
            GameStatus::Stalemate => "stalemate",
            GameStatus::InsufficientMaterial
            | GameStatus::FiftyMoveRule
            | GameStatus::ThreefoldRepetition => "draw",
        }
    }

    /// Text of the game-over banner, if the game is over
    pub fn banner(&self) -> Option<&'static str> {
        match self {
            GameStatus::Checkmate { .. } => Some("Checkmate!"),
            s if s.is_draw() => Some("Draw!"),
            s if s.is_over() => Some("Game ended."),
            _ => None,
        }
    }
}

/// Get the game status from the board alone plus the counters the caller
/// tracks: the half-move clock and how often the position has occurred.
pub fn get_game_status(board: &Board, halfmove_clock: u32, repetitions: usize) -> GameStatus {
    let to_move = board.side_to_move();
    match board.status() {
        BoardStatus::Checkmate => GameStatus::Checkmate { winner: !to_move },
        BoardStatus::Stalemate => GameStatus::Stalemate,
        BoardStatus::Ongoing => {
            if has_insufficient_material(board) {
                GameStatus::InsufficientMaterial
            } else if halfmove_clock >= 100 {
                GameStatus::FiftyMoveRule
            } else if repetitions >= 3 {
                GameStatus::ThreefoldRepetition
            } else if *board.checkers() != EMPTY {
                GameStatus::Check(to_move)
            } else {
                GameStatus::InProgress(to_move)
            }
        }
    }
}

/// Check if the board has insufficient material for checkmate:
/// K v K, K+minor v K, and K+B v K+B with both bishops on one square colour.
pub fn has_insufficient_material(board: &Board) -> bool {
    let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy != EMPTY {
        return false;
    }

    let count = |piece: Piece, color: Color| -> u32 {
        (*board.pieces(piece) & *board.color_combined(color)).popcnt()
    };
    let white_minors = count(Piece::Knight, Color::White) + count(Piece::Bishop, Color::White);
    let black_minors = count(Piece::Knight, Color::Black) + count(Piece::Bishop, Color::Black);

    match (white_minors, black_minors) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (1, 1) => {
            let bishops = *board.pieces(Piece::Bishop);
            bishops.popcnt() == 2 && same_square_colour(bishops)
        }
        _ => false,
    }
}

fn same_square_colour(squares: BitBoard) -> bool {
    let mut shades = squares.map(|sq| (sq.get_rank().to_index() + sq.get_file().to_index()) % 2);
    match shades.next() {
        Some(first) => shades.all(|shade| shade == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn detects_insufficient_material() {
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/4K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("4kn2/8/8/8/8/8/8/4K3 w - - 0 1")));
        // Bishops on c1 and f8 are both on dark squares.
        assert!(has_insufficient_material(&board("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1")));

        assert!(!has_insufficient_material(&board("4kb2/8/8/8/8/8/8/3BK3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/8/1NB1K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1")));
        assert!(!has_insufficient_material(&Board::default()));
    }

    #[test]
    fn status_strings_and_banners() {
        let mate = board("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
        let status = get_game_status(&mate, 0, 1);
        assert_eq!(status, GameStatus::Checkmate { winner: Color::White });
        assert_eq!(status.as_str(), "white_wins");
        assert_eq!(status.banner(), Some("Checkmate!"));

        let stalemate = board("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(get_game_status(&stalemate, 0, 1).banner(), Some("Draw!"));

        let start = Board::default();
        assert_eq!(get_game_status(&start, 0, 1).as_str(), "white_turn");
        assert_eq!(get_game_status(&start, 100, 1), GameStatus::FiftyMoveRule);
        assert_eq!(get_game_status(&start, 0, 3), GameStatus::ThreefoldRepetition);
        assert_eq!(get_game_status(&start, 0, 1).banner(), None);
    }

    #[test]
    fn colour_names() {
        assert_eq!(color_label(Color::Black), "Black");
        assert_eq!(color_to_string(Color::White), "white");
    }
}
