//! Move notation: SAN for the move list and PGN import, UCI for the engine,
//! and plain from-to pairs for the backend's move context.

use chess::{Board, BoardStatus, ChessMove, File, MoveGen, Piece, Rank, Square};
use std::str::FromStr;

use crate::error::GameError;

pub fn parse_square(text: &str) -> Result<Square, GameError> {
    Square::from_str(&text.trim().to_lowercase())
        .map_err(|_| GameError::InvalidSquare(text.to_string()))
}

pub fn parse_promotion(text: &str) -> Result<Piece, GameError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "q" | "queen" => Ok(Piece::Queen),
        "r" | "rook" => Ok(Piece::Rook),
        "b" | "bishop" => Ok(Piece::Bishop),
        "n" | "knight" => Ok(Piece::Knight),
        _ => Err(GameError::InvalidNotation(format!("promotion '{}'", text))),
    }
}

/// Resolve a drag-and-drop style move. Promotions default to a queen when
/// no piece is requested; the requested piece is ignored for other moves.
pub fn move_from_squares(
    board: &Board,
    from: Square,
    to: Square,
    promotion: Option<Piece>,
) -> Result<ChessMove, GameError> {
    let mut candidates =
        MoveGen::new_legal(board).filter(|m| m.get_source() == from && m.get_dest() == to);

    let first = candidates.next().ok_or_else(|| GameError::IllegalMove {
        mv: format!("{}{}", from, to),
        fen: board.to_string(),
    })?;

    if first.get_promotion().is_none() {
        return Ok(first);
    }

    let wanted = promotion.unwrap_or(Piece::Queen);
    Ok(ChessMove::new(from, to, Some(wanted)))
}

/// Parse an engine move such as `e2e4` or `e7e8q` and check it is legal.
pub fn parse_uci(board: &Board, text: &str) -> Result<ChessMove, GameError> {
    let text = text.trim();
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(GameError::InvalidNotation(text.to_string()));
    }

    let from = parse_square(&text[0..2])?;
    let to = parse_square(&text[2..4])?;
    let promotion = match text.get(4..5) {
        Some(p) => Some(parse_promotion(p)?),
        None => None,
    };

    let mv = ChessMove::new(from, to, promotion);
    if board.legal(mv) {
        Ok(mv)
    } else {
        Err(GameError::IllegalMove {
            mv: text.to_string(),
            fen: board.to_string(),
        })
    }
}

pub fn to_uci(mv: ChessMove) -> String {
    match mv.get_promotion() {
        Some(piece) => format!(
            "{}{}{}",
            mv.get_source(),
            mv.get_dest(),
            piece_letter(piece).to_ascii_lowercase()
        ),
        None => from_to(mv),
    }
}

/// Source and destination squares only, as sent in `previous_moves`.
pub fn from_to(mv: ChessMove) -> String {
    format!("{}{}", mv.get_source(), mv.get_dest())
}

/// Format a legal move in Standard Algebraic Notation, including the
/// check or mate suffix.
pub fn to_san(board: &Board, mv: ChessMove) -> String {
    let from = mv.get_source();
    let to = mv.get_dest();
    let piece = board.piece_on(from).unwrap_or(Piece::Pawn);

    let mut san = String::new();
    if is_castle(board, mv) {
        san.push_str(if to.get_file().to_index() > from.get_file().to_index() {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        let capture = board.piece_on(to).is_some()
            || (piece == Piece::Pawn && from.get_file() != to.get_file());

        if piece == Piece::Pawn {
            if capture {
                san.push(file_char(from.get_file()));
            }
        } else {
            san.push(piece_letter(piece));
            san.push_str(&disambiguation(board, mv, piece));
        }

        if capture {
            san.push('x');
        }
        san.push_str(&to.to_string());

        if let Some(promoted) = mv.get_promotion() {
            san.push('=');
            san.push(piece_letter(promoted));
        }
    }

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if after.checkers().popcnt() > 0 {
        san.push('+');
    }
    san
}

/// Parse a SAN token from a PGN or a user. Check/mate marks, annotation
/// glyphs, an `e.p.` glued to the move (`exd6e.p.`) and zero-castling
/// (`0-0`) are tolerated, as is over-specified disambiguation such as
/// `Ng1f3`. A standalone `e.p.` token is dropped by the PGN reader.
pub fn parse_san(board: &Board, text: &str) -> Result<ChessMove, GameError> {
    let trimmed = text
        .trim()
        .trim_end_matches("e.p.")
        .trim_end_matches(['+', '#', '!', '?']);

    let castle = trimmed.replace('0', "O");
    if castle == "O-O" || castle == "O-O-O" {
        let kingside = castle == "O-O";
        return single_match(board, text, |m| {
            is_castle(board, m)
                && (m.get_dest().get_file().to_index() > m.get_source().get_file().to_index())
                    == kingside
        });
    }

    let (body, promotion) = split_promotion(trimmed)?;

    let mut chars: Vec<char> = body.chars().filter(|c| !matches!(c, 'x' | ':' | '-')).collect();
    let piece = match chars.first().copied().and_then(piece_from_letter) {
        Some(piece) => {
            chars.remove(0);
            piece
        }
        None => Piece::Pawn,
    };

    if chars.len() < 2 {
        return Err(GameError::InvalidNotation(text.to_string()));
    }
    let dest_text: String = chars[chars.len() - 2..].iter().collect();
    let to = parse_square(&dest_text).map_err(|_| GameError::InvalidNotation(text.to_string()))?;

    let mut from_file = None;
    let mut from_rank = None;
    for c in &chars[..chars.len() - 2] {
        match c {
            'a'..='h' => from_file = Some(File::from_index(*c as usize - 'a' as usize)),
            '1'..='8' => from_rank = Some(Rank::from_index(*c as usize - '1' as usize)),
            _ => return Err(GameError::InvalidNotation(text.to_string())),
        }
    }

    single_match(board, text, |m| {
        m.get_dest() == to
            && board.piece_on(m.get_source()) == Some(piece)
            && m.get_promotion() == promotion
            && from_file.map_or(true, |f| m.get_source().get_file() == f)
            && from_rank.map_or(true, |r| m.get_source().get_rank() == r)
    })
}

fn split_promotion(text: &str) -> Result<(&str, Option<Piece>), GameError> {
    if let Some((body, piece)) = text.split_once('=') {
        return Ok((body, Some(parse_promotion(piece)?)));
    }

    // `e8Q` without the equals sign.
    let mut chars = text.chars();
    match (chars.next_back(), chars.next_back()) {
        (Some(last), Some('1' | '8')) if matches!(last, 'Q' | 'R' | 'B' | 'N') => {
            let body = &text[..text.len() - 1];
            Ok((body, piece_from_letter(last)))
        }
        _ => Ok((text, None)),
    }
}

fn single_match<F>(board: &Board, text: &str, predicate: F) -> Result<ChessMove, GameError>
where
    F: Fn(ChessMove) -> bool,
{
    let mut matches = MoveGen::new_legal(board).filter(|m| predicate(*m));
    match (matches.next(), matches.next()) {
        (Some(mv), None) => Ok(mv),
        (None, _) => Err(GameError::IllegalMove {
            mv: text.to_string(),
            fen: board.to_string(),
        }),
        (Some(_), Some(_)) => Err(GameError::AmbiguousMove {
            mv: text.to_string(),
            fen: board.to_string(),
        }),
    }
}

fn is_castle(board: &Board, mv: ChessMove) -> bool {
    board.piece_on(mv.get_source()) == Some(Piece::King)
        && mv.get_source().get_file().to_index().abs_diff(mv.get_dest().get_file().to_index()) == 2
}

fn disambiguation(board: &Board, mv: ChessMove, piece: Piece) -> String {
    let from = mv.get_source();
    let rivals: Vec<Square> = MoveGen::new_legal(board)
        .filter(|m| {
            m.get_dest() == mv.get_dest()
                && m.get_source() != from
                && board.piece_on(m.get_source()) == Some(piece)
        })
        .map(|m| m.get_source())
        .collect();

    if rivals.is_empty() {
        String::new()
    } else if rivals.iter().all(|sq| sq.get_file() != from.get_file()) {
        file_char(from.get_file()).to_string()
    } else if rivals.iter().all(|sq| sq.get_rank() != from.get_rank()) {
        rank_char(from.get_rank()).to_string()
    } else {
        from.to_string()
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn piece_from_letter(c: char) -> Option<Piece> {
    match c {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn file_char(file: File) -> char {
    (b'a' + file.to_index() as u8) as char
}

fn rank_char(rank: Rank) -> char {
    (b'1' + rank.to_index() as u8) as char
}
