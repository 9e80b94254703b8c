//! Character-level conversions between cozy-chess coordinates and text.

use cozy_chess::{File, Piece, Rank, Square};

pub fn file_to_char(file: File) -> char {
    (b'a' + file as u8) as char
}

pub fn rank_to_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

pub fn file_from_char(c: char) -> Option<File> {
    match c {
        'a'..='h' => Some(File::index(c as usize - 'a' as usize)),
        _ => None,
    }
}

pub fn rank_from_char(c: char) -> Option<Rank> {
    match c {
        '1'..='8' => Some(Rank::index(c as usize - '1' as usize)),
        _ => None,
    }
}

/// Format a square as lowercase algebraic text, e.g. `e4`.
pub fn format_square(sq: Square) -> String {
    let mut s = String::with_capacity(2);
    s.push(file_to_char(sq.file()));
    s.push(rank_to_char(sq.rank()));
    s
}

/// Parse algebraic text such as `e4` into a square.
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = file_from_char(chars.next()?)?;
    let rank = rank_from_char(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

/// Lowercase piece letter as used in UCI promotions.
pub fn format_piece(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_text() {
        let sq = Square::new(File::E, Rank::Fourth);
        assert_eq!(format_square(sq), "e4");
        assert_eq!(parse_square("e4"), Some(sq));
        assert_eq!(parse_square("h8"), Some(Square::new(File::H, Rank::Eighth)));
    }

    #[test]
    fn test_parse_square_rejects_garbage() {
        assert_eq!(parse_square("i1"), None);
        assert_eq!(parse_square("a9"), None);
        assert_eq!(parse_square("a1x"), None);
        assert_eq!(parse_square(""), None);
    }
}
