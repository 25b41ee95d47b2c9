//! Square name conversions (`e4` <-> `28`).

use crate::errors::{ChessError, ChessResult};
use crate::game_state::chess_types::{file_of, rank_of, square_at, Square};

/// Convert a square name (for example: "e4") to a square index.
#[inline]
pub fn algebraic_to_square(square: &str) -> ChessResult<Square> {
    let bytes = square.as_bytes();
    if bytes.len() != 2 {
        return Err(ChessError::InvalidSquare(square.to_owned()));
    }

    let file = bytes[0];
    let rank = bytes[1];
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) {
        return Err(ChessError::InvalidSquare(square.to_owned()));
    }

    Ok(square_at(file - b'a', rank - b'1'))
}

/// Convert a square index (`0..=63`) to its name.
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    debug_assert!(square < 64, "square index out of bounds: {square}");
    let file_char = char::from(b'a' + file_of(square));
    let rank_char = char::from(b'1' + rank_of(square));
    format!("{file_char}{rank_char}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_and_centre_squares() {
        assert_eq!(algebraic_to_square("a1").expect("a1 should parse"), 0);
        assert_eq!(algebraic_to_square("h8").expect("h8 should parse"), 63);
        assert_eq!(algebraic_to_square("e4").expect("e4 should parse"), 28);
        assert_eq!(square_to_algebraic(0), "a1");
        assert_eq!(square_to_algebraic(63), "h8");
        assert_eq!(square_to_algebraic(44), "e6");
    }

    #[test]
    fn rejects_off_board_names() {
        for bad in ["e9", "i1", "e", "e44", ""] {
            assert!(
                matches!(algebraic_to_square(bad), Err(ChessError::InvalidSquare(_))),
                "{bad}"
            );
        }
    }
}
