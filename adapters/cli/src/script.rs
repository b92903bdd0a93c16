use anyhow::{bail, Result};
use grid_snake_core::Direction;

/// Parses a move script such as `RRDD.LU`.
///
/// Letters steer (`U`, `D`, `L`, `R`, any case); `.` keeps the current course
/// for one tick. Whitespace is ignored.
pub(crate) fn parse(script: &str) -> Result<Vec<Option<Direction>>> {
    let mut moves = Vec::with_capacity(script.len());
    for (index, symbol) in script.chars().enumerate() {
        let step = match symbol.to_ascii_uppercase() {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            '.' => None,
            other if other.is_whitespace() => continue,
            other => bail!("unknown move `{other}` at position {index}"),
        };
        moves.push(step);
    }
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_dots_become_steps() {
        let moves = parse("rD. l\nU").expect("valid script");
        assert_eq!(
            moves,
            vec![
                Some(Direction::Right),
                Some(Direction::Down),
                None,
                Some(Direction::Left),
                Some(Direction::Up),
            ]
        );
    }

    #[test]
    fn unknown_symbols_are_rejected() {
        let error = parse("RRX").expect_err("X is not a move");
        assert_eq!(error.to_string(), "unknown move `X` at position 2");
    }
}
