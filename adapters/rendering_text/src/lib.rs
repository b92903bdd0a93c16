#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Plain-text rendering adapter for Grid Snake.
//!
//! Each frame is written as a bordered character grid followed by a status
//! line. Optional ANSI truecolor escapes paint the snake in the active theme.

use std::{fmt::Write as _, io::Write};

use anyhow::{Context, Result};
use grid_snake_core::{Direction, FoodKind, Phase};
use grid_snake_rendering::{CellVisual, Color, Presentation, RenderingBackend};

/// Writes presentations as text frames to any [`Write`] sink.
#[derive(Debug)]
pub struct TextBackend<W> {
    writer: W,
    colored: bool,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing monochrome frames.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            colored: false,
        }
    }

    /// Enables or disables ANSI colour escapes.
    #[must_use]
    pub const fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> Result<()> {
        let frame = render_to_string(presentation, self.colored);
        self.writer
            .write_all(frame.as_bytes())
            .context("failed to write text frame")?;
        self.writer.flush().context("failed to flush text frame")
    }
}

/// Renders a presentation into a multi-line string.
#[must_use]
pub fn render_to_string(presentation: &Presentation, colored: bool) -> String {
    let scene = &presentation.scene;
    let hud = &presentation.hud;
    let width = usize::try_from(scene.grid_size).unwrap_or(0);
    let border = format!("+{}+", "-".repeat(width));

    let body_color = if hud.phase == Phase::Paused {
        scene.theme.body.lighten(0.4)
    } else {
        scene.theme.body
    };

    let mut frame = String::new();
    let _ = writeln!(frame, "{}", presentation.window_title);
    let _ = writeln!(frame, "{border}");
    for row in scene.rows() {
        frame.push('|');
        for cell in row {
            let glyph = glyph(*cell);
            let paint = match cell {
                CellVisual::SnakeHead(_) => Some(scene.theme.head),
                CellVisual::SnakeBody => Some(body_color),
                _ => None,
            };
            match paint {
                Some(color) if colored => push_colored(&mut frame, glyph, color),
                _ => frame.push(glyph),
            }
        }
        frame.push_str("|\n");
    }
    let _ = writeln!(frame, "{border}");

    let _ = write!(
        frame,
        "Score {}  Best {}  Speed {}ms",
        hud.score,
        hud.high_score,
        hud.tick_interval.as_millis()
    );
    if let Some(remaining) = hud.remaining_time {
        let _ = write!(frame, "  Time {}s", remaining.as_secs());
    }
    let unlocked: Vec<String> = hud
        .unlocked_levels
        .iter()
        .map(ToString::to_string)
        .collect();
    let _ = writeln!(frame, "  Levels [{}]", unlocked.join(","));
    if let Some(overlay) = hud.overlay() {
        let _ = writeln!(frame, "[{overlay}]");
    }
    frame
}

/// Character used for a cell.
#[must_use]
pub fn glyph(cell: CellVisual) -> char {
    match cell {
        CellVisual::Empty => '.',
        CellVisual::SnakeHead(Direction::Up) => '^',
        CellVisual::SnakeHead(Direction::Down) => 'v',
        CellVisual::SnakeHead(Direction::Left) => '<',
        CellVisual::SnakeHead(Direction::Right) => '>',
        CellVisual::SnakeBody => 'o',
        CellVisual::Food(FoodKind::Normal) => '*',
        CellVisual::Food(FoodKind::Big) => 'O',
        CellVisual::Food(FoodKind::Slow) => 's',
        CellVisual::Obstacle => '#',
        CellVisual::Portal(index) => {
            char::from_digit(u32::try_from(index % 10).unwrap_or(0), 10).unwrap_or('@')
        }
    }
}

fn push_colored(frame: &mut String, glyph: char, color: Color) {
    let (red, green, blue) = color.to_rgb_u8();
    let _ = write!(frame, "\x1b[38;2;{red};{green};{blue}m{glyph}\x1b[0m");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use grid_snake_core::{BoundaryMode, Food, GameSnapshot, LevelInfo, Portal, Position};

    use super::*;

    fn snapshot(phase: Phase) -> GameSnapshot {
        GameSnapshot {
            grid_size: 3,
            boundary_mode: BoundaryMode::Die,
            snake: vec![Position::new(0, 1), Position::new(0, 0)],
            direction: Direction::Right,
            food: Some(Food {
                cell: Position::new(2, 2),
                kind: FoodKind::Slow,
            }),
            obstacles: vec![Position::new(1, 1)],
            portals: vec![Portal::new(Position::new(2, 0), Position::new(1, 2))],
            score: 20,
            high_score: 50,
            tick_interval: Duration::from_millis(150),
            phase,
            level: LevelInfo {
                number: 1,
                name: "Classic".to_owned(),
                description: String::new(),
            },
            unlocked_levels: vec![1, 2],
            level_completed: false,
            theme_index: 0,
            remaining_time: Some(Duration::from_secs(42)),
            tick: 3,
        }
    }

    #[test]
    fn frame_draws_grid_and_status() {
        let presentation = Presentation::from_snapshot(&snapshot(Phase::Playing));
        let frame = render_to_string(&presentation, false);

        assert_eq!(
            frame,
            "Grid Snake - Level 1: Classic\n\
             +---+\n\
             |o>.|\n\
             |.#0|\n\
             |0.s|\n\
             +---+\n\
             Score 20  Best 50  Speed 150ms  Time 42s  Levels [1,2]\n"
        );
    }

    #[test]
    fn overlays_follow_the_phase() {
        let paused = render_to_string(&Presentation::from_snapshot(&snapshot(Phase::Paused)), false);
        assert!(paused.ends_with("[Paused]\n"));

        let over = render_to_string(
            &Presentation::from_snapshot(&snapshot(Phase::GameOver)),
            false,
        );
        assert!(over.ends_with("[Game over]\n"));
    }

    #[test]
    fn colored_frames_paint_the_snake() {
        let presentation = Presentation::from_snapshot(&snapshot(Phase::Playing));
        let frame = render_to_string(&presentation, true);
        assert!(frame.contains("\x1b[38;2;46;204;113m>\x1b[0m"));
    }

    #[test]
    fn backend_writes_frames_to_the_sink() {
        let mut backend = TextBackend::new(Vec::new());
        let presentation = Presentation::from_snapshot(&snapshot(Phase::Ready));
        backend.present(&presentation).expect("writing to memory succeeds");

        let written = String::from_utf8(backend.into_inner()).expect("utf-8 output");
        assert!(written.starts_with("Grid Snake - Level 1: Classic\n"));
        assert!(written.ends_with("[Press start]\n"));
    }
}
