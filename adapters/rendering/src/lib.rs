#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Grid Snake adapters.
//!
//! Backends never see the world. They receive a [`Presentation`] projected
//! from a [`GameSnapshot`] and must not feed anything back into the session.

use std::time::Duration;

use anyhow::Result as AnyResult;
use grid_snake_core::{
    Direction, FoodKind, GameSnapshot, LevelInfo, LevelNumber, Phase, Position,
};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Creates an opaque color from a `0xRRGGBB` literal.
    #[must_use]
    pub const fn from_hex(rgb: u32) -> Self {
        Self::from_rgb_u8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Converts the color channels back to bytes, ignoring alpha.
    #[must_use]
    pub fn to_rgb_u8(self) -> (u8, u8, u8) {
        (
            channel_to_u8(self.red),
            channel_to_u8(self.green),
            channel_to_u8(self.blue),
        )
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel_to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

const BODY_PALETTE: [u32; 7] = [
    0x27ae60, 0x3498db, 0x9b59b6, 0xe67e22, 0xe74c3c, 0x1abc9c, 0xf1c40f,
];
const HEAD_PALETTE: [u32; 7] = [
    0x2ecc71, 0x5dade2, 0xaf7ac5, 0xf39c12, 0xff6b6b, 0x48c9b0, 0xf4d03f,
];

/// Background used to clear each frame.
pub const CLEAR_COLOR: Color = Color::from_hex(0x1b2631);

/// Snake colours selected by the theme index of a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    /// Colour of body segments.
    pub body: Color,
    /// Colour of the head segment.
    pub head: Color,
}

impl Theme {
    /// Looks up the palette entry for `index`, cycling through the palette.
    #[must_use]
    pub fn for_index(index: u32) -> Self {
        let slot = usize::try_from(index).unwrap_or(0) % BODY_PALETTE.len();
        Self {
            body: Color::from_hex(BODY_PALETTE[slot]),
            head: Color::from_hex(HEAD_PALETTE[slot]),
        }
    }

    /// Number of entries in the palette.
    #[must_use]
    pub const fn palette_len() -> usize {
        BODY_PALETTE.len()
    }
}

/// Content of a single grid cell as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellVisual {
    /// Nothing occupies the cell.
    Empty,
    /// Head of the snake, facing the committed direction.
    SnakeHead(Direction),
    /// Any non-head snake segment.
    SnakeBody,
    /// Food of the given kind.
    Food(FoodKind),
    /// Static obstacle.
    Obstacle,
    /// Portal endpoint; both endpoints of a pair share the index.
    Portal(usize),
}

/// Dense cell grid projected from a snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Side length of the grid.
    pub grid_size: u32,
    /// Cells in row-major order.
    pub cells: Vec<CellVisual>,
    /// Snake colours for the current theme.
    pub theme: Theme,
}

impl Scene {
    /// Projects a snapshot onto a dense cell grid.
    ///
    /// Later layers win: portals, obstacles, food, body, head.
    #[must_use]
    pub fn project(snapshot: &GameSnapshot) -> Self {
        let side = usize::try_from(snapshot.grid_size).unwrap_or(0);
        let mut scene = Self {
            grid_size: snapshot.grid_size,
            cells: vec![CellVisual::Empty; side.saturating_mul(side)],
            theme: Theme::for_index(snapshot.theme_index),
        };

        for (index, portal) in snapshot.portals.iter().enumerate() {
            scene.paint(portal.a, CellVisual::Portal(index));
            scene.paint(portal.b, CellVisual::Portal(index));
        }
        for obstacle in &snapshot.obstacles {
            scene.paint(*obstacle, CellVisual::Obstacle);
        }
        if let Some(food) = snapshot.food {
            scene.paint(food.cell, CellVisual::Food(food.kind));
        }
        for segment in snapshot.snake.iter().skip(1) {
            scene.paint(*segment, CellVisual::SnakeBody);
        }
        if let Some(head) = snapshot.head() {
            scene.paint(head, CellVisual::SnakeHead(snapshot.direction));
        }

        scene
    }

    /// Cell at `position`, or `None` outside the grid.
    #[must_use]
    pub fn cell(&self, position: Position) -> Option<CellVisual> {
        self.index_of(position)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Iterates the grid row by row.
    pub fn rows(&self) -> impl Iterator<Item = &[CellVisual]> {
        let side = usize::try_from(self.grid_size).unwrap_or(0).max(1);
        self.cells.chunks(side)
    }

    fn paint(&mut self, position: Position, visual: CellVisual) {
        if let Some(cell) = self
            .index_of(position)
            .and_then(|index| self.cells.get_mut(index))
        {
            *cell = visual;
        }
    }

    fn index_of(&self, position: Position) -> Option<usize> {
        let side = usize::try_from(self.grid_size).ok()?;
        let row = usize::try_from(position.row).ok()?;
        let col = usize::try_from(position.col).ok()?;
        (row < side && col < side).then_some(row * side + col)
    }
}

/// Status values shown next to the grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hud {
    /// Running score.
    pub score: u32,
    /// Best score recorded for the level.
    pub high_score: u32,
    /// Active level metadata.
    pub level: LevelInfo,
    /// Levels the player may switch to.
    pub unlocked_levels: Vec<LevelNumber>,
    /// Time left on a time-boxed level.
    pub remaining_time: Option<Duration>,
    /// Lifecycle phase driving the pause, game over and celebration overlays.
    pub phase: Phase,
    /// Live duration between ticks.
    pub tick_interval: Duration,
}

impl Hud {
    /// Extracts the HUD values from a snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        Self {
            score: snapshot.score,
            high_score: snapshot.high_score,
            level: snapshot.level.clone(),
            unlocked_levels: snapshot.unlocked_levels.clone(),
            remaining_time: snapshot.remaining_time,
            phase: snapshot.phase,
            tick_interval: snapshot.tick_interval,
        }
    }

    /// Banner shown over the grid for the current phase, if any.
    #[must_use]
    pub fn overlay(&self) -> Option<&'static str> {
        match self.phase {
            Phase::Ready => Some("Press start"),
            Phase::Playing => None,
            Phase::Paused => Some("Paused"),
            Phase::Celebrating => Some("Level complete!"),
            Phase::GameOver => Some("Game over"),
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title of the frame.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
    /// Status values shown next to the scene.
    pub hud: Hud,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene, hud: Hud) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
            hud,
        }
    }

    /// Projects a snapshot into a presentation titled after the level.
    #[must_use]
    pub fn from_snapshot(snapshot: &GameSnapshot) -> Self {
        Self::new(
            format!(
                "Grid Snake - Level {}: {}",
                snapshot.level.number, snapshot.level.name
            ),
            CLEAR_COLOR,
            Scene::project(snapshot),
            Hud::from_snapshot(snapshot),
        )
    }
}

/// Rendering backend capable of presenting Grid Snake frames.
pub trait RenderingBackend {
    /// Presents one frame. Called once per tick and after state-affecting input.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

impl<B: RenderingBackend + ?Sized> RenderingBackend for &mut B {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        (**self).present(presentation)
    }
}

/// Backend that discards every frame.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

impl RenderingBackend for NullBackend {
    fn present(&mut self, _presentation: &Presentation) -> AnyResult<()> {
        Ok(())
    }
}

/// Backend that keeps every presented frame, for inspection.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    frames: Vec<Presentation>,
}

impl RecordingBackend {
    /// Frames presented so far, oldest first.
    #[must_use]
    pub fn frames(&self) -> &[Presentation] {
        &self.frames
    }

    /// Most recent frame.
    #[must_use]
    pub fn last(&self) -> Option<&Presentation> {
        self.frames.last()
    }
}

impl RenderingBackend for RecordingBackend {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        self.frames.push(presentation.clone());
        Ok(())
    }
}
