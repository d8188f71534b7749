//! ASCII battlefield renderer.
//!
//! Samples the solidity mask onto a character grid for quick terminal
//! review of a duel: terrain, tanks, the last shell's trail and a legend.

use std::fmt::Write as _;

use scorch_core::combatants::ColorSlot;
use scorch_core::prelude::*;

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Width of the viewport in characters.
    pub width: usize,
    /// Height of the viewport in characters.
    pub height: usize,
    /// Show the combatant legend.
    pub show_legend: bool,
    /// Draw the last shell's trail.
    pub show_trail: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 30,
            show_legend: true,
            show_trail: true,
            use_color: true,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const GRAY: &str = "\x1b[90m";
    pub const DIM: &str = "\x1b[2m";

    /// Team colors by palette slot.
    pub const TEAM: [&str; 4] = ["\x1b[34m", "\x1b[31m", "\x1b[32m", "\x1b[33m"];
}

const GROUND: char = '#';
const SKY: char = ' ';
const TRAIL: char = '.';
const WRECK: char = 'x';

fn team_color(slot: ColorSlot) -> &'static str {
    colors::TEAM[slot.0 as usize % colors::TEAM.len()]
}

/// Marker for a tank: its palette slot as a digit, or a wreck.
fn combatant_char(combatant: &Combatant) -> char {
    if combatant.alive {
        char::from_digit(u32::from(combatant.color.0) + 1, 10).unwrap_or('?')
    } else {
        WRECK
    }
}

/// Character grid plus per-cell color.
struct Canvas {
    cells: Vec<Vec<(char, &'static str)>>,
    scale_x: f64,
    scale_y: f64,
}

impl Canvas {
    fn new(field: &TerrainField, width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let scale_x = f64::from(field.width()) / width as f64;
        let scale_y = f64::from(field.height()) / height as f64;

        let cells = (0..height)
            .map(|row| {
                let y = ((row as f64 + 0.5) * scale_y) as i64;
                (0..width)
                    .map(|col| {
                        let x = ((col as f64 + 0.5) * scale_x) as i64;
                        if field.is_solid(x, y) {
                            (GROUND, colors::GRAY)
                        } else {
                            (SKY, "")
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            cells,
            scale_x,
            scale_y,
        }
    }

    /// Cell under a field point, if it is on screen.
    fn cell(&self, point: Point) -> Option<(usize, usize)> {
        let col = (point.x / self.scale_x).floor();
        let row = (point.y / self.scale_y).floor();
        let rows = self.cells.len() as f64;
        let cols = self.cells.first().map_or(0, Vec::len) as f64;
        if col < 0.0 || row < 0.0 || col >= cols || row >= rows {
            return None;
        }
        Some((row as usize, col as usize))
    }

    fn plot(&mut self, point: Point, ch: char, color: &'static str) {
        if let Some((row, col)) = self.cell(point) {
            self.cells[row][col] = (ch, color);
        }
    }
}

/// Render a duel as ASCII art.
#[must_use]
pub fn render_ascii(duel: &Duel, config: &AsciiConfig) -> String {
    let field = duel.terrain();
    let mut canvas = Canvas::new(field, config.width, config.height);

    if config.show_trail {
        for &point in duel.trail() {
            canvas.plot(point, TRAIL, colors::DIM);
        }
    }
    // Tanks sit on the surface; draw them one row up so the ground stays visible.
    for combatant in duel.combatants() {
        let above = Point::new(combatant.position.x, combatant.position.y - canvas.scale_y);
        canvas.plot(above, combatant_char(combatant), team_color(combatant.color));
    }

    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };
    let width = canvas.cells.first().map_or(0, Vec::len);
    let mut output = String::new();

    let turn = duel.turn();
    let active = duel
        .active()
        .and_then(|id| duel.combatant(id))
        .map_or_else(|| "-".to_string(), |c| c.name.clone());
    let _ = writeln!(
        output,
        "{bold}Seed {} | {}x{} | Turn {} | {:?} | Active: {}{reset}",
        duel.seed(),
        field.width(),
        field.height(),
        turn.turn,
        turn.phase,
        active,
    );

    let border = "-".repeat(width);
    let _ = writeln!(output, "+{border}+");
    for row in &canvas.cells {
        output.push('|');
        for &(ch, color) in row {
            if config.use_color && !color.is_empty() {
                output.push_str(color);
                output.push(ch);
                output.push_str(colors::RESET);
            } else {
                output.push(ch);
            }
        }
        output.push_str("|\n");
    }
    let _ = writeln!(output, "+{border}+");

    if config.show_legend {
        for c in duel.combatants() {
            let color = if config.use_color { team_color(c.color) } else { "" };
            let _ = writeln!(
                output,
                " {color}{}{reset} {:<12} {:<6} angle {:>5.1} power {:>5.1} kills {} {}",
                combatant_char(c),
                c.name,
                c.color.color().name,
                c.angle,
                c.power,
                c.kills,
                if c.alive { "" } else { "(eliminated)" },
            );
        }
        if duel.is_over() {
            let name = duel
                .survivor()
                .and_then(|id| duel.combatant(id))
                .map_or("nobody", |c| c.name.as_str());
            let _ = writeln!(output, " {bold}Match over: {name} wins{reset}");
        }
    }

    output
}
