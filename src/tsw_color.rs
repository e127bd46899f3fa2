use ratatui::style::Color;
use serde::Deserialize;
use term_color_support::ColorSupport;

/// An RGB triple as written in the settings file, e.g. `mine = [255, 0, 0]`
pub type Rgb = [u8; 3];

/// Colors the terminal can actually show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Ansi256,
    Basic,
}

impl Depth {
    /// Detect what stdout supports
    pub fn detect() -> Depth {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Ansi256
        } else {
            Depth::Basic
        }
    }
}

// Windows Terminal "Campbell" values for the 16 ANSI colors, used to pick
// the closest basic color when only 16 are available.
const BASIC: [(Rgb, Color); 16] = [
    ([12, 12, 12], Color::Black),
    ([197, 15, 31], Color::Red),
    ([19, 161, 14], Color::Green),
    ([193, 156, 0], Color::Yellow),
    ([0, 55, 218], Color::Blue),
    ([136, 23, 152], Color::Magenta),
    ([58, 150, 221], Color::Cyan),
    ([204, 204, 204], Color::Gray),
    ([118, 118, 118], Color::DarkGray),
    ([231, 72, 86], Color::LightRed),
    ([22, 198, 12], Color::LightGreen),
    ([249, 241, 165], Color::LightYellow),
    ([59, 120, 255], Color::LightBlue),
    ([180, 0, 158], Color::LightMagenta),
    ([97, 214, 214], Color::LightCyan),
    ([242, 242, 242], Color::White),
];

// Channel levels of the xterm 6x6x6 color cube (indices 16..=231)
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn distance(a: Rgb, b: Rgb) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as i32 - y as i32;
            (d * d) as u32
        })
        .sum()
}

fn nearest_level(v: u8) -> usize {
    (0..CUBE_LEVELS.len())
        .min_by_key(|&i| (CUBE_LEVELS[i] as i32 - v as i32).abs())
        .unwrap_or(0)
}

fn nearest_indexed(rgb: Rgb) -> u8 {
    let (r, g, b) = (nearest_level(rgb[0]), nearest_level(rgb[1]), nearest_level(rgb[2]));
    let cube = [CUBE_LEVELS[r], CUBE_LEVELS[g], CUBE_LEVELS[b]];
    let cube_index = 16 + 36 * r + 6 * g + b;

    // Grayscale ramp 232..=255 runs 8, 18, .., 238
    let avg = (rgb[0] as u32 + rgb[1] as u32 + rgb[2] as u32) / 3;
    let step = (avg.saturating_sub(3) / 10).min(23) as u8;
    let level = 8 + 10 * step;
    let gray = [level, level, level];

    if distance(rgb, gray) < distance(rgb, cube) {
        232 + step
    } else {
        cube_index as u8
    }
}

fn nearest_basic(rgb: Rgb) -> Color {
    BASIC
        .iter()
        .min_by_key(|(sample, _)| distance(rgb, *sample))
        .map(|(_, c)| *c)
        .unwrap_or(Color::Reset)
}

/// Fit an RGB value to what a terminal of the given depth can display
pub fn fit(rgb: Rgb, depth: Depth) -> Color {
    match depth {
        Depth::TrueColor => Color::Rgb(rgb[0], rgb[1], rgb[2]),
        Depth::Ansi256 => Color::Indexed(nearest_indexed(rgb)),
        Depth::Basic => nearest_basic(rgb),
    }
}

/// Palette as configured, in RGB
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    pub background: Rgb,
    pub hidden: Rgb,    // Interior of an unrevealed cell
    pub revealed: Rgb,  // Interior of a revealed safe cell
    pub mine: Rgb,
    pub text: Rgb,      // Borders and labels
    pub highlight: Rgb, // Game-over message
}

impl Default for PaletteConfig {
    fn default() -> Self {
        PaletteConfig {
            background: [0, 0, 0],
            hidden: [0, 0, 0],
            revealed: [0, 0, 0],
            mine: [255, 0, 0],
            text: [255, 255, 255],
            highlight: [137, 207, 240],
        }
    }
}

/// Palette resolved for the running terminal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color,
    pub hidden: Color,
    pub revealed: Color,
    pub mine: Color,
    pub text: Color,
    pub highlight: Color,
}

impl Palette {
    pub fn resolve(cfg: &PaletteConfig, depth: Depth) -> Palette {
        Palette {
            background: fit(cfg.background, depth),
            hidden: fit(cfg.hidden, depth),
            revealed: fit(cfg.revealed, depth),
            mine: fit(cfg.mine, depth),
            text: fit(cfg.text, depth),
            highlight: fit(cfg.highlight, depth),
        }
    }
}
