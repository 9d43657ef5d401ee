#![forbid(unsafe_code)]

//! Crossterm surface: an indicator row above a boxed BBS screen.
//!
//! `set_on` and `render` only record state. [`TerminalSurface::present`]
//! queues the commands for whatever changed since the last call and flushes
//! once, so everything due at the same instant reaches the terminal as one
//! write.
//!
//! ```text
//!  ● POWER   ● DRIVE8   ○ DRIVE9   ○ TAPE
//!
//! ┌──────────────────────────────────┐
//! │ ================================ │
//! │    M E T A V E R S O  B B S      │
//! │ Seleccion: █                     │
//! └──────────────────────────────────┘
//! ```

use std::io::{self, Write};

use blinken_core::{Indicator, IndicatorId, Surface};
use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::queue;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Text columns inside the box, excluding the one-column padding each side.
pub const SCREEN_COLUMNS: u16 = 32;

const LAMP_ON: &str = "●";
const LAMP_OFF: &str = "○";
const LAMP_GAP: u16 = 3;
const SCREEN_COLOR: Color = Color::Green;
const FRAME_COLOR: Color = Color::DarkGrey;

/// Display color for an indicator's color name.
pub fn lamp_color(name: Option<&str>) -> Color {
    match name.map(str::to_ascii_lowercase).as_deref() {
        Some("red") => Color::Red,
        Some("amber" | "yellow" | "orange") => Color::Yellow,
        Some("blue") => Color::Blue,
        Some("white") => Color::White,
        _ => Color::Green,
    }
}

/// Where things go on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// Top-left corner of the whole panel.
    pub origin: (u16, u16),
    /// Rows of BBS text.
    pub screen_rows: u16,
    pub show_leds: bool,
    pub show_bbs: bool,
}

impl Layout {
    pub fn new(screen_rows: usize, show_leds: bool, show_bbs: bool) -> Self {
        Self {
            origin: (1, 1),
            screen_rows: u16::try_from(screen_rows.max(1)).unwrap_or(u16::MAX),
            show_leds,
            show_bbs,
        }
    }

    /// Top row of the box border.
    fn box_top(&self) -> u16 {
        if self.show_leds {
            self.origin.1 + 2
        } else {
            self.origin.1
        }
    }

    /// Terminal position of a BBS text cell.
    fn text_cell(&self, col: u16, row: u16) -> (u16, u16) {
        (self.origin.0 + 2 + col, self.box_top() + 1 + row)
    }

    /// Columns and rows the layout needs.
    pub fn size(&self, lamps_width: u16) -> (u16, u16) {
        let box_width = SCREEN_COLUMNS + 4;
        let width = self.origin.0 + lamps_width.max(if self.show_bbs { box_width } else { 0 });
        let height = self.box_top() + if self.show_bbs { self.screen_rows + 2 } else { 0 };
        (width, height)
    }
}

#[derive(Debug)]
struct Lamp {
    id: IndicatorId,
    label: String,
    color: Color,
    col: u16,
    on: bool,
    dirty: bool,
}

/// Crossterm-backed [`Surface`] over any writer.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    out: W,
    layout: Layout,
    lamps: Vec<Lamp>,
    text: String,
    cursor: bool,
    text_dirty: bool,
    frame_drawn: bool,
}

impl<W: Write> TerminalSurface<W> {
    /// Lamps appear in the order given; every lamp starts dark.
    pub fn new(out: W, layout: Layout, indicators: &[Indicator]) -> Self {
        let mut col = layout.origin.0;
        let lamps = indicators
            .iter()
            .map(|indicator| {
                let label = indicator.id().as_str().to_uppercase();
                let lamp = Lamp {
                    id: indicator.id().clone(),
                    color: lamp_color(indicator.color()),
                    col,
                    on: false,
                    dirty: true,
                    label,
                };
                col = col.saturating_add(lamp_width(&lamp.label) + LAMP_GAP);
                lamp
            })
            .collect();
        Self {
            out,
            layout,
            lamps,
            text: String::new(),
            cursor: false,
            text_dirty: true,
            frame_drawn: false,
        }
    }

    /// Width of the lamp row in columns.
    pub fn lamps_width(&self) -> u16 {
        self.lamps
            .last()
            .map_or(0, |lamp| lamp.col - self.layout.origin.0 + lamp_width(&lamp.label))
    }

    pub fn is_lit(&self, id: &str) -> Option<bool> {
        self.lamps
            .iter()
            .find(|lamp| lamp.id.as_str() == id)
            .map(|lamp| lamp.on)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Draw everything that changed and flush.
    ///
    /// # Errors
    ///
    /// Returns the first write or flush error.
    pub fn present(&mut self) -> io::Result<()> {
        if !self.frame_drawn {
            self.draw_frame()?;
            self.frame_drawn = true;
        }
        if self.layout.show_leds {
            self.draw_lamps()?;
        }
        if self.layout.show_bbs && self.text_dirty {
            self.draw_text()?;
            self.text_dirty = false;
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    fn draw_frame(&mut self) -> io::Result<()> {
        if !self.layout.show_bbs {
            return Ok(());
        }
        let (left, top) = (self.layout.origin.0, self.layout.box_top());
        let rule = "─".repeat(usize::from(SCREEN_COLUMNS) + 2);
        queue!(
            self.out,
            SetForegroundColor(FRAME_COLOR),
            MoveTo(left, top),
            Print(format!("┌{rule}┐")),
        )?;
        for row in 0..self.layout.screen_rows {
            let y = top + 1 + row;
            queue!(
                self.out,
                MoveTo(left, y),
                Print("│"),
                MoveTo(left + SCREEN_COLUMNS + 3, y),
                Print("│"),
            )?;
        }
        queue!(
            self.out,
            MoveTo(left, top + self.layout.screen_rows + 1),
            Print(format!("└{rule}┘")),
        )
    }

    fn draw_lamps(&mut self) -> io::Result<()> {
        let row = self.layout.origin.1;
        for lamp in self.lamps.iter_mut().filter(|lamp| lamp.dirty) {
            let (glyph, color) = if lamp.on {
                (LAMP_ON, lamp.color)
            } else {
                (LAMP_OFF, Color::DarkGrey)
            };
            queue!(
                self.out,
                MoveTo(lamp.col, row),
                SetForegroundColor(color),
                Print(glyph),
                SetForegroundColor(Color::Grey),
                Print(format!(" {}", lamp.label)),
            )?;
            lamp.dirty = false;
        }
        Ok(())
    }

    fn draw_text(&mut self) -> io::Result<()> {
        let lines: Vec<&str> = self.text.split('\n').collect();
        // The newest lines win when a render holds more than fits.
        let skip = lines.len().saturating_sub(usize::from(self.layout.screen_rows));
        let visible = &lines[skip..];

        queue!(self.out, SetForegroundColor(SCREEN_COLOR))?;
        for row in 0..self.layout.screen_rows {
            let line = visible.get(usize::from(row)).copied().unwrap_or("");
            let (clipped, width) = clip(line, SCREEN_COLUMNS);
            let (x, y) = self.layout.text_cell(0, row);
            queue!(
                self.out,
                MoveTo(x, y),
                Print(clipped),
                Print(" ".repeat(usize::from(SCREEN_COLUMNS - width))),
            )?;
        }

        if self.cursor {
            let last_row = u16::try_from(visible.len().saturating_sub(1)).unwrap_or(0);
            let (_, width) = clip(visible.last().copied().unwrap_or(""), SCREEN_COLUMNS);
            if width < SCREEN_COLUMNS {
                let (x, y) = self.layout.text_cell(width, last_row);
                queue!(
                    self.out,
                    MoveTo(x, y),
                    SetAttribute(Attribute::Reverse),
                    Print(" "),
                    SetAttribute(Attribute::NoReverse),
                )?;
            }
        }
        Ok(())
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn set_on(&mut self, id: &IndicatorId, on: bool) {
        if let Some(lamp) = self.lamps.iter_mut().find(|lamp| &lamp.id == id)
            && lamp.on != on
        {
            lamp.on = on;
            lamp.dirty = true;
        }
    }

    fn render(&mut self, text: &str, cursor_visible: bool) {
        if self.text != text || self.cursor != cursor_visible {
            self.text.clear();
            self.text.push_str(text);
            self.cursor = cursor_visible;
            self.text_dirty = true;
        }
    }
}

fn lamp_width(label: &str) -> u16 {
    u16::try_from(label.width() + 2).unwrap_or(u16::MAX)
}

/// Longest prefix of whole graphemes fitting in `columns`, and its width.
fn clip(line: &str, columns: u16) -> (&str, u16) {
    let limit = usize::from(columns);
    let mut width = 0;
    let mut end = 0;
    for (idx, grapheme) in line.grapheme_indices(true) {
        let w = grapheme.width();
        if width + w > limit {
            break;
        }
        width += w;
        end = idx + grapheme.len();
    }
    (&line[..end], u16::try_from(width).unwrap_or(columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blinken_core::Profile;

    fn panel() -> Vec<Indicator> {
        vec![
            Indicator::new("power", Profile::Power).with_color("red"),
            Indicator::new("tape", Profile::Tape).with_color("amber"),
        ]
    }

    fn surface() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::new(Vec::new(), Layout::new(4, true, true), &panel())
    }

    fn output(surface: &mut TerminalSurface<Vec<u8>>) -> String {
        let text = String::from_utf8_lossy(&surface.out).into_owned();
        surface.out.clear();
        text
    }

    #[test]
    fn color_names() {
        assert_eq!(lamp_color(Some("red")), Color::Red);
        assert_eq!(lamp_color(Some("Amber")), Color::Yellow);
        assert_eq!(lamp_color(Some("orange")), Color::Yellow);
        assert_eq!(lamp_color(Some("blue")), Color::Blue);
        assert_eq!(lamp_color(Some("mauve")), Color::Green);
        assert_eq!(lamp_color(None), Color::Green);
    }

    #[test]
    fn first_present_draws_frame_and_dark_lamps() {
        let mut surface = surface();
        surface.present().unwrap();
        let out = output(&mut surface);
        assert!(out.contains('┌') && out.contains('┘'));
        assert!(out.contains(LAMP_OFF));
        assert!(out.contains(" POWER") && out.contains(" TAPE"));
        assert!(!out.contains(LAMP_ON));
    }

    #[test]
    fn only_changes_are_redrawn() {
        let mut surface = surface();
        surface.present().unwrap();
        output(&mut surface);

        surface.set_on(&IndicatorId::new("tape"), true);
        surface.present().unwrap();
        let out = output(&mut surface);
        assert!(out.contains(LAMP_ON) && out.contains(" TAPE"));
        assert!(!out.contains("POWER"));
        assert!(!out.contains('┌'));

        // Same state again: nothing but the trailing reset.
        surface.set_on(&IndicatorId::new("tape"), true);
        surface.render("", false);
        surface.present().unwrap();
        assert!(!output(&mut surface).contains("TAPE"));
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut surface = surface();
        surface.set_on(&IndicatorId::new("ghost"), true);
        assert_eq!(surface.is_lit("ghost"), None);
        assert_eq!(surface.is_lit("power"), Some(false));
    }

    #[test]
    fn text_and_cursor() {
        let mut surface = surface();
        surface.render("Seleccion: ", true);
        surface.present().unwrap();
        let out = output(&mut surface);
        assert!(out.contains("Seleccion: "));
        assert!(out.contains("\x1b[7m"), "reverse video cursor missing");
        assert_eq!(surface.text(), "Seleccion: ");
    }

    #[test]
    fn long_lines_are_clipped() {
        let long = "x".repeat(40);
        let (clipped, width) = clip(&long, SCREEN_COLUMNS);
        assert_eq!(clipped.len(), 32);
        assert_eq!(width, 32);
        let (clipped, width) = clip("ab\u{4e2d}", 3);
        assert_eq!(clipped, "ab");
        assert_eq!(width, 2);
    }

    #[test]
    fn layout_without_leds_starts_with_the_box() {
        let layout = Layout::new(17, false, true);
        assert_eq!(layout.box_top(), layout.origin.1);
        assert_eq!(layout.size(0), (1 + 36, 1 + 19));
        assert_eq!(Layout::new(0, true, true).screen_rows, 1);
    }

    #[test]
    fn lamps_are_laid_out_left_to_right() {
        let surface = surface();
        assert_eq!(surface.lamps[0].col, 1);
        assert_eq!(surface.lamps[1].col, 1 + 7 + LAMP_GAP);
        assert_eq!(surface.lamps_width(), 7 + LAMP_GAP + 6);
    }
}
