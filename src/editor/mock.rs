//! Deterministic stand-in for the editor under test.
//!
//! `MockWindow` interprets the `+` startup commands the suite uses
//! (`colorscheme`, `set guioptions=`, `set columns=`, `set titlestring=`,
//! `WToggleClean`) and renders a window into a `MockFramebuffer`, so the
//! whole pipeline can run without a display.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{ImageBuffer, RgbImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use super::{Deadline, Editor, POLL_INTERVAL};
use crate::harness::types::{HarnessError, HarnessResult};
use crate::launch::unquote_verbatim;

const GLYPH: u32 = 8;
const TEXT_ROWS: u32 = 24;
const DEFAULT_COLUMNS: u32 = 80;
const MAX_COLUMNS: u32 = 1000;
const TITLE_BAR_HEIGHT: u32 = 16;
const MENU_BAR_HEIGHT: u32 = 12;
const TOOLBAR_HEIGHT: u32 = 20;

/// A virtual framebuffer for programmatic drawing
#[derive(Debug, Clone)]
pub struct MockFramebuffer {
    width: u32,
    height: u32,
    /// RGB pixel buffer (row-major, 3 bytes per pixel)
    buffer: Vec<u8>,
}

impl MockFramebuffer {
    /// Create a framebuffer filled with `color`
    pub fn with_color(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut fb = Self {
            width,
            height,
            buffer: vec![0u8; width as usize * height as usize * 3],
        };
        fb.fill(color);
        fb
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fill(&mut self, color: [u8; 3]) {
        for chunk in self.buffer.chunks_exact_mut(3) {
            chunk.copy_from_slice(&color);
        }
    }

    /// Draw a filled rectangle, clipped to the buffer
    pub fn draw_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for py in y..(y + h).min(self.height) {
            for px in x..(x + w).min(self.width) {
                self.set_pixel(px, py, color);
            }
        }
    }

    /// Draw text using 8x8 glyphs. Text does not wrap.
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
        let mut cursor_x = x;
        for ch in text.chars() {
            if cursor_x >= self.width {
                break;
            }
            self.draw_char(cursor_x, y, ch, fg, bg);
            cursor_x += GLYPH;
        }
    }

    fn draw_char(&mut self, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
        let glyph = BASIC_FONTS.get(ch).unwrap_or([0u8; 8]);
        for (row_idx, row) in glyph.iter().enumerate() {
            let py = y + row_idx as u32;
            for bit in 0..GLYPH {
                // LSB is the leftmost pixel
                let color = if (row >> bit) & 1 == 1 { fg } else { bg };
                self.set_pixel(x + bit, py, color);
            }
        }
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let idx = ((y * self.width + x) * 3) as usize;
        [self.buffer[idx], self.buffer[idx + 1], self.buffer[idx + 2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = ((y * self.width + x) * 3) as usize;
        self.buffer[idx..idx + 3].copy_from_slice(&color);
    }

    /// Convert to an image buffer
    pub fn to_image(&self) -> HarnessResult<RgbImage> {
        ImageBuffer::from_raw(self.width, self.height, self.buffer.clone()).ok_or_else(|| {
            HarnessError::Capture(format!(
                "framebuffer size mismatch for {}x{}",
                self.width, self.height
            ))
        })
    }

    /// Encode the framebuffer as PNG bytes
    pub fn to_png(&self) -> HarnessResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.to_image()?
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

/// Editor window state derived from startup commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    pub title: String,
    pub colorscheme: String,
    pub columns: u32,
    /// Menu bar and toolbar enabled (`guioptions` not cleared)
    pub gui_chrome: bool,
    /// Toggled by `WToggleClean`
    pub clean: bool,
}

impl Default for MockWindow {
    fn default() -> Self {
        Self {
            title: "VIM".to_string(),
            colorscheme: "default".to_string(),
            columns: DEFAULT_COLUMNS,
            gui_chrome: true,
            clean: false,
        }
    }
}

impl MockWindow {
    /// Apply every `+command` in a launch argument list, in order
    pub fn from_args(args: &[String]) -> Self {
        let mut window = Self::default();
        for arg in args {
            if let Some(command) = unquote_verbatim(arg).strip_prefix('+') {
                window.apply(command.trim());
            }
        }
        window
    }

    /// Apply a single Ex command; unknown commands are ignored
    pub fn apply(&mut self, command: &str) {
        if command == "WToggleClean" {
            self.clean = !self.clean;
        } else if let Some(name) = command.strip_prefix("colorscheme ") {
            self.colorscheme = name.trim().to_string();
        } else if let Some(title) = command.strip_prefix("set titlestring=") {
            self.title = title.to_string();
        } else if let Some(columns) = command.strip_prefix("set columns=") {
            if let Ok(columns) = columns.trim().parse::<u32>() {
                self.columns = columns.clamp(1, MAX_COLUMNS);
            }
        } else if let Some(flags) = command.strip_prefix("set guioptions=") {
            self.gui_chrome = flags.contains('m') || flags.contains('T');
        }
    }

    fn palette(&self) -> ([u8; 3], [u8; 3]) {
        match self.colorscheme.as_str() {
            "desert" => ([255, 255, 255], [51, 51, 51]),
            _ => ([0, 0, 0], [255, 255, 255]),
        }
    }

    /// Render the window. Size depends only on `columns`; clean mode gives
    /// the chrome area to the text area.
    pub fn render(&self) -> MockFramebuffer {
        let (fg, bg) = self.palette();
        let width = self.columns * GLYPH;
        let chrome_height = TITLE_BAR_HEIGHT + MENU_BAR_HEIGHT + TOOLBAR_HEIGHT;
        let height = chrome_height + TEXT_ROWS * GLYPH;
        let mut fb = MockFramebuffer::with_color(width, height, bg);

        let mut top = 0;
        if !self.clean {
            let caption = [0, 84, 153];
            fb.draw_rect(0, 0, width, TITLE_BAR_HEIGHT, caption);
            fb.draw_text(4, 4, &self.title, [255, 255, 255], caption);
            top = TITLE_BAR_HEIGHT;
            if self.gui_chrome {
                let bar = [240, 240, 240];
                fb.draw_rect(0, top, width, MENU_BAR_HEIGHT, bar);
                fb.draw_text(4, top + 2, "File Edit Tools Syntax Buffers Window Help", [0, 0, 0], bar);
                fb.draw_rect(0, top + MENU_BAR_HEIGHT, width, TOOLBAR_HEIGHT, [225, 225, 225]);
                top += MENU_BAR_HEIGHT + TOOLBAR_HEIGHT;
            }
        }

        let rows = (height - top) / GLYPH;
        for row in 1..rows {
            fb.draw_text(0, top + row * GLYPH, "~", [0, 0, 255], bg);
        }
        fb
    }
}

/// Launch/termination counts shared with a `MockEditor`
#[derive(Debug, Clone, Default)]
pub struct MockCounters {
    launches: Arc<AtomicUsize>,
    terminations: Arc<AtomicUsize>,
}

impl MockCounters {
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }
}

/// Editor that renders a `MockWindow` instead of running a process
#[derive(Debug, Default)]
pub struct MockEditor {
    window: Option<MockWindow>,
    fail_launch: bool,
    fail_capture: bool,
    hang_on_exit: bool,
    counters: MockCounters,
}

impl MockEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `launch` fail
    pub fn fail_launch(mut self, fail: bool) -> Self {
        self.fail_launch = fail;
        self
    }

    /// Make `capture_screenshot` fail
    pub fn fail_capture(mut self, fail: bool) -> Self {
        self.fail_capture = fail;
        self
    }

    /// Never exit after `terminate`, so `wait_for_exit` runs into the deadline
    pub fn hang_on_exit(mut self, hang: bool) -> Self {
        self.hang_on_exit = hang;
        self
    }

    /// Handle for observing this editor after it has been moved
    pub fn counters(&self) -> MockCounters {
        self.counters.clone()
    }
}

impl Editor for MockEditor {
    fn name(&self) -> &str {
        "mock"
    }

    fn launch(&mut self, args: &[String]) -> HarnessResult<()> {
        if self.fail_launch {
            return Err(HarnessError::Launch("mock editor refused to start".to_string()));
        }
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        self.window = Some(MockWindow::from_args(args));
        Ok(())
    }

    fn await_ready(&mut self, _deadline: Deadline) -> HarnessResult<()> {
        if self.window.is_none() {
            return Err(HarnessError::Launch("editor is not running".to_string()));
        }
        Ok(())
    }

    fn capture_screenshot(&mut self, path: &Path, _deadline: Deadline) -> HarnessResult<()> {
        if self.fail_capture {
            return Err(HarnessError::Capture("mock capture failure".to_string()));
        }
        let window = self
            .window
            .as_ref()
            .ok_or_else(|| HarnessError::Capture("editor is not running".to_string()))?;
        std::fs::write(path, window.render().to_png()?)?;
        Ok(())
    }

    fn terminate(&mut self) -> HarnessResult<()> {
        self.counters.terminations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn wait_for_exit(&mut self, deadline: Deadline) -> HarnessResult<()> {
        if self.hang_on_exit {
            while !deadline.expired() {
                thread::sleep(POLL_INTERVAL.min(deadline.remaining()));
            }
            return Err(deadline.timeout("waiting for editor to exit"));
        }
        self.window = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_framebuffer_draw_rect_clips() {
        let mut fb = MockFramebuffer::with_color(20, 20, [0, 0, 0]);
        fb.draw_rect(15, 15, 10, 10, [255, 0, 0]);
        assert_eq!(fb.get_pixel(14, 14), [0, 0, 0]);
        assert_eq!(fb.get_pixel(19, 19), [255, 0, 0]);
        assert_eq!(fb.get_pixel(25, 25), [0, 0, 0]);
    }

    #[test]
    fn test_framebuffer_draw_text_has_foreground() {
        let mut fb = MockFramebuffer::with_color(16, 8, [0, 0, 0]);
        fb.draw_text(0, 0, "H", [255, 255, 255], [0, 0, 0]);
        let lit = (0..8).flat_map(|y| (0..8).map(move |x| (x, y))).any(|(x, y)| fb.get_pixel(x, y) == [255, 255, 255]);
        assert!(lit);
    }

    #[test]
    fn test_window_parses_quoted_commands() {
        let window = MockWindow::from_args(&args(&[
            "-N",
            "+\"set titlestring=wimproved.vim\"",
            "+\"set guioptions=\"",
            "+\"set columns=60\"",
            "+\"colorscheme desert\"",
            "+WToggleClean",
        ]));
        assert_eq!(window.title, "wimproved.vim");
        assert_eq!(window.colorscheme, "desert");
        assert_eq!(window.columns, 60);
        assert!(!window.gui_chrome);
        assert!(window.clean);
    }

    #[test]
    fn test_columns_are_clamped_before_rendering() {
        let huge = MockWindow::from_args(&args(&["+\"set columns=600000000\""]));
        assert_eq!(huge.columns, MAX_COLUMNS);
        assert_eq!(huge.render().width(), MAX_COLUMNS * GLYPH);

        let zero = MockWindow::from_args(&args(&["+\"set columns=0\""]));
        assert_eq!(zero.columns, 1);
    }

    #[test]
    fn test_double_toggle_renders_like_default() {
        let plain = MockWindow::from_args(&[]).render();
        let toggled = MockWindow::from_args(&args(&["+WToggleClean", "+redraw", "+WToggleClean"])).render();
        assert_eq!(plain.to_png().unwrap(), toggled.to_png().unwrap());
    }

    #[test]
    fn test_clean_mode_hides_chrome() {
        let normal = MockWindow::from_args(&[]).render();
        let clean = MockWindow::from_args(&args(&["+WToggleClean"])).render();
        assert_eq!(normal.width(), clean.width());
        assert_eq!(normal.height(), clean.height());
        assert_eq!(normal.get_pixel(0, 0), [0, 84, 153]);
        assert_eq!(clean.get_pixel(0, 0), [255, 255, 255]);
    }

    #[test]
    fn test_color_scheme_order_does_not_matter() {
        let before = MockWindow::from_args(&args(&["+\"colorscheme desert\"", "+WToggleClean"]));
        let after = MockWindow::from_args(&args(&["+WToggleClean", "+\"colorscheme desert\""]));
        assert_eq!(before, after);
    }
}
