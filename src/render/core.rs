use std::io::{self, Write};

use super::geometry::Rect;
use super::panels::{PanelId, PanelState};
use super::width::display_width;

/// Renderer runtime parameters.
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    pub restore_cursor: Option<(u16, u16)>,
}

/// ANSI escape code renderer writing panels straight to a terminal handle.
#[derive(Debug, Default)]
pub struct AnsiRenderer {
    settings: RendererSettings,
}

impl AnsiRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    pub fn clear(&mut self, writer: &mut impl Write) -> io::Result<()> {
        write!(writer, "\x1b[2J\x1b[H")
    }

    /// Fill `rects` with spaces.
    pub fn blank(&mut self, writer: &mut impl Write, rects: &[Rect]) -> io::Result<()> {
        for rect in rects.iter().filter(|rect| !rect.is_empty()) {
            let line = " ".repeat(rect.width as usize);
            for row in 0..rect.height {
                write!(writer, "\x1b[{};{}H{}", rect.y + row + 1, rect.x + 1, line)?;
            }
        }
        Ok(())
    }

    pub fn render(
        &mut self,
        writer: &mut impl Write,
        dirty: &[(PanelId, PanelState)],
    ) -> io::Result<()> {
        for (_id, state) in dirty {
            render_panel(writer, state)?;
        }

        if let Some((row, col)) = self.settings.restore_cursor {
            write!(writer, "\x1b[{};{}H", row + 1, col + 1)?;
        }

        writer.flush()
    }
}

fn render_panel(writer: &mut impl Write, state: &PanelState) -> io::Result<()> {
    let Rect {
        x,
        y,
        width,
        height,
    } = state.rect;

    if width == 0 || height == 0 {
        return Ok(());
    }

    let mut lines = wrap_to_width(&state.content, width);
    lines.truncate(height as usize);
    lines.resize(height as usize, String::new());

    for (offset, line) in lines.iter_mut().enumerate() {
        pad_line(line, width);
        write!(writer, "\x1b[{};{}H{}\x1b[0m", y + offset as u16 + 1, x + 1, line)?;
    }

    Ok(())
}

/// Break `content` into lines no wider than `width` columns. Escape
/// sequences count as zero width.
pub fn wrap_to_width(content: &str, width: u16) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for raw in content.split('\n') {
        if raw.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for ch in raw.chars() {
            if current.is_empty() && ch == ' ' {
                continue;
            }
            current.push(ch);
            let display = display_width(&current) as u16;
            if display > width {
                current.pop();
                if current.is_empty() {
                    // Wider than the panel itself.
                    lines.push(String::new());
                } else {
                    lines.push(std::mem::take(&mut current));
                }
                if ch != ' ' {
                    current.push(ch);
                }
            } else if display == width {
                lines.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Pad with spaces (or cut) to exactly `width` columns.
pub fn pad_line(line: &mut String, width: u16) {
    let width = width as usize;
    let mut display = display_width(line);
    while display > width {
        line.pop();
        display = display_width(line);
    }
    line.extend(std::iter::repeat(' ').take(width - display));
}
