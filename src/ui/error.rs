//! Full-screen error display.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    buffer::Buffer,
    prelude::*,
    widgets::{Paragraph, Wrap},
};
use std::io::{self, Stdout};

const ERROR_BG: Color = Color::Rgb(255, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Paints `message` centered on a red background.
///
/// The text wraps to 80% of the width and starts at the vertical middle.
pub fn render_error(area: Rect, buf: &mut Buffer, message: &str) {
    buf.set_style(area, Style::default().bg(ERROR_BG));

    let paragraph = Paragraph::new(Text::from(message.to_string()))
        .style(Style::default().fg(ERROR_FG).bg(ERROR_BG))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    let centered = Rect {
        x: area.x + area.width / 10,
        y: area.y + area.height / 2,
        width: (area.width * 80) / 100,
        height: area.height - area.height / 2,
    };
    paragraph.render(centered, buf);
}

/// Blocking error screen, dismissed with any key.
pub struct ErrorScreen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl ErrorScreen {
    /// Enters the alternate screen in raw mode.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ErrorScreen { terminal })
    }

    /// Shows `error_message` until a key is pressed.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn show_error(&mut self, error_message: &str) -> anyhow::Result<()> {
        loop {
            self.terminal.draw(|frame| {
                let area = frame.area();
                render_error(area, frame.buffer_mut(), error_message);
            })?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(_) = event::read()? {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Leaves the alternate screen.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ErrorScreen {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_fills_and_centers() {
        let area = Rect::new(0, 0, 40, 10);
        let mut buf = Buffer::empty(area);
        render_error(area, &mut buf, "boom");

        assert_eq!(buf[(0, 0)].bg, ERROR_BG);
        assert_eq!(buf[(39, 9)].bg, ERROR_BG);

        let row: String = (0..40).map(|x| buf[(x, 5)].symbol().to_string()).collect();
        assert_eq!(row.trim(), "boom");
        // centered inside the 32 column text box that starts at column 4
        assert_eq!(row.find("boom"), Some(4 + 14));
    }
}
