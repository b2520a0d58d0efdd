//! Terminal front-end for the waveform player.
//!
//! Drawing is split from the terminal: [`render_player`] paints a snapshot of
//! the visualizer into a ratatui buffer, [`PlayerTui`] owns the terminal, the
//! input polling and the last layout for mouse hit testing.

use crate::player::{
    format_time, BarClass, BarStyle, BarView, PlaybackState, Region, Rgb, VisualProfile,
};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{buffer::Buffer, prelude::*};
use std::io::{self, Stdout};
use std::time::Duration;

const EIGHTHS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];
const FOOTER_FG: Color = Color::Rgb(185, 207, 212);

/// User input translated into a player action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    /// Nothing happened (no key, or an unbound one)
    Continue,
    TogglePlay,
    /// Seek by a number of steps; negative is backwards
    Seek(i8),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    Download,
    /// Left click at a terminal cell
    Click { column: u16, row: u16 },
    Quit,
}

/// Maps a key press to a command.
pub fn command_for_key(key: KeyEvent) -> PlayerCommand {
    if key.kind == KeyEventKind::Release {
        return PlayerCommand::Continue;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => PlayerCommand::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => PlayerCommand::Quit,
        KeyCode::Char(' ') | KeyCode::Char('k') => PlayerCommand::TogglePlay,
        KeyCode::Left | KeyCode::Char('h') => PlayerCommand::Seek(-1),
        KeyCode::Right | KeyCode::Char('l') => PlayerCommand::Seek(1),
        KeyCode::Char('+') | KeyCode::Char('=') | KeyCode::Up => PlayerCommand::VolumeUp,
        KeyCode::Char('-') | KeyCode::Down => PlayerCommand::VolumeDown,
        KeyCode::Char('m') => PlayerCommand::ToggleMute,
        KeyCode::Char('d') => PlayerCommand::Download,
        _ => PlayerCommand::Continue,
    }
}

/// Screen regions of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlayerLayout {
    pub title: Rect,
    pub waveform: Rect,
    pub progress: Rect,
    pub footer: Rect,
}

impl PlayerLayout {
    pub fn new(area: Rect) -> Self {
        let row = |offset: u16| Rect {
            x: area.x,
            y: area.y + offset.min(area.height.saturating_sub(1)),
            width: area.width,
            height: u16::from(area.height > offset),
        };
        let waveform_height = area.height.saturating_sub(3);
        Self {
            title: row(0),
            waveform: Rect {
                x: area.x,
                y: area.y + 1.min(area.height),
                width: area.width,
                height: waveform_height,
            },
            progress: row(area.height.saturating_sub(2).max(1)),
            footer: row(area.height.saturating_sub(1).max(2)),
        }
    }
}

/// One drawn bar: which model bar, where, and how wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarColumn {
    pub index: usize,
    pub x: u16,
    pub width: u16,
}

/// Horizontal placement of the bars inside a strip `width` columns wide.
///
/// Scrolling strips lay bars out at a fixed pitch and shift them by `offset`.
/// Fixed strips shrink the pitch until every bar fits, then center the strip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripGeometry {
    pub bar_count: usize,
    pub pitch: u16,
    pub scrolls: bool,
    pub width: u16,
    pub offset: f64,
}

impl StripGeometry {
    pub fn new(profile: &VisualProfile, width: u16, offset: f64) -> Self {
        Self {
            bar_count: profile.bar_count,
            pitch: profile.bar_pitch.max(1),
            scrolls: profile.scroll.is_some(),
            width,
            offset,
        }
    }

    fn fixed_pitch(&self) -> u16 {
        let fit = usize::from(self.width) / self.bar_count.max(1);
        u16::try_from(fit).unwrap_or(u16::MAX).min(self.pitch.max(2))
    }

    fn left_pad(&self) -> u16 {
        let used = usize::from(self.fixed_pitch()) * self.bar_count;
        u16::try_from(usize::from(self.width).saturating_sub(used) / 2).unwrap_or(0)
    }

    pub fn columns(&self) -> Vec<BarColumn> {
        if self.width == 0 || self.bar_count == 0 {
            return Vec::new();
        }
        let bar_width = |pitch: u16| if pitch >= 2 { pitch - 1 } else { 1 };

        if self.scrolls {
            let shift = self.offset.max(0.0).round() as i64;
            let pitch = i64::from(self.pitch);
            let bw = i64::from(bar_width(self.pitch));
            let width = i64::from(self.width);
            return (0..self.bar_count)
                .filter_map(|index| {
                    let start = index as i64 * pitch - shift;
                    let end = (start + bw).min(width);
                    let start = start.max(0);
                    (end > start).then(|| BarColumn {
                        index,
                        x: start as u16,
                        width: (end - start) as u16,
                    })
                })
                .collect();
        }

        let pitch = self.fixed_pitch();
        if pitch == 0 {
            // more bars than columns: several bars share a column
            let width = self.width as usize;
            return (0..self.bar_count)
                .map(|index| BarColumn {
                    index,
                    x: (index * width / self.bar_count) as u16,
                    width: 1,
                })
                .collect();
        }
        let pad = self.left_pad();
        (0..self.bar_count)
            .map(|index| BarColumn {
                index,
                x: pad + index as u16 * pitch,
                width: bar_width(pitch),
            })
            .collect()
    }

    /// Seek region in strip-local columns.
    pub fn seek_region(&self) -> Region {
        if self.scrolls {
            let content = self.bar_count as f64 * f64::from(self.pitch);
            return Region::new(-self.offset.max(0.0).round(), content);
        }
        match self.fixed_pitch() {
            0 => Region::new(0.0, f64::from(self.width)),
            pitch => Region::new(
                f64::from(self.left_pad()),
                f64::from(pitch) * self.bar_count as f64,
            ),
        }
    }
}

/// Bar height in eighths of a row, at least one eighth.
fn bar_eighths(height: f64, rows: u16) -> u32 {
    let total = u32::from(rows) * 8;
    let scaled = (height.clamp(0.0, 100.0) / 100.0 * f64::from(total)).round() as u32;
    scaled.clamp(1, total.max(1))
}

/// Rows covered by a symmetric bar, centered: `(first_row, count)`.
fn symmetric_rows(height: f64, rows: u16) -> (u16, u16) {
    let cells = (height.clamp(0.0, 100.0) / 100.0 * f64::from(rows)).round() as u16;
    let cells = cells.clamp(1, rows.max(1));
    ((rows - cells.min(rows)) / 2, cells)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn blend(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (f64::from(a) + (f64::from(b) - f64::from(a)) * t).round() as u8;
    Rgb(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Colour of column `dx` of a bar `width` columns wide.
///
/// A partly passed bar splits its columns at `fill`; a single column bar
/// blends between the upcoming and played colours instead.
fn bar_color(profile: &VisualProfile, bar: &BarView, dx: u16, width: u16) -> Color {
    let palette = &profile.palette;
    match bar.class {
        BarClass::Passed => color(palette.played),
        BarClass::Active => color(palette.active),
        BarClass::Upcoming => color(palette.upcoming),
        BarClass::Partial(_) if width > 1 => {
            if (f64::from(dx) + 0.5) / f64::from(width) <= bar.fill {
                color(palette.played)
            } else {
                color(palette.upcoming)
            }
        }
        BarClass::Partial(_) => color(blend(palette.upcoming, palette.played, bar.fill)),
    }
}

/// Everything drawn in one frame.
#[derive(Debug, Clone, Copy)]
pub struct PlayerView<'a> {
    pub title: &'a str,
    pub profile: &'a VisualProfile,
    pub bars: &'a [BarView],
    pub state: &'a PlaybackState,
    pub progress: f64,
    pub scroll_offset: f64,
    pub can_download: bool,
    pub notice: Option<&'a str>,
}

fn status_label(state: &PlaybackState) -> (&'static str, Color) {
    if state.has_error {
        ("Unavailable", Color::Red)
    } else if state.is_loading {
        ("Loading…", Color::Yellow)
    } else if state.is_playing {
        ("▶ Playing", Color::Green)
    } else {
        ("⏸ Paused", FOOTER_FG)
    }
}

fn footer_line(view: &PlayerView<'_>) -> Line<'static> {
    let state = view.state;
    let mut spans = vec![
        Span::raw(format!(
            "{} / {}",
            format_time(state.current_time),
            format_time(state.duration_secs())
        )),
    ];

    if view.profile.volume_controls {
        let volume = if state.muted {
            "muted".to_string()
        } else {
            format!("vol {:>3.0}%", state.volume * 100.0)
        };
        spans.push(Span::raw(format!("  {volume}")));
    } else if state.muted {
        spans.push(Span::raw("  muted"));
    }

    let mut keys = String::from("  space play  ←/→ seek  m mute");
    if view.can_download {
        keys.push_str("  d download");
    }
    keys.push_str("  q quit");
    spans.push(Span::styled(keys, Style::default().fg(Color::DarkGray)));

    if let Some(notice) = view.notice {
        spans.push(Span::styled(
            format!("  {notice}"),
            Style::default().fg(color(view.profile.palette.accent)),
        ));
    }
    Line::from(spans)
}

/// Paints `view` into `buf`.
pub fn render_player(area: Rect, buf: &mut Buffer, view: &PlayerView<'_>) {
    let layout = PlayerLayout::new(area);
    let background = Style::default().bg(color(view.profile.palette.background));
    buf.set_style(area, background);

    let (status, status_color) = status_label(view.state);
    buf.set_line(
        layout.title.x,
        layout.title.y,
        &Line::from(vec![
            Span::styled(format!("{status}  "), Style::default().fg(status_color)),
            Span::styled(view.title.to_string(), Style::default().fg(FOOTER_FG)),
            Span::styled(
                format!("  [{}]", view.profile.name),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        layout.title.width,
    );

    render_bars(layout.waveform, buf, view);
    render_progress(layout.progress, buf, view);
    buf.set_line(
        layout.footer.x,
        layout.footer.y,
        &footer_line(view).style(Style::default().fg(FOOTER_FG)),
        layout.footer.width,
    );
}

fn render_bars(area: Rect, buf: &mut Buffer, view: &PlayerView<'_>) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let geometry = StripGeometry::new(view.profile, area.width, view.scroll_offset);
    let rows = area.height;

    for column in geometry.columns() {
        let Some(bar) = view.bars.get(column.index) else {
            continue;
        };
        for dx in 0..column.width {
            let x = area.x + column.x + dx;
            let style = Style::default().fg(bar_color(view.profile, bar, dx, column.width));
            match view.profile.bar_style {
                BarStyle::Bottom => {
                    let eighths = bar_eighths(bar.animated_height, rows);
                    for r in 0..rows {
                        let level = eighths.saturating_sub(u32::from(r) * 8).min(8) as usize;
                        if level == 0 {
                            break;
                        }
                        let y = area.y + rows - 1 - r;
                        buf.set_string(x, y, EIGHTHS[level], style);
                    }
                }
                BarStyle::Symmetric => {
                    let (first, count) = symmetric_rows(bar.animated_height, rows);
                    for r in first..first + count {
                        buf.set_string(x, area.y + r, EIGHTHS[8], style);
                    }
                }
            }
        }
    }
}

fn render_progress(area: Rect, buf: &mut Buffer, view: &PlayerView<'_>) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    let filled = (view.progress.clamp(0.0, 1.0) * f64::from(area.width)).round() as u16;
    let played = Style::default().fg(color(view.profile.palette.played));
    let rest = Style::default().fg(color(view.profile.palette.upcoming));
    for dx in 0..area.width {
        let (symbol, style) = if dx < filled { ("━", played) } else { ("─", rest) };
        buf.set_string(area.x + dx, area.y, symbol, style);
    }
}

/// Where a click landed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickTarget {
    /// Strip-local column and the strip's seek region
    Waveform { x: f64, region: Region },
    /// Column within the progress bar and its region
    Progress { x: f64, region: Region },
}

/// Resolves a click against a layout.
pub fn hit_test(
    layout: &PlayerLayout,
    geometry: &StripGeometry,
    column: u16,
    row: u16,
) -> Option<ClickTarget> {
    let inside = |r: &Rect| {
        column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
    };
    if inside(&layout.waveform) {
        return Some(ClickTarget::Waveform {
            x: f64::from(column - layout.waveform.x),
            region: geometry.seek_region(),
        });
    }
    if inside(&layout.progress) {
        return Some(ClickTarget::Progress {
            x: f64::from(column - layout.progress.x),
            region: Region::new(0.0, f64::from(layout.progress.width)),
        });
    }
    None
}

/// Terminal UI for the player.
pub struct PlayerTui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    layout: PlayerLayout,
    geometry: Option<StripGeometry>,
}

impl PlayerTui {
    /// Enters the alternate screen with raw mode and mouse capture.
    ///
    /// # Errors
    /// - If the terminal cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        let size = terminal.size()?;

        Ok(Self {
            terminal,
            layout: PlayerLayout::new(Rect::new(0, 0, size.width, size.height)),
            geometry: None,
        })
    }

    /// Width of the waveform strip at the current terminal size.
    pub fn waveform_width(&self) -> u16 {
        self.terminal
            .size()
            .map(|size| PlayerLayout::new(Rect::new(0, 0, size.width, size.height)).waveform.width)
            .unwrap_or(self.layout.waveform.width)
    }

    /// Draws one frame.
    ///
    /// # Errors
    /// - If terminal rendering fails
    pub fn draw(&mut self, view: &PlayerView<'_>) -> anyhow::Result<()> {
        let mut layout = self.layout;
        self.terminal.draw(|frame| {
            let area = frame.area();
            layout = PlayerLayout::new(area);
            render_player(area, frame.buffer_mut(), view);
        })?;
        self.layout = layout;
        self.geometry = Some(StripGeometry::new(
            view.profile,
            layout.waveform.width,
            view.scroll_offset,
        ));
        Ok(())
    }

    /// Resolves a click against the last drawn frame.
    pub fn hit(&self, column: u16, row: u16) -> Option<ClickTarget> {
        hit_test(&self.layout, self.geometry.as_ref()?, column, row)
    }

    /// Waits up to `timeout` for input.
    ///
    /// # Errors
    /// - If event polling fails
    pub fn handle_input(&mut self, timeout: Duration) -> anyhow::Result<PlayerCommand> {
        if !event::poll(timeout)? {
            return Ok(PlayerCommand::Continue);
        }
        Ok(match event::read()? {
            Event::Key(key) => command_for_key(key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                PlayerCommand::Click {
                    column: mouse.column,
                    row: mouse.row,
                }
            }
            _ => PlayerCommand::Continue,
        })
    }

    /// Restores the terminal.
    ///
    /// # Errors
    /// - If terminal mode cannot be restored
    pub fn cleanup(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}
