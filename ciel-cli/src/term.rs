use std::io::{self, Write};

use anyhow::Context;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, ClearType};
use crossterm::{cursor, execute, queue};
use futures::StreamExt;
use tokio::sync::mpsc;

use ciel_core::screen::{CardState, Command, Frontend, Phase, ScreenEvent};
use ciel_core::theme::Rgba;

const CARD_WIDTH: usize = 38;
const CARD_ROWS: u16 = 9;

/// Full-screen card frontend: alternate screen, raw mode, gradient-banded
/// background. `Drop` restores the terminal.
pub struct TermFrontend {
    out: io::Stdout,
}

impl TermFrontend {
    pub fn new() -> anyhow::Result<Self> {
        let mut out = io::stdout();

        terminal::enable_raw_mode().context("Failed to enable raw mode")?;

        if let Err(error) = execute!(out, terminal::EnterAlternateScreen, cursor::Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(error).context("Failed to enter the alternate screen");
        }

        Ok(Self { out })
    }

    fn draw(&mut self, card: &CardState) -> io::Result<()> {
        let width = CARD_WIDTH;

        queue!(self.out, terminal::Clear(ClearType::All))?;

        // The terminal has no alpha channel, so the translucent bottom stop
        // is composited over black before interpolation.
        let top = card.gradient.top;
        let bottom = card.gradient.bottom.over(Rgba::BLACK);

        for row in 0..CARD_ROWS {
            let t = f32::from(row) / f32::from(CARD_ROWS - 1);
            let band = mix(top, bottom, t);

            let text = match row {
                2 => format!("  {}", card.city),
                4 => format!("  {}  {}", card.temperature, card.icon.glyph()),
                6 => format!("  {}", card.description),
                _ => String::new(),
            };

            queue!(
                self.out,
                cursor::MoveTo(0, row),
                SetBackgroundColor(to_term(band)),
                SetForegroundColor(Color::White),
                Print(format!("{text:<width$}")),
                ResetColor,
            )?;
        }

        let status = match card.phase {
            Phase::Locating => "locating...",
            Phase::Fetching => "fetching...",
            _ => "",
        };

        queue!(
            self.out,
            cursor::MoveTo(0, CARD_ROWS + 1),
            Print(format!("{status:<width$}")),
            cursor::MoveTo(0, CARD_ROWS + 2),
            Print("r: refresh  q: quit"),
        )?;

        if let Some(message) = &card.error {
            let inner = width - 4;
            let border = "─".repeat(width - 2);

            queue!(
                self.out,
                SetForegroundColor(Color::Red),
                cursor::MoveTo(0, CARD_ROWS + 4),
                Print(format!("┌{border}┐")),
                cursor::MoveTo(0, CARD_ROWS + 5),
                Print(format!("│ {:<inner$} │", clip(message, inner))),
                cursor::MoveTo(0, CARD_ROWS + 6),
                Print(format!("│ {:<inner$} │", "press Enter to dismiss")),
                cursor::MoveTo(0, CARD_ROWS + 7),
                Print(format!("└{border}┘")),
                ResetColor,
            )?;
        }

        self.out.flush()
    }
}

impl Frontend for TermFrontend {
    fn render(&mut self, card: &CardState) {
        if let Err(error) = self.draw(card) {
            tracing::error!("Terminal draw failed: {error}");
        }
    }
}

impl Drop for TermFrontend {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// Line-per-field stdout rendering for `--once` and scripted use. Prints
/// nothing until a cycle settles; a failed cycle stays silent here and is
/// reported through the caller's exit status.
#[derive(Debug, Default)]
pub struct PlainFrontend;

impl Frontend for PlainFrontend {
    fn render(&mut self, card: &CardState) {
        if card.phase == Phase::Idle {
            println!("{}  {}", card.icon.glyph(), card.city);
            println!("{}  {}", card.temperature, card.description);
        }
    }
}

/// Translate key presses into screen commands until the queue closes.
pub async fn forward_keys(sender: mpsc::UnboundedSender<ScreenEvent>) {
    let mut events = EventStream::new();

    while let Some(Ok(event)) = events.next().await {
        let Event::Key(KeyEvent { code, modifiers, kind: KeyEventKind::Press, .. }) = event else {
            continue;
        };

        let command = match code {
            KeyCode::Char('r') | KeyCode::Char('R') => Command::Refresh,
            KeyCode::Enter | KeyCode::Char(' ') => Command::Dismiss,
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
            _ => continue,
        };

        if sender.send(ScreenEvent::Command(command)).is_err() {
            break;
        }
    }
}

fn mix(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let lerp = |x: u8, y: u8| -> u8 {
        (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8
    };

    Rgba::opaque(lerp(a.red, b.red), lerp(a.green, b.green), lerp(a.blue, b.blue))
}

fn to_term(color: Rgba) -> Color {
    Color::Rgb { r: color.red, g: color.green, b: color.blue }
}

/// Keep a message within the modal, char-safe.
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_interpolates_between_the_stops() {
        let top = Rgba::opaque(0, 100, 200);
        let bottom = Rgba::opaque(100, 0, 100);

        assert_eq!(mix(top, bottom, 0.0), top);
        assert_eq!(mix(top, bottom, 1.0), bottom);
        assert_eq!(mix(top, bottom, 0.5), Rgba::opaque(50, 50, 150));
    }

    #[test]
    fn clip_keeps_short_text_and_shortens_long_text() {
        assert_eq!(clip("short", 10), "short");
        assert_eq!(clip("exactly ten", 11), "exactly ten");

        let clipped = clip("a very long error message", 10);
        assert_eq!(clipped.chars().count(), 10);
        assert!(clipped.ends_with('…'));
    }

    #[test]
    fn clip_is_char_safe() {
        let clipped = clip("météo défavorable aujourd'hui", 8);
        assert_eq!(clipped.chars().count(), 8);
    }
}
