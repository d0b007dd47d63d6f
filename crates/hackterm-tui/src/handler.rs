use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use hackterm_core::Endpoint;
use ratatui::layout::Rect;

use crate::app::App;
use crate::tui::AppEvent;

/// Lines moved per mouse wheel notch.
const WHEEL_STEP: u16 = 3;

/// Convert character index to byte index for UTF-8 string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Settled { endpoint, outcome } => app.on_settled(endpoint, outcome),
        AppEvent::Health(healthy) => app.connected = Some(healthy),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if ctrl => app.should_quit = true,

        // Actions
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => insert_char(app, '\n'),
        KeyCode::Enter => app.submit(app.default_endpoint),
        KeyCode::Char('e') if ctrl => app.submit(Endpoint::Chat),
        KeyCode::Char('a') if ctrl => app.submit(Endpoint::Analyze),

        // Chat scrolling
        KeyCode::PageUp => {
            let step = app.page_height();
            app.scroll_up(step);
        }
        KeyCode::PageDown => {
            let step = app.page_height();
            app.scroll_down(step);
        }

        // Input editing
        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => insert_char(app, c),
        _ => {}
    }
}

fn insert_char(app: &mut App, c: char) {
    let byte_pos = char_to_byte_index(&app.input, app.cursor);
    app.input.insert(byte_pos, c);
    app.cursor += 1;
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_STEP),
        _ => {}
    }
}
