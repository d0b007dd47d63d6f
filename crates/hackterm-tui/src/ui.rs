use hackterm_core::{segment, ChatMessage, ChatRole, Conversation, Endpoint, SegmentKind};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
    Frame,
};

use crate::app::App;

const NEON: Color = Color::Green;
const DIM: Color = Color::DarkGray;

/// Most input lines shown before the box stops growing.
const MAX_INPUT_LINES: u16 = 5;

pub fn render(app: &mut App, frame: &mut Frame) {
    let input_lines = (app.input.split('\n').count() as u16).clamp(1, MAX_INPUT_LINES);

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(3),
        Constraint::Length(input_lines + 2),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(DIM));

    let title = Paragraph::new(Span::styled(
        "TERMINAL_V1.0",
        Style::default().fg(NEON).add_modifier(Modifier::BOLD),
    ))
    .block(block.clone());

    let (status, color) = match app.connected {
        Some(true) => ("STATUS: CONNECTED", NEON),
        Some(false) => ("STATUS: OFFLINE", Color::Red),
        None => ("STATUS: PROBING", DIM),
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(format!("{} ", app.base_url()), Style::default().fg(DIM)),
        Span::styled(status, Style::default().fg(color)),
    ]))
    .alignment(Alignment::Right)
    .block(block);

    frame.render_widget(title, area);
    frame.render_widget(status, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM));
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);

    // Measure with the same wrapping the paragraph renders with
    let chat = Paragraph::new(Text::from(chat_lines(&app.conversation, app.animation_frame)))
        .wrap(Wrap { trim: false });
    let total = u16::try_from(chat.line_count(inner_width)).unwrap_or(u16::MAX);
    let max_scroll = total.saturating_sub(inner_height);

    if app.follow_bottom || app.scroll >= max_scroll {
        app.scroll = max_scroll;
        app.follow_bottom = true;
    }

    let chat = chat.block(block).scroll((app.scroll, 0));
    frame.render_widget(chat, area);

    if max_scroll > 0 {
        let mut scrollbar_state = ScrollbarState::new(max_scroll as usize).position(app.scroll as usize);
        frame.render_stateful_widget(
            Scrollbar::new(ScrollbarOrientation::VerticalRight).style(Style::default().fg(DIM)),
            area,
            &mut scrollbar_state,
        );
    }
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(NEON));

    let prompt = Span::styled("> ", Style::default().fg(NEON).add_modifier(Modifier::BOLD));

    let text = if app.input.is_empty() {
        Text::from(Line::from(vec![
            prompt,
            Span::styled("ENTER_COMMAND...", Style::default().fg(DIM)),
        ]))
    } else {
        let lines: Vec<Line> = app
            .input
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                let lead = if i == 0 { prompt.clone() } else { Span::raw("  ") };
                Line::from(vec![lead, Span::styled(line.to_string(), Style::default().fg(NEON))])
            })
            .collect();
        Text::from(lines)
    };

    // Keep the cursor row visible once the input outgrows the box
    let (row, col) = cursor_row_col(&app.input, app.cursor);
    let visible_rows = area.height.saturating_sub(2);
    let input_scroll = row.saturating_add(1).saturating_sub(visible_rows);

    frame.render_widget(Paragraph::new(text).block(block).scroll((input_scroll, 0)), area);

    let x = area.x.saturating_add(3).saturating_add(col);
    let y = area.y.saturating_add(1).saturating_add(row).saturating_sub(input_scroll);
    if x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1) {
        frame.set_cursor_position((x, y));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Black).bg(Color::Red);
    let label_style = Style::default().fg(Color::Red);

    let mut hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(format!(" {} ", app.default_endpoint.display_name()), label_style),
    ];
    for (key, endpoint) in [(" ^E ", Endpoint::Chat), (" ^A ", Endpoint::Analyze)] {
        hints.push(Span::styled(key, key_style));
        hints.push(Span::styled(format!(" {} ", endpoint.display_name()), label_style));
    }
    hints.extend(vec![
        Span::styled(" Alt+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" PgUp/PgDn ", key_style),
        Span::styled(" scroll ", label_style),
        Span::styled(" Esc ", key_style),
        Span::styled(" quit ", label_style),
    ]);

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Every line of the chat window, including the processing indicator.
pub fn chat_lines(conversation: &Conversation, animation_frame: u8) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = conversation
        .messages()
        .iter()
        .flat_map(message_lines)
        .collect();

    if conversation.is_pending() {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat(animation_frame as usize + 1);
        lines.push(Line::from(Span::styled(
            format!("> PROCESSING DATA STREAM{}", dots),
            Style::default().fg(NEON).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Label, segmented body and trailing blank line for one message.
pub fn message_lines(message: &ChatMessage) -> Vec<Line<'static>> {
    let (label, text_style) = match message.role {
        ChatRole::User => ("> USER_01", Style::default().fg(Color::White)),
        ChatRole::Assistant => ("> AI_CORE", Style::default().fg(NEON)),
    };

    let mut lines = vec![Line::from(Span::styled(
        label,
        Style::default().fg(DIM).add_modifier(Modifier::BOLD),
    ))];

    for part in segment(&message.content) {
        match part.kind {
            SegmentKind::Text => {
                lines.extend(
                    part.value
                        .lines()
                        .map(|line| Line::from(Span::styled(line.to_string(), text_style))),
                );
            }
            SegmentKind::Code => {
                let frame_style = Style::default().fg(DIM);
                let code_style = Style::default().fg(Color::Gray);

                lines.push(Line::from(Span::styled("┌─ CODE_BLOCK ─────────", frame_style)));
                lines.extend(part.value.lines().map(|line| {
                    Line::from(vec![
                        Span::styled("│ ", frame_style),
                        Span::styled(line.to_string(), code_style),
                    ])
                }));
                lines.push(Line::from(Span::styled("└──────────────────────", frame_style)));
            }
        }
    }

    lines.push(Line::default());
    lines
}

/// Row and column of a char-indexed cursor within multi-line input,
/// saturating at `u16::MAX`.
fn cursor_row_col(input: &str, cursor: usize) -> (u16, u16) {
    let before: String = input.chars().take(cursor).collect();
    let row = before.matches('\n').count();
    let col = before.rsplit('\n').next().map(|s| s.chars().count()).unwrap_or(0);
    (
        u16::try_from(row).unwrap_or(u16::MAX),
        u16::try_from(col).unwrap_or(u16::MAX),
    )
}
