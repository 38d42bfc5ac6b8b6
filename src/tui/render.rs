use super::state::{AppState, InputMode, View};
use classfeed::engine::post::Post;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, state: &AppState) {
    let input_height = if state.input.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(input_height),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0]);
    match state.view {
        View::Feed => draw_feed(f, state, chunks[1]),
        View::Members => draw_members(f, state, chunks[1]),
    }
    if state.input.is_some() {
        draw_input(f, state, chunks[2]);
    }
    draw_status(f, state, chunks[3]);
    draw_footer(f, state, chunks[4]);
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let tab = |label: &str, active: bool| {
        if active {
            Span::styled(
                format!(" {label} "),
                Style::default().fg(Color::Black).bg(Color::Cyan),
            )
        } else {
            Span::styled(format!(" {label} "), Style::default().fg(Color::DarkGray))
        }
    };

    let line = Line::from(vec![
        Span::styled(
            " classfeed ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        tab("Feed", state.view == View::Feed),
        tab("Members", state.view == View::Members),
        Span::raw("  "),
        Span::styled(
            format!("👤 {}", state.user),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let block = Block::default().borders(Borders::ALL);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn post_lines(post: &Post) -> ListItem<'_> {
    let like_style = if post.liked_by_me {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let head = Line::from(vec![
        Span::styled(
            post.author.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("👍 {}", post.like_count), like_style),
        Span::styled(
            if post.liked_by_me { " [liked]" } else { "" },
            like_style,
        ),
        Span::styled(
            format!("  ({} comments)", post.comments.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let body = Line::from(Span::raw(format!("  {}", post.body)));
    ListItem::new(vec![head, body])
}

fn draw_feed(f: &mut Frame, state: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<ListItem> = state.posts.iter().map(post_lines).collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Feed "))
        .highlight_style(Style::default().bg(Color::Rgb(40, 44, 52)))
        .highlight_symbol("> ");
    let mut list_state = ListState::default();
    if !state.posts.is_empty() {
        list_state.select(Some(state.selected));
    }
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    let mut lines: Vec<Line> = Vec::new();
    if let Some(post) = state.selected_post() {
        for comment in &post.comments {
            let mut spans = vec![
                Span::styled(
                    format!("{}: ", comment.author),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(comment.body.clone()),
            ];
            if comment.pending {
                spans.push(Span::styled(
                    "  (sending…)",
                    Style::default().fg(Color::Yellow),
                ));
            }
            lines.push(Line::from(spans));
        }
        if post.comments.is_empty() {
            lines.push(Line::from(Span::styled(
                "no comments yet",
                Style::default().fg(Color::DarkGray),
            )));
        }
    }
    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Comments "));
    f.render_widget(detail, chunks[1]);
}

fn draw_members(f: &mut Frame, state: &AppState, area: Rect) {
    let year_key = state.year_key.as_deref().unwrap_or("(no year key found)");
    let title = format!(
        " Members — year {} via {} — {}/{} shown ",
        state.year,
        year_key,
        state.members.len(),
        state.roster_size
    );

    let header = Row::new(vec!["Name", "Student ID", "Year"]).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = state
        .members
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.name.clone()),
                Cell::from(m.student_id.clone()),
                Cell::from(
                    m.year
                        .map(|y| y.to_string())
                        .unwrap_or_else(|| "—".to_string()),
                ),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(30),
            Constraint::Percentage(20),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn draw_input(f: &mut Frame, state: &AppState, area: Rect) {
    let Some(input) = &state.input else { return };
    let title = match &input.mode {
        InputMode::Compose => " New status (Enter to post, Esc to cancel) ".to_string(),
        InputMode::Comment { .. } => " Comment (Enter to send, Esc to cancel) ".to_string(),
    };
    let widget = Paragraph::new(input.buffer.as_str())
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, state: &AppState, area: Rect) {
    let style = if state.status.starts_with("error") {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    f.render_widget(
        Paragraph::new(Span::styled(format!(" {}", state.status), style)),
        area,
    );
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let keys = match state.view {
        View::Feed => " q quit | Tab members | j/k select | l like | c comment | p post | r refresh ",
        View::Members => " q quit | Tab feed | [/] year | y year key | r refresh ",
    };
    f.render_widget(
        Paragraph::new(Span::styled(keys, Style::default().fg(Color::DarkGray))),
        area,
    );
}
