pub mod render;
pub mod state;

use anyhow::Result;
use classfeed::classroom::ClassroomApi;
use classfeed::config::Config;
use classfeed::engine::feed::FeedEngine;
use classfeed::members::MemberDirectory;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use state::{AppState, InputMode, InputState, MemberRow, View};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

/// Run the terminal shell. Owns the draw/poll loop; every state change goes
/// through the engine's operations.
pub async fn run(
    engine: &mut FeedEngine,
    api: Arc<dyn ClassroomApi>,
    config: &Config,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = ui_loop(&mut terminal, engine, api, config).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn ui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    engine: &mut FeedEngine,
    api: Arc<dyn ClassroomApi>,
    config: &Config,
) -> Result<()> {
    let mut state = AppState::new(engine.me_display_name(), config.members.default_year);
    state.set_posts(engine.items().to_vec());
    if let Some(err) = engine.last_sync_error() {
        state.status = format!("error: {err}");
    }
    let mut directory = reload_members(api.as_ref(), &mut state).await;

    loop {
        terminal.draw(|f| render::draw(f, &state))?;

        // Poll for keyboard events with 100ms timeout
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if state.input.is_some() {
            handle_input_key(key.code, &mut state, engine).await;
            continue;
        }

        match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Tab => {
                state.view = match state.view {
                    View::Feed => View::Members,
                    View::Members => View::Feed,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => state.select_prev(),
            KeyCode::Char('r') => {
                match engine.load_feed().await {
                    Ok(()) => state.status = "feed refreshed".to_string(),
                    Err(err) => {
                        state.status = format!("error: {err}");
                        state.push_log("warn", format!("feed refresh failed: {err}"));
                    }
                }
                state.set_posts(engine.items().to_vec());
                directory = reload_members(api.as_ref(), &mut state).await;
            }
            KeyCode::Char('l') if state.view == View::Feed => {
                let Some(id) = state.selected_post().map(|p| p.id.clone()) else {
                    continue;
                };
                match engine.toggle_like(&id).await {
                    Ok(()) => {
                        state.status.clear();
                        state.push_log("info", format!("toggled like on {id}"));
                    }
                    Err(err) => {
                        state.status = format!("error: {err}");
                        state.push_log("warn", format!("like failed on {id}: {err}"));
                    }
                }
                state.set_posts(engine.items().to_vec());
            }
            KeyCode::Char('c') if state.view == View::Feed => {
                if let Some(post_id) = state.selected_post().map(|p| p.id.clone()) {
                    state.input = Some(InputState {
                        mode: InputMode::Comment { post_id },
                        buffer: String::new(),
                    });
                }
            }
            KeyCode::Char('p') if state.view == View::Feed => {
                state.input = Some(InputState {
                    mode: InputMode::Compose,
                    buffer: String::new(),
                });
            }
            KeyCode::Char('[') if state.view == View::Members => {
                state.cycle_year(false);
                apply_directory(&mut state, &directory);
            }
            KeyCode::Char(']') if state.view == View::Members => {
                state.cycle_year(true);
                apply_directory(&mut state, &directory);
            }
            KeyCode::Char('y') if state.view == View::Members => {
                directory.cycle_year_key();
                apply_directory(&mut state, &directory);
            }
            _ => {}
        }
    }
}

/// Text-entry handling for the compose and comment inputs. On failure the
/// buffer is restored so nothing the user typed is lost.
async fn handle_input_key(code: KeyCode, state: &mut AppState, engine: &mut FeedEngine) {
    match code {
        KeyCode::Esc => state.input = None,
        KeyCode::Backspace => {
            if let Some(input) = &mut state.input {
                input.buffer.pop();
            }
        }
        KeyCode::Char(c) => {
            if let Some(input) = &mut state.input {
                input.buffer.push(c);
            }
        }
        KeyCode::Enter => {
            let Some(input) = state.input.take() else {
                return;
            };
            let text = input.buffer.clone();
            let result = match &input.mode {
                InputMode::Compose => engine.post_status(&text).await,
                InputMode::Comment { post_id } => engine.add_comment(post_id, &text).await,
            };
            match result {
                Ok(()) => {
                    state.status = match input.mode {
                        InputMode::Compose => "status posted".to_string(),
                        InputMode::Comment { .. } => "comment sent".to_string(),
                    };
                }
                Err(err) => {
                    state.status = format!("error: {err}");
                    state.push_log("warn", format!("submit failed: {err}"));
                    state.input = Some(input);
                }
            }
            if let Some(err) = engine.last_sync_error() {
                state.status = format!("error: {err}");
            }
            state.set_posts(engine.items().to_vec());
        }
        _ => {}
    }
}

async fn reload_members(api: &dyn ClassroomApi, state: &mut AppState) -> MemberDirectory {
    let year = u16::try_from(state.year).ok();
    match api.fetch_members(year).await {
        Ok(records) => {
            let directory = MemberDirectory::from_records(records);
            apply_directory(state, &directory);
            directory
        }
        Err(err) => {
            state.status = format!("error: {err}");
            state.push_log("warn", format!("member fetch failed: {err}"));
            MemberDirectory::default()
        }
    }
}

/// Refilter the roster into display rows after any year/key change.
fn apply_directory(state: &mut AppState, directory: &MemberDirectory) {
    state.year_key = directory.year_key().map(str::to_string);
    state.years = directory.existing_years();
    state.roster_size = directory.len();
    state.members = directory
        .filtered(state.year)
        .into_iter()
        .map(|m| MemberRow {
            name: m.name.clone(),
            student_id: m.student_id.clone(),
            year: directory.year_key().and_then(|key| m.year_at(key)),
        })
        .collect();
}
