use classfeed::engine::post::Post;
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Feed,
    Members,
}

/// What the text input at the bottom is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputMode {
    Compose,
    Comment { post_id: String },
}

#[derive(Debug, Clone)]
pub struct InputState {
    pub mode: InputMode,
    pub buffer: String,
}

#[derive(Debug, Clone)]
pub struct MemberRow {
    pub name: String,
    pub student_id: String,
    pub year: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

pub struct AppState {
    pub view: View,
    pub user: String,
    pub posts: Vec<Post>,
    pub selected: usize,
    pub members: Vec<MemberRow>,
    pub roster_size: usize,
    pub year: i64,
    pub years: Vec<i64>,
    pub year_key: Option<String>,
    pub input: Option<InputState>,
    /// One-line status/error banner under the main pane.
    pub status: String,
    pub logs: VecDeque<LogEntry>,
}

impl AppState {
    pub fn new(user: String, year: i64) -> Self {
        Self {
            view: View::Feed,
            user,
            posts: Vec::new(),
            selected: 0,
            members: Vec::new(),
            roster_size: 0,
            year,
            years: Vec::new(),
            year_key: None,
            input: None,
            status: String::new(),
            logs: VecDeque::with_capacity(200),
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= 200 {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn selected_post(&self) -> Option<&Post> {
        self.posts.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.posts.is_empty() {
            self.selected = (self.selected + 1).min(self.posts.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Keep the selection valid after the post list is replaced.
    pub fn set_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        if self.selected >= self.posts.len() {
            self.selected = self.posts.len().saturating_sub(1);
        }
    }

    pub fn cycle_year(&mut self, forward: bool) {
        if self.years.is_empty() {
            return;
        }
        let pos = self.years.iter().position(|y| *y == self.year);
        let next = match (pos, forward) {
            (Some(i), true) => (i + 1) % self.years.len(),
            (Some(i), false) => (i + self.years.len() - 1) % self.years.len(),
            (None, _) => 0,
        };
        self.year = self.years[next];
    }
}
