use std::{future::Future, io, ops::Range, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use gametracker_core::{
    config::AppConfig,
    library::{Library, LibrarySync, SyncEvent},
    models::{Game, GameStatus, Review},
    query::{QueryParams, ReviewFilter},
    stats::{
        derived::{GenreDistribution, Goal, LibraryCounters, ReviewSummary, StatusBreakdown},
        GameStats, ReviewStats,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{debug, error, info};

use crate::forms::{stars, FormOutcome, FormRow, GameForm, ReviewForm};

const TICK_RATE: Duration = Duration::from_millis(250);
const MENU_ITEMS: [&str; 6] = [
    "Library",
    "Reviews",
    "Statistics",
    "Add game",
    "Write review",
    "Quit",
];
const GENRES_SHOWN: usize = 8;
const BAR_WIDTH: usize = 20;

#[derive(Debug, Clone)]
struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl Theme {
    fn status_color(&self, status: GameStatus) -> Color {
        match status {
            GameStatus::Unplayed => self.muted,
            GameStatus::Playing => self.accent,
            GameStatus::Completed => self.success,
            GameStatus::Abandoned => self.danger,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Browse,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Library,
    Reviews,
    Stats,
}

#[derive(Debug, Clone)]
enum DeleteTarget {
    Game { id: String, title: String },
    Review { id: String, title: String },
}

impl DeleteTarget {
    fn title(&self) -> &str {
        match self {
            DeleteTarget::Game { title, .. } | DeleteTarget::Review { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone)]
enum Modal {
    Game(GameForm),
    Review(ReviewForm),
    Confirm(DeleteTarget),
}

enum AppEvent {
    Input(Event),
    Tick,
    Mutated(Result<String>),
    StatsLoaded(Result<(GameStats, ReviewStats)>),
}

/// High-level application state for the terminal front-end.
pub struct GameTrackerApp {
    config: AppConfig,
    library: Library,
    sync: LibrarySync,
    state: UiState,
    screen: Screen,
    modal: Option<Modal>,
    stats: Option<(GameStats, ReviewStats)>,
    pending_request: bool,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    sync_tx: Option<mpsc::Sender<SyncEvent>>,
    sync_rx: Option<mpsc::Receiver<SyncEvent>>,
    theme: Theme,
}

impl GameTrackerApp {
    pub fn new(config: AppConfig, library: Library, sync: LibrarySync) -> Self {
        let state = UiState::new(config.initial_query());
        Self {
            config,
            library,
            sync,
            state,
            screen: Screen::Menu,
            modal: None,
            stats: None,
            pending_request: false,
            event_tx: None,
            sync_tx: None,
            sync_rx: None,
            theme: Theme::default(),
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        self.state.refresh(&self.library);
        if self.library.fetched_at().is_some() {
            self.state.set_status(format!(
                "Loaded {} games and {} reviews",
                self.state.games.len(),
                self.library.reviews().len()
            ));
        }

        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let mut sync_rx = self.sync_rx.take();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            let mut sync_closed = false;
            if let Some(rx) = sync_rx.as_mut() {
                tokio::select! {
                    maybe_event = event_rx.recv() => {
                        if !self.process_app_event(maybe_event) {
                            break;
                        }
                    }
                    maybe_sync = rx.recv() => {
                        match maybe_sync {
                            Some(event) => self.handle_sync_event(event),
                            None => sync_closed = true,
                        }
                    }
                }
            } else {
                let maybe_event = event_rx.recv().await;
                if !self.process_app_event(maybe_event) {
                    break;
                }
            }
            if sync_closed {
                sync_rx = None;
            }

            if self.state.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    pub fn attach_sync(
        &mut self,
        sender: mpsc::Sender<SyncEvent>,
        receiver: mpsc::Receiver<SyncEvent>,
    ) {
        self.sync_tx = Some(sender);
        self.sync_rx = Some(receiver);
    }

    pub fn set_status(&mut self, message: String) {
        self.state.set_status(message);
    }

    fn handle_tick(&mut self) {
        if self.state.mode == Mode::Search {
            self.state
                .set_status(format!("Search: {}", self.state.query.search));
        }
    }

    fn handle_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Loaded {
                games,
                reviews,
                fetched_at,
            } => {
                info!(games = games.len(), reviews = reviews.len(), "Sync applied");
                self.library.replace(games, reviews, fetched_at);
                self.state.refresh(&self.library);
                if self.screen == Screen::Stats {
                    self.load_stats();
                }
                self.state.set_status(format!(
                    "Library refreshed at {}",
                    fetched_at.with_timezone(&Local).format("%H:%M:%S")
                ));
            }
            SyncEvent::Error(err) => {
                error!(?err, "Library sync failed");
                self.state.set_status(format!("Sync failed: {err:#}"));
            }
        }
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.state.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => {
                self.handle_tick();
                true
            }
            Some(AppEvent::Mutated(result)) => {
                self.pending_request = false;
                match result {
                    Ok(message) => {
                        info!(%message, "Change saved");
                        if matches!(self.modal, Some(Modal::Game(_)) | Some(Modal::Review(_))) {
                            self.modal = None;
                        }
                        self.state.set_status(message);
                        self.request_sync();
                    }
                    Err(err) => {
                        error!(?err, "Change rejected");
                        self.state.set_status(format!("Request failed: {err:#}"));
                    }
                }
                true
            }
            Some(AppEvent::StatsLoaded(result)) => {
                match result {
                    Ok(stats) => self.stats = Some(stats),
                    Err(err) => {
                        error!(?err, "Statistics unavailable");
                        self.state
                            .set_status(format!("Failed to load statistics: {err:#}"));
                    }
                }
                true
            }
            None => false,
        }
    }

    fn request_sync(&mut self) {
        let Some(sender) = self.sync_tx.clone() else {
            return;
        };
        let sync = self.sync.clone();
        spawn(async move {
            if let Err(err) = sync.run(sender).await {
                error!("Library sync task error: {err}");
            }
        });
    }

    fn load_stats(&mut self) {
        let Some(sender) = self.event_tx.clone() else {
            return;
        };
        let source = self.config.library.stats_source;
        let library = self.library.clone();
        let client = self.sync.client().clone();
        spawn(async move {
            let result = source.fetch_stats(&library, &client).await;
            if sender.send(AppEvent::StatsLoaded(result)).await.is_err() {
                debug!("UI closed before statistics arrived");
            }
        });
    }

    fn spawn_request<F>(&mut self, request: F)
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        let Some(sender) = self.event_tx.clone() else {
            return;
        };
        self.pending_request = true;
        spawn(async move {
            let result = request.await;
            if sender.send(AppEvent::Mutated(result)).await.is_err() {
                debug!("UI closed before request finished");
            }
        });
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Library => match self.state.mode {
                Mode::Search => self.handle_search_key(key),
                Mode::Browse => self.handle_library_key(key),
            },
            Screen::Reviews => self.handle_reviews_key(key),
            Screen::Stats => self.handle_stats_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.state.should_quit = true;
            }
            KeyCode::Char('j') | KeyCode::Down => self.state.move_menu_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_menu_cursor(-1),
            KeyCode::Enter => match self.state.menu_cursor {
                0 => {
                    self.screen = Screen::Library;
                    self.state.mode = Mode::Browse;
                    self.state
                        .set_status("/ search  s status  o sort  n new  e edit  d delete".into());
                }
                1 => {
                    self.screen = Screen::Reviews;
                    self.state
                        .set_status("g filter by game  n new  e edit  d delete".into());
                }
                2 => self.open_stats(),
                3 => self.open_game_form(None),
                4 => self.open_review_form(None),
                5 => self.state.should_quit = true,
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Esc => {
                let previous = std::mem::take(&mut self.state.search_before);
                self.state.query = self.state.query.with_search(previous);
                self.state.refresh(&self.library);
                self.state.mode = Mode::Browse;
                self.state.set_status("Search cancelled".to_string());
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Browse;
                self.state.set_status(format!(
                    "Search applied: {} ({} games)",
                    self.state.query.search,
                    self.state.games.len()
                ));
            }
            KeyCode::Backspace => {
                let mut search = self.state.query.search.clone();
                search.pop();
                self.state.query = self.state.query.with_search(search);
                self.state.refresh(&self.library);
            }
            KeyCode::Char(c) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    let search = format!("{}{c}", self.state.query.search);
                    self.state.query = self.state.query.with_search(search);
                    self.state.refresh(&self.library);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_library_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.state.games.len();
        let list = &mut self.state.game_list;
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Char('j') | KeyCode::Down => list.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => list.move_by(-1, len),
            KeyCode::Char('g') if key.modifiers.is_empty() => list.move_to(0, len),
            KeyCode::Char('G') => list.move_to_end(len),
            KeyCode::Home => list.move_to(0, len),
            KeyCode::End => list.move_to_end(len),
            KeyCode::PageDown => list.page(1, len),
            KeyCode::PageUp => list.page(-1, len),
            KeyCode::Char('/') => {
                self.state.search_before = self.state.query.search.clone();
                self.state.mode = Mode::Search;
                self.state.set_status("Enter search text".to_string());
            }
            KeyCode::Char('s') => {
                let status = self.state.query.status.next();
                self.state.query = self.state.query.with_status(status);
                self.state.refresh(&self.library);
                self.state.set_status(format!("Showing: {status}"));
            }
            KeyCode::Char('o') => {
                let sort = self.state.query.sort.next();
                self.state.query = self.state.query.with_sort(sort);
                self.state.refresh(&self.library);
                self.state.set_status(format!("Sorted by {}", sort.label()));
            }
            KeyCode::Char('n') => self.open_game_form(None),
            KeyCode::Char('e') => {
                if let Some(game) = self.state.current_game().cloned() {
                    self.open_game_form(Some(&game));
                }
            }
            KeyCode::Char('w') => {
                let selected = self.state.current_game().map(|game| game.id.clone());
                self.open_review_form(selected.as_deref());
            }
            KeyCode::Char('d') => {
                if let Some(game) = self.state.current_game() {
                    self.modal = Some(Modal::Confirm(DeleteTarget::Game {
                        id: game.id.clone(),
                        title: game.title.clone(),
                    }));
                }
            }
            KeyCode::Char('r') => {
                self.request_sync();
                self.state.set_status("Refreshing library".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_reviews_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = self.state.reviews.len();
        let list = &mut self.state.review_list;
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Char('j') | KeyCode::Down => list.move_by(1, len),
            KeyCode::Char('k') | KeyCode::Up => list.move_by(-1, len),
            KeyCode::Home => list.move_to(0, len),
            KeyCode::End => list.move_to_end(len),
            KeyCode::PageDown => list.page(1, len),
            KeyCode::PageUp => list.page(-1, len),
            KeyCode::Char('g') => {
                let games = self.library.games();
                self.state.review_filter = next_review_filter(&self.state.review_filter, &games);
                self.state.refresh(&self.library);
                let label = self.review_filter_label();
                self.state.set_status(format!("Reviews: {label}"));
            }
            KeyCode::Char('n') => {
                let selected = match &self.state.review_filter {
                    ReviewFilter::Game(id) => Some(id.clone()),
                    ReviewFilter::All => None,
                };
                self.open_review_form(selected.as_deref());
            }
            KeyCode::Char('e') => {
                if let Some(review) = self.state.current_review().cloned() {
                    let games = self.library.games();
                    self.modal = Some(Modal::Review(ReviewForm::edit(&games, &review)));
                }
            }
            KeyCode::Char('d') => {
                if let Some(review) = self.state.current_review() {
                    self.modal = Some(Modal::Confirm(DeleteTarget::Review {
                        id: review.id.clone(),
                        title: review.title.clone(),
                    }));
                }
            }
            KeyCode::Char('r') => {
                self.request_sync();
                self.state.set_status("Refreshing reviews".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_stats_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.state.should_quit = true,
            KeyCode::Esc => self.screen = Screen::Menu,
            KeyCode::Char('r') => {
                self.request_sync();
                self.load_stats();
                self.state.set_status("Refreshing statistics".to_string());
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(modal) = self.modal.as_mut() else {
            return Ok(());
        };
        match modal {
            Modal::Confirm(target) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let target = target.clone();
                    self.modal = None;
                    self.delete(target);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.modal = None;
                    self.state.set_status("Delete cancelled".to_string());
                }
                _ => {}
            },
            Modal::Game(form) => match form.handle_key(key) {
                FormOutcome::Continue => {}
                FormOutcome::Cancel => self.modal = None,
                FormOutcome::Submit => {
                    if self.pending_request {
                        return Ok(());
                    }
                    let Some(input) = form.submit(current_year()) else {
                        self.state
                            .set_status("Fix the highlighted fields".to_string());
                        return Ok(());
                    };
                    let editing = form.editing.clone();
                    let client = self.sync.client().clone();
                    self.spawn_request(async move {
                        match editing {
                            Some(id) => {
                                let game = client.update_game(&id, &input).await?;
                                Ok(format!("Updated {}", game.title))
                            }
                            None => {
                                let game = client.create_game(&input).await?;
                                Ok(format!("Added {}", game.title))
                            }
                        }
                    });
                }
            },
            Modal::Review(form) => match form.handle_key(key) {
                FormOutcome::Continue => {}
                FormOutcome::Cancel => self.modal = None,
                FormOutcome::Submit => {
                    if self.pending_request {
                        return Ok(());
                    }
                    let Some(input) = form.submit() else {
                        self.state
                            .set_status("Fix the highlighted fields".to_string());
                        return Ok(());
                    };
                    let editing = form.editing.clone();
                    let client = self.sync.client().clone();
                    self.spawn_request(async move {
                        match editing {
                            Some(id) => {
                                let review = client.update_review(&id, &input).await?;
                                Ok(format!("Updated review \"{}\"", review.title))
                            }
                            None => {
                                let review = client.create_review(&input).await?;
                                Ok(format!("Published review \"{}\"", review.title))
                            }
                        }
                    });
                }
            },
        }
        Ok(())
    }

    fn delete(&mut self, target: DeleteTarget) {
        let client = self.sync.client().clone();
        info!(title = target.title(), "Deleting");
        self.spawn_request(async move {
            match target {
                DeleteTarget::Game { id, title } => {
                    client.delete_game(&id).await?;
                    Ok(format!("Deleted {title}"))
                }
                DeleteTarget::Review { id, title } => {
                    client.delete_review(&id).await?;
                    Ok(format!("Deleted review \"{title}\""))
                }
            }
        });
    }

    fn open_stats(&mut self) {
        self.screen = Screen::Stats;
        self.stats = None;
        self.load_stats();
        self.state.set_status("r refresh  Esc back".to_string());
    }

    fn open_game_form(&mut self, game: Option<&Game>) {
        let form = match game {
            Some(game) => GameForm::edit(game),
            None => GameForm::new(current_year()),
        };
        self.modal = Some(Modal::Game(form));
    }

    fn open_review_form(&mut self, selected: Option<&str>) {
        let games = self.library.games();
        if games.is_empty() {
            self.state
                .set_status("Add a game before writing a review".to_string());
            return;
        }
        self.modal = Some(Modal::Review(ReviewForm::new(&games, selected)));
    }

    fn review_filter_label(&self) -> String {
        match &self.state.review_filter {
            ReviewFilter::All => "all games".to_string(),
            ReviewFilter::Game(id) => self
                .library
                .game_title(id)
                .unwrap_or_else(|| id.clone()),
        }
    }

    fn review_game_title(&self, review: &Review) -> String {
        review
            .game
            .title()
            .map(str::to_string)
            .or_else(|| self.library.game_title(review.game.id()))
            .unwrap_or_else(|| review.game.id().to_string())
    }

    fn draw(&mut self, frame: &mut Frame) {
        match self.screen {
            Screen::Menu => self.draw_menu(frame),
            Screen::Library => self.draw_library(frame),
            Screen::Reviews => self.draw_reviews(frame),
            Screen::Stats => self.draw_stats(frame),
        }
        match &self.modal {
            Some(Modal::Game(form)) => self.render_form(frame, &form.title(), &form.rows(), true),
            Some(Modal::Review(form)) => {
                self.render_form(frame, &form.title(), &form.rows(), false)
            }
            Some(Modal::Confirm(target)) => self.render_confirm(frame, target),
            None => {}
        }
    }

    fn draw_menu(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4.min(area.height)),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        let banner = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "G A M E T R A C K E R",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                self.sync.client().base_url().to_string(),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(banner, layout[0]);

        let menu_height = (MENU_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(layout[1].height);
        let menu_width = 30.min(layout[1].width.max(1));
        let menu_area = centered_rect(menu_width, menu_height, layout[1]);

        let menu_lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .flat_map(|(idx, item)| {
                let line = if idx == self.state.menu_cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                };
                [line, Line::from("")]
            })
            .collect();

        let menu = Paragraph::new(menu_lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
        self.render_status(frame, layout[2]);
    }

    fn draw_library(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_counters(frame, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);
        self.render_game_list(frame, body[0]);
        self.render_game_details(frame, body[1]);
        self.render_status(frame, chunks[2]);
    }

    fn draw_reviews(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(size);

        let summary = ReviewSummary::from_reviews(&self.state.reviews);
        let header = Paragraph::new(vec![
            Line::from(format!(
                "Reviews {}  Recommended {}  Mean {:.1}  Games reviewed {}",
                summary.total, summary.recommended, summary.mean_rating, summary.games_reviewed
            )),
            Line::from(Span::styled(
                format!("Showing: {}", self.review_filter_label()),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Reviews"));
        frame.render_widget(header, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[1]);
        self.render_review_list(frame, body[0]);
        self.render_review_details(frame, body[1]);
        self.render_status(frame, chunks[2]);
    }

    fn draw_stats(&mut self, frame: &mut Frame) {
        let size = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(8), Constraint::Length(3)])
            .split(size);
        self.render_status(frame, chunks[1]);

        let Some((games, reviews)) = &self.stats else {
            let paragraph = Paragraph::new("Loading statistics...")
                .block(Block::default().borders(Borders::ALL).title("Statistics"));
            frame.render_widget(paragraph, chunks[0]);
            return;
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(4)])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(8)])
            .split(columns[1]);

        self.render_collection_stats(frame, left[0], games);
        self.render_genre_stats(frame, left[1], games);
        self.render_review_stats(frame, right[0], reviews);
        self.render_goals(frame, right[1], games, reviews);
    }

    fn render_counters(&self, frame: &mut Frame, area: Rect) {
        let all = self.library.games();
        let counters = LibraryCounters::new(&all, &self.state.games);
        let query = &self.state.query;
        let search = if query.search.is_empty() {
            "-".to_string()
        } else {
            format!("\"{}\"", query.search)
        };
        let paragraph = Paragraph::new(vec![
            Line::from(format!(
                "Games {}  Completed {}  Hours {:.1}  Showing {}",
                counters.total, counters.completed, counters.total_hours, counters.filtered
            )),
            Line::from(Span::styled(
                format!(
                    "Status: {}  Sort: {}  Search: {search}",
                    query.status,
                    query.sort.label()
                ),
                Style::default().fg(self.theme.muted),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Library"));
        frame.render_widget(paragraph, area);
    }

    fn render_game_list(&mut self, frame: &mut Frame, area: Rect) {
        let len = self.state.games.len();
        let list = &mut self.state.game_list;
        list.height = area.height.saturating_sub(2) as usize;
        list.clamp(len);
        list.ensure_visible(len);
        let range = list.visible(len);
        let offset = list.offset;
        let cursor = list.cursor;

        let mut list_state = ListState::default();
        if !range.is_empty() {
            list_state.select(Some(cursor.saturating_sub(offset)));
        }
        let items: Vec<ListItem> = self.state.games[range]
            .iter()
            .enumerate()
            .map(|(idx, game)| {
                let marker = if offset + idx == cursor {
                    Span::styled(
                        "▶ ",
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    Span::raw("  ")
                };
                ListItem::new(Line::from(vec![
                    marker,
                    Span::styled(
                        game.title.clone(),
                        Style::default()
                            .fg(self.theme.primary_fg)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}", game.status.label()),
                        Style::default().fg(self.theme.status_color(game.status)),
                    ),
                    Span::styled(
                        format!(" · {:.1}h", game.hours_played),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let title = if self.state.mode == Mode::Search {
            format!("Games (search: {})", self.state.query.search)
        } else {
            "Games".to_string()
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_game_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Game Details");
        let Some(game) = self.state.current_game() else {
            let message = if self.library.games().is_empty() {
                "No games yet. Press n to add one."
            } else {
                "No games match the current filters"
            };
            frame.render_widget(Paragraph::new(message).block(block), area);
            return;
        };

        let mut lines = vec![
            Line::from(Span::styled(
                game.display_name(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                game.developer.clone(),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(format!("Genre: {}", game.genre)),
            Line::from(format!("Platform: {}", game.platform)),
            Line::from(vec![
                Span::raw("Status: "),
                Span::styled(
                    game.status.label(),
                    Style::default().fg(self.theme.status_color(game.status)),
                ),
            ]),
        ];
        if game.is_rated() {
            lines.push(Line::from(vec![
                Span::raw("Rating: "),
                Span::styled(stars(game.rating), Style::default().fg(self.theme.warning)),
            ]));
        }
        lines.push(Line::from(format!("Hours played: {:.1}", game.hours_played)));
        if let Some(started) = game.started_at {
            lines.push(Line::from(format!("Started: {}", started.format("%Y-%m-%d"))));
        }
        if let Some(finished) = game.finished_at {
            lines.push(Line::from(format!("Finished: {}", finished.format("%Y-%m-%d"))));
        }
        lines.push(Line::from(format!(
            "Added: {}",
            game.added_at.with_timezone(&Local).format("%Y-%m-%d")
        )));
        if let Some(url) = &game.cover_url {
            lines.push(Line::from(format!("Cover: {url}")));
        }
        let review_count = self
            .library
            .reviews_matching(&ReviewFilter::Game(game.id.clone()))
            .len();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{review_count} review(s)  ·  e edit  w review  d delete"),
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_review_list(&mut self, frame: &mut Frame, area: Rect) {
        let len = self.state.reviews.len();
        let list = &mut self.state.review_list;
        list.height = area.height.saturating_sub(2) as usize;
        list.clamp(len);
        list.ensure_visible(len);
        let range = list.visible(len);
        let offset = list.offset;
        let cursor = list.cursor;

        let mut list_state = ListState::default();
        if !range.is_empty() {
            list_state.select(Some(cursor.saturating_sub(offset)));
        }
        let items: Vec<ListItem> = self.state.reviews[range]
            .iter()
            .enumerate()
            .map(|(idx, review)| {
                let marker = if offset + idx == cursor { "▶ " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, Style::default().fg(self.theme.accent)),
                    Span::styled(
                        stars(review.rating),
                        Style::default().fg(self.theme.warning),
                    ),
                    Span::raw(" "),
                    Span::styled(
                        review.title.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!(" · {}", self.review_game_title(review)),
                        Style::default().fg(self.theme.muted),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Reviews"))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_review_details(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Review");
        let Some(review) = self.state.current_review() else {
            frame.render_widget(Paragraph::new("No reviews to show").block(block), area);
            return;
        };

        let (verdict, color) = if review.recommended {
            ("Recommended", self.theme.success)
        } else {
            ("Not recommended", self.theme.danger)
        };
        let mut lines = vec![
            Line::from(Span::styled(
                review.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                self.review_game_title(review),
                Style::default().fg(self.theme.muted),
            )),
            Line::from(vec![
                Span::styled(stars(review.rating), Style::default().fg(self.theme.warning)),
                Span::raw("  "),
                Span::styled(verdict, Style::default().fg(color)),
            ]),
            Line::from(format!("Hours when reviewed: {:.1}", review.hours_played)),
        ];
        if let Some(date) = review.reviewed_at() {
            lines.push(Line::from(format!(
                "Written: {}",
                date.with_timezone(&Local).format("%Y-%m-%d")
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(review.body.clone()));
        if !review.pros.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Pros",
                Style::default().fg(self.theme.success),
            )));
            lines.extend(review.pros.iter().map(|pro| Line::from(format!("+ {pro}"))));
        }
        if !review.cons.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Cons",
                Style::default().fg(self.theme.danger),
            )));
            lines.extend(review.cons.iter().map(|con| Line::from(format!("- {con}"))));
        }

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_collection_stats(&self, frame: &mut Frame, area: Rect, stats: &GameStats) {
        let breakdown = StatusBreakdown::from_stats(stats);
        let portion_line = |label: &str, count: usize, percent: f64, color: Color| {
            Line::from(vec![
                Span::raw(format!("{label:<10}")),
                Span::styled(format!("{count:>4}"), Style::default().fg(color)),
                Span::styled(
                    format!("  {percent:>5.1}%"),
                    Style::default().fg(self.theme.muted),
                ),
            ])
        };
        let most_played = stats
            .most_played
            .as_ref()
            .map_or_else(|| "-".to_string(), |game| {
                format!("{} ({:.1}h)", game.title, game.hours_played)
            });
        let lines = vec![
            Line::from(format!("Games: {}", stats.total)),
            portion_line(
                "Completed",
                breakdown.completed.count,
                breakdown.completed.percent,
                self.theme.success,
            ),
            portion_line(
                "Playing",
                breakdown.playing.count,
                breakdown.playing.percent,
                self.theme.accent,
            ),
            portion_line(
                "Other",
                breakdown.remaining.count,
                breakdown.remaining.percent,
                self.theme.muted,
            ),
            Line::from(format!("Total hours: {:.1}", stats.total_hours)),
            Line::from(format!("Most played: {most_played}")),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Collection"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_genre_stats(&self, frame: &mut Frame, area: Rect, stats: &GameStats) {
        let distribution = GenreDistribution::from_stats(stats, GENRES_SHOWN);
        let mut lines: Vec<Line> = distribution
            .shown
            .iter()
            .map(|share| {
                Line::from(vec![
                    Span::raw(format!("{:<14}", share.genre.to_string())),
                    Span::styled(
                        bar(share.portion.percent / 100.0, BAR_WIDTH),
                        Style::default().fg(self.theme.accent),
                    ),
                    Span::raw(format!(
                        " {:>3} ({:.0}%)",
                        share.portion.count, share.portion.percent
                    )),
                ])
            })
            .collect();
        if distribution.hidden > 0 {
            lines.push(Line::from(Span::styled(
                format!("+ {} more", distribution.hidden),
                Style::default().fg(self.theme.muted),
            )));
        }
        if lines.is_empty() {
            lines.push(Line::from("No games yet"));
        }
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Genres"));
        frame.render_widget(paragraph, area);
    }

    fn render_review_stats(&self, frame: &mut Frame, area: Rect, stats: &ReviewStats) {
        let mut lines = vec![
            Line::from(format!("Reviews written: {}", stats.total)),
            Line::from(format!("Mean rating: {:.1}", stats.mean_rating)),
            Line::from(""),
            Line::from(Span::styled(
                "Best rated",
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ];
        if stats.top_games.is_empty() {
            lines.push(Line::from(Span::styled(
                "No reviews yet",
                Style::default().fg(self.theme.muted),
            )));
        }
        lines.extend(stats.top_games.iter().enumerate().map(|(idx, rated)| {
            Line::from(vec![
                Span::raw(format!("{}. {}", idx + 1, rated.title)),
                Span::styled(
                    format!("  {:.1}", rated.mean_rating),
                    Style::default().fg(self.theme.warning),
                ),
            ])
        }));
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Reviews"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_goals(&self, frame: &mut Frame, area: Rect, games: &GameStats, reviews: &ReviewStats) {
        let lines: Vec<Line> = Goal::defaults(games, reviews)
            .iter()
            .flat_map(|goal| {
                let color = if goal.is_reached() {
                    self.theme.success
                } else {
                    self.theme.accent
                };
                [
                    Line::from(goal.label),
                    Line::from(vec![
                        Span::styled(bar(goal.fraction(), BAR_WIDTH), Style::default().fg(color)),
                        Span::styled(
                            format!(" {:.0}/{:.0} {}", goal.current, goal.target, goal.unit),
                            Style::default().fg(self.theme.muted),
                        ),
                    ]),
                ]
            })
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Goals"));
        frame.render_widget(paragraph, area);
    }

    fn render_form(&self, frame: &mut Frame, title: &str, rows: &[FormRow], game: bool) {
        let frame_area = frame.size();
        let width = 72.min(frame_area.width.saturating_sub(4)).max(24);
        let extra = rows.iter().filter(|row| row.error.is_some()).count() as u16;
        let height = (rows.len() as u16 + extra + 4).min(frame_area.height.saturating_sub(2));
        let area = centered_rect(width, height, frame_area);
        frame.render_widget(Clear, area);

        let mut lines = Vec::new();
        for row in rows {
            let label_style = if row.focused {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            let value = if row.choice {
                format!("◀ {} ▶", row.value)
            } else if row.focused {
                format!("{}_", row.value)
            } else {
                row.value.clone()
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{:<22}", row.label), label_style),
                Span::raw(value),
            ]));
            if let Some(error) = &row.error {
                lines.push(Line::from(Span::styled(
                    format!("{:<22}{error}", ""),
                    Style::default().fg(self.theme.danger),
                )));
            }
        }
        let hint = if game {
            "Tab next  ←/→ choose  Enter save  Esc cancel"
        } else {
            "Tab next  ←/→ choose  Ctrl-A add point  Ctrl-D remove  Enter publish  Esc cancel"
        };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            hint,
            Style::default().fg(self.theme.muted),
        )));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_confirm(&self, frame: &mut Frame, target: &DeleteTarget) {
        let area = centered_rect(50, 6, frame.size());
        frame.render_widget(Clear, area);
        let what = match target {
            DeleteTarget::Game { .. } => "game",
            DeleteTarget::Review { .. } => "review",
        };
        let paragraph = Paragraph::new(vec![
            Line::from(format!("Delete {what} \"{}\"?", target.title())),
            Line::from(""),
            Line::from(vec![
                Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" delete  "),
                Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(" keep"),
            ]),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Confirm")
                .border_style(Style::default().fg(self.theme.danger)),
        )
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.mode == Mode::Search && self.screen == Screen::Library {
            format!("Search: {}", self.state.query.search)
        } else if self.pending_request {
            format!("{} (working...)", self.state.status)
        } else {
            self.state.status.clone()
        };
        let paragraph = Paragraph::new(Line::from(primary))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

/// Cursor and scroll offset of a list view.
#[derive(Debug, Clone, Copy)]
struct ListCursor {
    cursor: usize,
    offset: usize,
    height: usize,
}

impl Default for ListCursor {
    fn default() -> Self {
        Self {
            cursor: 0,
            offset: 0,
            height: 1,
        }
    }
}

impl ListCursor {
    fn move_by(&mut self, delta: isize, len: usize) {
        if len == 0 {
            return;
        }
        let idx = (self.cursor as isize + delta).clamp(0, len as isize - 1);
        self.cursor = idx as usize;
        self.ensure_visible(len);
    }

    fn move_to(&mut self, index: usize, len: usize) {
        if len == 0 {
            return;
        }
        self.cursor = index.min(len - 1);
        self.ensure_visible(len);
    }

    fn move_to_end(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        self.move_to(len - 1, len);
    }

    fn page(&mut self, direction: isize, len: usize) {
        if len == 0 || self.height == 0 {
            return;
        }
        let delta = self.height.min(len) as isize;
        self.move_by(direction * delta, len);
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
            self.offset = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn ensure_visible(&mut self, len: usize) {
        if len == 0 || self.height == 0 {
            self.offset = 0;
            return;
        }
        let height = self.height;
        let max_offset = len.saturating_sub(height);

        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + height {
            self.offset = self.cursor + 1 - height;
        }

        if self.offset > max_offset {
            self.offset = max_offset;
        }
    }

    fn visible(&self, len: usize) -> Range<usize> {
        let start = self.offset.min(len);
        start..(start + self.height).min(len)
    }
}

struct UiState {
    query: QueryParams,
    search_before: String,
    games: Vec<Game>,
    game_list: ListCursor,
    review_filter: ReviewFilter,
    reviews: Vec<Review>,
    review_list: ListCursor,
    status: String,
    mode: Mode,
    should_quit: bool,
    menu_cursor: usize,
}

impl UiState {
    fn new(query: QueryParams) -> Self {
        Self {
            query,
            search_before: String::new(),
            games: Vec::new(),
            game_list: ListCursor::default(),
            review_filter: ReviewFilter::All,
            reviews: Vec::new(),
            review_list: ListCursor::default(),
            status: "Ready".to_string(),
            mode: Mode::Browse,
            should_quit: false,
            menu_cursor: 0,
        }
    }

    /// Re-run the current queries, keeping the selected records when they
    /// are still visible.
    fn refresh(&mut self, library: &Library) {
        let selected_game = self.current_game().map(|game| game.id.clone());
        self.games = library.query(&self.query);
        select_by_id(&mut self.game_list, &self.games, selected_game, |game| &game.id);

        if let ReviewFilter::Game(id) = &self.review_filter {
            if library.game(id).is_none() {
                self.review_filter = ReviewFilter::All;
            }
        }
        let selected_review = self.current_review().map(|review| review.id.clone());
        self.reviews = library.reviews_matching(&self.review_filter);
        select_by_id(&mut self.review_list, &self.reviews, selected_review, |review| {
            &review.id
        });
    }

    fn current_game(&self) -> Option<&Game> {
        self.games.get(self.game_list.cursor)
    }

    fn current_review(&self) -> Option<&Review> {
        self.reviews.get(self.review_list.cursor)
    }

    fn set_status(&mut self, message: String) {
        self.status = message;
    }

    fn move_menu_cursor(&mut self, delta: isize) {
        let options = MENU_ITEMS.len() as isize;
        self.menu_cursor = (self.menu_cursor as isize + delta).clamp(0, options - 1) as usize;
    }
}

fn select_by_id<T>(
    list: &mut ListCursor,
    items: &[T],
    selected: Option<String>,
    id: impl Fn(&T) -> &String,
) {
    match selected.and_then(|wanted| items.iter().position(|item| *id(item) == wanted)) {
        Some(pos) => list.move_to(pos, items.len()),
        None => {
            list.cursor = 0;
            list.offset = 0;
        }
    }
}

/// Cycle the review filter through every game in library order, then back
/// to all reviews.
fn next_review_filter(current: &ReviewFilter, games: &[Game]) -> ReviewFilter {
    let next = match current {
        ReviewFilter::All => games.first(),
        ReviewFilter::Game(id) => games
            .iter()
            .position(|game| game.id == *id)
            .and_then(|pos| games.get(pos + 1)),
    };
    next.map_or(ReviewFilter::All, |game| ReviewFilter::Game(game.id.clone()))
}

fn current_year() -> i32 {
    Local::now().year()
}

fn bar(fraction: f64, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
