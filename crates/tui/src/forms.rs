use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gametracker_core::{
    form::{GameDraft, ReviewDraft, ValidationErrors},
    models::{Game, GameInput, GameStatus, Genre, Platform, Review, ReviewInput, MAX_RATING},
};

/// What the app should do after a form consumed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormOutcome {
    Continue,
    Cancel,
    Submit,
}

/// One rendered line of a form.
#[derive(Debug, Clone)]
pub struct FormRow {
    pub label: String,
    pub value: String,
    pub error: Option<String>,
    pub focused: bool,
    pub choice: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameField {
    Title,
    Developer,
    Genre,
    Platform,
    ReleaseYear,
    CoverUrl,
    Status,
    Rating,
    Hours,
    StartedOn,
    FinishedOn,
}

impl GameField {
    const ALL: [GameField; 11] = [
        GameField::Title,
        GameField::Developer,
        GameField::Genre,
        GameField::Platform,
        GameField::ReleaseYear,
        GameField::CoverUrl,
        GameField::Status,
        GameField::Rating,
        GameField::Hours,
        GameField::StartedOn,
        GameField::FinishedOn,
    ];

    fn label(self) -> &'static str {
        match self {
            GameField::Title => "Title",
            GameField::Developer => "Developer",
            GameField::Genre => "Genre",
            GameField::Platform => "Platform",
            GameField::ReleaseYear => "Release year",
            GameField::CoverUrl => "Cover URL",
            GameField::Status => "Status",
            GameField::Rating => "Rating",
            GameField::Hours => "Hours played",
            GameField::StartedOn => "Started (YYYY-MM-DD)",
            GameField::FinishedOn => "Finished (YYYY-MM-DD)",
        }
    }

    fn error_key(self) -> &'static str {
        match self {
            GameField::Title => "title",
            GameField::Developer => "developer",
            GameField::Genre => "genre",
            GameField::Platform => "platform",
            GameField::ReleaseYear => "release_year",
            GameField::CoverUrl => "cover_url",
            GameField::Status => "status",
            GameField::Rating => "rating",
            GameField::Hours => "hours_played",
            GameField::StartedOn => "started_on",
            GameField::FinishedOn => "finished_on",
        }
    }

    fn is_choice(self) -> bool {
        matches!(
            self,
            GameField::Genre | GameField::Platform | GameField::Status | GameField::Rating
        )
    }
}

/// Modal state for adding or editing a game.
#[derive(Debug, Clone)]
pub struct GameForm {
    pub editing: Option<String>,
    pub draft: GameDraft,
    pub errors: ValidationErrors,
    field: usize,
}

impl GameForm {
    pub fn new(current_year: i32) -> Self {
        Self {
            editing: None,
            draft: GameDraft::new(current_year),
            errors: ValidationErrors::default(),
            field: 0,
        }
    }

    pub fn edit(game: &Game) -> Self {
        Self {
            editing: Some(game.id.clone()),
            draft: GameDraft::from_game(game),
            errors: ValidationErrors::default(),
            field: 0,
        }
    }

    pub fn title(&self) -> String {
        match &self.editing {
            Some(_) => format!("Edit game - {}", self.draft.title.trim()),
            None => "Add game".to_string(),
        }
    }

    fn focused(&self) -> GameField {
        GameField::ALL[self.field.min(GameField::ALL.len() - 1)]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Enter => return FormOutcome::Submit,
            KeyCode::Tab | KeyCode::Down => self.field = step(self.field, 1, GameField::ALL.len()),
            KeyCode::BackTab | KeyCode::Up => {
                self.field = step(self.field, -1, GameField::ALL.len())
            }
            KeyCode::Left => self.cycle(-1),
            KeyCode::Right => self.cycle(1),
            KeyCode::Backspace => {
                if let Some(text) = self.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(ch) if is_plain(&key) => {
                if let Some(text) = self.text_mut() {
                    text.push(ch);
                }
            }
            _ => {}
        }
        FormOutcome::Continue
    }

    /// Validate the draft, keeping field errors for display on failure.
    pub fn submit(&mut self, current_year: i32) -> Option<GameInput> {
        match self.draft.validate(current_year) {
            Ok(input) => {
                self.errors = ValidationErrors::default();
                Some(input)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    pub fn rows(&self) -> Vec<FormRow> {
        let focused = self.focused();
        GameField::ALL
            .iter()
            .map(|&field| FormRow {
                label: field.label().to_string(),
                value: self.value(field),
                error: self.errors.get(field.error_key()).map(str::to_string),
                focused: field == focused,
                choice: field.is_choice(),
            })
            .collect()
    }

    fn value(&self, field: GameField) -> String {
        let draft = &self.draft;
        match field {
            GameField::Title => draft.title.clone(),
            GameField::Developer => draft.developer.clone(),
            GameField::Genre => draft
                .genre
                .as_ref()
                .map_or_else(|| "(choose)".to_string(), ToString::to_string),
            GameField::Platform => draft
                .platform
                .as_ref()
                .map_or_else(|| "(choose)".to_string(), ToString::to_string),
            GameField::ReleaseYear => draft.release_year.clone(),
            GameField::CoverUrl => draft.cover_url.clone(),
            GameField::Status => draft.status.label().to_string(),
            GameField::Rating => stars(draft.rating),
            GameField::Hours => draft.hours_played.clone(),
            GameField::StartedOn => draft.started_on.clone(),
            GameField::FinishedOn => draft.finished_on.clone(),
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        let field = self.focused();
        let draft = &mut self.draft;
        match field {
            GameField::Title => Some(&mut draft.title),
            GameField::Developer => Some(&mut draft.developer),
            GameField::ReleaseYear => Some(&mut draft.release_year),
            GameField::CoverUrl => Some(&mut draft.cover_url),
            GameField::Hours => Some(&mut draft.hours_played),
            GameField::StartedOn => Some(&mut draft.started_on),
            GameField::FinishedOn => Some(&mut draft.finished_on),
            GameField::Genre | GameField::Platform | GameField::Status | GameField::Rating => None,
        }
    }

    fn cycle(&mut self, delta: isize) {
        let field = self.focused();
        let draft = &mut self.draft;
        match field {
            GameField::Genre => {
                let options: Vec<Option<Genre>> = std::iter::once(None)
                    .chain(Genre::KNOWN.iter().cloned().map(Some))
                    .collect();
                draft.genre = cycle(&options, &draft.genre, delta);
            }
            GameField::Platform => {
                let options: Vec<Option<Platform>> = std::iter::once(None)
                    .chain(Platform::KNOWN.iter().cloned().map(Some))
                    .collect();
                draft.platform = cycle(&options, &draft.platform, delta);
            }
            GameField::Status => draft.status = cycle(&GameStatus::ALL, &draft.status, delta),
            GameField::Rating => {
                let options: Vec<u8> = (0..=MAX_RATING).collect();
                draft.rating = cycle(&options, &draft.rating, delta);
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReviewField {
    Game,
    Title,
    Body,
    Rating,
    Hours,
    Recommended,
    Pro(usize),
    Con(usize),
}

/// Modal state for writing or editing a review.
#[derive(Debug, Clone)]
pub struct ReviewForm {
    pub editing: Option<String>,
    pub draft: ReviewDraft,
    pub errors: ValidationErrors,
    games: Vec<(String, String)>,
    field: usize,
}

impl ReviewForm {
    /// Form over the given games, optionally preselecting one.
    pub fn new(games: &[Game], selected: Option<&str>) -> Self {
        let games: Vec<(String, String)> = games
            .iter()
            .map(|game| (game.id.clone(), game.title.clone()))
            .collect();
        let game_id = selected
            .filter(|id| games.iter().any(|(game_id, _)| game_id == id))
            .map(str::to_string);
        Self {
            editing: None,
            draft: ReviewDraft {
                game_id,
                ..ReviewDraft::default()
            },
            errors: ValidationErrors::default(),
            games,
            field: 0,
        }
    }

    pub fn edit(games: &[Game], review: &Review) -> Self {
        Self {
            editing: Some(review.id.clone()),
            draft: ReviewDraft::from_review(review),
            ..Self::new(games, None)
        }
    }

    pub fn title(&self) -> String {
        let action = if self.editing.is_some() {
            "Edit review"
        } else {
            "Write review"
        };
        match self.game_title() {
            Some(title) => format!("{action} - {title}"),
            None => action.to_string(),
        }
    }

    fn game_title(&self) -> Option<&str> {
        let id = self.draft.game_id.as_deref()?;
        self.games
            .iter()
            .find(|(game_id, _)| game_id == id)
            .map(|(_, title)| title.as_str())
    }

    fn fields(&self) -> Vec<ReviewField> {
        let mut fields = vec![
            ReviewField::Game,
            ReviewField::Title,
            ReviewField::Body,
            ReviewField::Rating,
            ReviewField::Hours,
            ReviewField::Recommended,
        ];
        fields.extend((0..self.draft.pros.len()).map(ReviewField::Pro));
        fields.extend((0..self.draft.cons.len()).map(ReviewField::Con));
        fields
    }

    fn focused(&self) -> ReviewField {
        let fields = self.fields();
        fields[self.field.min(fields.len() - 1)]
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormOutcome {
        let total = self.fields().len();
        match key.code {
            KeyCode::Esc => return FormOutcome::Cancel,
            KeyCode::Enter => return FormOutcome::Submit,
            KeyCode::Tab | KeyCode::Down => self.field = step(self.field, 1, total),
            KeyCode::BackTab | KeyCode::Up => self.field = step(self.field, -1, total),
            KeyCode::Left => self.cycle(-1),
            KeyCode::Right => self.cycle(1),
            KeyCode::Char('a') if key.modifiers == KeyModifiers::CONTROL => self.add_point(),
            KeyCode::Char('d') if key.modifiers == KeyModifiers::CONTROL => self.remove_point(),
            KeyCode::Char(' ') if self.focused() == ReviewField::Recommended => {
                self.draft.recommended = !self.draft.recommended;
            }
            KeyCode::Backspace => self.edit_text(|text| {
                text.pop();
            }),
            KeyCode::Char(ch) if is_plain(&key) => self.edit_text(|text| text.push(ch)),
            _ => {}
        }
        FormOutcome::Continue
    }

    /// Validate the draft, keeping field errors for display on failure.
    pub fn submit(&mut self) -> Option<ReviewInput> {
        match self.draft.validate() {
            Ok(input) => {
                self.errors = ValidationErrors::default();
                Some(input)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    pub fn rows(&self) -> Vec<FormRow> {
        let focused = self.focused();
        let points_error = self.errors.get("points").map(str::to_string);
        self.fields()
            .into_iter()
            .map(|field| {
                let (label, value, error, choice) = match field {
                    ReviewField::Game => (
                        "Game".to_string(),
                        self.game_title().unwrap_or("(choose)").to_string(),
                        self.errors.get("game"),
                        true,
                    ),
                    ReviewField::Title => (
                        "Title".to_string(),
                        self.draft.title.clone(),
                        self.errors.get("title"),
                        false,
                    ),
                    ReviewField::Body => (
                        "Review".to_string(),
                        self.draft.body.clone(),
                        self.errors.get("body"),
                        false,
                    ),
                    ReviewField::Rating => (
                        "Rating".to_string(),
                        stars(self.draft.rating),
                        self.errors.get("rating"),
                        true,
                    ),
                    ReviewField::Hours => (
                        "Hours when reviewed".to_string(),
                        self.draft.hours_played.clone(),
                        self.errors.get("hours_played"),
                        false,
                    ),
                    ReviewField::Recommended => (
                        "Recommended".to_string(),
                        if self.draft.recommended { "yes" } else { "no" }.to_string(),
                        None,
                        true,
                    ),
                    ReviewField::Pro(idx) => (
                        format!("Pro {}", idx + 1),
                        self.draft.pros.items()[idx].clone(),
                        if idx == 0 { points_error.as_deref() } else { None },
                        false,
                    ),
                    ReviewField::Con(idx) => (
                        format!("Con {}", idx + 1),
                        self.draft.cons.items()[idx].clone(),
                        None,
                        false,
                    ),
                };
                FormRow {
                    label,
                    value,
                    error: error.map(str::to_string),
                    focused: field == focused,
                    choice,
                }
            })
            .collect()
    }

    fn edit_text(&mut self, edit: impl FnOnce(&mut String)) {
        match self.focused() {
            ReviewField::Title => edit(&mut self.draft.title),
            ReviewField::Body => edit(&mut self.draft.body),
            ReviewField::Hours => edit(&mut self.draft.hours_played),
            ReviewField::Pro(idx) => {
                let mut text = self.draft.pros.items()[idx].clone();
                edit(&mut text);
                self.draft.pros = self.draft.pros.set(idx, text);
            }
            ReviewField::Con(idx) => {
                let mut text = self.draft.cons.items()[idx].clone();
                edit(&mut text);
                self.draft.cons = self.draft.cons.set(idx, text);
            }
            ReviewField::Game | ReviewField::Rating | ReviewField::Recommended => {}
        }
    }

    fn cycle(&mut self, delta: isize) {
        match self.focused() {
            ReviewField::Game => {
                let options: Vec<Option<String>> =
                    self.games.iter().map(|(id, _)| Some(id.clone())).collect();
                if !options.is_empty() {
                    self.draft.game_id = cycle(&options, &self.draft.game_id, delta);
                }
            }
            ReviewField::Rating => {
                let options: Vec<u8> = (1..=MAX_RATING).collect();
                self.draft.rating = cycle(&options, &self.draft.rating, delta);
            }
            ReviewField::Recommended => self.draft.recommended = !self.draft.recommended,
            _ => {}
        }
    }

    fn add_point(&mut self) {
        let fields = self.fields();
        match self.focused() {
            ReviewField::Con(_) => {
                self.draft.cons = self.draft.cons.push_empty();
                self.field = fields.len();
            }
            _ => {
                self.draft.pros = self.draft.pros.push_empty();
                let last = ReviewField::Pro(self.draft.pros.len() - 1);
                self.field = position_of(&self.fields(), last);
            }
        }
    }

    fn remove_point(&mut self) {
        match self.focused() {
            ReviewField::Pro(idx) => self.draft.pros = self.draft.pros.remove(idx),
            ReviewField::Con(idx) => self.draft.cons = self.draft.cons.remove(idx),
            _ => return,
        }
        self.field = self.field.min(self.fields().len() - 1);
    }
}

fn position_of(fields: &[ReviewField], target: ReviewField) -> usize {
    fields.iter().position(|field| *field == target).unwrap_or(0)
}

fn is_plain(key: &KeyEvent) -> bool {
    key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT
}

fn step(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as isize + delta).rem_euclid(len as isize) as usize
}

fn cycle<T: Clone + PartialEq>(options: &[T], current: &T, delta: isize) -> T {
    let next = match options.iter().position(|option| option == current) {
        Some(idx) => step(idx, delta, options.len()),
        None => 0,
    };
    options[next].clone()
}

/// Five-star rendering of a `0..=5` rating.
pub fn stars(rating: u8) -> String {
    let filled = rating.min(MAX_RATING) as usize;
    format!(
        "{}{}",
        "★".repeat(filled),
        "☆".repeat(MAX_RATING as usize - filled)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(form: &mut ReviewForm, text: &str) {
        for ch in text.chars() {
            form.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn sample_game() -> Game {
        Game {
            id: "g1".into(),
            title: "Hades".into(),
            developer: "Supergiant".into(),
            genre: Genre::Action,
            platform: Platform::Pc,
            release_year: 2020,
            cover_url: None,
            status: GameStatus::Completed,
            rating: 5,
            hours_played: 40.0,
            started_at: None,
            finished_at: None,
            added_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn game_form_edits_text_and_cycles_choices() {
        let mut form = GameForm::new(2026);
        for ch in "Celeste".chars() {
            form.handle_key(key(KeyCode::Char(ch)));
        }
        form.handle_key(key(KeyCode::Backspace));
        assert_eq!(form.draft.title, "Celest");

        // Developer, then genre.
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Right));
        assert_eq!(form.draft.genre, Some(Genre::Action));
        form.handle_key(key(KeyCode::Left));
        form.handle_key(key(KeyCode::Left));
        assert_eq!(form.draft.genre, Some(Genre::OpenWorld));
        form.handle_key(key(KeyCode::Char('x')));
        assert_eq!(form.draft.genre, Some(Genre::OpenWorld));

        assert_eq!(form.handle_key(key(KeyCode::Enter)), FormOutcome::Submit);
        assert_eq!(form.handle_key(key(KeyCode::Esc)), FormOutcome::Cancel);
    }

    #[test]
    fn game_form_keeps_errors_until_valid() {
        let mut form = GameForm::new(2026);
        assert!(form.submit(2026).is_none());
        let title_row = &form.rows()[0];
        assert!(title_row.focused);
        assert!(title_row.error.is_some());

        let mut form = GameForm::edit(&sample_game());
        assert_eq!(form.editing.as_deref(), Some("g1"));
        let input = form.submit(2026).expect("valid edit");
        assert_eq!(input.title, "Hades");
        assert!(form.errors.is_empty());
    }

    #[test]
    fn review_form_manages_point_lists() {
        let mut form = ReviewForm::new(&[sample_game()], Some("g1"));
        assert_eq!(form.title(), "Write review - Hades");

        // Jump to the first pro.
        for _ in 0..6 {
            form.handle_key(key(KeyCode::Tab));
        }
        type_text(&mut form, "Combat");
        form.handle_key(ctrl('a'));
        type_text(&mut form, "Music");
        assert_eq!(form.draft.pros.items().to_vec(), ["Combat", "Music"]);

        form.handle_key(ctrl('d'));
        assert_eq!(form.draft.pros.items().to_vec(), ["Combat"]);
        form.handle_key(ctrl('d'));
        assert_eq!(form.draft.pros.len(), 1);
    }

    #[test]
    fn review_form_submits_valid_draft() {
        let mut form = ReviewForm::new(&[sample_game()], None);
        assert!(form.submit().is_none());
        assert!(form.errors.get("game").is_some());

        form.handle_key(key(KeyCode::Right));
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "Great");
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "Tight combat loop");
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Right));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Tab));
        form.handle_key(key(KeyCode::Char(' ')));
        form.handle_key(key(KeyCode::Tab));
        type_text(&mut form, "Replayable");

        let input = form.submit().expect("valid review");
        assert_eq!(input.game_id, "g1");
        assert_eq!(input.rating, 1);
        assert!(!input.recommended);
        assert_eq!(input.pros, ["Replayable"]);
        assert!(input.cons.is_empty());
    }

    #[test]
    fn stars_render_five_slots() {
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(9), "★★★★★");
    }
}
