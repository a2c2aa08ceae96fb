use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::Game;

/// Ordering applied to a game list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SortKey {
    /// Most recently added first.
    #[default]
    Recent,
    /// Oldest additions first.
    Oldest,
    /// Title, alphabetical.
    Title,
    /// Highest rating first.
    Rating,
    /// Most hours played first.
    Hours,
    /// Keep the incoming order. Unknown key names resolve to this.
    Insertion,
}

impl SortKey {
    /// The selectable orderings, in the order the UI cycles through them.
    pub const ALL: [SortKey; 5] = [
        SortKey::Recent,
        SortKey::Oldest,
        SortKey::Title,
        SortKey::Rating,
        SortKey::Hours,
    ];

    /// Resolve a key name; anything unrecognised keeps the incoming order.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "recent" => SortKey::Recent,
            "oldest" => SortKey::Oldest,
            "title" => SortKey::Title,
            "rating" => SortKey::Rating,
            "hours" => SortKey::Hours,
            _ => SortKey::Insertion,
        }
    }

    /// Configuration name of the key.
    pub fn name(self) -> &'static str {
        match self {
            SortKey::Recent => "recent",
            SortKey::Oldest => "oldest",
            SortKey::Title => "title",
            SortKey::Rating => "rating",
            SortKey::Hours => "hours",
            SortKey::Insertion => "insertion",
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Recent => "Most recent",
            SortKey::Oldest => "Oldest",
            SortKey::Title => "Title",
            SortKey::Rating => "Best rated",
            SortKey::Hours => "Most played",
            SortKey::Insertion => "Unsorted",
        }
    }

    /// The key following this one in [`SortKey::ALL`].
    pub fn next(self) -> Self {
        let position = SortKey::ALL.iter().position(|key| *key == self);
        match position {
            Some(idx) => SortKey::ALL[(idx + 1) % SortKey::ALL.len()],
            None => SortKey::ALL[0],
        }
    }
}

impl FromStr for SortKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SortKey::parse(s))
    }
}

impl From<String> for SortKey {
    fn from(value: String) -> Self {
        SortKey::parse(&value)
    }
}

impl From<SortKey> for String {
    fn from(value: SortKey) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Return a sorted copy of `games`. The sort is stable, so records with
/// equal keys keep their relative input order.
pub fn sort(games: &[Game], key: SortKey) -> Vec<Game> {
    let mut sorted = games.to_vec();
    match key {
        SortKey::Recent => sorted.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
        SortKey::Oldest => sorted.sort_by(|a, b| a.added_at.cmp(&b.added_at)),
        SortKey::Title => sorted.sort_by_cached_key(|game| TitleKey::new(&game.title)),
        SortKey::Rating => sorted.sort_by(|a, b| b.rating.cmp(&a.rating)),
        SortKey::Hours => sorted.sort_by(|a, b| b.hours_played.total_cmp(&a.hours_played)),
        SortKey::Insertion => {}
    }
    sorted
}

/// Collation key approximating a locale-aware comparison: base letters
/// first, ignoring accents and case, then accents, then case with lowercase
/// ordered before uppercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TitleKey {
    base: String,
    accented: String,
    uppercase: Vec<bool>,
}

impl TitleKey {
    pub(crate) fn new(title: &str) -> Self {
        let decomposed: Vec<char> = title.nfd().collect();
        let base = decomposed
            .iter()
            .copied()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect();
        let accented = decomposed.iter().copied().flat_map(char::to_lowercase).collect();
        let uppercase = decomposed.iter().map(|c| c.is_uppercase()).collect();
        Self {
            base,
            accented,
            uppercase,
        }
    }
}
