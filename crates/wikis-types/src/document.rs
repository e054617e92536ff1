//! Ranked article documents and the fixed category lists they belong to.

use serde::{Deserialize, Serialize};

use crate::error::WikisError;

/// One of the ten ranking tables on the most-viewed-pages article.
///
/// The ordinal is the position of the table on the page; labels are what
/// ends up in the `list` field of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Top-100 list")]
    Top100,
    #[serde(rename = "Countries")]
    Countries,
    #[serde(rename = "Cities")]
    Cities,
    #[serde(rename = "People")]
    People,
    #[serde(rename = "Singers")]
    Singers,
    #[serde(rename = "Actors")]
    Actors,
    #[serde(rename = "Athletes")]
    Athletes,
    #[serde(rename = "Modern Political Leaders")]
    ModernPoliticalLeaders,
    #[serde(rename = "Pre-modern people")]
    PreModernPeople,
    #[serde(rename = "3rd-millennium people")]
    ThirdMillenniumPeople,
}

impl Category {
    /// All categories in page order.
    pub const ALL: [Category; 10] = [
        Category::Top100,
        Category::Countries,
        Category::Cities,
        Category::People,
        Category::Singers,
        Category::Actors,
        Category::Athletes,
        Category::ModernPoliticalLeaders,
        Category::PreModernPeople,
        Category::ThirdMillenniumPeople,
    ];

    /// Human-readable label stored in the index.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Top100 => "Top-100 list",
            Category::Countries => "Countries",
            Category::Cities => "Cities",
            Category::People => "People",
            Category::Singers => "Singers",
            Category::Actors => "Actors",
            Category::Athletes => "Athletes",
            Category::ModernPoliticalLeaders => "Modern Political Leaders",
            Category::PreModernPeople => "Pre-modern people",
            Category::ThirdMillenniumPeople => "3rd-millennium people",
        }
    }

    /// Short identifier used to build document ids.
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Top100 => "top-100",
            Category::Countries => "countries",
            Category::Cities => "cities",
            Category::People => "people",
            Category::Singers => "singers",
            Category::Actors => "actors",
            Category::Athletes => "athletes",
            Category::ModernPoliticalLeaders => "modern-political-leaders",
            Category::PreModernPeople => "pre-modern-people",
            Category::ThirdMillenniumPeople => "3rd-millennium-people",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable index id for the entry at `rank` in `category`.
///
/// Re-indexing the same entry overwrites the previous copy.
pub fn document_id(category: Category, rank: u32) -> String {
    format!("{}-{}", category.slug(), rank)
}

/// A row scraped from a ranking table, before its article text is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    pub rank: u32,
    pub title: String,
    pub link: String,
}

impl RankedEntry {
    pub fn new(rank: u32, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            rank,
            title: title.into(),
            link: link.into(),
        }
    }
}

/// A fully fetched article, as written to the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Position within its list, starting at 1
    pub rank: u32,
    /// Article title
    pub title: String,
    /// Link to the article as it appears on the ranking page
    pub link: String,
    /// Rendered article HTML
    pub contents: String,
    /// The ranking list this entry came from
    pub list: Category,
}

impl Document {
    /// Pair a scraped entry with its fetched contents.
    pub fn from_entry(entry: RankedEntry, list: Category, contents: String) -> Self {
        Self {
            rank: entry.rank,
            title: entry.title,
            link: entry.link,
            contents,
            list,
        }
    }

    /// Index id for this document.
    pub fn doc_id(&self) -> String {
        document_id(self.list, self.rank)
    }

    /// Check rank, title and link invariants.
    pub fn validate(&self) -> Result<(), WikisError> {
        if self.rank == 0 {
            return Err(WikisError::InvalidDocument(format!(
                "rank must be positive for '{}'",
                self.title
            )));
        }
        if self.title.trim().is_empty() {
            return Err(WikisError::InvalidDocument(format!(
                "empty title at rank {} in {}",
                self.rank, self.list
            )));
        }
        if self.link.trim().is_empty() {
            return Err(WikisError::InvalidDocument(format!(
                "empty link for '{}'",
                self.title
            )));
        }
        Ok(())
    }
}
