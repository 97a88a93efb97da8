use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Comments per page; the server ignores other values.
pub const PAGE_SIZE: u32 = 10;

/// Star rating filter, 1 (worst) to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score(u8);

impl Score {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=5).contains(&value) {
            Ok(Score(value))
        } else {
            Err(format!("score must be between 1 and 5, got {}", value))
        }
    }
}

impl FromStr for Score {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<u8>()
            .map_err(|_| format!("score must be between 1 and 5, got {:?}", s))?;
        Score::try_from(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortType {
    /// Latest first.
    ByDate,
    #[default]
    Default,
}

impl SortType {
    /// Value of the `sortType` query parameter.
    pub fn code(self) -> u8 {
        match self {
            SortType::ByDate => 5,
            SortType::Default => 6,
        }
    }
}

impl FromStr for SortType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5" | "date" => Ok(SortType::ByDate),
            "6" | "default" => Ok(SortType::Default),
            other => Err(format!(
                "sort type must be 5 (date) or 6 (default), got {:?}",
                other
            )),
        }
    }
}

impl fmt::Display for SortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub product_id: u64,
    pub score: Score,
    pub sort_type: SortType,
    pub page: u32,
    pub page_size: u32,
}

impl FetchRequest {
    pub fn new(product_id: u64, score: Score, sort_type: SortType, page: u32) -> Self {
        FetchRequest {
            product_id,
            score,
            sort_type,
            page,
            page_size: PAGE_SIZE,
        }
    }

    /// Same product and filters, different page.
    pub fn for_page(&self, page: u32) -> Self {
        FetchRequest { page, ..*self }
    }
}

/// One unwrapped page of the comment listing.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Only present on the page 0 response.
    #[serde(default)]
    pub max_page: Option<u32>,
    pub comments: Vec<CommentRecord>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub creation_time: String,
    pub content: String,
}
