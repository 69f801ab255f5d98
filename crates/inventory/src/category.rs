use core::str::FromStr;

use serde::{Deserialize, Serialize};

use shelflife_core::DomainError;

/// Display category of an inventory item.
///
/// Serialized by its stable snake_case key; `label()` is the shop-facing name.
/// Rows that stored the label instead of the key still deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "鳳梨酥類")]
    PineappleCake,
    #[serde(alias = "酥皮類")]
    PuffPastry,
    #[serde(alias = "糕類")]
    Cake,
    #[serde(alias = "大餅類")]
    ChinesePie,
    #[serde(alias = "其他類")]
    Other,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Category; 5] = [
        Category::PineappleCake,
        Category::PuffPastry,
        Category::Cake,
        Category::ChinesePie,
        Category::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::PineappleCake => "pineapple_cake",
            Category::PuffPastry => "puff_pastry",
            Category::Cake => "cake",
            Category::ChinesePie => "chinese_pie",
            Category::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::PineappleCake => "鳳梨酥類",
            Category::PuffPastry => "酥皮類",
            Category::Cake => "糕類",
            Category::ChinesePie => "大餅類",
            Category::Other => "其他類",
        }
    }
}

impl core::fmt::Display for Category {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = DomainError;

    /// Accepts either the serialized key (case-insensitive, `-` or `_`) or the label.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let key = s.to_lowercase().replace('-', "_");
        Category::ALL
            .into_iter()
            .find(|c| c.key() == key || c.label() == s)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "unknown category '{s}' (expected one of: {})",
                    Category::ALL.map(Category::key).join(", ")
                ))
            })
    }
}
