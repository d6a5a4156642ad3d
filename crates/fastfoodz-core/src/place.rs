//! Domain types for nearby-place search results.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Number of symbols on the price scale shown next to a place.
pub const PRICE_SCALE_LEN: usize = 4;

const PRICE_SYMBOL: char = '$';

/// Cuisine classification resolved from a search result's category tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Pizza,
    Mexican,
    Chinese,
    Burgers,
    /// None of the result's tags matched the fixed set.
    Unknown,
}

impl Category {
    /// The fixed set of categories a place can resolve to, in query order.
    pub const ALLOWED: [Category; 4] = [
        Category::Pizza,
        Category::Mexican,
        Category::Chinese,
        Category::Burgers,
    ];

    /// Parses a Yelp category alias. Only aliases in [`Category::ALLOWED`]
    /// resolve; anything else (including `"unknown"`) is `None`.
    #[must_use]
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias {
            "pizza" => Some(Category::Pizza),
            "mexican" => Some(Category::Mexican),
            "chinese" => Some(Category::Chinese),
            "burgers" => Some(Category::Burgers),
            _ => None,
        }
    }

    /// Resolves the first alias, in source order, that belongs to the fixed
    /// set. Falls back to [`Category::Unknown`].
    #[must_use]
    pub fn resolve<'a, I>(aliases: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        aliases
            .into_iter()
            .find_map(Category::from_alias)
            .unwrap_or(Category::Unknown)
    }

    #[must_use]
    pub fn alias(self) -> &'static str {
        match self {
            Category::Pizza => "pizza",
            Category::Mexican => "mexican",
            Category::Chinese => "chinese",
            Category::Burgers => "burgers",
            Category::Unknown => "unknown",
        }
    }

    /// Name of the icon asset used for this category.
    #[must_use]
    pub fn icon_name(self) -> &'static str {
        match self {
            Category::Unknown => "logo",
            known => known.alias(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.alias())
    }
}

/// Price token as returned by the search API, e.g. `"$"` or `"$$$"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTier(String);

impl PriceTier {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The symbols that make up this tier.
    #[must_use]
    pub fn filled(&self) -> &str {
        &self.0
    }

    /// The symbols left over on the four-step scale after this tier.
    #[must_use]
    pub fn unfilled(&self) -> String {
        let used = self.0.chars().count();
        std::iter::repeat_n(PRICE_SYMBOL, PRICE_SCALE_LEN.saturating_sub(used)).collect()
    }

    /// Filled and unfilled halves of the price scale for an optional tier.
    /// An absent tier is shown as a fully unfilled scale.
    #[must_use]
    pub fn scale(tier: Option<&PriceTier>) -> (String, String) {
        match tier {
            Some(t) => (t.filled().to_owned(), t.unfilled()),
            None => (
                String::new(),
                std::iter::repeat_n(PRICE_SYMBOL, PRICE_SCALE_LEN).collect(),
            ),
        }
    }
}

impl std::fmt::Display for PriceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One search result. Immutable once built from a raw business record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub coordinate: Option<Coordinate>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub info_url: Option<String>,
    pub category: Category,
    pub price_tier: Option<PriceTier>,
}

impl Place {
    /// A place with only a category set; every optional field is empty.
    #[must_use]
    pub fn with_category(category: Category) -> Self {
        Self {
            name: None,
            image_url: None,
            coordinate: None,
            address: None,
            phone: None,
            info_url: None,
            category,
            price_tier: None,
        }
    }

    /// Where to drop this place's map marker: its own coordinate, or
    /// `fallback` when the record carried none.
    #[must_use]
    pub fn marker_coordinate(&self, fallback: Coordinate) -> Coordinate {
        self.coordinate.unwrap_or(fallback)
    }

    /// Distance from `origin` in meters, if this place has a coordinate.
    #[must_use]
    pub fn distance_from(&self, origin: &Coordinate) -> Option<f64> {
        self.coordinate.map(|c| origin.distance_meters(&c))
    }
}
