use serde::{Deserialize, Serialize};

/// One piece of work on the portfolio page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub title: String,
    pub category: String,
}

/// What the category buttons select
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortfolioFilter {
    All,
    Category(String),
}

impl PortfolioFilter {
    /// "all" is the show-everything filter, any other string is a category
    pub fn parse(value: &str) -> Self {
        if value == "all" {
            PortfolioFilter::All
        } else {
            PortfolioFilter::Category(value.to_string())
        }
    }

    pub fn matches(&self, item: &PortfolioItem) -> bool {
        match self {
            PortfolioFilter::All => true,
            PortfolioFilter::Category(category) => item.category == *category,
        }
    }
}

/// The portfolio grid with its active filter
#[derive(Debug, Clone)]
pub struct PortfolioBoard {
    items: Vec<PortfolioItem>,
    filter: PortfolioFilter,
}

impl PortfolioBoard {
    pub fn new(items: Vec<PortfolioItem>) -> Self {
        Self {
            items,
            filter: PortfolioFilter::All,
        }
    }

    pub fn apply(&mut self, filter: PortfolioFilter) -> Vec<&PortfolioItem> {
        self.filter = filter;
        self.visible()
    }

    /// Items the active filter lets through, in insertion order
    pub fn visible(&self) -> Vec<&PortfolioItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .collect()
    }

    pub fn active_filter(&self) -> &PortfolioFilter {
        &self.filter
    }
}
