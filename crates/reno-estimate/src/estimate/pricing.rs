use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::domain::Category;

/// Labor role names as published in the government construction wage survey.
pub const GENERAL_LABORER: &str = "보통인부";
pub const ELECTRICIAN: &str = "내선전공";
pub const PLUMBER: &str = "배관공";
pub const PLASTERER: &str = "미장공";
pub const INTERIOR_CARPENTER: &str = "내장목공";
pub const PAINTER: &str = "도장공";

/// Labor role whose daily wage prices a category, if any.
pub const fn labor_role(category: Category) -> Option<&'static str> {
    match category {
        Category::Demolition => Some(GENERAL_LABORER),
        Category::ElectricalTelecom => Some(ELECTRICIAN),
        Category::Plumbing | Category::FireSafety => Some(PLUMBER),
        Category::Wall => Some(PLASTERER),
        Category::Ceiling | Category::Flooring => Some(INTERIOR_CARPENTER),
        Category::Facade => Some(PAINTER),
        Category::Design | Category::Furniture | Category::Other => None,
    }
}

/// Unit prices keyed by category. Categories without an entry are left alone
/// when the table is applied to an estimate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable {
    prices: BTreeMap<Category, f64>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, category: Category, unit_price: f64) -> Self {
        self.prices.insert(category, unit_price);
        self
    }

    /// Builds a table from a role → wage listing through [`labor_role`].
    /// Roles missing from `labor_costs` leave their categories unpriced.
    pub fn from_labor_costs(labor_costs: &BTreeMap<String, f64>) -> Self {
        let prices = Category::ordered()
            .into_iter()
            .filter_map(|category| {
                let role = labor_role(category)?;
                labor_costs
                    .get(role)
                    .filter(|price| price.is_finite())
                    .map(|price| (category, *price))
            })
            .collect();
        Self { prices }
    }

    pub fn price_for(&self, category: Category) -> Option<f64> {
        self.prices.get(&category).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Categories recommended for inclusion, typically from a site photo analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecommendationSet {
    categories: BTreeSet<Category>,
}

impl RecommendationSet {
    /// Resolves free-text labels, dropping anything outside the category list.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .filter_map(|label| Category::from_label(label.as_ref()))
            .collect()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl FromIterator<Category> for RecommendationSet {
    fn from_iter<T: IntoIterator<Item = Category>>(iter: T) -> Self {
        Self {
            categories: iter.into_iter().collect(),
        }
    }
}
