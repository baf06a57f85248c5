//! Destination records passed between the candidate, enrichment and
//! ranking steps

use crate::lenient;
use crate::preferences::format_krw;
use serde::{Deserialize, Serialize};

/// One travel destination
///
/// Every field defaults when absent so that partially-formed model output
/// still yields a usable record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub region: String,

    #[serde(default, deserialize_with = "lenient::text")]
    pub summary: String,

    /// Estimated total cost in KRW
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<u64>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub highlights: Vec<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub best_season: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DestinationDetails>,

    /// Fit to the user's preferences, 0-1
    #[serde(default, deserialize_with = "lenient::score", skip_serializing_if = "Option::is_none")]
    pub fit_score: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub rank_reason: Option<String>,
}

/// Supplementary information added during enrichment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationDetails {
    #[serde(default, deserialize_with = "lenient::list")]
    pub attractions: Vec<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub local_food: Vec<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub accommodation: Option<String>,

    #[serde(default, deserialize_with = "lenient::list")]
    pub tips: Vec<String>,
}

impl DestinationDetails {
    /// Number of the five detail sections that carry content
    pub fn filled_sections(&self) -> usize {
        [
            !self.attractions.is_empty(),
            !self.local_food.is_empty(),
            self.transport.is_some(),
            self.accommodation.is_some(),
            !self.tips.is_empty(),
        ]
        .into_iter()
        .filter(|filled| *filled)
        .count()
    }

    pub const SECTIONS: usize = 5;
}

impl Destination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_cost(mut self, cost: u64) -> Self {
        self.estimated_cost = Some(cost);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// A record without a name cannot be presented or matched
    pub fn is_named(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// Case- and whitespace-insensitive name comparison
    pub fn same_place(&self, other_name: &str) -> bool {
        normalize(&self.name) == normalize(other_name)
    }

    /// Whether the estimated cost stays within 120% of `budget`
    ///
    /// Unknown cost or unknown budget never disqualifies a destination.
    pub fn within_budget(&self, budget: Option<u64>) -> bool {
        match (self.estimated_cost, budget) {
            (Some(cost), Some(budget)) if budget > 0 => {
                u128::from(cost) * 5 <= u128::from(budget) * 6
            }
            _ => true,
        }
    }

    /// Display label, `name (region)` when the region is known
    pub fn label(&self) -> String {
        if self.region.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.region)
        }
    }

    /// Cost formatted for display
    pub fn cost_label(&self) -> Option<String> {
        self.estimated_cost.map(format_krw)
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
