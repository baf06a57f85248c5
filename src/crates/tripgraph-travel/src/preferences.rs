//! Structured travel preferences extracted from the conversation

use crate::lenient;
use serde::{Deserialize, Serialize};

/// Preference keys that must be known before candidates are generated
pub const REQUIRED_FIELDS: [PreferenceField; 3] = [
    PreferenceField::Budget,
    PreferenceField::Duration,
    PreferenceField::Interests,
];

/// Named preference key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
    Budget,
    Duration,
    Interests,
    TravelStyle,
    Season,
    Companion,
}

impl PreferenceField {
    /// JSON key
    pub fn key(self) -> &'static str {
        match self {
            PreferenceField::Budget => "budget",
            PreferenceField::Duration => "duration",
            PreferenceField::Interests => "interests",
            PreferenceField::TravelStyle => "travel_style",
            PreferenceField::Season => "season",
            PreferenceField::Companion => "companion",
        }
    }

    /// Label used when asking the user
    pub fn label(self) -> &'static str {
        match self {
            PreferenceField::Budget => "예산",
            PreferenceField::Duration => "여행 기간",
            PreferenceField::Interests => "관심사",
            PreferenceField::TravelStyle => "여행 스타일",
            PreferenceField::Season => "여행 시기",
            PreferenceField::Companion => "동행",
        }
    }

    /// Example answer shown next to the label
    pub fn example(self) -> &'static str {
        match self {
            PreferenceField::Budget => "예: 1인 100만원",
            PreferenceField::Duration => "예: 2박 3일",
            PreferenceField::Interests => "예: 바다, 맛집, 온천",
            PreferenceField::TravelStyle => "예: 여유로운 힐링",
            PreferenceField::Season => "예: 10월",
            PreferenceField::Companion => "예: 가족",
        }
    }
}

/// What the user has told us about their trip
///
/// Merged field by field across turns; a value that is absent or empty in
/// a newer extraction never erases an older one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Total budget in KRW
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "budget_unset")]
    pub budget: Option<u64>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, deserialize_with = "lenient::list", skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub travel_style: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub companion: Option<String>,
}

impl UserPreferences {
    /// Whether no preference at all is known
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `field` holds a usable value
    pub fn has(&self, field: PreferenceField) -> bool {
        fn filled(s: &Option<String>) -> bool {
            s.as_deref().is_some_and(|s| !s.trim().is_empty())
        }

        match field {
            PreferenceField::Budget => self.budget.is_some_and(|b| b > 0),
            PreferenceField::Duration => filled(&self.duration),
            PreferenceField::Interests => self.interests.iter().any(|i| !i.trim().is_empty()),
            PreferenceField::TravelStyle => filled(&self.travel_style),
            PreferenceField::Season => filled(&self.season),
            PreferenceField::Companion => filled(&self.companion),
        }
    }

    /// Required fields that are still unknown, in asking order
    pub fn missing_required(&self) -> Vec<PreferenceField> {
        REQUIRED_FIELDS
            .into_iter()
            .filter(|f| !self.has(*f))
            .collect()
    }

    pub fn is_sufficient(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Overlay `newer` on `self`; empty values in `newer` are ignored
    ///
    /// Mirrors the state reducer for this field so nodes can reason about
    /// the post-merge preferences before returning their update.
    pub fn merged_with(&self, newer: &UserPreferences) -> UserPreferences {
        fn pick(old: &Option<String>, new: &Option<String>) -> Option<String> {
            match new {
                Some(s) if !s.trim().is_empty() => Some(s.clone()),
                _ => old.clone(),
            }
        }

        UserPreferences {
            budget: newer.budget.filter(|b| *b > 0).or(self.budget),
            duration: pick(&self.duration, &newer.duration),
            interests: if newer.interests.is_empty() {
                self.interests.clone()
            } else {
                newer.interests.clone()
            },
            travel_style: pick(&self.travel_style, &newer.travel_style),
            season: pick(&self.season, &newer.season),
            companion: pick(&self.companion, &newer.companion),
        }
    }

    /// One-line human summary, e.g. `예산 100만원 · 2박 3일 · 바다, 맛집`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(budget) = self.budget {
            parts.push(format!("예산 {}", format_krw(budget)));
        }
        if let Some(duration) = &self.duration {
            parts.push(duration.clone());
        }
        if !self.interests.is_empty() {
            parts.push(self.interests.join(", "));
        }
        for extra in [&self.travel_style, &self.season, &self.companion]
            .into_iter()
            .flatten()
        {
            parts.push(extra.clone());
        }
        parts.join(" · ")
    }
}

/// Format a KRW amount the way people say it: `120만원`, `1,234,500원`
// A zero budget is never written, so it cannot replace a known one
fn budget_unset(budget: &Option<u64>) -> bool {
    matches!(budget, None | Some(0))
}

pub fn format_krw(amount: u64) -> String {
    if amount >= 10_000 && amount % 10_000 == 0 {
        return format!("{}만원", group_digits(amount / 10_000));
    }
    format!("{}원", group_digits(amount))
}

fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
