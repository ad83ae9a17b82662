//! Per-category safety thresholds.

use serde::{Deserialize, Serialize};

/// Harm categories the service can filter on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HarmCategory {
    HarmCategoryUnspecified,
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
    #[serde(other)]
    Other,
}

impl HarmCategory {
    /// The categories a request can actually set thresholds for.
    pub const CONFIGURABLE: [HarmCategory; 4] = [
        HarmCategory::HarmCategoryHarassment,
        HarmCategory::HarmCategoryHateSpeech,
        HarmCategory::HarmCategorySexuallyExplicit,
        HarmCategory::HarmCategoryDangerousContent,
    ];
}

/// Blocking level applied to a harm category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum HarmBlockThreshold {
    HarmBlockThresholdUnspecified,
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl From<(HarmCategory, HarmBlockThreshold)> for SafetySetting {
    fn from((category, threshold): (HarmCategory, HarmBlockThreshold)) -> Self {
        SafetySetting {
            category,
            threshold,
        }
    }
}

/// Threshold overrides sent with a request. Empty means service defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafetySettings(Vec<SafetySetting>);

impl SafetySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same threshold for every configurable category.
    pub fn uniform(threshold: HarmBlockThreshold) -> Self {
        HarmCategory::CONFIGURABLE
            .into_iter()
            .fold(Self::new(), |settings, category| {
                settings.with_category(category, threshold)
            })
    }

    /// Set the threshold for `category`, replacing an earlier entry for it.
    #[must_use]
    pub fn with_category(mut self, category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        match self.0.iter_mut().find(|s| s.category == category) {
            Some(existing) => existing.threshold = threshold,
            None => self.0.push((category, threshold).into()),
        }
        self
    }

    /// The configured threshold for `category`, if any.
    pub fn threshold_for(&self, category: HarmCategory) -> Option<HarmBlockThreshold> {
        self.0
            .iter()
            .find(|s| s.category == category)
            .map(|s| s.threshold)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Settings in insertion order, as they are sent on the wire.
    pub fn iter(&self) -> impl Iterator<Item = &SafetySetting> {
        self.0.iter()
    }
}

/// A safety rating attached to a candidate or to prompt feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyRating {
    pub category: HarmCategory,
    /// Likelihood bucket as reported, e.g. `NEGLIGIBLE` or `HIGH`.
    pub probability: String,
    /// Whether this rating caused the content to be blocked.
    #[serde(default)]
    pub blocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_threshold_parses_service_names() {
        assert_eq!(
            HarmBlockThreshold::from_str("BLOCK_ONLY_HIGH").unwrap(),
            HarmBlockThreshold::BlockOnlyHigh
        );
        assert_eq!(
            HarmBlockThreshold::from_str("block_none").unwrap(),
            HarmBlockThreshold::BlockNone
        );
        assert!(HarmBlockThreshold::from_str("BLOCK_EVERYTHING").is_err());
        assert_eq!(
            HarmBlockThreshold::BlockMediumAndAbove.to_string(),
            "BLOCK_MEDIUM_AND_ABOVE"
        );
    }

    #[test]
    fn test_category_serializes_as_service_name() {
        let setting = SafetySetting::from((
            HarmCategory::HarmCategoryDangerousContent,
            HarmBlockThreshold::BlockLowAndAbove,
        ));
        let json = serde_json::to_value(setting).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "category": "HARM_CATEGORY_DANGEROUS_CONTENT",
                "threshold": "BLOCK_LOW_AND_ABOVE"
            })
        );
    }

    #[test]
    fn test_unknown_category_deserializes_as_other() {
        let rating: SafetyRating = serde_json::from_str(
            r#"{"category":"HARM_CATEGORY_CIVIC_INTEGRITY","probability":"NEGLIGIBLE"}"#,
        )
        .unwrap();
        assert_eq!(rating.category, HarmCategory::Other);
        assert!(!rating.blocked);
    }

    #[test]
    fn test_uniform_covers_configurable_categories() {
        let settings = SafetySettings::uniform(HarmBlockThreshold::BlockOnlyHigh);
        assert_eq!(settings.iter().count(), 4);
        for category in HarmCategory::CONFIGURABLE {
            assert_eq!(
                settings.threshold_for(category),
                Some(HarmBlockThreshold::BlockOnlyHigh)
            );
        }
    }

    #[test]
    fn test_with_category_replaces_existing_entry() {
        let settings = SafetySettings::uniform(HarmBlockThreshold::BlockNone).with_category(
            HarmCategory::HarmCategoryHateSpeech,
            HarmBlockThreshold::BlockLowAndAbove,
        );
        assert_eq!(settings.iter().count(), 4);
        assert_eq!(
            settings.threshold_for(HarmCategory::HarmCategoryHateSpeech),
            Some(HarmBlockThreshold::BlockLowAndAbove)
        );
    }
}
