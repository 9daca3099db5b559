/// Request body for creating or updating a guide, and its field rules.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, GuideStatus};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuideInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub time: String,
    pub uk_specific: bool,
    pub tags: Vec<String>,
    pub tested_on: Vec<String>,
    pub content: String,
    /// Absent means published on create, and unchanged on update.
    pub status: Option<String>,
    /// Hash from a previous raw read. When present, an update is refused if the stored
    /// file has changed since.
    pub expected_hash: Option<String>,
}

/// A [`GuideInput`] whose fields passed every rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidGuide {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub time: String,
    pub uk_specific: bool,
    pub tags: Vec<String>,
    pub tested_on: Vec<String>,
    pub content: String,
    pub status: Option<GuideStatus>,
}

/// Messages per offending field, keyed by the JSON field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrors {
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    fn add(&mut self, field: &str, message: String) {
        self.field_errors.entry(field.to_string()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.field_errors.is_empty()
    }
}

fn check_len(errors: &mut ValidationErrors, field: &str, value: &str, min: usize, max: Option<usize>) {
    let len = value.chars().count();
    if len < min {
        errors.add(field, format!("must contain at least {min} character(s)"));
    }
    if let Some(max) = max.filter(|max| len > *max) {
        errors.add(field, format!("must contain at most {max} character(s)"));
    }
}

fn check_list(
    errors: &mut ValidationErrors,
    field: &str,
    values: &[String],
    max_items: usize,
    item_max: usize,
) {
    if values.len() > max_items {
        errors.add(field, format!("must contain at most {max_items} item(s)"));
    }
    for (idx, value) in values.iter().enumerate() {
        let len = value.chars().count();
        if len == 0 || len > item_max {
            errors.add(field, format!("item {idx} must be between 1 and {item_max} characters"));
        }
    }
}

pub fn validate(input: GuideInput) -> Result<ValidGuide, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_len(&mut errors, "title", &input.title, 3, Some(150));
    check_len(&mut errors, "description", &input.description, 10, Some(500));
    check_len(&mut errors, "category", &input.category, 2, Some(60));
    check_len(&mut errors, "time", &input.time, 1, Some(40));
    check_len(&mut errors, "content", &input.content, 20, None);
    check_list(&mut errors, "tags", &input.tags, 25, 30);
    check_list(&mut errors, "testedOn", &input.tested_on, 20, 60);

    let difficulty = Difficulty::parse(&input.difficulty);
    if difficulty.is_none() {
        errors.add(
            "difficulty",
            "must be one of 'Beginner', 'Intermediate', 'Advanced'".to_string(),
        );
    }

    let status = match input.status.as_deref() {
        None => None,
        Some(raw) => match GuideStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                errors.add("status", "must be one of 'draft', 'published'".to_string());
                None
            }
        },
    };

    match difficulty {
        Some(difficulty) if errors.is_empty() => Ok(ValidGuide {
            title: input.title,
            description: input.description,
            category: input.category,
            difficulty,
            time: input.time,
            uk_specific: input.uk_specific,
            tags: input.tags,
            tested_on: input.tested_on,
            content: input.content,
            status,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_input() -> GuideInput {
        GuideInput {
            title: "Setting Up Plex".to_string(),
            description: "Stream your media library at home".to_string(),
            category: "Media".to_string(),
            difficulty: "Beginner".to_string(),
            time: "30 minutes".to_string(),
            tags: vec!["plex".to_string(), "streaming".to_string()],
            content: "## Install\n\nDownload the server package and run it.".to_string(),
            ..GuideInput::default()
        }
    }

    #[test]
    fn accepts_a_well_formed_guide() {
        let guide = validate(valid_input()).unwrap();
        assert_eq!(guide.difficulty, Difficulty::Beginner);
        assert_eq!(guide.status, None);
        assert!(!guide.uk_specific);
    }

    #[test]
    fn collects_errors_per_field() {
        let input = GuideInput {
            title: "ab".to_string(),
            description: "short".to_string(),
            difficulty: "Expert".to_string(),
            status: Some("archived".to_string()),
            tags: vec![String::new(), "x".repeat(31)],
            ..valid_input()
        };
        let errors = validate(input).unwrap_err();
        let fields: Vec<&str> = errors.field_errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["description", "difficulty", "status", "tags", "title"]);
        assert_eq!(errors.field_errors["tags"].len(), 2);
    }

    #[test]
    fn bounds_are_inclusive() {
        let input = GuideInput {
            title: "abc".to_string(),
            description: "x".repeat(500),
            category: "ab".to_string(),
            time: "t".to_string(),
            tags: vec!["t".to_string(); 25],
            tested_on: vec!["x".repeat(60); 20],
            content: "c".repeat(20),
            ..valid_input()
        };
        assert!(validate(input).is_ok());

        let too_many = GuideInput {
            tested_on: vec!["pi".to_string(); 21],
            ..valid_input()
        };
        assert!(validate(too_many).unwrap_err().field_errors.contains_key("testedOn"));
    }

    #[test]
    fn lengths_count_characters_not_bytes() {
        let input = GuideInput {
            title: "Ünï".to_string(),
            ..valid_input()
        };
        assert!(validate(input).is_ok());
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let input: GuideInput = serde_json::from_str(
            r#"{"title":"T","ukSpecific":true,"testedOn":["Pi 5"],"expectedHash":"abc"}"#,
        )
        .unwrap();
        assert!(input.uk_specific);
        assert_eq!(input.tested_on, vec!["Pi 5"]);
        assert_eq!(input.expected_hash.as_deref(), Some("abc"));
        assert!(input.tags.is_empty());
        assert_eq!(input.status, None);
    }
}
