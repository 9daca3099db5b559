use std::collections::HashSet;

use guides_common::api::{DifficultyCounts, GuideStatsResponse};

use crate::model::{Difficulty, GuideMetadata};

/// Aggregate counts over a set of guides for the admin dashboard.
pub fn guide_stats(guides: &[GuideMetadata]) -> GuideStatsResponse {
    let mut difficulties = DifficultyCounts::default();
    for guide in guides {
        match guide.difficulty {
            Difficulty::Beginner => difficulties.beginner += 1,
            Difficulty::Intermediate => difficulties.intermediate += 1,
            Difficulty::Advanced => difficulties.advanced += 1,
        }
    }

    let categories: HashSet<&str> = guides.iter().map(|g| g.category.as_str()).collect();
    let tags: HashSet<&str> = guides
        .iter()
        .flat_map(|g| g.tags.iter().map(String::as_str))
        .collect();

    GuideStatsResponse {
        total_guides: guides.len(),
        categories: categories.len(),
        difficulties,
        uk_specific: guides.iter().filter(|g| g.uk_specific).count(),
        total_tags: tags.len(),
    }
}
