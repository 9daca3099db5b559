/// Public search: optional category filter, substring match, then relevance ordering.
use crate::model::GuideMetadata;
use crate::slug::category_to_slug;

pub const DEFAULT_SEARCH_LIMIT: usize = 20;
pub const MAX_SEARCH_LIMIT: usize = 100;

const TITLE_MATCH: u32 = 10;
const DESCRIPTION_MATCH: u32 = 5;
const PER_TAG_MATCH: u32 = 3;

/// Filter and rank `guides` for a search box query.
///
/// `category` matches either the category name (case-insensitive) or its slug. A blank
/// `query` keeps every guide in its original order.
pub fn search_guides(
    guides: Vec<GuideMetadata>,
    query: &str,
    category: Option<&str>,
) -> Vec<GuideMetadata> {
    let mut results: Vec<GuideMetadata> = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => {
            let wanted = category_to_slug(category);
            guides
                .into_iter()
                .filter(|g| {
                    g.category.eq_ignore_ascii_case(category) || category_to_slug(&g.category) == wanted
                })
                .collect()
        }
        None => guides,
    };

    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return results;
    }

    results.retain(|g| searchable_text(g).contains(&query));
    results.sort_by_cached_key(|g| std::cmp::Reverse(score(g, &query)));
    results
}

fn searchable_text(guide: &GuideMetadata) -> String {
    let mut parts = vec![guide.title.as_str(), guide.description.as_str(), guide.category.as_str()];
    parts.extend(guide.tags.iter().map(String::as_str));
    parts.join(" ").to_lowercase()
}

/// `query` must already be lowercase.
fn score(guide: &GuideMetadata, query: &str) -> u32 {
    let mut score = 0;
    if guide.title.to_lowercase().contains(query) {
        score += TITLE_MATCH;
    }
    if guide.description.to_lowercase().contains(query) {
        score += DESCRIPTION_MATCH;
    }
    let tag_matches = guide
        .tags
        .iter()
        .filter(|t| t.to_lowercase().contains(query))
        .count() as u32;
    score + tag_matches * PER_TAG_MATCH
}
