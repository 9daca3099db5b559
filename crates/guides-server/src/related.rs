use crate::model::GuideMetadata;

pub const DEFAULT_RELATED_LIMIT: usize = 3;

const SAME_CATEGORY: u32 = 10;
const SAME_DIFFICULTY: u32 = 5;
const SAME_UK_SPECIFIC: u32 = 3;
const PER_SHARED_TAG: u32 = 2;

/// Weighted similarity of `candidate` to `current`.
pub fn relatedness(current: &GuideMetadata, candidate: &GuideMetadata) -> u32 {
    let mut score = 0;
    if candidate.category == current.category {
        score += SAME_CATEGORY;
    }
    if candidate.difficulty == current.difficulty {
        score += SAME_DIFFICULTY;
    }
    if candidate.uk_specific == current.uk_specific {
        score += SAME_UK_SPECIFIC;
    }

    let current_tags: Vec<String> = current.tags.iter().map(|t| t.to_lowercase()).collect();
    let shared = candidate
        .tags
        .iter()
        .filter(|tag| current_tags.contains(&tag.to_lowercase()))
        .count() as u32;
    score + shared * PER_SHARED_TAG
}

/// Up to `limit` guides from `pool` ranked by [`relatedness`], never including `current`.
///
/// Equal scores keep their order in `pool`. There is no minimum score: a small pool
/// still yields `limit` guides.
pub fn find_related_guides(
    current: &GuideMetadata,
    pool: &[GuideMetadata],
    limit: usize,
) -> Vec<GuideMetadata> {
    let mut scored: Vec<(u32, &GuideMetadata)> = pool
        .iter()
        .filter(|g| g.slug != current.slug)
        .map(|g| (relatedness(current, g), g))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, g)| g.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{sample_metadata, Difficulty};

    fn guide(slug: &str, category: &str, difficulty: Difficulty, tags: &[&str]) -> GuideMetadata {
        let mut g = sample_metadata(slug, category);
        g.difficulty = difficulty;
        g.tags = tags.iter().map(|t| t.to_string()).collect();
        g
    }

    #[test]
    fn scores_add_up() {
        let current = guide("net/a", "Networking", Difficulty::Beginner, &["dns", "Pi-hole"]);
        let candidate = guide("net/b", "Networking", Difficulty::Beginner, &["PI-HOLE", "dns", "vpn"]);
        assert_eq!(relatedness(&current, &candidate), 10 + 5 + 3 + 2 * 2);

        let mut unrelated = guide("media/c", "Media", Difficulty::Advanced, &[]);
        unrelated.uk_specific = true;
        assert_eq!(relatedness(&current, &unrelated), 0);
    }

    #[test]
    fn excludes_current_and_respects_limit() {
        let current = guide("net/a", "Networking", Difficulty::Beginner, &[]);
        let pool = vec![
            current.clone(),
            guide("net/b", "Networking", Difficulty::Beginner, &[]),
            guide("net/c", "Networking", Difficulty::Advanced, &[]),
            guide("media/d", "Media", Difficulty::Beginner, &[]),
            guide("media/e", "Media", Difficulty::Advanced, &[]),
        ];

        let related = find_related_guides(&current, &pool, DEFAULT_RELATED_LIMIT);
        assert_eq!(related.len(), 3);
        assert!(related.iter().all(|g| g.slug != current.slug));
        let slugs: Vec<&str> = related.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["net/b", "net/c", "media/d"]);
    }

    #[test]
    fn richer_match_ranks_above_category_only() {
        let current = guide("net/a", "Networking", Difficulty::Intermediate, &["dns"]);
        let mut category_only = guide("net/b", "Networking", Difficulty::Advanced, &[]);
        category_only.uk_specific = true;
        let full = guide("net/c", "Networking", Difficulty::Intermediate, &["DNS"]);

        assert!(relatedness(&current, &full) > relatedness(&current, &category_only));
        let related = find_related_guides(&current, &[category_only, full], 3);
        assert_eq!(related[0].slug, "net/c");
    }

    #[test]
    fn ties_keep_pool_order_and_zero_scores_are_eligible() {
        let mut current = guide("net/a", "Networking", Difficulty::Beginner, &[]);
        current.uk_specific = true;
        let pool = vec![
            guide("x/one", "Other", Difficulty::Advanced, &[]),
            guide("x/two", "Other", Difficulty::Advanced, &[]),
        ];
        let related = find_related_guides(&current, &pool, 3);
        let slugs: Vec<&str> = related.iter().map(|g| g.slug.as_str()).collect();
        assert_eq!(slugs, vec!["x/one", "x/two"]);
    }
}
