//! Review source aggregation
//!
//! A source is the domain of a review's URL with any leading `www.` removed.
//! Sources are derived on every load and never persisted.
//!
//! Grouping does not depend on input order; the ranking applies an explicit
//! stable sort by count descending, so equal counts keep first-encounter order.
//! Reviews without a parseable URL are left out of every count.

use mrv_common::models::Review;
use serde::Serialize;
use std::collections::HashMap;
use url::Url;

/// Number of ranked sources returned in a summary by default
pub const DEFAULT_TOP_SOURCES: usize = 100;

/// Domain of a source URL, lowercased, without a leading `www.`
///
/// Returns None for anything that doesn't parse as an absolute URL with a host.
pub fn extract_domain(raw_url: &str) -> Option<String> {
    let parsed = Url::parse(raw_url.trim()).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        None
    } else {
        Some(domain.to_string())
    }
}

/// Domain of a review's source URL (`reviewUrl`, then `publicationUrl`)
pub fn review_domain(review: &Review) -> Option<String> {
    review.data.source_url().and_then(extract_domain)
}

/// One ranked source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSource {
    pub domain: String,
    /// First non-empty publication name seen for this domain
    pub publication_name: Option<String>,
    pub count: usize,
}

/// Incremental domain grouping
#[derive(Debug, Default)]
pub struct SourceAggregator {
    index: HashMap<String, usize>,
    sources: Vec<ReviewSource>,
    skipped: usize,
}

impl SourceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one review; returns false when its URL is missing or unparseable
    pub fn add(&mut self, review: &Review) -> bool {
        let Some(domain) = review_domain(review) else {
            self.skipped += 1;
            return false;
        };
        let publication_name = review.data.publication_name();

        match self.index.get(&domain) {
            Some(&slot) => {
                let source = &mut self.sources[slot];
                source.count += 1;
                if source.publication_name.is_none() {
                    source.publication_name = publication_name.map(str::to_string);
                }
            }
            None => {
                self.index.insert(domain.clone(), self.sources.len());
                self.sources.push(ReviewSource {
                    domain,
                    publication_name: publication_name.map(str::to_string),
                    count: 1,
                });
            }
        }
        true
    }

    /// Reviews left out because they had no usable URL
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Sources sorted by count descending; ties keep first-encounter order
    pub fn into_ranking(self) -> Vec<ReviewSource> {
        let mut sources = self.sources;
        sources.sort_by(|a, b| b.count.cmp(&a.count));
        sources
    }
}

/// Group reviews by source domain and rank by frequency
pub fn rank_sources<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> Vec<ReviewSource> {
    let mut aggregator = SourceAggregator::new();
    for review in reviews {
        aggregator.add(review);
    }
    tracing::debug!(
        sources = aggregator.sources.len(),
        skipped = aggregator.skipped(),
        "Aggregated review sources"
    );
    aggregator.into_ranking()
}

/// Distinct-domain counts by frequency class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrequencyBuckets {
    /// Exactly one review
    pub single: usize,
    /// 2 to 4 reviews
    pub few: usize,
    /// 5 to 9 reviews
    pub several: usize,
    /// 10 or more reviews
    pub many: usize,
}

impl FrequencyBuckets {
    /// Bucket every source in the ranking, not a truncated slice of it
    pub fn from_sources(sources: &[ReviewSource]) -> Self {
        sources.iter().fold(Self::default(), |mut buckets, source| {
            match source.count {
                0 => {}
                1 => buckets.single += 1,
                2..=4 => buckets.few += 1,
                5..=9 => buckets.several += 1,
                _ => buckets.many += 1,
            }
            buckets
        })
    }

    pub fn total(&self) -> usize {
        self.single + self.few + self.several + self.many
    }
}

/// Ranking summary for the sources view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub total_sources: usize,
    pub total_reviews: usize,
    /// Largest count, used for relative bar widths; 0 when empty
    pub max_count: usize,
    pub buckets: FrequencyBuckets,
    /// Top of the ranking
    pub sources: Vec<ReviewSource>,
}

impl SourceSummary {
    /// Summarize a full ranking, keeping the first `top` entries
    pub fn from_ranking(ranking: Vec<ReviewSource>, top: usize) -> Self {
        let buckets = FrequencyBuckets::from_sources(&ranking);
        let total_reviews = ranking.iter().map(|s| s.count).sum();
        let max_count = ranking.first().map_or(0, |s| s.count);
        let total_sources = ranking.len();
        let mut sources = ranking;
        sources.truncate(top);

        Self {
            total_sources,
            total_reviews,
            max_count,
            buckets,
            sources,
        }
    }
}

/// Reviews whose source domain equals `domain`
pub fn reviews_from_domain<'a>(reviews: &'a [Review], domain: &str) -> Vec<&'a Review> {
    reviews
        .iter()
        .filter(|review| review_domain(review).as_deref() == Some(domain))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_common::models::ReviewData;

    fn review(id: &str, url: Option<&str>, publication: Option<&str>) -> Review {
        Review {
            review_id: id.to_string(),
            movie_id: "m1".to_string(),
            data: ReviewData {
                review_url: url.map(str::to_string),
                publication_name: publication.map(str::to_string),
                ..ReviewData::default()
            },
            fetched_at: None,
            workflow_exec_id: None,
        }
    }

    fn repeat(domain: &str, n: usize) -> Vec<Review> {
        (0..n)
            .map(|i| review(&format!("{domain}-{i}"), Some(&format!("https://{domain}/{i}")), None))
            .collect()
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://www.NYT.com/a"), Some("nyt.com".to_string()));
        assert_eq!(extract_domain("http://nyt.com/b"), Some("nyt.com".to_string()));
        assert_eq!(
            extract_domain("https://www.theguardian.co.uk/film?x=1"),
            Some("theguardian.co.uk".to_string())
        );
        assert_eq!(extract_domain("https://wwwfoo.com"), Some("wwwfoo.com".to_string()));
        assert_eq!(extract_domain("not a url"), None);
        assert_eq!(extract_domain(""), None);
        assert_eq!(extract_domain("mailto:critic@example.com"), None);
    }

    #[test]
    fn test_first_non_empty_publication_name_wins() {
        let reviews = vec![
            review("r1", Some("https://www.NYT.com/a"), Some("NYT")),
            review("r2", Some("http://nyt.com/b"), Some("")),
        ];
        let ranking = rank_sources(&reviews);
        assert_eq!(
            ranking,
            vec![ReviewSource {
                domain: "nyt.com".to_string(),
                publication_name: Some("NYT".to_string()),
                count: 2,
            }]
        );
    }

    #[test]
    fn test_later_name_fills_missing_but_never_overwrites() {
        let reviews = vec![
            review("r1", Some("https://variety.com/1"), None),
            review("r2", Some("https://variety.com/2"), Some("Variety")),
            review("r3", Some("https://variety.com/3"), Some("Variety Magazine")),
        ];
        let ranking = rank_sources(&reviews);
        assert_eq!(ranking[0].publication_name.as_deref(), Some("Variety"));
    }

    #[test]
    fn test_unparseable_urls_are_excluded() {
        let reviews = vec![
            review("r1", Some("not a url"), Some("Nobody")),
            review("r2", None, None),
            review("r3", Some("https://rogerebert.com/x"), None),
        ];
        let mut aggregator = SourceAggregator::new();
        for r in &reviews {
            aggregator.add(r);
        }
        assert_eq!(aggregator.skipped(), 2);

        let ranking = aggregator.into_ranking();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].domain, "rogerebert.com");

        let buckets = FrequencyBuckets::from_sources(&ranking);
        assert_eq!(buckets.total(), 1);
    }

    #[test]
    fn test_ranking_is_descending_and_stable() {
        let mut reviews = Vec::new();
        reviews.extend(repeat("a.com", 2));
        reviews.extend(repeat("b.com", 3));
        reviews.extend(repeat("c.com", 2));
        reviews.extend(repeat("d.com", 1));

        let ranking = rank_sources(&reviews);
        let domains: Vec<&str> = ranking.iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(domains, vec!["b.com", "a.com", "c.com", "d.com"]);
    }

    #[test]
    fn test_counts_sum_to_parseable_reviews() {
        let mut reviews = repeat("a.com", 4);
        reviews.push(review("bad", Some("::::"), None));
        reviews.extend(repeat("b.com", 2));

        let ranking = rank_sources(&reviews);
        let summed: usize = ranking.iter().map(|s| s.count).sum();
        assert_eq!(summed, 6);
    }

    #[test]
    fn test_drifted_payload_fields_still_count() {
        use mrv_common::models::{decode_rows, TABLE_REVIEWS};
        use serde_json::json;

        let rows = [
            json!({"review_id": "r1", "movie_id": "m1",
                "data": {"reviewUrl": "https://www.nyt.com/a", "isTopCritic": "true"}}),
            json!({"review_id": "r2", "movie_id": "m1",
                "data": {"reviewUrl": "https://nyt.com/b", "creationDate": 1700000000}}),
            json!({"review_id": "r3", "movie_id": "m1",
                "data": {"reviewUrl": "https://nyt.com/c", "publicationName": 12}}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect();
        let reviews: Vec<Review> = decode_rows(TABLE_REVIEWS, rows);

        let ranking = rank_sources(&reviews);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].domain, "nyt.com");
        assert_eq!(ranking[0].count, 3);
    }

    #[test]
    fn test_grouping_is_order_independent() {
        let mut reviews = repeat("a.com", 3);
        reviews.extend(repeat("b.com", 1));
        let forward: HashMap<String, usize> =
            rank_sources(&reviews).into_iter().map(|s| (s.domain, s.count)).collect();

        reviews.reverse();
        let backward: HashMap<String, usize> =
            rank_sources(&reviews).into_iter().map(|s| (s.domain, s.count)).collect();

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_frequency_bucket_boundaries() {
        let mut reviews = Vec::new();
        for (domain, n) in [("one.com", 1), ("two.com", 2), ("four.com", 4), ("five.com", 5), ("nine.com", 9), ("ten.com", 10), ("big.com", 25)] {
            reviews.extend(repeat(domain, n));
        }
        let ranking = rank_sources(&reviews);
        let buckets = FrequencyBuckets::from_sources(&ranking);

        assert_eq!(
            buckets,
            FrequencyBuckets {
                single: 1,
                few: 2,
                several: 2,
                many: 2
            }
        );
        assert_eq!(buckets.total(), ranking.len());
    }

    #[test]
    fn test_empty_input() {
        let summary = SourceSummary::from_ranking(rank_sources(&Vec::<Review>::new()), DEFAULT_TOP_SOURCES);
        assert!(summary.sources.is_empty());
        assert_eq!(summary.buckets, FrequencyBuckets::default());
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.max_count, 0);
    }

    #[test]
    fn test_single_domain_takes_all_reviews() {
        let reviews = repeat("indiewire.com", 7);
        let ranking = rank_sources(&reviews);
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].count, 7);
    }

    #[test]
    fn test_summary_buckets_cover_truncated_tail() {
        let mut reviews = repeat("a.com", 3);
        reviews.extend(repeat("b.com", 1));
        reviews.extend(repeat("c.com", 1));

        let summary = SourceSummary::from_ranking(rank_sources(&reviews), 1);
        assert_eq!(summary.sources.len(), 1);
        assert_eq!(summary.total_sources, 3);
        assert_eq!(summary.total_reviews, 5);
        assert_eq!(summary.max_count, 3);
        assert_eq!(summary.buckets.single, 2);
        assert_eq!(summary.buckets.few, 1);
    }

    #[test]
    fn test_reviews_from_domain() {
        let reviews = vec![
            review("r1", Some("https://www.nyt.com/a"), None),
            review("r2", Some("https://variety.com/b"), None),
            review("r3", Some("not a url"), None),
            review("r4", Some("http://NYT.com/c"), None),
        ];
        let ids: Vec<&str> = reviews_from_domain(&reviews, "nyt.com")
            .iter()
            .map(|r| r.review_id.as_str())
            .collect();
        assert_eq!(ids, vec!["r1", "r4"]);
    }
}
