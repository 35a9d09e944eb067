//! Review and movie browsing helpers

use chrono::{DateTime, Utc};
use mrv_common::models::{Movie, Review};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

/// Label for reviews whose movie is not in the movies table
pub const UNKNOWN_MOVIE: &str = "Unknown movie";

/// Order reviews for detail lists: top critics first, then newest first
///
/// Missing or unparseable creation dates sort as the epoch. Stable.
pub fn sort_for_display(reviews: &mut [Review]) {
    reviews.sort_by_key(|r| {
        let created = r.data.created_at().unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        (Reverse(r.data.is_top_critic()), Reverse(created))
    });
}

/// Reviews per movie ems_id
pub fn review_counts(reviews: &[Review]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for review in reviews {
        *counts.entry(review.movie_id.clone()).or_insert(0) += 1;
    }
    counts
}

pub fn top_critic_count(reviews: &[Review]) -> usize {
    reviews.iter().filter(|r| r.data.is_top_critic()).count()
}

/// Movies matching `query` (case-insensitive substring of title or ems_id)
///
/// A blank query matches everything.
pub fn search_movies<'a>(movies: &'a [Movie], query: &str) -> Vec<&'a Movie> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return movies.iter().collect();
    }
    movies
        .iter()
        .filter(|m| {
            m.ems_id.to_lowercase().contains(&needle)
                || m.display_title()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Title lookup by ems_id
#[derive(Debug, Default)]
pub struct MovieIndex {
    titles: HashMap<String, Option<String>>,
}

impl MovieIndex {
    pub fn new(movies: &[Movie]) -> Self {
        let titles = movies
            .iter()
            .map(|m| (m.ems_id.clone(), m.display_title().map(str::to_string)))
            .collect();
        Self { titles }
    }

    /// Display title; `Movie {id}` for untitled movies, `Unknown movie` for
    /// references to movies that don't exist
    pub fn title(&self, ems_id: &str) -> String {
        match self.titles.get(ems_id) {
            Some(Some(title)) => title.clone(),
            Some(None) => format!("Movie {}", ems_id),
            None => UNKNOWN_MOVIE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrv_common::models::{MovieData, ReviewData};

    fn review(id: &str, movie: &str, top: Option<bool>, date: Option<&str>) -> Review {
        Review {
            review_id: id.to_string(),
            movie_id: movie.to_string(),
            data: ReviewData {
                is_top_critic: top,
                creation_date: date.map(str::to_string),
                ..ReviewData::default()
            },
            fetched_at: None,
            workflow_exec_id: None,
        }
    }

    fn movie(id: &str, title: Option<&str>) -> Movie {
        Movie {
            ems_id: id.to_string(),
            title: title.map(str::to_string),
            data: MovieData::default(),
            fetched_at: None,
            workflow_exec_id: None,
        }
    }

    #[test]
    fn test_sort_top_critics_then_newest() {
        let mut reviews = vec![
            review("old", "m", None, Some("2023-01-01")),
            review("undated", "m", None, None),
            review("top-old", "m", Some(true), Some("2022-01-01")),
            review("new", "m", Some(false), Some("2024-06-01")),
            review("top-new", "m", Some(true), Some("2024-01-01")),
            review("garbled", "m", None, Some("last week")),
        ];
        sort_for_display(&mut reviews);
        let order: Vec<&str> = reviews.iter().map(|r| r.review_id.as_str()).collect();
        assert_eq!(order, vec!["top-new", "top-old", "new", "old", "undated", "garbled"]);
    }

    #[test]
    fn test_review_counts_and_top_critics() {
        let reviews = vec![
            review("r1", "m1", Some(true), None),
            review("r2", "m2", None, None),
            review("r3", "m1", None, None),
        ];
        let counts = review_counts(&reviews);
        assert_eq!(counts.get("m1"), Some(&2));
        assert_eq!(counts.get("m2"), Some(&1));
        assert_eq!(top_critic_count(&reviews), 1);
    }

    #[test]
    fn test_search_movies() {
        let movies = vec![
            movie("abc-1", Some("The Matrix")),
            movie("xyz-2", Some("Alien")),
            movie("matrix-3", None),
        ];
        let ids = |found: Vec<&Movie>| found.iter().map(|m| m.ems_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(search_movies(&movies, "MATRIX")), vec!["abc-1", "matrix-3"]);
        assert_eq!(ids(search_movies(&movies, "xyz")), vec!["xyz-2"]);
        assert_eq!(search_movies(&movies, "  ").len(), 3);
        assert!(search_movies(&movies, "nothing").is_empty());
    }

    #[test]
    fn test_movie_index_placeholders() {
        let index = MovieIndex::new(&[movie("m1", Some("Heat")), movie("m2", None)]);
        assert_eq!(index.title("m1"), "Heat");
        assert_eq!(index.title("m2"), "Movie m2");
        assert_eq!(index.title("gone"), UNKNOWN_MOVIE);
    }
}
