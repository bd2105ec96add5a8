//! Candidate links and the rule that picks one for a title
//!
//! A candidate qualifies when it points at a movie page on the target site
//! and its visible text contains the title, compared case-insensitively as a
//! plain substring. The first qualifying candidate wins; there is no scoring.

use serde::{Deserialize, Serialize};
use url::Url;

/// A link as seen on a search page: target plus visible text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCandidate {
    pub url: String,
    pub text: String,
}

impl LinkCandidate {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }
}

/// Whether `url` is a movie page on `site_host`
pub fn is_movie_page(url: &str, site_host: &str, movie_path_marker: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let host_matches = parsed
        .host_str()
        .is_some_and(|host| host == site_host || host.ends_with(&format!(".{site_host}")));
    host_matches && parsed.path().contains(movie_path_marker)
}

/// Case-insensitive substring test; an empty title never matches
pub fn text_mentions_title(text: &str, title: &str) -> bool {
    let title = title.trim();
    !title.is_empty() && text.to_lowercase().contains(&title.to_lowercase())
}

/// First candidate that is a movie page on the site and mentions the title
pub fn pick_candidate<'a>(
    candidates: &'a [LinkCandidate],
    title: &str,
    site_host: &str,
    movie_path_marker: &str,
) -> Option<&'a LinkCandidate> {
    candidates.iter().find(|c| {
        is_movie_page(&c.url, site_host, movie_path_marker) && text_mentions_title(&c.text, title)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: &str = "blu-ray.com";
    const MARKER: &str = "/movies/";

    #[test]
    fn test_movie_page_requires_host_and_path() {
        assert!(is_movie_page("https://www.blu-ray.com/movies/Heat-Blu-ray/2398/", HOST, MARKER));
        assert!(is_movie_page("https://blu-ray.com/movies/Heat-Blu-ray/2398/", HOST, MARKER));
        assert!(!is_movie_page("https://www.blu-ray.com/news/?id=1", HOST, MARKER));
        assert!(!is_movie_page("https://notblu-ray.com/movies/x/", HOST, MARKER));
        assert!(!is_movie_page("not a url", HOST, MARKER));
    }

    #[test]
    fn test_title_match_is_case_insensitive_substring() {
        assert!(text_mentions_title("HEAT Blu-ray (Director's Definitive Edition)", "Heat"));
        assert!(!text_mentions_title("Heathers Blu-ray", "Heat 2"));
        assert!(!text_mentions_title("anything", "   "));
    }

    #[test]
    fn test_first_qualifying_candidate_wins() {
        let candidates = vec![
            LinkCandidate::new("https://www.blu-ray.com/news/heat", "Heat news"),
            LinkCandidate::new("https://www.blu-ray.com/movies/Alien/1/", "Alien Blu-ray"),
            LinkCandidate::new("https://www.blu-ray.com/movies/Heat-4K/2/", "Heat 4K Blu-ray"),
            LinkCandidate::new("https://www.blu-ray.com/movies/Heat/3/", "Heat Blu-ray"),
        ];

        let picked = pick_candidate(&candidates, "heat", HOST, MARKER).unwrap();
        assert_eq!(picked.url, "https://www.blu-ray.com/movies/Heat-4K/2/");
    }

    #[test]
    fn test_no_candidate_when_nothing_qualifies() {
        let candidates = vec![LinkCandidate::new("https://example.com/movies/Heat/", "Heat")];
        assert!(pick_candidate(&candidates, "Heat", HOST, MARKER).is_none());
    }
}
