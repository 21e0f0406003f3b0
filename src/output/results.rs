//! Search result rendering

use crate::search::SearchResults;

/// Formats search results the way the command line prints them
///
/// Each hit is its ranking key (score, URL, title and meta on separate
/// lines) followed by a blank line, then the result count and the elapsed
/// time in milliseconds.
pub fn format_results(results: &SearchResults) -> String {
    let mut out = String::new();

    for hit in &results.hits {
        out.push_str(&hit.ranking_key());
        out.push('\n');
    }

    out.push_str(&format!("Returned {} results\n", results.len()));
    out.push_str(&format!(
        "Time (ms): {:.4}\n",
        results.elapsed.as_secs_f64() * 1000.0
    ));

    out
}

/// Prints search results to stdout
pub fn print_results(results: &SearchResults) {
    print!("{}", format_results(results));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchHit;
    use std::time::Duration;

    #[test]
    fn test_format_results() {
        let results = SearchResults {
            hits: vec![
                SearchHit {
                    score: 3,
                    url: "http://b.com".to_string(),
                    title: "B".to_string(),
                    meta: "About B".to_string(),
                },
                SearchHit {
                    score: 2,
                    url: "http://a.com".to_string(),
                    title: String::new(),
                    meta: String::new(),
                },
            ],
            expanded: true,
            elapsed: Duration::from_micros(1500),
        };

        assert_eq!(
            format_results(&results),
            "003\nhttp://b.com\nB\nAbout B\n\n\
             002\nhttp://a.com\n\n\n\n\
             Returned 2 results\n\
             Time (ms): 1.5000\n"
        );
    }

    #[test]
    fn test_format_no_results() {
        let results = SearchResults {
            hits: vec![],
            expanded: true,
            elapsed: Duration::ZERO,
        };
        assert_eq!(
            format_results(&results),
            "Returned 0 results\nTime (ms): 0.0000\n"
        );
    }
}
