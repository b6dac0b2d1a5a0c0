/// Launch query parsing
///
/// The tool is seeded from a query string passed as the first
/// command-line argument, e.g. `?w=800&h=600&o=50&url=https://example.com`.
use std::collections::HashMap;
use url::form_urlencoded;

use super::data::MAX_OPACITY;

/// Values recognised in the launch query. Absent or unusable
/// parameters are `None` and leave the initial value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchQuery {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub opacity: Option<u8>,
    pub url: Option<String>,
}

impl LaunchQuery {
    /// Parse a query string, with or without its leading `?`
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let query = query.strip_prefix('?').unwrap_or(query);

        // First occurrence of each key wins, even when its value is unusable
        let mut first: HashMap<String, String> = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            first.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }

        let url = first
            .get("url")
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned);

        LaunchQuery {
            width: first.get("w").and_then(|v| positive(v)),
            height: first.get("h").and_then(|v| positive(v)),
            opacity: first.get("o").and_then(|v| percent(v)),
            url,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == LaunchQuery::default()
    }
}

fn positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|v| *v > 0)
}

fn percent(value: &str) -> Option<u8> {
    let value = value.trim().parse::<i64>().ok()?;
    Some(value.clamp(0, i64::from(MAX_OPACITY)) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_query() {
        let query = LaunchQuery::parse("?w=800&h=600&o=50&url=https://example.com");
        assert_eq!(
            query,
            LaunchQuery {
                width: Some(800),
                height: Some(600),
                opacity: Some(50),
                url: Some("https://example.com".into()),
            }
        );
    }

    #[test]
    fn test_without_question_mark_and_encoded_url() {
        let query = LaunchQuery::parse("url=http%3A%2F%2Flocalhost%3A3000%2F%3Fa%3Db&o=20");
        assert_eq!(query.url.as_deref(), Some("http://localhost:3000/?a=b"));
        assert_eq!(query.opacity, Some(20));
        assert_eq!(query.width, None);
    }

    #[test]
    fn test_non_numeric_values_ignored() {
        let query = LaunchQuery::parse("?w=wide&h=-5&o=lots&url=");
        assert!(query.is_empty());
    }

    #[test]
    fn test_opacity_is_clamped() {
        assert_eq!(LaunchQuery::parse("o=250").opacity, Some(100));
        assert_eq!(LaunchQuery::parse("o=-3").opacity, Some(0));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let query = LaunchQuery::parse("w=100&w=200&h=tall&h=300");
        assert_eq!(query.width, Some(100));
        assert_eq!(query.height, None);
    }
}
