//! Raw SQL fragments for JSONB operations not covered by Diesel's DSL.

/// `tags ?| $1` — true when the row's JSONB string array shares at least
/// one element with the bound text array.
///
/// # Safety
/// The tag list MUST be passed via `.bind()`, not interpolated.
#[macro_export]
macro_rules! tags_overlap {
    ($tags:expr) => {
        diesel::dsl::sql::<diesel::sql_types::Bool>("tags ?| ")
            .bind::<diesel::sql_types::Array<diesel::sql_types::Text>, _>($tags)
    };
}

/// Split a `?tags=a,b,c` query parameter into trimmed, non-empty tags.
pub fn parse_tags_param(tags: Option<&str>) -> Vec<String> {
    tags.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Build an ILIKE pattern for a substring search, escaping `%` and `_`.
pub fn like_pattern(search: &str) -> String {
    format!("%{}%", search.replace('%', "\\%").replace('_', "\\_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags_param() {
        assert_eq!(
            parse_tags_param(Some("sweet, citrus ,,bitter")),
            vec!["sweet", "citrus", "bitter"]
        );
        assert!(parse_tags_param(Some("")).is_empty());
        assert!(parse_tags_param(None).is_empty());
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100% agave"), "%100\\% agave%");
        assert_eq!(like_pattern("old_tom"), "%old\\_tom%");
    }
}
