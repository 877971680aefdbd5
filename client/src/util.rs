use url::Url;

use crate::error::*;

pub fn parse_url(url: impl AsRef<str>) -> Result<Url> {
    match Url::parse(url.as_ref()) {
        Ok(url) => Ok(url),
        Err(e) => Err(Error::InvalidSyntaxUrl {
            url: url.as_ref().to_owned(),
            source: e,
        }),
    }
}

/// Joins `path` onto `base` keeping every segment of `base`.
pub fn join_path(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_join_path() {
        let base = parse_url("http://localhost:2000").unwrap();
        assert_eq!(
            join_path(&base, "/api/v2/execute"),
            "http://localhost:2000/api/v2/execute"
        );

        // Trailling slash and path segments of base are preserved:
        let base = parse_url("https://emkc.org/api/v2/piston/").unwrap();
        assert_eq!(
            join_path(&base, "execute"),
            "https://emkc.org/api/v2/piston/execute"
        );
    }

    #[test]
    fn test_parse_url_error() {
        let err = parse_url("not a url").unwrap_err();
        assert!(matches!(err, Error::InvalidSyntaxUrl { .. }));
    }
}
