pub use self::glob::GlobPattern;

pub mod glob {
    use std::ops::Deref;

    use ::glob::PatternError;
    use ::serde::{Deserialize, Serialize};

    /// A `glob::Pattern` that reads from and writes to a plain string.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(try_from = "String", into = "String")]
    pub struct GlobPattern(::glob::Pattern);

    impl GlobPattern {
        pub fn parse(pattern: &str) -> Result<Self, PatternError> {
            ::glob::Pattern::new(pattern).map(Self)
        }
    }

    impl Deref for GlobPattern {
        type Target = ::glob::Pattern;

        fn deref(&self) -> &Self::Target {
            &self.0
        }
    }

    impl TryFrom<String> for GlobPattern {
        type Error = PatternError;

        fn try_from(s: String) -> Result<Self, Self::Error> {
            Self::parse(&s)
        }
    }

    impl From<GlobPattern> for String {
        fn from(p: GlobPattern) -> Self {
            p.0.as_str().to_owned()
        }
    }

    #[cfg(test)]
    mod test {
        use super::*;

        #[derive(Debug, Deserialize, Serialize)]
        struct Entry {
            pattern: GlobPattern,
        }

        #[test]
        fn roundtrip_through_toml() {
            let e: Entry = toml::from_str(r#"pattern = "*.[hc]pp""#).unwrap();
            assert!(e.pattern.matches("main.cpp"));
            assert!(e.pattern.matches("lib.hpp"));
            assert!(!e.pattern.matches("main.py"));

            let s = toml::to_string(&e).unwrap();
            assert_eq!(s.trim(), r#"pattern = "*.[hc]pp""#);
        }

        #[test]
        fn invalid_pattern_is_rejected() {
            let res: Result<Entry, _> = toml::from_str(r#"pattern = "[a""#);
            assert!(res.is_err());
        }
    }
}
