//! Decomposes one utility class (`sm:hover:-mt-4`, `w-[123px]`) into its
//! variant prefixes, sign, utility family and value.

use serde::Serialize;

static ARBITRARY_RE: once_cell::sync::Lazy<regex::Regex> =
    once_cell::sync::Lazy::new(|| regex::Regex::new(r"^([a-z0-9-]+)-\[(.+)\]$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassToken {
    pub raw: String,
    pub variants: Vec<String>,
    pub negative: bool,
    pub utility: String,
    pub value: String,
    pub arbitrary: bool,
}

impl ClassToken {
    /// `utility-value`, or just `utility` when the value is empty.
    pub fn base(&self) -> String {
        if self.value.is_empty() {
            self.utility.clone()
        } else if self.arbitrary {
            format!("{}-[{}]", self.utility, self.value)
        } else {
            format!("{}-{}", self.utility, self.value)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClassTokenizer {
    variants: Vec<String>,
}

impl ClassTokenizer {
    pub fn new(variants: Vec<String>) -> Self {
        Self { variants }
    }

    fn is_variant(&self, name: &str) -> bool {
        self.variants.iter().any(|v| v == name)
    }

    pub fn tokenize(&self, class: &str) -> Option<ClassToken> {
        let raw = class.trim();
        if raw.is_empty() {
            return None;
        }

        let mut rest = raw;
        let mut variants = Vec::new();
        while let Some((prefix, tail)) = rest.split_once(':') {
            if !self.is_variant(prefix) {
                break;
            }
            variants.push(prefix.to_string());
            rest = tail;
        }

        let negative = rest.starts_with('-');
        if negative {
            rest = &rest[1..];
        }

        if let Some(caps) = ARBITRARY_RE.captures(rest) {
            return Some(ClassToken {
                raw: raw.to_string(),
                variants,
                negative,
                utility: caps[1].to_string(),
                value: caps[2].to_string(),
                arbitrary: true,
            });
        }

        let (utility, value) = match rest.rfind('-') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };
        Some(ClassToken {
            raw: raw.to_string(),
            variants,
            negative,
            utility: utility.to_string(),
            value: value.to_string(),
            arbitrary: false,
        })
    }

    /// Tokenizes a whitespace-separated class list, skipping empty entries.
    pub fn tokenize_classes(&self, classes: &str) -> Vec<ClassToken> {
        classes
            .split_whitespace()
            .filter_map(|c| self.tokenize(c))
            .collect()
    }
}

impl Default for ClassTokenizer {
    fn default() -> Self {
        Self::new(crate::rules::tables::RuleTables::default().variants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(class: &str) -> ClassToken {
        ClassTokenizer::default().tokenize(class).unwrap()
    }

    #[test]
    fn test_plain_utility() {
        let t = tok("flex");
        assert_eq!(t.utility, "flex");
        assert_eq!(t.value, "");
        assert!(!t.arbitrary);
        assert!(!t.negative);
        assert!(t.variants.is_empty());
        assert_eq!(t.base(), "flex");
    }

    #[test]
    fn test_negative_spacing() {
        let t = tok("-mt-4");
        assert!(t.negative);
        assert_eq!(t.utility, "mt");
        assert_eq!(t.value, "4");
    }

    #[test]
    fn test_arbitrary_value() {
        let t = tok("w-[123px]");
        assert!(t.arbitrary);
        assert_eq!(t.utility, "w");
        assert_eq!(t.value, "123px");
        assert_eq!(t.base(), "w-[123px]");
    }

    #[test]
    fn test_stacked_variants() {
        let t = tok("sm:hover:bg-blue-500");
        assert_eq!(t.variants, vec!["sm", "hover"]);
        assert_eq!(t.utility, "bg-blue");
        assert_eq!(t.value, "500");
    }

    #[test]
    fn test_dark_variant() {
        let t = tok("dark:text-white");
        assert_eq!(t.variants, vec!["dark"]);
        assert_eq!(t.utility, "text");
        assert_eq!(t.value, "white");
    }

    #[test]
    fn test_value_with_hyphens_splits_on_last() {
        let t = tok("bg-blue-500");
        assert_eq!(t.utility, "bg-blue");
        assert_eq!(t.value, "500");
        assert_eq!(t.base(), "bg-blue-500");
    }

    #[test]
    fn test_unknown_prefix_stops_variant_stripping() {
        let t = tok("supports:grid-cols-2");
        assert!(t.variants.is_empty());
        assert_eq!(t.utility, "supports:grid-cols");
        assert_eq!(t.value, "2");
    }

    #[test]
    fn test_variant_prefixes_do_not_change_base() {
        let tokenizer = ClassTokenizer::default();
        for base in ["grid-cols-3", "-mx-2", "max-w-[40rem]", "text-9xl", "flex"] {
            let plain = tokenizer.tokenize(base).unwrap();
            let prefixed = tokenizer.tokenize(&format!("md:focus:{}", base)).unwrap();
            assert_eq!(prefixed.variants, vec!["md", "focus"]);
            assert_eq!(
                (&prefixed.utility, &prefixed.value, prefixed.negative, prefixed.arbitrary),
                (&plain.utility, &plain.value, plain.negative, plain.arbitrary)
            );
        }
    }

    #[test]
    fn test_empty_and_dash_only() {
        let tokenizer = ClassTokenizer::default();
        assert!(tokenizer.tokenize("   ").is_none());
        let t = tokenizer.tokenize("-").unwrap();
        assert!(t.negative);
        assert_eq!(t.utility, "");
        assert_eq!(t.value, "");
    }

    #[test]
    fn test_tokenize_classes_splits_whitespace() {
        let tokens = ClassTokenizer::default().tokenize_classes("  px-4\n py-2  hover:underline ");
        let bases: Vec<String> = tokens.iter().map(|t| t.base()).collect();
        assert_eq!(bases, vec!["px-4", "py-2", "underline"]);
    }
}
