//! Keyword and size policy for batches and items.

use std::collections::BTreeSet;
use std::fmt;

use crate::config::FilterConfig;

/// Separators user keyword lists are split on.
const KEYWORD_SEPARATORS: &[char] = &[' ', ',', '\\', ';', '.', ':'];

/// Lowercased keyword set built from free-form entries like `"1080p, x265"`.
pub fn keyword_set<I, S>(entries: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .flat_map(|entry| {
            entry
                .as_ref()
                .split(KEYWORD_SEPARATORS)
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .filter(|k| !k.is_empty())
        .collect()
}

/// Include/exclude/size rules. Immutable for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub include_batch_keywords: BTreeSet<String>,
    pub exclude_batch_keywords: BTreeSet<String>,
    pub include_item_keywords: BTreeSet<String>,
    pub exclude_item_keywords: BTreeSet<String>,
    pub max_batch_size: Option<u64>,
    pub max_item_size: Option<u64>,
}

/// Why a batch or item was not admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoIncludeMatch,
    Excluded { keyword: String },
    TooLarge { size: u64, max: u64 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoIncludeMatch => write!(f, "no include keyword matched"),
            Rejection::Excluded { keyword } => write!(f, "excluded by keyword '{}'", keyword),
            Rejection::TooLarge { size, max } => {
                write!(f, "size {} exceeds limit {}", size, max)
            }
        }
    }
}

impl SelectionPolicy {
    /// Build from config; keyword entries are normalized and a size limit of 0 means unset.
    pub fn from_filters(filters: &FilterConfig) -> Self {
        Self {
            include_batch_keywords: keyword_set(&filters.include_batch_keywords),
            exclude_batch_keywords: keyword_set(&filters.exclude_batch_keywords),
            include_item_keywords: keyword_set(&filters.include_item_keywords),
            exclude_item_keywords: keyword_set(&filters.exclude_item_keywords),
            max_batch_size: filters.max_batch_size.filter(|&n| n > 0),
            max_item_size: filters.max_item_size.filter(|&n| n > 0),
        }
    }

    pub fn admit_batch(&self, name: &str, total_size: u64) -> Result<(), Rejection> {
        admit(
            name,
            total_size,
            &self.include_batch_keywords,
            &self.exclude_batch_keywords,
            self.max_batch_size,
        )
    }

    pub fn admit_item(&self, name: &str, size: u64) -> Result<(), Rejection> {
        admit(
            name,
            size,
            &self.include_item_keywords,
            &self.exclude_item_keywords,
            self.max_item_size,
        )
    }
}

fn admit(
    name: &str,
    size: u64,
    include: &BTreeSet<String>,
    exclude: &BTreeSet<String>,
    max_size: Option<u64>,
) -> Result<(), Rejection> {
    let name = name.to_lowercase();
    // Exclude is checked first so it wins over a matching include.
    if let Some(keyword) = exclude.iter().find(|k| name.contains(k.as_str())) {
        return Err(Rejection::Excluded {
            keyword: keyword.clone(),
        });
    }
    if !include.is_empty() && !include.iter().any(|k| name.contains(k.as_str())) {
        return Err(Rejection::NoIncludeMatch);
    }
    match max_size {
        Some(max) if size > max => Err(Rejection::TooLarge { size, max }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> BTreeSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn keyword_entries_are_split_and_lowercased() {
        let set = keyword_set(["1080P, x265", "eng;ger", " :. "]);
        let got: Vec<_> = set.into_iter().collect();
        assert_eq!(got, vec!["1080p", "eng", "ger", "x265"]);
    }

    #[test]
    fn exclude_wins_over_include() {
        let policy = SelectionPolicy {
            include_item_keywords: set(&["1080p"]),
            exclude_item_keywords: set(&["cam"]),
            ..Default::default()
        };
        assert_eq!(
            policy.admit_item("Movie.1080p.CAM.mkv", 10),
            Err(Rejection::Excluded {
                keyword: "cam".into()
            })
        );
        assert_eq!(policy.admit_item("Movie.1080p.BluRay.mkv", 10), Ok(()));
        assert_eq!(
            policy.admit_item("Movie.720p.mkv", 10),
            Err(Rejection::NoIncludeMatch)
        );
    }

    #[test]
    fn size_gating() {
        let policy = SelectionPolicy {
            max_item_size: Some(1000),
            ..Default::default()
        };
        assert_eq!(
            policy.admit_item("a.mkv", 1500),
            Err(Rejection::TooLarge {
                size: 1500,
                max: 1000
            })
        );
        assert_eq!(policy.admit_item("a.mkv", 900), Ok(()));
        assert_eq!(policy.admit_item("a.mkv", 1000), Ok(()));
    }

    #[test]
    fn batch_rules_are_independent_of_item_rules() {
        let policy = SelectionPolicy {
            include_item_keywords: set(&["1080p"]),
            exclude_batch_keywords: set(&["sample"]),
            max_batch_size: Some(500),
            ..Default::default()
        };
        assert_eq!(policy.admit_batch("Show.S01E02", 500), Ok(()));
        assert!(policy.admit_batch("Show.SAMPLE", 1).is_err());
        assert!(policy.admit_batch("Show", 501).is_err());
    }

    #[test]
    fn from_filters_treats_zero_as_unlimited() {
        let filters = FilterConfig {
            include_item_keywords: vec!["1080p,720p".into()],
            max_batch_size: Some(0),
            max_item_size: Some(2048),
            ..Default::default()
        };
        let policy = SelectionPolicy::from_filters(&filters);
        assert_eq!(policy.include_item_keywords, set(&["1080p", "720p"]));
        assert_eq!(policy.max_batch_size, None);
        assert_eq!(policy.max_item_size, Some(2048));
    }
}
