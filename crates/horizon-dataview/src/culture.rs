//! Culture-sensitive string comparison.
//!
//! A [`Culture`] decides how text keys sort and whether two text group keys
//! name the same group. With the `localization` feature each culture builds
//! ICU collators for its BCP 47 tag, so `"ä"` sorts with `"a"` in German and
//! after `"z"` in Swedish. Tags ICU cannot parse fall back to the root
//! collation, which is also what the invariant culture uses. Distinct
//! strings never compare equal: ordinal comparison breaks collation ties.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
#[cfg(feature = "localization")]
use std::rc::Rc;

#[cfg(feature = "localization")]
use icu::collator::options::{CollatorOptions, Strength};
#[cfg(feature = "localization")]
use icu::collator::{Collator, CollatorBorrowed, CollatorPreferences};

#[cfg(feature = "localization")]
use horizon_dataview_core::logging::targets;

/// String comparison mode used when matching text keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "settings", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "settings", serde(rename_all = "snake_case"))]
pub enum StringComparison {
    /// Exact code point comparison.
    #[default]
    Ordinal,
    /// Code point comparison after case folding.
    OrdinalIgnoreCase,
    /// Culture-sensitive comparison.
    Culture,
    /// Culture-sensitive comparison ignoring case.
    CultureIgnoreCase,
}

/// Case-sensitive and case-insensitive collators for one culture.
#[cfg(feature = "localization")]
struct Collators {
    cased: CollatorBorrowed<'static>,
    caseless: CollatorBorrowed<'static>,
}

#[cfg(feature = "localization")]
impl Collators {
    fn build(name: &str) -> Option<Rc<Self>> {
        let prefs = if name.is_empty() {
            CollatorPreferences::default()
        } else {
            match name.parse::<icu::locale::Locale>() {
                Ok(locale) => locale.into(),
                Err(error) => {
                    tracing::warn!(
                        target: targets::DESCRIPTION,
                        culture = name,
                        %error,
                        "unknown culture tag, using root collation"
                    );
                    CollatorPreferences::default()
                }
            }
        };

        let mut caseless_options = CollatorOptions::default();
        caseless_options.strength = Some(Strength::Secondary);
        let built = Collator::try_new(prefs.clone(), CollatorOptions::default()).and_then(|cased| {
            Collator::try_new(prefs, caseless_options).map(|caseless| (cased, caseless))
        });
        match built {
            Ok((cased, caseless)) => Some(Rc::new(Self { cased, caseless })),
            Err(error) => {
                tracing::warn!(
                    target: targets::DESCRIPTION,
                    culture = name,
                    %error,
                    "no collation data, comparing ordinally"
                );
                None
            }
        }
    }
}

/// A named culture.
///
/// The name is a BCP 47 tag such as `"en-US"`; the invariant culture has an
/// empty name. Cultures are equal when their names are.
#[derive(Clone)]
pub struct Culture {
    name: String,
    #[cfg(feature = "localization")]
    collators: Option<Rc<Collators>>,
}

impl Culture {
    /// Create a culture from a BCP 47 tag.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            #[cfg(feature = "localization")]
            collators: Collators::build(&name),
            name,
        }
    }

    /// The invariant culture.
    pub fn invariant() -> Self {
        Self::new("")
    }

    /// The culture of the current user, as reported by the operating system.
    ///
    /// Falls back to the invariant culture when the locale is unknown.
    #[cfg(feature = "localization")]
    pub fn current() -> Self {
        sys_locale::get_locale()
            .map(Self::new)
            .unwrap_or_else(Self::invariant)
    }

    /// The culture of the current user. Without locale detection this is the
    /// invariant culture.
    #[cfg(not(feature = "localization"))]
    pub fn current() -> Self {
        Self::invariant()
    }

    /// The culture's BCP 47 tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this is the invariant culture.
    pub fn is_invariant(&self) -> bool {
        self.name.is_empty()
    }

    /// Culture-sensitive comparison.
    ///
    /// # Example
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use horizon_dataview::Culture;
    ///
    /// let culture = Culture::invariant();
    /// assert_eq!(culture.compare("apple", "Banana"), Ordering::Less);
    /// assert_eq!(culture.compare("a", "A"), Ordering::Less);
    /// ```
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collate(a, b, false).then_with(|| a.cmp(b))
    }

    /// Culture-sensitive comparison ignoring case.
    pub fn compare_ignore_case(&self, a: &str, b: &str) -> Ordering {
        self.collate(a, b, true)
    }

    #[cfg(feature = "localization")]
    fn collate(&self, a: &str, b: &str, ignore_case: bool) -> Ordering {
        match (&self.collators, ignore_case) {
            (Some(collators), false) => collators.cased.compare(a, b),
            (Some(collators), true) => collators.caseless.compare(a, b),
            (None, _) => fold_cmp(a, b),
        }
    }

    #[cfg(not(feature = "localization"))]
    fn collate(&self, a: &str, b: &str, _ignore_case: bool) -> Ordering {
        fold_cmp(a, b)
    }

    /// Compare two strings using the given mode.
    pub fn compare_with(&self, a: &str, b: &str, comparison: StringComparison) -> Ordering {
        match comparison {
            StringComparison::Ordinal => a.cmp(b),
            StringComparison::OrdinalIgnoreCase => fold_cmp(a, b),
            StringComparison::Culture => self.compare(a, b),
            StringComparison::CultureIgnoreCase => self.compare_ignore_case(a, b),
        }
    }

    /// Check two strings for equality using the given mode.
    pub fn equals(&self, a: &str, b: &str, comparison: StringComparison) -> bool {
        self.compare_with(a, b, comparison) == Ordering::Equal
    }

    /// Case-insensitive substring test.
    pub fn contains_ignore_case(&self, haystack: &str, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        haystack.to_lowercase().contains(&needle.to_lowercase())
    }
}

impl Default for Culture {
    fn default() -> Self {
        Self::invariant()
    }
}

impl PartialEq for Culture {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Culture {}

impl Hash for Culture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Culture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Culture").field("name", &self.name).finish()
    }
}

fn fold_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}
