//! Declarative view settings.
//!
//! [`ViewSettings`] describes how a view is shaped using property paths
//! only, so it can be stored next to an application's other configuration
//! and loaded back from TOML or JSON:
//!
//! ```toml
//! culture = "en-US"
//!
//! [[sort]]
//! path = "name"
//! direction = "descending"
//!
//! [[group]]
//! path = "country"
//! keys = ["NO", "SE"]
//! string_comparison = "ordinal_ignore_case"
//!
//! [[filter]]
//! path = "name"
//! conditions = ["smith"]
//! ```
//!
//! A section left out keeps whatever the view already has; an empty list
//! clears it.

use horizon_dataview_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::culture::{Culture, StringComparison};
use crate::description::{FilterDescription, GroupDescription, GroupKey, SortDescription, SortDirection};
use crate::error::{CollectionError, Result};
use crate::item::ViewItem;
use crate::value::Value;
use crate::view::CollectionView;

/// A scalar in settings files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl SettingValue {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Int(n) => Some(Self::Int(*n)),
            Value::Float(n) => Some(Self::Float(*n)),
            Value::Text(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl From<SettingValue> for Value {
    fn from(value: SettingValue) -> Self {
        match value {
            SettingValue::Bool(b) => Value::Bool(b),
            SettingValue::Int(n) => Value::Int(n),
            SettingValue::Float(n) => Value::Float(n),
            SettingValue::Text(s) => Value::Text(s),
        }
    }
}

/// One sort level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSetting {
    /// Property path of the sort key.
    pub path: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// One grouping level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSetting {
    /// Property path of the group key.
    pub path: String,
    /// Explicit group keys, created even when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default)]
    pub string_comparison: StringComparison,
}

/// One filter; an item passes if any condition matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSetting {
    /// Property path of the filtered value.
    pub path: String,
    #[serde(default)]
    pub conditions: Vec<SettingValue>,
}

/// Declarative shape of a view.
///
/// Every part is optional. A part left out is not touched when the settings
/// are applied, while an empty list clears that part of the view.
///
/// ```
/// use horizon_dataview::ViewSettings;
///
/// let settings = ViewSettings::from_toml_str(
///     r#"
/// culture = "de-DE"
/// group = []
///
/// [[sort]]
/// path = "name"
/// "#,
/// )?;
/// assert_eq!(settings.sort.map(|sort| sort.len()), Some(1));
/// assert_eq!(settings.group, Some(Vec::new()));
/// assert!(settings.filter.is_none());
/// # Ok::<(), horizon_dataview::CollectionError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// BCP 47 tag of the culture used for text comparison; empty for the
    /// invariant culture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub culture: Option<String>,
    /// Sort levels, most significant first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortSetting>>,
    /// Grouping levels, outermost first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Vec<GroupSetting>>,
    /// Filters; an item must pass all of them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Vec<FilterSetting>>,
}

impl ViewSettings {
    /// Parse settings from TOML.
    ///
    /// # Errors
    ///
    /// [`Settings`](CollectionError::Settings) if the text does not parse.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CollectionError::settings(e.to_string()))
    }

    /// Parse settings from JSON.
    ///
    /// # Errors
    ///
    /// [`Settings`](CollectionError::Settings) if the text does not parse.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CollectionError::settings(e.to_string()))
    }

    /// Serialize to TOML.
    ///
    /// # Errors
    ///
    /// [`Settings`](CollectionError::Settings) if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CollectionError::settings(e.to_string()))
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// [`Settings`](CollectionError::Settings) if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CollectionError::settings(e.to_string()))
    }

    /// Capture the path-based part of a view's shape. Descriptions built
    /// from closures have no declarative form and are left out.
    pub fn capture<T: ViewItem, V: CollectionView<T> + ?Sized>(view: &V) -> Self {
        let sort = view
            .sort_descriptions()
            .iter()
            .filter_map(|description| {
                Some(SortSetting {
                    path: description.property_path()?.to_string(),
                    direction: description.direction(),
                })
            })
            .collect();
        let group = view
            .group_descriptions()
            .iter()
            .filter_map(|description| {
                Some(GroupSetting {
                    path: description.property_name()?.to_string(),
                    keys: description
                        .group_keys()
                        .iter()
                        .filter_map(|key| match key {
                            GroupKey::Value(Value::Text(text)) => Some(text.clone()),
                            _ => None,
                        })
                        .collect(),
                    string_comparison: description.string_comparison(),
                })
            })
            .collect();
        let filter = view
            .filter_descriptions()
            .iter()
            .filter_map(|description| {
                Some(FilterSetting {
                    path: description.property_path()?.to_string(),
                    conditions: description
                        .conditions()
                        .iter()
                        .filter_map(SettingValue::from_value)
                        .collect(),
                })
            })
            .collect();

        Self {
            culture: Some(view.culture().name().to_string()),
            sort: Some(sort),
            group: Some(group),
            filter: Some(filter),
        }
    }

    /// Apply to a view inside one deferred refresh scope, so the view
    /// refreshes once.
    ///
    /// # Errors
    ///
    /// The first error of a setter (for example
    /// [`NotSupported`](CollectionError::NotSupported) when the view cannot
    /// sort), else the error of the final refresh.
    pub fn apply<T: ViewItem, V: CollectionView<T> + ?Sized>(&self, view: &mut V) -> Result<()> {
        view.begin_defer_refresh();
        let applied = self.apply_deferred(view);
        let refreshed = view.end_defer_refresh();
        tracing::debug!(
            target: targets::VIEW,
            ok = applied.is_ok() && refreshed.is_ok(),
            "applied view settings"
        );
        applied.and(refreshed)
    }

    fn apply_deferred<T: ViewItem, V: CollectionView<T> + ?Sized>(&self, view: &mut V) -> Result<()> {
        if let Some(name) = &self.culture {
            view.set_culture(Culture::new(name.as_str()))?;
        }
        if let Some(sort) = &self.sort {
            view.set_sort_descriptions(
                sort.iter()
                    .map(|setting| SortDescription::by_path(&setting.path, setting.direction))
                    .collect(),
            )?;
        }
        if let Some(group) = &self.group {
            view.set_group_descriptions(
                group
                    .iter()
                    .map(|setting| {
                        GroupDescription::by_path(&setting.path)
                            .with_group_keys(setting.keys.iter().map(|key| GroupKey::from(key.as_str())).collect())
                            .with_string_comparison(setting.string_comparison)
                    })
                    .collect(),
            )?;
        }
        if let Some(filter) = &self.filter {
            view.set_filter_descriptions(
                filter
                    .iter()
                    .map(|setting| {
                        FilterDescription::by_path(&setting.path)
                            .with_conditions(setting.conditions.iter().cloned().map(Value::from).collect())
                    })
                    .collect(),
            )?;
        }
        Ok(())
    }
}
