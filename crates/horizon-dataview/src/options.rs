//! Construction options for collection views.

use std::fmt;
use std::rc::Rc;

use crate::culture::Culture;

/// Creates items for [`add_new`](crate::EditableCollectionView::add_new).
pub type NewItemFactory<T> = Rc<dyn Fn() -> T>;

/// Options for a [`ListCollectionView`](crate::ListCollectionView).
pub struct ViewOptions<T> {
    /// Whether sort descriptions may be set.
    pub can_sort: bool,
    /// Whether filters may be set.
    pub can_filter: bool,
    /// Whether group descriptions may be set.
    pub can_group: bool,
    /// Culture for text comparison. `None` uses [`Culture::current`].
    pub culture: Option<Culture>,
    /// Items arrive already grouped; speeds up loading.
    pub is_data_in_group_order: bool,
    /// Factory for new items. Without one the view cannot add items.
    pub new_item_factory: Option<NewItemFactory<T>>,
}

impl<T> Default for ViewOptions<T> {
    fn default() -> Self {
        Self {
            can_sort: true,
            can_filter: true,
            can_group: true,
            culture: None,
            is_data_in_group_order: false,
            new_item_factory: None,
        }
    }
}

impl<T> Clone for ViewOptions<T> {
    fn clone(&self) -> Self {
        Self {
            can_sort: self.can_sort,
            can_filter: self.can_filter,
            can_group: self.can_group,
            culture: self.culture.clone(),
            is_data_in_group_order: self.is_data_in_group_order,
            new_item_factory: self.new_item_factory.clone(),
        }
    }
}

impl<T> ViewOptions<T> {
    /// Create options with everything enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable sorting.
    pub fn can_sort(mut self, enabled: bool) -> Self {
        self.can_sort = enabled;
        self
    }

    /// Enable or disable filtering.
    pub fn can_filter(mut self, enabled: bool) -> Self {
        self.can_filter = enabled;
        self
    }

    /// Enable or disable grouping.
    pub fn can_group(mut self, enabled: bool) -> Self {
        self.can_group = enabled;
        self
    }

    /// Set the culture.
    pub fn culture(mut self, culture: Culture) -> Self {
        self.culture = Some(culture);
        self
    }

    /// Declare that items arrive in group order.
    pub fn data_in_group_order(mut self, enabled: bool) -> Self {
        self.is_data_in_group_order = enabled;
        self
    }

    /// Set the factory used by `add_new`.
    pub fn new_item_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        self.new_item_factory = Some(Rc::new(factory));
        self
    }

    /// The culture to use, resolving the system culture if none was set.
    pub fn resolved_culture(&self) -> Culture {
        self.culture.clone().unwrap_or_else(Culture::current)
    }
}

impl<T> fmt::Debug for ViewOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewOptions")
            .field("can_sort", &self.can_sort)
            .field("can_filter", &self.can_filter)
            .field("can_group", &self.can_group)
            .field("culture", &self.culture)
            .field("is_data_in_group_order", &self.is_data_in_group_order)
            .field("new_item_factory", &self.new_item_factory.is_some())
            .finish()
    }
}
