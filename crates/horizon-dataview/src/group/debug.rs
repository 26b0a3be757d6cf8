//! Debug rendering of group trees.

use std::fmt;

use horizon_dataview_core::{TreeFormatOptions, TreeStyle};

use super::tree::{GroupChild, GroupId, GroupTree};
use crate::item::ViewItem;

/// Renders a [`GroupTree`] for inspection.
///
/// ```
/// use horizon_dataview::{GroupChild, GroupKey, GroupTree, GroupTreeDebug};
///
/// let mut tree = GroupTree::<i64>::new();
/// let odd = tree.create_group(GroupKey::from("odd"));
/// tree.add(tree.root(), GroupChild::Group(odd));
/// tree.add(odd, GroupChild::Item(1));
///
/// let text = GroupTreeDebug::new(&tree).to_string();
/// assert!(text.contains("└── odd (leaves: 1, full: 1)"));
/// ```
pub struct GroupTreeDebug<'a, T> {
    tree: &'a GroupTree<T>,
    options: TreeFormatOptions,
}

impl<'a, T: ViewItem> GroupTreeDebug<'a, T> {
    /// Create a renderer with default options.
    pub fn new(tree: &'a GroupTree<T>) -> Self {
        Self::with_options(tree, TreeFormatOptions::default())
    }

    /// Create a renderer with custom options.
    pub fn with_options(tree: &'a GroupTree<T>, options: TreeFormatOptions) -> Self {
        Self { tree, options }
    }

    /// Render the subtree below one group.
    pub fn format_subtree(&self, group: GroupId) -> String {
        Subtree { debug: self, group }.to_string()
    }

    fn label(&self, group: GroupId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.tree.node(group) else {
            return write!(f, "(missing)");
        };
        if group == self.tree.root() {
            write!(f, "Root")?;
        } else {
            write!(f, "{}", node.key().display())?;
        }
        if self.options.show_ids {
            write!(f, " [{:?}]", group)?;
        }
        if self.options.show_counts {
            let separator = if self.options.style == TreeStyle::Compact {
                ""
            } else {
                " "
            };
            write!(
                f,
                "{}(leaves: {}, full: {})",
                separator,
                node.leaf_count(),
                node.full_count()
            )?;
        }
        Ok(())
    }

    fn write_tree(
        &self,
        f: &mut fmt::Formatter<'_>,
        group: GroupId,
        depth: usize,
        prefix: &str,
    ) -> fmt::Result {
        let Some(node) = self.tree.node(group) else {
            return Ok(());
        };
        if self.options.max_depth.is_some_and(|max| depth >= max) {
            return Ok(());
        }

        let style = self.options.style;
        let visible: Vec<&GroupChild<T>> = node
            .children()
            .iter()
            .filter(|child| self.options.show_items || child.as_group().is_some())
            .collect();

        for (i, child) in visible.iter().enumerate() {
            let last = i + 1 == visible.len();
            write!(f, "{}{}", prefix, style.branch(last))?;
            match child {
                GroupChild::Item(item) => writeln!(f, "{}", item.to_value())?,
                GroupChild::Group(sub) => {
                    self.label(*sub, f)?;
                    writeln!(f)?;
                    let nested = format!("{}{}", prefix, style.continuation(last));
                    self.write_tree(f, *sub, depth + 1, &nested)?;
                }
            }
        }
        Ok(())
    }

    fn write_compact(&self, f: &mut fmt::Formatter<'_>, group: GroupId, depth: usize) -> fmt::Result {
        self.label(group, f)?;
        let Some(node) = self.tree.node(group) else {
            return Ok(());
        };
        if self.options.max_depth.is_some_and(|max| depth >= max) {
            return Ok(());
        }

        let visible: Vec<&GroupChild<T>> = node
            .children()
            .iter()
            .filter(|child| self.options.show_items || child.as_group().is_some())
            .collect();
        if visible.is_empty() {
            return Ok(());
        }

        write!(f, " {{")?;
        for (i, child) in visible.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match child {
                GroupChild::Item(item) => write!(f, "{}", item.to_value())?,
                GroupChild::Group(sub) => self.write_compact(f, *sub, depth + 1)?,
            }
        }
        write!(f, "}}")
    }
}

struct Subtree<'d, 'a, T> {
    debug: &'d GroupTreeDebug<'a, T>,
    group: GroupId,
}

impl<T: ViewItem> fmt::Display for Subtree<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let debug = self.debug;
        if debug.options.style == TreeStyle::Compact {
            debug.write_compact(f, self.group, 0)?;
            return writeln!(f);
        }
        debug.label(self.group, f)?;
        writeln!(f)?;
        debug.write_tree(f, self.group, 0, "")
    }
}

impl<T: ViewItem> fmt::Display for GroupTreeDebug<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Group Tree ({} groups, {} leaves):",
            self.tree.group_count(),
            self.tree.leaf_count()
        )?;
        write!(
            f,
            "{}",
            Subtree {
                debug: self,
                group: self.tree.root(),
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::GroupKey;

    fn sample() -> GroupTree<i64> {
        let mut tree = GroupTree::new();
        let root = tree.root();
        let low = tree.create_group(GroupKey::from("low"));
        let high = tree.create_group(GroupKey::from("high"));
        let top = tree.create_group(GroupKey::from("top"));
        tree.add(root, GroupChild::Group(low));
        tree.add(root, GroupChild::Group(high));
        tree.add(high, GroupChild::Group(top));
        tree.add(low, GroupChild::Item(1));
        tree.add(top, GroupChild::Item(99));
        tree
    }

    #[test]
    fn test_unicode_rendering() {
        let tree = sample();
        let text = GroupTreeDebug::new(&tree).to_string();
        let expected = "\
Group Tree (4 groups, 2 leaves):
Root (leaves: 2, full: 5)
├── low (leaves: 1, full: 1)
└── high (leaves: 1, full: 2)
    └── top (leaves: 1, full: 1)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_ascii_with_items() {
        let tree = sample();
        let options = TreeFormatOptions::minimal().with_style(TreeStyle::Ascii);
        let options = TreeFormatOptions {
            show_items: true,
            ..options
        };
        let text = GroupTreeDebug::with_options(&tree, options).format_subtree(tree.root());
        let expected = "\
Root
|-- low
|   `-- 1
`-- high
    `-- top
        `-- 99
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_compact_rendering() {
        let tree = sample();
        let options = TreeFormatOptions::minimal().with_style(TreeStyle::Compact);
        let text = GroupTreeDebug::with_options(&tree, options).format_subtree(tree.root());
        assert_eq!(text, "Root {low, high {top}}\n");
    }

    #[test]
    fn test_max_depth() {
        let tree = sample();
        let options = TreeFormatOptions::minimal().with_max_depth(1);
        let text = GroupTreeDebug::with_options(&tree, options).format_subtree(tree.root());
        assert_eq!(text, "Root\n├── low\n└── high\n");
    }
}
