//! Integration tests for collection views over realistic data.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use horizon_dataview::prelude::*;
use horizon_dataview::{
    CollectionViewFactory, GroupId, GroupTree, GroupTreeDebug, SharedView, TreeFormatOptions, TreeStyle, create_view,
    record,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn people() -> Vec<Value> {
    vec![
        record! { "name" => "John Smith", "country" => "NO", "city" => "Oslo" },
        record! { "name" => "Jane Doe", "country" => "SE", "city" => "Lund" },
        record! { "name" => "Ola Nordmann", "country" => "NO", "city" => "Bergen" },
        record! { "name" => "Kari Nordmann", "country" => "NO", "city" => "Oslo" },
        record! { "name" => "Sven Svensson", "country" => "SE", "city" => "Malmo" },
    ]
}

fn name_of(item: &Value) -> String {
    item.field("name").map(Value::to_display_string).unwrap_or_default()
}

/// Recounts every group and checks both counters; returns (leaves, full).
fn check_counts<T: PartialEq>(tree: &GroupTree<T>, group: GroupId) -> (usize, usize) {
    let node = tree.node(group).expect("group exists");
    let (mut leaves, mut full) = (0, 0);
    for child in node.children() {
        match child.as_group() {
            Some(sub) => {
                let (sub_leaves, sub_full) = check_counts(tree, sub);
                leaves += sub_leaves;
                full += sub_full + 1;
            }
            None => {
                leaves += 1;
                full += 1;
            }
        }
    }
    assert_eq!(node.leaf_count(), leaves);
    assert_eq!(node.full_count(), full);
    (leaves, full)
}

fn check_leaf_order<T: ViewItem + std::fmt::Debug>(view: &ListCollectionView<T>) {
    let tree = view.tree();
    let enumerated: Vec<&T> = tree.leaves(tree.root()).collect();
    let indexed: Vec<&T> = (0..view.count()).filter_map(|i| view.get(i)).collect();
    assert_eq!(enumerated, indexed);
    for (i, item) in indexed.iter().enumerate() {
        assert_eq!(view.get(view.index_of(item).expect("indexed")), Some(*item));
        assert!(view.index_of(item).expect("indexed") <= i);
    }
}

#[test]
fn test_identity_sort() {
    init_tracing();
    let source = Rc::new(ListSource::new(vec!["b".to_string(), "a".to_string(), "c".to_string()]));
    let mut view = ListCollectionView::new(source, ViewOptions::new());
    view.set_sort_descriptions(vec![SortDescription::identity(SortDirection::Ascending)])
        .unwrap();
    assert_eq!(view.items(), vec!["a", "b", "c"]);
}

#[test]
fn test_explicit_groups_survive_empty() {
    init_tracing();
    let source = Rc::new(ObservableList::new(vec![1i64, 3, 5]));
    let mut view = ListCollectionView::new(source.clone(), ViewOptions::new());
    view.set_group_descriptions(vec![
        GroupDescription::by_key(|n: &i64| Value::from(if n % 2 == 0 { "even" } else { "odd" }))
            .with_group_keys(vec![GroupKey::from("even"), GroupKey::from("odd")]),
    ])
    .unwrap();

    let tree = view.tree();
    let groups = view.groups();
    assert_eq!(groups.len(), 2);
    let even = tree.node(groups[0]).unwrap();
    assert_eq!(even.key(), &GroupKey::from("even"));
    assert_eq!(even.leaf_count(), 0);
    assert_eq!(tree.node(groups[1]).unwrap().leaf_count(), 3);

    source.push(4);
    source.remove(&4);
    view.process_source_changes().unwrap();
    assert_eq!(view.groups().len(), 2);
    check_counts(view.tree(), view.tree().root());
}

#[test]
fn test_filter_by_surname() {
    init_tracing();
    let source = Rc::new(ListSource::new(people()));
    let mut view = ListCollectionView::new(source, ViewOptions::new());
    view.set_filter_descriptions(vec![
        FilterDescription::by_path("name").with_conditions(vec![Value::from("Smith")]),
    ])
    .unwrap();

    let names: Vec<String> = view.items().iter().map(name_of).collect();
    assert_eq!(names, vec!["John Smith"]);
}

#[test]
fn test_two_level_grouping() {
    init_tracing();
    let source = Rc::new(ListSource::new(people()));
    let mut view = ListCollectionView::new(source, ViewOptions::new());
    {
        let mut scope = view.defer_refresh();
        scope
            .set_group_descriptions(vec![GroupDescription::by_path("country"), GroupDescription::by_path("city")])
            .unwrap();
        scope
            .set_sort_descriptions(vec![SortDescription::by_path("name", SortDirection::Ascending)])
            .unwrap();
    }

    assert_eq!(view.grouping_depth(), 2);
    assert_eq!(view.grouping_property_name_at_depth(1), Some("city"));
    let tree = view.tree();
    let total: usize = view
        .groups()
        .iter()
        .map(|group| tree.node(*group).map_or(0, |node| node.leaf_count()))
        .sum();
    assert_eq!(total, 5);
    for group in view.groups() {
        assert_eq!(tree.depth(group), 1);
        for city in tree.subgroups(group) {
            assert!(tree.node(city).unwrap().is_bottom_level());
        }
    }
    check_counts(tree, tree.root());
    check_leaf_order(&view);

    let rendered =
        GroupTreeDebug::with_options(tree, TreeFormatOptions::minimal().with_style(TreeStyle::Ascii)).to_string();
    assert!(rendered.contains("NO"));
    assert!(rendered.contains("Bergen"));
}

#[test]
fn test_refresh_is_idempotent() {
    init_tracing();
    let source = Rc::new(ListSource::new(people()));
    let mut view = ListCollectionView::new(source, ViewOptions::new());
    view.set_group_descriptions(vec![GroupDescription::by_path("country")])
        .unwrap();

    let before = view.items();
    let groups_before = view.tree().group_count();
    view.refresh().unwrap();
    assert_eq!(view.items(), before);
    assert_eq!(view.tree().group_count(), groups_before);
}

#[test]
fn test_incremental_changes_match_refresh() {
    init_tracing();
    let source = Rc::new(ObservableList::new(people()));
    let mut view = ListCollectionView::new(source.clone(), ViewOptions::new());
    {
        let mut scope = view.defer_refresh();
        scope
            .set_group_descriptions(vec![GroupDescription::by_path("country")])
            .unwrap();
        scope
            .set_sort_descriptions(vec![SortDescription::by_path("name", SortDirection::Descending)])
            .unwrap();
    }

    source.push(record! { "name" => "Anna Andersen", "country" => "DK", "city" => "Aarhus" });
    source.push(record! { "name" => "Zed Zahl", "country" => "SE", "city" => "Lund" });
    source.remove_at(1).unwrap();
    view.process_source_changes().unwrap();

    let incremental = view.items();
    check_counts(view.tree(), view.tree().root());
    check_leaf_order(&view);

    view.refresh().unwrap();
    assert_eq!(view.items(), incremental);
}

#[test]
fn test_discovered_group_is_pruned() {
    init_tracing();
    let source = Rc::new(ObservableList::new(people()));
    let mut view = ListCollectionView::new(source.clone(), ViewOptions::new());
    view.set_group_descriptions(vec![GroupDescription::by_path("country")])
        .unwrap();
    assert_eq!(view.groups().len(), 2);

    let swedes: Vec<Value> = source
        .snapshot()
        .into_iter()
        .filter(|person| person.field("country") == Some(&Value::from("SE")))
        .collect();
    for person in &swedes {
        source.remove(person);
    }
    view.process_source_changes().unwrap();

    assert_eq!(view.groups().len(), 1);
    assert_eq!(view.count(), 3);
}

#[test]
fn test_stale_cursor() {
    init_tracing();
    let source = Rc::new(ObservableList::new(vec![1i64, 2, 3]));
    let mut view = ListCollectionView::new(source.clone(), ViewOptions::new());

    let mut cursor = view.tree().leaf_cursor(view.tree().root());
    assert_eq!(cursor.next(view.tree()).unwrap(), Some(&1));

    source.push(4);
    view.process_source_changes().unwrap();
    assert!(matches!(cursor.next(view.tree()), Err(CollectionError::StaleEnumerator)));
}

#[test]
fn test_canceled_move_keeps_currency() {
    init_tracing();
    let source = Rc::new(ListSource::new(vec![1i64, 2, 3]));
    let mut view = ListCollectionView::new(source, ViewOptions::new());
    let changed = Rc::new(Cell::new(false));
    let flag = changed.clone();
    view.signals().current_changed.connect(move |_| flag.set(true));
    let veto = view.signals().current_changing.connect(|_| Verdict::Cancel);

    assert!(view.move_current_to_next().unwrap());
    assert_eq!(view.current_position(), CurrentPosition::OnItem(0));
    assert!(!changed.get());

    view.signals().current_changing.disconnect(veto);
    assert!(view.move_current_to_next().unwrap());
    assert_eq!(view.current_item(), Some(&2));
    assert!(changed.get());
}

struct DescendingFactory;

impl CollectionViewFactory<i64> for DescendingFactory {
    fn create_view(&self, source: Rc<dyn ItemSource<i64>>) -> horizon_dataview::Result<SharedView<i64>> {
        let mut view = ListCollectionView::new(source, ViewOptions::new());
        view.set_sort_descriptions(vec![SortDescription::identity(SortDirection::Descending)])?;
        let view: SharedView<i64> = view.into_shared();
        Ok(view)
    }
}

struct FailingFactory;

impl CollectionViewFactory<i64> for FailingFactory {
    fn create_view(&self, _source: Rc<dyn ItemSource<i64>>) -> horizon_dataview::Result<SharedView<i64>> {
        Err(CollectionError::collaborator("no view for you".into()))
    }
}

struct ViewCapableSource {
    items: Vec<i64>,
    factory: Box<dyn CollectionViewFactory<i64>>,
}

impl ItemSource<i64> for ViewCapableSource {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&self, index: usize) -> Option<i64> {
        self.items.get(index).copied()
    }

    fn snapshot(&self) -> Vec<i64> {
        self.items.clone()
    }

    fn view_factory(&self) -> Option<&dyn CollectionViewFactory<i64>> {
        Some(&*self.factory)
    }
}

#[test]
fn test_view_factory() {
    init_tracing();
    let plain: Rc<dyn ItemSource<i64>> = Rc::new(ListSource::new(vec![2, 1, 3]));
    let view = create_view(plain).unwrap();
    assert_eq!(view.borrow().items(), vec![2, 1, 3]);

    let custom: Rc<dyn ItemSource<i64>> = Rc::new(ViewCapableSource {
        items: vec![2, 1, 3],
        factory: Box::new(DescendingFactory),
    });
    let view = create_view(custom).unwrap();
    assert_eq!(view.borrow().items(), vec![3, 2, 1]);

    let failing: Rc<dyn ItemSource<i64>> = Rc::new(ViewCapableSource {
        items: vec![1],
        factory: Box::new(FailingFactory),
    });
    let err = create_view(failing).err().expect("factory error");
    assert_eq!(err.to_string(), "no view for you");
}

#[test]
fn test_grid_flow_through_connection() {
    init_tracing();
    let source = Rc::new(ObservableList::new(people()));
    let options = ViewOptions::new()
        .new_item_factory(|| record! { "name" => "New Person", "country" => "SE", "city" => "Lund" });
    let mut view = ListCollectionView::new(source.clone(), options);
    view.set_group_descriptions(vec![GroupDescription::by_path("country")])
        .unwrap();
    let view = view.into_shared();
    let shared: SharedView<Value> = view.clone();
    let mut connection = DataConnection::with_source(DataSource::View(shared));

    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    view.borrow()
        .signals()
        .collection_changed
        .connect(move |change: &CollectionChange<Value>| sink.borrow_mut().push(change.clone()));

    let added = connection.add_new().unwrap();
    assert_eq!(connection.count(), 6);
    assert_eq!(connection.get(5), Some(added.clone()));
    assert!(!connection.allow_sort());

    assert!(connection.end_edit(&added).unwrap());
    assert!(connection.allow_sort());
    assert_eq!(source.len(), 6);

    let index = connection.index_of(&added).unwrap();
    assert_eq!(view.borrow().get(index), Some(&added));
    assert!(matches!(log.borrow().last(), Some(CollectionChange::Added { .. })));
    assert_eq!(connection.take_pending_changes().len(), log.borrow().len());

    source.push(record! { "name" => "Late Arrival", "country" => "NO", "city" => "Oslo" });
    assert_eq!(connection.count(), 7);
    check_counts(view.borrow().tree(), view.borrow().tree().root());
}
