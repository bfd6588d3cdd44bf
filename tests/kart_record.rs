use tmi_terminal::kart_record::{Kart, RecordItem, RecordSelector, rate};
use tmi_terminal::state::Revision;

fn kart(id: &str, count: u32, wins: u32, retires: u32) -> Kart {
    Kart {
        id: id.to_string(),
        name: id.to_uppercase(),
        count,
        win_count: wins,
        retire_count: retires,
        map: vec![
            RecordItem {
                id: None,
                name: format!("{id}-track-a"),
                record: Some(83_456),
            },
            RecordItem {
                id: None,
                name: format!("{id}-track-b"),
                record: None,
            },
        ],
    }
}

fn loaded(karts: Vec<Kart>) -> RecordSelector {
    let mut selector = RecordSelector::new();
    let revision = Revision::of(&karts);
    selector.replace(karts, revision);
    selector
}

#[test]
fn select_then_read_returns_that_kart() {
    let karts = vec![kart("a", 1, 0, 0), kart("b", 2, 1, 0), kart("c", 3, 1, 1)];
    let mut selector = loaded(karts.clone());
    for (i, expected) in karts.iter().enumerate() {
        selector.select(i).expect("index in range");
        assert_eq!(selector.selected(), Some(expected));
        assert_eq!(selector.selected_index(), Some(i));
    }
}

#[test]
fn out_of_range_select_is_rejected_and_keeps_selection() {
    let mut selector = loaded(vec![kart("a", 1, 0, 0), kart("b", 1, 0, 0)]);
    selector.select(1).unwrap();
    assert!(selector.select(2).is_err());
    assert_eq!(selector.selected_id(), Some("b"));
}

#[test]
fn new_content_resets_selection_to_first() {
    let mut selector = loaded(vec![kart("a", 1, 0, 0), kart("b", 1, 0, 0), kart("c", 1, 0, 0)]);
    selector.select(2).unwrap();

    let fresh = vec![kart("a", 2, 1, 0), kart("b", 1, 0, 0), kart("c", 1, 0, 0)];
    let revision = Revision::of(&fresh);
    assert!(selector.replace(fresh, revision));
    assert_eq!(selector.selected_index(), Some(0));
}

#[test]
fn identical_content_keeps_selection() {
    let karts = vec![kart("a", 1, 0, 0), kart("b", 1, 0, 0)];
    let mut selector = loaded(karts.clone());
    selector.select(1).unwrap();

    let revision = Revision::of(&karts);
    assert!(!selector.replace(karts, revision));
    assert_eq!(selector.selected_id(), Some("b"));
}

// Selection is positional: after a reorder the cursor lands on index 0, not on the
// kart that was selected before.
#[test]
fn reorder_does_not_follow_selected_id() {
    let mut selector = loaded(vec![kart("a", 1, 0, 0), kart("b", 1, 0, 0)]);
    selector.select(1).unwrap();
    assert_eq!(selector.selected_id(), Some("b"));

    let reordered = vec![kart("b", 1, 0, 0), kart("a", 1, 0, 0)];
    let revision = Revision::of(&reordered);
    selector.replace(reordered, revision);
    assert_eq!(selector.selected_index(), Some(0));
    assert_eq!(selector.selected_id(), Some("b"));

    selector.select(1).unwrap();
    let back = vec![kart("a", 1, 0, 0), kart("b", 1, 0, 0)];
    let revision = Revision::of(&back);
    selector.replace(back, revision);
    assert_eq!(selector.selected_id(), Some("a"));
}

#[test]
fn empty_list_has_no_selection() {
    let mut selector = loaded(Vec::new());
    assert!(selector.is_empty());
    assert_eq!(selector.selected_index(), None);
    assert!(selector.selected().is_none());
    assert_eq!(selector.nested_records().count(), 0);
    assert!(selector.rows().is_empty());
    assert!(selector.select(0).is_err());
    selector.select_next();
    selector.select_prev();
    assert_eq!(selector.selected_index(), None);
}

#[test]
fn navigation_wraps() {
    let mut selector = loaded(vec![kart("a", 1, 0, 0), kart("b", 1, 0, 0), kart("c", 1, 0, 0)]);
    selector.select_prev();
    assert_eq!(selector.selected_id(), Some("c"));
    selector.select_next();
    assert_eq!(selector.selected_id(), Some("a"));
}

#[test]
fn nested_records_are_formatted() {
    let selector = loaded(vec![kart("a", 1, 0, 0)]);
    let records: Vec<(String, String)> = selector
        .nested_records()
        .map(|(name, time)| (name.to_string(), time))
        .collect();
    assert_eq!(
        records,
        vec![
            ("a-track-a".to_string(), "1'23'456".to_string()),
            ("a-track-b".to_string(), "-".to_string()),
        ]
    );
}

#[test]
fn single_kart_rates() {
    let selector = loaded(vec![Kart {
        id: "1".to_string(),
        name: "A".to_string(),
        count: 10,
        win_count: 5,
        retire_count: 2,
        map: Vec::new(),
    }]);
    let rows = selector.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].win_rate, Some(50));
    assert_eq!(rows[0].retire_rate, Some(20));
    assert!(rows[0].selected);
}

#[test]
fn rates_guard_zero_count() {
    assert_eq!(rate(3, 10), Some(30));
    assert_eq!(rate(0, 0), None);
    let unused = kart("unused", 0, 0, 0);
    assert_eq!(unused.win_rate(), None);
    assert_eq!(unused.retire_rate(), None);
}
