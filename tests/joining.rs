use rust_column_table::column::Column;
use rust_column_table::grid::ColumnSet;
use rust_column_table::join::{JoinType, join};
use rust_column_table::table::Table;
use rust_column_table::types::Value;

fn left() -> Table {
    Table::new(
        ColumnSet::new()
            .with("key", vec!["a", "b", "a", "b", "c"])
            .with("v", 0..5),
    )
    .unwrap()
}

fn right() -> Table {
    Table::new(
        ColumnSet::new()
            .with("key", vec!["d", "c", "b"])
            .with("r", vec![0, 1, 2]),
    )
    .unwrap()
}

fn strs(values: &[Option<&str>]) -> Vec<Value> {
    values
        .iter()
        .map(|v| v.map_or(Value::Null, Value::from))
        .collect()
}

fn ints(values: &[Option<i64>]) -> Vec<Value> {
    values
        .iter()
        .map(|v| v.map_or(Value::Null, Value::Int64))
        .collect()
}

#[test]
fn row_counts_per_join_type() {
    let (l, r) = (left(), right());
    let count = |how: JoinType| l.join(&r, &["key"], how).unwrap().row_count();
    assert_eq!(count(JoinType::Inner), 3);
    assert_eq!(count(JoinType::Left), 5);
    assert_eq!(count(JoinType::Right), 4);
    assert_eq!(count(JoinType::Outer), 6);
}

#[test]
fn inner_join_pairs_rows_in_left_order() {
    let out = left().join(&right(), &["key"], JoinType::Inner).unwrap();
    assert_eq!(out.colnames(), vec!["key", "v", "r"]);
    assert_eq!(out.column("key").unwrap(), Column::from(vec!["b", "b", "c"]));
    assert_eq!(out.column("v").unwrap(), Column::from(vec![1, 3, 4]));
    assert_eq!(out.column("r").unwrap(), Column::from(vec![2, 2, 1]));
}

#[test]
fn outer_join_fills_missing_sides_with_nulls() {
    let out = left().join(&right(), &["key"], JoinType::Outer).unwrap();
    assert_eq!(
        out.column("key").unwrap().to_vec(),
        strs(&[Some("a"), Some("b"), Some("a"), Some("b"), Some("c"), Some("d")])
    );
    assert_eq!(
        out.column("v").unwrap().to_vec(),
        ints(&[Some(0), Some(1), Some(2), Some(3), Some(4), None])
    );
    assert_eq!(
        out.column("r").unwrap().to_vec(),
        ints(&[None, Some(2), None, Some(2), Some(1), Some(0)])
    );
}

#[test]
fn right_join_appends_unmatched_right_rows() {
    let out = join(&left(), &right(), &["key"], JoinType::Right).unwrap();
    assert_eq!(
        out.column("key").unwrap().to_vec(),
        strs(&[Some("b"), Some("b"), Some("c"), Some("d")])
    );
    assert_eq!(out.column("v").unwrap().value(3), Some(&Value::Null));
}

#[test]
fn joins_on_several_keys() {
    let l = Table::new(
        ColumnSet::new()
            .with("a", vec![1, 1, 2])
            .with("b", vec!["x", "y", "x"])
            .with("l", vec![10, 11, 12]),
    )
    .unwrap();
    let r = Table::new(
        ColumnSet::new()
            .with("b", vec!["x", "x"])
            .with("a", vec![2, 1])
            .with("r", vec![true, false]),
    )
    .unwrap();
    let out = l.join(&r, &["a", "b"], JoinType::Inner).unwrap();
    assert_eq!(out.column("l").unwrap(), Column::from(vec![10, 12]));
    assert_eq!(out.column("r").unwrap(), Column::from(vec![false, true]));
}

#[test]
fn views_can_be_joined() {
    let l = left();
    let r = right();
    let only_a = l.filter(|t| t.column("key")?.equals("b"));
    let tail = r.view_at(vec![2]).unwrap();
    let out = join(&only_a, &tail, &["key"], JoinType::Inner).unwrap();
    assert_eq!(out.column("v").unwrap(), Column::from(vec![1, 3]));
}

#[test]
fn repeated_right_keys_multiply_rows() {
    let l = Table::new(ColumnSet::new().with("k", vec![1, 2])).unwrap();
    let r = Table::new(
        ColumnSet::new()
            .with("k", vec![1, 1, 1])
            .with("n", vec![7, 8, 9]),
    )
    .unwrap();
    let out = l.join(&r, &["k"], JoinType::Left).unwrap();
    assert_eq!(out.column("n").unwrap().to_vec(), ints(&[Some(7), Some(8), Some(9), None]));
}
