use rust_column_table::TableError;
use rust_column_table::column::Column;
use rust_column_table::grid::ColumnSet;
use rust_column_table::stack::{Stackable, stack};
use rust_column_table::table::Table;
use rust_column_table::types::Value;

fn part(xs: Vec<i64>, ys: Vec<&str>) -> Table {
    Table::new(ColumnSet::new().with("x", xs).with("y", ys)).unwrap()
}

#[test]
fn stacking_is_associative() {
    let a = part(vec![1], vec!["a"]);
    let b = part(vec![2, 3], vec!["b", "c"]);
    let c = part(vec![4], vec!["d"]);

    let left = stack([stack([&a, &b]).unwrap(), c.clone()]).unwrap();
    let right = stack([a.clone(), stack([&b, &c]).unwrap()]).unwrap();
    assert_eq!(left, right);
    assert_eq!(left.column("x").unwrap(), Column::from(vec![1, 2, 3, 4]));
}

#[test]
fn column_order_follows_the_first_source() {
    let a = part(vec![1], vec!["a"]);
    let flipped = Table::new(ColumnSet::new().with("y", "z").with("x", 9)).unwrap();
    let out = stack([&a, &flipped]).unwrap();
    assert_eq!(out.colnames(), vec!["x", "y"]);
    assert_eq!(out.column("y").unwrap(), Column::from(vec!["a", "z"]));
}

#[test]
fn empty_sources_do_not_constrain_names() {
    let a = part(vec![1], vec!["a"]);
    let empty = Table::new(ColumnSet::new().with("other", Vec::<i64>::new())).unwrap();
    let out = stack([&empty, &a, &Table::empty()]).unwrap();
    assert_eq!(out.row_count(), 1);
    assert_eq!(out.colnames(), vec!["x", "y"]);
}

#[test]
fn name_mismatch_reports_both_sets() {
    let a = part(vec![1], vec!["a"]);
    let b = Table::new(ColumnSet::new().with("x", 1).with("z", 2)).unwrap();
    let err = stack([&a, &b]).unwrap_err();
    assert_eq!(
        err,
        TableError::ColumnMismatch {
            expected: vec!["x".to_string(), "y".to_string()],
            found: vec!["x".to_string(), "z".to_string()],
        }
    );
}

#[test]
fn dimension_mismatch_is_rejected() {
    let flat = Table::new(ColumnSet::new().with("m", vec![1])).unwrap();
    let pairs = Column::from_rows(vec![vec![Value::Int64(1), Value::Int64(2)]]).unwrap();
    let wide = Table::new(ColumnSet::new().with("m", pairs)).unwrap();
    assert!(matches!(
        stack([&flat, &wide]),
        Err(TableError::DimensionMismatch { .. })
    ));
}

#[test]
fn raw_column_sets_and_views_stack_together() {
    let a = part(vec![1, 2, 3], vec!["a", "b", "c"]);
    let odd = a.filter(|t| t.column("x")?.rem(2)?.equals(1));
    let out = stack(vec![
        Stackable::from(&odd),
        Stackable::from(ColumnSet::new().with("x", vec![7, 8]).with("y", "n")),
    ])
    .unwrap();
    assert_eq!(out.column("x").unwrap(), Column::from(vec![1, 3, 7, 8]));
    assert_eq!(out.column("y").unwrap(), Column::from(vec!["a", "c", "n", "n"]));
}

#[test]
fn stack_in_place_appends_rows() {
    let mut a = part(vec![1], vec!["a"]);
    let b = part(vec![2], vec!["b"]);
    a.stack_in_place([&b, &b]).unwrap();
    assert_eq!(a.column("x").unwrap(), Column::from(vec![1, 2, 2]));

    let views_later = a.view_at(vec![2]).unwrap();
    assert_eq!(views_later.get_column("y").unwrap().to_vec(), vec![Value::from("b")]);
}

#[test]
fn stack_with_keeps_the_receiver() {
    let a = part(vec![1], vec!["a"]);
    let out = a.stack_with([part(vec![5], vec!["e"])]).unwrap();
    assert_eq!(out.row_count(), 2);
    assert_eq!(a.row_count(), 1);
}
