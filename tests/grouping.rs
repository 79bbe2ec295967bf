use rust_column_table::TableError;
use rust_column_table::column::Column;
use rust_column_table::grid::ColumnSet;
use rust_column_table::grouping::{Accumulator, Computed, GroupOptions};
use rust_column_table::stack::stack;
use rust_column_table::table::{GroupableView, Table, TableLike};
use rust_column_table::types::{DataType, Value};

fn sales() -> Table {
    Table::new(
        ColumnSet::new()
            .with("region", vec!["n", "s", "n", "e", "s", "n"])
            .with("units", vec![3, 1, 4, 1, 5, 9]),
    )
    .unwrap()
}

#[test]
fn value_column_name_avoids_parent_columns() {
    let t = sales();
    t.set_column("v_0", 0).unwrap();
    let out = t
        .group_by(&["region"])
        .apply(|g| g.get_column("units")?.sum())
        .unwrap();
    assert_eq!(out.colnames(), vec!["region", "v_1"]);
    assert_eq!(out.column("v_1").unwrap(), Column::from(vec![16, 6, 1]));
}

#[test]
fn value_column_name_avoids_key_names() {
    let t = Table::new(
        ColumnSet::new()
            .with("v_0", vec![1, 1, 2])
            .with("x", vec![1, 2, 3]),
    )
    .unwrap();
    let out = t.group_by(&["v_0"]).apply(|g| Ok(g.nrows() as i64)).unwrap();
    assert_eq!(out.colnames(), vec!["v_0", "v_1"]);
    assert_eq!(out.column("v_1").unwrap(), Column::from(vec![2, 1]));
}

#[test]
fn named_result_columns_replace_key_columns() {
    let t = sales();
    let out = t
        .group_by(&["region"])
        .apply(|g| {
            Ok(ColumnSet::new()
                .with("region", "all")
                .with("units", g.get_column("units")?.max()?))
        })
        .unwrap();
    assert_eq!(out.column("region").unwrap(), Column::from(vec!["all", "all", "all"]));
    assert_eq!(out.column("units").unwrap(), Column::from(vec![9, 5, 1]));
}

#[test]
fn mismatched_group_results_fail() {
    let t = sales();
    let err = t
        .group_by(&["region"])
        .apply(|g| {
            let name = if g.key().value("region") == Some(&Value::from("s")) {
                "b"
            } else {
                "a"
            };
            Ok(ColumnSet::new().with(name, 1))
        })
        .unwrap_err();
    assert!(matches!(err, TableError::ColumnMismatch { .. }));
}

#[test]
fn grouping_a_lazy_view_uses_only_its_rows() {
    let t = sales();
    let big = t.filter(|t| t.column("units")?.greater(2));
    let out = big
        .group_by(&["region"])
        .apply(|g| Ok(g.indices().iter().map(|&i| i as i64).collect::<Vec<_>>()))
        .unwrap();
    assert_eq!(out.column("region").unwrap(), Column::from(vec!["n", "n", "n", "s"]));
    assert_eq!(out.column("v_0").unwrap(), Column::from(vec![0, 2, 5, 4]));
}

#[test]
fn grouping_a_static_view() {
    let t = sales();
    let head = t.view_at(vec![0, 1, 2]).unwrap();
    let groups = head.group_by(&["region"]).groups().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].indices(), &[0, 2]);
}

#[test]
fn each_writes_through_group_views() {
    let t = sales();
    t.add_column("share", DataType::Float64).unwrap();
    t.group_by(&["region"])
        .each(|g| {
            let units = g.get_column("units")?;
            let total = units.sum()?;
            let share = units.to_column().cast(DataType::Float64)?.div(total)?;
            g.set_column("share", share)
        })
        .unwrap();
    let share = t.column("share").unwrap();
    assert_eq!(share.value(3), Some(&Value::Float64(1.0)));
    assert_eq!(share.value(1), Some(&Value::Float64(1.0 / 6.0)));
}

#[test]
fn groups_stack_back_into_a_table() {
    let t = sales();
    let groups = t.group_by(&["region"]).groups().unwrap();
    let restacked = stack(groups.iter()).unwrap();
    assert_eq!(
        restacked.column("units").unwrap(),
        Column::from(vec![3, 4, 9, 1, 5, 1])
    );
}

#[test]
fn computed_keys_group_by_derived_values() {
    let t = sales();
    let out = t
        .group_by_with(|src| {
            let big = src.read_column("units")?.greater_eq(4)?;
            Ok(Computed::Columns(ColumnSet::new().with("big", big)))
        })
        .apply(|g| Ok(g.nrows() as i64))
        .unwrap();
    assert_eq!(out.column("big").unwrap(), Column::from(vec![false, true]));
    assert_eq!(out.column("v_0").unwrap(), Column::from(vec![3, 3]));
}

#[test]
fn reduce_counts_and_collects() {
    let t = sales();
    let out = t
        .group_by(&["region"])
        .with_options(GroupOptions::default())
        .reduce(ColumnSet::new().with("total", 0), |row| {
            let units = row.value("units")?.clone();
            row.add("total", units)?;
            row.add("rows", 1)
        })
        .unwrap();

    assert_eq!(out.colnames(), vec!["region", "total", "rows"]);
    assert_eq!(out.column("total").unwrap(), Column::from(vec![16, 6, 1]));
    assert_eq!(out.column("rows").unwrap(), Column::from(vec![3, 2, 1]));
}

#[test]
fn reduce_sees_the_group_key() {
    let t = sales();
    let out = t
        .group_by(&["region"])
        .reduce(ColumnSet::new().with("label", ""), |row| {
            let label = row.key().to_string();
            row.set_acc("label", Accumulator::from(label));
            Ok(())
        })
        .unwrap();
    assert_eq!(out.column("label").unwrap().value(0), Some(&Value::from("(region=\"n\")")));
}

#[test]
fn callback_errors_propagate_unchanged() {
    let t = sales();
    let err = t
        .group_by(&["region"])
        .reduce(ColumnSet::new(), |row| row.value("missing").map(|_| ()))
        .unwrap_err();
    assert_eq!(
        err,
        TableError::ColumnNotFound {
            name: "missing".to_string()
        }
    );

    let err = t
        .group_by(&["nope"])
        .apply(|_| Ok(0))
        .unwrap_err();
    assert!(matches!(err, TableError::ColumnNotFound { .. }));
}

#[test]
fn to_table_of_a_group_is_detached() {
    let t = sales();
    let groups = t.group_by(&["region"]).groups().unwrap();
    let copy = groups[1].to_table().unwrap();
    copy.set_column("units", 0).unwrap();
    assert_eq!(t.column("units").unwrap().value(1), Some(&Value::Int64(1)));
}
