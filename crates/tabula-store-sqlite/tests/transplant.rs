mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{RecordingReporter, TestContext};
use tabula_store_sqlite::tabula_core::{StoreConfig, StoreEvent, Value};
use tabula_store_sqlite::Store;

const COLUMNS: [&str; 2] = ["id", "label"];
const TYPES: [&str; 2] = ["integer", "text"];

fn destination(ctx: &mut TestContext) -> Result<()> {
    ctx.store.create_table("T", &COLUMNS, &TYPES)?;
    ctx.store.insert("T", &[1_i64.into(), "a".into()])?;
    Ok(())
}

#[test]
fn copy_replaces_destination_rows() -> Result<()> {
    let mut ctx = TestContext::new(1)?;
    destination(&mut ctx)?;
    let source = ctx.sibling_store(
        "source.db",
        1,
        "T",
        &COLUMNS,
        &TYPES,
        &[vec![2_i64.into(), "b".into()], vec![3_i64.into(), "c".into()]],
    )?;

    assert_eq!(ctx.store.copy_table("T", source)?, 2);
    assert_eq!(
        ctx.store.select_all("T")?,
        vec![
            vec![Value::Integer(2), Value::from("b")],
            vec![Value::Integer(3), Value::from("c")],
        ]
    );
    Ok(())
}

#[test]
fn empty_source_leaves_destination_unchanged() -> Result<()> {
    let mut ctx = TestContext::new(1)?;
    destination(&mut ctx)?;
    let source = ctx.sibling_store("source.db", 1, "T", &COLUMNS, &TYPES, &[])?;

    assert_eq!(ctx.store.copy_table("T", source)?, 0);
    assert_eq!(ctx.store.select_all("T")?, vec![vec![Value::Integer(1), Value::from("a")]]);
    Ok(())
}

#[test]
fn source_handle_is_released_after_copy() -> Result<()> {
    let reporter = RecordingReporter::new();
    let ctx = TestContext::new(1)?;
    let path = ctx.sibling("dest.db");
    let source = ctx.sibling_store(
        "source.db",
        4,
        "T",
        &COLUMNS,
        &TYPES,
        &[vec![9_i64.into(), "z".into()]],
    )?;
    let empty = ctx.sibling_store("empty.db", 4, "T", &COLUMNS, &TYPES, &[])?;

    let mut store = Store::open_with_reporter(StoreConfig::create(path, 1), reporter.clone())?;
    store.create_table("T", &COLUMNS, &TYPES)?;
    store.copy_table("T", &source)?;
    store.copy_table("T", &empty)?;

    let events = reporter.events();
    assert!(events.contains(&StoreEvent::Closed { path: source.clone() }));
    assert!(events.contains(&StoreEvent::TableCopied {
        table: "T".to_string(),
        source: source.clone(),
        rows: 1,
    }));
    assert!(events.contains(&StoreEvent::CopySkipped { table: "T".to_string(), source: empty }));
    assert_eq!(Arc::strong_count(&reporter), 2);

    store.close()?;
    assert_eq!(Arc::strong_count(&reporter), 1);

    // The source file is free to be replaced once the copy returns.
    Store::create(source, 5)?.close()?;
    Ok(())
}
