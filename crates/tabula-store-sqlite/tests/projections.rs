mod common;

use anyhow::{anyhow, Result};
use common::{four_column_table, TestContext};
use tabula_store_sqlite::tabula_core::{Predicate, StoreConfig, Value, ViewSpec};
use tabula_store_sqlite::{ErrorKind, StoreError};

#[test]
fn duplicate_keys_fail_dict_but_not_filtered_fetch() -> Result<()> {
    let mut ctx = TestContext::new(1)?;
    ctx.store.create_table("hits", &["gene", "sample"], &["text", "text"])?;
    ctx.store.insert_many(
        "hits",
        &[vec!["g1".into(), "s1".into()], vec!["g1".into(), "s2".into()]],
    )?;

    let Err(err) = ctx.store.as_dict("hits", &ViewSpec::new()) else {
        return Err(anyhow!("expected a repeated key to be an integrity violation"));
    };
    assert!(matches!(err, StoreError::IntegrityViolation { rows: 2, unique_keys: 1, .. }));
    assert!(err.to_string().contains("hits"));

    let Err(err) = ctx.store.as_frame("hits", &ViewSpec::new()) else {
        return Err(anyhow!("expected the frame view to enforce uniqueness too"));
    };
    assert_eq!(err.kind(), ErrorKind::IntegrityViolation);

    let dict = ctx.store.some_rows_as_dict("hits", &Predicate::eq("gene", "g1"), true, false)?;
    assert_eq!(dict.len(), 1);
    Ok(())
}

#[test]
fn uniqueness_exempt_tables_project_freely() -> Result<()> {
    let mut ctx = TestContext::with_config(|path| StoreConfig::create(path, 1).exempt_table("hits"))?;
    ctx.store.create_table("hits", &["gene", "sample"], &["text", "text"])?;
    ctx.store.insert_many(
        "hits",
        &[vec!["g1".into(), "s1".into()], vec!["g1".into(), "s2".into()]],
    )?;

    assert_eq!(ctx.store.as_dict("hits", &ViewSpec::new())?.len(), 1);
    assert_eq!(ctx.store.as_frame("hits", &ViewSpec::new())?.len(), 2);
    Ok(())
}

#[test]
fn projection_keeps_only_columns_of_interest() -> Result<()> {
    let mut ctx = TestContext::new(1)?;
    four_column_table(&mut ctx.store, "t")?;

    let dict = ctx.store.as_dict("t", &ViewSpec::new().columns(["c2"]))?;
    assert_eq!(dict.len(), 3);
    for entry in dict.values() {
        assert_eq!(entry.keys().collect::<Vec<_>>(), vec!["c2"]);
    }
    let entry = dict.get(&Value::Integer(2)).and_then(|entry| entry.get("c2"));
    assert_eq!(entry, Some(&Value::from("y")));

    let Err(err) = ctx.store.as_dict("t", &ViewSpec::new().columns(Vec::<String>::new())) else {
        return Err(anyhow!("expected an empty allow-list to be an empty projection"));
    };
    assert_eq!(err.kind(), ErrorKind::EmptyProjection);
    Ok(())
}

#[test]
fn frame_keeps_key_while_dict_indexes_by_it() -> Result<()> {
    let mut ctx = TestContext::new(1)?;
    ctx.store.create_table("t", &["id", "c1"], &["integer", "text"])?;
    ctx.store.insert("t", &[7_i64.into(), "x".into()])?;

    let frame = ctx.store.as_frame("t", &ViewSpec::new())?;
    assert_eq!(frame.columns, vec!["id".to_string(), "c1".to_string()]);
    assert_eq!(frame.get(0, "id"), Some(&Value::Integer(7)));
    assert_eq!(frame.get(0, "c1"), Some(&Value::from("x")));

    let dict = ctx.store.as_dict("t", &ViewSpec::new())?;
    let Some(entry) = dict.get(&Value::Integer(7)) else {
        return Err(anyhow!("expected key 7 in the dictionary view"));
    };
    assert_eq!(entry.len(), 1);
    assert_eq!(entry.get("c1"), Some(&Value::from("x")));
    assert!(!entry.contains_key("id"));
    Ok(())
}

#[test]
fn key_allow_list_restricts_both_views() -> Result<()> {
    let mut ctx = TestContext::new(1)?;
    four_column_table(&mut ctx.store, "t")?;

    let spec = ViewSpec::new().keys([1_i64, 3]).stringify_key(true);
    let dict = ctx.store.as_dict("t", &spec)?;
    assert_eq!(
        dict.keys().collect::<Vec<_>>(),
        vec![&Value::from("1"), &Value::from("3")]
    );

    let frame = ctx.store.as_frame("t", &spec)?;
    assert_eq!(frame.column("id"), Some(vec![&Value::Integer(1), &Value::Integer(3)]));
    Ok(())
}

#[test]
fn parent_column_name_comes_from_configuration() -> Result<()> {
    let mut ctx =
        TestContext::with_config(|path| StoreConfig::create(path, 1).parent_column("bin"))?;
    ctx.store.create_table("splits", &["split", "bin", "length"], &["text", "text", "integer"])?;
    ctx.store.insert("splits", &["s1".into(), "b1".into(), 400_i64.into()])?;

    let dict = ctx.store.as_dict("splits", &ViewSpec::new().omit_parent_column(true))?;
    let entry = dict.get(&Value::from("s1")).map(|entry| entry.keys().cloned().collect::<Vec<_>>());
    assert_eq!(entry, Some(vec!["length".to_string()]));
    Ok(())
}

#[test]
fn projecting_an_unknown_table_is_not_found() -> Result<()> {
    let ctx = TestContext::new(1)?;

    let Err(err) = ctx.store.as_dict("ghost", &ViewSpec::new()) else {
        return Err(anyhow!("expected an unknown table"));
    };
    assert_eq!(err.kind(), ErrorKind::NotFound);
    Ok(())
}
