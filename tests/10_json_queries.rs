mod common;

use anyhow::Result;
use jsonrepo::database::{CrudRepository, DatabaseError, JsonRepository, RepositoryFactory};
use jsonrepo::database::models::DeviceRepository;
use jsonrepo::config::JsonQueryConfig;
use jsonrepo::json::QueryValue;

use common::{ids, seed};

#[tokio::test]
async fn value_search_reaches_nested_strings() -> Result<()> {
    let (store, repo) = common::devices();
    let seeded = seed(&store, &[r#"{"a": {"b": [{"c": "hello world"}]}}"#]).await;

    assert_eq!(ids(&repo.json_search_by_value("hello").await?), ids(&seeded));
    assert_eq!(ids(&repo.json_search_by_value("HELLO").await?), ids(&seeded));
    assert!(repo.json_search_by_value("goodbye").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn key_search_ignores_values() -> Result<()> {
    let (store, repo) = common::devices();
    seed(&store, &[r#"{"tags": ["red", "blue"]}"#]).await;

    assert_eq!(repo.json_search_by_key("tags").await?.len(), 1);
    assert!(repo.json_search_by_key("red").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn count_and_equality_over_two_rows() -> Result<()> {
    let (store, repo) = common::devices();
    let seeded = seed(&store, &[r#"{"x": 1}"#, r#"{"x": 2}"#]).await;

    assert_eq!(repo.count_by_key("x").await?, 2);
    let found = repo.json_search_by_key_and_value("x", 1.into()).await?;
    assert_eq!(ids(&found), vec![seeded[0].id.unwrap()]);

    let first = repo.json_search_first_by_key_and_value("x", 2.into()).await?;
    assert_eq!(first.and_then(|d| d.id), seeded[1].id);
    assert!(repo.json_search_first_by_key_and_value("x", 3.into()).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn empty_fields_behave_as_empty_objects() -> Result<()> {
    let (store, repo) = common::devices();
    let mut blank = jsonrepo::database::models::Device::new("blank");
    blank.properties = String::new();
    store.insert_raw(blank).await;
    seed(&store, &["   "]).await;

    assert!(repo.json_search_by_value("a").await?.is_empty());
    assert!(repo.json_search_by_key("a").await?.is_empty());
    assert!(repo.json_search_by_key_and_value("a", QueryValue::Null).await?.is_empty());
    assert!(repo.json_search_first_by_key_and_value("a", "b".into()).await?.is_none());
    assert!(!repo.exists_by_key_and_value("a", true.into()).await?);
    assert_eq!(repo.count_by_key("a").await?, 0);
    Ok(())
}

#[tokio::test]
async fn malformed_rows_are_skipped() -> Result<()> {
    let (store, repo) = common::devices();
    let seeded = seed(&store, &[r#"{"color": "red""#, r#"{"color": "red"}"#, "red", "[1, 2"]).await;

    let found = repo.json_search_by_key_and_value("color", "red".into()).await?;
    assert_eq!(ids(&found), vec![seeded[1].id.unwrap()]);

    // Unquoted text is not a JSON document either
    let by_value = repo.json_search_by_value("red").await?;
    assert_eq!(ids(&by_value), vec![seeded[1].id.unwrap()]);
    Ok(())
}

#[tokio::test]
async fn numeric_string_matches_through_textual_fallback() -> Result<()> {
    let (store, repo) = common::devices();
    let seeded = seed(&store, &[r#"{"count": 5}"#, r#"{"count": "5"}"#, r#"{"count": 5.0}"#]).await;

    let all: Vec<i64> = ids(&seeded);
    assert_eq!(ids(&repo.json_search_by_key_and_value("count", 5.into()).await?), all);
    // Text "5" equals the string directly and the integer by rendering;
    // 5.0 renders as "5.0"
    assert_eq!(
        ids(&repo.json_search_by_key_and_value("count", "5".into()).await?),
        vec![seeded[0].id.unwrap(), seeded[1].id.unwrap()]
    );
    Ok(())
}

#[tokio::test]
async fn exponent_numbers_are_found_by_their_rendering() -> Result<()> {
    let (store, repo) = common::devices();
    let seeded = seed(&store, &[r#"{"limit": 1e2}"#]).await;

    assert_eq!(ids(&repo.json_search_by_value("100").await?), ids(&seeded));
    assert_eq!(ids(&repo.json_search_by_key_and_value("limit", 100.into()).await?), ids(&seeded));
    Ok(())
}

#[tokio::test]
async fn repeated_queries_return_the_same_rows() -> Result<()> {
    let (store, repo) = common::devices();
    seed(&store, &[r#"{"k": "v"}"#, r#"{"k": "w"}"#, r#"{"other": "v"}"#]).await;

    let first = ids(&repo.json_search_by_value("v").await?);
    let second = ids(&repo.json_search_by_value("v").await?);
    assert_eq!(first, second);
    assert_eq!(repo.count_by_key("k").await?, repo.count_by_key("k").await?);
    Ok(())
}

#[tokio::test]
async fn queries_see_rows_saved_through_crud() -> Result<()> {
    let (_store, repo) = common::devices();
    let mut device = jsonrepo::database::models::Device::new("router");
    device.set_property("firmware", "2.1");
    let saved = repo.save(device).await?;

    assert!(repo.exists_by_key_and_value("firmware", "2.1".into()).await?);

    let mut changed = saved.clone();
    changed.set_property("firmware", "2.2");
    repo.save(changed).await?;
    assert!(!repo.exists_by_key_and_value("firmware", "2.1".into()).await?);
    assert_eq!(repo.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn fetch_failures_propagate() -> Result<()> {
    let factory = RepositoryFactory::new(common::FailingProvider, JsonQueryConfig::default());
    let repo = factory.create::<DeviceRepository>()?;

    assert!(matches!(repo.json_search_by_value("x").await, Err(DatabaseError::QueryError(_))));
    assert!(matches!(repo.json_search_by_key("x").await, Err(DatabaseError::QueryError(_))));
    assert!(repo.exists_by_key_and_value("x", 1.into()).await.is_err());
    assert!(repo.count_by_key("x").await.is_err());
    Ok(())
}
