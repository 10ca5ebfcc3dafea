// tests/repository_tests.rs
mod common;

use anuncios::{BlobKey, CatalogError, NewProduct, ProductFields, ProductId, ProductRepository, SqliteProductRepository};
use common::*;
use serial_test::serial;

async fn repository() -> SqliteProductRepository {
  let repo = SqliteProductRepository::in_memory().await.unwrap();
  repo.migrate().await.unwrap();
  repo
}

fn fields(title: &str, price: f64) -> ProductFields {
  ProductFields {
    title: title.to_string(),
    description: format!("{title} en buen estado"),
    price,
  }
}

fn key(raw: &str) -> BlobKey {
  BlobKey::parse(raw).unwrap()
}

#[tokio::test]
#[serial]
async fn test_insert_assigns_id_and_timestamps() {
  setup_tracing();
  let repo = repository().await;
  let owner = new_user();

  let product = repo
    .insert(NewProduct {
      owner_id: owner,
      fields: fields("Sofá", 300.0),
      image: key("product_images/sofa.jpeg"),
    })
    .await
    .unwrap();

  assert_eq!(product.created_at, product.updated_at);
  let found = repo.find_by_id(product.id).await.unwrap();
  assert_eq!(found, product);
}

#[tokio::test]
#[serial]
async fn test_replace_keeps_owner_and_creation_time() {
  setup_tracing();
  let repo = repository().await;
  let owner = new_user();
  let product = repo
    .insert(NewProduct {
      owner_id: owner,
      fields: fields("Sofá", 300.0),
      image: key("product_images/sofa.jpeg"),
    })
    .await
    .unwrap();

  let replaced = repo
    .replace(product.id, &fields("Sofá cama", 280.5), &key("product_images/sofa-2.png"))
    .await
    .unwrap();

  assert_eq!(replaced.id, product.id);
  assert_eq!(replaced.owner_id, owner);
  assert_eq!(replaced.created_at, product.created_at);
  assert!(replaced.updated_at >= product.updated_at);
  assert_eq!(replaced.title, "Sofá cama");
  assert_eq!(replaced.price, 280.5);
  assert_eq!(replaced.image.as_str(), "product_images/sofa-2.png");
}

#[tokio::test]
#[serial]
async fn test_missing_rows_report_not_found() {
  setup_tracing();
  let repo = repository().await;
  let missing = ProductId::new();

  assert!(matches!(repo.find_by_id(missing).await, Err(CatalogError::NotFound(id)) if id == missing));
  assert!(matches!(
    repo.replace(missing, &fields("x", 1.0), &key("product_images/x.png")).await,
    Err(CatalogError::NotFound(_))
  ));
  assert!(matches!(repo.remove(missing).await, Err(CatalogError::NotFound(_))));
}

#[tokio::test]
#[serial]
async fn test_file_database_persists_across_connections() {
  setup_tracing();
  let dir = tempfile::tempdir().unwrap();
  let url = format!("sqlite://{}", dir.path().join("anuncios.db").display());
  let owner = new_user();

  let id = {
    let repo = SqliteProductRepository::connect(&url).await.unwrap();
    repo.migrate().await.unwrap();
    let product = repo
      .insert(NewProduct {
        owner_id: owner,
        fields: fields("Silla", 20.0),
        image: key("product_images/silla.gif"),
      })
      .await
      .unwrap();
    repo.pool().close().await;
    product.id
  };

  let reopened = SqliteProductRepository::connect(&url).await.unwrap();
  reopened.migrate().await.unwrap();
  let listed = reopened.list_by_owner(owner).await.unwrap();
  assert_eq!(listed.len(), 1);
  assert_eq!(listed[0].id, id);
}
