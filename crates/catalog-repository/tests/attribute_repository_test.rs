//! Integration tests for PgAttributeRepository.
//!
//! These tests run against a real PostgreSQL database using testcontainers.
//! Requires Docker to be available on the system.

mod common;

use catalog_core::domain::{Attribute, AttributeType, Category, Slug, ValidationRules};
use catalog_core::{PageRequest, Sort};
use catalog_repository::{
    AttributeAssignment, AttributeFilter, AttributeRepository, CategoryRepository, PgAttributeRepository,
    PgCategoryRepository,
};
use common::TestDatabase;

fn category(name: &str, parent: Option<&Category>) -> Category {
    Category::new(name, Slug::from_name(name).unwrap(), None, parent, 0).unwrap()
}

fn attribute(name: &str, value_type: AttributeType) -> Attribute {
    Attribute::new(name, Slug::from_name(name).unwrap(), value_type, ValidationRules::default())
}

fn assignment(attribute: &Attribute, sort_order: i32, inherit: bool) -> AttributeAssignment {
    AttributeAssignment {
        attribute_id: attribute.id,
        sort_order,
        inherit_to_descendants: inherit,
    }
}

struct Catalog {
    _db: TestDatabase,
    categories: PgCategoryRepository,
    attributes: PgAttributeRepository,
}

async fn catalog() -> Catalog {
    let db = TestDatabase::new().await;
    Catalog {
        categories: PgCategoryRepository::new(db.pool()),
        attributes: PgAttributeRepository::new(db.pool()),
        _db: db,
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_only_inheritable_assignments_reach_descendants() {
    let c = catalog().await;
    let electronics = category("Electronics", None);
    let phones = category("Phones", Some(&electronics));
    c.categories.save(&electronics).await.unwrap();
    c.categories.save(&phones).await.unwrap();

    let brand = attribute("Brand", AttributeType::String);
    let warranty = attribute("Warranty", AttributeType::Number);
    let storage = attribute("Storage", AttributeType::Number);
    for a in [&brand, &warranty, &storage] {
        c.attributes.save(a).await.expect("Failed to save attribute");
    }

    c.attributes
        .assign_to_category(electronics.id, &[assignment(&brand, 1, true), assignment(&warranty, 3, false)])
        .await
        .expect("Assign failed");
    c.attributes
        .assign_to_category(phones.id, &[assignment(&storage, 2, false)])
        .await
        .expect("Assign failed");

    let own = c.attributes.find_for_category(electronics.id).await.unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|a| !a.link.is_inherited));

    let assigned = c.attributes.find_for_category(phones.id).await.expect("Query failed");
    let names: Vec<_> = assigned.iter().map(|a| a.attribute.name.as_str()).collect();
    assert_eq!(names, vec!["Brand", "Storage"]);
    assert!(assigned[0].link.is_inherited);
    assert!(assigned[0].link.inherit_to_descendants);
    assert_eq!(assigned[0].link.category_id, phones.id);
    assert!(!assigned[1].link.is_inherited);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_reassign_updates_flag_and_unassign_removes_inherited() {
    let c = catalog().await;
    let electronics = category("Electronics", None);
    let phones = category("Phones", Some(&electronics));
    c.categories.save(&electronics).await.unwrap();
    c.categories.save(&phones).await.unwrap();

    let brand = attribute("Brand", AttributeType::String);
    c.attributes.save(&brand).await.unwrap();

    c.attributes
        .assign_to_category(electronics.id, &[assignment(&brand, 1, false)])
        .await
        .unwrap();
    assert!(c.attributes.find_for_category(phones.id).await.unwrap().is_empty());

    c.attributes
        .assign_to_category(electronics.id, &[assignment(&brand, 4, true)])
        .await
        .unwrap();
    let assigned = c.attributes.find_for_category(phones.id).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].link.sort_order, 4);
    assert_eq!(c.attributes.categories_count(brand.id).await.unwrap(), 1);

    assert!(c.attributes.unassign_from_category(electronics.id, brand.id).await.unwrap());
    assert!(!c.attributes.unassign_from_category(electronics.id, brand.id).await.unwrap());
    assert!(c.attributes.find_for_category(phones.id).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_nearest_assignment_wins() {
    let c = catalog().await;
    let electronics = category("Electronics", None);
    let phones = category("Phones", Some(&electronics));
    let smartphones = category("Smartphones", Some(&phones));
    for cat in [&electronics, &phones, &smartphones] {
        c.categories.save(cat).await.unwrap();
    }

    let color = attribute("Color", AttributeType::String);
    c.attributes.save(&color).await.unwrap();
    c.attributes
        .assign_to_category(electronics.id, &[assignment(&color, 9, true)])
        .await
        .unwrap();
    c.attributes
        .assign_to_category(phones.id, &[assignment(&color, 2, true)])
        .await
        .unwrap();

    let assigned = c.attributes.find_for_category(smartphones.id).await.unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].link.sort_order, 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_moved_subtree_resolves_new_ancestors() {
    let c = catalog().await;
    let electronics = category("Electronics", None);
    let books = category("Books", None);
    let readers = category("E-Readers", Some(&electronics));
    let kindle = category("Kindle", Some(&readers));
    for cat in [&electronics, &books, &readers, &kindle] {
        c.categories.save(cat).await.unwrap();
    }

    let voltage = attribute("Voltage", AttributeType::Number);
    let isbn = attribute("ISBN", AttributeType::String);
    c.attributes.save(&voltage).await.unwrap();
    c.attributes.save(&isbn).await.unwrap();
    c.attributes
        .assign_to_category(electronics.id, &[assignment(&voltage, 0, true)])
        .await
        .unwrap();
    c.attributes
        .assign_to_category(books.id, &[assignment(&isbn, 0, true)])
        .await
        .unwrap();

    let before: Vec<_> = c
        .attributes
        .find_for_category(kindle.id)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.attribute.id)
        .collect();
    assert_eq!(before, vec![voltage.id]);

    c.categories
        .move_subtree(readers.id, Some(books.id))
        .await
        .expect("Move failed");

    for id in [readers.id, kindle.id] {
        let after: Vec<_> = c
            .attributes
            .find_for_category(id)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.attribute.id)
            .collect();
        assert_eq!(after, vec![isbn.id]);
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_group_filter_and_grouped_listing() {
    let c = catalog().await;

    let mut width = attribute("Width", AttributeType::Number);
    width.group_name = Some("Dimensions".to_string());
    width.sort_order = 2;
    let mut height = attribute("Height", AttributeType::Number);
    height.group_name = Some("Dimensions".to_string());
    height.sort_order = 1;
    let brand = attribute("Brand", AttributeType::String);
    for a in [&width, &height, &brand] {
        c.attributes.save(a).await.unwrap();
    }

    let filter = AttributeFilter {
        group_name: Some("Dimensions".to_string()),
        ..Default::default()
    };
    let page = c
        .attributes
        .find_all(&filter, PageRequest::new(0, 20), Sort::default())
        .await
        .unwrap();
    assert_eq!(page.info.total_elements, 2);

    let grouped: Vec<_> = c
        .attributes
        .find_all_by_group()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.name)
        .collect();
    assert_eq!(grouped, vec!["Brand", "Height", "Width"]);

    let stored = c.attributes.find_by_id(width.id).await.unwrap().unwrap();
    assert_eq!(stored.group(), "Dimensions");
}
