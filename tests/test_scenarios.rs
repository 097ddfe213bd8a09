//! Tests for traversal and ordering behaviour on small hand-built schemas

use lifeguard_explorer::{EntityRef, EntityType, ExploreError, Explorer, ExplorerConfig, Snapshot};
use serde_json::json;

fn names(types: &[EntityType]) -> Vec<&str> {
    types.iter().map(EntityType::as_str).collect()
}

fn t(name: &str) -> EntityType {
    EntityType::from(name)
}

fn shop() -> Snapshot {
    Snapshot::from_json_value(json!({
        "tables": {
            "customers": {"relations": [
                {"name": "orders", "kind": "has_many", "target": "orders", "foreign_key": "customer_id"}
            ]},
            "orders": {"relations": [
                {"name": "customer", "kind": "belongs_to", "target": "customers", "foreign_key": "customer_id"},
                {"name": "line_items", "kind": "has_many", "target": "line_items", "foreign_key": "order_id"}
            ]},
            "line_items": {"relations": [
                {"name": "order", "kind": "belongs_to", "target": "orders", "foreign_key": "order_id"},
                {"name": "product", "kind": "belongs_to", "target": "products", "foreign_key": "product_id"}
            ]},
            "products": {"relations": [
                {"name": "line_items", "kind": "has_many", "target": "line_items", "foreign_key": "product_id"}
            ]}
        },
        "rows": {
            "customers": [{"id": 1}],
            "orders": [{"id": 1, "customer_id": 1}],
            "line_items": [
                {"id": 10, "order_id": 1, "product_id": 5},
                {"id": 11, "order_id": 1, "product_id": 5}
            ],
            "products": [{"id": 5, "name": "Widget"}]
        }
    }))
    .unwrap()
}

/// Two types referencing each other, reachable only through a common owner
fn cyclic() -> Snapshot {
    Snapshot::from_json_value(json!({
        "tables": {
            "projects": {"relations": [
                {"name": "alphas", "kind": "has_many", "target": "alphas", "foreign_key": "project_id"},
                {"name": "betas", "kind": "has_many", "target": "betas", "foreign_key": "project_id"}
            ]},
            "alphas": {"relations": [
                {"name": "beta", "kind": "belongs_to", "target": "betas", "foreign_key": "beta_id"}
            ]},
            "betas": {"relations": [
                {"name": "alpha", "kind": "belongs_to", "target": "alphas", "foreign_key": "alpha_id"}
            ]}
        },
        "rows": {
            "projects": [{"id": 1}],
            "alphas": [{"id": 1, "project_id": 1, "beta_id": 1}],
            "betas": [{"id": 1, "project_id": 1, "alpha_id": 1}]
        }
    }))
    .unwrap()
}

#[test]
fn test_order_seed_extracts_line_items_and_products() {
    let snapshot = shop();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::strict());
    let result = explorer.explore("orders", "1").unwrap();

    assert!(result.dependencies.depends_on(&t("orders"), &t("customers")));
    assert!(result.dependencies.depends_on(&t("line_items"), &t("orders")));
    assert!(result.dependencies.depends_on(&t("line_items"), &t("products")));
    assert_eq!(
        names(&result.insert_order),
        ["customers", "orders", "products", "line_items"]
    );
    assert_eq!(result.inserts.get(&t("line_items")).len(), 2);
    assert_eq!(result.inserts.get(&t("products")).len(), 1);
}

#[test]
fn test_seed_blacklist_spreads_to_owning_references() {
    let snapshot = shop();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::strict());
    let result = explorer.explore("line_items", "10").unwrap();

    // The seed's owners are referenced, not extracted, so the sibling line item stays out
    assert_eq!(result.visited.len(), 1);
    assert!(result.visited.contains(&EntityRef::new("line_items", "10")));
    assert!(result.inserts.get(&t("orders")).is_empty());
    assert!(result.inserts.get(&t("products")).is_empty());

    assert_eq!(
        result.dependencies.dependencies_of(&t("line_items")),
        Some(&[t("orders"), t("products")][..])
    );
    assert_eq!(names(&result.insert_order), ["orders", "products", "line_items"]);
}

#[test]
fn test_self_referential_tree_terminates_without_self_dependency() {
    let snapshot = Snapshot::from_json_value(json!({
        "tables": {
            "shops": {"relations": [
                {"name": "categories", "kind": "has_many", "target": "categories", "foreign_key": "shop_id"}
            ]},
            "categories": {"relations": [
                {"name": "shop", "kind": "belongs_to", "target": "shops", "foreign_key": "shop_id"},
                {"name": "parent", "kind": "belongs_to", "target": "categories", "foreign_key": "parent_id"},
                {"name": "children", "kind": "has_many", "target": "categories", "foreign_key": "parent_id"}
            ]}
        },
        "rows": {
            "shops": [{"id": 1}],
            "categories": [
                {"id": 1, "shop_id": 1, "parent_id": null},
                {"id": 2, "shop_id": 1, "parent_id": 1},
                {"id": 3, "shop_id": 1, "parent_id": 2}
            ]
        }
    }))
    .unwrap();

    let explorer = Explorer::new(&snapshot, ExplorerConfig::strict());
    let result = explorer.explore("shops", "1").unwrap();

    assert_eq!(result.visited.len(), 4);
    assert!(!result.dependencies.depends_on(&t("categories"), &t("categories")));
    assert_eq!(names(&result.insert_order), ["shops", "categories"]);
    assert_eq!(result.inserts.get(&t("categories")).len(), 3);
}

#[test]
fn test_cycle_is_reported_with_residual_graph() {
    let snapshot = cyclic();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::lenient());
    let result = explorer.explore("projects", "1").unwrap();

    assert_eq!(names(&result.insert_order), ["projects"]);
    assert!(!result.is_complete());
    assert!(result.residual.depends_on(&t("alphas"), &t("betas")));
    assert!(result.residual.depends_on(&t("betas"), &t("alphas")));

    // Residual inserts are still emitted, after a marker
    let script = result.to_sql();
    let marker = script.find("-- unresolved dependency order").unwrap();
    assert!(script.find(r#"INSERT INTO "projects""#).unwrap() < marker);
    assert!(script.find(r#"INSERT INTO "alphas""#).unwrap() > marker);
    assert!(script.find(r#"INSERT INTO "betas""#).unwrap() > marker);
}

#[test]
fn test_cycle_fails_when_unresolved_order_aborts() {
    let snapshot = cyclic();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::strict());
    let err = explorer.explore("projects", "1").unwrap_err();

    match err {
        ExploreError::UnresolvedDependencyOrder { ref residual } => {
            assert_eq!(residual.len(), 2);
            assert!(err.to_string().contains("alphas"), "{err}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_explore_from_accepts_a_record_in_hand() {
    let snapshot = shop();
    let seed = snapshot.rows(&t("orders"))[0].clone();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::default());
    let result = explorer.explore_from("orders", seed).unwrap();

    assert_eq!(result.seed, EntityRef::new("orders", "1"));
    assert_eq!(result.visited.len(), 4);
}

#[test]
fn test_explore_from_reports_unidentifiable_seed() {
    let snapshot = Snapshot::from_json_value(json!({
        "tables": {"labels": {}},
        "rows": {"labels": [{"id": 4}], "labels_orders": [{"order_id": 1, "label_id": 4}]}
    }))
    .unwrap();
    let join_row = snapshot.rows(&t("labels_orders"))[0].clone();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::default());

    let err = explorer.explore_from("labels_orders", join_row).unwrap_err();
    assert!(matches!(err, ExploreError::SeedIdentity { ref entity_type, .. } if entity_type.as_str() == "labels_orders"));
    assert!(!err.to_string().contains("labels_orders/"), "{err}");
}

#[test]
fn test_runs_are_independent() {
    let snapshot = shop();
    let explorer = Explorer::new(&snapshot, ExplorerConfig::default());
    let first = explorer.explore("orders", "1").unwrap();
    let second = explorer.explore("orders", "1").unwrap();

    assert_eq!(first.insert_order, second.insert_order);
    assert_eq!(first.visited, second.visited);
    assert_eq!(first.to_sql(), second.to_sql());
}
