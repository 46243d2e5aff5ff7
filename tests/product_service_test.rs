//! Tests for product operations scoped to their owning node

use std::sync::Arc;

use chrono::NaiveDate;
use rstest::{fixture, rstest};

use tradenet::application::services::{ProductQuery, ProductService, RegistryService};
use tradenet::config::{ActorSettings, Settings};
use tradenet::domain::{
    ErrorKind, FieldSet, NodeDraft, NodeId, NodeType, ProductDraft, ProductFilter, ProductId,
    ProductPatch, UpdateMode,
};
use tradenet::infrastructure::{ActorPolicy, MemoryStorage, ServiceContainer};
use tradenet::util::testing;

struct Fixture {
    registry: RegistryService,
    products: ProductService,
    factory: NodeId,
}

#[fixture]
fn fx() -> Fixture {
    testing::init_test_setup();
    let c = ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(MemoryStorage::new()),
        Arc::new(ActorPolicy::new(ActorSettings::default())),
    )
    .unwrap();
    let factory = c
        .registry
        .create_node(NodeDraft {
            name: "Завод Apple Inc".to_string(),
            node_type: NodeType::Factory,
            email: "manufacturing@apple.com".to_string(),
            country: "США".to_string(),
            city: "Купертино".to_string(),
            street: "Apple Park Way".to_string(),
            house_number: "1".to_string(),
            supplier: None,
            debt: None,
        })
        .unwrap()
        .id;
    Fixture {
        registry: c.registry,
        products: c.products,
        factory,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(node: NodeId, name: &str, model: &str) -> ProductDraft {
    ProductDraft {
        node,
        name: name.to_string(),
        model: model.to_string(),
        release_date: date(2023, 9, 22),
    }
}

#[rstest]
fn given_node_when_product_created_then_listed_with_owner(fx: Fixture) {
    let p = fx
        .products
        .create_product(draft(fx.factory, " Смартфон ", "iPhone 15 Pro"))
        .unwrap();

    assert_eq!(p.name, "Смартфон");
    assert_eq!(p.node_name.as_deref(), Some("Завод Apple Inc"));
    let detail = fx.registry.get_node(fx.factory).unwrap();
    assert_eq!(detail.products.len(), 1);
    assert_eq!(detail.products[0].id, p.id);
}

#[rstest]
fn given_unknown_node_when_product_created_then_not_found(fx: Fixture) {
    let err = fx
        .products
        .create_product(draft(NodeId(77), "Смартфон", "iPhone 15"))
        .unwrap_err();
    assert_eq!(err.domain_kind(), Some(ErrorKind::NotFound));
}

#[rstest]
fn given_same_name_and_model_when_created_twice_then_conflict(fx: Fixture) {
    fx.products
        .create_product(draft(fx.factory, "Смартфон", "iPhone 15"))
        .unwrap();

    let err = fx
        .products
        .create_product(draft(fx.factory, "Смартфон", "iPhone 15"))
        .unwrap_err();

    assert_eq!(err.domain_kind(), Some(ErrorKind::Conflict));
    assert_eq!(fx.products.list_products(&ProductQuery::all()).unwrap().total, 1);
}

#[rstest]
#[case("", "iPhone 15")]
#[case("Смартфон", "   ")]
fn given_blank_attributes_when_created_then_validation_error(
    fx: Fixture,
    #[case] name: &str,
    #[case] model: &str,
) {
    let err = fx
        .products
        .create_product(draft(fx.factory, name, model))
        .unwrap_err();
    assert_eq!(err.domain_kind(), Some(ErrorKind::Validation));
}

#[rstest]
fn given_product_when_patched_then_only_given_fields_change(fx: Fixture) {
    let p = fx
        .products
        .create_product(draft(fx.factory, "Ноутбук", "MacBook Pro 16\""))
        .unwrap();

    let updated = fx
        .products
        .update_product(
            p.id,
            ProductPatch {
                release_date: Some(date(2024, 1, 10)),
                ..ProductPatch::default()
            },
        )
        .unwrap();

    assert_eq!(updated.release_date, date(2024, 1, 10));
    assert_eq!(updated.model, "MacBook Pro 16\"");
}

#[rstest]
fn given_owner_field_when_updated_then_read_only_error(fx: Fixture) {
    let p = fx
        .products
        .create_product(draft(fx.factory, "Планшет", "iPad Pro"))
        .unwrap();
    let mut fields = FieldSet::new();
    fields.insert("node".into(), "5".into());

    let err = fx
        .products
        .update_product_fields(p.id, &fields, UpdateMode::Partial)
        .unwrap_err();

    assert_eq!(err.domain_kind(), Some(ErrorKind::Validation));
    assert_eq!(fx.products.get_product(p.id).unwrap().node, fx.factory);
}

#[rstest]
fn given_product_when_deleted_then_gone(fx: Fixture) {
    let p = fx
        .products
        .create_product(draft(fx.factory, "Наушники", "AirPods Pro 2"))
        .unwrap();

    let removed = fx.products.delete_product(p.id).unwrap();

    assert_eq!(removed.id, p.id);
    let err = fx.products.get_product(p.id).unwrap_err();
    assert_eq!(err.domain_kind(), Some(ErrorKind::NotFound));
    let err = fx.products.delete_product(ProductId(999)).unwrap_err();
    assert_eq!(err.domain_kind(), Some(ErrorKind::NotFound));
}

#[rstest]
fn given_products_of_two_nodes_when_filtered_by_node_then_scoped(fx: Fixture) {
    let retail = fx
        .registry
        .create_node(NodeDraft {
            name: "DNS".to_string(),
            node_type: NodeType::RetailNetwork,
            email: "info@dns-shop.ru".to_string(),
            country: "Россия".to_string(),
            city: "Владивосток".to_string(),
            street: "Океанский проспект".to_string(),
            house_number: "17".to_string(),
            supplier: Some(fx.factory),
            debt: None,
        })
        .unwrap();
    fx.products
        .create_product(draft(fx.factory, "Смартфон", "iPhone 15"))
        .unwrap();
    fx.products
        .create_product(draft(retail.id, "Смартфон", "iPhone 15"))
        .unwrap();

    let query = ProductQuery {
        filter: ProductFilter {
            node: Some(retail.id),
            ..ProductFilter::default()
        },
        ..ProductQuery::all()
    };
    let page = fx.products.list_products(&query).unwrap();

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].node_name.as_deref(), Some("DNS"));
}
