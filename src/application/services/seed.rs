//! Demonstration dataset
//!
//! Three factories, three retail networks under them, one entrepreneur under
//! each retail network, and a product catalog per factory. Everything goes
//! through the regular create path; names that already exist are reused.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::application::services::{ProductService, RegistryService};
use crate::application::ApplicationResult;
use crate::domain::{DomainError, NodeDraft, NodeId, NodeType, ProductDraft};

struct SeedNode {
    name: &'static str,
    node_type: NodeType,
    email: &'static str,
    country: &'static str,
    city: &'static str,
    street: &'static str,
    house_number: &'static str,
    /// Name of the supplier, which must appear earlier in the list.
    supplier: Option<&'static str>,
    /// Debt in cents.
    debt_cents: i64,
}

const NODES: [SeedNode; 9] = [
    SeedNode {
        name: "Завод Samsung Electronics",
        node_type: NodeType::Factory,
        email: "contact@samsung.com",
        country: "Южная Корея",
        city: "Сеул",
        street: "Seocho-daero",
        house_number: "1321",
        supplier: None,
        debt_cents: 0,
    },
    SeedNode {
        name: "Завод Apple Inc",
        node_type: NodeType::Factory,
        email: "manufacturing@apple.com",
        country: "США",
        city: "Купертино",
        street: "Apple Park Way",
        house_number: "1",
        supplier: None,
        debt_cents: 0,
    },
    SeedNode {
        name: "Завод Xiaomi",
        node_type: NodeType::Factory,
        email: "factory@xiaomi.com",
        country: "Китай",
        city: "Пекин",
        street: "Qinghe Middle Street",
        house_number: "68",
        supplier: None,
        debt_cents: 0,
    },
    SeedNode {
        name: "М.Видео",
        node_type: NodeType::RetailNetwork,
        email: "info@mvideo.ru",
        country: "Россия",
        city: "Москва",
        street: "Тверская",
        house_number: "1",
        supplier: Some("Завод Samsung Electronics"),
        debt_cents: 150_000_050,
    },
    SeedNode {
        name: "DNS",
        node_type: NodeType::RetailNetwork,
        email: "info@dns-shop.ru",
        country: "Россия",
        city: "Владивосток",
        street: "Океанский проспект",
        house_number: "17",
        supplier: Some("Завод Apple Inc"),
        debt_cents: 230_000_000,
    },
    SeedNode {
        name: "Эльдорадо",
        node_type: NodeType::RetailNetwork,
        email: "contact@eldorado.ru",
        country: "Россия",
        city: "Санкт-Петербург",
        street: "Невский проспект",
        house_number: "100",
        supplier: Some("Завод Xiaomi"),
        debt_cents: 98_000_075,
    },
    SeedNode {
        name: "ИП Иванов И.И.",
        node_type: NodeType::Entrepreneur,
        email: "ivanov@mail.ru",
        country: "Россия",
        city: "Казань",
        street: "Баумана",
        house_number: "58",
        supplier: Some("М.Видео"),
        debt_cents: 15_000_000,
    },
    SeedNode {
        name: "ИП Петров П.П.",
        node_type: NodeType::Entrepreneur,
        email: "petrov@yandex.ru",
        country: "Россия",
        city: "Екатеринбург",
        street: "Ленина",
        house_number: "25",
        supplier: Some("DNS"),
        debt_cents: 7_500_050,
    },
    SeedNode {
        name: "ИП Сидоров С.С.",
        node_type: NodeType::Entrepreneur,
        email: "sidorov@gmail.com",
        country: "Россия",
        city: "Новосибирск",
        street: "Красный проспект",
        house_number: "1",
        supplier: Some("Эльдорадо"),
        debt_cents: 5_000_000,
    },
];

/// (owner, name, model, days before today)
const PRODUCTS: [(&str, &str, &str, u64); 13] = [
    ("Завод Samsung Electronics", "Смартфон", "Galaxy S23", 300),
    ("Завод Samsung Electronics", "Смартфон", "Galaxy A54", 200),
    ("Завод Samsung Electronics", "Телевизор", "QLED 4K 55\"", 400),
    ("Завод Samsung Electronics", "Холодильник", "RB38", 500),
    ("Завод Apple Inc", "Смартфон", "iPhone 15 Pro", 150),
    ("Завод Apple Inc", "Смартфон", "iPhone 15", 150),
    ("Завод Apple Inc", "Ноутбук", "MacBook Pro 16\"", 250),
    ("Завод Apple Inc", "Планшет", "iPad Pro", 180),
    ("Завод Apple Inc", "Наушники", "AirPods Pro 2", 365),
    ("Завод Xiaomi", "Смартфон", "Redmi Note 13 Pro", 100),
    ("Завод Xiaomi", "Смартфон", "Mi 13 Ultra", 280),
    ("Завод Xiaomi", "Пылесос", "Robot Vacuum S10+", 220),
    ("Завод Xiaomi", "Электросамокат", "Mi Scooter 4 Pro", 320),
];

/// What a seeding run created and what it found already present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub nodes_created: usize,
    pub nodes_existing: usize,
    pub products_created: usize,
    pub products_existing: usize,
}

fn lookup(ids: &[(&str, NodeId)], name: &str) -> Result<NodeId, DomainError> {
    ids.iter()
        .find(|(n, _)| *n == name)
        .map(|(_, id)| *id)
        .ok_or_else(|| DomainError::Corrupt(format!("seed node '{name}' is missing")))
}

/// Load the demonstration network. Release dates are relative to `today`.
pub fn seed_demo(
    registry: &RegistryService,
    products: &ProductService,
    today: NaiveDate,
) -> ApplicationResult<SeedReport> {
    let mut report = SeedReport::default();
    let mut ids: Vec<(&str, NodeId)> = Vec::new();

    for seed in &NODES {
        if let Some(existing) = registry.find_by_name(seed.name)? {
            debug!("seed: node '{}' exists as {}", seed.name, existing.id);
            report.nodes_existing += 1;
            ids.push((seed.name, existing.id));
            continue;
        }
        let supplier = match seed.supplier {
            Some(name) => Some(lookup(&ids, name)?),
            None => None,
        };
        let created = registry.create_node(NodeDraft {
            name: seed.name.to_string(),
            node_type: seed.node_type,
            email: seed.email.to_string(),
            country: seed.country.to_string(),
            city: seed.city.to_string(),
            street: seed.street.to_string(),
            house_number: seed.house_number.to_string(),
            supplier,
            debt: Some(Decimal::new(seed.debt_cents, 2)),
        })?;
        report.nodes_created += 1;
        ids.push((seed.name, created.id));
    }

    for (owner, name, model, days) in PRODUCTS {
        let node = lookup(&ids, owner)?;
        let release_date = today.checked_sub_days(Days::new(days)).unwrap_or(today);
        let draft = ProductDraft {
            node,
            name: name.to_string(),
            model: model.to_string(),
            release_date,
        };
        match products.create_product(draft) {
            Ok(_) => report.products_created += 1,
            Err(e) if matches!(e.as_domain(), Some(DomainError::DuplicateProduct { .. })) => {
                report.products_existing += 1
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "seed: {} node(s) created, {} existing; {} product(s) created, {} existing",
        report.nodes_created,
        report.nodes_existing,
        report.products_created,
        report.products_existing
    );
    Ok(report)
}
