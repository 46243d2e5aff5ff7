//! Tests for hierarchy level derivation and supplier validation

use std::sync::Arc;

use rstest::{fixture, rstest};

use tradenet::application::services::{NodeQuery, RegistryService};
use tradenet::application::NodeDetail;
use tradenet::config::{ActorSettings, Settings};
use tradenet::domain::{
    ErrorKind, FieldSet, NodeDraft, NodeFilter, NodeId, NodePatch, NodeType, UpdateMode,
};
use tradenet::infrastructure::{ActorPolicy, MemoryStorage, ServiceContainer};
use tradenet::util::testing;

#[fixture]
fn registry() -> RegistryService {
    testing::init_test_setup();
    ServiceContainer::with_deps(
        Settings::default(),
        Arc::new(MemoryStorage::new()),
        Arc::new(ActorPolicy::new(ActorSettings::default())),
    )
    .unwrap()
    .registry
}

fn draft(name: &str, node_type: NodeType, supplier: Option<NodeId>) -> NodeDraft {
    NodeDraft {
        name: name.to_string(),
        node_type,
        email: "office@example.com".to_string(),
        country: "Россия".to_string(),
        city: "Москва".to_string(),
        street: "Тверская".to_string(),
        house_number: "1".to_string(),
        supplier,
        debt: None,
    }
}

fn chain(registry: &RegistryService) -> (NodeDetail, NodeDetail, NodeDetail) {
    let f = registry
        .create_node(draft("Factory", NodeType::Factory, None))
        .unwrap();
    let r = registry
        .create_node(draft("Retail", NodeType::RetailNetwork, Some(f.id)))
        .unwrap();
    let e = registry
        .create_node(draft("Entrepreneur", NodeType::Entrepreneur, Some(r.id)))
        .unwrap();
    (f, r, e)
}

fn kind(err: &tradenet::application::ApplicationError) -> ErrorKind {
    err.domain_kind().expect("domain error")
}

// ============================================================
// create
// ============================================================

#[rstest]
fn given_chain_when_created_then_levels_follow_suppliers(registry: RegistryService) {
    let (f, r, e) = chain(&registry);

    assert_eq!(f.hierarchy_level, 0);
    assert_eq!(r.hierarchy_level, 1);
    assert_eq!(e.hierarchy_level, 2);
    assert_eq!(e.supplier_name.as_deref(), Some("Retail"));
    assert_eq!(f.supplier_name, None);
}

#[rstest]
fn given_factory_with_supplier_when_created_then_validation_error(registry: RegistryService) {
    let (f, _, _) = chain(&registry);

    let err = registry
        .create_node(draft("Second factory", NodeType::Factory, Some(f.id)))
        .unwrap_err();

    assert_eq!(kind(&err), ErrorKind::Validation);
    assert_eq!(err.as_domain().unwrap().field_errors()[0].field, "supplier");
}

#[rstest]
#[case(NodeType::RetailNetwork)]
#[case(NodeType::Entrepreneur)]
fn given_non_factory_without_supplier_when_created_then_validation_error(
    registry: RegistryService,
    #[case] node_type: NodeType,
) {
    let err = registry
        .create_node(draft("Loose", node_type, None))
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::Validation);
}

#[rstest]
fn given_unknown_supplier_when_created_then_referential_error(registry: RegistryService) {
    let err = registry
        .create_node(draft("Retail", NodeType::RetailNetwork, Some(NodeId(42))))
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::ReferentialIntegrity);
}

#[rstest]
fn given_invalid_fields_when_created_then_reports_every_field(registry: RegistryService) {
    let mut d = draft("", NodeType::Factory, None);
    d.email = "not-an-email".to_string();
    d.house_number = "1".repeat(21);

    let err = registry.create_node(d).unwrap_err();

    let fields: Vec<_> = err
        .as_domain()
        .unwrap()
        .field_errors()
        .iter()
        .map(|e| e.field.clone())
        .collect();
    assert!(fields.contains(&"name".to_string()));
    assert!(fields.contains(&"email".to_string()));
    assert!(fields.contains(&"house_number".to_string()));
    assert_eq!(registry.statistics().unwrap().total_nodes, 0);
}

#[rstest]
fn given_ids_when_nodes_deleted_then_ids_are_not_reused(registry: RegistryService) {
    let f = registry
        .create_node(draft("Factory", NodeType::Factory, None))
        .unwrap();
    registry.delete_node(f.id).unwrap();

    let g = registry
        .create_node(draft("Factory 2", NodeType::Factory, None))
        .unwrap();

    assert!(g.id > f.id);
}

// ============================================================
// update
// ============================================================

#[rstest]
fn given_self_as_supplier_when_updated_then_validation_error(registry: RegistryService) {
    let (_, r, _) = chain(&registry);

    let patch = NodePatch {
        supplier: Some(Some(r.id)),
        ..NodePatch::default()
    };
    let err = registry.update_general_fields(r.id, patch).unwrap_err();

    assert_eq!(kind(&err), ErrorKind::Validation);
}

#[rstest]
fn given_descendant_as_supplier_when_updated_then_cycle_rejected(registry: RegistryService) {
    let (_, r, e) = chain(&registry);
    let below = registry
        .create_node(draft("Below", NodeType::Entrepreneur, Some(e.id)))
        .unwrap();

    let patch = NodePatch {
        supplier: Some(Some(below.id)),
        ..NodePatch::default()
    };
    let err = registry.update_general_fields(r.id, patch).unwrap_err();

    assert_eq!(kind(&err), ErrorKind::Validation);
    assert_eq!(registry.get_node(r.id).unwrap().hierarchy_level, 1);
}

#[rstest]
fn given_new_supplier_when_updated_then_level_recomputed(registry: RegistryService) {
    let (f, _, e) = chain(&registry);

    let mut fields = FieldSet::new();
    fields.insert("supplier".into(), f.id.to_string());
    fields.insert("node_type".into(), "RETAIL".into());
    let moved = registry
        .update_node_fields(e.id, &fields, UpdateMode::Partial)
        .unwrap();

    assert_eq!(moved.node_type, NodeType::RetailNetwork);
    assert_eq!(moved.supplier, Some(f.id));
    assert_eq!(moved.hierarchy_level, 1);
}

#[rstest]
fn given_supplier_moves_deeper_when_client_not_resaved_then_client_level_is_stale(
    registry: RegistryService,
) {
    let (f, r, e) = chain(&registry);
    let other = registry
        .create_node(draft("Other retail", NodeType::RetailNetwork, Some(f.id)))
        .unwrap();

    // R moves below another retail network: 1 -> 2
    let patch = NodePatch {
        supplier: Some(Some(other.id)),
        ..NodePatch::default()
    };
    let r = registry.update_general_fields(r.id, patch).unwrap();
    assert_eq!(r.hierarchy_level, 2);

    // E keeps its recorded level until it is saved again
    assert_eq!(registry.get_node(e.id).unwrap().hierarchy_level, 2);
    let leaves = registry.supply_trees().unwrap();
    let stale: Vec<_> = leaves
        .iter()
        .flat_map(|t| t.leaf_nodes())
        .filter(|n| n.is_stale())
        .map(|n| n.id)
        .collect();
    assert_eq!(stale, vec![e.id]);

    let resaved = registry
        .update_general_fields(e.id, NodePatch::default())
        .unwrap();
    assert_eq!(resaved.hierarchy_level, 3);
}

#[rstest]
fn given_full_update_missing_fields_when_applied_then_validation_error(
    registry: RegistryService,
) {
    let (f, _, _) = chain(&registry);
    let mut fields = FieldSet::new();
    fields.insert("name".into(), "Renamed".into());

    let err = registry
        .update_node_fields(f.id, &fields, UpdateMode::Full)
        .unwrap_err();

    assert_eq!(kind(&err), ErrorKind::Validation);
    assert_eq!(registry.get_node(f.id).unwrap().name, "Factory");
}

#[rstest]
#[case("hierarchy_level", "5")]
#[case("id", "99")]
#[case("created_at", "2020-01-01T00:00:00Z")]
fn given_read_only_field_when_updated_then_validation_error(
    registry: RegistryService,
    #[case] field: &str,
    #[case] value: &str,
) {
    let (f, _, _) = chain(&registry);
    let mut fields = FieldSet::new();
    fields.insert(field.into(), value.into());

    let err = registry
        .update_node_fields(f.id, &fields, UpdateMode::Partial)
        .unwrap_err();

    assert_eq!(kind(&err), ErrorKind::Validation);
}

#[rstest]
fn given_missing_node_when_updated_then_not_found(registry: RegistryService) {
    let err = registry
        .update_general_fields(NodeId(7), NodePatch::default())
        .unwrap_err();
    assert_eq!(kind(&err), ErrorKind::NotFound);
}

// ============================================================
// text normalization
// ============================================================

#[rstest]
fn given_padded_text_when_created_then_stored_trimmed_and_matched_exactly(
    registry: RegistryService,
) {
    let mut d = draft("  М.Видео ", NodeType::Factory, None);
    d.city = " Москва ".to_string();
    d.country = "Россия  ".to_string();
    d.email = " info@mvideo.ru ".to_string();

    let created = registry.create_node(d).unwrap();

    assert_eq!(created.name, "М.Видео");
    assert_eq!(created.email, "info@mvideo.ru");
    assert_eq!(created.full_address, "Россия, Москва, Тверская, 1");
    let query = NodeQuery {
        filter: NodeFilter {
            city: Some("москва".into()),
            country: Some("россия".into()),
            ..NodeFilter::default()
        },
        ..NodeQuery::all()
    };
    assert_eq!(registry.list_nodes(&query).unwrap().total, 1);
    assert!(registry.find_by_name("М.Видео").unwrap().is_some());
}

#[rstest]
fn given_padded_text_when_updated_then_stored_trimmed(registry: RegistryService) {
    let (f, _, _) = chain(&registry);
    let mut fields = FieldSet::new();
    fields.insert("street".into(), "  Невский проспект ".into());

    let updated = registry
        .update_node_fields(f.id, &fields, UpdateMode::Partial)
        .unwrap();

    assert_eq!(updated.street, "Невский проспект");
}
