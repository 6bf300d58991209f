use kinddb_core::{
    ErrorClass, InternalError,
    config::ClientConfig,
    db::{
        Datastore, DatastoreClient, MemoryStore, NativeKey, NativeRecord, NativeValue,
        RelationHolder, codec,
        query::{KEY_RESERVED_PROPERTY, NativeQuery},
    },
    model::{EntityModel, FieldModel, JoinTableModel, ModelRegistry, RelationModel, ScalarType},
    traits::{EntityKind, FieldError, FieldValue, FieldValues, assign},
    value::Value,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Employee {
    id: String,
    name: String,
    salary: i64,
}

impl FieldValues for Employee {
    fn get_value(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(self.id.to_value()),
            "name" => Some(self.name.to_value()),
            "salary" => Some(self.salary.to_value()),
            _ => None,
        }
    }

    fn set_value(&mut self, attribute: &str, value: Value) -> Result<(), FieldError> {
        match attribute {
            "id" => assign(&mut self.id, attribute, &value),
            "name" => assign(&mut self.name, attribute, &value),
            "salary" => assign(&mut self.salary, attribute, &value),
            _ => Err(FieldError::unknown(attribute)),
        }
    }
}

impl EntityKind for Employee {
    const ENTITY_NAME: &'static str = "Employee";
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Project {
    id: String,
}

impl FieldValues for Project {
    fn get_value(&self, attribute: &str) -> Option<Value> {
        (attribute == "id").then(|| self.id.to_value())
    }

    fn set_value(&mut self, attribute: &str, value: Value) -> Result<(), FieldError> {
        match attribute {
            "id" => assign(&mut self.id, attribute, &value),
            _ => Err(FieldError::unknown(attribute)),
        }
    }
}

impl EntityKind for Project {
    const ENTITY_NAME: &'static str = "Project";
}

fn registry() -> Arc<ModelRegistry> {
    let employee = EntityModel::builder("Employee")
        .identifier("id", ScalarType::Text)
        .attribute(FieldModel::scalar("name", ScalarType::Text).with_column("NAME"))
        .attribute(FieldModel::scalar("salary", ScalarType::Int).with_column("SALARY"))
        .relation(RelationModel::many_to_many(
            "projects",
            "Project",
            JoinTableModel::new("EMPLOYEE_PROJECT", "EMPLOYEE_ID", "PROJECT_ID", "Employee", "Project"),
        ))
        .build()
        .unwrap();
    let project = EntityModel::builder("Project")
        .identifier("id", ScalarType::Text)
        .build()
        .unwrap();

    Arc::new(
        ModelRegistry::new()
            .with(employee)
            .unwrap()
            .with(project)
            .unwrap(),
    )
}

#[test]
fn employee_scenario_round_trips_through_store_assigned_id() {
    let registry = registry();
    let model = registry.model("Employee").unwrap();
    let fabio = Employee {
        id: String::new(),
        name: "Fabio".into(),
        salary: 123,
    };

    let record = codec::encode(&fabio, model).unwrap();
    assert_eq!(record.kind, "Employee");
    assert!(record.key.is_none());
    assert_eq!(record.properties.len(), 2);
    assert_eq!(record.get("NAME"), Some(&NativeValue::Text("Fabio".into())));
    assert_eq!(record.get("SALARY"), Some(&NativeValue::Int(123)));

    let store = MemoryStore::new();
    let key = store
        .put(record.with_key(NativeKey::new("Employee", "abc")))
        .unwrap();
    let stored = store.get(&key).unwrap().unwrap();

    let (decoded, _): (Employee, _) = codec::decode(&stored, model).unwrap();
    assert_eq!(
        decoded,
        Employee {
            id: "abc".into(),
            name: "Fabio".into(),
            salary: 123,
        }
    );
}

#[test]
fn identifier_filter_targets_the_key_property() {
    let registry = registry();
    let model = registry.model("Employee").unwrap();

    let query = kinddb_core::db::query::QueryBuilder::new(model, &registry)
        .filter("id", "=", "X")
        .build()
        .unwrap();

    let expected = NativeQuery::kind("Employee").with_filter(
        kinddb_core::db::query::NativeFilter::property(
            KEY_RESERVED_PROPERTY,
            kinddb_core::db::query::FilterOperator::Equal,
            NativeValue::Key(NativeKey::new("Employee", "X")),
        ),
    );
    assert_eq!(query, expected);
}

#[test]
fn many_to_many_writes_two_join_records_and_reads_them_back() {
    let client = DatastoreClient::new(registry(), MemoryStore::new()).unwrap();
    for id in ["p1", "p2"] {
        client.persist(&mut Project { id: id.into() }, &[]).unwrap();
    }

    let mut fabio = Employee {
        id: "e1".into(),
        name: "Fabio".into(),
        salary: 123,
    };
    client
        .persist(&mut fabio, &[RelationHolder::many("projects", ["p1", "p2"])])
        .unwrap();

    let joins = client.store().records_of_kind("EMPLOYEE_PROJECT").unwrap();
    assert_eq!(joins.len(), 2);
    for join in &joins {
        assert_eq!(
            join.get("EMPLOYEE_ID"),
            Some(&NativeValue::Key(NativeKey::new("Employee", "e1")))
        );
    }

    let association = client.read_association::<Employee>("projects", "e1").unwrap();
    assert_eq!(association.ids(), vec![Value::from("p1"), Value::from("p2")]);
}

#[test]
fn deleted_target_surfaces_as_broken_reference() {
    init_tracing();
    let client = DatastoreClient::new(registry(), MemoryStore::new()).unwrap();
    for id in ["p1", "p2"] {
        client.persist(&mut Project { id: id.into() }, &[]).unwrap();
    }
    client
        .persist(
            &mut Employee {
                id: "e1".into(),
                ..Employee::default()
            },
            &[RelationHolder::many("projects", ["p1", "p2"])],
        )
        .unwrap();

    client.delete::<Project>("p2").unwrap();

    let association = client.read_association::<Employee>("projects", "e1").unwrap();
    assert_eq!(association.ids(), vec![Value::from("p1")]);
    assert_eq!(association.broken.len(), 1);
    assert_eq!(association.broken[0].missing, NativeKey::new("Project", "p2"));

    // the join record is reported, not repaired
    assert_eq!(client.store().records_of_kind("EMPLOYEE_PROJECT").unwrap().len(), 2);

    let removed = client
        .delete_by_column("EMPLOYEE_PROJECT", "PROJECT_ID", "p2")
        .unwrap();
    assert_eq!(removed, 1);
}

#[test]
fn disabled_verification_keeps_dangling_targets() {
    let config = ClientConfig {
        verify_association_targets: false,
        ..ClientConfig::default()
    };
    let client = DatastoreClient::with_config(registry(), config, MemoryStore::new()).unwrap();
    client
        .persist_join_records("EMPLOYEE_PROJECT", "e1", &["gone".into()])
        .unwrap();

    let association = client.read_association::<Employee>("projects", "e1").unwrap();

    assert_eq!(association.ids(), vec![Value::from("gone")]);
    assert!(association.broken.is_empty());
}

///
/// FlakyStore
///
/// Memory store that fails every put after the first `ok`.
///

struct FlakyStore {
    inner: MemoryStore,
    ok: usize,
    puts: AtomicUsize,
}

impl FlakyStore {
    fn new(ok: usize) -> Self {
        Self {
            inner: MemoryStore::new(),
            ok,
            puts: AtomicUsize::new(0),
        }
    }
}

impl Datastore for FlakyStore {
    fn put(&self, record: NativeRecord) -> Result<NativeKey, InternalError> {
        if self.puts.fetch_add(1, Ordering::SeqCst) >= self.ok {
            return Err(InternalError::store("injected failure"));
        }
        self.inner.put(record)
    }

    fn get(&self, key: &NativeKey) -> Result<Option<NativeRecord>, InternalError> {
        self.inner.get(key)
    }

    fn delete(&self, key: &NativeKey) -> Result<(), InternalError> {
        self.inner.delete(key)
    }

    fn run_query(&self, query: &NativeQuery) -> Result<Vec<NativeRecord>, InternalError> {
        self.inner.run_query(query)
    }
}

#[test]
fn partial_join_failure_leaves_earlier_records() {
    init_tracing();
    let config = ClientConfig {
        batch_size: 1,
        ..ClientConfig::default()
    };
    // entity write plus one join record succeed
    let client = DatastoreClient::with_config(registry(), config, FlakyStore::new(2)).unwrap();

    let err = client
        .persist(
            &mut Employee {
                id: "e1".into(),
                ..Employee::default()
            },
            &[RelationHolder::many("projects", ["p1", "p2", "p3"])],
        )
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Store);
    let inner = &client.store().inner;
    assert!(inner.get(&NativeKey::new("Employee", "e1")).unwrap().is_some());
    assert_eq!(inner.records_of_kind("EMPLOYEE_PROJECT").unwrap().len(), 1);
}

#[test]
fn partial_update_failure_reports_first_error() {
    init_tracing();
    // three creates and the first update succeed
    let store = FlakyStore::new(4);
    let client = DatastoreClient::new(registry(), store).unwrap();
    for id in ["a", "b", "c"] {
        client
            .persist(
                &mut Employee {
                    id: id.into(),
                    name: id.into(),
                    salary: 1,
                },
                &[],
            )
            .unwrap();
    }

    let err = client
        .update_by_column::<Employee>("salary", 1i64, &[("salary", Value::Int(2))])
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::Store);
    assert_eq!(client.find::<Employee>("a").unwrap().unwrap().entity.salary, 2);
    assert_eq!(client.find::<Employee>("b").unwrap().unwrap().entity.salary, 1);
}
