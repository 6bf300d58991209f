use super::*;
use crate::{
    db::{key::KeyId, store::MemoryStore},
    model::{FieldModel, RelationModel, ScalarType},
    traits::{FieldError, FieldValue, FieldValues, assign},
};

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
struct Department {
    id: i64,
    name: String,
}

impl FieldValues for Department {
    fn get_value(&self, attribute: &str) -> Option<Value> {
        match attribute {
            "id" => Some(self.id.to_value()),
            "name" => Some(self.name.to_value()),
            _ => None,
        }
    }

    fn set_value(&mut self, attribute: &str, value: Value) -> Result<(), FieldError> {
        match attribute {
            "id" => assign(&mut self.id, attribute, &value),
            "name" => assign(&mut self.name, attribute, &value),
            _ => Err(FieldError::unknown(attribute)),
        }
    }
}

impl EntityKind for Department {
    const ENTITY_NAME: &'static str = "Department";
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

const JOIN: &str = "EMPLOYEE_PROJECT";

fn registry() -> Arc<ModelRegistry> {
    let employee = EntityModel::builder("Employee")
        .identifier("id", ScalarType::Text)
        .attribute(FieldModel::scalar("name", ScalarType::Text).with_column("NAME"))
        .attribute(FieldModel::scalar("salary", ScalarType::Int).with_column("SALARY"))
        .relation(RelationModel::many_to_one("department", "DEPARTMENT_ID", "Department"))
        .relation(RelationModel::many_to_many(
            "projects",
            "Project",
            JoinTableModel::new(JOIN, "EMPLOYEE_ID", "PROJECT_ID", "Employee", "Project"),
        ))
        .build()
        .unwrap();
    let department = EntityModel::builder("Department")
        .identifier("id", ScalarType::Int)
        .attribute(FieldModel::scalar("name", ScalarType::Text))
        .relation(RelationModel::one_to_many("staff", "Employee", "department"))
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
            .with(department)
            .unwrap()
            .with(project)
            .unwrap(),
    )
}

fn client() -> DatastoreClient<MemoryStore> {
    DatastoreClient::new(registry(), MemoryStore::new()).unwrap()
}

fn employee(id: &str, name: &str, salary: i64) -> Employee {
    Employee {
        id: id.to_string(),
        name: name.to_string(),
        salary,
    }
}

fn seed_projects(client: &DatastoreClient<MemoryStore>, ids: &[&str]) {
    for id in ids {
        let mut project = Project { id: (*id).to_string() };
        client.persist(&mut project, &[]).unwrap();
    }
}

#[test]
fn persist_with_explicit_id_round_trips() {
    let client = client();
    let mut fabio = employee("abc", "Fabio", 100);

    let key = client.persist(&mut fabio, &[]).unwrap();
    assert_eq!(key, NativeKey::new("Employee", "abc"));

    let record = client.store().get(&key).unwrap().unwrap();
    assert_eq!(record.get("NAME"), Some(&NativeValue::Text("Fabio".into())));
    assert_eq!(record.get("SALARY"), Some(&NativeValue::Int(100)));

    let found = client.find::<Employee>("abc").unwrap().unwrap();
    assert_eq!(found.entity, fabio);
    assert_eq!(found.key, key);
    assert!(found.relations.is_empty());
}

#[test]
fn persist_generates_text_id_when_unassigned() {
    let client = client();
    let mut anon = employee("", "Anon", 1);

    let key = client.persist(&mut anon, &[]).unwrap();

    assert_eq!(anon.id.len(), 26);
    assert_eq!(key.id, KeyId::Name(anon.id.clone()));
    assert!(client.find::<Employee>(anon.id.clone()).unwrap().is_some());
}

#[test]
fn unassigned_text_id_without_generation_is_rejected() {
    let config = ClientConfig {
        generate_text_ids: false,
        ..ClientConfig::default()
    };
    let client = DatastoreClient::with_config(registry(), config, MemoryStore::new()).unwrap();

    let err = client.persist(&mut employee("", "Anon", 1), &[]).unwrap_err();

    assert!(err.is_configuration());
    assert!(client.store().is_empty().unwrap());
}

#[test]
fn int_ids_are_assigned_by_the_store() {
    let client = client();
    let mut rnd = Department {
        id: 0,
        name: "R&D".into(),
    };

    let key = client.persist(&mut rnd, &[]).unwrap();

    assert_eq!(key, NativeKey::new("Department", 1i64));
    assert_eq!(rnd.id, 1);
    assert_eq!(client.find::<Department>(1i64).unwrap().unwrap().entity, rnd);
}

#[test]
fn find_of_absent_id_is_none_and_find_all_skips_it() {
    let client = client();
    client.persist(&mut employee("e1", "A", 1), &[]).unwrap();

    assert!(client.find::<Employee>("missing").unwrap().is_none());

    let found = client
        .find_all::<Employee>(&["e1".into(), "missing".into()])
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].entity.id, "e1");
}

#[test]
fn find_with_wrong_id_type_is_mapping_error() {
    let client = client();

    let err = client.find::<Department>("one").unwrap_err();

    assert_eq!(err.class, ErrorClass::Mapping);
}

#[test]
fn owning_relation_is_stored_as_key_and_decoded_as_id() {
    let client = client();
    let mut rnd = Department::default();
    client.persist(&mut rnd, &[]).unwrap();

    let key = client
        .persist(
            &mut employee("e1", "A", 1),
            &[RelationHolder::one("department", rnd.id)],
        )
        .unwrap();

    let record = client.store().get(&key).unwrap().unwrap();
    assert_eq!(
        record.get("DEPARTMENT_ID"),
        Some(&NativeValue::Key(NativeKey::new("Department", 1i64)))
    );

    let found = client.find::<Employee>("e1").unwrap().unwrap();
    assert_eq!(found.relations.get("DEPARTMENT_ID"), Some(&Value::Int(1)));

    let staff = client.find_by_relation::<Employee>("department", 1i64).unwrap();
    assert_eq!(staff.len(), 1);
    assert!(client.find_by_relation::<Employee>("department", 2i64).unwrap().is_empty());
}

#[test]
fn find_by_relation_requires_an_owning_relation() {
    let client = client();

    let err = client.find_by_relation::<Employee>("projects", "p1").unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn many_to_many_holder_writes_one_join_record_per_child() {
    let client = client();
    seed_projects(&client, &["p1", "p2"]);

    client
        .persist(
            &mut employee("e1", "A", 1),
            &[RelationHolder::many("projects", ["p1", "p2"])],
        )
        .unwrap();

    assert_eq!(client.store().records_of_kind(JOIN).unwrap().len(), 2);

    let association = client.read_association::<Employee>("projects", "e1").unwrap();
    assert_eq!(association.ids(), vec![Value::from("p1"), Value::from("p2")]);
    assert!(association.broken.is_empty());
}

#[test]
fn holder_for_inverse_relation_is_rejected() {
    let client = client();
    let mut rnd = Department::default();

    let err = client
        .persist(&mut rnd, &[RelationHolder::many("staff", ["e1"])])
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(err.origin, ErrorOrigin::Relation);
}

#[test]
fn projection_rows_are_keyed_by_attribute_name() {
    let client = client();
    client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();
    client.persist(&mut employee("b", "Bob", 20), &[]).unwrap();

    let query = client.query::<Employee>().unwrap().select(["name"]).build().unwrap();
    let QueryOutput::Projections(rows) = client.execute::<Employee>(&query).unwrap() else {
        panic!("expected projection rows");
    };

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].key, NativeKey::new("Employee", "a"));
    assert_eq!(rows[0].values.get("name"), Some(&Value::from("Ann")));
    assert!(!rows[0].values.contains_key("salary"));
}

#[test]
fn filtered_entity_query_decodes_matches() {
    let client = client();
    client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();
    client.persist(&mut employee("b", "Bob", 20), &[]).unwrap();

    let query = client
        .query::<Employee>()
        .unwrap()
        .filter("salary", ">", 15i64)
        .build()
        .unwrap();
    let entities = client.execute::<Employee>(&query).unwrap().into_entities();

    assert_eq!(entities, vec![employee("b", "Bob", 20)]);
}

#[test]
fn execute_rejects_query_for_another_kind() {
    let client = client();

    let err = client
        .execute::<Employee>(&NativeQuery::kind("Department"))
        .unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn execute_update_rejects_query_for_another_kind() {
    let client = client();
    let key = client.persist(&mut Project { id: "p1".into() }, &[]).unwrap();

    let err = client
        .execute_update::<Employee>(&NativeQuery::kind("Project"), &[("name", Value::from("X"))])
        .unwrap_err();

    assert!(err.is_configuration());
    let record = client.store().get(&key).unwrap().unwrap();
    assert!(record.properties.is_empty());
}

#[test]
fn update_by_column_rewrites_matching_records() {
    let client = client();
    client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();
    client.persist(&mut employee("b", "Bob", 20), &[]).unwrap();

    let updated = client
        .update_by_column::<Employee>("name", "Ann", &[("salary", Value::Int(99))])
        .unwrap();

    assert_eq!(updated, 1);
    assert_eq!(client.find::<Employee>("a").unwrap().unwrap().entity.salary, 99);
    assert_eq!(client.find::<Employee>("b").unwrap().unwrap().entity.salary, 20);
}

#[test]
fn null_update_removes_the_property() {
    let client = client();
    let key = client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();

    client
        .update_by_column::<Employee>("salary", 10i64, &[("name", Value::Null)])
        .unwrap();

    let record = client.store().get(&key).unwrap().unwrap();
    assert!(record.get("NAME").is_none());
    assert_eq!(client.find::<Employee>("a").unwrap().unwrap().entity.name, "");
}

#[test]
fn identifier_cannot_be_updated() {
    let client = client();
    client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();

    let err = client
        .update_by_column::<Employee>("name", "Ann", &[("id", Value::from("z"))])
        .unwrap_err();

    assert!(err.is_configuration());
    assert!(client.find::<Employee>("a").unwrap().is_some());
}

#[test]
fn delete_by_column_accepts_column_names() {
    let client = client();
    client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();
    client.persist(&mut employee("b", "Bob", 20), &[]).unwrap();

    let deleted = client.delete_by_column("Employee", "NAME", "Ann").unwrap();

    assert_eq!(deleted, 1);
    assert!(client.find::<Employee>("a").unwrap().is_none());
    assert!(client.find::<Employee>("b").unwrap().is_some());
}

#[test]
fn delete_by_column_over_join_kind_matches_keys() {
    let client = client();
    client.persist_join_records(JOIN, "e1", &["p1".into(), "p2".into()]).unwrap();
    client.persist_join_records(JOIN, "e2", &["p1".into()]).unwrap();

    let deleted = client.delete_by_column(JOIN, "EMPLOYEE_ID", "e1").unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(client.store().records_of_kind(JOIN).unwrap().len(), 1);
}

#[test]
fn delete_by_column_of_unknown_kind_is_rejected() {
    let client = client();

    let err = client.delete_by_column("Nothing", "X", 1i64).unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn delete_removes_one_entity() {
    let client = client();
    client.persist(&mut employee("a", "Ann", 10), &[]).unwrap();

    client.delete::<Employee>("a").unwrap();

    assert!(client.find::<Employee>("a").unwrap().is_none());
}

#[test]
fn join_lookups_work_from_either_side() {
    let client = client();
    seed_projects(&client, &["p1", "p2"]);
    client.persist(&mut employee("e1", "A", 1), &[]).unwrap();
    client.persist(&mut employee("e2", "B", 1), &[]).unwrap();

    let written = client
        .persist_join_table(
            &JoinTableData::new(JOIN)
                .with_owner("e1", ["p1", "p2"])
                .with_owner("e2", ["p1"]),
        )
        .unwrap();
    assert_eq!(written, 3);

    let projects = client
        .get_columns_by_id(JOIN, "EMPLOYEE_ID", "PROJECT_ID", "e1")
        .unwrap();
    assert_eq!(projects, vec![Value::from("p1"), Value::from("p2")]);

    let employees = client
        .find_ids_by_column(JOIN, "EMPLOYEE_ID", "PROJECT_ID", "p1")
        .unwrap();
    assert_eq!(employees, vec![Value::from("e1"), Value::from("e2")]);
}

#[test]
fn join_lookup_with_unpaired_columns_is_rejected() {
    let client = client();

    let err = client
        .get_columns_by_id(JOIN, "EMPLOYEE_ID", "EMPLOYEE_ID", "e1")
        .unwrap_err();

    assert!(err.is_configuration());
}

#[test]
fn broken_join_targets_are_reported() {
    let client = client();
    seed_projects(&client, &["p1"]);
    client
        .persist_join_records(JOIN, "e1", &["p1".into(), "gone".into()])
        .unwrap();

    let association = client.read_association::<Employee>("projects", "e1").unwrap();

    assert_eq!(association.ids(), vec![Value::from("p1")]);
    assert_eq!(association.broken.len(), 1);
    assert_eq!(association.broken[0].missing, NativeKey::new("Project", "gone"));
}

#[test]
fn inverse_relation_resolves_owning_keys() {
    let client = client();
    let mut rnd = Department::default();
    client.persist(&mut rnd, &[]).unwrap();
    for id in ["e1", "e2"] {
        client
            .persist(
                &mut employee(id, id, 1),
                &[RelationHolder::one("department", rnd.id)],
            )
            .unwrap();
    }

    let resolved = client.resolve_inverse::<Department>("staff", rnd.id).unwrap();

    assert_eq!(
        resolved,
        InverseResolution::Many(vec![
            NativeKey::new("Employee", "e1"),
            NativeKey::new("Employee", "e2"),
        ])
    );
}

#[test]
fn invalid_config_is_rejected_on_construction() {
    let config = ClientConfig {
        max_blob_bytes: 0,
        ..ClientConfig::default()
    };

    let err = DatastoreClient::with_config(registry(), config, MemoryStore::new()).unwrap_err();

    assert_eq!(err.origin, ErrorOrigin::Config);
}

#[test]
fn join_keys_follow_the_declared_identifier_type() {
    let client = client();

    let zero = client
        .persist_join_records(JOIN, "e1", &[Value::Int(0)])
        .unwrap_err();
    assert_eq!(zero.class, ErrorClass::Mapping);

    let err = client.delete_by_column(JOIN, "PROJECT_ID", 7i64).unwrap_err();
    assert_eq!(err.class, ErrorClass::Mapping);
    assert!(client.store().records_of_kind(JOIN).unwrap().is_empty());
}

///
/// Manager
///
/// Shares the `Person` kind with `Employee` in the subtype registry.
///

#[derive(Clone, Debug, Default, PartialEq)]
struct Manager {
    id: String,
    name: String,
    salary: i64,
}

impl FieldValues for Manager {
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

impl EntityKind for Manager {
    const ENTITY_NAME: &'static str = "Manager";
}

fn subtype_client() -> DatastoreClient<MemoryStore> {
    let person = |name: &str, tag: &str| {
        EntityModel::builder(name)
            .kind("Person")
            .identifier("id", ScalarType::Text)
            .attribute(FieldModel::scalar("name", ScalarType::Text).with_column("NAME"))
            .attribute(FieldModel::scalar("salary", ScalarType::Int).with_column("SALARY"))
            .discriminator("DTYPE", tag)
            .build()
            .unwrap()
    };
    let registry = ModelRegistry::new()
        .with(person("Employee", "EMPLOYEE"))
        .unwrap()
        .with(person("Manager", "MANAGER"))
        .unwrap();

    DatastoreClient::new(Arc::new(registry), MemoryStore::new()).unwrap()
}

#[test]
fn subtypes_sharing_a_kind_read_only_their_own_records() {
    let client = subtype_client();
    client.persist(&mut employee("e1", "Ann", 10), &[]).unwrap();
    client.persist(&mut employee("e2", "Bob", 20), &[]).unwrap();
    let mut boss = Manager {
        id: "m1".into(),
        name: "Cid".into(),
        salary: 30,
    };
    let key = client.persist(&mut boss, &[]).unwrap();
    assert_eq!(key, NativeKey::new("Person", "m1"));

    let query = client.query::<Manager>().unwrap().build().unwrap();
    let managers = client.execute::<Manager>(&query).unwrap().into_entities();
    assert_eq!(managers, vec![boss.clone()]);

    let query = client.query::<Employee>().unwrap().build().unwrap();
    assert_eq!(client.execute::<Employee>(&query).unwrap().into_entities().len(), 2);

    assert!(client.find::<Employee>("m1").unwrap().is_none());
    assert_eq!(client.find::<Manager>("m1").unwrap().unwrap().entity, boss);
}

#[test]
fn subtype_updates_and_column_deletes() {
    let client = subtype_client();
    client.persist(&mut employee("e1", "Ann", 10), &[]).unwrap();
    client
        .persist(
            &mut Manager {
                id: "m1".into(),
                name: "Ann".into(),
                salary: 10,
            },
            &[],
        )
        .unwrap();

    let updated = client
        .update_by_column::<Manager>("name", "Ann", &[("salary", Value::Int(99))])
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(client.find::<Employee>("e1").unwrap().unwrap().entity.salary, 10);
    assert_eq!(client.find::<Manager>("m1").unwrap().unwrap().entity.salary, 99);

    let deleted = client.delete_by_column("Person", "NAME", "Ann").unwrap();
    assert_eq!(deleted, 2);
    assert!(client.store().records_of_kind("Person").unwrap().is_empty());
}
