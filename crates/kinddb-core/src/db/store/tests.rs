use super::*;
use crate::db::{
    key::KeyId,
    query::{
        Combinator, FilterOperator, KEY_RESERVED_PROPERTY, NativeFilter, NativeQuery, ResultShape,
        SortDirection, SortKey,
    },
    record::NativeValue,
};

fn employee(name: &str, salary: i64) -> NativeRecord {
    NativeRecord::new("Employee")
        .with_property("NAME", NativeValue::Text(name.into()))
        .with_property("SALARY", NativeValue::Int(salary))
}

fn names(rows: &[NativeRecord]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| match r.get("NAME") {
            Some(NativeValue::Text(name)) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn put_allocates_ids_per_kind() {
    let store = MemoryStore::new();

    let a = store.put(employee("a", 1)).unwrap();
    let b = store.put(employee("b", 2)).unwrap();
    let p = store.put(NativeRecord::new("Project")).unwrap();

    assert_eq!(a, NativeKey::new("Employee", 1i64));
    assert_eq!(b, NativeKey::new("Employee", 2i64));
    assert_eq!(p, NativeKey::new("Project", 1i64));
}

#[test]
fn allocation_skips_caller_chosen_ids() {
    let store = MemoryStore::new();
    store
        .put(employee("a", 1).with_key(NativeKey::new("Employee", 1i64)))
        .unwrap();

    let allocated = store.put(employee("b", 2)).unwrap();

    assert_eq!(allocated.id, KeyId::Id(2));
}

#[test]
fn put_rejects_foreign_key_kind() {
    let store = MemoryStore::new();

    let err = store
        .put(employee("a", 1).with_key(NativeKey::new("Project", "x")))
        .unwrap_err();

    assert_eq!(err.class, crate::error::ErrorClass::Store);
}

#[test]
fn get_and_delete() {
    let store = MemoryStore::new();
    let key = store.put(employee("a", 1)).unwrap();

    let fetched = store.get(&key).unwrap().unwrap();
    assert_eq!(fetched.key.as_ref(), Some(&key));

    store.delete(&key).unwrap();
    assert!(store.get(&key).unwrap().is_none());
    store.delete(&key).unwrap();
}

#[test]
fn query_filters_and_sorts() {
    let store = MemoryStore::new();
    store.put(employee("low", 10)).unwrap();
    store.put(employee("mid", 50)).unwrap();
    store.put(employee("high", 90)).unwrap();

    let mut query = NativeQuery::kind("Employee").with_filter(NativeFilter::property(
        "SALARY",
        FilterOperator::GreaterThanOrEqual,
        NativeValue::Int(50),
    ));
    query.sorts.push(SortKey {
        property: "SALARY".into(),
        direction: SortDirection::Descending,
    });

    assert_eq!(names(&store.run_query(&query).unwrap()), vec!["high", "mid"]);
}

#[test]
fn composite_or_and_limit() {
    let store = MemoryStore::new();
    store.put(employee("a", 10)).unwrap();
    store.put(employee("b", 20)).unwrap();
    store.put(employee("c", 30)).unwrap();

    let mut query = NativeQuery::kind("Employee").with_filter(
        NativeFilter::property("NAME", FilterOperator::Equal, NativeValue::Text("a".into())).compose(
            Combinator::Or,
            NativeFilter::property("SALARY", FilterOperator::Equal, NativeValue::Int(30)),
        ),
    );
    assert_eq!(names(&store.run_query(&query).unwrap()), vec!["a", "c"]);

    query.limit = Some(1);
    assert_eq!(store.run_query(&query).unwrap().len(), 1);
}

#[test]
fn list_property_matches_any_element() {
    let store = MemoryStore::new();
    store
        .put(employee("a", 1).with_property(
            "ADDRESSES",
            NativeValue::List(vec![
                NativeValue::Text("Milan".into()),
                NativeValue::Text("Rome".into()),
            ]),
        ))
        .unwrap();

    let query = NativeQuery::kind("Employee").with_filter(NativeFilter::property(
        "ADDRESSES",
        FilterOperator::Equal,
        NativeValue::Text("Rome".into()),
    ));

    assert_eq!(store.run_query(&query).unwrap().len(), 1);
}

#[test]
fn in_filter_matches_members() {
    let store = MemoryStore::new();
    store.put(employee("a", 1)).unwrap();
    store.put(employee("b", 2)).unwrap();
    store.put(employee("c", 3)).unwrap();

    let query = NativeQuery::kind("Employee").with_filter(NativeFilter::property(
        "SALARY",
        FilterOperator::In,
        NativeValue::List(vec![NativeValue::Int(1), NativeValue::Int(3)]),
    ));

    assert_eq!(names(&store.run_query(&query).unwrap()), vec!["a", "c"]);
}

#[test]
fn records_missing_sort_property_are_excluded() {
    let store = MemoryStore::new();
    store.put(employee("a", 1)).unwrap();
    store
        .put(NativeRecord::new("Employee").with_property("NAME", NativeValue::Text("b".into())))
        .unwrap();

    let mut query = NativeQuery::kind("Employee");
    query.sorts.push(SortKey {
        property: "SALARY".into(),
        direction: SortDirection::Ascending,
    });

    assert_eq!(names(&store.run_query(&query).unwrap()), vec!["a"]);
}

#[test]
fn key_filter_and_keys_only_shape() {
    let store = MemoryStore::new();
    let key = store.put(employee("a", 1)).unwrap();
    store.put(employee("b", 2)).unwrap();

    let query = NativeQuery::keys_where("Employee", KEY_RESERVED_PROPERTY, NativeValue::Key(key.clone()));
    let rows = store.run_query(&query).unwrap();

    assert_eq!(query.shape, ResultShape::KeysOnly);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].key.as_ref(), Some(&key));
    assert!(rows[0].properties.is_empty());
}

#[test]
fn projection_keeps_only_projected_columns() {
    let store = MemoryStore::new();
    store.put(employee("a", 1)).unwrap();

    let query = NativeQuery::project_where(
        "Employee",
        "NAME",
        NativeValue::Text("a".into()),
        "SALARY",
    );
    let rows = store.run_query(&query).unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].properties.len(), 1);
    assert_eq!(rows[0].get("SALARY"), Some(&NativeValue::Int(1)));
}

#[test]
fn shared_through_arc() {
    let store = Arc::new(MemoryStore::new());
    let handle = Arc::clone(&store);

    let key = handle.put(employee("a", 1)).unwrap();

    assert!(store.get(&key).unwrap().is_some());
    assert_eq!(store.len().unwrap(), 1);
}
