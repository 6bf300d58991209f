use crate::db::{
    query::{Combinator, FilterOperator, KEY_RESERVED_PROPERTY, NativeFilter, SortDirection, SortKey},
    record::{NativeRecord, NativeValue},
};
use std::cmp::Ordering;

// Property value as seen by filters and sorts; `__key__` reads the key.
pub(super) fn property_of(record: &NativeRecord, property: &str) -> Option<NativeValue> {
    if property == KEY_RESERVED_PROPERTY {
        record.key.clone().map(NativeValue::Key)
    } else {
        record.get(property).cloned()
    }
}

pub(super) fn matches(filter: &NativeFilter, record: &NativeRecord) -> bool {
    match filter {
        NativeFilter::Composite {
            combinator,
            left,
            right,
        } => match combinator {
            Combinator::And => matches(left, record) && matches(right, record),
            Combinator::Or => matches(left, record) || matches(right, record),
        },
        NativeFilter::Property {
            property,
            operator,
            value,
        } => property_of(record, property)
            .is_some_and(|actual| matches_value(&actual, *operator, value)),
    }
}

// A list property matches when any of its elements does.
fn matches_value(actual: &NativeValue, operator: FilterOperator, expected: &NativeValue) -> bool {
    if let NativeValue::List(items) = actual {
        return items
            .iter()
            .any(|item| matches_value(item, operator, expected));
    }

    if operator == FilterOperator::In {
        return match expected {
            NativeValue::List(options) => options
                .iter()
                .any(|option| compare(actual, option) == Some(Ordering::Equal)),
            other => compare(actual, other) == Some(Ordering::Equal),
        };
    }

    let Some(ord) = compare(actual, expected) else {
        return operator == FilterOperator::NotEqual;
    };

    match operator {
        FilterOperator::Equal => ord.is_eq(),
        FilterOperator::NotEqual => ord.is_ne(),
        FilterOperator::GreaterThan => ord.is_gt(),
        FilterOperator::GreaterThanOrEqual => ord.is_ge(),
        FilterOperator::LessThan => ord.is_lt(),
        FilterOperator::LessThanOrEqual => ord.is_le(),
        FilterOperator::In => false,
    }
}

/// Order two native values of comparable types; `None` across types.
#[expect(clippy::cast_precision_loss)]
pub(super) fn compare(a: &NativeValue, b: &NativeValue) -> Option<Ordering> {
    match (a, b) {
        (NativeValue::Null, NativeValue::Null) => Some(Ordering::Equal),
        (NativeValue::Bool(x), NativeValue::Bool(y)) => Some(x.cmp(y)),
        (NativeValue::Int(x), NativeValue::Int(y)) => Some(x.cmp(y)),
        (NativeValue::Float(x), NativeValue::Float(y)) => x.partial_cmp(y),
        (NativeValue::Int(x), NativeValue::Float(y)) => (*x as f64).partial_cmp(y),
        (NativeValue::Float(x), NativeValue::Int(y)) => x.partial_cmp(&(*y as f64)),
        (NativeValue::Text(x), NativeValue::Text(y)) => Some(x.cmp(y)),
        (NativeValue::Blob(x), NativeValue::Blob(y)) => Some(x.cmp(y)),
        (NativeValue::Key(x), NativeValue::Key(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Order two records by the sort keys, falling back to key order.
pub(super) fn compare_records(a: &NativeRecord, b: &NativeRecord, sorts: &[SortKey]) -> Ordering {
    for sort in sorts {
        let ord = match (property_of(a, &sort.property), property_of(b, &sort.property)) {
            (Some(x), Some(y)) => compare(&x, &y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        let ord = match sort.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };
        if ord.is_ne() {
            return ord;
        }
    }

    a.key.cmp(&b.key)
}
