use crate::model::IdKind;
use std::fmt;

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::OneToOne => "one-to-one",
            Self::ManyToOne => "many-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
        };
        f.write_str(label)
    }
}

///
/// JoinTableModel
///
/// Synthetic kind holding one record per many-to-many pair. Each record
/// carries a key-valued property per side. Both sides default to text
/// identifiers; the registry checks them against the registered kinds.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinTableModel {
    pub join_kind: String,
    pub owner_column: String,
    pub child_column: String,
    pub owner_kind: String,
    pub child_kind: String,
    pub owner_id: IdKind,
    pub child_id: IdKind,
}

impl JoinTableModel {
    pub fn new(
        join_kind: impl Into<String>,
        owner_column: impl Into<String>,
        child_column: impl Into<String>,
        owner_kind: impl Into<String>,
        child_kind: impl Into<String>,
    ) -> Self {
        Self {
            join_kind: join_kind.into(),
            owner_column: owner_column.into(),
            child_column: child_column.into(),
            owner_kind: owner_kind.into(),
            child_kind: child_kind.into(),
            owner_id: IdKind::Text,
            child_id: IdKind::Text,
        }
    }

    /// Identifier types of the owner and child sides.
    #[must_use]
    pub fn with_id_kinds(mut self, owner: IdKind, child: IdKind) -> Self {
        self.owner_id = owner;
        self.child_id = child;
        self
    }

    /// (known column, projected column, projected kind) for one side.
    #[must_use]
    pub fn columns_for(&self, side: JoinSide) -> (&str, &str, &str) {
        match side {
            JoinSide::Owner => (&self.owner_column, &self.child_column, &self.child_kind),
            JoinSide::Child => (&self.child_column, &self.owner_column, &self.owner_kind),
        }
    }

    /// Kind of the key stored under `side`'s column.
    #[must_use]
    pub fn kind_of(&self, side: JoinSide) -> &str {
        match side {
            JoinSide::Owner => &self.owner_kind,
            JoinSide::Child => &self.child_kind,
        }
    }

    #[must_use]
    pub const fn id_kind_of(&self, side: JoinSide) -> IdKind {
        match side {
            JoinSide::Owner => self.owner_id,
            JoinSide::Child => self.child_id,
        }
    }

    /// Side whose column is `column`, if any.
    #[must_use]
    pub fn side_of(&self, column: &str) -> Option<JoinSide> {
        if column == self.owner_column {
            Some(JoinSide::Owner)
        } else if column == self.child_column {
            Some(JoinSide::Child)
        } else {
            None
        }
    }
}

///
/// JoinSide
///
/// Which side of a join record the caller already knows.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinSide {
    Owner,
    Child,
}

///
/// RelationModel
///
/// One relationship attribute. Owning single-valued relations store the
/// target key under `column`; inverse ones are resolved by query through
/// the target's `mapped_by` relation; many-to-many goes through
/// `join_table` and is never stored on either record.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationModel {
    pub name: String,
    pub column: String,
    pub cardinality: Cardinality,
    pub target: String,
    pub owning: bool,
    pub mapped_by: Option<String>,
    pub join_table: Option<JoinTableModel>,
}

impl RelationModel {
    fn base(name: impl Into<String>, cardinality: Cardinality, target: impl Into<String>) -> Self {
        let name = name.into();

        Self {
            column: name.clone(),
            name,
            cardinality,
            target: target.into(),
            owning: true,
            mapped_by: None,
            join_table: None,
        }
    }

    /// Owning single-valued side; the target key is stored under `column`.
    pub fn many_to_one(
        name: impl Into<String>,
        column: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            ..Self::base(name, Cardinality::ManyToOne, target)
        }
    }

    pub fn one_to_one(
        name: impl Into<String>,
        column: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            ..Self::base(name, Cardinality::OneToOne, target)
        }
    }

    /// Inverse one-to-one; `mapped_by` names the owning relation on `target`.
    pub fn inverse_one_to_one(
        name: impl Into<String>,
        target: impl Into<String>,
        mapped_by: impl Into<String>,
    ) -> Self {
        Self {
            owning: false,
            mapped_by: Some(mapped_by.into()),
            ..Self::base(name, Cardinality::OneToOne, target)
        }
    }

    pub fn one_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        mapped_by: impl Into<String>,
    ) -> Self {
        Self {
            owning: false,
            mapped_by: Some(mapped_by.into()),
            ..Self::base(name, Cardinality::OneToMany, target)
        }
    }

    pub fn many_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        join_table: JoinTableModel,
    ) -> Self {
        Self {
            join_table: Some(join_table),
            ..Self::base(name, Cardinality::ManyToMany, target)
        }
    }

    /// Whether this relation writes a key-valued property on its own record.
    #[must_use]
    pub const fn stores_key(&self) -> bool {
        self.owning && matches!(self.cardinality, Cardinality::OneToOne | Cardinality::ManyToOne)
    }

    #[must_use]
    pub const fn is_inverse(&self) -> bool {
        !self.owning && matches!(self.cardinality, Cardinality::OneToOne | Cardinality::OneToMany)
    }
}
