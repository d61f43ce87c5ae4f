use uuid::Uuid;

use crate::error::InvariantViolation;
use crate::kind::EntityKind;
use crate::value::SqlValue;

/// A fixed-shape entity that persists as one row of one table.
pub trait Record {
    const KIND: EntityKind;
    /// Column names, in the same order as [`Record::values`].
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;

    fn values(&self) -> Vec<SqlValue>;

    /// Cross-field invariants checked before the entity enters the registry.
    fn validate(&self) -> Result<(), InvariantViolation> {
        Ok(())
    }
}

/// One persisted row, keyed by the entity identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    pub id: Uuid,
    pub values: Vec<SqlValue>,
}

/// Rows of uniform shape destined for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    pub kind: EntityKind,
    pub columns: &'static [&'static str],
    pub rows: Vec<RecordRow>,
}

impl RecordSet {
    pub fn from_records<'a, R>(records: impl IntoIterator<Item = &'a R>) -> Self
    where
        R: Record + 'a,
    {
        let rows = records
            .into_iter()
            .map(|record| RecordRow {
                id: record.id(),
                values: record.values(),
            })
            .collect();
        Self {
            kind: R::KIND,
            columns: R::COLUMNS,
            rows,
        }
    }

    pub fn table(&self) -> &'static str {
        self.kind.table()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Declares an entity struct together with its [`Record`] implementation.
///
/// Column names are the field names; an optional `checked by` clause names
/// the invariant check run on construction.
macro_rules! entity {
    (
        $(#[$meta:meta])*
        pub struct $name:ident as $kind:ident $(checked by $check:path)? {
            $( $(#[$fmeta:meta])* pub $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $ty, )*
        }

        impl $crate::record::Record for $name {
            const KIND: $crate::kind::EntityKind = $crate::kind::EntityKind::$kind;
            const COLUMNS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn values(&self) -> Vec<$crate::value::SqlValue> {
                vec![$($crate::value::ToSqlValue::to_sql_value(&self.$field)),*]
            }

            $(
            fn validate(&self) -> Result<(), $crate::error::InvariantViolation> {
                $check(self)
            }
            )?
        }
    };
}
