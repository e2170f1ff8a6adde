use crate::errors::{Result, RowkeepError};
use crate::model::metadata::{primary_key, FieldMetadata};
use crate::model::value::{FromValue, Value};

/// One declared field of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub metadata: FieldMetadata,
}

impl FieldDef {
    /// Field with empty metadata
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            metadata: FieldMetadata::new(),
        }
    }

    /// Field carrying caller-defined metadata
    pub fn with_metadata(name: &'static str, metadata: FieldMetadata) -> Self {
        Self { name, metadata }
    }

    /// Field marked as (part of) the primary key
    pub fn primary_key(name: &'static str) -> Self {
        Self {
            name,
            metadata: primary_key(None),
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.metadata.is_primary_key()
    }
}

/// A fixed-schema value type whose instances map one-to-one to rows
///
/// Field order is significant: `fields`, `values` and `from_values` must all
/// agree on it, because it fixes placeholder binding on write and column
/// binding on read. Implement by hand or with [`record!`](crate::record).
pub trait Record: Sized + 'static {
    /// Qualified type name; separators are flattened into the table name
    fn type_name() -> &'static str;

    /// Declared fields in order
    fn fields() -> Vec<FieldDef>;

    /// Field values in declared order
    fn values(&self) -> Vec<Value>;

    /// Build an instance from values in declared order
    fn from_values(values: Vec<Value>) -> Result<Self>;
}

/// Positional reader used by [`Record::from_values`] implementations
///
/// Checks the value count up front, then hands out one typed value per
/// field, reporting the field name when a storage class does not fit.
#[derive(Debug)]
pub struct RowReader {
    record: &'static str,
    names: Vec<&'static str>,
    values: std::vec::IntoIter<Value>,
    position: usize,
}

impl RowReader {
    pub fn new<R: Record>(values: Vec<Value>) -> Result<Self> {
        let names: Vec<&'static str> = R::fields().iter().map(|f| f.name).collect();
        if names.len() != values.len() {
            return Err(RowkeepError::FieldCountMismatch {
                record: R::type_name().to_string(),
                expected: names.len(),
                found: values.len(),
            }
            .into());
        }
        Ok(Self {
            record: R::type_name(),
            names,
            values: values.into_iter(),
            position: 0,
        })
    }

    /// Read the next field's value
    pub fn read<T: FromValue>(&mut self) -> Result<T> {
        let field = self.names.get(self.position).copied().unwrap_or("?");
        self.position += 1;
        let value = self.values.next().ok_or_else(|| RowkeepError::FieldCountMismatch {
            record: self.record.to_string(),
            expected: self.names.len(),
            found: self.position - 1,
        })?;
        let found = value.type_name();
        T::from_value(value).ok_or_else(|| {
            RowkeepError::ValueTypeMismatch {
                record: self.record.to_string(),
                field: field.to_string(),
                expected: T::EXPECTED,
                found,
            }
            .into()
        })
    }
}

/// Declare a struct and implement [`Record`] for it
///
/// Fields tagged `#[primary_key]` form the primary key, in declaration
/// order. The table name is the struct name.
///
/// Field markers understood by the macro:
///
/// - `#[primary_key]` marks a key field
/// - `#[primary_key(expr)]` marks a key field whose caller metadata is
///   `expr`, merged with [`primary_key`](crate::model::primary_key)
/// - `#[metadata(expr)]` attaches caller metadata to any field
///
/// `expr` must evaluate to a [`FieldMetadata`](crate::model::FieldMetadata).
/// Every other attribute, doc comments included, is kept on the field.
///
/// ```
/// use rowkeep_core::model::FieldMetadata;
///
/// fn label(text: &str) -> FieldMetadata {
///     let mut metadata = FieldMetadata::new();
///     metadata.set("label", text.into());
///     metadata
/// }
///
/// rowkeep_core::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Post {
///         /// Row identity
///         #[primary_key]
///         pub id: i64,
///         #[metadata(label("Body"))]
///         pub text: String,
///     }
/// }
///
/// use rowkeep_core::Record;
/// assert_eq!(Post::type_name(), "Post");
/// assert!(Post::fields()[0].is_primary_key());
/// assert_eq!(Post::fields()[1].metadata, label("Body"));
/// ```
#[macro_export]
macro_rules! record {
    (@def $field:ident [] []) => {
        $crate::model::FieldDef::new(stringify!($field))
    };
    (@def $field:ident [true] []) => {
        $crate::model::FieldDef::primary_key(stringify!($field))
    };
    (@def $field:ident [] [$metadata:expr]) => {
        $crate::model::FieldDef::with_metadata(stringify!($field), $metadata)
    };
    (@def $field:ident [true] [$metadata:expr]) => {
        $crate::model::FieldDef::with_metadata(
            stringify!($field),
            $crate::model::primary_key(::std::option::Option::Some($metadata)),
        )
    };

    // all fields collected
    (@fields $head:tt [$($done:tt)*] [] [] []) => {
        $crate::record!(@emit $head $($done)*);
    };
    (@fields $head:tt [$($done:tt)*] [$($attr:tt)*] [$($pk:tt)*] [$($md:tt)*]
        #[primary_key] $($rest:tt)*
    ) => {
        $crate::record!(@fields $head [$($done)*] [$($attr)*] [true] [$($md)*] $($rest)*);
    };
    (@fields $head:tt [$($done:tt)*] [$($attr:tt)*] [$($pk:tt)*] [$($md:tt)*]
        #[primary_key($metadata:expr)] $($rest:tt)*
    ) => {
        $crate::record!(@fields $head [$($done)*] [$($attr)*] [true] [$metadata] $($rest)*);
    };
    (@fields $head:tt [$($done:tt)*] [$($attr:tt)*] [$($pk:tt)*] [$($md:tt)*]
        #[metadata($metadata:expr)] $($rest:tt)*
    ) => {
        $crate::record!(@fields $head [$($done)*] [$($attr)*] [$($pk)*] [$metadata] $($rest)*);
    };
    (@fields $head:tt [$($done:tt)*] [$($attr:tt)*] [$($pk:tt)*] [$($md:tt)*]
        #[$field_attr:meta] $($rest:tt)*
    ) => {
        $crate::record!(
            @fields $head [$($done)*] [$($attr)* #[$field_attr]] [$($pk)*] [$($md)*] $($rest)*
        );
    };
    (@fields $head:tt [$($done:tt)*] [$($attr:tt)*] [$($pk:tt)*] [$($md:tt)*]
        $fvis:vis $field:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::record!(
            @fields $head
            [$($done)* { [$($attr)*] [$($pk)*] [$($md)*] [$fvis] $field [$ty] }]
            [] [] []
            $($($rest)*)?
        );
    };

    (@emit { [$(#[$meta:meta])*] [$vis:vis] $name:ident }
        $( {
            [$(#[$field_attr:meta])*]
            [$($pk:tt)?]
            [$($md:expr)?]
            [$fvis:vis]
            $field:ident
            [$ty:ty]
        } )*
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_attr])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::model::Record for $name {
            fn type_name() -> &'static str {
                stringify!($name)
            }

            fn fields() -> ::std::vec::Vec<$crate::model::FieldDef> {
                ::std::vec![ $( $crate::record!(@def $field [$($pk)?] [$($md)?]) ),* ]
            }

            fn values(&self) -> ::std::vec::Vec<$crate::model::Value> {
                ::std::vec![
                    $( $crate::model::Value::from(::std::clone::Clone::clone(&self.$field)) ),*
                ]
            }

            fn from_values(
                values: ::std::vec::Vec<$crate::model::Value>,
            ) -> $crate::errors::Result<Self> {
                let mut row = $crate::model::RowReader::new::<Self>(values)?;
                Ok(Self {
                    $( $field: row.read()?, )*
                })
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident { $($body:tt)* }
    ) => {
        $crate::record!(@fields { [$(#[$meta])*] [$vis] $name } [] [] [] [] $($body)*);
    };
}
