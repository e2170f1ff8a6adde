//! Table metadata derivation
//!
//! Turns a record type's shape into a table name and the three statement
//! templates the store executes. Pure and deterministic: the same field
//! list always yields byte-identical SQL.

use crate::model::{FieldDef, Record};

/// Derived, cacheable description of the table backing one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub type_name: String,
    pub table_name: String,
    pub all_field_names: Vec<String>,
    pub primary_key_names: Vec<String>,
    pub query_create: String,
    pub query_upsert: String,
    pub query_select: String,
}

impl TableMetadata {
    /// Derive metadata for a record type
    pub fn of<R: Record>() -> Self {
        Self::derive(R::type_name(), &R::fields())
    }

    /// Derive metadata from a type name and its declared fields
    ///
    /// Does not validate: an empty primary key produces an empty
    /// `PRIMARY KEY ()` clause that the engine will reject.
    pub fn derive(type_name: &str, fields: &[FieldDef]) -> Self {
        let table_name = flatten_type_name(type_name);
        let all_field_names: Vec<String> = fields.iter().map(|f| f.name.to_string()).collect();
        let primary_key_names: Vec<String> = fields
            .iter()
            .filter(|f| f.is_primary_key())
            .map(|f| f.name.to_string())
            .collect();

        let columns = all_field_names.join(", ");
        let keys = primary_key_names.join(", ");

        let query_create = query_template(&format!(
            "CREATE TABLE {table_name} ({columns}, PRIMARY KEY ({keys}))"
        ));

        let placeholders = vec!["?"; all_field_names.len()].join(", ");
        let assignments = all_field_names
            .iter()
            .map(|f| format!("{f}=?"))
            .collect::<Vec<_>>()
            .join(", ");
        let query_upsert = query_template(&format!(
            "INSERT INTO {table_name}
               VALUES ({placeholders})
               ON CONFLICT ({keys})
               DO UPDATE SET {assignments}"
        ));

        let conditions = primary_key_names
            .iter()
            .map(|f| format!("{f}=?"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let query_select = query_template(&format!(
            "SELECT * FROM {table_name}
               WHERE {conditions}"
        ));

        Self {
            type_name: type_name.to_string(),
            table_name,
            all_field_names,
            primary_key_names,
            query_create,
            query_upsert,
            query_select,
        }
    }

    pub fn field_count(&self) -> usize {
        self.all_field_names.len()
    }

    pub fn primary_key_count(&self) -> usize {
        self.primary_key_names.len()
    }
}

/// Collapse a qualified type name into a flat SQL identifier
///
/// `::` becomes a single `_`; any other character outside `[A-Za-z0-9_]`
/// (`.`, generic brackets, spaces) becomes `_` as well. Distinct names may
/// collapse to the same identifier.
pub fn flatten_type_name(type_name: &str) -> String {
    type_name
        .replace("::", "_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Normalize a statement template to a single line with single spaces
pub fn query_template(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_fields() -> Vec<FieldDef> {
        vec![FieldDef::primary_key("id"), FieldDef::new("text")]
    }

    #[test]
    fn test_post_templates() {
        let meta = TableMetadata::derive("Post", &post_fields());
        assert_eq!(meta.table_name, "Post");
        assert_eq!(meta.all_field_names, vec!["id", "text"]);
        assert_eq!(meta.primary_key_names, vec!["id"]);
        assert_eq!(
            meta.query_create,
            "CREATE TABLE Post (id, text, PRIMARY KEY (id))"
        );
        assert_eq!(
            meta.query_upsert,
            "INSERT INTO Post VALUES (?, ?) ON CONFLICT (id) DO UPDATE SET id=?, text=?"
        );
        assert_eq!(meta.query_select, "SELECT * FROM Post WHERE id=?");
    }

    #[test]
    fn test_composite_key_order_follows_declaration() {
        let fields = vec![
            FieldDef::primary_key("tenant"),
            FieldDef::new("body"),
            FieldDef::primary_key("seq"),
        ];
        let meta = TableMetadata::derive("Entry", &fields);
        assert_eq!(meta.primary_key_names, vec!["tenant", "seq"]);
        assert_eq!(
            meta.query_create,
            "CREATE TABLE Entry (tenant, body, seq, PRIMARY KEY (tenant, seq))"
        );
        assert_eq!(
            meta.query_select,
            "SELECT * FROM Entry WHERE tenant=? AND seq=?"
        );
        assert!(meta
            .query_upsert
            .contains("ON CONFLICT (tenant, seq) DO UPDATE SET tenant=?, body=?, seq=?"));
    }

    #[test]
    fn test_missing_primary_key_is_not_rejected() {
        let meta = TableMetadata::derive("Loose", &[FieldDef::new("a")]);
        assert!(meta.primary_key_names.is_empty());
        assert_eq!(meta.query_create, "CREATE TABLE Loose (a, PRIMARY KEY ())");
    }

    #[test]
    fn test_flatten_type_name() {
        assert_eq!(flatten_type_name("Outer.Inner"), "Outer_Inner");
        assert_eq!(flatten_type_name("blog::Post"), "blog_Post");
        assert_eq!(flatten_type_name("Wrapper<u8>"), "Wrapper_u8_");
        assert_eq!(flatten_type_name("Plain_Name1"), "Plain_Name1");
    }

    #[test]
    fn test_query_template_normalizes_whitespace() {
        assert_eq!(
            query_template("\n  SELECT *\n    FROM t\n\tWHERE a=?  \n"),
            "SELECT * FROM t WHERE a=?"
        );
    }
}
