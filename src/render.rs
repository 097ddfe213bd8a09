//! Insert rendering
//!
//! Turns a record's column values into a PostgreSQL `INSERT` statement with inlined literals,
//! built with SeaQuery so quoting and escaping follow the query builder's rules.

use crate::error::ProviderError;
use sea_query::{Expr, Iden, PostgresQueryBuilder, Query};
use serde_json::Value as JsonValue;

/// Table or column identifier known only at runtime
#[derive(Debug, Clone)]
struct Name(String);

impl Iden for Name {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

/// Convert a JSON cell into a SeaQuery value
///
/// Arrays and objects are kept as JSON values; integers stay integers where they fit.
pub fn json_to_value(value: &JsonValue) -> sea_query::Value {
    match value {
        JsonValue::Null => sea_query::Value::String(None),
        JsonValue::Bool(b) => (*b).into(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64().unwrap_or_default().into()
            }
        }
        JsonValue::String(s) => s.clone().into(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.clone().into(),
    }
}

/// Render an `INSERT` for `table` with the given `(column, value)` pairs, in the given order
///
/// # Example
///
/// ```
/// use lifeguard_explorer::render::insert_statement;
/// use serde_json::json;
///
/// let id = json!(1);
/// let name = json!("Ada");
/// let sql = insert_statement("customers", [("id", &id), ("name", &name)]).unwrap();
/// assert_eq!(sql, r#"INSERT INTO "customers" ("id", "name") VALUES (1, 'Ada')"#);
/// ```
pub fn insert_statement<'a, I>(table: &str, columns: I) -> Result<String, ProviderError>
where
    I: IntoIterator<Item = (&'a str, &'a JsonValue)>,
{
    let mut names = Vec::new();
    let mut values = Vec::new();
    for (column, value) in columns {
        names.push(Name(column.to_string()));
        values.push(Expr::val(json_to_value(value)));
    }

    if names.is_empty() {
        return Err(ProviderError::Render {
            entity: table.to_string(),
            reason: "no columns to insert".to_string(),
        });
    }

    let mut query = Query::insert();
    query.into_table(Name(table.to_string()));
    query.columns(names);
    query
        .values(values)
        .map_err(|e| ProviderError::Render {
            entity: table.to_string(),
            reason: e.to_string(),
        })?;

    Ok(query.to_string(PostgresQueryBuilder))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_renders_columns_in_given_order() {
        let id = json!(7);
        let email = json!("ada@example.com");
        let sql = insert_statement("customers", [("id", &id), ("email", &email)]).unwrap();

        assert!(sql.starts_with(r#"INSERT INTO "customers" ("id", "email") VALUES"#), "{sql}");
        assert!(sql.contains("7"));
        assert!(sql.contains("'ada@example.com'"));
    }

    #[test]
    fn test_null_and_bool_literals() {
        let shipped = json!(false);
        let note = json!(null);
        let sql = insert_statement("orders", [("shipped", &shipped), ("note", &note)]).unwrap();

        assert!(sql.contains("FALSE"), "{sql}");
        assert!(sql.contains("NULL"), "{sql}");
    }

    #[test]
    fn test_numbers_keep_their_kind() {
        assert_eq!(json_to_value(&json!(42)), sea_query::Value::BigInt(Some(42)));
        assert_eq!(json_to_value(&json!(2.5)), sea_query::Value::Double(Some(2.5)));
    }

    #[test]
    fn test_quotes_in_strings_are_escaped() {
        let name = json!("O'Brien");
        let sql = insert_statement("customers", [("name", &name)]).unwrap();
        assert!(!sql.contains("'O'Brien'"), "unescaped quote in {sql}");
    }

    #[test]
    fn test_empty_row_is_rejected() {
        let err = insert_statement("orders", std::iter::empty()).unwrap_err();
        assert!(matches!(err, ProviderError::Render { .. }));
    }
}
