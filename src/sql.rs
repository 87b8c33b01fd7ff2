//! SQL text built from catalog identifiers.
//!
//! Every statement whose text is assembled from identifiers lives in this
//! module so the dynamic SQL can be audited in one place. Identifiers must
//! come from catalog metadata (see [`crate::introspect`]), never from user
//! input. They are always double-quoted, so case and special characters
//! survive, but quoting does not make untrusted input safe to splice.

/// Quote a PostgreSQL identifier unconditionally.
///
/// Wraps the identifier in double quotes and doubles any embedded double
/// quotes. PostgreSQL accepts quoted identifiers everywhere, so there is no
/// reserved-word list to keep in sync.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// `"schema"."name"`
pub fn qualified(schema: &str, name: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(name))
}

/// Statement that makes the next `nextval()` of a sequence return 1.
pub fn restart_sequence(schema: &str, name: &str) -> String {
    format!("ALTER SEQUENCE {} RESTART WITH 1", qualified(schema, name))
}

/// Statement that removes every row of a table and of every table that
/// references it through a foreign key.
///
/// `DELETE` has no `CASCADE` clause in PostgreSQL (a trailing `CASCADE`
/// parses as a table alias), so the cascading wipe is a `TRUNCATE`.
/// Sequences are left alone; they are restarted separately.
pub fn truncate_cascade(schema: &str, name: &str) -> String {
    format!("TRUNCATE TABLE {} CASCADE", qualified(schema, name))
}
