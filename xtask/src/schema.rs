// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Schema introspection and comparison for migration parity checks.

use std::collections::{BTreeMap, BTreeSet};

use color_eyre::{Result, eyre::Context};
use diesel::sql_types::{Integer, Text};
use diesel::{MysqlConnection, QueryableByName, RunQueryDsl, SqliteConnection};

/// Normalized schema representation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    pub tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: BTreeSet<String>,
    foreign_keys: BTreeSet<ForeignKey>,
    unique_constraints: BTreeSet<Vec<String>>,
    /// Column lists of non-unique indexes. Names are backend-specific.
    indexes: BTreeSet<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Column {
    normalized_type: &'static str,
    nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ForeignKey {
    from_column: String,
    to_table: String,
    to_column: String,
}

const MIGRATIONS_TABLE: &str = "__diesel_schema_migrations";

/// Introspect `SQLite` schema
pub fn introspect_sqlite(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    #[derive(QueryableByName)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        table: String,
        #[diesel(sql_type = Text)]
        from: String,
        #[diesel(sql_type = Text)]
        to: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        origin: String,
    }

    #[derive(QueryableByName)]
    struct IndexColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
    }

    let mut schema = Schema::default();

    let tables: Vec<TableName> = diesel::sql_query(format!(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' \
         AND name != '{MIGRATIONS_TABLE}' ORDER BY name"
    ))
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut table_info = Table::default();

        let columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get columns for table {}", table.name))?;

        for col in columns {
            if col.pk > 0 {
                table_info.primary_keys.insert(col.name.clone());
            }
            table_info.columns.insert(
                col.name,
                Column {
                    normalized_type: normalize_sqlite_type(&col.r#type),
                    nullable: col.notnull == 0 && col.pk == 0,
                },
            );
        }

        let fks: Vec<ForeignKeyInfo> =
            diesel::sql_query(format!("PRAGMA foreign_key_list({})", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get foreign keys for table {}", table.name))?;

        table_info.foreign_keys = fks
            .into_iter()
            .map(|fk| ForeignKey {
                from_column: fk.from,
                to_table: fk.table,
                to_column: fk.to,
            })
            .collect();

        let indexes: Vec<IndexInfo> =
            diesel::sql_query(format!("PRAGMA index_list({})", table.name))
                .load(conn)
                .wrap_err_with(|| format!("Failed to get indexes for table {}", table.name))?;

        for idx in indexes {
            // Primary key indexes are covered by `primary_keys`
            if idx.origin == "pk" {
                continue;
            }

            let index_columns: Vec<IndexColumnInfo> =
                diesel::sql_query(format!("PRAGMA index_info({})", idx.name))
                    .load(conn)
                    .wrap_err_with(|| format!("Failed to get index columns for {}", idx.name))?;
            let column_names: Vec<String> = index_columns.into_iter().map(|c| c.name).collect();

            if idx.origin == "u" {
                table_info.unique_constraints.insert(column_names);
            } else {
                table_info.indexes.insert(column_names);
            }
        }

        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

/// Introspect `MySQL` schema
pub fn introspect_mysql(conn: &mut MysqlConnection, db_name: &str) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        table_name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        data_type: String,
        #[diesel(sql_type = Text)]
        is_nullable: String,
        #[diesel(sql_type = Text)]
        column_key: String,
    }

    #[derive(QueryableByName)]
    #[allow(clippy::struct_field_names)]
    struct ForeignKeyInfo {
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Text)]
        referenced_table_name: String,
        #[diesel(sql_type = Text)]
        referenced_column_name: String,
    }

    #[derive(QueryableByName)]
    struct IndexInfo {
        #[diesel(sql_type = Text)]
        index_name: String,
        #[diesel(sql_type = Text)]
        column_name: String,
        #[diesel(sql_type = Integer)]
        non_unique: i32,
    }

    let mut schema = Schema::default();

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = ? AND table_name != ? ORDER BY table_name",
    )
    .bind::<Text, _>(db_name)
    .bind::<Text, _>(MIGRATIONS_TABLE)
    .load(conn)
    .wrap_err("Failed to query MySQL tables")?;

    for table in tables {
        let mut table_info = Table::default();

        let columns: Vec<ColumnInfo> = diesel::sql_query(
            "SELECT column_name, data_type, is_nullable, column_key FROM information_schema.columns \
             WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position",
        )
        .bind::<Text, _>(db_name)
        .bind::<Text, _>(&table.table_name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get columns for table {}", table.table_name))?;

        for col in columns {
            if col.column_key == "PRI" {
                table_info.primary_keys.insert(col.column_name.clone());
            }
            table_info.columns.insert(
                col.column_name,
                Column {
                    normalized_type: normalize_mysql_type(&col.data_type),
                    nullable: col.is_nullable == "YES",
                },
            );
        }

        let fks: Vec<ForeignKeyInfo> = diesel::sql_query(
            "SELECT column_name, referenced_table_name, referenced_column_name \
             FROM information_schema.key_column_usage \
             WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL \
             ORDER BY column_name",
        )
        .bind::<Text, _>(db_name)
        .bind::<Text, _>(&table.table_name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get foreign keys for table {}", table.table_name))?;

        table_info.foreign_keys = fks
            .into_iter()
            .map(|fk| ForeignKey {
                from_column: fk.column_name,
                to_table: fk.referenced_table_name,
                to_column: fk.referenced_column_name,
            })
            .collect();

        let indexes: Vec<IndexInfo> = diesel::sql_query(
            "SELECT index_name, column_name, non_unique FROM information_schema.statistics \
             WHERE table_schema = ? AND table_name = ? AND index_name != 'PRIMARY' \
             ORDER BY index_name, seq_in_index",
        )
        .bind::<Text, _>(db_name)
        .bind::<Text, _>(&table.table_name)
        .load(conn)
        .wrap_err_with(|| format!("Failed to get indexes for table {}", table.table_name))?;

        let mut unique_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut index_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for idx in indexes {
            let target = if idx.non_unique == 0 {
                &mut unique_map
            } else {
                &mut index_map
            };
            target.entry(idx.index_name).or_default().push(idx.column_name);
        }
        table_info.unique_constraints = unique_map.into_values().collect();
        table_info.indexes = index_map.into_values().collect();

        schema.tables.insert(table.table_name, table_info);
    }

    Ok(schema)
}

/// Normalize `SQLite` type to common representation
fn normalize_sqlite_type(sqlite_type: &str) -> &'static str {
    let normalized = sqlite_type.to_uppercase();
    if normalized.contains("INT") {
        "integer"
    } else if normalized.contains("REAL")
        || normalized.contains("FLOA")
        || normalized.contains("DOUB")
    {
        "real"
    } else if normalized.contains("BLOB") {
        "blob"
    } else {
        "text"
    }
}

/// Normalize `MySQL` type to common representation
#[allow(clippy::match_same_arms)]
fn normalize_mysql_type(mysql_type: &str) -> &'static str {
    match mysql_type.to_uppercase().as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => "integer",
        "DECIMAL" | "NUMERIC" | "FLOAT" | "DOUBLE" | "REAL" => "real",
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => "blob",
        _ => "text",
    }
}

/// Compare schemas and fail listing every mismatch.
///
/// `MySQL`/InnoDB creates an index for each foreign key column that has
/// none, so extra single-column `MySQL` indexes on foreign key columns are
/// accepted.
pub fn compare(sqlite: &Schema, mysql: &Schema) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for name in sqlite.tables.keys() {
        if !mysql.tables.contains_key(name) {
            errors.push(format!("Table '{name}' exists in SQLite but not in MySQL"));
        }
    }
    for name in mysql.tables.keys() {
        if !sqlite.tables.contains_key(name) {
            errors.push(format!("Table '{name}' exists in MySQL but not in SQLite"));
        }
    }

    for (name, sqlite_table) in &sqlite.tables {
        if let Some(mysql_table) = mysql.tables.get(name) {
            compare_table(name, sqlite_table, mysql_table, &mut errors);
        }
    }

    if errors.is_empty() {
        return Ok(());
    }

    Err(color_eyre::eyre::eyre!(
        "Schema parity check FAILED:\n  - {}",
        errors.join("\n  - ")
    ))
}

fn compare_table(name: &str, sqlite: &Table, mysql: &Table, errors: &mut Vec<String>) {
    for (column, sqlite_col) in &sqlite.columns {
        match mysql.columns.get(column) {
            None => errors.push(format!(
                "Column '{name}.{column}' exists in SQLite but not in MySQL"
            )),
            Some(mysql_col) if mysql_col != sqlite_col => errors.push(format!(
                "Column '{name}.{column}' differs: SQLite {sqlite_col:?}, MySQL {mysql_col:?}"
            )),
            Some(_) => {}
        }
    }
    for column in mysql.columns.keys() {
        if !sqlite.columns.contains_key(column) {
            errors.push(format!(
                "Column '{name}.{column}' exists in MySQL but not in SQLite"
            ));
        }
    }

    if sqlite.primary_keys != mysql.primary_keys {
        errors.push(format!(
            "Primary key mismatch in '{name}': SQLite {:?}, MySQL {:?}",
            sqlite.primary_keys, mysql.primary_keys
        ));
    }
    if sqlite.foreign_keys != mysql.foreign_keys {
        errors.push(format!(
            "Foreign key mismatch in '{name}': SQLite {:?}, MySQL {:?}",
            sqlite.foreign_keys, mysql.foreign_keys
        ));
    }
    if sqlite.unique_constraints != mysql.unique_constraints {
        errors.push(format!(
            "Unique constraint mismatch in '{name}': SQLite {:?}, MySQL {:?}",
            sqlite.unique_constraints, mysql.unique_constraints
        ));
    }

    for columns in sqlite.indexes.difference(&mysql.indexes) {
        errors.push(format!("Index on {columns:?} in '{name}' missing in MySQL"));
    }
    for columns in mysql.indexes.difference(&sqlite.indexes) {
        let is_fk_index = columns.len() == 1
            && mysql
                .foreign_keys
                .iter()
                .any(|fk| fk.from_column == columns[0]);
        if !is_fk_index {
            errors.push(format!("Unexpected MySQL index on {columns:?} in '{name}'"));
        }
    }
}
