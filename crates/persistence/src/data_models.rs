// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::prelude::*;
use diesel::sql_types::BigInt;
use prefstore_domain::Preference;

use crate::diesel_schema::preferences;

/// Diesel Queryable struct for preference rows.
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = preferences)]
pub struct PreferenceRow {
    pub user_id: String,
    pub category: String,
    pub name: String,
    pub value: String,
}

impl From<PreferenceRow> for Preference {
    fn from(row: PreferenceRow) -> Self {
        Self {
            user_id: row.user_id,
            category: row.category,
            name: row.name,
            value: row.value,
        }
    }
}

/// Diesel Insertable struct borrowing a preference for a single insert.
#[derive(Debug, Insertable)]
#[diesel(table_name = preferences)]
pub struct NewPreference<'a> {
    pub user_id: &'a str,
    pub category: &'a str,
    pub name: &'a str,
    pub value: &'a str,
}

impl<'a> From<&'a Preference> for NewPreference<'a> {
    fn from(preference: &'a Preference) -> Self {
        Self {
            user_id: &preference.user_id,
            category: &preference.category,
            name: &preference.name,
            value: &preference.value,
        }
    }
}

/// Result type for raw `COUNT(*)` queries.
#[derive(QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}
