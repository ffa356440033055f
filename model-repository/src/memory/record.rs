//! Stored rows

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::ID_COLUMN;
use crate::repository::Attributes;

/// One row of an in-memory table, with any eager-loaded relations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key
    pub id: i64,
    /// Column values, excluding `id`
    pub attributes: Attributes,
    /// Eager-loaded relations by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Vec<Record>>,
}

impl Record {
    /// A record with no relations loaded
    pub fn new(id: i64, attributes: Attributes) -> Self {
        Self {
            id,
            attributes,
            relations: BTreeMap::new(),
        }
    }

    /// Raw value of a column other than `id`
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.attributes.get(column)
    }

    /// String value of a column, if it holds one
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Value of any column, `id` included
    pub(crate) fn column(&self, column: &str) -> Option<Cow<'_, Value>> {
        if column == ID_COLUMN {
            return Some(Cow::Owned(Value::from(self.id)));
        }
        self.attributes.get(column).map(Cow::Borrowed)
    }

    /// Text of a localized column in one locale
    pub fn translation(&self, column: &str, locale: &str) -> Option<&str> {
        self.get(column)?.get(locale)?.as_str()
    }

    /// Records loaded for a relation
    pub fn related(&self, relation: &str) -> Option<&[Record]> {
        self.relations.get(relation).map(Vec::as_slice)
    }

    /// The single record loaded for a `belongs_to` relation
    pub fn related_one(&self, relation: &str) -> Option<&Record> {
        self.related(relation)?.first()
    }
}
