//! Table definitions for the in-memory store

use crate::repository::Translatable;

/// How a relation links two tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// Rows of the related table whose foreign key equals this row's id
    HasMany,
    /// The row of the related table whose id equals this row's foreign key
    BelongsTo,
}

/// A named relation that can be eager loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    /// Name used with `with(..)`
    pub name: String,
    /// Link direction
    pub kind: RelationKind,
    /// Related table
    pub table: String,
    /// Foreign key column (on the related table for `HasMany`, on this table for `BelongsTo`)
    pub foreign_key: String,
}

/// Columns, localized attributes and relations of one table
///
/// Every table has an integer `id` column.
///
/// ```rust
/// use model_repository::memory::TableSchema;
///
/// let posts = TableSchema::new("posts")
///     .columns(["slug", "user_id", "published"])
///     .translated(["title"])
///     .belongs_to("author", "users", "user_id")
///     .timestamps();
///
/// assert!(posts.has_column("title"));
/// assert!(posts.has_column("created_at"));
/// assert!(posts.relation("author").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<String>,
    translated: Vec<String>,
    relations: Vec<Relation>,
    timestamps: bool,
}

/// Primary key column present on every table
pub const ID_COLUMN: &str = "id";
pub(crate) const CREATED_AT: &str = "created_at";
pub(crate) const UPDATED_AT: &str = "updated_at";

impl TableSchema {
    /// A table with only an `id` column
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![ID_COLUMN.to_string()],
            translated: Vec::new(),
            relations: Vec::new(),
            timestamps: false,
        }
    }

    /// Add plain columns
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            self.add_column(column.into());
        }
        self
    }

    /// Add columns whose value is stored per locale as `{"<locale>": "<text>"}`
    #[must_use]
    pub fn translated<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            self.add_column(column.clone());
            if !self.translated.contains(&column) {
                self.translated.push(column);
            }
        }
        self
    }

    /// Declare a one-to-many relation to `table` through its `foreign_key`
    #[must_use]
    pub fn has_many(
        self,
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relation_of(RelationKind::HasMany, name.into(), table.into(), foreign_key.into())
    }

    /// Declare an inverse relation to `table` through this table's `foreign_key`
    #[must_use]
    pub fn belongs_to(
        self,
        name: impl Into<String>,
        table: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let foreign_key = foreign_key.into();
        self.columns([foreign_key.clone()])
            .relation_of(RelationKind::BelongsTo, name.into(), table.into(), foreign_key)
    }

    /// Maintain `created_at` and `updated_at` on writes
    #[must_use]
    pub fn timestamps(mut self) -> Self {
        self.timestamps = true;
        self.columns([CREATED_AT, UPDATED_AT])
    }

    fn relation_of(mut self, kind: RelationKind, name: String, table: String, foreign_key: String) -> Self {
        self.relations.retain(|existing| existing.name != name);
        self.relations.push(Relation {
            name,
            kind,
            table,
            foreign_key,
        });
        self
    }

    fn add_column(&mut self, column: String) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    /// Table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All columns, `id` first
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Whether the table has `column`
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }

    /// Look up a relation by name
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    /// Whether writes maintain timestamp columns
    pub fn uses_timestamps(&self) -> bool {
        self.timestamps
    }

    /// Whether any column is stored per locale
    pub fn is_translatable(&self) -> bool {
        !self.translated.is_empty()
    }
}

impl Translatable for TableSchema {
    fn translated_attributes(&self) -> &[String] {
        &self.translated
    }
}
