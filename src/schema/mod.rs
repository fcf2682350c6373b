//! Column-level schema model.
//!
//! A [`Schema`] is an ordered list of [`Column`]s. Column names are unique
//! within one schema; constructors that assemble schemas from several sources
//! keep the first occurrence of a name and drop later ones.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

mod column;

pub use column::*;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Vec<Column>);

impl Schema {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a schema from columns, keeping the first column for each name.
    pub fn from_columns(columns: impl IntoIterator<Item = Column>) -> Self {
        Self(
            columns
                .into_iter()
                .unique_by(|c| c.name.clone())
                .collect(),
        )
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn type_of(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(|c| c.column_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.name.as_str())
    }

    /// Appends `column` unless a column with the same name is already present.
    pub fn push_if_absent(&mut self, column: Column) {
        if !self.contains(&column.name) {
            self.0.push(column);
        }
    }

    /// Order-insensitive comparison by column name and type.
    pub fn same_columns(&self, other: &Schema) -> bool {
        self.len() == other.len()
            && self
                .0
                .iter()
                .all(|c| other.type_of(&c.name) == Some(c.column_type))
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.0
    }
}

impl Deref for Schema {
    type Target = [Column];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Column>> for Schema {
    fn from(columns: Vec<Column>) -> Self {
        Self::from_columns(columns)
    }
}

impl FromIterator<Column> for Schema {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        Self::from_columns(iter)
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().join(", "))
    }
}
