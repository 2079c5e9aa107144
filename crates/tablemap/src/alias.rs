//! Per-statement table alias registry.
//!
//! Every mapped type referenced by a statement gets a short alias (`t0`, `t1`,
//! ...) on first registration. One entry may be flagged primary: the FROM or
//! target table of the statement.

use std::any::TypeId;

use crate::ident::quote;
use crate::log;
use crate::metadata::{TableMetadata, TableType};

/// A registered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    table_type: TableType,
    qualified_name: String,
    alias: String,
    is_primary: bool,
}

impl AliasEntry {
    pub fn table_type(&self) -> TableType {
        self.table_type
    }

    pub fn metadata(&self) -> &'static TableMetadata {
        self.table_type.metadata()
    }

    /// `[schema].[table]`
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// `t0`
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// `[schema].[table] [t0]`
    pub fn table_with_alias(&self) -> String {
        format!("{} {}", self.qualified_name, quote(&self.alias))
    }

    /// `t0.[Column]` for every mapped column, in metadata order.
    pub fn qualified_columns(&self) -> impl Iterator<Item = String> + '_ {
        self.metadata()
            .members
            .iter()
            .map(move |m| format!("{}.{}", self.alias, m.quoted()))
    }
}

/// Tracks the tables taking part in one statement.
#[derive(Debug, Clone)]
pub struct TableAliasRegistry {
    entries: Vec<AliasEntry>,
    default_schema: String,
}

impl Default for TableAliasRegistry {
    fn default() -> Self {
        Self::new("dbo")
    }
}

impl TableAliasRegistry {
    pub fn new(default_schema: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            default_schema: default_schema.into(),
        }
    }

    /// Register a table, or return the existing entry.
    ///
    /// Repeat calls for a registered type return the entry unchanged and
    /// ignore `is_primary`. A new primary entry clears the previous primary.
    pub fn add(&mut self, table_type: TableType, is_primary: bool) -> &AliasEntry {
        if let Some(idx) = self.position(table_type.id()) {
            return &self.entries[idx];
        }

        if is_primary {
            for entry in &mut self.entries {
                entry.is_primary = false;
            }
        }

        let alias = format!("t{}", self.entries.len());
        log::alias_assigned(table_type.type_name(), &alias, is_primary);
        self.entries.push(AliasEntry {
            table_type,
            qualified_name: table_type.metadata().qualified_name(&self.default_schema),
            alias,
            is_primary,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn get(&self, id: TypeId) -> Option<&AliasEntry> {
        self.entries.iter().find(|e| e.table_type.id() == id)
    }

    /// First registered entry mapped to the same table as `metadata`.
    pub fn find_by_table(&self, metadata: &TableMetadata) -> Option<&AliasEntry> {
        self.entries
            .iter()
            .find(|e| e.metadata().same_table(metadata))
    }

    /// Lookup by table name, bare (`Employee`) or qualified (`[dbo].[Employee]`).
    pub fn get_by_table_name(&self, name: &str) -> Option<&AliasEntry> {
        self.entries
            .iter()
            .find(|e| e.metadata().name == name || e.qualified_name == name)
    }

    pub fn primary(&self) -> Option<&AliasEntry> {
        self.entries.iter().find(|e| e.is_primary)
    }

    /// Alias if registered, falling back to the qualified table name.
    pub fn alias_or_qualified_name(&self, id: TypeId) -> Option<String> {
        self.get(id).map(|e| {
            if e.alias.is_empty() {
                e.qualified_name.clone()
            } else {
                e.alias.clone()
            }
        })
    }

    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: TypeId) -> Option<usize> {
        self.entries.iter().position(|e| e.table_type.id() == id)
    }
}
