//! Shared pieces of the TPC-H generate-and-load coordinator: parameter
//! validation, host list parsing, split partitioning, the storage client and
//! the files staged for each host job.
use std::fmt;

pub mod config;
pub mod error;
pub mod hosts;
pub mod launcher;
pub mod params;
pub mod partition;
pub mod properties;
pub mod storage;

pub use error::{Error, Result};

/// The eight TPC-H tables. Each one gets its own directory under the remote
/// target directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    LineItem,
    Orders,
    Customer,
    PartSupp,
    Part,
    Supplier,
    Nation,
    Region,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::LineItem,
        Table::Orders,
        Table::Customer,
        Table::PartSupp,
        Table::Part,
        Table::Supplier,
        Table::Nation,
        Table::Region,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::LineItem => "lineitem",
            Table::Orders => "orders",
            Table::Customer => "customer",
            Table::PartSupp => "partsupp",
            Table::Part => "part",
            Table::Supplier => "supplier",
            Table::Nation => "nation",
            Table::Region => "region",
        }
    }

    /// Glob matching every generated split of this table, e.g. `orders.tbl*`.
    pub fn file_pattern(&self) -> String {
        format!("{}.tbl*", self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive range of file splits a single host generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitAssignment {
    pub first_split: u32,
    pub last_split: u32,
}

impl fmt::Display for SplitAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.first_split, self.last_split)
    }
}

/// Quotes `s` as a single shell word. Everything inside single quotes is
/// literal, so only embedded single quotes need escaping.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Joins a child onto a remote (slash separated) storage path.
pub fn remote_join(parent: &str, child: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), child)
}
