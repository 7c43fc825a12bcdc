//! The query object model.
//!
//! Queries are trees of closed sum types: [`Field`] for value expressions,
//! [`Condition`] for predicates, [`Table`] for FROM clause entries and
//! [`Select`] for queries. Nodes own their children, are immutable once built
//! and compare structurally. Rewrites build new trees through the typed
//! reconstruction functions (`with_args`, `with_value`, `transform`).
//!
//! Each node renders itself through [`QueryPart`](crate::render::QueryPart),
//! consulting [`emulation`](crate::emulation) where the dialect lacks a
//! construct.

mod condition;
mod field;
mod functions;
mod json;
mod raw;
mod select;
mod table;
mod types;

pub use condition::{Combinator, ComparisonOp, Condition, XmlExists, XmlPassingMechanism};
pub use field::{col, inline, qualified, val, ArithmeticOp, ColumnRef, Field, Literal};
pub use functions::{
    bit_and_agg, bit_nand_agg, bit_nor_agg, bit_or_agg, coalesce, count, count_star, function,
    greatest, least, max, min, sum, Aggregate, AggregateKind, Case, Coalesce, FunctionCall,
    Greatest, Least, WindowSpec,
};
pub use json::{JsonArray, JsonEntry, JsonObject, JsonOnEmpty, JsonOnNull, JsonValue};
pub use raw::RawSql;
pub use select::{CommonTableExpression, NullOrdering, Select, SortField, SortOrder, With};
pub use table::{IndexHint, IndexHintKind, JoinCondition, JoinType, Table};
pub use types::DataType;
