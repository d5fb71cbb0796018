//! Dataset Schema
//! Declared core columns and the fill rule for every other column.

use polars::prelude::*;

pub const CONTINENT: &str = "continent";
pub const LOCATION: &str = "location";
pub const DATE: &str = "date";
pub const TOTAL_CASES: &str = "total_cases";
pub const NEW_CASES: &str = "new_cases";
pub const NEW_DEATHS: &str = "new_deaths";

/// Placeholder for missing text values.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Date,
}

impl ColumnKind {
    /// Storage type a core column is coerced to. Dates are parsed, not cast.
    pub fn dtype(self) -> Option<DataType> {
        match self {
            ColumnKind::Text => Some(DataType::String),
            ColumnKind::Numeric => Some(DataType::Float64),
            ColumnKind::Date => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    /// Cleaning fails when the column is absent.
    pub required: bool,
    /// Negative values are floored to zero.
    pub clip_negative: bool,
}

impl ColumnSpec {
    const fn new(name: &'static str, kind: ColumnKind, required: bool, clip_negative: bool) -> Self {
        Self {
            name,
            kind,
            required,
            clip_negative,
        }
    }
}

pub const CORE_COLUMNS: [ColumnSpec; 6] = [
    ColumnSpec::new(CONTINENT, ColumnKind::Text, true, false),
    ColumnSpec::new(LOCATION, ColumnKind::Text, true, false),
    ColumnSpec::new(DATE, ColumnKind::Date, true, false),
    ColumnSpec::new(TOTAL_CASES, ColumnKind::Numeric, false, true),
    ColumnSpec::new(NEW_CASES, ColumnKind::Numeric, false, true),
    ColumnSpec::new(NEW_DEATHS, ColumnKind::Numeric, false, false),
];

/// Look up a declared core column.
pub fn core_spec(name: &str) -> Option<&'static ColumnSpec> {
    CORE_COLUMNS.iter().find(|spec| spec.name == name)
}

/// Pass-through columns with no value on any row.
///
/// The CSV reader types such columns as text; they are treated as numeric so
/// their gaps are filled with 0.
pub fn untyped_columns(df: &DataFrame) -> Vec<String> {
    df.get_columns()
        .iter()
        .filter(|column| core_spec(column.name().as_str()).is_none())
        .filter(|column| matches!(column.dtype(), DataType::String | DataType::Null))
        .filter(|column| column.null_count() == column.len())
        .map(|column| column.name().to_string())
        .collect()
}

/// Value written into missing cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    Zero,
    Unknown,
}

impl FillRule {
    /// Rule for a column. `None` leaves the column untouched.
    ///
    /// Numbers take 0 and text takes "Unknown". Any other non-temporal column
    /// (booleans, nested types) holding missing values is turned into text so
    /// the gaps can read "Unknown".
    pub fn for_column(column: &Column) -> Option<FillRule> {
        match column.dtype() {
            DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Some(FillRule::Zero),
            DataType::String | DataType::Categorical(..) | DataType::Enum(..) => {
                Some(FillRule::Unknown)
            }
            DataType::Date | DataType::Datetime(..) | DataType::Duration(..) | DataType::Time => {
                None
            }
            _ if column.null_count() > 0 => Some(FillRule::Unknown),
            _ => None,
        }
    }

    pub fn expr(self, column: &str) -> Expr {
        match self {
            FillRule::Zero => col(column).fill_null(lit(0)),
            FillRule::Unknown => col(column)
                .cast(DataType::String)
                .fill_null(lit(UNKNOWN)),
        }
    }
}

/// Fill rule per column, in frame order.
#[derive(Debug, Clone, Default)]
pub struct FillPlan {
    pub entries: Vec<(String, FillRule)>,
}

impl FillPlan {
    /// Build the plan for a frame whose core columns are already coerced.
    /// The date column is never filled: unparsable dates are dropped instead.
    pub fn for_frame(df: &DataFrame) -> Self {
        let entries = df
            .get_columns()
            .iter()
            .filter(|column| column.name().as_str() != DATE)
            .filter_map(|column| {
                FillRule::for_column(column).map(|rule| (column.name().to_string(), rule))
            })
            .collect();
        Self { entries }
    }

    #[cfg(test)]
    pub fn rule_for(&self, column: &str) -> Option<FillRule> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, rule)| *rule)
    }

    pub fn exprs(&self) -> Vec<Expr> {
        self.entries
            .iter()
            .map(|(name, rule)| rule.expr(name))
            .collect()
    }
}
