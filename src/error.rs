use thiserror::Error;

/// Conditions raised by the census queries themselves, as opposed to I/O
/// failures while loading, which travel as `anyhow::Error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CensusError {
    /// A place name and a population threshold were both supplied.
    #[error("Please use only one filter at a time")]
    SelectionConflict,

    /// The threshold is NaN or infinite.
    #[error("Please enter a finite population threshold")]
    InvalidThreshold,

    /// A figure needed for the requested year is null or absent.
    #[error("Null values for {year}")]
    NullValues { year: u16 },

    /// A column the query refers to is not in the table.
    #[error("column '{0}' not found")]
    MissingColumn(String),
}
