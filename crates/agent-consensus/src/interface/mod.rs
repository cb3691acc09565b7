//! Output formatting for recommendations

pub mod formatter;

pub use formatter::{
    FormatterFactory, JsonFormatter, OutputFormat, ReportFormatter, TableFormatter, TextFormatter,
};
