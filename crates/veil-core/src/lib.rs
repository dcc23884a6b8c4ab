mod copy;
pub mod driver;
mod error;
pub mod jsonpath;
mod model;
mod record;
mod value;

pub use crate::copy::{decode_copy_row, encode_copy_row};
pub use crate::driver::{canonical_type_name, parse_timestamp, TableDriver, TextDriver};
pub use crate::error::CoreError;
pub use crate::model::{Column, ColumnRawValue, Table};
pub use crate::record::{Record, Recorder};
pub use crate::value::{Value, NULL_MARKER};
