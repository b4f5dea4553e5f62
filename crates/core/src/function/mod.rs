//! Function values, the name table and identity resolution

mod resolve;
mod table;
mod value;

pub use resolve::{resolve, ResolvedFunction, Target};
pub use table::FunctionTable;
pub use value::Function;
