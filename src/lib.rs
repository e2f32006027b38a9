//! Pydantic schema trees → Go structs with `validate` tags, check stubs and
//! table-style tests seeded from mined fixtures.
pub mod cli;
pub mod codegen;
pub mod error;
pub mod extract;
pub mod fixtures;
pub mod ir;
pub mod jq_exec;
pub mod naming;
pub mod node;
pub mod path_de;
pub mod registry;
pub mod session;

pub use codegen::{GeneratedFile, generate};
pub use error::{ConvertError, Result};
pub use session::{Options, Session};
