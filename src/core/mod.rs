pub mod compiler;
pub mod js_index;
pub mod locator;
pub mod pipeline;
pub mod python_init;
pub mod stubs;

pub use crate::domain::model::{GeneratedModule, Invocation, ModuleSymbols, SchemaFile, Stage};
pub use crate::domain::ports::{CommandRunner, ToolLocator};
pub use crate::utils::error::Result;
