//! Модуль для работы с OpenCL
//!
//! Содержит низкоуровневые привязки и безопасные обертки для OpenCL

pub mod bindings;
pub mod context;
pub mod kernel;
pub mod types;
pub mod utils;

pub use context::{ClBuffer, ClContext};
pub use kernel::{ClKernel, ClProgram};
