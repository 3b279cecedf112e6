//! Модуль для работы с матрицами
//!
//! Предоставляет:
//! - Словари операций и устройств
//! - Диспетчер операций на устройстве OpenCL
//! - CPU-реализации для верификации

pub mod kernels;
mod manager;
pub mod operations;
mod types;

pub use kernels::KERNEL_ENTRY;
pub use manager::OperationManager;
pub use operations::{compare_results, initialize_matrices};
pub use types::{Device, MatrixType, Operation, SingleOperation};
pub use types::{DEVICES, OPERATIONS, SINGLE_OPERATIONS};
