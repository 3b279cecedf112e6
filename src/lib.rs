//! OpenCL-ускоренные матричные операции
//!
//! Библиотека предоставляет `OperationManager` — диспетчер матричных
//! операций на устройстве OpenCL (CPU или GPU), словари операций
//! и CPU-реализации для верификации результатов.

pub mod matrix;
pub mod opencl;
pub mod utils;

// Реэкспортируем макросы на уровень крейта
#[macro_use]
mod macros {
    /// Макрос для обработки ошибок OpenCL (коды возврата)
    #[macro_export]
    macro_rules! cl_check {
        ($what:literal, $expr:expr) => {{
            let code = unsafe { $expr };
            if code != $crate::opencl::types::CL_SUCCESS {
                Err(anyhow::anyhow!(
                    "{}: OpenCL error {} ({})",
                    $what,
                    code,
                    $crate::opencl::utils::cl_error_name(code)
                ))
            } else {
                Ok(()) as anyhow::Result<()>
            }
        }};
    }

    /// Макрос для вызовов OpenCL, возвращающих объект через errcode_ret
    #[macro_export]
    macro_rules! cl_create {
        ($func:ident($($arg:expr),* $(,)?)) => {{
            let mut err: $crate::opencl::types::cl_int = 0;
            let obj = unsafe { $crate::opencl::bindings::$func($($arg),*, &mut err) };
            if obj.is_null() || err != $crate::opencl::types::CL_SUCCESS {
                Err(anyhow::anyhow!(
                    "Failed to create OpenCL object: {} (error {})",
                    stringify!($func),
                    err
                ))
            } else {
                Ok(obj) as anyhow::Result<_>
            }
        }};
    }
}

// Реэкспорт основных типов для удобства
pub use matrix::{Device, MatrixType, Operation, SingleOperation};
pub use matrix::{DEVICES, OPERATIONS, SINGLE_OPERATIONS};
pub use matrix::OperationManager;
