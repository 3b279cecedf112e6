//! Безопасные обертки над программами и ядрами OpenCL

use super::bindings;
use super::context::{ClBuffer, ClContext};
use super::types::*;
use super::utils::to_c_string;
use crate::{cl_check, cl_create};
use anyhow::{anyhow, Result};
use std::ffi::c_void;
use std::ptr;

/// Скомпилированная программа OpenCL. Освобождается при Drop.
pub struct ClProgram {
    program: cl_program,
}

impl ClProgram {
    /// Компилирует программу из исходного кода.
    /// При ошибке компиляции возвращает лог сборки.
    pub fn build(ctx: &ClContext, source: &str) -> Result<Self> {
        let src_ptr = source.as_ptr() as *const i8;
        let src_len = source.len();
        let program = cl_create!(clCreateProgramWithSource(
            ctx.raw(),
            1,
            &src_ptr,
            &src_len,
        ))?;
        // Drop освободит программу, если сборка не удалась
        let program = Self { program };

        let device = ctx.device();
        let status = unsafe {
            bindings::clBuildProgram(
                program.program,
                1,
                &device,
                ptr::null(),
                None,
                ptr::null_mut(),
            )
        };
        if status != CL_SUCCESS {
            let log = program.build_log(ctx).unwrap_or_default();
            return Err(anyhow!(
                "OpenCL program build failed (error {}):\n{}",
                status,
                log
            ));
        }
        Ok(program)
    }

    /// Лог сборки программы для устройства контекста
    pub fn build_log(&self, ctx: &ClContext) -> Result<String> {
        let mut log_size: usize = 0;
        cl_check!(
            "clGetProgramBuildInfo",
            bindings::clGetProgramBuildInfo(
                self.program,
                ctx.device(),
                CL_PROGRAM_BUILD_LOG,
                0,
                ptr::null_mut(),
                &mut log_size
            )
        )?;
        let mut log = vec![0u8; log_size];
        cl_check!(
            "clGetProgramBuildInfo",
            bindings::clGetProgramBuildInfo(
                self.program,
                ctx.device(),
                CL_PROGRAM_BUILD_LOG,
                log_size,
                log.as_mut_ptr() as *mut c_void,
                ptr::null_mut()
            )
        )?;
        Ok(String::from_utf8_lossy(&log)
            .trim_end_matches('\0')
            .to_string())
    }

    /// Создает ядро по имени точки входа
    pub fn kernel(&self, name: &str) -> Result<ClKernel> {
        let c_name = to_c_string(name);
        let kernel = cl_create!(clCreateKernel(self.program, c_name.as_ptr()))?;
        Ok(ClKernel { kernel })
    }
}

impl Drop for ClProgram {
    fn drop(&mut self) {
        unsafe {
            bindings::clReleaseProgram(self.program);
        }
    }
}

/// Ядро OpenCL. Освобождается при Drop.
pub struct ClKernel {
    kernel: cl_kernel,
}

impl ClKernel {
    pub fn set_arg_buffer(&self, index: cl_uint, buffer: &ClBuffer) -> Result<()> {
        let mem = buffer.raw();
        cl_check!(
            "clSetKernelArg",
            bindings::clSetKernelArg(
                self.kernel,
                index,
                std::mem::size_of::<cl_mem>(),
                &mem as *const cl_mem as *const c_void
            )
        )
    }

    pub fn set_arg_i32(&self, index: cl_uint, value: i32) -> Result<()> {
        cl_check!(
            "clSetKernelArg",
            bindings::clSetKernelArg(
                self.kernel,
                index,
                std::mem::size_of::<i32>(),
                &value as *const i32 as *const c_void
            )
        )
    }

    pub fn set_arg_f64(&self, index: cl_uint, value: f64) -> Result<()> {
        cl_check!(
            "clSetKernelArg",
            bindings::clSetKernelArg(
                self.kernel,
                index,
                std::mem::size_of::<f64>(),
                &value as *const f64 as *const c_void
            )
        )
    }

    /// Ставит ядро в очередь с заданным глобальным размером работы
    pub fn enqueue(&self, ctx: &ClContext, global_work_size: &[usize]) -> Result<()> {
        cl_check!(
            "clEnqueueNDRangeKernel",
            bindings::clEnqueueNDRangeKernel(
                ctx.queue(),
                self.kernel,
                global_work_size.len() as cl_uint,
                ptr::null(),
                global_work_size.as_ptr(),
                ptr::null(),
                0,
                ptr::null(),
                ptr::null_mut()
            )
        )
    }
}

impl Drop for ClKernel {
    fn drop(&mut self) {
        unsafe {
            bindings::clReleaseKernel(self.kernel);
        }
    }
}
