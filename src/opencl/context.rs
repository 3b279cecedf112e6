//! Безопасная обертка над контекстом и очередью команд OpenCL

use super::bindings::{self, ContextNotify};
use super::types::*;
use crate::{cl_check, cl_create};
use anyhow::{bail, Result};
use std::ffi::c_void;
use std::ptr;

/// Буфер в памяти устройства. Освобождается при Drop.
pub struct ClBuffer {
    mem: cl_mem,
    len: usize,
}

impl ClBuffer {
    pub fn raw(&self) -> cl_mem {
        self.mem
    }

    /// Количество элементов f64 в буфере
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for ClBuffer {
    fn drop(&mut self) {
        unsafe {
            bindings::clReleaseMemObject(self.mem);
        }
    }
}

/// Владеет платформой, устройством, контекстом и очередью команд.
/// Очередь и контекст освобождаются при Drop.
pub struct ClContext {
    platform: cl_platform_id,
    device: cl_device_id,
    context: cl_context,
    queue: cl_command_queue,
}

impl ClContext {
    /// Создает контекст и очередь на первом устройстве заданного типа
    pub fn new(device_type: cl_device_type) -> Result<Self> {
        let mut platform: cl_platform_id = ptr::null_mut();
        let mut num_platforms: cl_uint = 0;
        cl_check!(
            "clGetPlatformIDs",
            bindings::clGetPlatformIDs(1, &mut platform, &mut num_platforms)
        )?;
        if num_platforms == 0 {
            bail!("No OpenCL platform available");
        }

        let mut device: cl_device_id = ptr::null_mut();
        let mut num_devices: cl_uint = 0;
        cl_check!(
            "clGetDeviceIDs",
            bindings::clGetDeviceIDs(platform, device_type, 1, &mut device, &mut num_devices)
        )?;
        if num_devices == 0 || device.is_null() {
            bail!("No OpenCL device of the requested type");
        }

        let context = cl_create!(clCreateContext(
            ptr::null(),
            1,
            &device,
            None::<ContextNotify>,
            ptr::null_mut(),
        ))?;

        let queue = match cl_create!(clCreateCommandQueue(context, device, 0)) {
            Ok(queue) => queue,
            Err(e) => {
                unsafe {
                    bindings::clReleaseContext(context);
                }
                return Err(e);
            }
        };

        Ok(Self {
            platform,
            device,
            context,
            queue,
        })
    }

    pub fn device(&self) -> cl_device_id {
        self.device
    }

    pub fn platform(&self) -> cl_platform_id {
        self.platform
    }

    pub fn raw(&self) -> cl_context {
        self.context
    }

    pub fn queue(&self) -> cl_command_queue {
        self.queue
    }

    /// Имя устройства (CL_DEVICE_NAME)
    pub fn device_name(&self) -> Result<String> {
        let mut size: usize = 0;
        cl_check!(
            "clGetDeviceInfo",
            bindings::clGetDeviceInfo(self.device, CL_DEVICE_NAME, 0, ptr::null_mut(), &mut size)
        )?;
        let mut name = vec![0u8; size];
        cl_check!(
            "clGetDeviceInfo",
            bindings::clGetDeviceInfo(
                self.device,
                CL_DEVICE_NAME,
                size,
                name.as_mut_ptr() as *mut c_void,
                ptr::null_mut()
            )
        )?;
        Ok(String::from_utf8_lossy(&name)
            .trim_end_matches('\0')
            .to_string())
    }

    /// Буфер, инициализированный копией данных хоста
    pub fn buffer_from(&self, flags: cl_mem_flags, data: &[f64]) -> Result<ClBuffer> {
        let mem = cl_create!(clCreateBuffer(
            self.context,
            flags | CL_MEM_COPY_HOST_PTR,
            data.len() * std::mem::size_of::<f64>(),
            data.as_ptr() as *mut c_void,
        ))?;
        Ok(ClBuffer {
            mem,
            len: data.len(),
        })
    }

    /// Неинициализированный буфер на len элементов f64
    pub fn buffer(&self, flags: cl_mem_flags, len: usize) -> Result<ClBuffer> {
        let mem = cl_create!(clCreateBuffer(
            self.context,
            flags,
            len * std::mem::size_of::<f64>(),
            ptr::null_mut(),
        ))?;
        Ok(ClBuffer { mem, len })
    }

    /// Блокирующее чтение буфера в срез хоста
    pub fn read_buffer(&self, buffer: &ClBuffer, out: &mut [f64]) -> Result<()> {
        if out.len() > buffer.len() {
            bail!(
                "Read of {} elements exceeds buffer of {}",
                out.len(),
                buffer.len()
            );
        }
        cl_check!(
            "clEnqueueReadBuffer",
            bindings::clEnqueueReadBuffer(
                self.queue,
                buffer.raw(),
                CL_TRUE,
                0,
                out.len() * std::mem::size_of::<f64>(),
                out.as_mut_ptr() as *mut c_void,
                0,
                ptr::null(),
                ptr::null_mut()
            )
        )
    }

    /// Ожидает завершения всех команд в очереди
    pub fn finish(&self) -> Result<()> {
        cl_check!("clFinish", bindings::clFinish(self.queue))
    }
}

impl Drop for ClContext {
    fn drop(&mut self) {
        unsafe {
            bindings::clReleaseCommandQueue(self.queue);
            bindings::clReleaseContext(self.context);
        }
    }
}
