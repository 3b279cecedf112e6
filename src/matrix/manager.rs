//! Диспетчер матричных операций на устройстве OpenCL

use super::kernels::{self, KERNEL_ENTRY};
use super::types::{Device, Operation, SingleOperation};
use crate::opencl::types::{CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY};
use crate::opencl::{ClContext, ClProgram};
use anyhow::{bail, Context, Result};
use log::{debug, info};
use ndarray::Array2;
use std::collections::HashMap;

/// Владеет контекстом и очередью OpenCL выбранного устройства и
/// диспетчеризует операции в соответствующие ядра. Программы
/// компилируются при первом использовании и кэшируются по ключу
/// операции.
pub struct OperationManager {
    device: Device,
    ctx: ClContext,
    programs: HashMap<&'static str, ClProgram>,
}

impl OperationManager {
    /// Создает менеджер на первом устройстве заданного типа
    pub fn new(device: Device) -> Result<Self> {
        let ctx = ClContext::new(device.cl_device_type())
            .with_context(|| format!("Failed to initialize OpenCL {} device", device))?;
        if let Ok(name) = ctx.device_name() {
            info!("Using OpenCL {} device: {}", device, name);
        }
        Ok(Self {
            device,
            ctx,
            programs: HashMap::new(),
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Компилирует программу операции, если она еще не в кэше
    fn ensure_program(&mut self, key: &'static str, source: &str) -> Result<()> {
        if !self.programs.contains_key(key) {
            debug!("Building OpenCL program for '{}'", key);
            let program = ClProgram::build(&self.ctx, source)
                .with_context(|| format!("Failed to build kernel for '{}'", key))?;
            self.programs.insert(key, program);
        }
        Ok(())
    }

    /// Операция над двумя матрицами
    pub fn multi_vector_op(
        &mut self,
        op: Operation,
        lhs: &Array2<f64>,
        rhs: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        let (lheight, lwidth) = lhs.dim();
        let (rheight, rwidth) = rhs.dim();
        if lhs.is_empty() || rhs.is_empty() {
            bail!("Operation '{}' on an empty matrix", op);
        }
        match op {
            Operation::MatrixMultiply => {
                if lwidth != rheight {
                    bail!(
                        "matrix_multiply requires lhs columns == rhs rows, got {}x{} * {}x{}",
                        lheight,
                        lwidth,
                        rheight,
                        rwidth
                    );
                }
            }
            _ => {
                if (lheight, lwidth) != (rheight, rwidth) {
                    bail!(
                        "Element-wise '{}' requires equal shapes, got {}x{} and {}x{}",
                        op,
                        lheight,
                        lwidth,
                        rheight,
                        rwidth
                    );
                }
            }
        }

        self.ensure_program(op.key(), kernels::multi_kernel_source(op))?;
        let kernel = self.programs[op.key()].kernel(KERNEL_ENTRY)?;

        let lhs_host = lhs.as_standard_layout();
        let rhs_host = rhs.as_standard_layout();
        let lhs_slice = lhs_host.as_slice().context("lhs is not contiguous")?;
        let rhs_slice = rhs_host.as_slice().context("rhs is not contiguous")?;

        let lhs_buffer = self.ctx.buffer_from(CL_MEM_READ_ONLY, lhs_slice)?;
        let rhs_buffer = self.ctx.buffer_from(CL_MEM_READ_ONLY, rhs_slice)?;

        let (out_height, out_width) = match op {
            Operation::MatrixMultiply => (lheight, rwidth),
            _ => (lheight, lwidth),
        };
        let out_buffer = self.ctx.buffer(CL_MEM_WRITE_ONLY, out_height * out_width)?;

        kernel.set_arg_buffer(0, &lhs_buffer)?;
        kernel.set_arg_buffer(1, &rhs_buffer)?;
        kernel.set_arg_buffer(2, &out_buffer)?;
        match op {
            Operation::MatrixMultiply => {
                kernel.set_arg_i32(3, lheight as i32)?;
                kernel.set_arg_i32(4, lwidth as i32)?;
                kernel.set_arg_i32(5, rwidth as i32)?;
            }
            _ => {
                kernel.set_arg_i32(3, lheight as i32)?;
                kernel.set_arg_i32(4, lwidth as i32)?;
            }
        }
        kernel.enqueue(&self.ctx, &[out_height, out_width])?;

        let mut result = vec![0.0f64; out_height * out_width];
        self.ctx.read_buffer(&out_buffer, &mut result)?;
        Ok(Array2::from_shape_vec((out_height, out_width), result)?)
    }

    /// Операция над одной матрицей. Скалярные операции (след, норма,
    /// определитель) возвращают матрицу 1x1.
    pub fn single_vector_op(
        &mut self,
        op: SingleOperation,
        data: &Array2<f64>,
    ) -> Result<Array2<f64>> {
        let (height, width) = data.dim();
        if data.is_empty() {
            bail!("Operation '{}' on an empty matrix", op);
        }
        let host = data.as_standard_layout();
        let slice = host.as_slice().context("matrix is not contiguous")?;

        match op {
            SingleOperation::Transpose => self.transpose(slice, height, width),
            SingleOperation::FrobeniusNorm => self.frobenius_norm(slice),
            SingleOperation::Trace => {
                require_square(op, height, width)?;
                self.trace(slice, height)
            }
            SingleOperation::Determinant => {
                require_square(op, height, width)?;
                self.determinant(slice, height)
            }
            SingleOperation::Inverse => {
                require_square(op, height, width)?;
                self.inverse(slice, height)
            }
        }
    }

    fn transpose(&mut self, data: &[f64], height: usize, width: usize) -> Result<Array2<f64>> {
        let op = SingleOperation::Transpose;
        self.ensure_program(op.key(), kernels::single_kernel_source(op))?;
        let kernel = self.programs[op.key()].kernel(KERNEL_ENTRY)?;

        let in_buffer = self.ctx.buffer_from(CL_MEM_READ_ONLY, data)?;
        let out_buffer = self.ctx.buffer(CL_MEM_WRITE_ONLY, data.len())?;

        kernel.set_arg_buffer(0, &in_buffer)?;
        kernel.set_arg_buffer(1, &out_buffer)?;
        kernel.set_arg_i32(2, height as i32)?;
        kernel.set_arg_i32(3, width as i32)?;
        kernel.enqueue(&self.ctx, &[height, width])?;

        let mut result = vec![0.0f64; data.len()];
        self.ctx.read_buffer(&out_buffer, &mut result)?;
        Ok(Array2::from_shape_vec((width, height), result)?)
    }

    fn trace(&mut self, data: &[f64], size: usize) -> Result<Array2<f64>> {
        let op = SingleOperation::Trace;
        self.ensure_program(op.key(), kernels::single_kernel_source(op))?;
        let kernel = self.programs[op.key()].kernel(KERNEL_ENTRY)?;

        let in_buffer = self.ctx.buffer_from(CL_MEM_READ_ONLY, data)?;
        let out_buffer = self.ctx.buffer(CL_MEM_WRITE_ONLY, size)?;

        kernel.set_arg_buffer(0, &in_buffer)?;
        kernel.set_arg_buffer(1, &out_buffer)?;
        kernel.set_arg_i32(2, size as i32)?;
        kernel.enqueue(&self.ctx, &[size])?;

        let mut diagonal = vec![0.0f64; size];
        self.ctx.read_buffer(&out_buffer, &mut diagonal)?;
        Ok(scalar(diagonal.iter().sum()))
    }

    fn frobenius_norm(&mut self, data: &[f64]) -> Result<Array2<f64>> {
        let op = SingleOperation::FrobeniusNorm;
        self.ensure_program(op.key(), kernels::single_kernel_source(op))?;
        let kernel = self.programs[op.key()].kernel(KERNEL_ENTRY)?;

        let in_buffer = self.ctx.buffer_from(CL_MEM_READ_ONLY, data)?;
        let out_buffer = self.ctx.buffer(CL_MEM_WRITE_ONLY, data.len())?;

        kernel.set_arg_buffer(0, &in_buffer)?;
        kernel.set_arg_buffer(1, &out_buffer)?;
        kernel.set_arg_i32(2, data.len() as i32)?;
        kernel.enqueue(&self.ctx, &[data.len()])?;

        let mut squares = vec![0.0f64; data.len()];
        self.ctx.read_buffer(&out_buffer, &mut squares)?;
        Ok(scalar(squares.iter().sum::<f64>().sqrt()))
    }

    /// Определитель через исключение Гаусса: по одному запуску ядра на
    /// опорный столбец, выбор опорного элемента на хосте. Перестановка
    /// строк выполняется ядром swap_rows со сменой знака результата.
    fn determinant(&mut self, data: &[f64], size: usize) -> Result<Array2<f64>> {
        let op = SingleOperation::Determinant;
        self.ensure_program(op.key(), kernels::single_kernel_source(op))?;
        let program = &self.programs[op.key()];
        let eliminate = program.kernel(KERNEL_ENTRY)?;
        let swap = program.kernel("swap_rows")?;

        let buffer = self.ctx.buffer_from(CL_MEM_READ_WRITE, data)?;
        let mut host = vec![0.0f64; data.len()];
        let mut sign = 1.0f64;

        for k in 0..size {
            // Блокирующее чтение гарантирует завершение предыдущего шага
            self.ctx.read_buffer(&buffer, &mut host)?;

            let mut pivot_row = k;
            for row in k + 1..size {
                if host[row * size + k].abs() > host[pivot_row * size + k].abs() {
                    pivot_row = row;
                }
            }
            if host[pivot_row * size + k] == 0.0 {
                return Ok(scalar(0.0));
            }
            if pivot_row != k {
                swap.set_arg_buffer(0, &buffer)?;
                swap.set_arg_i32(1, size as i32)?;
                swap.set_arg_i32(2, k as i32)?;
                swap.set_arg_i32(3, pivot_row as i32)?;
                swap.enqueue(&self.ctx, &[size])?;
                sign = -sign;
            }

            eliminate.set_arg_buffer(0, &buffer)?;
            eliminate.set_arg_i32(1, size as i32)?;
            eliminate.set_arg_i32(2, k as i32)?;
            eliminate.enqueue(&self.ctx, &[size])?;
        }

        self.ctx.read_buffer(&buffer, &mut host)?;
        let mut det = sign;
        for i in 0..size {
            det *= host[i * size + i];
        }
        Ok(scalar(det))
    }

    /// Обращение методом Гаусса-Жордана над расширенной матрицей
    /// [A | I] на устройстве: нормализация опорной строки и исключение
    /// столбца отдельными запусками ядер на каждый шаг.
    fn inverse(&mut self, data: &[f64], size: usize) -> Result<Array2<f64>> {
        let op = SingleOperation::Inverse;
        self.ensure_program(op.key(), kernels::single_kernel_source(op))?;
        let program = &self.programs[op.key()];
        let eliminate = program.kernel(KERNEL_ENTRY)?;
        let normalize = program.kernel("normalize_row")?;
        let swap = program.kernel("swap_rows")?;

        let width = 2 * size;
        let mut aug = vec![0.0f64; size * width];
        for i in 0..size {
            for j in 0..size {
                aug[i * width + j] = data[i * size + j];
            }
            aug[i * width + size + i] = 1.0;
        }

        let buffer = self.ctx.buffer_from(CL_MEM_READ_WRITE, &aug)?;
        let mut host = vec![0.0f64; aug.len()];

        for k in 0..size {
            self.ctx.read_buffer(&buffer, &mut host)?;

            let mut pivot_row = k;
            for row in k + 1..size {
                if host[row * width + k].abs() > host[pivot_row * width + k].abs() {
                    pivot_row = row;
                }
            }
            let pivot_value = host[pivot_row * width + k];
            if pivot_value.abs() < f64::EPSILON {
                bail!("Matrix is singular, inverse does not exist");
            }
            if pivot_row != k {
                swap.set_arg_buffer(0, &buffer)?;
                swap.set_arg_i32(1, width as i32)?;
                swap.set_arg_i32(2, k as i32)?;
                swap.set_arg_i32(3, pivot_row as i32)?;
                swap.enqueue(&self.ctx, &[width])?;
            }

            normalize.set_arg_buffer(0, &buffer)?;
            normalize.set_arg_i32(1, size as i32)?;
            normalize.set_arg_i32(2, k as i32)?;
            normalize.set_arg_f64(3, pivot_value)?;
            normalize.enqueue(&self.ctx, &[width])?;

            eliminate.set_arg_buffer(0, &buffer)?;
            eliminate.set_arg_i32(1, size as i32)?;
            eliminate.set_arg_i32(2, k as i32)?;
            eliminate.enqueue(&self.ctx, &[size])?;
        }

        self.ctx.read_buffer(&buffer, &mut host)?;
        let mut inv = vec![0.0f64; size * size];
        for i in 0..size {
            for j in 0..size {
                inv[i * size + j] = host[i * width + size + j];
            }
        }
        Ok(Array2::from_shape_vec((size, size), inv)?)
    }
}

fn require_square(op: SingleOperation, height: usize, width: usize) -> Result<()> {
    if height != width {
        bail!("'{}' requires a square matrix, got {}x{}", op, height, width);
    }
    Ok(())
}

fn scalar(value: f64) -> Array2<f64> {
    Array2::from_elem((1, 1), value)
}
