//! Пример использования библиотеки

use anyhow::{Context, Result};
use blitzmat::matrix::operations::{
    cpu_determinant, cpu_frobenius_norm, cpu_inverse, cpu_matrix_multiply, cpu_trace,
    cpu_transpose,
};
use blitzmat::matrix::{compare_results, initialize_matrices};
use blitzmat::utils::measure_time;
use blitzmat::{Device, MatrixType, Operation, OperationManager, SingleOperation};
use ndarray::Array2;

const MATRIX_SIZE: usize = 256;

fn main() -> Result<()> {
    env_logger::init();

    println!("Демонстрация матричных операций на OpenCL");
    println!("Размер матриц: {}x{}", MATRIX_SIZE, MATRIX_SIZE);

    // GPU предпочтительно, при недоступности переключаемся на CPU
    let mut manager = match OperationManager::new(Device::Gpu) {
        Ok(manager) => manager,
        Err(e) => {
            println!("GPU недоступен ({:#}), переключение на CPU", e);
            OperationManager::new(Device::Cpu)?
        }
    };
    println!("Выбрано устройство: {}\n", manager.device());

    let (a_data, b_data) = initialize_matrices(MatrixType::Random, MATRIX_SIZE);
    let a = Array2::from_shape_vec((MATRIX_SIZE, MATRIX_SIZE), a_data)?;
    let b = Array2::from_shape_vec((MATRIX_SIZE, MATRIX_SIZE), b_data)?;

    // Операции над двумя матрицами
    for op in Operation::all() {
        let (result, duration) = measure_time(|| manager.multi_vector_op(op, &a, &b));
        let result = result?;
        let device_slice = result.as_slice().context("result is not contiguous")?;
        let a_slice = a.as_slice().context("a is not contiguous")?;
        let b_slice = b.as_slice().context("b is not contiguous")?;

        let expected: Vec<f64> = match op {
            Operation::ElemWiseAdd => a_slice.iter().zip(b_slice).map(|(x, y)| x + y).collect(),
            Operation::ElemWiseSub => a_slice.iter().zip(b_slice).map(|(x, y)| x - y).collect(),
            Operation::ElemWiseMul => a_slice.iter().zip(b_slice).map(|(x, y)| x * y).collect(),
            Operation::ElemWiseDiv => a_slice.iter().zip(b_slice).map(|(x, y)| x / y).collect(),
            Operation::MatrixMultiply => {
                cpu_matrix_multiply(a_slice, b_slice, MATRIX_SIZE, MATRIX_SIZE, MATRIX_SIZE)
            }
        };

        let ok = compare_results(device_slice, &expected);
        println!(
            "{:16} {:?}  верификация: {}",
            op.key(),
            duration,
            if ok { "успех" } else { "РАСХОЖДЕНИЕ" }
        );
    }

    // Операции над одной матрицей: небольшая хорошо обусловленная матрица
    let small_size = 16;
    let (mut m_data, _) = initialize_matrices(MatrixType::Random, small_size);
    for i in 0..small_size {
        m_data[i * small_size + i] += small_size as f64;
    }
    let m = Array2::from_shape_vec((small_size, small_size), m_data.clone())?;

    println!();
    for op in SingleOperation::all() {
        let (result, duration) = measure_time(|| manager.single_vector_op(op, &m));
        let result = result?;
        let device_slice = result.as_slice().context("result is not contiguous")?;

        let expected: Vec<f64> = match op {
            SingleOperation::Transpose => cpu_transpose(&m_data, small_size, small_size),
            SingleOperation::Trace => vec![cpu_trace(&m_data, small_size)],
            SingleOperation::FrobeniusNorm => vec![cpu_frobenius_norm(&m_data)],
            SingleOperation::Determinant => vec![cpu_determinant(&m_data, small_size)],
            SingleOperation::Inverse => cpu_inverse(&m_data, small_size)?,
        };

        let ok = compare_results(device_slice, &expected);
        println!(
            "{:16} {:?}  верификация: {}",
            op.key(),
            duration,
            if ok { "успех" } else { "РАСХОЖДЕНИЕ" }
        );
    }

    println!("\nГотово");
    Ok(())
}
