//! Тестирование производительности умножения матриц на устройствах OpenCL

use anyhow::{Context, Result};
use blitzmat::matrix::operations::cpu_matrix_multiply;
use blitzmat::matrix::{compare_results, initialize_matrices};
use blitzmat::utils::measure_time;
use blitzmat::{Device, MatrixType, Operation, OperationManager, DEVICES};
use ndarray::Array2;

const MATRIX_SIZE: usize = 512;
const NUM_ITERATIONS: u32 = 10;

fn main() -> Result<()> {
    env_logger::init();

    println!("Тестирование производительности умножения матриц");
    println!("Размер матриц: {}x{}", MATRIX_SIZE, MATRIX_SIZE);
    println!("Итераций на устройство: {}\n", NUM_ITERATIONS);

    let (a_data, b_data) = initialize_matrices(MatrixType::Random, MATRIX_SIZE);
    let a = Array2::from_shape_vec((MATRIX_SIZE, MATRIX_SIZE), a_data.clone())?;
    let b = Array2::from_shape_vec((MATRIX_SIZE, MATRIX_SIZE), b_data.clone())?;

    // Эталон на хосте
    println!("Вычисление эталона на хосте...");
    let (host_result, host_duration) = measure_time(|| {
        cpu_matrix_multiply(&a_data, &b_data, MATRIX_SIZE, MATRIX_SIZE, MATRIX_SIZE)
    });
    println!("Время хоста: {:?}\n", host_duration);

    for key in DEVICES {
        let device: Device = key.parse()?;
        let mut manager = match OperationManager::new(device) {
            Ok(manager) => manager,
            Err(e) => {
                println!("Устройство {} недоступно: {:#}\n", key, e);
                continue;
            }
        };

        // Прогрев: первая итерация включает компиляцию ядра
        let warmup = manager.multi_vector_op(Operation::MatrixMultiply, &a, &b)?;
        let ok = compare_results(
            warmup.as_slice().context("result is not contiguous")?,
            &host_result,
        );
        println!(
            "Устройство {}: верификация {}",
            key,
            if ok { "успешна" } else { "ПРОВАЛЕНА" }
        );

        let (status, duration) = measure_time(|| -> Result<()> {
            for _ in 0..NUM_ITERATIONS {
                manager.multi_vector_op(Operation::MatrixMultiply, &a, &b)?;
            }
            Ok(())
        });
        status?;

        let avg = duration.as_secs_f64() / NUM_ITERATIONS as f64;
        println!("Среднее время {}: {:.3} мс", key, avg * 1000.0);
        println!(
            "Ускорение относительно хоста: {:.2}x\n",
            host_duration.as_secs_f64() / avg
        );
    }

    Ok(())
}
