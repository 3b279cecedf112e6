//! CPU-реализации матричных операций
//!
//! Используются как эталон для верификации результатов устройства
//! и как оракул в тестах.

use super::types::MatrixType;
use crate::utils::approx_eq;
use anyhow::{bail, Result};
use rand::Rng;

/// Относительная погрешность сравнения результатов
pub const RELATIVE_TOLERANCE: f64 = 1e-6;
/// Абсолютная погрешность для значений около нуля
pub const ABSOLUTE_TOLERANCE: f64 = 1e-6;

/// Инициализирует пару квадратных матриц заданного типа и размера
pub fn initialize_matrices(matrix_type: MatrixType, size: usize) -> (Vec<f64>, Vec<f64>) {
    let matrix_elements = size * size;
    match matrix_type {
        MatrixType::OnesAndTwos => {
            (vec![1.0f64; matrix_elements], vec![2.0f64; matrix_elements])
        }
        MatrixType::ThreesAndFours => {
            (vec![3.0f64; matrix_elements], vec![4.0f64; matrix_elements])
        }
        MatrixType::Random => {
            let mut rng = rand::thread_rng();
            let a: Vec<f64> = (0..matrix_elements).map(|_| rng.gen_range(0.0..1.0)).collect();
            let b: Vec<f64> = (0..matrix_elements).map(|_| rng.gen_range(0.0..1.0)).collect();
            (a, b)
        }
    }
}

/// CPU реализация матричного умножения: a (lheight x lwidth) * b (lwidth x rwidth)
pub fn cpu_matrix_multiply(
    a: &[f64],
    b: &[f64],
    lheight: usize,
    lwidth: usize,
    rwidth: usize,
) -> Vec<f64> {
    let mut c = vec![0.0f64; lheight * rwidth];
    for i in 0..lheight {
        for j in 0..rwidth {
            let mut sum = 0.0f64;
            for k in 0..lwidth {
                sum += a[i * lwidth + k] * b[k * rwidth + j];
            }
            c[i * rwidth + j] = sum;
        }
    }
    c
}

/// CPU реализация транспонирования
pub fn cpu_transpose(data: &[f64], height: usize, width: usize) -> Vec<f64> {
    let mut out = vec![0.0f64; data.len()];
    for i in 0..height {
        for j in 0..width {
            out[j * height + i] = data[i * width + j];
        }
    }
    out
}

/// След квадратной матрицы
pub fn cpu_trace(data: &[f64], size: usize) -> f64 {
    (0..size).map(|i| data[i * size + i]).sum()
}

/// Норма Фробениуса
pub fn cpu_frobenius_norm(data: &[f64]) -> f64 {
    data.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Определитель через исключение Гаусса с частичным выбором опорного
/// элемента. Вырожденная матрица дает 0.
pub fn cpu_determinant(data: &[f64], size: usize) -> f64 {
    let mut m = data.to_vec();
    let mut sign = 1.0f64;

    for k in 0..size {
        // Частичный выбор опорного элемента по столбцу k
        let mut pivot_row = k;
        for row in k + 1..size {
            if m[row * size + k].abs() > m[pivot_row * size + k].abs() {
                pivot_row = row;
            }
        }
        if m[pivot_row * size + k] == 0.0 {
            return 0.0;
        }
        if pivot_row != k {
            for col in 0..size {
                m.swap(k * size + col, pivot_row * size + col);
            }
            sign = -sign;
        }
        for row in k + 1..size {
            let factor = m[row * size + k] / m[k * size + k];
            for col in k..size {
                m[row * size + col] -= factor * m[k * size + col];
            }
        }
    }

    let mut det = sign;
    for i in 0..size {
        det *= m[i * size + i];
    }
    det
}

/// Обратная матрица методом Гаусса-Жордана над [A | I]
pub fn cpu_inverse(data: &[f64], size: usize) -> Result<Vec<f64>> {
    let width = 2 * size;
    let mut aug = vec![0.0f64; size * width];
    for i in 0..size {
        for j in 0..size {
            aug[i * width + j] = data[i * size + j];
        }
        aug[i * width + size + i] = 1.0;
    }

    for k in 0..size {
        let mut pivot_row = k;
        for row in k + 1..size {
            if aug[row * width + k].abs() > aug[pivot_row * width + k].abs() {
                pivot_row = row;
            }
        }
        let pivot = aug[pivot_row * width + k];
        if pivot.abs() < f64::EPSILON {
            bail!("Matrix is singular, inverse does not exist");
        }
        if pivot_row != k {
            for col in 0..width {
                aug.swap(k * width + col, pivot_row * width + col);
            }
        }
        let pivot = aug[k * width + k];
        for col in 0..width {
            aug[k * width + col] /= pivot;
        }
        for row in 0..size {
            if row == k {
                continue;
            }
            let factor = aug[row * width + k];
            for col in 0..width {
                aug[row * width + col] -= factor * aug[k * width + col];
            }
        }
    }

    let mut inv = vec![0.0f64; size * size];
    for i in 0..size {
        for j in 0..size {
            inv[i * size + j] = aug[i * width + size + j];
        }
    }
    Ok(inv)
}

/// Сравнивает результаты устройства и CPU с допусками
pub fn compare_results(device_result: &[f64], cpu_result: &[f64]) -> bool {
    if device_result.len() != cpu_result.len() {
        log::warn!(
            "Result length mismatch: {} vs {}",
            device_result.len(),
            cpu_result.len()
        );
        return false;
    }

    let mut max_diff = 0.0f64;
    let mut diff_count = 0usize;
    for (idx, (&actual, &expected)) in device_result.iter().zip(cpu_result).enumerate() {
        if !approx_eq(actual, expected, RELATIVE_TOLERANCE, ABSOLUTE_TOLERANCE) {
            diff_count += 1;
            let diff = (actual - expected).abs();
            if diff > max_diff {
                max_diff = diff;
            }
            if diff_count <= 3 {
                log::warn!("Mismatch at {}: {} vs {}", idx, actual, expected);
            }
        }
    }

    if diff_count > 0 {
        log::warn!(
            "{} elements differ, max difference {}",
            diff_count,
            max_diff
        );
        false
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Матрицы из тестового набора движка
    const MATRIX1: [f64; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
    const MATRIX2: [f64; 9] = [2.0, 0.0, 1.0, 1.0, 2.0, 3.0, 4.0, 1.0, 2.0];
    const MATRIX3: [f64; 16] = [
        5.0, 9.7, 1.0, 6.2, 12.0, 91.0, 15.0, 4.7, 19.0, 74.0, 3.2, 9.1, 3.1, 82.0, 31.0, 22.0,
    ];
    const MATRIX4: [f64; 16] = [
        7.5, 2.3, 8.1, 4.6, 11.2, 5.9, 14.3, 3.8, 17.6, 6.4, 2.1, 8.9, 1.5, 9.2, 12.7, 4.3,
    ];

    #[test]
    fn determinant_3x3() {
        assert!(approx_eq(cpu_determinant(&MATRIX1, 3), 0.0, 1e-6, 1e-6));
        assert!(approx_eq(cpu_determinant(&MATRIX2, 3), -5.0, 1e-6, 1e-6));
    }

    #[test]
    fn determinant_4x4() {
        assert!(approx_eq(
            cpu_determinant(&MATRIX3, 4),
            -26398.6062,
            1e-6,
            1e-6
        ));
        assert!(approx_eq(
            cpu_determinant(&MATRIX4, 4),
            -4655.8174,
            1e-6,
            1e-6
        ));
    }

    #[test]
    fn transpose_3x3() {
        let expected = [1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0];
        assert_eq!(cpu_transpose(&MATRIX1, 3, 3), expected);
    }

    #[test]
    fn transpose_rectangular() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let expected = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        assert_eq!(cpu_transpose(&data, 2, 3), expected);
    }

    #[test]
    fn trace_and_norm() {
        assert!(approx_eq(cpu_trace(&MATRIX3, 4), 121.2, 1e-6, 1e-6));
        assert!(approx_eq(
            cpu_frobenius_norm(&MATRIX1),
            285.0f64.sqrt(),
            1e-6,
            1e-6
        ));
    }

    #[test]
    fn inverse_3x3() {
        let inv = cpu_inverse(&MATRIX2, 3).unwrap();
        let expected = [-0.2, -0.2, 0.4, -2.0, 0.0, 1.0, 1.4, 0.4, -0.8];
        assert!(compare_results(&inv, &expected));
    }

    #[test]
    fn inverse_of_singular_fails() {
        assert!(cpu_inverse(&MATRIX1, 3).is_err());
    }

    #[test]
    fn inverse_times_original_is_identity() {
        let inv = cpu_inverse(&MATRIX4, 4).unwrap();
        let product = cpu_matrix_multiply(&MATRIX4, &inv, 4, 4, 4);
        let mut identity = vec![0.0f64; 16];
        for i in 0..4 {
            identity[i * 4 + i] = 1.0;
        }
        assert!(compare_results(&product, &identity));
    }

    #[test]
    fn matrix_multiply_known_product() {
        let product = cpu_matrix_multiply(&MATRIX1, &MATRIX2, 3, 3, 3);
        let expected = [
            16.0, 7.0, 13.0, 37.0, 16.0, 31.0, 58.0, 25.0, 49.0,
        ];
        assert!(compare_results(&product, &expected));
    }

    #[test]
    fn initialize_matrices_fill_patterns() {
        let (a, b) = initialize_matrices(MatrixType::OnesAndTwos, 4);
        assert!(a.iter().all(|&x| x == 1.0));
        assert!(b.iter().all(|&x| x == 2.0));

        let (a, b) = initialize_matrices(MatrixType::Random, 4);
        assert_eq!(a.len(), 16);
        assert!(a.iter().chain(&b).all(|&x| (0.0..1.0).contains(&x)));
    }
}
