//! Интеграционные тесты операций через OperationManager.
//!
//! Тесты, которым нужно устройство OpenCL, пропускаются, если ни одно
//! устройство недоступно (например, в CI без OpenCL runtime).

use blitzmat::matrix::compare_results;
use blitzmat::utils::approx_eq;
use blitzmat::{Device, Operation, OperationManager, SingleOperation, DEVICES};
use ndarray::Array2;

const REL_TOL: f64 = 1e-6;
const ABS_TOL: f64 = 1e-6;

/// Менеджеры для всех доступных устройств
fn managers() -> Vec<OperationManager> {
    DEVICES
        .iter()
        .filter_map(|key| {
            let device: Device = key.parse().expect("known device key");
            match OperationManager::new(device) {
                Ok(manager) => Some(manager),
                Err(e) => {
                    eprintln!("skipping {} device: {:#}", key, e);
                    None
                }
            }
        })
        .collect()
}

fn matrix(rows: usize, cols: usize, data: &[f64]) -> Array2<f64> {
    Array2::from_shape_vec((rows, cols), data.to_vec()).expect("shape matches data")
}

fn matrix1() -> Array2<f64> {
    matrix(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0])
}

fn matrix2() -> Array2<f64> {
    matrix(3, 3, &[2.0, 0.0, 1.0, 1.0, 2.0, 3.0, 4.0, 1.0, 2.0])
}

fn matrix3() -> Array2<f64> {
    matrix(
        4,
        4,
        &[
            5.0, 9.7, 1.0, 6.2, 12.0, 91.0, 15.0, 4.7, 19.0, 74.0, 3.2, 9.1, 3.1, 82.0, 31.0,
            22.0,
        ],
    )
}

fn matrix4() -> Array2<f64> {
    matrix(
        4,
        4,
        &[
            7.5, 2.3, 8.1, 4.6, 11.2, 5.9, 14.3, 3.8, 17.6, 6.4, 2.1, 8.9, 1.5, 9.2, 12.7, 4.3,
        ],
    )
}

fn scalar_of(result: &Array2<f64>) -> f64 {
    assert_eq!(result.dim(), (1, 1));
    result[(0, 0)]
}

#[test]
fn element_wise_operations() {
    for mut manager in managers() {
        let a = matrix1();
        let b = matrix4();
        let a3 = matrix3();

        let sum = manager
            .multi_vector_op(Operation::ElemWiseAdd, &a, &matrix2())
            .unwrap();
        let expected: Vec<f64> = a
            .iter()
            .zip(matrix2().iter())
            .map(|(x, y)| x + y)
            .collect();
        assert!(compare_results(sum.as_slice().unwrap(), &expected));

        let diff = manager
            .multi_vector_op(Operation::ElemWiseSub, &a3, &b)
            .unwrap();
        let expected: Vec<f64> = a3.iter().zip(b.iter()).map(|(x, y)| x - y).collect();
        assert!(compare_results(diff.as_slice().unwrap(), &expected));

        let prod = manager
            .multi_vector_op(Operation::ElemWiseMul, &a3, &b)
            .unwrap();
        let expected: Vec<f64> = a3.iter().zip(b.iter()).map(|(x, y)| x * y).collect();
        assert!(compare_results(prod.as_slice().unwrap(), &expected));

        // matrix4 не содержит нулей
        let quot = manager
            .multi_vector_op(Operation::ElemWiseDiv, &a3, &b)
            .unwrap();
        let expected: Vec<f64> = a3.iter().zip(b.iter()).map(|(x, y)| x / y).collect();
        assert!(compare_results(quot.as_slice().unwrap(), &expected));
    }
}

#[test]
fn matrix_multiply_square() {
    for mut manager in managers() {
        let product = manager
            .multi_vector_op(Operation::MatrixMultiply, &matrix1(), &matrix2())
            .unwrap();
        let expected = [16.0, 7.0, 13.0, 37.0, 16.0, 31.0, 58.0, 25.0, 49.0];
        assert_eq!(product.dim(), (3, 3));
        assert!(compare_results(product.as_slice().unwrap(), &expected));
    }
}

#[test]
fn matrix_multiply_rectangular() {
    for mut manager in managers() {
        let a = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = matrix(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let product = manager
            .multi_vector_op(Operation::MatrixMultiply, &a, &b)
            .unwrap();
        let expected = [58.0, 64.0, 139.0, 154.0];
        assert_eq!(product.dim(), (2, 2));
        assert!(compare_results(product.as_slice().unwrap(), &expected));
    }
}

#[test]
fn transpose() {
    for mut manager in managers() {
        let result = manager
            .single_vector_op(SingleOperation::Transpose, &matrix1())
            .unwrap();
        let expected = [1.0, 4.0, 7.0, 2.0, 5.0, 8.0, 3.0, 6.0, 9.0];
        assert!(compare_results(result.as_slice().unwrap(), &expected));

        let result = manager
            .single_vector_op(SingleOperation::Transpose, &matrix3())
            .unwrap();
        let expected = [
            5.0, 12.0, 19.0, 3.1, 9.7, 91.0, 74.0, 82.0, 1.0, 15.0, 3.2, 31.0, 6.2, 4.7, 9.1,
            22.0,
        ];
        assert!(compare_results(result.as_slice().unwrap(), &expected));

        // Прямоугольная матрица меняет форму
        let rect = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let result = manager
            .single_vector_op(SingleOperation::Transpose, &rect)
            .unwrap();
        assert_eq!(result.dim(), (3, 2));
        let expected = [1.0, 4.0, 2.0, 5.0, 3.0, 6.0];
        assert!(compare_results(result.as_slice().unwrap(), &expected));
    }
}

#[test]
fn trace() {
    for mut manager in managers() {
        let result = manager
            .single_vector_op(SingleOperation::Trace, &matrix3())
            .unwrap();
        assert!(approx_eq(scalar_of(&result), 121.2, REL_TOL, ABS_TOL));
    }
}

#[test]
fn frobenius_norm() {
    for mut manager in managers() {
        let result = manager
            .single_vector_op(SingleOperation::FrobeniusNorm, &matrix1())
            .unwrap();
        assert!(approx_eq(
            scalar_of(&result),
            285.0f64.sqrt(),
            REL_TOL,
            ABS_TOL
        ));
    }
}

#[test]
fn determinant() {
    for mut manager in managers() {
        let det = |manager: &mut OperationManager, m: &Array2<f64>| {
            scalar_of(
                &manager
                    .single_vector_op(SingleOperation::Determinant, m)
                    .unwrap(),
            )
        };
        assert!(approx_eq(det(&mut manager, &matrix1()), 0.0, REL_TOL, ABS_TOL));
        assert!(approx_eq(det(&mut manager, &matrix2()), -5.0, REL_TOL, ABS_TOL));
        assert!(approx_eq(
            det(&mut manager, &matrix3()),
            -26398.6062,
            REL_TOL,
            1e-4
        ));
        assert!(approx_eq(
            det(&mut manager, &matrix4()),
            -4655.8174,
            REL_TOL,
            1e-4
        ));
    }
}

#[test]
fn inverse() {
    for mut manager in managers() {
        let result = manager
            .single_vector_op(SingleOperation::Inverse, &matrix2())
            .unwrap();
        let expected = [-0.2, -0.2, 0.4, -2.0, 0.0, 1.0, 1.4, 0.4, -0.8];
        assert!(compare_results(result.as_slice().unwrap(), &expected));

        // Обратная, умноженная на исходную, дает единичную матрицу
        let inv = manager
            .single_vector_op(SingleOperation::Inverse, &matrix4())
            .unwrap();
        let product = manager
            .multi_vector_op(Operation::MatrixMultiply, &matrix4(), &inv)
            .unwrap();
        let mut identity = vec![0.0f64; 16];
        for i in 0..4 {
            identity[i * 4 + i] = 1.0;
        }
        assert!(compare_results(product.as_slice().unwrap(), &identity));
    }
}

#[test]
fn inverse_of_singular_fails() {
    for mut manager in managers() {
        let result = manager.single_vector_op(SingleOperation::Inverse, &matrix1());
        assert!(result.is_err());
    }
}

#[test]
fn shape_mismatch_is_an_error() {
    for mut manager in managers() {
        assert!(manager
            .multi_vector_op(Operation::ElemWiseAdd, &matrix1(), &matrix3())
            .is_err());
        assert!(manager
            .multi_vector_op(Operation::MatrixMultiply, &matrix1(), &matrix3())
            .is_err());

        let rect = matrix(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        for op in [
            SingleOperation::Trace,
            SingleOperation::Determinant,
            SingleOperation::Inverse,
        ] {
            assert!(manager.single_vector_op(op, &rect).is_err());
        }
    }
}

#[test]
fn empty_matrix_is_an_error() {
    for mut manager in managers() {
        let empty = Array2::<f64>::zeros((0, 0));
        assert!(manager
            .multi_vector_op(Operation::ElemWiseAdd, &empty, &empty)
            .is_err());
        assert!(manager
            .single_vector_op(SingleOperation::Transpose, &empty)
            .is_err());
    }
}
