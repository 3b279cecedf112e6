//! OpenCL ядра для матричных операций
//!
//! Каждый исходник определяет точку входа `blitz_kernel`; ядра
//! исключения Гаусса дополнительно определяют `swap_rows` и
//! `normalize_row`.

use super::types::{Operation, SingleOperation};

/// Имя основной точки входа в каждом исходнике
pub const KERNEL_ENTRY: &str = "blitz_kernel";

/// Поэлементное сложение
pub static ELEM_ADD_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* lhs,
    __global const double* rhs,
    __global double* out,
    const int height,
    const int width
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= height || col >= width) return;
    const int idx = row * width + col;
    out[idx] = lhs[idx] + rhs[idx];
}
"#;

/// Поэлементное вычитание
pub static ELEM_SUB_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* lhs,
    __global const double* rhs,
    __global double* out,
    const int height,
    const int width
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= height || col >= width) return;
    const int idx = row * width + col;
    out[idx] = lhs[idx] - rhs[idx];
}
"#;

/// Поэлементное умножение
pub static ELEM_MUL_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* lhs,
    __global const double* rhs,
    __global double* out,
    const int height,
    const int width
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= height || col >= width) return;
    const int idx = row * width + col;
    out[idx] = lhs[idx] * rhs[idx];
}
"#;

/// Поэлементное деление
pub static ELEM_DIV_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* lhs,
    __global const double* rhs,
    __global double* out,
    const int height,
    const int width
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= height || col >= width) return;
    const int idx = row * width + col;
    out[idx] = lhs[idx] / rhs[idx];
}
"#;

/// Матричное умножение: один work-item на элемент результата
pub static MAT_MUL_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* lhs,
    __global const double* rhs,
    __global double* out,
    const int lheight,
    const int lwidth,
    const int rwidth
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= lheight || col >= rwidth) return;

    double sum = 0.0;
    for (int k = 0; k < lwidth; k++) {
        sum = fma(lhs[row * lwidth + k], rhs[k * rwidth + col], sum);
    }
    out[row * rwidth + col] = sum;
}
"#;

/// Транспонирование
pub static TRANSPOSE_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* data,
    __global double* out,
    const int height,
    const int width
) {
    const int row = get_global_id(0);
    const int col = get_global_id(1);
    if (row >= height || col >= width) return;
    out[col * height + row] = data[row * width + col];
}
"#;

/// След: выборка диагонали, суммирование на хосте
pub static TRACE_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* data,
    __global double* out,
    const int size
) {
    const int i = get_global_id(0);
    if (i >= size) return;
    out[i] = data[i * size + i];
}
"#;

/// Норма Фробениуса: квадраты элементов, сумма и корень на хосте
pub static FROBENIUS_NORM_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global const double* data,
    __global double* out,
    const int count
) {
    const int i = get_global_id(0);
    if (i >= count) return;
    out[i] = data[i] * data[i];
}
"#;

/// Определитель: один шаг исключения Гаусса на столбец pivot.
/// Каждый work-item обновляет одну строку ниже опорной, фактор
/// читается до записи, строки друг от друга не зависят.
pub static DETERMINANT_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global double* m,
    const int size,
    const int pivot
) {
    const int row = get_global_id(0);
    if (row <= pivot || row >= size) return;

    const double factor = m[row * size + pivot] / m[pivot * size + pivot];
    for (int col = pivot; col < size; col++) {
        m[row * size + col] -= factor * m[pivot * size + col];
    }
}

__kernel void swap_rows(
    __global double* m,
    const int width,
    const int r1,
    const int r2
) {
    const int col = get_global_id(0);
    if (col >= width) return;
    const double tmp = m[r1 * width + col];
    m[r1 * width + col] = m[r2 * width + col];
    m[r2 * width + col] = tmp;
}
"#;

/// Обращение методом Гаусса-Жордана над расширенной матрицей [A | I]
/// шириной 2*size. Опорная строка нормализуется отдельным проходом,
/// затем исключается столбец pivot во всех остальных строках.
pub static INVERSE_KERNEL: &str = r#"
#pragma OPENCL EXTENSION cl_khr_fp64 : enable

__kernel void blitz_kernel(
    __global double* aug,
    const int size,
    const int pivot
) {
    const int row = get_global_id(0);
    const int width = 2 * size;
    if (row >= size || row == pivot) return;

    const double factor = aug[row * width + pivot];
    for (int col = 0; col < width; col++) {
        aug[row * width + col] -= factor * aug[pivot * width + col];
    }
}

__kernel void normalize_row(
    __global double* aug,
    const int size,
    const int pivot,
    const double pivot_value
) {
    const int col = get_global_id(0);
    const int width = 2 * size;
    if (col >= width) return;
    aug[pivot * width + col] /= pivot_value;
}

__kernel void swap_rows(
    __global double* m,
    const int width,
    const int r1,
    const int r2
) {
    const int col = get_global_id(0);
    if (col >= width) return;
    const double tmp = m[r1 * width + col];
    m[r1 * width + col] = m[r2 * width + col];
    m[r2 * width + col] = tmp;
}
"#;

/// Исходник ядра для операции над двумя матрицами
pub fn multi_kernel_source(op: Operation) -> &'static str {
    match op {
        Operation::ElemWiseAdd => ELEM_ADD_KERNEL,
        Operation::ElemWiseSub => ELEM_SUB_KERNEL,
        Operation::ElemWiseMul => ELEM_MUL_KERNEL,
        Operation::ElemWiseDiv => ELEM_DIV_KERNEL,
        Operation::MatrixMultiply => MAT_MUL_KERNEL,
    }
}

/// Исходник ядра для операции над одной матрицей
pub fn single_kernel_source(op: SingleOperation) -> &'static str {
    match op {
        SingleOperation::Transpose => TRANSPOSE_KERNEL,
        SingleOperation::Inverse => INVERSE_KERNEL,
        SingleOperation::Trace => TRACE_KERNEL,
        SingleOperation::FrobeniusNorm => FROBENIUS_NORM_KERNEL,
        SingleOperation::Determinant => DETERMINANT_KERNEL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_source_defines_entry_point() {
        for op in Operation::all() {
            assert!(
                multi_kernel_source(op).contains(KERNEL_ENTRY),
                "no {} in {}",
                KERNEL_ENTRY,
                op
            );
        }
        for op in SingleOperation::all() {
            assert!(
                single_kernel_source(op).contains(KERNEL_ENTRY),
                "no {} in {}",
                KERNEL_ENTRY,
                op
            );
        }
    }

    #[test]
    fn every_source_enables_fp64() {
        for op in Operation::all() {
            assert!(multi_kernel_source(op).contains("cl_khr_fp64"));
        }
        for op in SingleOperation::all() {
            assert!(single_kernel_source(op).contains("cl_khr_fp64"));
        }
    }

    #[test]
    fn elimination_sources_define_helpers() {
        assert!(DETERMINANT_KERNEL.contains("swap_rows"));
        assert!(INVERSE_KERNEL.contains("swap_rows"));
        assert!(INVERSE_KERNEL.contains("normalize_row"));
    }
}
