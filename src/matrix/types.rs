//! Типы операций, устройств и матриц

use crate::opencl::types::{cl_device_type, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU};
use anyhow::{anyhow, Error};
use std::fmt;
use std::str::FromStr;

/// Ключи операций над двумя матрицами
pub static OPERATIONS: [&str; 5] = ["add", "subtract", "multiply", "divide", "matrix_multiply"];

/// Ключи операций над одной матрицей
pub static SINGLE_OPERATIONS: [&str; 5] =
    ["transpose", "inverse", "trace", "frobenius_norm", "determinant"];

/// Ключи устройств
pub static DEVICES: [&str; 2] = ["CPU", "GPU"];

/// Операции над двумя матрицами
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ElemWiseAdd,
    ElemWiseSub,
    ElemWiseMul,
    ElemWiseDiv,
    MatrixMultiply,
}

impl Operation {
    /// Строковый ключ операции
    pub fn key(&self) -> &'static str {
        match self {
            Operation::ElemWiseAdd => "add",
            Operation::ElemWiseSub => "subtract",
            Operation::ElemWiseMul => "multiply",
            Operation::ElemWiseDiv => "divide",
            Operation::MatrixMultiply => "matrix_multiply",
        }
    }

    pub fn all() -> [Operation; 5] {
        [
            Operation::ElemWiseAdd,
            Operation::ElemWiseSub,
            Operation::ElemWiseMul,
            Operation::ElemWiseDiv,
            Operation::MatrixMultiply,
        ]
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "add" => Ok(Operation::ElemWiseAdd),
            "subtract" => Ok(Operation::ElemWiseSub),
            "multiply" => Ok(Operation::ElemWiseMul),
            "divide" => Ok(Operation::ElemWiseDiv),
            "matrix_multiply" => Ok(Operation::MatrixMultiply),
            _ => Err(anyhow!("Unknown operation: {}", s)),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Операции над одной матрицей
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingleOperation {
    Transpose,
    Inverse,
    Trace,
    FrobeniusNorm,
    Determinant,
}

impl SingleOperation {
    /// Строковый ключ операции
    pub fn key(&self) -> &'static str {
        match self {
            SingleOperation::Transpose => "transpose",
            SingleOperation::Inverse => "inverse",
            SingleOperation::Trace => "trace",
            SingleOperation::FrobeniusNorm => "frobenius_norm",
            SingleOperation::Determinant => "determinant",
        }
    }

    pub fn all() -> [SingleOperation; 5] {
        [
            SingleOperation::Transpose,
            SingleOperation::Inverse,
            SingleOperation::Trace,
            SingleOperation::FrobeniusNorm,
            SingleOperation::Determinant,
        ]
    }
}

impl FromStr for SingleOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "transpose" => Ok(SingleOperation::Transpose),
            "inverse" => Ok(SingleOperation::Inverse),
            "trace" => Ok(SingleOperation::Trace),
            "frobenius_norm" => Ok(SingleOperation::FrobeniusNorm),
            "determinant" => Ok(SingleOperation::Determinant),
            _ => Err(anyhow!("Unknown single-matrix operation: {}", s)),
        }
    }
}

impl fmt::Display for SingleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Тип вычислительного устройства
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Cpu,
    Gpu,
}

impl Device {
    /// Строковый ключ устройства
    pub fn key(&self) -> &'static str {
        match self {
            Device::Cpu => "CPU",
            Device::Gpu => "GPU",
        }
    }

    /// Соответствующий тип устройства OpenCL
    pub fn cl_device_type(&self) -> cl_device_type {
        match self {
            Device::Cpu => CL_DEVICE_TYPE_CPU,
            Device::Gpu => CL_DEVICE_TYPE_GPU,
        }
    }
}

impl FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "CPU" => Ok(Device::Cpu),
            "GPU" => Ok(Device::Gpu),
            _ => Err(anyhow!("Device type must be either 'CPU' or 'GPU'")),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Тип матриц для генерации тестовых данных
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatrixType {
    /// Матрицы заполненные 1 и 2
    OnesAndTwos,
    /// Матрицы заполненные 3 и 4
    ThreesAndFours,
    /// Случайно заполненные матрицы
    Random,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_keys_match_table() {
        let keys: Vec<&str> = Operation::all().iter().map(|op| op.key()).collect();
        assert_eq!(keys, OPERATIONS);
    }

    #[test]
    fn single_operation_keys_match_table() {
        let keys: Vec<&str> = SingleOperation::all().iter().map(|op| op.key()).collect();
        assert_eq!(keys, SINGLE_OPERATIONS);
    }

    #[test]
    fn device_keys_match_table() {
        assert_eq!([Device::Cpu.key(), Device::Gpu.key()], DEVICES);
    }

    #[test]
    fn keys_round_trip() {
        for op in Operation::all() {
            assert_eq!(op.key().parse::<Operation>().unwrap(), op);
        }
        for op in SingleOperation::all() {
            assert_eq!(op.key().parse::<SingleOperation>().unwrap(), op);
        }
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("GPU".parse::<Device>().unwrap(), Device::Gpu);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!("modulo".parse::<Operation>().is_err());
        assert!("norm".parse::<SingleOperation>().is_err());
        assert!("TPU".parse::<Device>().is_err());
    }
}
