//! Вспомогательные функции и утилиты

use std::time::Instant;

/// Измеряет время выполнения функции
pub fn measure_time<F, T>(f: F) -> (T, std::time::Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();
    (result, duration)
}

/// Сравнение с относительной погрешностью; для значений около нуля
/// используется абсолютная погрешность
pub fn approx_eq(actual: f64, expected: f64, rel_tol: f64, abs_tol: f64) -> bool {
    if expected.abs() < abs_tol {
        (actual - expected).abs() < abs_tol
    } else {
        ((actual - expected) / expected).abs() < rel_tol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_near_zero_uses_absolute() {
        assert!(approx_eq(1e-9, 0.0, 1e-6, 1e-6));
        assert!(!approx_eq(1e-3, 0.0, 1e-6, 1e-6));
    }

    #[test]
    fn approx_eq_uses_relative_otherwise() {
        assert!(approx_eq(1000.0001, 1000.0, 1e-6, 1e-6));
        assert!(!approx_eq(1001.0, 1000.0, 1e-6, 1e-6));
    }

    #[test]
    fn measure_time_returns_result() {
        let (value, duration) = measure_time(|| {
            std::thread::sleep(std::time::Duration::from_millis(1));
            40 + 2
        });
        assert_eq!(value, 42);
        assert!(duration.as_millis() >= 1);
    }
}
