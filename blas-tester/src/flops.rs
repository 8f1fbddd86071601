//! 浮点运算次数，单位 Gflop。复数乘法计 6 次、加法计 2 次实数运算。

use blas::Scalar;

#[inline]
fn gflop<T: Scalar>(muls: f64, adds: f64) -> f64 {
    let flop = if T::IS_COMPLEX {
        6. * muls + 2. * adds
    } else {
        muls + adds
    };
    flop * 1e-9
}

/// 对称秩 2 更新，只计算一个三角。
pub fn syr2<T: Scalar>(n: usize) -> f64 {
    let n = n as f64;
    gflop::<T>(n * (n + 1.) + n, n * (n + 1.))
}

/// 对称秩 2k 更新，只计算一个三角。
pub fn syr2k<T: Scalar>(n: usize, k: usize) -> f64 {
    let (n, k) = (n as f64, k as f64);
    gflop::<T>(k * n * n, k * n * n + n)
}

#[test]
fn test_flops() {
    use num_complex::Complex;

    let close = |a: f64, b: f64| (a - b).abs() <= 1e-12 * b.abs();
    assert_eq!(syr2k::<f64>(0, 7), 0.);
    assert!(close(syr2k::<f32>(10, 10), 2010e-9));
    assert!(close(syr2k::<Complex<f64>>(10, 10), 8020e-9));
    assert!(close(syr2::<f64>(2), 14e-9));
}
