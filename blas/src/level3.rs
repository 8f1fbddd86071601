use crate::{BlasError, Layout, Op, Scalar, Uplo, blas_assert, required_len};

/// 对称秩 2k 更新，只写 `uplo` 指定的三角：
///
/// - `NoTrans`: `C := alpha·A·Bᵀ + alpha·B·Aᵀ + beta·C`，A、B 为 n×k；
/// - `Trans`: `C := alpha·Aᵀ·B + alpha·Bᵀ·A + beta·C`，A、B 为 k×n。
///
/// 复数不支持 `ConjTrans`，实数的 `ConjTrans` 等同于 `Trans`。
#[allow(clippy::too_many_arguments)]
pub fn syr2k<T: Scalar>(
    layout: Layout,
    uplo: Uplo,
    trans: Op,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) -> Result<(), BlasError> {
    const NAME: &str = "syr2k";
    let [a_len, b_len, c_len] = validate::<T>(NAME, layout, uplo, trans, n, k, lda, ldb, ldc)?;
    blas_assert!(NAME, 7, a.len() >= a_len, "A too short");
    blas_assert!(NAME, 9, b.len() >= b_len, "B too short");
    blas_assert!(NAME, 12, c.len() >= c_len, "C too short");

    kernel(layout, uplo, trans, n, k, alpha, a, lda, b, ldb, beta, c, ldc);
    Ok(())
}

/// 检查标量参数，返回 A、B、C 各自所需的最小元素数。
#[allow(clippy::too_many_arguments)]
pub(crate) fn validate<T: Scalar>(
    routine: &'static str,
    layout: Layout,
    uplo: Uplo,
    trans: Op,
    n: usize,
    k: usize,
    lda: usize,
    ldb: usize,
    ldc: usize,
) -> Result<[usize; 3], BlasError> {
    blas_assert!(routine, 2, uplo != Uplo::General, "uplo must be upper or lower");
    blas_assert!(
        routine,
        3,
        !(T::IS_COMPLEX && trans == Op::ConjTrans),
        "conjugate transpose is not symmetric for complex types"
    );

    let (rows, cols) = match trans {
        Op::NoTrans => (n, k),
        Op::Trans | Op::ConjTrans => (k, n),
    };
    let minor = layout.minor(rows, cols);
    let major = layout.major(rows, cols);
    blas_assert!(routine, 8, lda >= minor.max(1), "lda too small");
    blas_assert!(routine, 10, ldb >= minor.max(1), "ldb too small");
    blas_assert!(routine, 13, ldc >= n.max(1), "ldc < max(1, n)");

    Ok([
        required_len(minor, major, lda),
        required_len(minor, major, ldb),
        required_len(n, n, ldc),
    ])
}

/// 参数已经过 [`validate`] 检查的计算本体。
#[allow(clippy::too_many_arguments)]
pub(crate) fn kernel<T: Scalar>(
    layout: Layout,
    uplo: Uplo,
    trans: Op,
    n: usize,
    k: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &[T],
    ldb: usize,
    beta: T,
    c: &mut [T],
    ldc: usize,
) {
    let zero = T::zero();
    let one = T::one();
    if n == 0 || ((alpha == zero || k == 0) && beta == one) {
        return;
    }

    // 行主序 A 即列主序 Aᵀ，C 对称，只需交换三角和转置
    let (uplo, trans) = match layout {
        Layout::ColMajor => (uplo, trans),
        Layout::RowMajor => (uplo.flip(), trans.flip()),
    };
    let rows = |j: usize| match uplo {
        Uplo::Upper => 0..j + 1,
        _ => j..n,
    };

    if alpha == zero {
        for j in 0..n {
            for i in rows(j) {
                let c = &mut c[i + j * ldc];
                *c = if beta == zero { zero } else { beta * *c };
            }
        }
        return;
    }

    match trans {
        Op::NoTrans => {
            for j in 0..n {
                if beta == zero {
                    rows(j).for_each(|i| c[i + j * ldc] = zero)
                } else if beta != one {
                    rows(j).for_each(|i| c[i + j * ldc] *= beta)
                }
                for l in 0..k {
                    let (ajl, bjl) = (a[j + l * lda], b[j + l * ldb]);
                    if ajl == zero && bjl == zero {
                        continue;
                    }
                    let temp1 = alpha * bjl;
                    let temp2 = alpha * ajl;
                    for i in rows(j) {
                        c[i + j * ldc] += a[i + l * lda] * temp1 + b[i + l * ldb] * temp2;
                    }
                }
            }
        }
        Op::Trans | Op::ConjTrans => {
            for j in 0..n {
                for i in rows(j) {
                    let mut temp1 = zero;
                    let mut temp2 = zero;
                    for l in 0..k {
                        temp1 += a[l + i * lda] * b[l + j * ldb];
                        temp2 += b[l + i * ldb] * a[l + j * lda];
                    }
                    let c = &mut c[i + j * ldc];
                    let update = alpha * temp1 + alpha * temp2;
                    *c = if beta == zero {
                        update
                    } else {
                        beta * *c + update
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::syr2k;
    use crate::{Layout, Op, Uplo};
    use num_complex::Complex;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    /// 按逻辑下标直接展开的全矩阵结果。
    #[allow(clippy::too_many_arguments)]
    fn naive(
        layout: Layout,
        trans: Op,
        n: usize,
        k: usize,
        alpha: f64,
        a: &[f64],
        ld_ab: usize,
        b: &[f64],
        beta: f64,
        c: &[f64],
        ldc: usize,
    ) -> Vec<f64> {
        let at = |i: usize, l: usize, m: &[f64]| match trans {
            Op::NoTrans => m[layout.index(i, l, ld_ab)],
            _ => m[layout.index(l, i, ld_ab)],
        };
        let mut ans = c.to_vec();
        for i in 0..n {
            for j in 0..n {
                let sum = (0..k)
                    .map(|l| at(i, l, a) * at(j, l, b) + at(i, l, b) * at(j, l, a))
                    .sum::<f64>();
                let idx = layout.index(i, j, ldc);
                ans[idx] = alpha * sum + beta * c[idx];
            }
        }
        ans
    }

    #[test]
    fn test_all_combinations() {
        const N: usize = 5;
        const K: usize = 3;
        const LD: usize = 6;
        let mut rng = StdRng::seed_from_u64(42);
        let mut random = |len: usize| (0..len).map(|_| rng.random::<f64>()).collect::<Vec<_>>();
        let a = random(LD * LD);
        let b = random(LD * LD);
        let c = random(LD * LD);

        for layout in [Layout::ColMajor, Layout::RowMajor] {
            for uplo in [Uplo::Upper, Uplo::Lower] {
                for trans in [Op::NoTrans, Op::Trans] {
                    let ans = naive(layout, trans, N, K, 0.75, &a, LD, &b, -0.5, &c, LD);
                    let mut result = c.clone();
                    syr2k(
                        layout, uplo, trans, N, K, 0.75, &a, LD, &b, LD, -0.5, &mut result, LD,
                    )
                    .unwrap();
                    for i in 0..N {
                        for j in 0..N {
                            let idx = layout.index(i, j, LD);
                            let expect = if uplo.contains(i, j) { ans[idx] } else { c[idx] };
                            assert!(
                                (result[idx] - expect).abs() < 1e-13,
                                "{layout:?} {uplo:?} {trans:?} ({i}, {j})"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_beta_zero_ignores_nan() {
        let a = [1., 2.];
        let mut c = [f64::NAN; 4];
        syr2k(Layout::ColMajor, Uplo::Lower, Op::NoTrans, 2, 1, 1., &a, 2, &a, 2, 0., &mut c, 2)
            .unwrap();
        assert_eq!(c[0], 2.);
        assert_eq!(c[1], 4.);
        assert!(c[2].is_nan());
        assert_eq!(c[3], 8.);
    }

    #[test]
    fn test_quick_return() {
        let mut c = [1., 2., 3., 4.];
        syr2k(Layout::ColMajor, Uplo::Upper, Op::NoTrans, 2, 0, 5., &[], 2, &[], 2, 1., &mut c, 2)
            .unwrap();
        assert_eq!(c, [1., 2., 3., 4.]);
        syr2k(Layout::ColMajor, Uplo::Upper, Op::NoTrans, 2, 0, 5., &[], 2, &[], 2, 2., &mut c, 2)
            .unwrap();
        assert_eq!(c, [2., 2., 6., 8.]);
    }

    #[test]
    fn test_invalid() {
        let z = Complex::new(1f32, 0.);
        let mut c = [z; 4];
        let e = syr2k(
            Layout::ColMajor, Uplo::Lower, Op::ConjTrans, 2, 2, z, &[z; 4], 2, &[z; 4], 2, z,
            &mut c, 2,
        )
        .unwrap_err();
        assert_eq!(e.info(), -3);

        let mut c = [0f64; 4];
        // 行主序 NoTrans 的 A 为 2×3，lda 至少为 3
        let e = syr2k(
            Layout::RowMajor, Uplo::Lower, Op::NoTrans, 2, 3, 1., &[0.; 6], 2, &[0.; 6], 3, 0.,
            &mut c, 2,
        )
        .unwrap_err();
        assert_eq!(e.info(), -8);
        let e = syr2k(
            Layout::ColMajor, Uplo::Lower, Op::NoTrans, 2, 3, 1., &[0.; 6], 2, &[0.; 5], 2, 0.,
            &mut c, 2,
        )
        .unwrap_err();
        assert_eq!(e.info(), -9);

        // 所需长度溢出时按数组过短处理
        let e = syr2k(
            Layout::ColMajor, Uplo::Lower, Op::Trans, 2, usize::MAX, 1., &[0.; 6], usize::MAX,
            &[0.; 6], usize::MAX, 0., &mut c, 2,
        )
        .unwrap_err();
        assert_eq!(e.info(), -7);
    }
}
