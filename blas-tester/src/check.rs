//! 残差检查。
//!
//! 对秩 2k 更新 `C := alpha·A·Bᵀ + alpha·B·Aᵀ + beta·C`，
//! 误差为写入三角上 `|C - Cref|` 的最大值，除以
//! `k_eff·|alpha|·‖A‖·‖B‖ + |beta|·‖C‖` 归一化，小于 `TOLERANCE·eps` 即通过。

use blas::{Layout, RealScalar, Scalar, Uplo};
use num_traits::{Float, Zero};

/// 归一化误差上限，以机器精度为单位。
pub const TOLERANCE: f64 = 30.;

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ErrorReport {
    pub error: f64,
    pub okay: bool,
}

/// 整批的检查结果：误差取最大，判定取与。
#[derive(Clone, PartialEq, Debug, Default)]
pub struct BatchCheck {
    elements: Vec<ErrorReport>,
}

impl BatchCheck {
    #[inline]
    pub fn push(&mut self, report: ErrorReport) {
        self.elements.push(report)
    }

    #[inline]
    pub fn elements(&self) -> &[ErrorReport] {
        &self.elements
    }

    /// NaN 一旦出现就作为整批误差。
    pub fn error(&self) -> f64 {
        let mut max = 0f64;
        for r in &self.elements {
            if r.error.is_nan() {
                return r.error;
            }
            max = max.max(r.error)
        }
        max
    }

    #[inline]
    pub fn okay(&self) -> bool {
        self.elements.iter().all(|r| r.okay)
    }
}

impl FromIterator<ErrorReport> for BatchCheck {
    fn from_iter<I: IntoIterator<Item = ErrorReport>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Operand {
    A,
    B,
    C,
    X,
    Y,
}

/// 每个操作数每个批元素一个范数，在 kernel 运行之前由原始数据算出。
#[derive(Clone, Debug)]
pub struct OperandNorms<R> {
    norms: [Vec<R>; 5],
}

impl<R: Copy> OperandNorms<R> {
    pub fn with_batch(batch: usize) -> Self {
        Self {
            norms: std::array::from_fn(|_| Vec::with_capacity(batch)),
        }
    }

    #[inline]
    pub fn push(&mut self, operand: Operand, norm: R) {
        self.norms[operand as usize].push(norm)
    }

    #[inline]
    pub fn get(&self, operand: Operand, s: usize) -> R {
        self.norms[operand as usize][s]
    }

    #[inline]
    pub fn len(&self, operand: Operand) -> usize {
        self.norms[operand as usize].len()
    }
}

/// 检查一个秩 2k 更新的结果，只比较 `uplo` 在 `layout` 下指定的三角。
///
/// `syr2` 传入 `k_eff = 2`、`beta = 1`，`syr2k` 传入 `k_eff = 2k`。
#[allow(clippy::too_many_arguments)]
pub fn check_syr2k<T: Scalar>(
    layout: Layout,
    uplo: Uplo,
    n: usize,
    k_eff: usize,
    alpha: T,
    beta: T,
    anorm: T::Real,
    bnorm: T::Real,
    cnorm: T::Real,
    cref: &[T],
    ldcref: usize,
    c: &[T],
    ldc: usize,
) -> ErrorReport {
    let mut error = T::Real::zero();
    for j in 0..n {
        for i in (0..n).filter(|&i| uplo.contains(i, j)) {
            let diff = (c[layout.index(i, j, ldc)] - cref[layout.index(i, j, ldcref)]).magnitude();
            if diff > error || diff.is_nan() {
                error = diff
            }
        }
    }

    let f = |x: T::Real| -> f64 { x.into() };
    let scale = k_eff as f64 * f(alpha.magnitude()) * f(anorm) * f(bnorm)
        + f(beta.magnitude()) * f(cnorm);
    let scale = scale.max(f(<T::Real as Float>::min_positive_value()));
    let error = f(error) / scale;
    let okay = !error.is_nan() && error < threshold::<T::Real>();
    log::debug!("check {} n={n}: error {error:.2e}, scale {scale:.2e}", T::NAME);
    ErrorReport { error, okay }
}

/// 容许的最大归一化误差。
#[inline]
pub fn threshold<R: RealScalar>() -> f64 {
    TOLERANCE * R::eps().into()
}
