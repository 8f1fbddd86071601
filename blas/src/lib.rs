//! 被测的 BLAS 秩 2 更新 kernel。
//!
//! 主机版本 [`syr2`]、[`syr2k`] 沿用经典 BLAS 参数约定，
//! [`batch::syr2k`] 将整批运算作为一个 kernel 提交到设备流上。

mod level2;
mod level3;
mod param;
mod scalar;

pub mod batch;

pub use level2::syr2;
pub use level3::syr2k;
pub use param::{Layout, Op, ParseParamError, Uplo};
pub use scalar::{RealScalar, Scalar};

#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
#[error("{routine}: illegal value of argument {pos} ({reason})")]
pub struct BlasError {
    pub routine: &'static str,
    pub pos: i64,
    pub reason: &'static str,
}

impl BlasError {
    /// 以经典 BLAS `info` 约定表示的状态码。
    #[inline]
    pub fn info(&self) -> i64 {
        -self.pos
    }
}

macro_rules! blas_assert {
    ($routine:expr, $pos:expr, $cond:expr, $reason:expr) => {
        if !$cond {
            return Err($crate::BlasError {
                routine: $routine,
                pos: $pos,
                reason: $reason,
            });
        }
    };
}
pub(crate) use blas_assert;

/// 列主序下存储 `minor × major` 矩阵所需的最小元素数，溢出时饱和到 `usize::MAX`。
#[inline]
pub(crate) fn required_len(minor: usize, major: usize, ld: usize) -> usize {
    if minor == 0 || major == 0 {
        0
    } else {
        ld.saturating_mul(major - 1).saturating_add(minor)
    }
}
