//! 参考实现：逐元素展开的 CBLAS 与 LAPACK 辅助例程。
//!
//! 只用于给被测 kernel 提供对照结果，不追求性能。LAPACK 例程只接受列主序存储。

pub mod cblas;
pub mod lapack;

mod ssq;

#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
pub enum LapackError {
    #[error("{routine}: illegal value of argument {pos} ({reason})")]
    InvalidArgument {
        routine: &'static str,
        pos: i64,
        reason: &'static str,
    },
    #[error("unknown random distribution {0}")]
    UnknownDistribution(i64),
    #[error("unknown norm \"{0}\"")]
    UnknownNorm(String),
}

macro_rules! lapack_assert {
    ($routine:expr, $pos:expr, $cond:expr, $reason:expr) => {
        if !$cond {
            return Err($crate::LapackError::InvalidArgument {
                routine: $routine,
                pos: $pos,
                reason: $reason,
            });
        }
    };
}
pub(crate) use lapack_assert;
