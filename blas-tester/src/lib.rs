//! BLAS 秩 2 更新的校验与性能测试。
//!
//! 每个测例生成随机操作数，调用被测 kernel 与参考实现，以归一化残差判定正确性并测量吞吐。

pub mod buffer;
pub mod cache;
pub mod check;
pub mod dispatch;
pub mod flops;
pub mod params;
pub mod routine;

pub use check::{BatchCheck, ErrorReport, TOLERANCE};
pub use dispatch::{Routine, dispatch};
pub use params::{DataType, Params};
pub use routine::{Report, RoutineKind};

/// 使测例中止的错误。数值校验失败不属于此类，而是 [`Report`] 中的结果。
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    #[error("{routine} does not support {datatype} data")]
    UnsupportedType {
        routine: &'static str,
        datatype: DataType,
    },
    #[error("cannot allocate {elements} host elements for {operand}")]
    HostAlloc {
        operand: &'static str,
        elements: usize,
    },
    #[error(transparent)]
    Device(#[from] device::DeviceError),
    #[error(transparent)]
    Blas(#[from] blas::BlasError),
    #[error(transparent)]
    Lapack(#[from] refblas::LapackError),
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}
