mod batch_syr2k;
mod syr2;
mod syr2k;

pub use batch_syr2k::BatchSyr2k;
pub use syr2::Syr2;
pub use syr2k::Syr2k;

use crate::{BatchCheck, HarnessError, Params, dispatch};
use device::Device;
use std::{fmt, str::FromStr, time::Duration};

/// 一个测例的结果。
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Report {
    pub time: Duration,
    pub gflops: f64,
    pub ref_time: Option<Duration>,
    pub ref_gflops: Option<f64>,
    /// 未要求检查时为 `None`
    pub check: Option<BatchCheck>,
    /// `info` 非 0 的批元素数
    pub kernel_failures: usize,
}

impl Report {
    #[inline]
    pub fn error(&self) -> Option<f64> {
        self.check.as_ref().map(BatchCheck::error)
    }

    /// kernel 报告参数错误时即使数值一致也判为失败。
    #[inline]
    pub fn okay(&self) -> Option<bool> {
        self.check
            .as_ref()
            .map(|check| check.okay() && self.kernel_failures == 0)
    }
}

/// 测例依次经历的阶段。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Configuring,
    Generating,
    Executing,
    Comparing,
    Reporting,
    Done,
}

#[inline]
pub(crate) fn enter(routine: &str, phase: Phase) {
    log::trace!("{routine}: {phase:?}")
}

/// 每秒 Gflop，计时为 0 时给 0。
#[inline]
pub(crate) fn rate(gflop: f64, time: Duration) -> f64 {
    let secs = time.as_secs_f64();
    if secs > 0. { gflop / secs } else { 0. }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RoutineKind {
    Syr2,
    Syr2k,
    BatchSyr2k,
}

impl RoutineKind {
    pub const ALL: [Self; 3] = [Self::Syr2, Self::Syr2k, Self::BatchSyr2k];

    /// 检查参数后按数据类型分派。
    pub fn run(self, params: &Params, device: &Device, run: bool) -> Result<Option<Report>, HarnessError> {
        params.validate()?;
        match self {
            Self::Syr2 => dispatch::<Syr2>(params, device, run),
            Self::Syr2k => dispatch::<Syr2k>(params, device, run),
            Self::BatchSyr2k => dispatch::<BatchSyr2k>(params, device, run),
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Syr2 => "syr2",
            Self::Syr2k => "syr2k",
            Self::BatchSyr2k => "batch-syr2k",
        })
    }
}

impl FromStr for RoutineKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "syr2" => Ok(Self::Syr2),
            "syr2k" => Ok(Self::Syr2k),
            "batch-syr2k" | "batch_syr2k" => Ok(Self::BatchSyr2k),
            _ => Err(HarnessError::InvalidParams(format!("unknown routine \"{s}\""))),
        }
    }
}
