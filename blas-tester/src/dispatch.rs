use crate::{DataType, HarnessError, Params, Report};
use blas::Scalar;
use device::Device;
use num_complex::Complex;

/// 一个可被测试的例程，对每种标量类型各实例化一次。
pub trait Routine {
    const NAME: &'static str;

    /// `run == false` 时只做参数准备，不分配也不计算，返回 `Ok(None)`。
    fn run<T: Scalar>(params: &Params, device: &Device, run: bool) -> Result<Option<Report>, HarnessError>;
}

/// 按 `params.datatype` 选择标量类型。
pub fn dispatch<R: Routine>(params: &Params, device: &Device, run: bool) -> Result<Option<Report>, HarnessError> {
    match params.datatype {
        DataType::Integer => Err(HarnessError::UnsupportedType {
            routine: R::NAME,
            datatype: params.datatype,
        }),
        DataType::Single => R::run::<f32>(params, device, run),
        DataType::Double => R::run::<f64>(params, device, run),
        DataType::SingleComplex => R::run::<Complex<f32>>(params, device, run),
        DataType::DoubleComplex => R::run::<Complex<f64>>(params, device, run),
    }
}
