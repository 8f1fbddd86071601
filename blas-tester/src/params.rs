use crate::HarnessError;
use blas::{Layout, Op, Scalar, Uplo};
use num_complex::Complex64;
use std::{
    f64::consts::{E, PI},
    fmt,
    str::FromStr,
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum DataType {
    Integer,
    Single,
    #[default]
    Double,
    SingleComplex,
    DoubleComplex,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Integer => "i",
            Self::Single => "s",
            Self::Double => "d",
            Self::SingleComplex => "c",
            Self::DoubleComplex => "z",
        })
    }
}

impl FromStr for DataType {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i" | "int" | "integer" => Ok(Self::Integer),
            "s" | "single" | "float" => Ok(Self::Single),
            "d" | "double" => Ok(Self::Double),
            "c" | "complex-single" => Ok(Self::SingleComplex),
            "z" | "complex-double" => Ok(Self::DoubleComplex),
            _ => Err(HarnessError::InvalidParams(format!("unknown datatype \"{s}\""))),
        }
    }
}

/// 一个测例的全部参数，与具体例程无关。
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Params {
    pub datatype: DataType,
    pub layout: Layout,
    pub uplo: Uplo,
    pub trans: Op,
    pub n: usize,
    pub k: usize,
    pub batch: usize,
    pub device: usize,
    /// leading dimension 向上对齐到的元素数
    pub align: usize,
    pub alpha: Complex64,
    pub beta: Complex64,
    pub incx: isize,
    pub incy: isize,
    pub verbose: u8,
    /// 计时前冲刷的缓存大小，单位 MiB
    pub cache: usize,
    pub check: bool,
    pub reference: bool,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            datatype: DataType::Double,
            layout: Layout::ColMajor,
            uplo: Uplo::Lower,
            trans: Op::NoTrans,
            n: 100,
            k: 100,
            batch: 10,
            device: 0,
            align: 1,
            alpha: Complex64::new(PI, 0.),
            beta: Complex64::new(E, 0.),
            incx: 1,
            incy: 1,
            verbose: 0,
            cache: 20,
            check: true,
            reference: false,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), HarnessError> {
        let fail = |msg: &str| Err(HarnessError::InvalidParams(msg.into()));
        if self.align == 0 {
            return fail("align must be at least 1");
        }
        if self.batch == 0 {
            return fail("batch must be at least 1");
        }
        if self.incx == 0 || self.incy == 0 {
            return fail("vector increments must not be zero");
        }
        if self.uplo == Uplo::General {
            return fail("uplo must be upper or lower");
        }
        Ok(())
    }

    /// 复数参数截断到当前类型，实数类型丢弃虚部。
    #[inline]
    pub fn alpha<T: Scalar>(&self) -> T {
        T::from_parts(self.alpha.re, self.alpha.im)
    }

    #[inline]
    pub fn beta<T: Scalar>(&self) -> T {
        T::from_parts(self.beta.re, self.beta.im)
    }
}

#[test]
fn test_datatype() {
    assert_eq!("Z".parse::<DataType>().unwrap(), DataType::DoubleComplex);
    assert_eq!(DataType::SingleComplex.to_string(), "c");
    assert!("q".parse::<DataType>().is_err());
}

#[test]
fn test_validate() {
    let params = Params::default();
    assert!(params.validate().is_ok());
    assert_eq!(params.alpha::<f32>(), PI as f32);
    assert!(matches!(
        Params { align: 0, ..params }.validate(),
        Err(HarnessError::InvalidParams(_))
    ));
    assert!(Params { incy: 0, ..params }.validate().is_err());
    assert!(Params { batch: 0, ..params }.validate().is_err());
    assert!(Params { incx: -3, ..params }.validate().is_ok());
}
