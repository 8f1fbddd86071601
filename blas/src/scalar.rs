use num_complex::Complex;
use num_traits::{Float, NumAssign};
use std::fmt::{Debug, LowerExp};

/// 测试所需的标量能力：四则运算、共轭、模与机器精度。
pub trait Scalar: NumAssign + Copy + Default + Debug + LowerExp + Send + Sync + 'static {
    type Real: RealScalar;

    const NAME: &'static str;
    const IS_COMPLEX: bool;

    fn from_parts(re: f64, im: f64) -> Self;
    fn re(self) -> Self::Real;
    fn im(self) -> Self::Real;
    fn conjugate(self) -> Self;
    /// 模，复数取复数差的模而不是分别比较实部虚部。
    fn magnitude(self) -> Self::Real;

    #[inline]
    fn eps() -> Self::Real {
        <Self::Real as Float>::epsilon()
    }

    #[inline]
    fn from_real(re: Self::Real) -> Self {
        Self::from_parts(re.into(), 0.)
    }
}

pub trait RealScalar: Scalar<Real = Self> + Float + Into<f64> {}

macro_rules! impl_real {
    ($ty:ty => $name:literal) => {
        impl Scalar for $ty {
            type Real = Self;

            const NAME: &'static str = $name;
            const IS_COMPLEX: bool = false;

            #[inline]
            fn from_parts(re: f64, _im: f64) -> Self {
                re as _
            }
            #[inline]
            fn re(self) -> Self {
                self
            }
            #[inline]
            fn im(self) -> Self {
                0.
            }
            #[inline]
            fn conjugate(self) -> Self {
                self
            }
            #[inline]
            fn magnitude(self) -> Self {
                self.abs()
            }
        }

        impl RealScalar for $ty {}
    };
}

macro_rules! impl_complex {
    ($ty:ty => $name:literal) => {
        impl Scalar for Complex<$ty> {
            type Real = $ty;

            const NAME: &'static str = $name;
            const IS_COMPLEX: bool = true;

            #[inline]
            fn from_parts(re: f64, im: f64) -> Self {
                Complex::new(re as _, im as _)
            }
            #[inline]
            fn re(self) -> $ty {
                self.re
            }
            #[inline]
            fn im(self) -> $ty {
                self.im
            }
            #[inline]
            fn conjugate(self) -> Self {
                self.conj()
            }
            #[inline]
            fn magnitude(self) -> $ty {
                self.norm()
            }
        }
    };
}

impl_real!(f32 => "float");
impl_real!(f64 => "double");
impl_complex!(f32 => "complex<float>");
impl_complex!(f64 => "complex<double>");

#[test]
fn test_scalar() {
    let z = Complex::<f64>::from_parts(3., -4.);
    assert_eq!(z.magnitude(), 5.);
    assert_eq!(z.conjugate().im(), 4.);
    assert_eq!(<Complex<f32>>::eps(), f32::EPSILON);
    assert_eq!(f64::from_parts(2.5, 1.), 2.5);
    assert_eq!(f32::from_real(-1.5).magnitude(), 1.5);
    assert_eq!(<Complex<f32>>::default(), <Complex<f32> as num_traits::Zero>::zero());
}
