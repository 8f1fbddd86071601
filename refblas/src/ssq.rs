use num_traits::Float;

/// 带缩放的平方和，`scale²·sum` 为真实平方和，避免上溢。
pub(crate) struct Ssq<R> {
    scale: R,
    sum: R,
}

impl<R: Float> Ssq<R> {
    #[inline]
    pub fn new() -> Self {
        Self {
            scale: R::zero(),
            sum: R::one(),
        }
    }

    pub fn add(&mut self, x: R) {
        let x = x.abs();
        if x.is_nan() {
            self.scale = x;
        } else if x > R::zero() {
            if self.scale < x {
                self.sum = R::one() + self.sum * (self.scale / x).powi(2);
                self.scale = x
            } else {
                self.sum = self.sum + (x / self.scale).powi(2)
            }
        }
    }

    /// 复数分别累加实部与虚部。
    #[inline]
    pub fn add_scalar<T: blas::Scalar<Real = R>>(&mut self, x: T) {
        self.add(x.re());
        if T::IS_COMPLEX {
            self.add(x.im())
        }
    }

    /// 非对角元在对称矩阵中出现两次。
    #[inline]
    pub fn add_twice<T: blas::Scalar<Real = R>>(&mut self, x: T) {
        self.add_scalar(x);
        self.add_scalar(x)
    }

    #[inline]
    pub fn sqrt(&self) -> R {
        if self.scale.is_nan() {
            self.scale
        } else {
            self.scale * self.sum.sqrt()
        }
    }
}

#[test]
fn test_ssq() {
    let mut ssq = Ssq::<f64>::new();
    assert_eq!(ssq.sqrt(), 0.);
    ssq.add(3.);
    ssq.add(-4.);
    assert!((ssq.sqrt() - 5.).abs() < 1e-15);

    let mut big = Ssq::<f32>::new();
    big.add(3e30);
    big.add(4e30);
    assert!((big.sqrt() / 5e30 - 1.).abs() < 1e-6);

    let mut nan = Ssq::<f64>::new();
    nan.add(f64::NAN);
    nan.add(1.);
    assert!(nan.sqrt().is_nan());
}
