use crate::{LapackError, lapack_assert, ssq::Ssq};
use blas::{Scalar, Uplo};
use num_traits::{Float, Zero};
use rand::{Rng, RngCore, SeedableRng, rngs::StdRng};
use std::{f64::consts::PI, str::FromStr};

/// `larnv` 的分布编号。
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i64)]
pub enum Distribution {
    /// (0, 1) 均匀分布
    Uniform01 = 1,
    /// (-1, 1) 均匀分布
    UniformPm1 = 2,
    /// 标准正态分布
    Normal = 3,
}

impl TryFrom<i64> for Distribution {
    type Error = LapackError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Uniform01),
            2 => Ok(Self::UniformPm1),
            3 => Ok(Self::Normal),
            _ => Err(LapackError::UnknownDistribution(value)),
        }
    }
}

/// 随机向量生成器，持有 4 个字的种子状态。
///
/// 每次 [`Larnv::fill`] 之后推进种子，相同的初始种子和相同的调用序列产生相同的数据。
/// 复数的实部和虚部分别采样。
#[derive(Clone, Debug)]
pub struct Larnv {
    dist: Distribution,
    seed: [u32; 4],
}

impl Larnv {
    pub fn new(idist: i64, seed: [u32; 4]) -> Result<Self, LapackError> {
        let dist = Distribution::try_from(idist)?;
        lapack_assert!(
            "larnv",
            2,
            seed.iter().all(|&w| w < 4096) && seed[3] % 2 == 1,
            "seed words must lie in [0, 4095] and the last one must be odd"
        );
        Ok(Self { dist, seed })
    }

    #[inline]
    pub fn distribution(&self) -> Distribution {
        self.dist
    }

    #[inline]
    pub fn seed(&self) -> [u32; 4] {
        self.seed
    }

    pub fn fill<T: Scalar>(&mut self, x: &mut [T]) {
        let mut bytes = [0u8; 32];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.seed) {
            chunk.copy_from_slice(&word.to_le_bytes())
        }
        let mut rng = StdRng::from_seed(bytes);
        for x in x.iter_mut() {
            let re = self.sample(&mut rng);
            let im = if T::IS_COMPLEX {
                self.sample(&mut rng)
            } else {
                0.
            };
            *x = T::from_parts(re, im)
        }

        let old = self.seed;
        self.seed = std::array::from_fn(|_| rng.next_u32() % 4096);
        self.seed[3] |= 1;
        log::trace!(
            "larnv: {} {} element(s), seed {old:?} -> {:?}",
            x.len(),
            T::NAME,
            self.seed
        );
    }

    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self.dist {
            Distribution::Uniform01 => rng.random(),
            Distribution::UniformPm1 => 2. * rng.random::<f64>() - 1.,
            Distribution::Normal => {
                let u1 = 1. - rng.random::<f64>();
                let u2 = rng.random::<f64>();
                (-2. * u1.ln()).sqrt() * (2. * PI * u2).cos()
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Norm {
    /// 最大模元
    Max,
    /// 最大列和
    One,
    /// 最大行和
    Inf,
    /// Frobenius 范数
    Fro,
}

impl FromStr for Norm {
    type Err = LapackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m" | "max" => Ok(Self::Max),
            "1" | "o" | "one" => Ok(Self::One),
            "i" | "inf" => Ok(Self::Inf),
            "f" | "e" | "fro" => Ok(Self::Fro),
            _ => Err(LapackError::UnknownNorm(s.into())),
        }
    }
}

/// NaN 一旦出现就保留。
#[inline]
fn max_nan<R: Float>(a: R, b: R) -> R {
    if b > a || b.is_nan() { b } else { a }
}

/// 列主序 `m × n` 一般矩阵的范数。
pub fn lange<T: Scalar>(norm: Norm, m: usize, n: usize, a: &[T], lda: usize) -> T::Real {
    let zero = T::Real::zero();
    if m == 0 || n == 0 {
        return zero;
    }
    let at = |i: usize, j: usize| a[i + j * lda].magnitude();
    match norm {
        Norm::Max => (0..n)
            .flat_map(|j| (0..m).map(move |i| (i, j)))
            .fold(zero, |max, (i, j)| max_nan(max, at(i, j))),
        Norm::One => (0..n)
            .map(|j| (0..m).fold(zero, |sum, i| sum + at(i, j)))
            .fold(zero, max_nan),
        Norm::Inf => {
            let mut work = vec![zero; m];
            for j in 0..n {
                for (i, w) in work.iter_mut().enumerate() {
                    *w = *w + at(i, j)
                }
            }
            work.into_iter().fold(zero, max_nan)
        }
        Norm::Fro => {
            let mut ssq = Ssq::new();
            for j in 0..n {
                a[j * lda..][..m].iter().for_each(|&x| ssq.add_scalar(x))
            }
            ssq.sqrt()
        }
    }
}

/// 列主序对称矩阵的范数，只读取 `uplo` 指定的三角。
///
/// `Uplo::General` 按一般矩阵计算。
pub fn lansy<T: Scalar>(norm: Norm, uplo: Uplo, n: usize, a: &[T], lda: usize) -> T::Real {
    let zero = T::Real::zero();
    if uplo == Uplo::General {
        return lange(norm, n, n, a, lda);
    }
    if n == 0 {
        return zero;
    }
    let triangle = (0..n).flat_map(|j| {
        (0..n)
            .filter(move |&i| uplo.contains(i, j))
            .map(move |i| (i, j))
    });
    match norm {
        Norm::Max => triangle.fold(zero, |max, (i, j)| max_nan(max, a[i + j * lda].magnitude())),
        // 对称矩阵的最大列和等于最大行和
        Norm::One | Norm::Inf => {
            let mut work = vec![zero; n];
            for (i, j) in triangle {
                let v = a[i + j * lda].magnitude();
                work[j] = work[j] + v;
                if i != j {
                    work[i] = work[i] + v
                }
            }
            work.into_iter().fold(zero, max_nan)
        }
        Norm::Fro => {
            let mut ssq = Ssq::new();
            for (i, j) in triangle {
                let x = a[i + j * lda];
                if i == j {
                    ssq.add_scalar(x)
                } else {
                    ssq.add_twice(x)
                }
            }
            ssq.sqrt()
        }
    }
}

/// 行下标范围：`(i, j)` 落在 `uplo` 三角内的 `i`。
#[inline]
fn rows(uplo: Uplo, m: usize, j: usize) -> std::ops::Range<usize> {
    match uplo {
        Uplo::Upper => 0..m.min(j + 1),
        Uplo::Lower => j.min(m)..m,
        Uplo::General => 0..m,
    }
}

/// 复制列主序矩阵 `A` 的 `uplo` 部分到 `B`。
pub fn lacpy<T: Copy>(uplo: Uplo, m: usize, n: usize, a: &[T], lda: usize, b: &mut [T], ldb: usize) {
    for j in 0..n {
        for i in rows(uplo, m, j) {
            b[i + j * ldb] = a[i + j * lda]
        }
    }
}

/// 将 `uplo` 部分的非对角元置为 `offdiag`，对角元置为 `diag`。
pub fn laset<T: Copy>(uplo: Uplo, m: usize, n: usize, offdiag: T, diag: T, a: &mut [T], lda: usize) {
    for j in 0..n {
        for i in rows(uplo, m, j) {
            a[i + j * lda] = if i == j { diag } else { offdiag }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use num_complex::Complex;

    #[test]
    fn test_larnv_deterministic() {
        let mut a = Larnv::new(1, [0, 0, 0, 1]).unwrap();
        let mut b = Larnv::new(1, [0, 0, 0, 1]).unwrap();
        let mut x = [0f64; 64];
        let mut y = [0f64; 64];
        a.fill(&mut x);
        b.fill(&mut y);
        assert_eq!(x, y);
        assert!(x.iter().all(|&v| (0. ..1.).contains(&v)));

        // 种子推进后产生不同的数据
        assert_ne!(a.seed(), [0, 0, 0, 1]);
        assert_eq!(a.seed()[3] % 2, 1);
        a.fill(&mut y);
        assert_ne!(x, y);
    }

    #[test]
    fn test_larnv_distributions() {
        let mut pm1 = Larnv::new(2, [1, 2, 3, 5]).unwrap();
        let mut x = vec![Complex::<f32>::new(9., 9.); 256];
        pm1.fill(&mut x);
        assert!(x.iter().all(|z| z.re.abs() < 1. && z.im.abs() < 1.));
        assert!(x.iter().any(|z| z.im < 0.));

        let mut normal = Larnv::new(3, [7, 7, 7, 7]).unwrap();
        let mut x = vec![0f64; 4096];
        normal.fill(&mut x);
        let mean = x.iter().sum::<f64>() / x.len() as f64;
        assert!(mean.abs() < 0.1);
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_larnv_invalid() {
        assert_eq!(
            Larnv::new(4, [0, 0, 0, 1]).unwrap_err(),
            LapackError::UnknownDistribution(4)
        );
        assert_eq!(
            Larnv::new(3, [0, 0, 0, 1]).unwrap().distribution(),
            Distribution::Normal
        );
        assert!(Larnv::new(1, [0, 0, 0, 2]).is_err());
        assert!(Larnv::new(1, [4096, 0, 0, 1]).is_err());
    }

    #[test]
    fn test_lange() {
        // [1 -3]
        // [2  4]，列主序 lda = 3
        let a = [1., 2., 99., -3., 4., 99.];
        assert_eq!(lange::<f64>(Norm::Max, 2, 2, &a, 3), 4.);
        assert_eq!(lange::<f64>(Norm::One, 2, 2, &a, 3), 7.);
        assert_eq!(lange::<f64>(Norm::Inf, 2, 2, &a, 3), 6.);
        assert!((lange::<f64>(Norm::Fro, 2, 2, &a, 3) - 30f64.sqrt()).abs() < 1e-15);
        assert_eq!(lange::<f64>(Norm::Fro, 0, 2, &[], 1), 0.);
        assert!(lange::<f64>(Norm::Max, 1, 2, &[1., f64::NAN], 1).is_nan());
    }

    #[test]
    fn test_lansy() {
        // 对称矩阵 [1 2; 2 -5]，另一三角填入无关值
        let upper = [1., 77., 2., -5.];
        let lower = [1., 2., 77., -5.];
        for (uplo, a) in [(Uplo::Upper, &upper), (Uplo::Lower, &lower)] {
            assert_eq!(lansy::<f64>(Norm::Max, uplo, 2, a, 2), 5.);
            assert_eq!(lansy::<f64>(Norm::One, uplo, 2, a, 2), 7.);
            assert_eq!(lansy::<f64>(Norm::Inf, uplo, 2, a, 2), 7.);
            assert!((lansy::<f64>(Norm::Fro, uplo, 2, a, 2) - 34f64.sqrt()).abs() < 1e-14);
        }
        assert_eq!(lansy::<f64>(Norm::Max, Uplo::General, 2, &upper, 2), 77.);
    }

    #[test]
    fn test_lacpy_laset() {
        let a = [1, 2, 3, 4, 5, 6, 7, 8, 9];
        let mut b = [0; 9];
        lacpy(Uplo::Upper, 3, 3, &a, 3, &mut b, 3);
        assert_eq!(b, [1, 0, 0, 4, 5, 0, 7, 8, 9]);
        lacpy(Uplo::General, 3, 3, &a, 3, &mut b, 3);
        assert_eq!(b, a);

        let mut c = [0; 6];
        laset(Uplo::Lower, 3, 2, -1, 1, &mut c, 3);
        assert_eq!(c, [1, -1, -1, 0, 1, -1]);
    }

    #[test]
    fn test_norm_parse() {
        assert_eq!("f".parse(), Ok(Norm::Fro));
        assert_eq!("1".parse(), Ok(Norm::One));
        assert!("x".parse::<Norm>().is_err());
    }
}
