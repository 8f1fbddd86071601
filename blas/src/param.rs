use std::{fmt, str::FromStr};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Layout {
    #[default]
    ColMajor,
    RowMajor,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Uplo {
    Upper,
    #[default]
    Lower,
    General,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Op {
    #[default]
    NoTrans,
    Trans,
    ConjTrans,
}

impl Layout {
    /// 逻辑下标 `(i, j)` 在存储中的偏移。
    #[inline]
    pub const fn index(self, i: usize, j: usize, ld: usize) -> usize {
        match self {
            Self::ColMajor => i + j * ld,
            Self::RowMajor => i * ld + j,
        }
    }

    /// 存储 `rows × cols` 矩阵时 leading dimension 的下界。
    #[inline]
    pub const fn minor(self, rows: usize, cols: usize) -> usize {
        match self {
            Self::ColMajor => rows,
            Self::RowMajor => cols,
        }
    }

    #[inline]
    pub const fn major(self, rows: usize, cols: usize) -> usize {
        match self {
            Self::ColMajor => cols,
            Self::RowMajor => rows,
        }
    }
}

impl Uplo {
    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Self::Upper => Self::Lower,
            Self::Lower => Self::Upper,
            Self::General => Self::General,
        }
    }

    /// 同一块存储按列主序解释时对应的三角。
    ///
    /// 行主序的上三角就是列主序的下三角。
    #[inline]
    pub const fn in_col_major(self, layout: Layout) -> Self {
        match layout {
            Layout::ColMajor => self,
            Layout::RowMajor => self.flip(),
        }
    }

    /// 逻辑下标 `(i, j)` 是否位于该三角内。
    #[inline]
    pub const fn contains(self, i: usize, j: usize) -> bool {
        match self {
            Self::Upper => i <= j,
            Self::Lower => i >= j,
            Self::General => true,
        }
    }
}

impl Op {
    #[inline]
    pub const fn flip(self) -> Self {
        match self {
            Self::NoTrans => Self::Trans,
            Self::Trans | Self::ConjTrans => Self::NoTrans,
        }
    }
}

#[derive(thiserror::Error, Clone, PartialEq, Eq, Debug)]
#[error("unknown {what} \"{value}\"")]
pub struct ParseParamError {
    what: &'static str,
    value: String,
}

macro_rules! impl_param {
    ($ty:ident, $what:literal; $($variant:ident => $short:literal, $long:literal);+ $(;)?) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => $short,)+
                })
            }
        }

        impl FromStr for $ty {
            type Err = ParseParamError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($short | $long => Ok(Self::$variant),)+
                    _ => Err(ParseParamError {
                        what: $what,
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

impl_param!(Layout, "layout";
    ColMajor => "c", "colmajor";
    RowMajor => "r", "rowmajor";
);
impl_param!(Uplo, "uplo";
    Upper   => "u", "upper";
    Lower   => "l", "lower";
    General => "g", "general";
);
impl_param!(Op, "op";
    NoTrans   => "n", "notrans";
    Trans     => "t", "trans";
    ConjTrans => "c", "conjtrans";
);

#[test]
fn test_parse() {
    assert_eq!("RowMajor".parse(), Ok(Layout::RowMajor));
    assert_eq!("u".parse(), Ok(Uplo::Upper));
    assert_eq!("c".parse(), Ok(Op::ConjTrans));
    assert!("x".parse::<Uplo>().is_err());
    assert_eq!(Op::Trans.to_string(), "t");
}

#[test]
fn test_triangle() {
    // 行主序上三角 (0, 1) 与列主序下三角 (1, 0) 落在同一存储位置
    let ld = 4;
    assert_eq!(
        Layout::RowMajor.index(0, 1, ld),
        Layout::ColMajor.index(1, 0, ld)
    );
    assert_eq!(Uplo::Upper.in_col_major(Layout::RowMajor), Uplo::Lower);
    assert!(Uplo::Upper.contains(0, 1) && !Uplo::Upper.contains(1, 0));
    assert!(Uplo::Lower.contains(1, 0) && Uplo::Lower.contains(2, 2));
}
