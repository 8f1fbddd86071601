use blas::Layout;
use num_traits::Float;
use std::fmt::{self, Write};

/// 返回最大绝对误差和相对于 `ans` 的整体相对误差。
pub fn diff<T: Float>(result: &[T], ans: &[T]) -> (f64, f64) {
    assert_eq!(result.len(), ans.len());
    let mut max_abs_diff = 0.;
    let mut up = 0.;
    let mut down = 0.;
    for (r, a) in result.iter().zip(ans) {
        let r = r.to_f64().unwrap_or(f64::NAN);
        let a = a.to_f64().unwrap_or(f64::NAN);
        let diff = (r - a).abs();
        max_abs_diff = max_abs_diff.max(diff);
        up += diff;
        down += a.abs();
    }
    (max_abs_diff, up / down)
}

/// 按逻辑行列格式化矩阵，与存储顺序无关。
pub fn format_matrix<T: fmt::LowerExp>(
    layout: Layout,
    rows: usize,
    cols: usize,
    buf: &[T],
    ld: usize,
) -> String {
    let mut ans = format!("<{rows}x{cols}>\n");
    for i in 0..rows {
        for j in 0..cols {
            let _ = write!(ans, "{:.3e} ", buf[layout.index(i, j, ld)]);
        }
        ans.push('\n')
    }
    ans
}

#[test]
fn test_format() {
    let array = [
        1., 2., 3., //
        4., 5., 6., //
    ];
    let col = format_matrix(Layout::ColMajor, 3, 2, &array, 3);
    let row = format_matrix(Layout::RowMajor, 3, 2, &[1., 4., 2., 5., 3., 6.], 2);
    assert_eq!(col, row);
    assert!(col.starts_with("<3x2>\n1.000e0 4.000e0 \n"));
}

#[test]
fn test_diff() {
    let (max, rel) = diff(&[1f32, 2., 4.], &[1., 2., 3.]);
    assert_eq!(max, 1.);
    assert!((rel - 1. / 6.).abs() < 1e-12);
}
