use super::{Phase, Report, enter, rate};
use crate::{
    HarnessError, Params, Routine,
    buffer::{HostArena, MatrixView, VectorView, too_large},
    cache::flush_cache,
    check::check_syr2k,
    flops,
};
use blas::{Layout, Op, Scalar, Uplo};
use device::Device;
use refblas::{
    cblas,
    lapack::{Larnv, Norm, lacpy, lansy},
};
use std::time::Instant;
use test_utils::format_matrix;

pub struct Syr2;

impl Routine for Syr2 {
    const NAME: &'static str = "syr2";

    fn run<T: Scalar>(params: &Params, _device: &Device, run: bool) -> Result<Option<Report>, HarnessError> {
        enter(Self::NAME, Phase::Configuring);
        let &Params {
            layout,
            uplo,
            n,
            incx,
            incy,
            align,
            verbose,
            ..
        } = params;
        let alpha = params.alpha::<T>();
        if !run {
            return Ok(None);
        }

        let a_view = MatrixView::aligned(layout, n, n, align).ok_or_else(|| too_large("A"))?;
        let lda = a_view.ld;
        let size_a = a_view.size().ok_or_else(|| too_large("A"))?;
        let size_x = VectorView { len: n, inc: incx }.size().ok_or_else(|| too_large("x"))?;
        let size_y = VectorView { len: n, inc: incy }.size().ok_or_else(|| too_large("y"))?;
        let mut a = HostArena::<T>::alloc("A", 1, size_a)?;
        let mut aref = HostArena::<T>::alloc("Aref", 1, size_a)?;
        let mut x = HostArena::<T>::alloc("x", 1, size_x)?;
        let mut y = HostArena::<T>::alloc("y", 1, size_y)?;

        enter(Self::NAME, Phase::Generating);
        let mut larnv = Larnv::new(1, [0, 0, 0, 1])?;
        larnv.fill(a.as_mut_slice());
        larnv.fill(x.as_mut_slice());
        larnv.fill(y.as_mut_slice());
        lacpy(Uplo::General, a_view.minor(), a_view.major(), a.as_slice(), lda, aref.as_mut_slice(), lda);

        // LAPACK 例程按列主序解释存储
        let anorm = lansy(Norm::Fro, uplo.in_col_major(layout), n, a.as_slice(), lda);
        let xnorm = cblas::nrm2(n, x.as_slice(), incx.unsigned_abs());
        let ynorm = cblas::nrm2(n, y.as_slice(), incy.unsigned_abs());
        if verbose >= 1 {
            log::info!("A n={n}, lda={lda}, size={size_a}, norm={anorm:.2e}");
            log::info!("x n={n}, inc={incx}, size={size_x}, norm={xnorm:.2e}");
            log::info!("y n={n}, inc={incy}, size={size_y}, norm={ynorm:.2e}");
        }
        if verbose >= 2 {
            log::info!("A = {}", format_matrix(layout, n, n, a.as_slice(), lda));
            log::info!("x = {}", format_matrix(Layout::ColMajor, size_x, 1, x.as_slice(), size_x.max(1)));
            log::info!("y = {}", format_matrix(Layout::ColMajor, size_y, 1, y.as_slice(), size_y.max(1)));
        }

        enter(Self::NAME, Phase::Executing);
        flush_cache(params.cache);
        let start = Instant::now();
        blas::syr2(layout, uplo, n, alpha, x.as_slice(), incx, y.as_slice(), incy, a.as_mut_slice(), lda)?;
        let time = start.elapsed();

        let gflop = flops::syr2::<T>(n);
        let mut report = Report {
            time,
            gflops: rate(gflop, time),
            ..Default::default()
        };
        if verbose >= 2 {
            log::info!("A2 = {}", format_matrix(layout, n, n, a.as_slice(), lda));
        }

        if params.check || params.reference {
            enter(Self::NAME, Phase::Comparing);
            // 参考实现没有向量版本，把 x、y 复制成 n×1 矩阵交给 syr2k
            let mut xx = HostArena::<T>::alloc("XX", 1, lda)?;
            let mut yy = HostArena::<T>::alloc("YY", 1, lda)?;
            cblas::copy(n, x.as_slice(), incx, xx.as_mut_slice(), 1);
            cblas::copy(n, y.as_slice(), incy, yy.as_mut_slice(), 1);

            flush_cache(params.cache);
            let start = Instant::now();
            // 对称矩阵的行主序存储就是列主序的另一半三角
            cblas::syr2k(
                Layout::ColMajor,
                uplo.in_col_major(layout),
                Op::NoTrans,
                n,
                1,
                alpha,
                xx.as_slice(),
                lda,
                yy.as_slice(),
                lda,
                T::one(),
                aref.as_mut_slice(),
                lda,
            )?;
            let ref_time = start.elapsed();
            report.ref_time = Some(ref_time);
            report.ref_gflops = Some(rate(gflop, ref_time));
            if verbose >= 2 {
                log::info!("Aref = {}", format_matrix(layout, n, n, aref.as_slice(), lda));
            }

            if params.check {
                let check = check_syr2k(
                    layout,
                    uplo,
                    n,
                    2,
                    alpha,
                    T::one(),
                    xnorm,
                    ynorm,
                    anorm,
                    aref.as_slice(),
                    lda,
                    a.as_slice(),
                    lda,
                );
                report.check = Some([check].into_iter().collect());
            }
        }

        enter(Self::NAME, Phase::Reporting);
        log::debug!("{}<{}>: {report:?}", Self::NAME, T::NAME);
        enter(Self::NAME, Phase::Done);
        Ok(Some(report))
    }
}
