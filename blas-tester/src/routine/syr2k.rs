use super::{Phase, Report, enter, rate};
use crate::{
    HarnessError, Params, Routine,
    buffer::{HostArena, MatrixView, too_large},
    cache::flush_cache,
    check::check_syr2k,
    flops,
};
use blas::{Op, Scalar, Uplo};
use device::Device;
use refblas::{
    cblas,
    lapack::{Larnv, Norm, lacpy, lange, lansy},
};
use std::time::Instant;
use test_utils::format_matrix;

/// 主机上的非批量 syr2k。
pub struct Syr2k;

impl Routine for Syr2k {
    const NAME: &'static str = "syr2k";

    fn run<T: Scalar>(params: &Params, _device: &Device, run: bool) -> Result<Option<Report>, HarnessError> {
        enter(Self::NAME, Phase::Configuring);
        let &Params {
            layout,
            uplo,
            trans,
            n,
            k,
            align,
            verbose,
            ..
        } = params;
        let alpha = params.alpha::<T>();
        let beta = params.beta::<T>();
        if !run {
            return Ok(None);
        }

        let (am, an) = match trans {
            Op::NoTrans => (n, k),
            _ => (k, n),
        };
        let a_view = MatrixView::aligned(layout, am, an, align).ok_or_else(|| too_large("A"))?;
        let c_view = MatrixView::aligned(layout, n, n, align).ok_or_else(|| too_large("C"))?;
        let (lda, ldb, ldc) = (a_view.ld, a_view.ld, c_view.ld);
        let size_a = a_view.size().ok_or_else(|| too_large("A"))?;
        let size_c = c_view.size().ok_or_else(|| too_large("C"))?;
        let mut a = HostArena::<T>::alloc("A", 1, size_a)?;
        let mut b = HostArena::<T>::alloc("B", 1, size_a)?;
        let mut c = HostArena::<T>::alloc("C", 1, size_c)?;
        let mut cref = HostArena::<T>::alloc("Cref", 1, size_c)?;

        enter(Self::NAME, Phase::Generating);
        let mut larnv = Larnv::new(1, [0, 0, 0, 1])?;
        larnv.fill(a.as_mut_slice());
        larnv.fill(b.as_mut_slice());
        larnv.fill(c.as_mut_slice());
        lacpy(Uplo::General, c_view.minor(), c_view.major(), c.as_slice(), ldc, cref.as_mut_slice(), ldc);

        let anorm = lange(Norm::Fro, a_view.minor(), a_view.major(), a.as_slice(), lda);
        let bnorm = lange(Norm::Fro, a_view.minor(), a_view.major(), b.as_slice(), ldb);
        let cnorm = lansy(Norm::Fro, uplo.in_col_major(layout), n, c.as_slice(), ldc);
        if verbose >= 1 {
            log::info!("A {am}x{an}, ld={lda}, size={size_a}, norm={anorm:.2e}");
            log::info!("B {am}x{an}, ld={ldb}, size={size_a}, norm={bnorm:.2e}");
            log::info!("C {n}x{n}, ld={ldc}, size={size_c}, norm={cnorm:.2e}");
        }
        if verbose >= 2 {
            log::info!("A = {}", format_matrix(layout, am, an, a.as_slice(), lda));
            log::info!("B = {}", format_matrix(layout, am, an, b.as_slice(), ldb));
            log::info!("C = {}", format_matrix(layout, n, n, c.as_slice(), ldc));
        }

        enter(Self::NAME, Phase::Executing);
        flush_cache(params.cache);
        let start = Instant::now();
        blas::syr2k(
            layout,
            uplo,
            trans,
            n,
            k,
            alpha,
            a.as_slice(),
            lda,
            b.as_slice(),
            ldb,
            beta,
            c.as_mut_slice(),
            ldc,
        )?;
        let time = start.elapsed();

        let gflop = flops::syr2k::<T>(n, k);
        let mut report = Report {
            time,
            gflops: rate(gflop, time),
            ..Default::default()
        };
        if verbose >= 2 {
            log::info!("C2 = {}", format_matrix(layout, n, n, c.as_slice(), ldc));
        }

        if params.check || params.reference {
            enter(Self::NAME, Phase::Comparing);
            flush_cache(params.cache);
            let start = Instant::now();
            cblas::syr2k(
                layout,
                uplo,
                trans,
                n,
                k,
                alpha,
                a.as_slice(),
                lda,
                b.as_slice(),
                ldb,
                beta,
                cref.as_mut_slice(),
                ldc,
            )?;
            let ref_time = start.elapsed();
            report.ref_time = Some(ref_time);
            report.ref_gflops = Some(rate(gflop, ref_time));

            if params.check {
                let check = check_syr2k(
                    layout,
                    uplo,
                    n,
                    2 * k,
                    alpha,
                    beta,
                    anorm,
                    bnorm,
                    cnorm,
                    cref.as_slice(),
                    ldc,
                    c.as_slice(),
                    ldc,
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
