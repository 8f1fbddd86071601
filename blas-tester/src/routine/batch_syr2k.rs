use super::{Phase, Report, enter, rate};
use crate::{
    BatchCheck, HarnessError, Params, Routine,
    buffer::{HostArena, MatrixView, too_large},
    cache::flush_cache,
    check::{Operand, OperandNorms, check_syr2k},
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

/// 设备上的批量 syr2k，所有批元素共享同一组参数。
pub struct BatchSyr2k;

impl Routine for BatchSyr2k {
    const NAME: &'static str = "batch-syr2k";

    fn run<T: Scalar>(params: &Params, device: &Device, run: bool) -> Result<Option<Report>, HarnessError> {
        enter(Self::NAME, Phase::Configuring);
        let &Params {
            layout,
            uplo,
            trans,
            n,
            k,
            batch,
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

        let mut a = HostArena::<T>::alloc("A", batch, size_a)?;
        let mut b = HostArena::<T>::alloc("B", batch, size_a)?;
        let mut c = HostArena::<T>::alloc("C", batch, size_c)?;
        let mut cref = HostArena::<T>::alloc("Cref", batch, size_c)?;
        // 设备内存必须比流活得久
        let da = a.device_mirror(device)?;
        let db = b.device_mirror(device)?;
        let dc = c.device_mirror(device)?;
        let stream = device.stream();
        let mut info = vec![0i64; batch];

        enter(Self::NAME, Phase::Generating);
        let mut larnv = Larnv::new(1, [0, 0, 0, 1])?;
        larnv.fill(a.as_mut_slice());
        larnv.fill(b.as_mut_slice());
        larnv.fill(c.as_mut_slice());
        // 整批 C 视为一个 minor × (batch·major) 矩阵
        lacpy(
            Uplo::General,
            c_view.minor(),
            batch * c_view.major(),
            c.as_slice(),
            ldc,
            cref.as_mut_slice(),
            ldc,
        );

        stream.memcpy_h2d(&da, a.as_slice())?;
        stream.memcpy_h2d(&db, b.as_slice())?;
        stream.memcpy_h2d(&dc, c.as_slice())?;
        stream.synchronize()?;

        let mut norms = OperandNorms::with_batch(batch);
        for s in 0..batch {
            let (minor, major) = (a_view.minor(), a_view.major());
            norms.push(Operand::A, lange(Norm::Fro, minor, major, a.element(s), lda));
            norms.push(Operand::B, lange(Norm::Fro, minor, major, b.element(s), ldb));
            norms.push(
                Operand::C,
                lansy(Norm::Fro, uplo.in_col_major(layout), n, c.element(s), ldc),
            );
        }
        if verbose >= 1 {
            log::info!("A {am}x{an}, ld={lda}, size={size_a}, batch={batch}");
            log::info!("B {am}x{an}, ld={ldb}, size={size_a}, batch={batch}");
            log::info!("C {n}x{n}, ld={ldc}, size={size_c}, batch={batch}");
            for s in 0..batch {
                log::info!(
                    "[{s}] norms A={:.2e} B={:.2e} C={:.2e}",
                    norms.get(Operand::A, s),
                    norms.get(Operand::B, s),
                    norms.get(Operand::C, s),
                );
            }
        }
        if verbose >= 2 {
            for s in 0..batch {
                log::info!("A[{s}] = {}", format_matrix(layout, am, an, a.element(s), lda));
                log::info!("B[{s}] = {}", format_matrix(layout, am, an, b.element(s), ldb));
                log::info!("C[{s}] = {}", format_matrix(layout, n, n, c.element(s), ldc));
            }
        }

        enter(Self::NAME, Phase::Executing);
        let pa = da.ptrs(size_a, batch);
        let pb = db.ptrs(size_a, batch);
        let pc = dc.ptrs(size_c, batch);
        flush_cache(params.cache);
        let start = Instant::now();
        blas::batch::syr2k(
            layout,
            &[uplo],
            &[trans],
            &[n],
            &[k],
            &[alpha],
            &pa,
            &[lda],
            &pb,
            &[ldb],
            &[beta],
            &pc,
            &[ldc],
            batch,
            &mut info,
            &stream,
        )?;
        stream.synchronize()?;
        let time = start.elapsed();

        let kernel_failures = info.iter().filter(|&&code| code != 0).count();
        for (s, code) in info.iter().enumerate().filter(|(_, code)| **code != 0) {
            log::warn!("{}: batch element {s} returned info {code}", Self::NAME)
        }

        let gflop = batch as f64 * flops::syr2k::<T>(n, k);
        let mut report = Report {
            time,
            gflops: rate(gflop, time),
            kernel_failures,
            ..Default::default()
        };

        let result = stream.memcpy_d2h(&dc);
        stream.synchronize()?;
        c.as_mut_slice().copy_from_slice(&result.take()?);
        if verbose >= 2 {
            for s in 0..batch {
                log::info!("C2[{s}] = {}", format_matrix(layout, n, n, c.element(s), ldc));
            }
        }

        if params.check || params.reference {
            enter(Self::NAME, Phase::Comparing);
            flush_cache(params.cache);
            // info 非 0 的元素 kernel 未执行，不参与比较
            let valid = (0..batch).filter(|&s| info[s] == 0).collect::<Vec<_>>();
            let start = Instant::now();
            for &s in &valid {
                cblas::syr2k(
                    layout,
                    uplo,
                    trans,
                    n,
                    k,
                    alpha,
                    a.element(s),
                    lda,
                    b.element(s),
                    ldb,
                    beta,
                    cref.element_mut(s),
                    ldc,
                )?;
            }
            let ref_time = start.elapsed();
            report.ref_time = Some(ref_time);
            report.ref_gflops = Some(rate(gflop, ref_time));

            if params.check {
                let check = valid
                    .iter()
                    .map(|&s| {
                        check_syr2k(
                            layout,
                            uplo,
                            n,
                            2 * k,
                            alpha,
                            beta,
                            norms.get(Operand::A, s),
                            norms.get(Operand::B, s),
                            norms.get(Operand::C, s),
                            cref.element(s),
                            ldc,
                            c.element(s),
                            ldc,
                        )
                    })
                    .collect::<BatchCheck>();
                report.check = Some(check);
            }
        }

        enter(Self::NAME, Phase::Reporting);
        log::debug!("{}<{}>: {report:?}", Self::NAME, T::NAME);
        enter(Self::NAME, Phase::Done);
        Ok(Some(report))
    }
}
