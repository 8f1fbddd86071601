use blas::{Layout, Op, Uplo};
use blas_tester::{DataType, Params, Report, RoutineKind};
use clap::Parser;
use device::{DEFAULT_MEMORY, Device};
use log::LevelFilter;
use num_complex::Complex64;
use std::{
    f64::consts::{E, PI},
    process::ExitCode,
};

/// BLAS rank-2 update tester.
#[derive(Parser, Debug)]
#[command(name = "tester", version)]
struct Cli {
    /// Routine to test: syr2, syr2k or batch-syr2k
    routine: RoutineKind,
    /// Data type: s, d, c or z
    #[arg(long, default_value = "d")]
    datatype: DataType,
    /// Matrix layout: c (column major) or r (row major)
    #[arg(long, default_value = "c")]
    layout: Layout,
    /// Triangle to update: u or l
    #[arg(long, default_value = "l")]
    uplo: Uplo,
    /// Operation on A and B: n or t
    #[arg(long, default_value = "n")]
    trans: Op,
    #[arg(short, default_value_t = 100)]
    n: usize,
    #[arg(short, default_value_t = 100)]
    k: usize,
    #[arg(long, default_value_t = 10)]
    batch: usize,
    #[arg(long, default_value_t = 0)]
    device: usize,
    /// Emulated device memory in MiB
    #[arg(long, default_value_t = DEFAULT_MEMORY >> 20)]
    memory: usize,
    /// Round leading dimensions up to a multiple of this
    #[arg(long, default_value_t = 1)]
    align: usize,
    #[arg(long, default_value_t = PI, allow_hyphen_values = true)]
    alpha: f64,
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    alpha_im: f64,
    #[arg(long, default_value_t = E, allow_hyphen_values = true)]
    beta: f64,
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    beta_im: f64,
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    incx: isize,
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    incy: isize,
    /// Cache size to flush before timing, in MiB
    #[arg(long, default_value_t = 20)]
    cache: usize,
    /// Skip the residual check
    #[arg(long)]
    no_check: bool,
    /// Run the reference implementation even without checking
    #[arg(long)]
    reference: bool,
    /// -v logs shapes and norms, -vv dumps matrices
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn params(&self) -> Params {
        Params {
            datatype: self.datatype,
            layout: self.layout,
            uplo: self.uplo,
            trans: self.trans,
            n: self.n,
            k: self.k,
            batch: self.batch,
            device: self.device,
            align: self.align,
            alpha: Complex64::new(self.alpha, self.alpha_im),
            beta: Complex64::new(self.beta, self.beta_im),
            incx: self.incx,
            incy: self.incy,
            verbose: self.verbose,
            cache: self.cache,
            check: !self.no_check,
            reference: self.reference,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let params = cli.params();
    let device = Device::with_memory(params.device, cli.memory.saturating_mul(1 << 20));
    log::info!("{device}");

    match cli.routine.run(&params, &device, true) {
        Ok(Some(report)) => {
            print_report(cli.routine, &params, &report);
            match report.okay() {
                Some(false) => ExitCode::FAILURE,
                _ => ExitCode::SUCCESS,
            }
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", cli.routine);
            ExitCode::FAILURE
        }
    }
}

fn print_report(routine: RoutineKind, params: &Params, report: &Report) {
    let opt = |v: Option<f64>, prec: usize| v.map_or("-".into(), |v| format!("{v:.prec$}"));
    println!(
        "{:<12} {:>4} {:>6} {:>4} {:>5} {:>6} {:>6} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>6}",
        "routine", "type", "layout", "uplo", "trans", "n", "k", "batch", "error", "time(ms)",
        "gflop/s", "ref(ms)", "ref gflop/s", "status",
    );
    let status = match report.okay() {
        Some(true) => "pass",
        Some(false) => "FAILED",
        None => "no check",
    };
    println!(
        "{:<12} {:>4} {:>6} {:>4} {:>5} {:>6} {:>6} {:>6} {:>10} {:>10.4} {:>10.4} {:>10} {:>10} {:>6}",
        routine.to_string(),
        params.datatype.to_string(),
        params.layout.to_string(),
        params.uplo.to_string(),
        params.trans.to_string(),
        params.n,
        params.k,
        params.batch,
        report.error().map_or("-".into(), |e| format!("{e:.2e}")),
        report.time.as_secs_f64() * 1e3,
        report.gflops,
        opt(report.ref_time.map(|t| t.as_secs_f64() * 1e3), 4),
        opt(report.ref_gflops, 4),
        status,
    );
    if report.kernel_failures > 0 {
        println!("{} batch element(s) rejected by the kernel", report.kernel_failures)
    }
}
