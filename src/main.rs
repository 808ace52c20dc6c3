//! iso-sim entry point: CLI wiring and config-driven run construction.

use std::process;

use clap::Parser;

use iso_sim::cli::Args;
use iso_sim::io::export::export_csv;
use iso_sim::runner::run_case;
use iso_sim::telemetry::init_tracing;

fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level, args.json_logs);

    let cfg = match args.load_case() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let case = match cfg.build() {
        Ok(case) => case,
        Err(errors) => {
            for e in &errors {
                eprintln!("{e}");
            }
            process::exit(1);
        }
    };

    let report = match run_case(case) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    println!("Engine:                {}", report.engine);
    println!("Final state:           {}", report.state);
    println!("\n{}", report.summary);

    if let Some(dir) = &args.export_dir {
        if let Err(e) = export_csv(&report.accumulator, &report.grid, dir) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Results written to {}", dir.display());
    }

    if let Some(e) = &report.error {
        eprintln!("error: {e}");
    }
    if !report.succeeded() {
        process::exit(1);
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let state = Arc::new(iso_sim::api::AppState { report });
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(iso_sim::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
