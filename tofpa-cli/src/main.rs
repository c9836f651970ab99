mod options;
mod progress;

use anyhow::{bail, Result};
use clap::Parser;
use log::{info, warn};
use options::{Cli, Command as CliCmd, XY};
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tofpa::{
    export,
    record::{self, ObstacleRecord},
    shadow, DerReference, Diagnostics, Evaluator, TofpaParameters, TofpaSurface,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::init();

    let der = match (cli.der, cli.bearing, cli.runway_start, cli.runway_end) {
        (Some(XY(position)), Some(bearing), None, None) => {
            DerReference::new(position, cli.der_elevation, bearing)?
        }
        (None, _, Some(XY(start)), Some(XY(end))) => {
            DerReference::from_runway(start, end, cli.direction.into(), cli.der_elevation)?
        }
        _ => bail!("either --der and --bearing, or --runway-start and --runway-end, are required"),
    };
    let params = TofpaParameters::from(&cli.surface);
    let surface = TofpaSurface::build(der, params)?;

    let set = record::read_samples(BufReader::new(File::open(&cli.input)?))?;
    let samples = set.samples;
    info!(
        "read {} samples from {}, rejected {}",
        samples.len(),
        cli.input.display(),
        set.rejected.len()
    );

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.store(true, Ordering::SeqCst))?;
    }

    let pb = progress::make_progress_bar(cli.input.display().to_string(), samples.len() as u64);
    let tick = || pb.inc(1);
    let mut evaluator = Evaluator::new(&surface)
        .tolerance(cli.tolerance)
        .buffer(cli.obstacle_buffer)
        .cancel(&cancel)
        .progress(&tick);
    if let Some(min_height) = cli.min_obstacle_height {
        evaluator = evaluator.min_height(min_height);
    }
    let mut evaluation = evaluator.evaluate(&samples)?;
    pb.finish_and_clear();
    evaluation.diagnostics.skipped.extend(set.rejected);

    let cancelled = evaluation.diagnostics.cancelled();
    if cancelled > 0 {
        warn!("interrupted, {cancelled} samples were not evaluated");
    }

    report(&evaluation.diagnostics);

    let mut records: Vec<ObstacleRecord> =
        evaluation.results.iter().map(ObstacleRecord::from).collect();
    if cli.shadow {
        let statuses = shadow::analyze(&surface, &evaluation.results, cli.shadow_tolerance);
        records = records
            .into_iter()
            .zip(&statuses)
            .map(|(record, status)| record.with_shadow(status))
            .collect();
    }

    let mut out: Box<dyn Write> = match &cli.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match cli.cmd {
        CliCmd::Json => record::write_json(&records, &mut out)?,
        CliCmd::Csv => record::write_csv(&records, &mut out)?,
        CliCmd::Geojson => export::write_geojson(&surface, &records, &mut out)?,
    }
    out.flush()?;

    Ok(())
}

fn report(diagnostics: &Diagnostics) {
    eprintln!(
        "clear: {}, penetrates: {}, not applicable: {}, skipped: {}",
        diagnostics.clear,
        diagnostics.penetrates,
        diagnostics.not_applicable,
        diagnostics.skipped.len()
    );
}
