mod config;
mod file_source;
mod logging;

use std::io::Write as _;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use color_eyre::eyre::{Context, Result};

use config::CliConfig;
use file_source::FileSource;
use goesrecv_core::{ChannelPublisher, Demodulator, StatsRecord};
use logging::{LogEvent, StatsEvent, StructuredLogger, SummaryEvent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Demodulate a raw I/Q capture against a GOES LRIT/HRIT profile", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<String>,

    /// Raw interleaved-f32 I/Q input file (overrides config).
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Raw soft-bit (i8) output file; defaults to stdout (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => CliConfig::from_file(path)
            .wrap_err_with(|| format!("failed to load config from {path}"))?,
        None => CliConfig::default(),
    };

    if let Some(input) = args.input {
        config.terminal.input = Some(input);
    }
    if let Some(output) = args.output {
        config.terminal.output = Some(output);
    }

    let mut logger = StructuredLogger::new(&config.terminal.logging)?;

    let input_path = config
        .terminal
        .input
        .clone()
        .ok_or_else(|| color_eyre::eyre::eyre!("no input file: pass --input or set terminal.input"))?;

    let mut demod = Demodulator::new(&config.demodulator).wrap_err("invalid demodulator configuration")?;

    let source = FileSource::open(&input_path, config.demodulator.queue.block_size)
        .wrap_err_with(|| format!("failed to open input file {}", input_path.display()))?;

    let mut sink: Box<dyn std::io::Write> = match &config.terminal.output {
        Some(path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path).wrap_err_with(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    logger.log(LogEvent::Info {
        message: format!("demodulating {}", input_path.display()),
    })?;

    // The core spawns a dedicated stats-publisher worker that snapshots
    // `SharedMetrics` on its own ~1s cadence; here we just drain what it
    // publishes onto a background thread so it never stalls the soft-bit
    // drain loop below.
    let (stats_publisher, stats_rx) = ChannelPublisher::<StatsRecord>::new(16);
    demod.set_stats_publisher(Box::new(stats_publisher));

    let logger = Arc::new(Mutex::new(logger));
    let stats_logger = Arc::clone(&logger);
    let stats_thread = std::thread::spawn(move || {
        while let Ok(record) = stats_rx.recv() {
            let _ = stats_logger
                .lock()
                .unwrap()
                .log(LogEvent::Stats(StatsEvent::from_snapshot(record)));
        }
    });

    let soft_bits = demod.soft_bits_queue();
    demod.start(Box::new(source));

    let mut total: u64 = 0;
    while let Some(block) = soft_bits.pop_for_read() {
        let bytes: Vec<u8> = block.as_slice().iter().map(|&b| b as u8).collect();
        sink.write_all(&bytes)?;
        total += block.len() as u64;
    }
    sink.flush()?;
    demod.stop();
    stats_thread.join().expect("stats thread panicked");

    let mut logger = Arc::try_unwrap(logger)
        .unwrap_or_else(|_| panic!("stats thread still holds the logger after join"))
        .into_inner()
        .unwrap();
    logger.log(LogEvent::Summary(SummaryEvent {
        timestamp: chrono::Utc::now(),
        duration_secs: logger.elapsed(),
        total_soft_bits: total,
    }))?;

    Ok(())
}
