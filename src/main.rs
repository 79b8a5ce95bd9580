use anyhow::{Context, Result};
use clap::Parser;
use qkdsim::distill::bit_string;
use qkdsim::{
    Decision, Protocol, QkdSimulator, SimulationConfig, SimulationOutcome, TransmissionRecord,
};
use std::fmt::Display;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Simulate BB84 or E91 key distribution with an optional intercept-resend eavesdropper.
#[derive(Parser, Debug)]
#[command(name = "qkdsim", version, about)]
struct Cli {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to run (bb84 | e91)
    #[arg(short, long)]
    protocol: Option<Protocol>,

    /// Number of qubits (BB84) or entangled pairs (E91)
    #[arg(short = 'n', long)]
    transmissions: Option<usize>,

    /// Fraction of the sifted key revealed for QBER estimation
    #[arg(long)]
    sample_fraction: Option<f64>,

    /// QBER above which the run aborts
    #[arg(long)]
    threshold: Option<f64>,

    /// Enable the intercept-resend eavesdropper
    #[arg(long)]
    eve: bool,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Number of transmissions to print in detail
    #[arg(long)]
    show: Option<usize>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => SimulationConfig::default(),
        };

        if let Some(protocol) = self.protocol {
            config.protocol = protocol;
        }
        if let Some(n) = self.transmissions {
            config.transmissions = n;
        }
        if let Some(fraction) = self.sample_fraction {
            config.sample_fraction = fraction;
        }
        if let Some(threshold) = self.threshold {
            config.qber_threshold = threshold;
        }
        if self.eve {
            config.eavesdropper = true;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(show) = self.show {
            config.show_transmissions = show;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "qkdsim=debug" } else { "qkdsim=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_records<B: Display + PartialEq>(records: &[TransmissionRecord<B>], limit: usize) {
    if limit == 0 {
        return;
    }
    println!(
        "{:>5} | {:>5} {:>9} | {:>9} {:>5} | {:>9} {:>5} | match",
        "idx", "A bit", "A basis", "B basis", "B bit", "E basis", "E bit"
    );
    for r in records.iter().take(limit) {
        let (eve_basis, eve_bit) = match &r.eavesdropper {
            Some(eve) => (eve.basis.to_string(), (eve.bit as u8).to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        println!(
            "{:>5} | {:>5} {:>9} | {:>9} {:>5} | {:>9} {:>5} | {}",
            r.index,
            r.sender_bit as u8,
            r.sender_basis.to_string(),
            r.receiver_basis.to_string(),
            r.receiver_bit as u8,
            eve_basis,
            eve_bit,
            if r.bases_match() { "yes" } else { "" }
        );
    }
    if records.len() > limit {
        println!("  ... {} more", records.len() - limit);
    }
    println!();
}

fn print_report(config: &SimulationConfig, outcome: &SimulationOutcome) {
    println!(
        "{} with {} transmissions, eavesdropper {}",
        outcome.protocol(),
        config.transmissions,
        if config.eavesdropper { "ON" } else { "OFF" }
    );
    println!();

    match outcome {
        SimulationOutcome::Bb84(run) => print_records(&run.records, config.show_transmissions),
        SimulationOutcome::E91(run) => print_records(&run.records, config.show_transmissions),
    }

    let estimate = outcome.estimate();
    let summary = outcome.summary();
    println!("Sifted length:        {}", summary.sifted_length);
    println!("Sample size:          {}", estimate.sample_size());
    println!(
        "Sample QBER:          {:.4} ({} / {})",
        estimate.qber,
        estimate.mismatches,
        estimate.sample_size()
    );

    match (estimate.decision, outcome.key()) {
        (Decision::Proceed, Some(key)) => {
            println!("Decision:             proceed (QBER <= {})", estimate.threshold);
            println!("Raw key length:       {}", key.sender_raw.len());
            println!("Raw key (sender):     {}", bit_string(&key.sender_raw));
            println!("Raw key (receiver):   {}", bit_string(&key.receiver_raw));
            println!(
                "Raw keys match:       {}",
                if key.keys_match {
                    "yes"
                } else {
                    "no (reconciliation required)"
                }
            );
            if key.final_key.is_empty() {
                println!("Final key:            <empty>");
            } else {
                println!("Final key (SHA-256):  {}", key.final_key);
            }
        }
        _ => {
            println!(
                "Decision:             ABORT (QBER > {}), possible eavesdropping",
                estimate.threshold
            );
        }
    }

    println!();
    println!("Intercepted:          {}", summary.intercepted);
    println!(
        "Full sifted QBER:     {:.4} ({} / {})",
        summary.full_qber, summary.full_mismatches, summary.sifted_length
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let print_config = cli.print_config;

    let config = cli.into_config()?;
    if print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let simulator = QkdSimulator::new(config).context("invalid configuration")?;
    let outcome = simulator.run().context("protocol run failed")?;
    print_report(simulator.config(), &outcome);
    Ok(())
}
