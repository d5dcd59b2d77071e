use clap::Parser;
use donordb::diagnostics::IngestReport;
use donordb::parser::parse;
use donordb::registry::Registry;

#[derive(Parser)]
struct Cli {
    /// Donation export files (CSV), ingested in the order given.
    #[clap(required = true)]
    inputs: Vec<String>,
    /// Log the N largest donors at info level.
    #[clap(long, default_value_t = 10)]
    top: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut registry = Registry::default();
    let mut report = IngestReport::default();
    for input in &cli.inputs {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(input)?;
        registry.ingest(parse(rdr), &mut report)?;
    }
    registry.seal();

    log::info!(
        "ingested {} rows ({} dropped) into {} donor ledgers",
        report.accepted,
        report.dropped,
        registry.num_donors()
    );
    if let Ok(timespan) = registry.timespan() {
        log::info!(
            "payments span {} days ({} to {})",
            timespan.num_days(),
            registry.earliest_payment()?,
            registry.latest_payment()?
        );
    }
    for donor in registry.top_donors(cli.top) {
        log::info!(
            "{}: ${:.2} across {} transactions",
            donor.name().full,
            donor.total_contributions(),
            donor.num_payments()
        );
    }
    match registry.tier_stats() {
        Ok(stats) => {
            for tier_stats in stats.values() {
                log::info!("{}", tier_stats);
            }
        }
        Err(err) => log::warn!("tier statistics unavailable: {}", err),
    }

    registry.serialize(std::io::stdout())
}
