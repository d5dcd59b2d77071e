use donordb::diagnostics::{Diagnostic, IngestReport};
use donordb::error::Error;
use donordb::parser::parse;
use donordb::registry::Registry;
use donordb::tier::Tier;
use rust_decimal_macros::dec;

const HEADER: &str = "user_id,firstname,lastname,full_name,email,\
    street_1,street_2,city,state,postal,membership_expiration_date,\
    transaction_id,type,actual_date,posted_date,payment_type,\
    response_meta,amount,gl_code";

fn row(
    user: u64,
    first: &str,
    last: &str,
    tx: u64,
    kind: &str,
    posted: &str,
    amount: &str,
) -> String {
    format!("{user},{first},{last},,,,,,,,,{tx},{kind},{posted},{posted},Credit Card,,{amount},4000")
}

fn load(sources: &[String]) -> (Registry, IngestReport) {
    let mut registry = Registry::default();
    let mut report = IngestReport::default();
    for source in sources {
        let input = format!("{}\n{}", HEADER, source);
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());
        registry.ingest(parse(rdr), &mut report).unwrap();
    }
    registry.seal();
    (registry, report)
}

fn dump(registry: &Registry) -> String {
    let mut output = Vec::<u8>::new();
    registry.serialize(&mut output).unwrap();
    String::from_utf8(output).unwrap()
}

#[test]
fn empty() {
    let (registry, report) = load(&[String::new()]);
    assert_eq!(0, report.accepted);
    assert_eq!(dec!(0), registry.total_contributions());
    assert!(registry.top_donor().is_none());
    assert_eq!(Err(Error::NoTransactions), registry.earliest_payment());
    assert_eq!("", dump(&registry));
}

#[test]
fn two_donor_scenario() {
    let (registry, report) = load(&[[
        row(1, "Alice", "Jones", 1, "Payment", "2023-01-10", "600"),
        row(1, "Alice", "Jones", 2, "Donation", "2023-02-01", "200"),
        row(1, "Alice", "Jones", 3, "Refund", "2023-02-15", "-100"),
        row(2, "Bob", "Smith", 4, "Payment", "2023-01-20", "50"),
    ]
    .join("\n")]);

    assert_eq!(4, report.accepted);
    assert_eq!(0, report.dropped);
    assert_eq!(dec!(750), registry.total_contributions());
    assert_eq!("Alice Jones", registry.top_donor().unwrap().name().full);
    assert_eq!(Ok(Tier::One), registry.donor(1).unwrap().tier());
    assert_eq!(Ok(Tier::Zero), registry.donor(2).unwrap().tier());

    assert_eq!(
        [
            "donor,name,email,payments,total,tier",
            "1,Alice Jones,,3,700,$500 - $1k",
            "2,Bob Smith,,1,50,$0 - $500",
            ""
        ]
        .join("\n"),
        dump(&registry)
    );
}

#[test]
fn tier_totals_reconcile() {
    let (registry, _) = load(&[[
        row(1, "Alice", "Jones", 1, "Payment", "2023-01-10", "600"),
        row(2, "Bob", "Smith", 2, "Payment", "2023-01-11", "3000"),
        row(3, "Carol", "Reed", 3, "Donation", "2023-01-12", "75"),
        row(3, "Carol", "Reed", 4, "Refund", "2023-01-13", "-25"),
    ]
    .join("\n")]);

    let stats = registry.tier_stats().unwrap();
    let sum: rust_decimal::Decimal = stats.values().map(|s| s.total).sum();
    assert_eq!(registry.total_contributions(), sum);

    let zero = &stats[&Tier::Zero];
    assert_eq!(1, zero.donors);
    assert_eq!(2, zero.payments);
    assert_eq!(dec!(50), zero.total);
}

#[test]
fn multi_source_ingestion() {
    let january = row(1, "Alice", "Jones", 1, "Payment", "2023-01-10", "100");
    let february = [
        row(1, "Alice", "Jones", 2, "Payment", "2023-02-10", "200"),
        // Same transaction ID as January's row, re-exported with a correction.
        row(1, "Alice", "Jones", 1, "Payment", "2023-01-10", "150"),
    ]
    .join("\n");

    let (registry, report) = load(&[january, february]);

    // The correction replaces the original, it is not double counted.
    assert_eq!(dec!(350), registry.donor(1).unwrap().total_contributions());
    assert_eq!(2, registry.num_transactions());
    assert!(matches!(
        report.diagnostics[..],
        [Diagnostic::DuplicateTransaction { id: 1, .. }]
    ));
}

#[test]
fn bad_rows_do_not_abort_the_load() {
    let (registry, report) = load(&[[
        row(1, "Alice", "Jones", 1, "Payment", "2023-01-10", "100"),
        // No dates at all.
        "2,Bob,Smith,,,,,,,,,2,Payment,,,Cash,,10,4000".to_string(),
        // Unknown contribution category.
        row(3, "Carol", "Reed", 3, "Membership", "2023-01-12", "10"),
        row(4, "Dan", "Ortiz", 4, "Payment", "2023-01-13", "40"),
    ]
    .join("\n")]);

    assert_eq!(2, report.accepted);
    assert_eq!(2, report.dropped);
    assert_eq!(2, registry.num_donors());
    assert_eq!(dec!(140), registry.total_contributions());
}

#[test]
fn date_queries_across_sources() {
    let (registry, _) = load(&[
        row(1, "Alice", "Jones", 1, "Payment", "2023-03-01", "10"),
        [
            row(2, "Bob", "Smith", 2, "Payment", "2023-01-15", "20"),
            row(2, "Bob", "Smith", 3, "Payment", "2023-02-01", "30"),
        ]
        .join("\n"),
    ]);

    let ids: Vec<u64> = registry.transactions_by_date().map(|tx| tx.id).collect();
    assert_eq!(vec![2, 3, 1], ids);
    assert_eq!(45, registry.timespan().unwrap().num_days());
}
