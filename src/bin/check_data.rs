use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate};
use macro_overlay_lib::core::timeseries::month_end;
use macro_overlay_lib::models::{DataPoint, Frequency, RawSeries, Unit};
use macro_overlay_lib::{ColumnId, MacroPipeline, PipelineConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Diagnostic run over a synthetic data set: coverage per column, latest
/// values and the regime table for the last year.
///
/// `--json` prints the score table instead of the text report.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let as_json = std::env::args().any(|a| a == "--json");
    let config = PipelineConfig::from_env().context("Failed to load pipeline config")?;

    let end = NaiveDate::from_ymd_opt(2024, 6, 30).context("invalid end date")?;
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).context("invalid start date")?;
    let raw = synthetic_inputs(start, end, 42);
    info!(series = raw.len(), %start, %end, "synthetic inputs generated");

    let pipeline = MacroPipeline::build(raw, config);
    let window_start = end - Duration::days(365);
    let view = pipeline.window(window_start, end)?;
    let scores = pipeline.scores(view.window())?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&scores)?);
        return Ok(());
    }

    println!("\n🔍 Coverage ({} rows)", pipeline.panel().len());
    println!("{:<16} | {:<8} | {:<12}", "Column", "Present", "First");
    println!("{}", "-".repeat(42));
    for id in pipeline.panel().column_ids() {
        let values = pipeline.panel().column(id).unwrap_or_default();
        let present = values.iter().filter(|v| v.is_some()).count();
        let first = values
            .iter()
            .position(Option::is_some)
            .map(|i| pipeline.panel().index()[i].to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<16} | {:<8} | {:<12}", id.label(), present, first);
    }

    let selection: Vec<ColumnId> = view.selectable_columns();
    println!("\n📌 Latest ({} ~ {})", window_start, end);
    for item in view.snapshot(&selection) {
        println!("  {:<16} {:>18}  ({})", item.column, item.formatted, item.date);
    }

    println!("\n📊 Regime");
    for asset in &scores.assets {
        match asset.latest() {
            Some(p) => println!(
                "  {:<10} composite {:+} (trend {:?}, macro {:?}) on {}",
                asset.label, p.composite, p.trend, p.macro_score, p.date
            ),
            None => println!("  {:<10} no score", asset.label),
        }
        for marker in &asset.markers {
            println!("    {} {:+} -> {:+}", marker.date, marker.previous, marker.new);
        }
    }

    println!("\nDone.");
    Ok(())
}

/// Random walks shaped like the real inputs: daily prices, month-end M2 and
/// CPI, and a policy rate that only moves on a few dates.
fn synthetic_inputs(start: NaiveDate, end: NaiveDate, seed: u64) -> Vec<RawSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    let days: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
    let business: Vec<NaiveDate> = days.iter().copied().filter(|d| d.weekday().num_days_from_monday() < 5).collect();

    let mut walk = |level: f64, vol: f64, dates: &[NaiveDate]| -> Vec<DataPoint> {
        let mut value = level;
        dates
            .iter()
            .map(|d| {
                value *= 1.0 + rng.gen_range(-vol..vol);
                DataPoint::new(*d, value)
            })
            .collect()
    };

    let fx = walk(1150.0, 0.004, &business);
    let gold = walk(1280.0, 0.008, &business);
    let kodex = walk(28000.0, 0.012, &business);
    let bond = walk(2.0, 0.01, &business);

    let month_ends: Vec<NaiveDate> = days.iter().copied().filter(|d| *d == month_end(*d)).collect();
    let mut m2_level = 2_700_000.0;
    let mut cpi_level = 104.0;
    let mut m2 = Vec::new();
    let mut cpi = Vec::new();
    for d in &month_ends {
        m2_level *= 1.0 + rng.gen_range(0.0..0.012);
        cpi_level *= 1.0 + rng.gen_range(-0.001..0.005);
        m2.push(DataPoint::new(*d, m2_level));
        cpi.push(DataPoint::new(*d, cpi_level));
    }

    let rate: Vec<DataPoint> = [(2019, 1, 1, 1.75), (2020, 3, 17, 0.75), (2021, 8, 26, 0.75), (2022, 7, 13, 2.25), (2023, 1, 13, 3.5)]
        .iter()
        .filter_map(|(y, m, d, v)| NaiveDate::from_ymd_opt(*y, *m, *d).map(|date| DataPoint::new(date, *v)))
        .collect();

    vec![
        RawSeries::new("USD/KRW Close", Frequency::Daily, fx).with_unit(Unit::KrwPerUsd),
        RawSeries::new("Gold", Frequency::Daily, gold).with_unit(Unit::Usd),
        RawSeries::new("KODEX 200 Adj Close", Frequency::Daily, kodex).with_unit(Unit::Krw),
        RawSeries::new("Bond10", Frequency::Daily, bond).with_unit(Unit::Percent),
        RawSeries::new("060Y002", Frequency::Monthly, m2).with_unit(Unit::KrwBillions),
        RawSeries::new("CPI", Frequency::Monthly, cpi).with_unit(Unit::Index),
        RawSeries::new("722Y001", Frequency::Daily, rate).with_unit(Unit::Percent),
    ]
}
