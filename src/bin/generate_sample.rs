use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use clap::Parser;
use parquet::arrow::ArrowWriter;

use used_car_explorer::data::loader::REQUIRED_COLUMNS;

/// Seeded SplitMix64 stream; the same seed always yields the same file.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, 1)`.
    fn unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }

    fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}

/// Write a deliberately messy used-car listings file for trying the pipeline
#[derive(Debug, Parser)]
#[command(name = "generate_sample")]
#[command(version, about, long_about = None)]
struct Args {
    /// Output file; the extension (.csv, .parquet or .pq) picks the format
    #[arg(default_value = "used_cars_sample.csv")]
    output: PathBuf,

    /// Number of listings to write
    #[arg(short, long, default_value_t = 500)]
    rows: usize,

    /// Random seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

/// (name, engine CC, power bhp, mileage kmpl, new price in lakhs)
const MODELS: [(&str, f64, f64, f64, f64); 10] = [
    ("Maruti Swift VDI", 1248.0, 74.0, 22.9, 7.1),
    ("Maruti Wagon R LXI CNG", 998.0, 58.2, 26.6, 4.9),
    ("Hyundai Creta 1.6 CRDi SX Option", 1582.0, 126.2, 19.7, 16.1),
    ("Hyundai i20 Asta 1.2", 1197.0, 81.8, 18.5, 8.4),
    ("Honda City 1.5 V MT", 1497.0, 117.3, 17.4, 11.2),
    ("Honda Jazz V", 1199.0, 88.7, 18.2, 8.6),
    ("Toyota Innova Crysta 2.8 ZX AT", 2755.0, 171.5, 11.4, 25.3),
    ("Mahindra XUV500 W8 2WD", 2179.0, 140.0, 15.1, 15.8),
    ("BMW 3 Series 320d", 1995.0, 184.0, 22.7, 47.3),
    ("Audi A4 2.0 TDI", 1968.0, 187.7, 17.1, 52.1),
];

const LOCATIONS: [&str; 8] = ["Mumbai", "Pune", "Chennai", "Coimbatore", "Hyderabad", "Jaipur", "Kochi", "Delhi"];
const FUELS: [&str; 3] = ["Diesel", "Petrol", "CNG"];
const TRANSMISSIONS: [&str; 2] = ["Manual", "Automatic"];
const OWNERS: [&str; 4] = ["First", "Second", "Third", "Fourth & Above"];

/// One row of source text in `REQUIRED_COLUMNS` order; `None` is a blank cell.
fn generate_row(rng: &mut SampleRng) -> Vec<Option<String>> {
    let (name, engine, power, mileage, new_lakh) =
        MODELS[rng.below(MODELS.len())];
    let year = 2005 + rng.below(15) as i64;
    let age = (2020 - year) as f64;
    let km = (age * rng.range(6_000.0, 14_000.0)).round() as i64 + 1_000;
    let owner = if age > 8.0 { rng.pick(&OWNERS) } else { rng.pick(&OWNERS[..2]) };
    let price_lakh = (new_lakh * 0.88f64.powf(age) * rng.range(0.85, 1.15) * 100.0).round() / 100.0;
    let fuel = if name.contains("CNG") { "CNG" } else { rng.pick(&FUELS[..2]) };

    let location = rng.pick(&LOCATIONS);
    let transmission = rng.pick(&TRANSMISSIONS);
    let mileage = mileage * rng.range(0.95, 1.05);

    let mut blank_or = |p: f64, v: String| if rng.chance(p) { None } else { Some(v) };
    let owner = blank_or(0.02, owner.to_string());
    let mileage = blank_or(0.03, format!("{mileage:.1} kmpl"));
    let engine = blank_or(0.03, format!("{engine:.0} CC"));
    let price = blank_or(0.02, format!("{price_lakh:.2}"));

    let power = if rng.chance(0.04) {
        "null bhp".to_string()
    } else {
        format!("{power:.1} bhp")
    };
    let new_price = if rng.chance(0.85) {
        None
    } else if rng.chance(0.05) {
        Some("Lakh".to_string())
    } else {
        Some(format!("{new_lakh:.2} Lakh"))
    };

    vec![
        Some(name.to_string()),
        Some(location.to_string()),
        Some(year.to_string()),
        Some(km.to_string()),
        Some(fuel.to_string()),
        Some(transmission.to_string()),
        owner,
        mileage,
        engine,
        Some(power),
        price,
        new_price,
    ]
}

fn write_csv(path: &Path, rows: &[Vec<Option<String>>]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    let mut header = vec![String::new()];
    header.extend(REQUIRED_COLUMNS.iter().map(|c| c.to_string()));
    writer.write_record(&header)?;
    for (i, row) in rows.iter().enumerate() {
        let mut record = vec![i.to_string()];
        record.extend(row.iter().map(|c| c.clone().unwrap_or_default()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Vec<Option<String>>]) -> Result<()> {
    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();
    for (c, name) in REQUIRED_COLUMNS.iter().enumerate() {
        let cells = rows.iter().map(|r| r[c].as_deref());
        if *name == "Year" || *name == "Kilometers_Driven" {
            let ints: Int64Array = cells.map(|s| s.and_then(|v| v.parse::<i64>().ok())).collect();
            fields.push(Field::new(*name, DataType::Int64, true));
            columns.push(Arc::new(ints));
        } else {
            let strings: StringArray = cells.collect();
            fields.push(Field::new(*name, DataType::Utf8, true));
            columns.push(Arc::new(strings));
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let mut rng = SampleRng(args.seed);
    let rows: Vec<Vec<Option<String>>> = (0..args.rows).map(|_| generate_row(&mut rng)).collect();
    let blanks = rows.iter().flatten().filter(|c| c.is_none()).count();
    log::debug!("Generated {} rows with {} blank cells (seed {})", rows.len(), blanks, args.seed);

    let output = &args.output;
    match output.extension().and_then(|e| e.to_str()) {
        Some("csv") => write_csv(output, &rows)?,
        Some("parquet") | Some("pq") => write_parquet(output, &rows)?,
        _ => bail!("output must end in .csv, .parquet or .pq: {}", output.display()),
    }

    log::info!("Wrote {} listings to {}", rows.len(), output.display());
    println!("Wrote {} listings to {}", rows.len(), output.display());
    Ok(())
}
