use serde::{Deserialize, Serialize};

use super::model::{Listing, ListingTable, OwnerType};
use super::parse::{self, PriceUnit};
use super::stats;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How missing cells are filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputation {
    /// Column median for numbers, column mode for text.
    #[default]
    Statistic,
    /// Carry the previous row's value forward. Leading gaps fall back to the
    /// column statistic.
    ForwardFill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub price_unit: PriceUnit,
    pub imputation: Imputation,
}

// ---------------------------------------------------------------------------
// RawListing – one row exactly as read from the source
// ---------------------------------------------------------------------------

/// A row of source text before any parsing. `None` means the cell was null
/// in a typed source (JSON / Parquet); CSV cells are always `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawListing {
    pub name: Option<String>,
    pub location: Option<String>,
    pub year: Option<String>,
    pub kilometers_driven: Option<String>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub owner_type: Option<String>,
    pub mileage: Option<String>,
    pub engine: Option<String>,
    pub power: Option<String>,
    pub price: Option<String>,
    pub new_price: Option<String>,
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Parsed but not yet imputed, stored column-wise.
#[derive(Default)]
struct Columns {
    name: Vec<Option<String>>,
    location: Vec<Option<String>>,
    year: Vec<Option<i64>>,
    kilometers_driven: Vec<Option<i64>>,
    fuel_type: Vec<Option<String>>,
    transmission: Vec<Option<String>>,
    owner_type: Vec<Option<OwnerType>>,
    mileage: Vec<Option<f64>>,
    engine: Vec<Option<f64>>,
    power: Vec<Option<f64>>,
    price: Vec<Option<f64>>,
    new_price: Vec<Option<f64>>,
}

impl Columns {
    fn parse(raw: &[RawListing], config: &CleaningConfig) -> Self {
        fn cell<T>(v: &Option<String>, f: impl FnOnce(&str) -> Option<T>) -> Option<T> {
            v.as_deref().and_then(f)
        }

        let mut c = Columns::default();
        for r in raw {
            c.name.push(cell(&r.name, parse::text));
            c.location.push(cell(&r.location, parse::text));
            c.year.push(cell(&r.year, parse::integer));
            c.kilometers_driven.push(cell(&r.kilometers_driven, parse::integer));
            c.fuel_type.push(cell(&r.fuel_type, parse::text));
            c.transmission.push(cell(&r.transmission, parse::text));
            c.owner_type.push(cell(&r.owner_type, parse::owner_type));
            c.mileage.push(cell(&r.mileage, parse::leading_number));
            c.engine.push(cell(&r.engine, parse::leading_number));
            c.power.push(cell(&r.power, parse::leading_number));
            c.price.push(cell(&r.price, |s| parse::price(s, config.price_unit)));
            c.new_price.push(cell(&r.new_price, parse::new_price));
        }
        c
    }
}

/// Turn raw rows into the immutable cleaned table.
///
/// Deterministic: the statistics used for filling are recomputed from `raw`
/// on every call, so the same input always yields the same table.
pub fn clean(raw: &[RawListing], config: &CleaningConfig) -> ListingTable {
    let c = Columns::parse(raw, config);
    let mode = config.imputation;

    let name = fill_text("Name", c.name, mode);
    // Brand always agrees with the cleaned Name, imputed or not.
    let brand: Vec<String> = name.iter().map(|n| parse::brand(n).unwrap_or_default()).collect();
    let location = fill_text("Location", c.location, mode);
    let fuel_type = fill_text("Fuel_Type", c.fuel_type, mode);
    let transmission = fill_text("Transmission", c.transmission, mode);
    let owner_type = fill("Owner_Type", c.owner_type, mode, |v| stats::mode(v), OwnerType::First);
    let year = fill_integer("Year", c.year, mode);
    let kilometers_driven = fill_integer("Kilometers_Driven", c.kilometers_driven, mode);
    let mileage = fill_decimal("Mileage", c.mileage, mode);
    let engine = fill_decimal("Engine", c.engine, mode);
    let power = fill_decimal("Power", c.power, mode);
    let price = fill_decimal("Price", c.price, mode);
    let new_price = fill_decimal("New_Price", c.new_price, mode);

    let mut rows = Vec::with_capacity(raw.len());
    for i in 0..raw.len() {
        rows.push(Listing {
            name: name[i].clone(),
            location: location[i].clone(),
            year: year[i],
            kilometers_driven: kilometers_driven[i],
            fuel_type: fuel_type[i].clone(),
            transmission: transmission[i].clone(),
            owner_type: owner_type[i],
            mileage: mileage[i],
            engine: engine[i],
            power: power[i],
            price: price[i],
            new_price: new_price[i],
            brand: brand[i].clone(),
        });
    }

    log::info!(
        "Cleaned {} listings (price unit {:?}, imputation {:?})",
        rows.len(),
        config.price_unit,
        config.imputation
    );
    ListingTable::from_listings(rows)
}

fn fill_decimal(column: &str, values: Vec<Option<f64>>, mode: Imputation) -> Vec<f64> {
    fill(column, values, mode, stats::median, 0.0)
}

fn fill_integer(column: &str, values: Vec<Option<i64>>, mode: Imputation) -> Vec<i64> {
    let statistic = |present: &[i64]| {
        let as_f64: Vec<f64> = present.iter().map(|&v| v as f64).collect();
        stats::median(&as_f64).map(|m| m.round() as i64)
    };
    fill(column, values, mode, statistic, 0)
}

fn fill_text(column: &str, values: Vec<Option<String>>, mode: Imputation) -> Vec<String> {
    fill(column, values, mode, |v| stats::mode(v), String::new())
}

/// Replace every `None` in `values`.
///
/// `statistic` is computed over the present values only. `empty` is used
/// when a column has no values at all.
fn fill<T, S>(column: &str, values: Vec<Option<T>>, mode: Imputation, statistic: S, empty: T) -> Vec<T>
where
    T: Clone,
    S: FnOnce(&[T]) -> Option<T>,
{
    let missing = values.iter().filter(|v| v.is_none()).count();
    if missing == 0 {
        return values.into_iter().flatten().collect();
    }

    let present: Vec<T> = values.iter().flatten().cloned().collect();
    let fallback = match statistic(&present) {
        Some(v) => v,
        None => {
            log::warn!("Column {column} has no usable values; filling {missing} cells with a default");
            empty
        }
    };
    log::debug!("Column {column}: imputing {missing} missing value(s) ({mode:?})");

    match mode {
        Imputation::Statistic => values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| fallback.clone()))
            .collect(),
        Imputation::ForwardFill => {
            let mut last: Option<T> = None;
            values
                .into_iter()
                .map(|v| match v {
                    Some(v) => {
                        last = Some(v.clone());
                        v
                    }
                    None => last.clone().unwrap_or_else(|| fallback.clone()),
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, year: &str, mileage: &str, price: &str, new_price: &str, fuel: &str) -> RawListing {
        RawListing {
            name: Some(name.into()),
            location: Some("Mumbai".into()),
            year: Some(year.into()),
            kilometers_driven: Some("50000".into()),
            fuel_type: Some(fuel.into()),
            transmission: Some("Manual".into()),
            owner_type: Some("First".into()),
            mileage: Some(mileage.into()),
            engine: Some("1197 CC".into()),
            power: Some("81.8 bhp".into()),
            price: Some(price.into()),
            new_price: Some(new_price.into()),
        }
    }

    fn sample() -> Vec<RawListing> {
        vec![
            raw("Maruti Swift VDI", "2014", "19.2 kmpl", "4.5", "Lakh", "Diesel"),
            raw("Honda City 1.5", "2016", "", "8.0", "10 Lakh", "Petrol"),
            raw("", "", "17.0 kmpl", "", "", ""),
            raw("Hyundai i20", "2018", "21.0 kmpl", "6.0", "8 Lakh", "Petrol"),
        ]
    }

    #[test]
    fn fills_numeric_with_median_after_parsing() {
        let table = clean(&sample(), &CleaningConfig::default());
        let rows = table.rows();
        assert_eq!(rows[0].mileage, 19.2);
        // median of {19.2, 17.0, 21.0}
        assert_eq!(rows[1].mileage, 19.2);
        // median of {450000, 800000, 600000}
        assert_eq!(rows[2].price, 600_000.0);
        // median of {2014, 2016, 2018}
        assert_eq!(rows[2].year, 2016);
    }

    #[test]
    fn lakh_only_new_price_is_imputed_with_scaled_median() {
        let table = clean(&sample(), &CleaningConfig::default());
        // present: 1_000_000 and 800_000
        assert_eq!(table.rows()[0].new_price, 900_000.0);
        assert_eq!(table.rows()[2].new_price, 900_000.0);
    }

    #[test]
    fn fills_text_with_mode_and_derives_brand() {
        let table = clean(&sample(), &CleaningConfig::default());
        let row = &table.rows()[2];
        assert_eq!(row.fuel_type, "Petrol");
        // Names are all distinct so the smallest wins the tie.
        assert_eq!(row.name, "Honda City 1.5");
        assert_eq!(row.brand, "Honda");
        assert_eq!(table.rows()[3].brand, "Hyundai");
    }

    #[test]
    fn brand_is_first_token_of_imputed_name() {
        let rows = vec![
            raw("", "2013", "18.0 kmpl", "2.5", "", "Diesel"),
            raw("Honda City", "2014", "17.0 kmpl", "5.0", "", "Petrol"),
            raw("Maruti Alto", "2015", "22.0 kmpl", "3.0", "", "Petrol"),
            raw("Maruti Swift", "2016", "21.0 kmpl", "4.0", "", "Petrol"),
            raw("", "2017", "20.0 kmpl", "4.5", "", "Petrol"),
        ];
        for imputation in [Imputation::Statistic, Imputation::ForwardFill] {
            let config = CleaningConfig {
                imputation,
                ..Default::default()
            };
            let table = clean(&rows, &config);
            for row in table.rows() {
                let first = row.name.split_whitespace().next().unwrap_or_default();
                assert_eq!(row.brand, first, "{imputation:?}: {}", row.name);
                assert!(!row.brand.is_empty());
            }
        }
        let table = clean(&rows, &CleaningConfig::default());
        // Name mode ties go to "Honda City", so the blank rows become Honda.
        assert_eq!(table.rows()[4].name, "Honda City");
        assert_eq!(table.rows()[4].brand, "Honda");
    }

    #[test]
    fn rupee_unit_leaves_price_alone() {
        let config = CleaningConfig {
            price_unit: PriceUnit::Rupee,
            ..Default::default()
        };
        let table = clean(&sample(), &config);
        assert_eq!(table.rows()[0].price, 4.5);
        // New_Price is always quoted in lakhs.
        assert_eq!(table.rows()[1].new_price, 1_000_000.0);
    }

    #[test]
    fn forward_fill_takes_previous_row() {
        let config = CleaningConfig {
            imputation: Imputation::ForwardFill,
            ..Default::default()
        };
        let table = clean(&sample(), &config);
        let rows = table.rows();
        assert_eq!(rows[1].mileage, 19.2);
        assert_eq!(rows[2].price, 800_000.0);
        assert_eq!(rows[2].year, 2016);
        assert_eq!(rows[2].name, "Honda City 1.5");
        // Leading gap falls back to the median.
        assert_eq!(rows[0].new_price, 900_000.0);
    }

    #[test]
    fn cleaning_is_idempotent() {
        let config = CleaningConfig::default();
        assert_eq!(clean(&sample(), &config), clean(&sample(), &config));
    }

    #[test]
    fn column_without_values_gets_default() {
        let mut rows = sample();
        for r in &mut rows {
            r.power = None;
        }
        let table = clean(&rows, &CleaningConfig::default());
        assert!(table.rows().iter().all(|r| r.power == 0.0));
    }
}
