use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OwnerType – ordered ownership history
// ---------------------------------------------------------------------------

/// How many owners a car has had. Ordering follows the domain, not the
/// lexical order of the labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OwnerType {
    #[serde(rename = "First")]
    First,
    #[serde(rename = "Second")]
    Second,
    #[serde(rename = "Third")]
    Third,
    #[serde(rename = "Fourth & Above")]
    FourthAndAbove,
}

impl OwnerType {
    pub const ALL: [OwnerType; 4] = [
        OwnerType::First,
        OwnerType::Second,
        OwnerType::Third,
        OwnerType::FourthAndAbove,
    ];

    /// The label used in the source data.
    pub fn label(self) -> &'static str {
        match self {
            OwnerType::First => "First",
            OwnerType::Second => "Second",
            OwnerType::Third => "Third",
            OwnerType::FourthAndAbove => "Fourth & Above",
        }
    }
}

impl fmt::Display for OwnerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OwnerType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        OwnerType::ALL
            .into_iter()
            .find(|o| o.label().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

// ---------------------------------------------------------------------------
// Listing – one row of the cleaned table
// ---------------------------------------------------------------------------

/// A single vehicle listing after cleaning. Every field is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Kilometers_Driven")]
    pub kilometers_driven: i64,
    #[serde(rename = "Fuel_Type")]
    pub fuel_type: String,
    #[serde(rename = "Transmission")]
    pub transmission: String,
    #[serde(rename = "Owner_Type")]
    pub owner_type: OwnerType,
    /// kmpl
    #[serde(rename = "Mileage")]
    pub mileage: f64,
    /// CC
    #[serde(rename = "Engine")]
    pub engine: f64,
    /// bhp
    #[serde(rename = "Power")]
    pub power: f64,
    #[serde(rename = "Price")]
    pub price: f64,
    #[serde(rename = "New_Price")]
    pub new_price: f64,
    #[serde(rename = "Brand")]
    pub brand: String,
}

// ---------------------------------------------------------------------------
// Column selectors
// ---------------------------------------------------------------------------

/// Numeric columns that can be ranged over or aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NumericColumn {
    Price,
    Mileage,
    Engine,
    Power,
    KilometersDriven,
    Year,
    NewPrice,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 7] = [
        NumericColumn::Price,
        NumericColumn::Mileage,
        NumericColumn::Engine,
        NumericColumn::Power,
        NumericColumn::KilometersDriven,
        NumericColumn::Year,
        NumericColumn::NewPrice,
    ];

    pub fn value(self, row: &Listing) -> f64 {
        match self {
            NumericColumn::Price => row.price,
            NumericColumn::Mileage => row.mileage,
            NumericColumn::Engine => row.engine,
            NumericColumn::Power => row.power,
            NumericColumn::KilometersDriven => row.kilometers_driven as f64,
            NumericColumn::Year => row.year as f64,
            NumericColumn::NewPrice => row.new_price,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::Price => "Price",
            NumericColumn::Mileage => "Mileage",
            NumericColumn::Engine => "Engine",
            NumericColumn::Power => "Power",
            NumericColumn::KilometersDriven => "Kilometers_Driven",
            NumericColumn::Year => "Year",
            NumericColumn::NewPrice => "New_Price",
        }
    }
}

/// Text columns with a finite set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum CategoricalColumn {
    Name,
    Location,
    FuelType,
    Transmission,
    OwnerType,
    Brand,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 6] = [
        CategoricalColumn::Name,
        CategoricalColumn::Location,
        CategoricalColumn::FuelType,
        CategoricalColumn::Transmission,
        CategoricalColumn::OwnerType,
        CategoricalColumn::Brand,
    ];

    pub fn value(self, row: &Listing) -> &str {
        match self {
            CategoricalColumn::Name => &row.name,
            CategoricalColumn::Location => &row.location,
            CategoricalColumn::FuelType => &row.fuel_type,
            CategoricalColumn::Transmission => &row.transmission,
            CategoricalColumn::OwnerType => row.owner_type.label(),
            CategoricalColumn::Brand => &row.brand,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CategoricalColumn::Name => "Name",
            CategoricalColumn::Location => "Location",
            CategoricalColumn::FuelType => "Fuel_Type",
            CategoricalColumn::Transmission => "Transmission",
            CategoricalColumn::OwnerType => "Owner_Type",
            CategoricalColumn::Brand => "Brand",
        }
    }
}

// ---------------------------------------------------------------------------
// NumericRange – inclusive bounds
// ---------------------------------------------------------------------------

/// Inclusive numeric interval `[lo, hi]`. `lo == hi` is a valid single-value
/// range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct NumericRange {
    pub lo: f64,
    pub hi: f64,
}

impl NumericRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(a: f64, b: f64) -> Self {
        if a <= b {
            NumericRange { lo: a, hi: b }
        } else {
            NumericRange { lo: b, hi: a }
        }
    }

    pub fn contains(&self, v: f64) -> bool {
        self.lo <= v && v <= self.hi
    }

    pub fn is_single_value(&self) -> bool {
        self.lo == self.hi
    }
}

impl From<(f64, f64)> for NumericRange {
    fn from((a, b): (f64, f64)) -> Self {
        NumericRange::new(a, b)
    }
}

impl From<NumericRange> for (f64, f64) {
    fn from(r: NumericRange) -> Self {
        (r.lo, r.hi)
    }
}

// ---------------------------------------------------------------------------
// ListingTable – the complete cleaned dataset
// ---------------------------------------------------------------------------

/// The cleaned dataset with pre-computed column indices. Never mutated after
/// construction; filtering produces views over it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingTable {
    rows: Vec<Listing>,
    /// For each categorical column the sorted set of unique values.
    unique_values: BTreeMap<CategoricalColumn, BTreeSet<String>>,
    /// Min/max of each numeric column; absent when the table is empty.
    bounds: BTreeMap<NumericColumn, NumericRange>,
}

impl ListingTable {
    /// Build column indices from cleaned listings.
    pub fn from_listings(rows: Vec<Listing>) -> Self {
        let mut unique_values: BTreeMap<CategoricalColumn, BTreeSet<String>> = BTreeMap::new();
        let mut bounds: BTreeMap<NumericColumn, NumericRange> = BTreeMap::new();

        for row in &rows {
            for col in CategoricalColumn::ALL {
                unique_values
                    .entry(col)
                    .or_default()
                    .insert(col.value(row).to_string());
            }
            for col in NumericColumn::ALL {
                let v = col.value(row);
                bounds
                    .entry(col)
                    .and_modify(|r| {
                        r.lo = r.lo.min(v);
                        r.hi = r.hi.max(v);
                    })
                    .or_insert(NumericRange { lo: v, hi: v });
            }
        }

        ListingTable {
            rows,
            unique_values,
            bounds,
        }
    }

    /// Number of listings.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&Listing> {
        self.rows.get(index)
    }

    /// Sorted unique values of a categorical column, or `None` for an empty table.
    pub fn unique_values(&self, col: CategoricalColumn) -> Option<&BTreeSet<String>> {
        self.unique_values.get(&col)
    }

    /// Min/max of a numeric column, or `None` for an empty table.
    pub fn bounds(&self, col: NumericColumn) -> Option<NumericRange> {
        self.bounds.get(&col).copied()
    }
}
