use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::model::{Listing, ListingTable, NumericColumn, NumericRange, OwnerType};

// ---------------------------------------------------------------------------
// Filter predicate: ranges plus per-column selections
// ---------------------------------------------------------------------------

/// The complete set of predicates a front end submits on every change.
///
/// * A range that is `None` does not restrict its column.
/// * An empty selection set does not restrict its column; a non-empty one
///   keeps rows whose value is in the set.
///
/// All active predicates are combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub price: Option<NumericRange>,
    pub mileage: Option<NumericRange>,
    pub engine: Option<NumericRange>,
    pub power: Option<NumericRange>,
    pub year: Option<NumericRange>,
    pub locations: BTreeSet<String>,
    pub fuel_types: BTreeSet<String>,
    pub transmissions: BTreeSet<String>,
    pub owner_types: BTreeSet<OwnerType>,
}

impl FilterSpec {
    /// Initialise a [`FilterSpec`] whose ranges span each column's min/max and
    /// whose selections are empty (i.e., show everything).
    pub fn defaults_for(table: &ListingTable) -> Self {
        FilterSpec {
            price: table.bounds(NumericColumn::Price),
            mileage: table.bounds(NumericColumn::Mileage),
            engine: table.bounds(NumericColumn::Engine),
            power: table.bounds(NumericColumn::Power),
            year: table.bounds(NumericColumn::Year),
            ..Default::default()
        }
    }

    /// Whether `row` passes every active predicate.
    pub fn matches(&self, row: &Listing) -> bool {
        let ranges = [
            (self.price, row.price),
            (self.mileage, row.mileage),
            (self.engine, row.engine),
            (self.power, row.power),
            (self.year, row.year as f64),
        ];
        ranges
            .iter()
            .all(|(range, v)| range.map_or(true, |r| r.contains(*v)))
            && selected(&self.locations, &row.location)
            && selected(&self.fuel_types, &row.fuel_type)
            && selected(&self.transmissions, &row.transmission)
            && selected(&self.owner_types, &row.owner_type)
    }
}

fn selected<T: Ord>(selection: &BTreeSet<T>, value: &T) -> bool {
    selection.is_empty() || selection.contains(value)
}

/// Return indices of listings that pass all active filters, in table order.
pub fn filtered_indices(table: &ListingTable, spec: &FilterSpec) -> Vec<usize> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| spec.matches(row))
        .map(|(i, _)| i)
        .collect()
}

/// Apply `spec` to `table`. Pure: the table is only read.
pub fn apply<'a>(table: &'a ListingTable, spec: &FilterSpec) -> FilteredView<'a> {
    let indices = filtered_indices(table, spec);
    log::debug!("Filter kept {} of {} listings", indices.len(), table.len());
    FilteredView { table, indices }
}

// ---------------------------------------------------------------------------
// FilteredView – a borrowed subset of the table
// ---------------------------------------------------------------------------

/// Rows of a [`ListingTable`] that passed a filter.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a ListingTable,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// A view over every row.
    pub fn all(table: &'a ListingTable) -> Self {
        FilteredView {
            table,
            indices: (0..table.len()).collect(),
        }
    }

    pub fn table(&self) -> &'a ListingTable {
        self.table
    }

    /// Positions of the kept rows in the underlying table.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Listing> + '_ {
        let rows = self.table.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    /// Values of a numeric column over the kept rows.
    pub fn column(&self, col: NumericColumn) -> Vec<f64> {
        self.iter().map(|r| col.value(r)).collect()
    }

    /// Owned copies of the kept rows.
    pub fn to_rows(&self) -> Vec<Listing> {
        self.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::{listing, table_of};

    fn sample() -> ListingTable {
        let mut a = listing(2012, 300_000.0);
        a.location = "Delhi".into();
        a.fuel_type = "Petrol".into();
        let mut b = listing(2015, 500_000.0);
        b.owner_type = OwnerType::Second;
        b.mileage = 17.5;
        let mut c = listing(2018, 900_000.0);
        c.location = "Kochi".into();
        c.transmission = "Automatic".into();
        c.power = 140.0;
        table_of(vec![a, b, c])
    }

    #[test]
    fn year_range_selects_expected_rows() {
        let table = sample();
        let spec = FilterSpec {
            year: Some(NumericRange::new(2014.0, 2020.0)),
            ..Default::default()
        };
        let view = apply(&table, &spec);
        let years: Vec<i64> = view.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2015, 2018]);
    }

    #[test]
    fn defaults_keep_everything() {
        let table = sample();
        let spec = FilterSpec::defaults_for(&table);
        assert_eq!(filtered_indices(&table, &spec), vec![0, 1, 2]);
        assert_eq!(filtered_indices(&table, &FilterSpec::default()), vec![0, 1, 2]);
    }

    #[test]
    fn empty_selection_imposes_no_restriction() {
        let table = sample();
        let mut spec = FilterSpec::defaults_for(&table);
        spec.locations = BTreeSet::new();
        assert_eq!(filtered_indices(&table, &spec).len(), 3);

        spec.locations = ["Delhi".to_string(), "Kochi".to_string()].into();
        assert_eq!(filtered_indices(&table, &spec), vec![0, 2]);
    }

    #[test]
    fn predicates_combine_with_and() {
        let table = sample();
        let spec = FilterSpec {
            locations: ["Pune".to_string(), "Kochi".to_string()].into(),
            owner_types: [OwnerType::Second].into(),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &spec), vec![1]);
    }

    #[test]
    fn single_value_range_is_inclusive() {
        let table = sample();
        let spec = FilterSpec {
            price: Some(NumericRange::new(500_000.0, 500_000.0)),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&table, &spec), vec![1]);
    }

    #[test]
    fn result_is_exact_predicate_conjunction() {
        let table = sample();
        let spec = FilterSpec {
            mileage: Some(NumericRange::new(20.0, 30.0)),
            power: Some(NumericRange::new(0.0, 150.0)),
            fuel_types: ["Diesel".to_string()].into(),
            ..Default::default()
        };
        let kept = filtered_indices(&table, &spec);
        for (i, row) in table.rows().iter().enumerate() {
            let expected = (20.0..=30.0).contains(&row.mileage)
                && (0.0..=150.0).contains(&row.power)
                && row.fuel_type == "Diesel";
            assert_eq!(kept.contains(&i), expected, "row {i}");
        }
        assert_eq!(kept, vec![2]);
    }

    #[test]
    fn spec_deserializes_from_partial_json() {
        let spec: FilterSpec =
            serde_json::from_str(r#"{"year": [2020, 2014], "owner_types": ["Fourth & Above"]}"#).unwrap();
        assert_eq!(spec.year, Some(NumericRange::new(2014.0, 2020.0)));
        assert!(spec.owner_types.contains(&OwnerType::FourthAndAbove));
        assert!(spec.price.is_none());
        assert!(spec.locations.is_empty());
    }
}
