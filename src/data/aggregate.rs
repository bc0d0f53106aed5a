//! Aggregates computed over a filtered view.
//!
//! Everything here is a pure function of a [`FilteredView`]. Over an empty
//! view the scalar aggregates are `None` and the tabular ones are empty.

use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::FilteredView;
use super::model::{CategoricalColumn, Listing, NumericColumn, OwnerType};
use super::stats;

/// Rows shown in the dashboard's table preview.
pub const PREVIEW_ROWS: usize = 10;

/// Columns of the correlation matrix, in display order.
pub const CORRELATION_COLUMNS: [NumericColumn; 5] = [
    NumericColumn::Price,
    NumericColumn::Mileage,
    NumericColumn::Power,
    NumericColumn::Engine,
    NumericColumn::KilometersDriven,
];

// ---------------------------------------------------------------------------
// Scalar summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean_price: Option<f64>,
    pub mean_mileage: Option<f64>,
    pub mean_power: Option<f64>,
    pub modal_fuel_type: Option<String>,
    pub modal_brand: Option<String>,
}

pub fn summary(view: &FilteredView<'_>) -> Summary {
    let modal = |col: CategoricalColumn| {
        let values: Vec<&str> = view.iter().map(|r| col.value(r)).collect();
        stats::mode(&values).map(str::to_string)
    };
    Summary {
        count: view.len(),
        mean_price: stats::mean(&view.column(NumericColumn::Price)),
        mean_mileage: stats::mean(&view.column(NumericColumn::Mileage)),
        mean_power: stats::mean(&view.column(NumericColumn::Power)),
        modal_fuel_type: modal(CategoricalColumn::FuelType),
        modal_brand: modal(CategoricalColumn::Brand),
    }
}

// ---------------------------------------------------------------------------
// Group-by means
// ---------------------------------------------------------------------------

fn group_mean<K: Ord>(view: &FilteredView<'_>, key: impl Fn(&Listing) -> K) -> BTreeMap<K, f64> {
    let mut acc: BTreeMap<K, (f64, usize)> = BTreeMap::new();
    for row in view.iter() {
        let e = acc.entry(key(row)).or_insert((0.0, 0));
        e.0 += row.price;
        e.1 += 1;
    }
    acc.into_iter()
        .map(|(k, (sum, n))| (k, sum / n as f64))
        .collect()
}

/// Mean price per model year, ascending by year.
pub fn mean_price_by_year(view: &FilteredView<'_>) -> BTreeMap<i64, f64> {
    group_mean(view, |r| r.year)
}

/// Mean price per location, cheapest first. Equal means keep name order.
pub fn mean_price_by_location(view: &FilteredView<'_>) -> Vec<(String, f64)> {
    let mut v: Vec<(String, f64)> = group_mean(view, |r| r.location.clone()).into_iter().collect();
    v.sort_by(|a, b| a.1.total_cmp(&b.1));
    v
}

/// Mean price per ownership history, in First → Fourth & Above order.
pub fn mean_price_by_owner_type(view: &FilteredView<'_>) -> BTreeMap<OwnerType, f64> {
    group_mean(view, |r| r.owner_type)
}

// ---------------------------------------------------------------------------
// Counts and distributions
// ---------------------------------------------------------------------------

/// Rows per distinct value, most frequent first; ties in value order.
pub fn value_counts(view: &FilteredView<'_>, col: CategoricalColumn) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in view.iter() {
        *counts.entry(col.value(row)).or_default() += 1;
    }
    let mut v: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    v.sort_by(|a, b| b.1.cmp(&a.1));
    v
}

/// Rows per distinct numeric value, ascending by value.
pub fn distribution(view: &FilteredView<'_>, col: NumericColumn) -> Vec<(f64, usize)> {
    let mut values = view.column(col);
    values.sort_by(f64::total_cmp);
    let mut out: Vec<(f64, usize)> = Vec::new();
    for v in values {
        if let Some((last, n)) = out.last_mut() {
            if *last == v {
                *n += 1;
                continue;
            }
        }
        out.push((v, 1));
    }
    out
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pairwise Pearson correlations. An entry is `None` where the coefficient is
/// undefined (fewer than two rows, or a constant column).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<&'static str>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: NumericColumn, b: NumericColumn) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a.name())?;
        let j = self.columns.iter().position(|c| *c == b.name())?;
        self.values[i][j]
    }
}

pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
    let data: Vec<Vec<f64>> = CORRELATION_COLUMNS.iter().map(|&c| view.column(c)).collect();
    let values = data
        .iter()
        .map(|xs| data.iter().map(|ys| stats::pearson(xs, ys)).collect())
        .collect();
    CorrelationMatrix {
        columns: CORRELATION_COLUMNS.iter().map(|c| c.name()).collect(),
        values,
    }
}

// ---------------------------------------------------------------------------
// Extremes
// ---------------------------------------------------------------------------

fn rows_at_price(view: &FilteredView<'_>, target: Option<f64>) -> Vec<Listing> {
    match target {
        Some(p) => view.iter().filter(|r| r.price == p).cloned().collect(),
        None => Vec::new(),
    }
}

/// Every row priced at the view's maximum.
pub fn most_expensive(view: &FilteredView<'_>) -> Vec<Listing> {
    let max = view.iter().map(|r| r.price).max_by(f64::total_cmp);
    rows_at_price(view, max)
}

/// Every row priced at the view's minimum.
pub fn least_expensive(view: &FilteredView<'_>) -> Vec<Listing> {
    let min = view.iter().map(|r| r.price).min_by(f64::total_cmp);
    rows_at_price(view, min)
}

// ---------------------------------------------------------------------------
// Price tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PriceTier {
    Low,
    Mid,
    High,
}

/// Equal-frequency tertile label for each row of `view`, in view order.
///
/// Rows are ranked by price; equal prices keep view order. Low and High
/// each take `round(n / 3)` rows and Mid takes the rest, so a remainder is
/// split symmetrically (5 rows → 2/1/2). Labels are relative to the view,
/// so the same car can change tier when the filter changes.
pub fn price_tiers(view: &FilteredView<'_>) -> Vec<PriceTier> {
    let prices = view.column(NumericColumn::Price);
    let n = prices.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| prices[a].total_cmp(&prices[b]));

    let outer = (n + 1) / 3;
    let mut tiers = vec![PriceTier::Mid; n];
    for (rank, &pos) in order.iter().enumerate() {
        if rank < outer {
            tiers[pos] = PriceTier::Low;
        } else if rank >= n - outer {
            tiers[pos] = PriceTier::High;
        }
    }
    tiers
}

/// One point of the Year vs Mileage scatter, coloured by tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierPoint {
    pub year: i64,
    pub mileage: f64,
    pub price: f64,
    pub tier: PriceTier,
}

// ---------------------------------------------------------------------------
// Dashboard – everything a front end renders for one filter state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub preview: Vec<Listing>,
    pub price_distribution: Vec<(f64, usize)>,
    pub mileage_distribution: Vec<(f64, usize)>,
    pub engine_distribution: Vec<(f64, usize)>,
    pub fuel_type_counts: Vec<(String, usize)>,
    pub transmission_counts: Vec<(String, usize)>,
    pub owner_type_counts: Vec<(String, usize)>,
    pub mean_price_by_year: BTreeMap<i64, f64>,
    pub mean_price_by_location: Vec<(String, f64)>,
    pub mean_price_by_owner_type: BTreeMap<OwnerType, f64>,
    pub correlation: CorrelationMatrix,
    pub most_expensive: Vec<Listing>,
    pub least_expensive: Vec<Listing>,
    pub price_tiers: Vec<TierPoint>,
}

impl Dashboard {
    pub fn build(view: &FilteredView<'_>) -> Self {
        let tiers = price_tiers(view);
        let price_tiers = view
            .iter()
            .zip(tiers)
            .map(|(r, tier)| TierPoint {
                year: r.year,
                mileage: r.mileage,
                price: r.price,
                tier,
            })
            .collect();

        Dashboard {
            summary: summary(view),
            preview: view.iter().take(PREVIEW_ROWS).cloned().collect(),
            price_distribution: distribution(view, NumericColumn::Price),
            mileage_distribution: distribution(view, NumericColumn::Mileage),
            engine_distribution: distribution(view, NumericColumn::Engine),
            fuel_type_counts: value_counts(view, CategoricalColumn::FuelType),
            transmission_counts: value_counts(view, CategoricalColumn::Transmission),
            owner_type_counts: value_counts(view, CategoricalColumn::OwnerType),
            mean_price_by_year: mean_price_by_year(view),
            mean_price_by_location: mean_price_by_location(view),
            mean_price_by_owner_type: mean_price_by_owner_type(view),
            correlation: correlation_matrix(view),
            most_expensive: most_expensive(view),
            least_expensive: least_expensive(view),
            price_tiers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply, FilterSpec};
    use crate::data::fixtures::{listing, table_of};
    use crate::data::model::{ListingTable, NumericRange};

    fn priced(prices: &[f64]) -> ListingTable {
        table_of(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| listing(2010 + i as i64, p))
                .collect(),
        )
    }

    #[test]
    fn year_filter_mean_price() {
        let table = table_of(vec![
            listing(2012, 300_000.0),
            listing(2015, 500_000.0),
            listing(2018, 900_000.0),
        ]);
        let spec = FilterSpec {
            year: Some(NumericRange::new(2014.0, 2020.0)),
            ..Default::default()
        };
        let s = summary(&apply(&table, &spec));
        assert_eq!(s.count, 2);
        assert_eq!(s.mean_price, Some(700_000.0));
        assert_eq!(s.modal_brand.as_deref(), Some("Maruti"));
    }

    #[test]
    fn empty_view_degrades_gracefully() {
        let table = priced(&[1.0, 2.0]);
        let spec = FilterSpec {
            price: Some(NumericRange::new(10.0, 20.0)),
            ..Default::default()
        };
        let view = apply(&table, &spec);
        let d = Dashboard::build(&view);
        assert_eq!(d.summary.count, 0);
        assert_eq!(d.summary.mean_price, None);
        assert_eq!(d.summary.modal_fuel_type, None);
        assert!(d.most_expensive.is_empty() && d.least_expensive.is_empty());
        assert!(d.price_tiers.is_empty());
        assert!(d.correlation.values.iter().flatten().all(Option::is_none));
    }

    #[test]
    fn extremes_return_all_tied_rows() {
        let table = priced(&[5.0, 9.0, 1.0, 9.0, 1.0, 3.0]);
        let view = FilteredView::all(&table);
        let most = most_expensive(&view);
        assert_eq!(most.len(), 2);
        assert!(most.iter().all(|r| r.price == 9.0));
        let least = least_expensive(&view);
        assert_eq!(least.iter().map(|r| r.year).collect::<Vec<_>>(), vec![2012, 2014]);
    }

    #[test]
    fn tertiles_are_as_equal_as_possible() {
        for n in 1..=12 {
            let prices: Vec<f64> = (0..n).map(|i| ((i * 7) % n) as f64).collect();
            let table = priced(&prices);
            let tiers = price_tiers(&FilteredView::all(&table));
            let count = |t: PriceTier| tiers.iter().filter(|x| **x == t).count();
            let counts = [count(PriceTier::Low), count(PriceTier::Mid), count(PriceTier::High)];
            let max = *counts.iter().max().unwrap();
            let min = *counts.iter().min().unwrap();
            assert!(max - min <= 1, "n={n} counts={counts:?}");
            assert_eq!(counts.iter().sum::<usize>(), n);
        }
    }

    #[test]
    fn tier_remainder_is_split_symmetrically() {
        let expected = [(1, [0, 1, 0]), (2, [1, 0, 1]), (4, [1, 2, 1]), (5, [2, 1, 2]), (7, [2, 3, 2]), (8, [3, 2, 3])];
        for (n, counts) in expected {
            let prices: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let table = priced(&prices);
            let tiers = price_tiers(&FilteredView::all(&table));
            let count = |t: PriceTier| tiers.iter().filter(|x| **x == t).count();
            assert_eq!([count(PriceTier::Low), count(PriceTier::Mid), count(PriceTier::High)], counts, "n={n}");
        }
    }

    #[test]
    fn tiers_follow_price_rank() {
        let table = priced(&[900.0, 100.0, 500.0]);
        let tiers = price_tiers(&FilteredView::all(&table));
        assert_eq!(tiers, vec![PriceTier::High, PriceTier::Low, PriceTier::Mid]);
    }

    #[test]
    fn tiers_are_relative_to_the_view() {
        let table = priced(&[100.0, 200.0, 300.0, 400.0, 500.0, 600.0]);
        let all = FilteredView::all(&table);
        assert_eq!(price_tiers(&all)[2], PriceTier::Mid);

        let spec = FilterSpec {
            price: Some(NumericRange::new(300.0, 600.0)),
            ..Default::default()
        };
        let upper = apply(&table, &spec);
        // 300 is now the cheapest row.
        assert_eq!(price_tiers(&upper)[0], PriceTier::Low);
    }

    #[test]
    fn owner_type_means_in_domain_order() {
        let mut rows = vec![listing(2015, 100.0), listing(2015, 300.0), listing(2015, 200.0)];
        rows[0].owner_type = OwnerType::FourthAndAbove;
        rows[1].owner_type = OwnerType::Second;
        rows[2].owner_type = OwnerType::First;
        let table = table_of(rows);
        let means = mean_price_by_owner_type(&FilteredView::all(&table));
        let keys: Vec<OwnerType> = means.keys().copied().collect();
        assert_eq!(keys, vec![OwnerType::First, OwnerType::Second, OwnerType::FourthAndAbove]);
    }

    #[test]
    fn location_means_sorted_by_value() {
        let mut rows = vec![listing(2015, 900.0), listing(2015, 100.0), listing(2015, 300.0)];
        rows[0].location = "Bangalore".into();
        rows[1].location = "Jaipur".into();
        rows[2].location = "Jaipur".into();
        let table = table_of(rows);
        let means = mean_price_by_location(&FilteredView::all(&table));
        assert_eq!(means, vec![("Jaipur".to_string(), 200.0), ("Bangalore".to_string(), 900.0)]);
        let by_year = mean_price_by_year(&FilteredView::all(&table));
        assert_eq!(by_year.get(&2015), Some(&(1300.0 / 3.0)));
    }

    #[test]
    fn correlation_of_price_with_itself_is_one() {
        let mut rows = vec![listing(2011, 100.0), listing(2012, 200.0), listing(2013, 400.0)];
        rows[0].power = 60.0;
        rows[1].power = 80.0;
        rows[2].power = 120.0;
        let table = table_of(rows);
        let m = correlation_matrix(&FilteredView::all(&table));
        let r = m.get(NumericColumn::Price, NumericColumn::Price).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        let pp = m.get(NumericColumn::Price, NumericColumn::Power).unwrap();
        assert!(pp > 0.99);
        // Engine is constant in the fixture.
        assert_eq!(m.get(NumericColumn::Price, NumericColumn::Engine), None);
        assert_eq!(m.get(NumericColumn::Price, NumericColumn::Year), None);
    }

    #[test]
    fn counts_and_distributions() {
        let mut rows = vec![listing(2015, 100.0), listing(2016, 100.0), listing(2017, 50.0)];
        rows[2].fuel_type = "Petrol".into();
        let table = table_of(rows);
        let view = FilteredView::all(&table);
        assert_eq!(
            value_counts(&view, CategoricalColumn::FuelType),
            vec![("Diesel".to_string(), 2), ("Petrol".to_string(), 1)]
        );
        assert_eq!(distribution(&view, NumericColumn::Price), vec![(50.0, 1), (100.0, 2)]);
    }

    #[test]
    fn dashboard_serializes_to_json() {
        let table = priced(&[1.0, 2.0, 3.0]);
        let d = Dashboard::build(&FilteredView::all(&table));
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["summary"]["count"], 3);
        assert_eq!(json["mean_price_by_owner_type"]["First"], 2.0);
        assert_eq!(json["price_tiers"][2]["tier"], "High");
        assert_eq!(json["preview"][0]["Kilometers_Driven"], 40_000);
    }
}
