use crate::model::{ScatterPoint, TimeSeriesPoint, YearSeries, YearValue};

/// Years present in both series, ascending, with the paired values.
pub fn align(primary: &YearSeries, secondary: &YearSeries) -> (Vec<i32>, Vec<TimeSeriesPoint>) {
    let time_series: Vec<TimeSeriesPoint> = primary
        .iter()
        .filter_map(|(year, p)| {
            secondary.get(year).map(|s| TimeSeriesPoint {
                year: *year,
                primary: *p,
                secondary: *s,
            })
        })
        .collect();
    let years = time_series.iter().map(|p| p.year).collect();
    (years, time_series)
}

/// Percent growth of the primary series between consecutive aligned years.
///
/// A move away from zero reports 100; zero to zero reports 0.
pub fn yoy_growth(series: &[TimeSeriesPoint]) -> Vec<YearValue> {
    series
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0].primary, w[1].primary);
            let growth = if prev == 0.0 {
                if curr == 0.0 {
                    0.0
                } else {
                    100.0
                }
            } else {
                (curr - prev) / prev.abs() * 100.0
            };
            YearValue {
                year: w[1].year,
                value: round2(growth),
            }
        })
        .collect()
}

/// Absolute change of the secondary series between consecutive aligned years.
pub fn yoy_change(series: &[TimeSeriesPoint]) -> Vec<YearValue> {
    series
        .windows(2)
        .map(|w| YearValue {
            year: w[1].year,
            value: round2(w[1].secondary - w[0].secondary),
        })
        .collect()
}

pub fn scatter(series: &[TimeSeriesPoint]) -> Vec<ScatterPoint> {
    series
        .iter()
        .map(|p| ScatterPoint {
            x: p.primary,
            y: p.secondary,
            year: p.year,
        })
        .collect()
}

/// Primary as a percentage of a value denominator (e.g. GDP). Secondary is unchanged.
pub fn normalize_by_value(
    years: &[i32],
    primary: &YearSeries,
    secondary: &YearSeries,
    denominator: &YearSeries,
) -> Vec<TimeSeriesPoint> {
    normalized(years, primary, secondary, denominator, |p, d| p / d * 100.0)
}

/// Primary per unit of a count denominator (e.g. population). Secondary is unchanged.
pub fn normalize_by_count(
    years: &[i32],
    primary: &YearSeries,
    secondary: &YearSeries,
    denominator: &YearSeries,
) -> Vec<TimeSeriesPoint> {
    normalized(years, primary, secondary, denominator, |p, d| p / d)
}

/// Non-positive denominators map to 0 rather than dividing.
fn normalized(
    years: &[i32],
    primary: &YearSeries,
    secondary: &YearSeries,
    denominator: &YearSeries,
    scale: impl Fn(f64, f64) -> f64,
) -> Vec<TimeSeriesPoint> {
    years
        .iter()
        .filter_map(|year| {
            let p = primary.get(year)?;
            let s = secondary.get(year)?;
            let d = denominator.get(year)?;
            Some(TimeSeriesPoint {
                year: *year,
                primary: if *d > 0.0 { scale(*p, *d) } else { 0.0 },
                secondary: *s,
            })
        })
        .collect()
}

pub(crate) fn round2(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(i32, f64)]) -> YearSeries {
        points.iter().copied().collect()
    }

    fn ts(points: &[(i32, f64, f64)]) -> Vec<TimeSeriesPoint> {
        points
            .iter()
            .map(|&(year, primary, secondary)| TimeSeriesPoint { year, primary, secondary })
            .collect()
    }

    #[test]
    fn align_intersects_years() {
        let primary = series(&[(2019, 10.0), (2020, 20.0), (2021, 30.0)]);
        let secondary = series(&[(2020, 50.0), (2021, 55.0), (2022, 60.0)]);
        let (years, points) = align(&primary, &secondary);
        assert_eq!(years, vec![2020, 2021]);
        assert_eq!(points, ts(&[(2020, 20.0, 50.0), (2021, 30.0, 55.0)]));
    }

    #[test]
    fn align_without_overlap_is_empty() {
        let (years, points) = align(&series(&[(2000, 1.0)]), &series(&[(2001, 1.0)]));
        assert!(years.is_empty());
        assert!(points.is_empty());
    }

    #[test]
    fn growth_handles_zero_previous() {
        let growth = yoy_growth(&ts(&[(2018, 0.0, 0.0), (2019, 0.0, 0.0), (2020, 5.0, 0.0)]));
        assert_eq!(growth, vec![
            YearValue { year: 2019, value: 0.0 },
            YearValue { year: 2020, value: 100.0 },
        ]);
    }

    #[test]
    fn growth_is_relative_to_absolute_previous() {
        let growth = yoy_growth(&ts(&[(2019, 100.0, 0.0), (2020, 150.0, 0.0), (2021, 100.0, 0.0)]));
        assert_eq!(growth[0].value, 50.0);
        assert_eq!(growth[1].value, -33.33);

        let negative = yoy_growth(&ts(&[(2019, -50.0, 0.0), (2020, -25.0, 0.0)]));
        assert_eq!(negative[0].value, 50.0);
    }

    #[test]
    fn change_is_absolute_points() {
        let change = yoy_change(&ts(&[(2018, 0.0, 58.0), (2019, 0.0, 57.0), (2021, 0.0, 55.556)]));
        assert_eq!(change, vec![
            YearValue { year: 2019, value: -1.0 },
            YearValue { year: 2021, value: -1.44 },
        ]);
    }

    #[test]
    fn single_point_has_no_yoy() {
        let one = ts(&[(2020, 1.0, 1.0)]);
        assert!(yoy_growth(&one).is_empty());
        assert!(yoy_change(&one).is_empty());
        assert!(yoy_growth(&[]).is_empty());
    }

    #[test]
    fn scatter_uses_raw_values() {
        let points = scatter(&ts(&[(2020, 100.0, 55.0)]));
        assert_eq!(points, vec![ScatterPoint { x: 100.0, y: 55.0, year: 2020 }]);
    }

    #[test]
    fn value_normalization_filters_to_denominator_years() {
        let primary = series(&[(2019, 10.0), (2020, 50.0), (2021, 30.0)]);
        let secondary = series(&[(2019, 50.0), (2020, 51.0), (2021, 52.0)]);
        let gdp = series(&[(2020, 200.0), (2021, 0.0), (2030, 5.0)]);
        let years = vec![2019, 2020, 2021];

        let out = normalize_by_value(&years, &primary, &secondary, &gdp);
        assert_eq!(out, ts(&[(2020, 25.0, 51.0), (2021, 0.0, 52.0)]));
    }

    #[test]
    fn count_normalization_is_per_unit() {
        let primary = series(&[(2020, 1_000.0)]);
        let secondary = series(&[(2020, 40.0)]);
        let pop = series(&[(2020, 50.0)]);
        let out = normalize_by_count(&[2020], &primary, &secondary, &pop);
        assert_eq!(out, ts(&[(2020, 20.0, 40.0)]));
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005 * 1000.0), 1005.0);
        assert_eq!(round2(-1.456), -1.46);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
