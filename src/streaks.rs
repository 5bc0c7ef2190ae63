use std::collections::BTreeMap;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

/// Min number of rain bearing samples for a day to count as a rain day
pub const RAIN_SAMPLE_THRESHOLD: usize = 2;

/// Min number of consecutive rain days for a streak to be reported
pub const MIN_STREAK_DAYS: usize = 3;

/// Average wind speed above which a day counts as stormy
pub const STORM_WIND_THRESHOLD: f64 = 10.0;

/// Wind speed at sunrise below which a morning counts as calm
pub const CALM_WIND_THRESHOLD: f64 = 5.0;

/// One forecast data point, timestamp localized to the forecast location
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastSample {
    pub timestamp: DateTime<Tz>,
    pub rain_amount: f64,
    pub wind_speed: f64,
}

/// Samples falling on one local calendar date
pub struct DayBucket<'a> {
    pub samples: Vec<&'a ForecastSample>,
}

impl DayBucket<'_> {
    pub fn rain_sample_count(&self) -> usize {
        self.samples.iter().filter(|s| s.rain_amount > 0.0).count()
    }

    pub fn average_wind(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.wind_speed).sum::<f64>() / self.samples.len() as f64
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RainStreak {
    pub start_date: NaiveDate,
    pub length: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalmMorningEvent {
    pub date: NaiveDate,
    pub sunrise: DateTime<Utc>,
    pub sample: ForecastSample,
}

/// Outcome of running a detector against fetched data
#[derive(Debug, PartialEq)]
pub enum Detection<T> {
    Found(T),
    Nothing,
    FetchFailed(String),
}

impl<T> From<Option<T>> for Detection<T> {
    fn from(o: Option<T>) -> Self {
        match o {
            Some(t) => Detection::Found(t),
            None => Detection::Nothing,
        }
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub rain_samples_per_day: usize,
    pub min_streak_days: usize,
    pub storm_wind: f64,
    pub calm_wind: f64,
    /// Whether the last run of rain days in the forecast is reported. Without it a run
    /// only counts once a later rain day follows it after a gap.
    pub include_trailing_streak: bool,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            rain_samples_per_day: RAIN_SAMPLE_THRESHOLD,
            min_streak_days: MIN_STREAK_DAYS,
            storm_wind: STORM_WIND_THRESHOLD,
            calm_wind: CALM_WIND_THRESHOLD,
            include_trailing_streak: true,
        }
    }
}

/// Groups samples by the local calendar date of their timestamp.
/// Within a bucket samples keep their input order.
///
/// # Arguments
///
/// * 'samples' - forecast samples in any order
pub fn group_by_day(samples: &[ForecastSample]) -> BTreeMap<NaiveDate, DayBucket<'_>> {
    let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for s in samples {
        buckets.entry(s.timestamp.date_naive())
            .or_insert_with(|| DayBucket { samples: Vec::new() })
            .samples.push(s);
    }

    buckets
}

/// Finds the earliest run of consecutive days that each have at least `rain_threshold`
/// rain bearing samples. The first run reaching `min_days` wins, even if a longer one
/// follows later in the forecast.
///
/// The last run of rain days is only reported when `include_trailing` is set. Otherwise
/// a run counts only once a later rain day follows it after a gap, so a run ended by
/// dry days at the end of the forecast is not reported either.
///
/// # Arguments
///
/// * 'samples' - forecast samples
/// * 'rain_threshold' - min number of rain samples for a day to qualify
/// * 'min_days' - min number of consecutive qualifying days
/// * 'include_trailing' - whether to report the last run of rain days
pub fn detect_rain_streak(
    samples: &[ForecastSample],
    rain_threshold: usize,
    min_days: usize,
    include_trailing: bool) -> Option<RainStreak> {

    let rain_days = group_by_day(samples)
        .into_iter()
        .filter(|(_, bucket)| bucket.rain_sample_count() >= rain_threshold)
        .map(|(date, _)| date)
        .collect::<Vec<NaiveDate>>();

    let mut run: Option<RainStreak> = None;
    for date in rain_days {
        match run.as_mut() {
            Some(r) if r.start_date + TimeDelta::days(r.length as i64) == date => r.length += 1,
            Some(r) if r.length >= min_days => return Some(*r),
            _ => run = Some(RainStreak { start_date: date, length: 1 }),
        }
    }

    if include_trailing {
        run.filter(|r| r.length >= min_days)
    } else {
        None
    }
}

/// Finds the first day following a stormy day (average wind above `storm_threshold`) where
/// the sample nearest to sunrise has a wind speed below `calm_threshold`.
///
/// If several samples are equally near sunrise, the one first in input order is used.
/// Days without a sunrise (polar day or night) never match.
///
/// # Arguments
///
/// * 'samples' - forecast samples
/// * 'sunrise_for_date' - gives the sunrise instant for a date at the forecast location
/// * 'storm_threshold' - average wind speed a day must exceed to be stormy
/// * 'calm_threshold' - wind speed at sunrise the next day must stay below
pub fn detect_calm_after_storm<F>(
    samples: &[ForecastSample],
    sunrise_for_date: F,
    storm_threshold: f64,
    calm_threshold: f64) -> Option<CalmMorningEvent>
where
    F: Fn(NaiveDate) -> Option<DateTime<Utc>>,
{
    let buckets = group_by_day(samples);

    for (date, bucket) in buckets.iter() {
        if bucket.average_wind() <= storm_threshold {
            continue;
        }
        let next_day = *date + TimeDelta::days(1);
        let Some(next_bucket) = buckets.get(&next_day) else { continue };
        let Some(sunrise) = sunrise_for_date(next_day) else { continue };

        if let Some(nearest) = nearest_sample(&next_bucket.samples, sunrise) {
            if nearest.wind_speed < calm_threshold {
                return Some(CalmMorningEvent { date: next_day, sunrise, sample: nearest.clone() });
            }
        }
    }

    None
}

/// Returns the sample closest in time to the given instant, first one wins on ties
///
/// # Arguments
///
/// * 'samples' - samples to search
/// * 'instant' - the instant to measure distance from
fn nearest_sample<'a>(samples: &[&'a ForecastSample], instant: DateTime<Utc>) -> Option<&'a ForecastSample> {
    let mut nearest: Option<(&ForecastSample, TimeDelta)> = None;
    for &s in samples {
        let distance = (s.timestamp.with_timezone(&Utc) - instant).abs();
        if nearest.is_none_or(|(_, d)| distance < d) {
            nearest = Some((s, distance));
        }
    }

    nearest.map(|(s, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Copenhagen;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 1).unwrap() + TimeDelta::days(offset)
    }

    fn sample(offset: i64, hour: u32, rain: f64, wind: f64) -> ForecastSample {
        let naive = day(offset).and_hms_opt(hour, 0, 0).unwrap();
        ForecastSample {
            timestamp: Copenhagen.from_local_datetime(&naive).unwrap(),
            rain_amount: rain,
            wind_speed: wind,
        }
    }

    /// Eight 3-hour samples per day, the first `count` of them with rain
    fn rain_days(counts: &[usize]) -> Vec<ForecastSample> {
        let mut samples = Vec::new();
        for (d, &count) in counts.iter().enumerate() {
            for slot in 0..8 {
                let rain = if slot < count { 1.2 } else { 0.0 };
                samples.push(sample(d as i64, slot as u32 * 3, rain, 4.0));
            }
        }
        samples
    }

    fn wind_days(averages: &[f64]) -> Vec<ForecastSample> {
        let mut samples = Vec::new();
        for (d, &avg) in averages.iter().enumerate() {
            for slot in 0..8 {
                samples.push(sample(d as i64, slot * 3, 0.0, avg));
            }
        }
        samples
    }

    fn sunrise_at_seven(date: NaiveDate) -> Option<DateTime<Utc>> {
        Copenhagen.from_local_datetime(&date.and_hms_opt(7, 0, 0).unwrap())
            .single()
            .map(|d| d.with_timezone(&Utc))
    }

    #[test]
    fn first_streak_wins_over_longer_later_one() {
        let samples = rain_days(&[2, 2, 2, 0, 2, 2, 2, 2]);
        let streak = detect_rain_streak(&samples, 2, 3, true);
        assert_eq!(streak, Some(RainStreak { start_date: day(0), length: 3 }));
    }

    #[test]
    fn isolated_rain_days_give_no_streak() {
        let samples = rain_days(&[3, 0, 4, 0, 2, 1, 5]);
        assert_eq!(detect_rain_streak(&samples, 2, 3, true), None);
        assert_eq!(detect_rain_streak(&samples, 2, 3, false), None);
    }

    #[test]
    fn trailing_streak_depends_on_flag() {
        let samples = rain_days(&[0, 2, 1, 3, 2, 2]);
        assert_eq!(
            detect_rain_streak(&samples, 2, 3, true),
            Some(RainStreak { start_date: day(3), length: 3 }));
        assert_eq!(detect_rain_streak(&samples, 2, 3, false), None);
    }

    #[test]
    fn whole_forecast_raining_is_trailing() {
        let samples = rain_days(&[2, 2, 2, 2, 2]);
        assert_eq!(
            detect_rain_streak(&samples, 2, 3, true),
            Some(RainStreak { start_date: day(0), length: 5 }));
        assert_eq!(detect_rain_streak(&samples, 2, 3, false), None);
    }

    #[test]
    fn missing_day_breaks_streak() {
        let mut samples = rain_days(&[2, 2, 0, 2, 2]);
        samples.retain(|s| s.timestamp.date_naive() != day(2));
        assert_eq!(detect_rain_streak(&samples, 2, 3, true), None);
    }

    #[test]
    fn short_run_is_reset_at_gap() {
        let samples = rain_days(&[2, 2, 0, 2, 2, 2, 0, 2]);
        assert_eq!(
            detect_rain_streak(&samples, 2, 3, false),
            Some(RainStreak { start_date: day(3), length: 3 }));
    }

    #[test]
    fn last_run_needs_trailing_flag_even_when_dry_days_follow() {
        let samples = rain_days(&[2, 2, 0, 2, 2, 2, 0]);
        assert_eq!(detect_rain_streak(&samples, 2, 3, false), None);
        assert_eq!(
            detect_rain_streak(&samples, 2, 3, true),
            Some(RainStreak { start_date: day(3), length: 3 }));
    }

    #[test]
    fn streak_is_never_shorter_than_min_days() {
        let patterns: [&[usize]; 5] = [
            &[2, 2, 0, 2, 2, 0, 2],
            &[2, 0, 2, 2, 2, 2, 0, 2],
            &[1, 1, 1, 1],
            &[2, 2, 2, 2, 2, 2],
            &[0, 0, 2, 2, 2, 0, 2, 2],
        ];
        for pattern in patterns {
            let samples = rain_days(pattern);
            for min_days in 1..5 {
                for trailing in [true, false] {
                    if let Some(s) = detect_rain_streak(&samples, 2, min_days, trailing) {
                        assert!(s.length >= min_days, "{:?} {}", pattern, min_days);
                    }
                }
            }
        }
    }

    #[test]
    fn sample_order_does_not_matter_for_streaks() {
        let mut samples = rain_days(&[2, 2, 2, 0, 2]);
        samples.reverse();
        assert_eq!(
            detect_rain_streak(&samples, 2, 3, false),
            Some(RainStreak { start_date: day(0), length: 3 }));
        assert_eq!(
            detect_rain_streak(&samples, 2, 3, true),
            Some(RainStreak { start_date: day(0), length: 3 }));
    }

    #[test]
    fn calm_morning_after_storm() {
        let samples = wind_days(&[12.0, 3.0, 15.0, 1.0]);
        let event = detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0).unwrap();
        assert_eq!(event.date, day(1));
        assert_eq!(event.sample.timestamp.date_naive(), day(1));
        assert_eq!(event.sunrise, sunrise_at_seven(day(1)).unwrap());
    }

    #[test]
    fn no_storm_no_calm_morning() {
        let samples = wind_days(&[8.0, 1.0, 9.5, 0.5]);
        assert_eq!(detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0), None);
    }

    #[test]
    fn storm_on_last_day_has_no_next_day() {
        let samples = wind_days(&[4.0, 4.0, 14.0]);
        assert_eq!(detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0), None);
    }

    #[test]
    fn windy_sunrise_is_not_calm() {
        // Day 1 averages below calm but the 06:00 sample next to sunrise is windy
        let mut samples = wind_days(&[12.0]);
        samples.push(sample(1, 0, 0.0, 1.0));
        samples.push(sample(1, 3, 0.0, 1.0));
        samples.push(sample(1, 6, 0.0, 7.0));
        samples.push(sample(1, 12, 0.0, 1.0));
        assert_eq!(detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0), None);
    }

    #[test]
    fn equidistant_samples_take_first() {
        // Sunrise at 07:00, samples at 06:00 and 08:00 are equally near
        let mut samples = wind_days(&[11.0]);
        samples.push(sample(1, 6, 0.0, 2.0));
        samples.push(sample(1, 8, 0.0, 9.0));
        let event = detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0).unwrap();
        assert_eq!(event.sample.wind_speed, 2.0);

        let mut swapped = wind_days(&[11.0]);
        swapped.push(sample(1, 8, 0.0, 9.0));
        swapped.push(sample(1, 6, 0.0, 2.0));
        assert_eq!(detect_calm_after_storm(&swapped, sunrise_at_seven, 10.0, 5.0), None);
    }

    #[test]
    fn sub_second_sunrise_offset_picks_nearer_sample() {
        // Sunrise at 07:00:00.600, the 08:00 sample is nearer than the 06:00 one
        let mut samples = wind_days(&[11.0]);
        samples.push(sample(1, 6, 0.0, 2.0));
        samples.push(sample(1, 8, 0.0, 9.0));
        let sunrise = |date: NaiveDate| {
            sunrise_at_seven(date).map(|d| d + TimeDelta::milliseconds(600))
        };
        assert_eq!(detect_calm_after_storm(&samples, sunrise, 10.0, 5.0), None);
    }

    #[test]
    fn missing_sunrise_skips_day() {
        let samples = wind_days(&[12.0, 3.0]);
        assert_eq!(detect_calm_after_storm(&samples, |_| None, 10.0, 5.0), None);
    }

    #[test]
    fn empty_input_gives_nothing() {
        assert_eq!(detect_rain_streak(&[], 2, 3, true), None);
        assert_eq!(detect_calm_after_storm(&[], sunrise_at_seven, 10.0, 5.0), None);
    }

    #[test]
    fn detectors_are_repeatable() {
        let samples = rain_days(&[2, 2, 2, 0, 2]);
        assert_eq!(detect_rain_streak(&samples, 2, 3, true), detect_rain_streak(&samples, 2, 3, true));
        let samples = wind_days(&[12.0, 3.0]);
        assert_eq!(
            detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0),
            detect_calm_after_storm(&samples, sunrise_at_seven, 10.0, 5.0));
    }

    #[test]
    fn buckets_follow_local_date() {
        // 23:30 UTC on Oct 1 is already Oct 2 in Copenhagen
        let utc = Utc.with_ymd_and_hms(2025, 10, 1, 23, 30, 0).unwrap();
        let s = ForecastSample { timestamp: utc.with_timezone(&Copenhagen), rain_amount: 0.5, wind_speed: 6.0 };
        let buckets = group_by_day(std::slice::from_ref(&s));
        assert!(buckets.contains_key(&day(1)));
        assert_eq!(buckets[&day(1)].rain_sample_count(), 1);
        assert_eq!(buckets[&day(1)].average_wind(), 6.0);
    }

    #[test]
    fn detection_from_option() {
        assert_eq!(Detection::from(Some(3)), Detection::Found(3));
        assert_eq!(Detection::<i32>::from(None), Detection::Nothing);
    }
}
