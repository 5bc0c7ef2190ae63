use std::collections::BTreeMap;
use chrono::{DateTime, TimeDelta};
use chrono_tz::Tz;
use crate::manager_sun::SunTimes;

/// Length of the golden hour after sunrise and before sunset
const GOLDEN_HOUR_MINUTES: i64 = 60;

/// Builds the description of a daily overview: sunrise/sunset, blue hour (civil twilight),
/// golden hour and the tides of the day.
///
/// # Arguments
///
/// * 'sun' - sun times of the day
/// * 'tides' - tide extremes of the day as (type, local time)
pub fn day_overview(sun: &SunTimes, tides: &[(String, DateTime<Tz>)]) -> String {
    let golden = TimeDelta::minutes(GOLDEN_HOUR_MINUTES);

    let mut lines = vec![
        format!("🌅 SA: {}", hm(&sun.sunrise)),
        format!("🌇 SU: {}", hm(&sun.sunset)),
        format!("🔵 BS morgens: {} – {}", hm(&sun.dawn), hm(&sun.sunrise)),
        format!("🔵 BS abends: {} – {}", hm(&sun.sunset), hm(&sun.dusk)),
        format!("✨ GS morgens: {} – {}", hm(&sun.sunrise), hm(&(sun.sunrise + golden))),
        format!("✨ GS abends: {} – {}", hm(&(sun.sunset - golden)), hm(&sun.sunset)),
        String::new(),
        "🌊 Gezeiten:".to_string(),
    ];
    lines.extend(tide_lines(tides));

    lines.join("\n")
}

/// Formats tides as "HH:MM Uhr - Flut/Ebbe", one per distinct minute (last one wins)
/// sorted by time of day
///
/// # Arguments
///
/// * 'tides' - tide extremes of the day as (type, local time)
fn tide_lines(tides: &[(String, DateTime<Tz>)]) -> Vec<String> {
    let mut unique: BTreeMap<String, &str> = BTreeMap::new();
    for (tide_type, time) in tides {
        let label = if tide_type == "High" { "Flut" } else { "Ebbe" };
        unique.insert(hm(time), label);
    }

    unique.into_iter()
        .map(|(time, label)| format!("{} Uhr - {}", time, label))
        .collect()
}

fn hm(time: &DateTime<Tz>) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        Berlin.with_ymd_and_hms(2025, 10, 19, h, m, 0).unwrap()
    }

    fn sun() -> SunTimes {
        SunTimes { sunrise: at(7, 55), sunset: at(18, 21), dawn: at(7, 18), dusk: at(18, 58) }
    }

    #[test]
    fn overview_lists_sun_times() {
        let text = day_overview(&sun(), &[]);
        let lines = text.lines().collect::<Vec<&str>>();
        assert_eq!(lines[0], "🌅 SA: 07:55");
        assert_eq!(lines[1], "🌇 SU: 18:21");
        assert_eq!(lines[2], "🔵 BS morgens: 07:18 – 07:55");
        assert_eq!(lines[3], "🔵 BS abends: 18:21 – 18:58");
        assert_eq!(lines[4], "✨ GS morgens: 07:55 – 08:55");
        assert_eq!(lines[5], "✨ GS abends: 17:21 – 18:21");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "🌊 Gezeiten:");
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn tides_are_sorted_and_deduplicated() {
        let tides = vec![
            ("Low".to_string(), at(13, 40)),
            ("High".to_string(), at(7, 2)),
            ("High".to_string(), at(19, 31)),
            ("Low".to_string(), at(7, 2)),
        ];
        let text = day_overview(&sun(), &tides);
        let tail = text.lines().skip(8).collect::<Vec<&str>>();
        assert_eq!(tail, vec!["07:02 Uhr - Ebbe", "13:40 Uhr - Ebbe", "19:31 Uhr - Flut"]);
    }
}
