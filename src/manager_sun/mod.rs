use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use sunrise::{Coordinates, DawnType, SolarDay, SolarEvent};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SunError {
    #[error("SunError::Coordinates: invalid coordinates lat={0}, long={1}")]
    Coordinates(f64, f64),
    #[error("SunError::NoEvent: no {0} on {1}")]
    NoEvent(&'static str, NaiveDate),
}

/// Sun times for one date, all in the local time zone of the location
#[derive(Debug, Clone, PartialEq)]
pub struct SunTimes {
    pub sunrise: DateTime<Tz>,
    pub sunset: DateTime<Tz>,
    pub dawn: DateTime<Tz>,
    pub dusk: DateTime<Tz>,
}

/// Struct for calculating sunrise, sunset and civil twilight for a fixed location
pub struct Sun {
    coordinates: Coordinates,
    tz: Tz,
}

impl Sun {
    /// Returns a Sun struct for the given location
    ///
    /// # Arguments
    ///
    /// * 'lat' - latitude of the location
    /// * 'long' - longitude of the location
    /// * 'tz' - time zone to report local times in
    pub fn new(lat: f64, long: f64, tz: Tz) -> Result<Sun, SunError> {
        let coordinates = Coordinates::new(lat, long)
            .ok_or(SunError::Coordinates(lat, long))?;

        Ok(Self { coordinates, tz })
    }

    /// Returns the sunrise instant for the given date, None if the sun doesn't rise that day
    ///
    /// # Arguments
    ///
    /// * 'date' - the local date
    pub fn sunrise(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        self.event(date, SolarEvent::Sunrise)
    }

    /// Returns sunrise, sunset and civil dawn and dusk for the given date
    ///
    /// # Arguments
    ///
    /// * 'date' - the local date
    pub fn sun_times(&self, date: NaiveDate) -> Result<SunTimes, SunError> {
        let local = |name: &'static str, event: SolarEvent| {
            self.event(date, event)
                .map(|t| t.with_timezone(&self.tz))
                .ok_or(SunError::NoEvent(name, date))
        };

        Ok(SunTimes {
            sunrise: local("sunrise", SolarEvent::Sunrise)?,
            sunset: local("sunset", SolarEvent::Sunset)?,
            dawn: local("dawn", SolarEvent::Dawn(DawnType::Civil))?,
            dusk: local("dusk", SolarEvent::Dusk(DawnType::Civil))?,
        })
    }

    fn event(&self, date: NaiveDate, event: SolarEvent) -> Option<DateTime<Utc>> {
        // None during polar day or night
        Option::from(SolarDay::new(self.coordinates, date).event_time(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Europe::Copenhagen;

    #[test]
    fn invalid_coordinates_are_rejected() {
        assert!(Sun::new(95.0, 9.75, Copenhagen).is_err());
    }

    #[test]
    fn order_of_sun_events() {
        let sun = Sun::new(57.4417, 9.7543, Copenhagen).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let t = sun.sun_times(date).unwrap();
        assert!(t.dawn < t.sunrise);
        assert!(t.sunrise < t.sunset);
        assert!(t.sunset < t.dusk);
        assert_eq!(t.sunrise.date_naive(), date);
        // Early summer sunrise in northern Jutland is before 05:00 local time
        assert!(t.sunrise.hour() < 5);
    }

    #[test]
    fn sunrise_matches_sun_times() {
        let sun = Sun::new(54.2175, 8.5767, chrono_tz::Europe::Berlin).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        let sunrise = sun.sunrise(date).unwrap();
        assert_eq!(sun.sun_times(date).unwrap().sunrise.with_timezone(&Utc), sunrise);
    }
}
