use std::f64::consts::PI;

/// Sun altitude and azimuth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Angle above the horizon (0 = horizon, 90 = zenith).
    pub altitude: f64,

    /// Clockwise from north (0 = N, 90 = E, 180 = S, 270 = W).
    pub azimuth: f64,
}

impl SolarPosition {
    /// Sun position at `latitude` (degrees, positive north) on
    /// `day_of_year` at local solar time `hour`.
    ///
    /// Declination follows Spencer's Fourier series.
    pub fn calculate(latitude: f64, day_of_year: u16, hour: f64) -> Self {
        let lat = latitude.to_radians();
        let declination = declination(day_of_year);
        let hour_angle = (hour - 12.0) * 15_f64.to_radians();

        let sin_alt =
            lat.sin() * declination.sin() + lat.cos() * declination.cos() * hour_angle.cos();
        let altitude = sin_alt.clamp(-1.0, 1.0).asin();

        let cos_azimuth = (declination.sin() * lat.cos()
            - declination.cos() * lat.sin() * hour_angle.cos())
            / altitude.cos().max(1e-10);
        let mut azimuth = cos_azimuth.clamp(-1.0, 1.0).acos().to_degrees();
        if hour_angle > 0.0 {
            azimuth = 360.0 - azimuth;
        }

        Self {
            altitude: altitude.to_degrees(),
            azimuth,
        }
    }

    pub fn is_above_horizon(&self) -> bool {
        self.altitude > 0.0
    }

    /// Angle from the zenith, in radians.
    pub fn zenith(&self) -> f64 {
        (90.0 - self.altitude).to_radians()
    }
}

/// Solar declination in radians.
pub fn declination(day_of_year: u16) -> f64 {
    let gamma = 2.0 * PI * (f64::from(day_of_year) - 1.0) / 365.0;
    let first = 0.399_912 * gamma.cos() - 0.070_257 * gamma.sin();
    let second = 0.006_758 * (2.0 * gamma).cos() - 0.000_907 * (2.0 * gamma).sin();
    let third = 0.002_697 * (3.0 * gamma).cos() - 0.001_48 * (3.0 * gamma).sin();
    0.006_918 - first - second - third
}

/// One daylight sample of the sun's path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunSample {
    pub position: SolarPosition,

    /// Length of the time slot this sample stands for, in hours.
    pub hours: f64,
}

/// Samples the sun's path over one day.
///
/// The day is split into `hour_interval` slots (the last one possibly
/// shorter) and the sun is placed at each slot's midpoint. Slots with
/// the sun at or below the horizon are dropped.
pub fn sun_track(latitude: f64, day_of_year: u16, hour_interval: f64) -> Vec<SunSample> {
    let mut track = Vec::new();
    let mut start = 0.0;
    while start < 24.0 {
        let hours = hour_interval.min(24.0 - start);
        let position = SolarPosition::calculate(latitude, day_of_year, start + hours / 2.0);
        if position.is_above_horizon() {
            track.push(SunSample { position, hours });
        }
        start += hour_interval;
    }
    track
}
