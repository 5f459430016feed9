//! Broadcast schedule: show definitions, the built-in Radio 47 lineup, and
//! the on-air / upcoming-show resolution used by every screen.
//!
//! All resolution is wall-clock (device local) at minute granularity. Shows
//! carry their window as the display string `"HH:MM - HH:MM"`; the string is
//! also the parse source, so the resolver never disagrees with what the user
//! sees.

use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Artwork reference used when a show has no dedicated image.
pub const DEFAULT_ARTWORK: &str = "default.png";

/// Number of entries the "Coming Up Next" strip shows.
pub const UPCOMING_COUNT: usize = 5;

const MINUTES_PER_DAY: i32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub name: String,
    pub host: String,
    /// Wall-clock window, `"HH:MM - HH:MM"`. May cross midnight.
    pub time: String,
    /// Human-readable recurrence descriptor. Display only — never parsed.
    pub days: String,
    /// Opaque artwork reference.
    #[serde(default)]
    pub image: String,
}

impl Show {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        time: impl Into<String>,
        days: impl Into<String>,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            time: time.into(),
            days: days.into(),
            image: image.into(),
        }
    }

    /// Synthesized placeholder returned whenever no scheduled show matches.
    pub fn off_studio() -> Self {
        Self::new(
            "Off Studio",
            "With our Amazing DJs",
            "24/7",
            "All Days",
            DEFAULT_ARTWORK,
        )
    }

    /// Off-studio filler (explicit slot or synthesized). Cannot be liked.
    pub fn is_off_studio(&self) -> bool {
        self.name == "Off Studio"
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TimeWindowError {
    #[error("malformed clock time: {0:?}")]
    BadClock(String),
    #[error("malformed time window: {0:?}")]
    BadWindow(String),
}

/// Parse `"HH:MM"` into minutes since midnight.
pub fn parse_clock(s: &str) -> Result<u32, TimeWindowError> {
    let bad = || TimeWindowError::BadClock(s.to_string());
    let (hour, minute) = s.trim().split_once(':').ok_or_else(|| bad())?;
    let hour: u32 = hour.parse().map_err(|_| bad())?;
    let minute: u32 = minute.parse().map_err(|_| bad())?;
    if hour > 23 || minute > 59 {
        return Err(bad());
    }
    Ok(hour * 60 + minute)
}

/// Parse `"HH:MM - HH:MM"` into (start, end) minutes since midnight.
pub fn parse_window(s: &str) -> Result<(u32, u32), TimeWindowError> {
    let (start, end) = s
        .split_once(" - ")
        .ok_or_else(|| TimeWindowError::BadWindow(s.to_string()))?;
    Ok((parse_clock(start)?, parse_clock(end)?))
}

/// Resolve which show is on air at `now`.
///
/// First match in declaration order wins; entries are expected
/// non-overlapping so order only breaks ties in invalid data. Windows whose
/// nominal end hour precedes their start hour cross midnight: the end is
/// pushed into the next day, and when the current hour is still before the
/// nominal end hour the start is pulled into the previous day so a
/// post-midnight `now` matches a window opened the previous evening.
///
/// Never fails: returns [`Show::off_studio`] when nothing matches, and skips
/// (with a warning) entries whose window does not parse.
pub fn current_show(shows: &[Show], now: NaiveTime) -> Show {
    let current_minute = (now.hour() * 60 + now.minute()) as i32;

    for show in shows {
        let (start, end) = match parse_window(&show.time) {
            Ok(w) => w,
            Err(e) => {
                warn!("schedule entry {:?} skipped: {}", show.name, e);
                continue;
            }
        };

        let start_hour = start / 60;
        let end_hour = end / 60;
        let mut start = start as i32;
        let mut end = end as i32;

        if end_hour < start_hour {
            end += MINUTES_PER_DAY;
            if now.hour() < end_hour {
                start -= MINUTES_PER_DAY;
            }
        }

        if current_minute >= start && current_minute < end {
            return show.clone();
        }
    }

    Show::off_studio()
}

/// Resolve up to `count` shows that have not started yet, looking across
/// today and tomorrow.
///
/// A show starting at exactly `now` is not upcoming (strict greater-than).
/// Tomorrow's occurrences get a `"Tomorrow HH:MM - HH:MM"` display label;
/// today's keep the raw window. The result is ascending by time-until-start
/// and may be empty — substituting a placeholder card is the caller's
/// business, not the resolver's.
pub fn upcoming_shows(shows: &[Show], now: NaiveTime, count: usize) -> Vec<Show> {
    let current_minute = (now.hour() * 60 + now.minute()) as i32;

    let mut upcoming: Vec<(i32, Show)> = Vec::new();
    for day_offset in 0..2 {
        for show in shows {
            let start = match parse_window(&show.time) {
                Ok((start, _)) => start as i32,
                Err(e) => {
                    if day_offset == 0 {
                        warn!("schedule entry {:?} skipped: {}", show.name, e);
                    }
                    continue;
                }
            };

            let absolute_start = start + day_offset * MINUTES_PER_DAY;
            if absolute_start > current_minute {
                let mut entry = show.clone();
                if day_offset == 1 {
                    entry.time = format!("Tomorrow {}", show.time);
                }
                upcoming.push((absolute_start, entry));
            }
        }
    }

    upcoming.sort_by_key(|(start, _)| *start);
    upcoming.truncate(count);
    upcoming.into_iter().map(|(_, show)| show).collect()
}

/// Human label for how far away a window's next start is, wrapping to
/// tomorrow when the start already passed today: `"in 2h 15m"`,
/// `"in 40 minutes"`.
pub fn time_until_start(window: &str, now: NaiveTime) -> Option<String> {
    let (start, _) = parse_window(window).ok()?;
    let current_minute = (now.hour() * 60 + now.minute()) as i32;

    let mut until = start as i32 - current_minute;
    if until < 0 {
        until += MINUTES_PER_DAY;
    }

    let hours = until / 60;
    let minutes = until % 60;
    Some(if hours > 24 {
        format!("in {} days", hours / 24)
    } else if hours > 0 {
        format!("in {}h {}m", hours, minutes)
    } else {
        format!("in {} minutes", minutes)
    })
}

/// The station's weekly programming, one template per recurring day kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub weekday: Vec<Show>,
    #[serde(default)]
    pub saturday: Vec<Show>,
    #[serde(default)]
    pub sunday: Vec<Show>,
}

impl Schedule {
    pub fn shows_for(&self, day: Weekday) -> &[Show] {
        match day {
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
            _ => &self.weekday,
        }
    }

    /// The Radio 47 lineup shipped with the app. Overnight hours are an
    /// explicit "Off Studio" slot on weekdays; weekend gaps fall through to
    /// the synthesized fallback.
    pub fn builtin() -> Self {
        Self {
            weekday: vec![
                Show::new(
                    "Nuru 47",
                    "Eva Mwalili (Mama wa Taifa)",
                    "04:00 - 06:00",
                    "Weekdays",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Breakfast 47",
                    "Emmanuel Mwashumbe and Mkamburi Chigogo",
                    "06:00 - 10:00",
                    "Weekdays",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Mchikicho",
                    "Mwanaisha Chidzuga",
                    "10:00 - 13:00",
                    "Weekdays",
                    "Mchikicho.png",
                ),
                Show::new(
                    "Baze 47",
                    "Manucho The Young Turk",
                    "13:00 - 15:00",
                    "Weekdays",
                    "Base-47.png",
                ),
                Show::new(
                    "Maskani",
                    "Billy Miya and Mbaruk Mwalimu",
                    "15:00 - 19:00",
                    "Weekdays",
                    "Maskani-47.png",
                ),
                Show::new(
                    "Chemba",
                    "Dr. Ofweneke",
                    "20:00 - 23:00",
                    "Weekdays",
                    "Chemba.png",
                ),
                Show::new(
                    "Off Studio",
                    "With our Amazing DJs",
                    "23:00 - 04:00",
                    "All Days",
                    DEFAULT_ARTWORK,
                ),
            ],
            saturday: vec![
                Show::new(
                    "Sabato Yako",
                    "Radio 47 DJ",
                    "04:00 - 06:00",
                    "Saturday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Bahari ya Elimu",
                    "Ali Hassan Kaluleni",
                    "07:00 - 11:00",
                    "Saturday",
                    "Bahari-Ya-Elimu.png",
                ),
                Show::new(
                    "Sato Vibe",
                    "Mkamburi Chigogo",
                    "11:00 - 14:00",
                    "Saturday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Dread Beat Reloaded",
                    "Radio 47 DJ",
                    "14:00 - 16:00",
                    "Saturday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Mikiki ya Spoti",
                    "Sports Team",
                    "16:00 - 20:00",
                    "Saturday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Burdan Satoo",
                    "Radio 47 DJ",
                    "20:00 - 00:00",
                    "Saturday",
                    DEFAULT_ARTWORK,
                ),
            ],
            sunday: vec![
                Show::new(
                    "Radio 47 Jumapili",
                    "Eva Mwalili (Mama wa Taifa)",
                    "05:00 - 10:00",
                    "Sunday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Gospel Automation",
                    "Radio 47 DJ",
                    "10:00 - 13:00",
                    "Sunday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Dread Beat Reloaded",
                    "Radio 47 DJ",
                    "13:00 - 16:00",
                    "Sunday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Mikiki ya Spoti",
                    "Sports Team",
                    "16:00 - 20:00",
                    "Sunday",
                    DEFAULT_ARTWORK,
                ),
                Show::new(
                    "Kali za Kale",
                    "Radio 47 DJ",
                    "20:00 - 22:00",
                    "Sunday",
                    DEFAULT_ARTWORK,
                ),
            ],
        }
    }

    /// Warn about overlapping windows within each day template. Overlap is
    /// not fatal — resolution stays deterministic (first match wins) — but
    /// it means the file disagrees with itself.
    pub fn warn_on_overlaps(&self) {
        for (label, shows) in [
            ("weekday", &self.weekday),
            ("saturday", &self.saturday),
            ("sunday", &self.sunday),
        ] {
            let mut windows = Vec::new();
            for show in shows {
                if let Ok((start, end)) = parse_window(&show.time) {
                    let end = if end <= start { end + MINUTES_PER_DAY as u32 } else { end };
                    windows.push((start, end, show.name.as_str()));
                }
            }
            for (i, a) in windows.iter().enumerate() {
                for b in windows.iter().skip(i + 1) {
                    if a.0 < b.1 && b.0 < a.1 {
                        warn!(
                            "{} schedule: {:?} overlaps {:?}",
                            label, a.2, b.2
                        );
                    }
                }
            }
        }
    }
}

pub fn parse_schedule_from_toml_str(content: &str) -> anyhow::Result<Schedule> {
    let schedule: Schedule = toml::from_str(content)?;
    Ok(schedule)
}

pub fn load_schedule_from_toml(path: &std::path::Path) -> anyhow::Result<Schedule> {
    let content = std::fs::read_to_string(path)?;
    parse_schedule_from_toml_str(&content)
}

/// Load the schedule file, falling back to the built-in lineup when the file
/// is absent or does not parse. Never fails.
pub fn load_or_builtin(path: &std::path::Path) -> Schedule {
    if !path.exists() {
        return Schedule::builtin();
    }
    match load_schedule_from_toml(path) {
        Ok(schedule) => {
            schedule.warn_on_overlaps();
            schedule
        }
        Err(e) => {
            warn!("failed to load schedule from {:?}: {}; using builtin", path, e);
            Schedule::builtin()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn two_shows() -> Vec<Show> {
        vec![
            Show::new("A", "Host A", "04:00 - 06:00", "Weekdays", ""),
            Show::new("B", "Host B", "06:00 - 10:00", "Weekdays", ""),
        ]
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("04:00"), Ok(240));
        assert_eq!(parse_clock("23:59"), Ok(1439));
        assert_eq!(parse_clock("00:00"), Ok(0));
        assert!(parse_clock("24:00").is_err());
        assert!(parse_clock("12:60").is_err());
        assert!(parse_clock("noon").is_err());
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window("04:00 - 06:00"), Ok((240, 360)));
        assert!(parse_window("24/7").is_err());
        assert!(parse_window("04:00-06:00").is_err());
    }

    #[test]
    fn test_current_show_mid_window() {
        let show = current_show(&two_shows(), t(5, 0));
        assert_eq!(show.name, "A");
    }

    #[test]
    fn test_current_show_start_inclusive_end_exclusive() {
        let shows = two_shows();
        assert_eq!(current_show(&shows, t(4, 0)).name, "A");
        // 06:00 belongs to the next window, not the one ending there
        assert_eq!(current_show(&shows, t(6, 0)).name, "B");
        assert_eq!(current_show(&shows, t(9, 59)).name, "B");
    }

    #[test]
    fn test_current_show_gap_synthesizes_fallback() {
        let show = current_show(&two_shows(), t(23, 30));
        assert_eq!(show.name, "Off Studio");
        assert_eq!(show.time, "24/7");
        assert_eq!(show.days, "All Days");
    }

    #[test]
    fn test_current_show_empty_schedule() {
        assert_eq!(current_show(&[], t(12, 0)).name, "Off Studio");
    }

    #[test]
    fn test_current_show_midnight_crossing() {
        let shows = vec![Show::new("Night", "DJ", "23:00 - 04:00", "All Days", "")];
        // Evening side of the window
        assert_eq!(current_show(&shows, t(23, 30)).name, "Night");
        // Post-midnight side of the same window
        assert_eq!(current_show(&shows, t(3, 30)).name, "Night");
        assert_eq!(current_show(&shows, t(0, 0)).name, "Night");
        // Just outside either edge
        assert_eq!(current_show(&shows, t(22, 59)).name, "Off Studio");
        assert_eq!(current_show(&shows, t(4, 0)).name, "Off Studio");
    }

    #[test]
    fn test_current_show_window_ending_at_midnight() {
        let shows = vec![Show::new("Late", "DJ", "20:00 - 00:00", "Saturday", "")];
        assert_eq!(current_show(&shows, t(23, 59)).name, "Late");
        assert_eq!(current_show(&shows, t(0, 0)).name, "Off Studio");
    }

    #[test]
    fn test_current_show_window_starting_near_midnight() {
        // No midnight crossing, so the asymmetric correction must not kick in
        let shows = vec![Show::new("Early", "DJ", "00:05 - 01:00", "All Days", "")];
        assert_eq!(current_show(&shows, t(0, 30)).name, "Early");
        assert_eq!(current_show(&shows, t(0, 4)).name, "Off Studio");
        assert_eq!(current_show(&shows, t(1, 0)).name, "Off Studio");
    }

    #[test]
    fn test_current_show_skips_malformed_window() {
        let shows = vec![
            Show::new("Broken", "DJ", "whenever", "All Days", ""),
            Show::new("Good", "DJ", "00:00 - 23:59", "All Days", ""),
        ];
        assert_eq!(current_show(&shows, t(12, 0)).name, "Good");
    }

    #[test]
    fn test_upcoming_excludes_exact_start() {
        // A show starting exactly now is current, not upcoming
        let upcoming = upcoming_shows(&two_shows(), t(4, 0), UPCOMING_COUNT);
        assert_eq!(upcoming[0].name, "B");
    }

    #[test]
    fn test_upcoming_sorted_and_capped() {
        let shows = Schedule::builtin().weekday;
        let upcoming = upcoming_shows(&shows, t(5, 0), UPCOMING_COUNT);
        assert_eq!(upcoming.len(), UPCOMING_COUNT);
        assert_eq!(upcoming[0].name, "Breakfast 47");
        assert_eq!(upcoming[1].name, "Mchikicho");
        // All of today's remaining shows start before any tomorrow entry
        assert!(upcoming.iter().all(|s| !s.time.starts_with("Tomorrow")));
    }

    #[test]
    fn test_upcoming_wraps_into_tomorrow() {
        let upcoming = upcoming_shows(&two_shows(), t(5, 0), UPCOMING_COUNT);
        // Only B remains today; both come around again tomorrow
        assert_eq!(upcoming.len(), 3);
        assert_eq!(upcoming[0].name, "B");
        assert_eq!(upcoming[0].time, "06:00 - 10:00");
        assert_eq!(upcoming[1].name, "A");
        assert_eq!(upcoming[1].time, "Tomorrow 04:00 - 06:00");
        assert_eq!(upcoming[2].time, "Tomorrow 06:00 - 10:00");
    }

    #[test]
    fn test_upcoming_only_tomorrow_entries_late_in_day() {
        let upcoming = upcoming_shows(&two_shows(), t(11, 0), UPCOMING_COUNT);
        assert_eq!(upcoming.len(), 2);
        assert!(upcoming.iter().all(|s| s.time.starts_with("Tomorrow")));
    }

    #[test]
    fn test_upcoming_empty_after_everything() {
        // Nothing scheduled at all: nothing upcoming, and that is valid
        assert!(upcoming_shows(&[], t(12, 0), UPCOMING_COUNT).is_empty());
    }

    #[test]
    fn test_time_until_start() {
        assert_eq!(
            time_until_start("04:00 - 06:00", t(3, 20)),
            Some("in 40 minutes".to_string())
        );
        assert_eq!(
            time_until_start("06:00 - 10:00", t(3, 45)),
            Some("in 2h 15m".to_string())
        );
        // Already started today: next occurrence is tomorrow
        assert_eq!(
            time_until_start("04:00 - 06:00", t(5, 0)),
            Some("in 23h 0m".to_string())
        );
        assert_eq!(time_until_start("24/7", t(5, 0)), None);
    }

    #[test]
    fn test_shows_for_day() {
        let schedule = Schedule::builtin();
        assert_eq!(schedule.shows_for(Weekday::Mon)[0].name, "Nuru 47");
        assert_eq!(schedule.shows_for(Weekday::Fri)[0].name, "Nuru 47");
        assert_eq!(schedule.shows_for(Weekday::Sat)[0].name, "Sabato Yako");
        assert_eq!(schedule.shows_for(Weekday::Sun)[0].name, "Radio 47 Jumapili");
    }

    #[test]
    fn test_schedule_toml_round_trip() {
        let toml_src = r#"
            [[weekday]]
            name = "Morning Drive"
            host = "Someone"
            time = "06:00 - 10:00"
            days = "Weekdays"

            [[saturday]]
            name = "Weekend Mix"
            host = "DJ"
            time = "10:00 - 14:00"
            days = "Saturday"
            image = "mix.png"
        "#;
        let schedule = parse_schedule_from_toml_str(toml_src).unwrap();
        assert_eq!(schedule.weekday.len(), 1);
        assert_eq!(schedule.weekday[0].image, "");
        assert_eq!(schedule.saturday[0].image, "mix.png");
        assert!(schedule.sunday.is_empty());
    }
}
