//! Tolerant date parsing for feed timestamps.
//!
//! Layouts are tried in order and the first match wins. An empty or
//! unparseable string yields `None` so a bad date never fails a feed.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};

/// How a layout expresses the weekday
#[derive(Clone, Copy)]
enum Day {
    None,
    /// "Mon " as in ANSI C / Unix dates
    Bare,
    /// "Mon, " as in RFC 1123 / RFC 850
    Comma,
}

/// Where a layout carries its zone
#[derive(Clone, Copy)]
enum Zone {
    /// No zone; the time is taken as UTC
    None,
    /// `%z` numeric offset inside the format
    Numeric,
    /// Alphabetic abbreviation as the last token
    NamedLast,
    /// Alphabetic abbreviation as the second to last token (Unix date)
    NamedBeforeYear,
}

struct Layout {
    day: Day,
    zone: Zone,
    format: &'static str,
}

// RFC 3339 is handled by chrono directly and sits third, between RFC822Z and UnixDate.
const RFC822: Layout = Layout { day: Day::None, zone: Zone::NamedLast, format: "%d %b %y %H:%M" };
const RFC822Z: Layout = Layout { day: Day::None, zone: Zone::Numeric, format: "%d %b %y %H:%M %z" };
const LATER_LAYOUTS: &[Layout] = &[
    // UnixDate: Mon Jan _2 15:04:05 MST 2006
    Layout { day: Day::Bare, zone: Zone::NamedBeforeYear, format: "%b %d %H:%M:%S %Y" },
    // RubyDate: Mon Jan 02 15:04:05 -0700 2006
    Layout { day: Day::Bare, zone: Zone::Numeric, format: "%b %d %H:%M:%S %z %Y" },
    // RFC850: Monday, 02-Jan-06 15:04:05 MST
    Layout { day: Day::Comma, zone: Zone::NamedLast, format: "%d-%b-%y %H:%M:%S" },
    // RFC1123Z: Mon, 02 Jan 2006 15:04:05 -0700
    Layout { day: Day::Comma, zone: Zone::Numeric, format: "%d %b %Y %H:%M:%S %z" },
    // RFC1123: Mon, 02 Jan 2006 15:04:05 MST
    Layout { day: Day::Comma, zone: Zone::NamedLast, format: "%d %b %Y %H:%M:%S" },
    // ANSIC: Mon Jan _2 15:04:05 2006
    Layout { day: Day::Bare, zone: Zone::None, format: "%b %d %H:%M:%S %Y" },
];

/// Parse a feed date, returning `None` for empty or unrecognized input
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    if let Some(dt) = RFC822.parse(&tokens).or_else(|| RFC822Z.parse(&tokens)) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&tokens.join(" ")) {
        return Some(dt.with_timezone(&Utc));
    }
    LATER_LAYOUTS.iter().find_map(|layout| layout.parse(&tokens))
}

impl Layout {
    fn parse(&self, tokens: &[&str]) -> Option<DateTime<Utc>> {
        let tokens = self.strip_weekday(tokens)?;

        let (rest, zone) = match self.zone {
            Zone::None | Zone::Numeric => (tokens.to_vec(), None),
            Zone::NamedLast => {
                let (zone, rest) = tokens.split_last()?;
                (rest.to_vec(), Some(*zone))
            }
            Zone::NamedBeforeYear => {
                if tokens.len() < 2 {
                    return None;
                }
                let mut rest = tokens.to_vec();
                let zone = rest.remove(rest.len() - 2);
                (rest, Some(zone))
            }
        };
        let rest = rest.join(" ");

        match self.zone {
            Zone::Numeric => DateTime::parse_from_str(&rest, self.format)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Zone::None => NaiveDateTime::parse_from_str(&rest, self.format)
                .ok()
                .map(|naive| naive.and_utc()),
            Zone::NamedLast | Zone::NamedBeforeYear => {
                let offset = zone.and_then(zone_offset)?;
                let naive = NaiveDateTime::parse_from_str(&rest, self.format).ok()?;
                offset
                    .from_local_datetime(&naive)
                    .single()
                    .map(|dt| dt.with_timezone(&Utc))
            }
        }
    }

    /// Drop the leading weekday after checking its syntax; its value is ignored
    fn strip_weekday<'a>(&self, tokens: &'a [&'a str]) -> Option<&'a [&'a str]> {
        match self.day {
            Day::None => Some(tokens),
            Day::Bare | Day::Comma => {
                let (first, rest) = tokens.split_first()?;
                let name = match self.day {
                    Day::Comma => first.strip_suffix(',')?,
                    _ => first,
                };
                name.parse::<Weekday>().ok()?;
                Some(rest)
            }
        }
    }
}

/// Offset for a zone abbreviation. Unknown alphabetic abbreviations are
/// taken as UTC; anything else is not a zone.
fn zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let hours = match zone.to_ascii_uppercase().as_str() {
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => 0,
    };
    FixedOffset::east_opt(hours * 3600)
}
