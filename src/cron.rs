//! Five-field cron expression matching and validation.
//!
//! Fields are `minute hour day-of-month month day-of-week`, each one of:
//! `*`, `*/N`, a comma list of integers and/or inclusive `A-B` ranges.

use crate::error::{Error, Result};

/// A point in wall-clock time, reduced to the fields a cron expression can
/// match against. Construct from whatever calendar type the host uses.
#[derive(Debug, Clone, Copy)]
pub struct CronInstant {
    /// Minute of the hour, 0-59.
    pub minute: u32,
    /// Hour of the day, 0-23.
    pub hour: u32,
    /// Day of the month, 1-31.
    pub day_of_month: u32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of week, 0-6, 0 = Sunday.
    pub day_of_week: u32,
}

#[derive(Debug, Clone, Copy)]
struct FieldBounds {
    min: u32,
    max: u32,
    name: &'static str,
}

const FIELD_BOUNDS: [FieldBounds; 5] = [
    FieldBounds {
        min: 0,
        max: 59,
        name: "minute",
    },
    FieldBounds {
        min: 0,
        max: 23,
        name: "hour",
    },
    FieldBounds {
        min: 1,
        max: 31,
        name: "day-of-month",
    },
    FieldBounds {
        min: 1,
        max: 12,
        name: "month",
    },
    FieldBounds {
        min: 0,
        max: 6,
        name: "day-of-week",
    },
];

/// A parsed cron expression, ready to be matched repeatedly.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    fields: [Vec<FieldTerm>; 5],
    raw: String,
}

#[derive(Debug, Clone, Copy)]
enum FieldTerm {
    Wildcard,
    Step(u32),
    Value(u32),
    Range(u32, u32),
}

impl CronSchedule {
    /// Parses `expr` without bounds-checking individual values; invalid
    /// tokens are kept but will simply never match (see [`matches`]).
    ///
    /// Use [`validate`] to reject malformed expressions outright.
    ///
    /// # Errors
    /// Returns an error only if the expression does not split into exactly
    /// five whitespace-separated fields.
    ///
    /// [`matches`]: CronSchedule::matches
    /// [`validate`]: validate
    pub fn parse(expr: &str) -> Result<Self> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(Error::validation(format!(
                "expected 5 fields, found {}",
                parts.len()
            )));
        }
        let mut fields: [Vec<FieldTerm>; 5] = Default::default();
        for (i, part) in parts.iter().enumerate() {
            fields[i] = parse_field_lenient(part);
        }
        Ok(Self {
            fields,
            raw: expr.to_string(),
        })
    }

    /// Returns the original expression text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// A human-readable label for diagnostics and log messages, not part of
    /// the script-facing surface: `"cron(<expr>)"`.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("cron({})", self.raw)
    }

    /// Whether `instant` matches this schedule. Any field containing a
    /// syntactically invalid token silently evaluates to "does not match"
    /// for that field (and therefore the whole expression).
    #[must_use]
    pub fn matches(&self, instant: CronInstant) -> bool {
        let values = [
            instant.minute,
            instant.hour,
            instant.day_of_month,
            instant.month,
            instant.day_of_week,
        ];
        self.fields
            .iter()
            .zip(values)
            .all(|(terms, value)| field_matches(terms, value))
    }
}

fn field_matches(terms: &[FieldTerm], value: u32) -> bool {
    if terms.is_empty() {
        return false;
    }
    terms.iter().any(|term| match *term {
        FieldTerm::Wildcard => true,
        FieldTerm::Step(n) => n >= 1 && value % n == 0,
        FieldTerm::Value(v) => v == value,
        FieldTerm::Range(a, b) => a <= b && (a..=b).contains(&value),
    })
}

fn parse_field_lenient(field: &str) -> Vec<FieldTerm> {
    if field == "*" {
        return vec![FieldTerm::Wildcard];
    }
    if let Some(step) = field.strip_prefix("*/") {
        return match step.parse::<u32>() {
            Ok(n) if n >= 1 => vec![FieldTerm::Step(n)],
            _ => vec![],
        };
    }
    field
        .split(',')
        .map(parse_term_lenient)
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default()
}

fn parse_term_lenient(term: &str) -> Option<FieldTerm> {
    if let Some((a, b)) = term.split_once('-') {
        let a: u32 = a.parse().ok()?;
        let b: u32 = b.parse().ok()?;
        if a > b {
            return None;
        }
        return Some(FieldTerm::Range(a, b));
    }
    term.parse().ok().map(FieldTerm::Value)
}

/// Validates a cron expression, returning a field-specific error message on
/// the first violation found.
///
/// # Errors
/// Returns a validation error describing which field and rule failed.
pub fn validate(expr: &str) -> Result<()> {
    let parts: Vec<&str> = expr.split_whitespace().collect();
    if parts.len() != 5 {
        return Err(Error::validation(format!(
            "expected 5 fields, found {}",
            parts.len()
        )));
    }
    for (part, bounds) in parts.iter().zip(FIELD_BOUNDS) {
        validate_field(part, bounds)?;
    }
    Ok(())
}

fn validate_field(field: &str, bounds: FieldBounds) -> Result<()> {
    if field == "*" {
        return Ok(());
    }
    if let Some(step) = field.strip_prefix("*/") {
        let n: u32 = step
            .parse()
            .map_err(|_| Error::validation(format!("{}: invalid step '{field}'", bounds.name)))?;
        if n < 1 {
            return Err(Error::validation(format!(
                "{}: step must be >= 1 in '{field}'",
                bounds.name
            )));
        }
        return Ok(());
    }
    for term in field.split(',') {
        validate_term(term, bounds)?;
    }
    Ok(())
}

fn validate_term(term: &str, bounds: FieldBounds) -> Result<()> {
    if let Some((a, b)) = term.split_once('-') {
        let a: u32 = a
            .parse()
            .map_err(|_| Error::validation(format!("{}: invalid range '{term}'", bounds.name)))?;
        let b: u32 = b
            .parse()
            .map_err(|_| Error::validation(format!("{}: invalid range '{term}'", bounds.name)))?;
        if a > b {
            return Err(Error::validation(format!(
                "{}: range start exceeds end in '{term}'",
                bounds.name
            )));
        }
        check_bounds(a, bounds)?;
        check_bounds(b, bounds)?;
        return Ok(());
    }
    let v: u32 = term
        .parse()
        .map_err(|_| Error::validation(format!("{}: invalid value '{term}'", bounds.name)))?;
    check_bounds(v, bounds)
}

fn check_bounds(v: u32, bounds: FieldBounds) -> Result<()> {
    if v < bounds.min || v > bounds.max {
        return Err(Error::validation(format!(
            "{}: {v} out of range [{}, {}]",
            bounds.name, bounds.min, bounds.max
        )));
    }
    Ok(())
}

/// Convenience wrapper: parses `expr` and evaluates it against `instant` in
/// one call. Parse failure (wrong field count) is treated as no match.
#[must_use]
pub fn matches(expr: &str, instant: CronInstant) -> bool {
    CronSchedule::parse(expr)
        .map(|schedule| schedule.matches(instant))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(minute: u32, hour: u32) -> CronInstant {
        CronInstant {
            minute,
            hour,
            day_of_month: 1,
            month: 1,
            day_of_week: 0,
        }
    }

    #[test]
    fn describe_wraps_the_original_expression() {
        let schedule = CronSchedule::parse("*/5 9 * * 1-5").unwrap();
        assert_eq!(schedule.describe(), "cron(*/5 9 * * 1-5)");
    }

    #[test]
    fn wildcard_matches_everything() {
        assert!(matches("* * * * *", at(45, 12)));
        assert!(matches("* * * * *", at(0, 0)));
    }

    #[test]
    fn step_every_15_minutes() {
        assert!(matches("*/15 * * * *", at(45, 12)));
        assert!(!matches("*/15 * * * *", at(13, 12)));
    }

    #[test]
    fn comma_list_and_range() {
        assert!(matches("0,30 9-17 * * *", at(30, 14)));
        assert!(!matches("0,30 9-17 * * *", at(15, 14)));
        assert!(!matches("0,30 9-17 * * *", at(30, 20)));
    }

    #[test]
    fn wrong_field_count_fails_match_and_validate() {
        assert!(!matches("* * * *", at(0, 0)));
        assert!(validate("* * * *").is_err());
    }

    #[test]
    fn invalid_token_fails_silently_in_match_but_loudly_in_validate() {
        assert!(!matches("xx * * * *", at(0, 0)));
        assert!(validate("xx * * * *").is_err());
    }

    #[test]
    fn validate_enforces_bounds_on_range_endpoints() {
        assert!(validate("0-70 * * * *").is_err());
        assert!(validate("0-30 * * * *").is_ok());
    }

    #[test]
    fn validate_rejects_backwards_range() {
        assert!(validate("30-10 * * * *").is_err());
    }

    #[test]
    fn validate_accepts_full_valid_expression() {
        assert!(validate("*/15 9-17 1,15 1-6 1-5").is_ok());
    }

    proptest::proptest! {
        #[test]
        fn valid_expressions_never_panic_on_match(
            minute in 0u32..60, hour in 0u32..24, dom in 1u32..32, month in 1u32..13, dow in 0u32..7,
        ) {
            let expr = format!("{minute} {hour} {dom} {month} {dow}");
            proptest::prop_assert!(validate(&expr).is_ok());
            proptest::prop_assert!(matches(&expr, CronInstant {
                minute, hour, day_of_month: dom, month, day_of_week: dow,
            }));
        }
    }
}
