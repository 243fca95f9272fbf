// Cron field parsing
//
// One schedule field (`*`, `*/2`, `5,8,9`, `2-30/2`, `1,2,10-15`) expands
// into the concrete set of integers it allows within the field's valid
// numeric range.

use crate::errors::ScheduleError;
use regex::Regex;
use std::collections::HashSet;

lazy_static::lazy_static! {
    static ref STEP_REGEX: Regex = Regex::new(r"^(.*)/(\d+)$").expect("Invalid regex pattern");
    static ref RANGE_REGEX: Regex = Regex::new(r"^(\d+)-(\d+)$").expect("Invalid regex pattern");
}

/// The set of integer values one schedule field allows.
#[derive(Debug, Clone)]
pub struct FieldSet {
    values: HashSet<u32>,
}

impl FieldSet {
    /// Expand a field expression into the values it allows within the
    /// closed range `[min, max]`.
    ///
    /// Grammar, in precedence order: `*` (the full range), `<base>/<step>`
    /// where the base is `*`, empty (both meaning the full range) or a
    /// `<a>-<b>` sub-range, and finally a comma list of integers and
    /// `<a>-<b>` ranges. A successful parse never yields an empty set.
    pub fn parse(field: &str, min: u32, max: u32) -> Result<FieldSet, ScheduleError> {
        let values = if field == "*" {
            (min..=max).collect()
        } else if let Some(caps) = STEP_REGEX.captures(field) {
            expand_step(field, &caps[1], &caps[2], min, max)?
        } else {
            expand_list(field, min, max)?
        };

        if values.is_empty() {
            return Err(ScheduleError::EmptyField {
                field: field.to_string(),
            });
        }
        Ok(FieldSet { values })
    }

    /// True when `value` is allowed by this field.
    pub fn contains(&self, value: u32) -> bool {
        self.values.contains(&value)
    }

    /// Number of values the field allows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True for a cleared set, which matches nothing.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A set allowing no values. Used by the day/day-of-week union rule.
    pub(crate) fn empty() -> FieldSet {
        FieldSet {
            values: HashSet::new(),
        }
    }
}

/// Expand `<base>/<step>`: every `step`-th value from the base's lower
/// bound up to its upper bound.
fn expand_step(
    field: &str,
    base: &str,
    step: &str,
    min: u32,
    max: u32,
) -> Result<HashSet<u32>, ScheduleError> {
    let step: u32 = step.parse().map_err(|_| ScheduleError::Unparsable {
        token: step.to_string(),
        field: field.to_string(),
    })?;
    if step == 0 {
        return Err(ScheduleError::ZeroStep {
            field: field.to_string(),
        });
    }

    // An empty or `*` base steps over the whole range.
    let (lo, hi) = if base.is_empty() || base == "*" {
        (min, max)
    } else if let Some(rng) = RANGE_REGEX.captures(base) {
        parse_range(field, &rng[1], &rng[2], min, max)?
    } else {
        return Err(ScheduleError::Unparsable {
            token: base.to_string(),
            field: field.to_string(),
        });
    };

    Ok((lo..=hi).step_by(step as usize).collect())
}

/// Expand a comma list of bare integers and `<a>-<b>` ranges.
fn expand_list(field: &str, min: u32, max: u32) -> Result<HashSet<u32>, ScheduleError> {
    let mut values = HashSet::new();
    for token in field.split(',') {
        if let Some(rng) = RANGE_REGEX.captures(token) {
            let (lo, hi) = parse_range(field, &rng[1], &rng[2], min, max)?;
            // An inverted range contributes nothing; the caller's
            // empty-set check rejects the field if nothing else matched.
            values.extend(lo..=hi);
        } else if let Ok(value) = token.parse::<i64>() {
            if value < i64::from(min) || value > i64::from(max) {
                return Err(ScheduleError::OutOfRange {
                    value,
                    field: field.to_string(),
                    min,
                    max,
                });
            }
            values.insert(value as u32);
        } else {
            return Err(ScheduleError::Unparsable {
                token: token.to_string(),
                field: field.to_string(),
            });
        }
    }
    Ok(values)
}

/// Resolve the two bounds of an `<a>-<b>` range and check them against
/// the field's valid range.
fn parse_range(
    field: &str,
    lo: &str,
    hi: &str,
    min: u32,
    max: u32,
) -> Result<(u32, u32), ScheduleError> {
    let lo: u32 = lo.parse().map_err(|_| ScheduleError::Unparsable {
        token: lo.to_string(),
        field: field.to_string(),
    })?;
    let hi: u32 = hi.parse().map_err(|_| ScheduleError::Unparsable {
        token: hi.to_string(),
        field: field.to_string(),
    })?;
    if lo < min {
        return Err(ScheduleError::OutOfRange {
            value: i64::from(lo),
            field: field.to_string(),
            min,
            max,
        });
    }
    if hi > max {
        return Err(ScheduleError::OutOfRange {
            value: i64::from(hi),
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok((lo, hi))
}
