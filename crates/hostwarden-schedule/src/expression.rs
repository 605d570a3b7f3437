//! Schedule expressions and the crontab line they produce.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use hostwarden_config::CrontabSection;

use crate::error::ScheduleError;

/// Crontab day-of-week numbers 0-6; 7 is Sunday again.
const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTH_NAMES: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// The five crontab time fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpec {
    pub minute: String,
    pub hour: String,
    pub day_of_month: String,
    pub month: String,
    pub day_of_week: String,
}

impl Default for ScheduleSpec {
    fn default() -> Self {
        Self {
            minute: "*".to_string(),
            hour: "*".to_string(),
            day_of_month: "*".to_string(),
            month: "*".to_string(),
            day_of_week: "*".to_string(),
        }
    }
}

impl ScheduleSpec {
    /// Fields from the `crontab` section; absent or blank ones become `*`.
    pub fn from_section(section: &CrontabSection) -> Self {
        let field = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or("*")
                .to_string()
        };
        Self {
            minute: field(&section.minute),
            hour: field(&section.hour),
            day_of_month: field(&section.dayofmonth),
            month: field(&section.month),
            day_of_week: field(&section.dayofweek),
        }
    }

    /// `"<min> <hour> <dom> <mon> <dow>"`.
    pub fn expression(&self) -> String {
        self.fields().join(" ")
    }

    fn fields(&self) -> [&str; 5] {
        [
            &self.minute,
            &self.hour,
            &self.day_of_month,
            &self.month,
            &self.day_of_week,
        ]
    }

    /// Parse with crontab semantics.
    pub fn validate(&self) -> Result<cron::Schedule, ScheduleError> {
        let expression = self.expression();
        let invalid = |reason: String| ScheduleError::InvalidExpression {
            expression: expression.clone(),
            reason,
        };

        for field in self.fields() {
            if field.is_empty() || field.contains(char::is_whitespace) {
                return Err(invalid(format!("field '{}' must be a single token", field)));
            }
            check_crontab_grammar(field).map_err(invalid)?;
        }

        let day_of_week = translate_day_of_week(&self.day_of_week).map_err(invalid)?;
        let seconds_form = format!(
            "0 {} {} {} {} {}",
            self.minute, self.hour, self.day_of_month, self.month, day_of_week
        );
        cron::Schedule::from_str(&seconds_form).map_err(|e| invalid(e.to_string()))
    }
}

/// Reject what the `cron` parser accepts but crontab does not (`?`, `L`,
/// `W`, `#`): every atom must be `*`, a number or a month/day name.
fn check_crontab_grammar(field: &str) -> Result<(), String> {
    for atom in field.split([',', '-', '/']) {
        let legal = atom == "*"
            || (!atom.is_empty() && atom.bytes().all(|b| b.is_ascii_digit()))
            || DAY_NAMES
                .iter()
                .chain(MONTH_NAMES.iter())
                .any(|name| name.eq_ignore_ascii_case(atom));
        if !legal {
            return Err(format!("'{}' is not valid crontab syntax", field));
        }
    }
    Ok(())
}

/// Rewrite numeric crontab weekdays as names.
///
/// Crontab counts Sunday as 0 (or 7); the `cron` parser counts from 1.
/// Names sidestep the difference. Non-numeric elements pass through.
pub fn translate_day_of_week(field: &str) -> Result<String, String> {
    if field == "*" {
        return Ok(field.to_string());
    }

    let mut days: Vec<&str> = Vec::new();
    for element in field.split(',') {
        let (range, step) = match element.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (element, None),
        };
        let numeric = range == "*"
            || range
                .split('-')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
        if !numeric {
            days.push(element);
            continue;
        }

        let (start, end) = match range.split_once('-') {
            _ if range == "*" => (0, 6),
            Some((start, end)) => (parse_day(start)?, parse_day(end)?),
            None if step.is_some() => (parse_day(range)?, 6),
            None => {
                let day = parse_day(range)?;
                (day, day)
            }
        };
        if start > end {
            return Err(format!("day-of-week range '{}' runs backwards", range));
        }
        let step = match step {
            Some(step) => step
                .parse::<usize>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| format!("invalid step '{}'", step))?,
            None => 1,
        };

        for day in (start..=end).step_by(step) {
            let name = DAY_NAMES[day % 7];
            if !days.contains(&name) {
                days.push(name);
            }
        }
    }
    Ok(days.join(","))
}

fn parse_day(text: &str) -> Result<usize, String> {
    text.parse::<usize>()
        .ok()
        .filter(|day| *day <= 7)
        .ok_or_else(|| format!("day of week '{}' is outside 0-7", text))
}

/// What the schedule runs: this program's monitoring pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCommand {
    /// Interpreter placed before the program, if the program needs one.
    pub launcher: Option<String>,
    pub program: PathBuf,
    pub config: PathBuf,
    /// Receives the job's stdout and stderr.
    pub log_file: PathBuf,
}

impl ScheduleCommand {
    /// Text identifying this program's lines in the job table.
    pub fn marker(&self) -> String {
        self.program.display().to_string()
    }
}

impl fmt::Display for ScheduleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(launcher) = self.launcher.as_deref().filter(|l| !l.trim().is_empty()) {
            write!(f, "{} ", launcher.trim())?;
        }
        write!(
            f,
            "{} --config {} --monitor >> {} 2>&1",
            self.program.display(),
            self.config.display(),
            self.log_file.display()
        )
    }
}

/// A validated crontab line.
#[derive(Debug, Clone)]
pub struct ScheduleLine {
    pub spec: ScheduleSpec,
    pub user: String,
    pub command: ScheduleCommand,
    schedule: cron::Schedule,
}

impl ScheduleLine {
    /// Next time the line fires, in local time.
    pub fn next_run(&self) -> Option<DateTime<Local>> {
        self.schedule.upcoming(Local).next()
    }
}

impl fmt::Display for ScheduleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.spec.expression(), self.user, self.command)
    }
}

/// Default absent fields to `*`, validate the expression and bind it to
/// `command`.
pub fn build_and_validate_schedule(
    section: &CrontabSection,
    command: &ScheduleCommand,
) -> Result<ScheduleLine, ScheduleError> {
    let spec = ScheduleSpec::from_section(section);
    let schedule = spec.validate()?;
    let user = match section.user.trim() {
        "" => "root".to_string(),
        user => user.to_string(),
    };

    Ok(ScheduleLine {
        spec,
        user,
        command: command.clone(),
        schedule,
    })
}

#[cfg(test)]
#[path = "expression_tests.rs"]
mod tests;
