//! # Hostwarden Schedule
//!
//! Turns the `crontab` configuration section into a validated job line and
//! registers it with the system scheduler.
//!
//! - [`build_and_validate_schedule`] defaults absent fields to `*` and checks
//!   the expression with the `cron` parser.
//! - [`ScheduleStore`] writes or removes the line; [`CrontabFile`] edits a
//!   crontab file and can restart the scheduler service.

mod error;
mod expression;
mod store;

pub use error::ScheduleError;
pub use expression::{
    ScheduleCommand, ScheduleLine, ScheduleSpec, build_and_validate_schedule, translate_day_of_week,
};
pub use store::{CrontabFile, ScheduleStore};
