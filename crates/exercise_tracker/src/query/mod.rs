//! Exercise log queries: raw input normalization followed by mode selection,
//! retrieval, filtering and shaping of the response payload.

mod planner;
mod sanitize;

pub use planner::{DateWindow, LogEntry, LogQuery, LogResult, QueryMode, plan};
pub use sanitize::{LogFilters, parse_calendar_date, parse_limit, sanitize};
