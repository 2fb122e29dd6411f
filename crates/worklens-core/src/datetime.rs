use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use serde::Deserialize;

const TIMEZONE_CONFIG_FILE: &str = "worklens-time.toml";
const TIMEZONE_ENV_VAR: &str = "WORKLENS_TIMEZONE";
const TIMEZONE_CONFIG_ENV_VAR: &str = "WORKLENS_TIME_CONFIG";
const DEFAULT_PROJECT_TIMEZONE: &str = "UTC";

#[derive(Debug, Deserialize)]
struct TimezoneConfig {
    timezone: Option<String>,
    time: Option<TimezoneSection>,
}

#[derive(Debug, Deserialize)]
struct TimezoneSection {
    timezone: Option<String>,
}

pub fn project_timezone() -> &'static Tz {
    static PROJECT_TZ: OnceLock<Tz> = OnceLock::new();
    PROJECT_TZ.get_or_init(resolve_project_timezone)
}

/// The calendar day a given instant falls on in the project timezone.
/// This is the only place "today" is ever derived from a wall-clock
/// instant; the engine itself always takes `today` as a parameter.
#[must_use]
pub fn today_in_project(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(project_timezone()).date_naive()
}

fn resolve_project_timezone() -> Tz {
    if let Ok(raw) = std::env::var(TIMEZONE_ENV_VAR) {
        if let Some(tz) = parse_timezone(&raw, TIMEZONE_ENV_VAR) {
            return tz;
        }
    }

    if let Some(path) = timezone_config_path()
        && let Some(tz) = load_timezone_from_file(&path)
    {
        return tz;
    }

    parse_timezone(DEFAULT_PROJECT_TIMEZONE, "DEFAULT_PROJECT_TIMEZONE").unwrap_or_else(|| {
        tracing::error!("failed to parse fallback timezone; using UTC");
        chrono_tz::UTC
    })
}

fn timezone_config_path() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var(TIMEZONE_CONFIG_ENV_VAR) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    std::env::current_dir()
        .ok()
        .map(|dir| dir.join(TIMEZONE_CONFIG_FILE))
}

fn load_timezone_from_file(path: &PathBuf) -> Option<Tz> {
    if !path.exists() {
        tracing::debug!(file = %path.display(), "timezone config file not found");
        return None;
    }

    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed reading timezone config file"
            );
            return None;
        }
    };

    let parsed = match toml::from_str::<TimezoneConfig>(&raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::error!(
                file = %path.display(),
                error = %err,
                "failed parsing timezone config file"
            );
            return None;
        }
    };

    let timezone = parsed
        .timezone
        .or_else(|| parsed.time.and_then(|section| section.timezone));
    let Some(timezone) = timezone else {
        tracing::warn!(file = %path.display(), "timezone config had no timezone field");
        return None;
    };

    parse_timezone(timezone.as_str(), &format!("file:{}", path.display()))
}

fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(source, "timezone source was empty");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => {
            tracing::info!(source, timezone = %trimmed, "configured project timezone");
            Some(tz)
        }
        Err(err) => {
            tracing::error!(
                source,
                timezone = %trimmed,
                error = %err,
                "failed to parse timezone id"
            );
            None
        }
    }
}

/// Parses a `--today` override: `today`/`tomorrow`/`yesterday`, a
/// relative offset like `+3d` or `-1d`, or a plain `YYYY-MM-DD`.
#[tracing::instrument(skip(now), fields(input = input))]
pub fn parse_today_expr(input: &str, now: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    let token = input.trim();
    let today = today_in_project(now);

    match token.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => {
            return today
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| anyhow!("date overflow computing tomorrow"));
        }
        "yesterday" => {
            return today
                .checked_sub_signed(Duration::days(1))
                .ok_or_else(|| anyhow!("date overflow computing yesterday"));
        }
        _ => {}
    }

    let rel_re = Regex::new(r"^(?P<sign>[+-])(?P<num>\d+)d$")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    if let Some(caps) = rel_re.captures(token) {
        let sign = caps
            .name("sign")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative sign"))?;
        let num: i64 = caps
            .name("num")
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("missing relative amount"))?
            .parse()
            .context("invalid relative number")?;

        let delta = if sign == "-" {
            Duration::days(-num)
        } else {
            Duration::days(num)
        };
        return today
            .checked_add_signed(delta)
            .ok_or_else(|| anyhow!("date overflow applying offset {token}"));
    }

    NaiveDate::parse_from_str(token, "%Y-%m-%d").with_context(|| {
        format!(
            "unrecognized date expression: {input} \
             (supported: today/tomorrow/yesterday, +Nd/-Nd, YYYY-MM-DD)"
        )
    })
}
