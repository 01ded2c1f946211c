use clap::Subcommand;
use tomatolog_core::{Config, LogLevel};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.work_minutes", "log.path")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Print the config file path
    Path,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match get(&config, &key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            set(&mut config, &key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path()?.display());
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

fn get(config: &Config, key: &str) -> Option<String> {
    let value = match key {
        "timer.work_minutes" => config.timer.work_minutes.to_string(),
        "timer.break_minutes" => config.timer.break_minutes.to_string(),
        "timer.autostart" => config.timer.autostart.to_string(),
        "log.enabled" => config.log.enabled.to_string(),
        "log.level" => level_name(config.log.level).to_string(),
        "log.path" => config.log.path.clone().unwrap_or_default(),
        "log.prefer_focused" => config.log.prefer_focused.to_string(),
        "tracking.reward" => config.tracking.reward.to_string(),
        "tracking.energy" => config.tracking.energy.to_string(),
        _ => return None,
    };
    Some(value)
}

fn set(config: &mut Config, key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    match key {
        "timer.work_minutes" => config.timer.work_minutes = parse_minutes(value)?,
        "timer.break_minutes" => config.timer.break_minutes = parse_break_minutes(value)?,
        "timer.autostart" => config.timer.autostart = parse_bool(value)?,
        "log.enabled" => config.log.enabled = parse_bool(value)?,
        "log.level" => config.log.level = parse_level(value)?,
        "log.path" => {
            config.log.path = if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        }
        "log.prefer_focused" => config.log.prefer_focused = parse_bool(value)?,
        "tracking.reward" => config.tracking.reward = parse_bool(value)?,
        "tracking.energy" => config.tracking.energy = parse_bool(value)?,
        _ => return Err(format!("unknown key: {key}").into()),
    }
    Ok(())
}

fn parse_minutes(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let minutes: f64 = value.parse()?;
    if minutes <= 0.0 || !minutes.is_finite() {
        return Err("minutes must be positive".into());
    }
    Ok(minutes)
}

/// A zero break length is allowed: it keeps the timer in work mode.
fn parse_break_minutes(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let minutes: f64 = value.parse()?;
    if minutes < 0.0 || !minutes.is_finite() {
        return Err("minutes must not be negative".into());
    }
    Ok(minutes)
}

fn parse_bool(value: &str) -> Result<bool, Box<dyn std::error::Error>> {
    match value {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(format!("expected true/false, got: {value}").into()),
    }
}

fn parse_level(value: &str) -> Result<LogLevel, Box<dyn std::error::Error>> {
    match value {
        "all" => Ok(LogLevel::All),
        "work" => Ok(LogLevel::Work),
        "break" => Ok(LogLevel::Break),
        _ => Err(format!("expected all/work/break, got: {value}").into()),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::All => "all",
        LogLevel::Work => "work",
        LogLevel::Break => "break",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_and_set_roundtrip_known_keys() {
        let mut config = Config::default();
        set(&mut config, "timer.work_minutes", "50").unwrap();
        set(&mut config, "log.level", "work").unwrap();
        set(&mut config, "log.path", "daily/log.md").unwrap();
        set(&mut config, "tracking.reward", "true").unwrap();

        assert_eq!(get(&config, "timer.work_minutes").as_deref(), Some("50"));
        assert_eq!(get(&config, "log.level").as_deref(), Some("work"));
        assert_eq!(get(&config, "log.path").as_deref(), Some("daily/log.md"));
        assert_eq!(get(&config, "tracking.reward").as_deref(), Some("true"));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = Config::default();
        assert!(get(&config, "nope").is_none());
        assert!(set(&mut config, "nope", "1").is_err());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = Config::default();
        assert!(set(&mut config, "timer.work_minutes", "-5").is_err());
        assert!(set(&mut config, "timer.work_minutes", "abc").is_err());
        assert!(set(&mut config, "log.enabled", "maybe").is_err());
        assert!(set(&mut config, "log.level", "loud").is_err());
        // Zero break length is valid.
        assert!(set(&mut config, "timer.break_minutes", "0").is_ok());
    }

    #[test]
    fn clearing_log_path() {
        let mut config = Config::default();
        set(&mut config, "log.path", "log.md").unwrap();
        set(&mut config, "log.path", "").unwrap();
        assert!(config.log.path.is_none());
    }
}
