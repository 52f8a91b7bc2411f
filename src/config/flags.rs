//! Command-line flags declared from registered keys.

use clap::parser::ValueSource;
use clap::{value_parser, Arg, ArgMatches, Command};

use crate::config::store::ConfigEntry;
use crate::config::value::{ConfigValue, ValueKind};

/// Build the flag set: one `--key` per registered entry.
pub(crate) fn command(entries: &[ConfigEntry]) -> Command {
    entries.iter().fold(
        Command::new(env!("CARGO_PKG_NAME")).disable_version_flag(true),
        |command, entry| command.arg(flag_for(entry)),
    )
}

fn flag_for(entry: &ConfigEntry) -> Arg {
    let arg = Arg::new(entry.key.clone())
        .long(entry.key.clone())
        .help(entry.description.clone())
        .default_value(entry.default.to_string());

    match entry.default.kind() {
        ValueKind::Int => arg
            .value_parser(value_parser!(i32))
            .allow_negative_numbers(true),
        ValueKind::Int64 => arg
            .value_parser(value_parser!(i64))
            .allow_negative_numbers(true),
        ValueKind::Uint64 => arg.value_parser(value_parser!(u64)),
        ValueKind::String => arg.value_parser(value_parser!(String)),
        ValueKind::Float64 => arg
            .value_parser(value_parser!(f64))
            .allow_negative_numbers(true),
        // `--flag` alone means true, `--flag=false` turns it off.
        ValueKind::Bool => arg
            .value_parser(value_parser!(bool))
            .num_args(0..=1)
            .require_equals(true)
            .default_missing_value("true"),
    }
}

/// The value given for `entry` on the command line, if any.
///
/// Flags left at their default return `None` so they never shadow the
/// config file.
pub(crate) fn command_line_value(matches: &ArgMatches, entry: &ConfigEntry) -> Option<ConfigValue> {
    let key = entry.key.as_str();
    if matches.value_source(key) != Some(ValueSource::CommandLine) {
        return None;
    }

    match entry.default.kind() {
        ValueKind::Int => matches.get_one::<i32>(key).copied().map(ConfigValue::Int),
        ValueKind::Int64 => matches.get_one::<i64>(key).copied().map(ConfigValue::Int64),
        ValueKind::Uint64 => matches.get_one::<u64>(key).copied().map(ConfigValue::Uint64),
        ValueKind::String => matches.get_one::<String>(key).cloned().map(ConfigValue::String),
        ValueKind::Float64 => matches.get_one::<f64>(key).copied().map(ConfigValue::Float64),
        ValueKind::Bool => matches.get_one::<bool>(key).copied().map(ConfigValue::Bool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, default: impl Into<ConfigValue>) -> ConfigEntry {
        ConfigEntry {
            key: key.to_string(),
            default: default.into(),
            description: format!("{} flag", key),
        }
    }

    fn parse(entries: &[ConfigEntry], args: &[&str]) -> Vec<Option<ConfigValue>> {
        let mut argv = vec!["prog"];
        argv.extend_from_slice(args);
        let matches = command(entries).try_get_matches_from(argv).unwrap();
        entries
            .iter()
            .map(|e| command_line_value(&matches, e))
            .collect()
    }

    #[test]
    fn test_typed_flags() {
        let entries = vec![
            entry("port", 8080),
            entry("offset", -1_i64),
            entry("limit", 10_u64),
            entry("name", "svc"),
            entry("ratio", 0.5),
        ];

        let values = parse(
            &entries,
            &["--port", "7070", "--offset=-5", "--limit", "3", "--name", "api", "--ratio", "0.75"],
        );
        assert_eq!(values[0], Some(ConfigValue::Int(7070)));
        assert_eq!(values[1], Some(ConfigValue::Int64(-5)));
        assert_eq!(values[2], Some(ConfigValue::Uint64(3)));
        assert_eq!(values[3], Some(ConfigValue::String("api".into())));
        assert_eq!(values[4], Some(ConfigValue::Float64(0.75)));
    }

    #[test]
    fn test_unset_flags_are_not_reported() {
        let entries = vec![entry("port", 8080), entry("verbose", false)];
        let values = parse(&entries, &[]);
        assert_eq!(values, vec![None, None]);
    }

    #[test]
    fn test_bool_flag_forms() {
        let entries = vec![entry("verbose", false), entry("color", true)];

        let values = parse(&entries, &["--verbose", "--color=false"]);
        assert_eq!(values[0], Some(ConfigValue::Bool(true)));
        assert_eq!(values[1], Some(ConfigValue::Bool(false)));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let entries = vec![entry("port", 8080)];
        let result = command(&entries).try_get_matches_from(["prog", "--port", "eighty"]);
        assert!(result.is_err());
    }
}
