//! Lock In CLI
//!
//! CLI tool for checking URLs against a settings file and editing it.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use lockin_core::{
    evaluate, is_within_schedule_at, Clock, FixedClock, ListType, PathRule, RuleType, Settings,
    SystemClock,
};

mod perf_budget;
mod settings_file;

#[derive(Parser)]
#[command(name = "lockin-cli")]
#[command(about = "Lock In settings checker and editor")]
struct Cli {
    /// Log engine decisions (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a URL is blocked
    Check {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// URL to check
        #[arg(short, long)]
        url: String,

        /// Evaluate at a fixed local time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_clock)]
        at: Option<FixedClock>,
    },

    /// Report whether the blocking window is active
    Schedule {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// Evaluate at a fixed local time (YYYY-MM-DDTHH:MM)
        #[arg(long, value_parser = parse_clock)]
        at: Option<FixedClock>,
    },

    /// Report problems in a settings file
    Validate {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,
    },

    /// Summarize a settings file
    Info {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,
    },

    /// Print the default settings
    Defaults {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a blocked site
    AddSite {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// Domain or URL of the site
        #[arg(short, long)]
        domain: String,

        /// What the site's rules list
        #[arg(short, long, value_enum, default_value_t = ListArg::Whitelist)]
        list_type: ListArg,

        /// Start from default settings if the file does not exist
        #[arg(long)]
        create: bool,
    },

    /// Remove a blocked site
    RemoveSite {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// Domain of the site
        #[arg(short, long)]
        domain: String,
    },

    /// Add a path rule to a site
    AddRule {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// Domain of the site
        #[arg(short, long)]
        domain: String,

        /// Path, regex or glob
        #[arg(long)]
        value: String,

        /// How the value is matched
        #[arg(short, long, value_enum, default_value_t = RuleArg::Exact)]
        kind: RuleArg,
    },

    /// Remove path rules from a site
    RemoveRule {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// Domain of the site
        #[arg(short, long)]
        domain: String,

        /// Rule value to remove
        #[arg(long)]
        value: String,
    },

    /// Check decision latency against the performance budget
    PerfBudget {
        /// Settings JSON file
        #[arg(short, long)]
        settings: PathBuf,

        /// Passes over the generated URL set
        #[arg(short, long, default_value_t = 2000)]
        iterations: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum ListArg {
    Whitelist,
    Blacklist,
}

impl From<ListArg> for ListType {
    fn from(value: ListArg) -> Self {
        match value {
            ListArg::Whitelist => ListType::Whitelist,
            ListArg::Blacklist => ListType::Blacklist,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
enum RuleArg {
    Exact,
    Regex,
    Glob,
}

impl From<RuleArg> for RuleType {
    fn from(value: RuleArg) -> Self {
        match value {
            RuleArg::Exact => RuleType::Exact,
            RuleArg::Regex => RuleType::Regex,
            RuleArg::Glob => RuleType::Glob,
        }
    }
}

fn parse_clock(s: &str) -> Result<FixedClock, String> {
    FixedClock::parse(s).map_err(|e| format!("expected YYYY-MM-DDTHH:MM: {}", e))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Check { settings, url, at } => cmd_check(&settings, &url, at),
        Commands::Schedule { settings, at } => cmd_schedule(&settings, at),
        Commands::Validate { settings } => cmd_validate(&settings),
        Commands::Info { settings } => cmd_info(&settings),
        Commands::Defaults { output } => cmd_defaults(output.as_deref()),
        Commands::AddSite {
            settings,
            domain,
            list_type,
            create,
        } => cmd_add_site(&settings, &domain, list_type.into(), create),
        Commands::RemoveSite { settings, domain } => cmd_remove_site(&settings, &domain),
        Commands::AddRule {
            settings,
            domain,
            value,
            kind,
        } => cmd_add_rule(&settings, &domain, PathRule::new(&value, kind.into())),
        Commands::RemoveRule {
            settings,
            domain,
            value,
        } => cmd_remove_rule(&settings, &domain, &value),
        Commands::PerfBudget { settings, iterations } => {
            perf_budget::run_perf_budget(perf_budget::PerfBudgetOptions {
                settings_path: settings.display().to_string(),
                iterations,
            })
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default_level),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn clock_or_system(at: Option<FixedClock>) -> Box<dyn Clock> {
    match at {
        Some(clock) => Box::new(clock),
        None => Box::new(SystemClock),
    }
}

fn cmd_check(settings_path: &Path, url: &str, at: Option<FixedClock>) -> Result<(), String> {
    let settings = settings_file::read_settings(settings_path)?;
    let clock = clock_or_system(at);
    let verdict = evaluate(url, &settings, clock.as_ref());
    tracing::debug!(?verdict, "Evaluated {}", url);

    let label = if verdict.is_block() { "BLOCK" } else { "ALLOW" };
    println!("{} {}", label, url);
    println!("  Reason:  {}", verdict.reason.as_str());
    if let Some(site) = verdict.site_index.and_then(|i| settings.blocked_sites.get(i)) {
        println!("  Site:    {} ({})", site.domain, site.list_type.as_str());
        if let Some(rule) = verdict.rule_index.and_then(|i| site.paths.get(i)) {
            println!("  Rule:    {} '{}'", rule.kind.as_str(), rule.value);
        }
    }
    if verdict.is_block() {
        println!("  Message: {}", settings.block_message());
    }

    Ok(())
}

fn cmd_schedule(settings_path: &Path, at: Option<FixedClock>) -> Result<(), String> {
    let settings = settings_file::read_settings(settings_path)?;
    let clock = clock_or_system(at);
    let now = clock.now();
    let active = is_within_schedule_at(&settings.schedule, now);

    println!(
        "Schedule is {} at {}",
        if active { "ACTIVE" } else { "inactive" },
        now.format("%a %Y-%m-%d %H:%M")
    );
    Ok(())
}

fn cmd_validate(settings_path: &Path) -> Result<(), String> {
    let settings = settings_file::read_settings(settings_path)?;
    let issues = settings.validate();

    if issues.is_empty() {
        println!("Settings '{}' are valid", settings_path.display());
        return Ok(());
    }

    for issue in &issues {
        println!("  - {}", issue);
    }
    Err(format!("{} issue(s) found in '{}'", issues.len(), settings_path.display()))
}

fn cmd_info(settings_path: &Path) -> Result<(), String> {
    let settings = settings_file::read_settings(settings_path)?;
    let schedule = &settings.schedule;

    println!("Settings: {}", settings_path.display());
    println!();
    println!("Schedule:");
    if schedule.is_all_day() {
        println!("  Window:      all day, every day");
    } else {
        println!(
            "  Window:      {} - {}{}",
            schedule.start_time,
            schedule.end_time,
            if schedule.is_overnight() { " (overnight)" } else { "" }
        );
        let days: Vec<String> = schedule.days.indices().map(day_name).map(str::to_string).collect();
        println!("  Days:        {}", days.join(", "));
    }
    println!();
    println!("Overlay:");
    println!("  Message:     {}", settings.block_message());
    println!("  Flash:       {}", settings.flash_enabled);
    println!();
    println!("Sites: {}", settings.blocked_sites.len());
    for site in &settings.blocked_sites {
        println!("  {} [{}] {} rule(s)", site.domain, site.list_type.as_str(), site.paths.len());
        for rule in &site.paths {
            println!("    {:<5} {}", rule.kind.as_str(), rule.value);
        }
    }

    Ok(())
}

fn day_name(index: u8) -> &'static str {
    match index {
        0 => "Sun",
        1 => "Mon",
        2 => "Tue",
        3 => "Wed",
        4 => "Thu",
        5 => "Fri",
        6 => "Sat",
        _ => "?",
    }
}

fn cmd_defaults(output: Option<&Path>) -> Result<(), String> {
    let settings = Settings::default();
    match output {
        Some(path) => {
            settings_file::write_settings(path, &settings)?;
            println!("Wrote default settings to '{}'", path.display());
        }
        None => println!("{}", settings.to_json_pretty().map_err(|e| e.to_string())?),
    }
    Ok(())
}

fn cmd_add_site(settings_path: &Path, domain: &str, list_type: ListType, create: bool) -> Result<(), String> {
    let mut settings = settings_file::read_or_default(settings_path, create)?;
    let added = settings.add_site(domain, list_type).map_err(|e| e.to_string())?;
    settings_file::write_settings(settings_path, &settings)?;
    println!("Added {} ({})", added, list_type.as_str());
    Ok(())
}

fn cmd_remove_site(settings_path: &Path, domain: &str) -> Result<(), String> {
    let mut settings = settings_file::read_settings(settings_path)?;
    let removed = settings.remove_site(domain).map_err(|e| e.to_string())?;
    settings_file::write_settings(settings_path, &settings)?;
    println!("Removed {} and its {} rule(s)", removed.domain, removed.paths.len());
    Ok(())
}

fn cmd_add_rule(settings_path: &Path, domain: &str, rule: PathRule) -> Result<(), String> {
    lockin_core::pattern::compile_rule(&rule).map_err(|e| e.to_string())?;

    let mut settings = settings_file::read_settings(settings_path)?;
    let kind = rule.kind;
    let value = rule.value.clone();
    if settings.add_rule(domain, rule).map_err(|e| e.to_string())? {
        settings_file::write_settings(settings_path, &settings)?;
        println!("Added {} rule '{}' to {}", kind.as_str(), value, domain);
    } else {
        println!("Rule '{}' already present on {}", value, domain);
    }
    Ok(())
}

fn cmd_remove_rule(settings_path: &Path, domain: &str, value: &str) -> Result<(), String> {
    let mut settings = settings_file::read_settings(settings_path)?;
    let removed = settings.remove_rule(domain, value).map_err(|e| e.to_string())?;
    if removed == 0 {
        return Err(format!("No rule '{}' on {}", value, domain));
    }
    settings_file::write_settings(settings_path, &settings)?;
    println!("Removed {} rule(s) from {}", removed, domain);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_command() {
        let cli = Cli::try_parse_from([
            "lockin-cli",
            "check",
            "--settings",
            "s.json",
            "--url",
            "https://example.com",
            "--at",
            "2023-10-23T10:00",
        ])
        .unwrap();

        match cli.command {
            Commands::Check { url, at, .. } => {
                assert_eq!(url, "https://example.com");
                assert_eq!(at, Some(FixedClock::parse("2023-10-23T10:00").unwrap()));
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_time() {
        let result = Cli::try_parse_from([
            "lockin-cli",
            "schedule",
            "--settings",
            "s.json",
            "--at",
            "tomorrow",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_add_rule_kind() {
        let cli = Cli::try_parse_from([
            "lockin-cli",
            "add-rule",
            "-s",
            "s.json",
            "-d",
            "example.com",
            "--value",
            "/shorts/*",
            "--kind",
            "glob",
        ])
        .unwrap();

        match cli.command {
            Commands::AddRule { kind, value, .. } => {
                assert_eq!(kind, RuleArg::Glob);
                assert_eq!(value, "/shorts/*");
            }
            _ => panic!("expected add-rule"),
        }
    }

    #[test]
    fn test_edit_commands_update_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        cmd_add_site(&path, "https://www.example.com/feed", ListType::Blacklist, true).unwrap();
        cmd_add_rule(&path, "example.com", PathRule::glob("/shorts/*")).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.blocked_sites.len(), 1);
        assert_eq!(settings.blocked_sites[0].domain, "example.com");
        assert_eq!(settings.blocked_sites[0].paths, vec![PathRule::glob("/shorts/*")]);

        cmd_remove_rule(&path, "example.com", "/shorts/*").unwrap();
        assert!(cmd_remove_rule(&path, "example.com", "/shorts/*").is_err());

        cmd_remove_site(&path, "example.com").unwrap();
        assert!(Settings::load(&path).unwrap().blocked_sites.is_empty());
    }

    #[test]
    fn test_add_site_requires_existing_file_without_create() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        assert!(cmd_add_site(&path, "example.com", ListType::Whitelist, false).is_err());
    }

    #[test]
    fn test_add_rule_rejects_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        cmd_add_site(&path, "example.com", ListType::Whitelist, true).unwrap();
        assert!(cmd_add_rule(&path, "example.com", PathRule::regex("((")).is_err());
    }

    #[test]
    fn test_validate_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        cmd_defaults(Some(&path)).unwrap();
        assert!(cmd_validate(&path).is_ok());

        std::fs::write(
            &path,
            r#"{"blockedSites":[{"domain":"a.com","paths":[{"value":"(","type":"regex"}]}]}"#,
        )
        .unwrap();
        assert!(cmd_validate(&path).is_err());
    }

    #[test]
    fn test_check_and_info_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        cmd_add_site(&path, "example.com", ListType::Whitelist, true).unwrap();

        let at = FixedClock::parse("2023-10-23T10:00").unwrap();
        assert!(cmd_check(&path, "https://example.com/feed", Some(at)).is_ok());
        assert!(cmd_schedule(&path, Some(at)).is_ok());
        assert!(cmd_info(&path).is_ok());
    }
}
