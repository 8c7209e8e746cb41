mod pipeline;
mod report;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use docmerge_engine::WarningLevel;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "docmerge",
    version,
    about = "Merge markdown documentation from several repositories into one site"
)]
pub struct Cli {
    /// Configuration file. Defaults to ~/.config/docmerge/config.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory with repository checkouts, overrides `repos_dir`
    #[arg(long)]
    pub repos_dir: Option<PathBuf>,

    /// Directory receiving the merged site, overrides `output_dir`
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Release identifier written to every page
    #[arg(long)]
    pub release_name: Option<String>,

    /// Print links pointing outside the merged site
    #[arg(long)]
    pub show_external_links: bool,

    /// How external links are grouped
    #[arg(long, value_enum, default_value_t = Grouping::Document)]
    pub group_by: Grouping,

    /// Print documents and files no link points to
    #[arg(long)]
    pub show_unused_docs: bool,

    /// Exit with an error if any warning was reported
    #[arg(long)]
    pub fail_on_warning: bool,

    /// Which markdown parser warnings to report: all, minor, serious or off
    #[arg(long, default_value_t = WarningLevel::Serious)]
    pub warnings: WarningLevel,

    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Grouping {
    Document,
    Repository,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else if self.quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Info
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    pipeline::run(&cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_all_flags() {
        let cli = Cli::try_parse_from([
            "docmerge",
            "--config",
            "docs.toml",
            "--output-dir",
            "out",
            "--release-name",
            "2024.06",
            "--show-external-links",
            "--group-by",
            "repository",
            "--fail-on-warning",
            "--warnings",
            "minor",
            "-v",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("docs.toml")));
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.release_name.as_deref(), Some("2024.06"));
        assert!(cli.show_external_links);
        assert_eq!(cli.group_by, Grouping::Repository);
        assert!(cli.fail_on_warning);
        assert_eq!(cli.warnings, WarningLevel::Minor);
        assert_eq!(cli.log_level(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["docmerge"]).unwrap();

        assert_eq!(cli.warnings, WarningLevel::Serious);
        assert_eq!(cli.group_by, Grouping::Document);
        assert_eq!(cli.log_level(), log::LevelFilter::Info);
        assert!(!cli.fail_on_warning);
    }

    #[test]
    fn test_rejects_unknown_warning_level() {
        assert!(Cli::try_parse_from(["docmerge", "--warnings", "loud"]).is_err());
        assert!(Cli::try_parse_from(["docmerge", "-v", "-q"]).is_err());
    }
}
