//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use harvester_core::chapter::ChapterNumber;
use harvester_core::config::HarvestConfig;

/// Harvest chapter images from a paginated reader site.
///
/// Visits every chapter the profile selects, one at a time, in a shared
/// headless browser page, and downloads each chapter's images into
/// `<output_dir>/<chapter folder>/001.jpg, 002.jpg, ...`.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Path to the TOML harvest profile
    pub profile: PathBuf,

    /// Print every chapter target (URL and folder) without launching a browser
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent asset downloads per window (1-100)
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: Option<u8>,

    /// Attempts per asset before it is dropped (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub asset_attempts: Option<u8>,

    /// Output root directory (overrides `download.output_dir`)
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// First chapter (overrides `chapters.start`; fractional allowed)
    #[arg(long)]
    pub start: Option<ChapterNumber>,

    /// Last chapter, inclusive (overrides `chapters.end`)
    #[arg(long)]
    pub end: Option<ChapterNumber>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

impl Args {
    /// Applies command-line overrides on top of the loaded profile.
    pub fn apply_overrides(&self, config: &mut HarvestConfig) {
        if let Some(concurrency) = self.concurrency {
            config.download.concurrency = usize::from(concurrency);
        }
        if let Some(attempts) = self.asset_attempts {
            config.download.asset_attempts = u32::from(attempts);
        }
        if let Some(dir) = &self.output_dir {
            config.download.output_dir.clone_from(dir);
        }
        if let Some(start) = self.start {
            config.chapters.start = Some(start);
            // A new start without a new end means "just this chapter".
            if self.end.is_none() {
                config.chapters.end = Some(start);
            }
        }
        if let Some(end) = self.end {
            config.chapters.end = Some(end);
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = r#"
        [source]
        url_template = "https://reader.example.com/chap-{id}"

        [chapters]
        start = 1
        end = 10

        [selectors]
        asset = "img"
    "#;

    fn config() -> HarvestConfig {
        PROFILE.parse().unwrap()
    }

    #[test]
    fn test_cli_profile_only_parses_successfully() {
        let args = Args::try_parse_from(["harvester", "site.toml"]).unwrap();
        assert_eq!(args.profile, PathBuf::from("site.toml"));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.dry_run);
        assert!(args.concurrency.is_none());
    }

    #[test]
    fn test_cli_profile_is_required() {
        let result = Args::try_parse_from(["harvester"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["harvester", "p.toml", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["harvester", "p.toml", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["harvester", "p.toml", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["harvester", "--help"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["harvester", "p.toml", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, Some(100));

        for bad in ["0", "101"] {
            let err = Args::try_parse_from(["harvester", "p.toml", "-c", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_asset_attempts_bounds() {
        let args = Args::try_parse_from(["harvester", "p.toml", "-r", "5"]).unwrap();
        assert_eq!(args.asset_attempts, Some(5));
        assert!(Args::try_parse_from(["harvester", "p.toml", "-r", "0"]).is_err());
    }

    #[test]
    fn test_cli_fractional_start_parses() {
        let args = Args::try_parse_from(["harvester", "p.toml", "--start", "85.1"]).unwrap();
        assert_eq!(args.start.unwrap().to_string(), "85.1");
        assert!(Args::try_parse_from(["harvester", "p.toml", "--start", "abc"]).is_err());
    }

    #[test]
    fn test_overrides_replace_profile_values() {
        let args = Args::try_parse_from([
            "harvester", "p.toml", "-c", "4", "-o", "/tmp/out", "--start", "3", "--end", "5",
            "--headed",
        ])
        .unwrap();
        let mut config = config();
        args.apply_overrides(&mut config);

        assert_eq!(config.download.concurrency, 4);
        assert_eq!(config.download.output_dir, PathBuf::from("/tmp/out"));
        assert!(!config.browser.headless);
        let ids: Vec<String> = config
            .identifiers()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["3", "4", "5"]);
    }

    #[test]
    fn test_start_override_alone_selects_one_chapter() {
        let args = Args::try_parse_from(["harvester", "p.toml", "--start", "7"]).unwrap();
        let mut config = config();
        args.apply_overrides(&mut config);
        assert_eq!(config.identifiers().unwrap().len(), 1);
    }
}
