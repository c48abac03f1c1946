use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigFileOpts {
    #[arg(
        long,
        help = "Specify path/filename of the TOML config file (default: .xbundle/xbundle.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config",
        help_heading = "Configuration"
    )]
    pub no_config: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InputOpts {
    #[arg(
        required = true,
        value_name = "INPUT",
        help = "HTML document to scan ('-' reads standard input)."
    )]
    pub input: String,

    #[arg(
        long,
        value_name = "LEVELS",
        value_delimiter = ',',
        help = "Heading levels that may name files, e.g. '1,2,3,4'.",
        help_heading = "Detection"
    )]
    pub heading_levels: Vec<u8>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionOpts {
    #[arg(
        short = 's',
        long,
        value_name = "INDICES",
        help = "Select files by 1-based index, e.g. '1,3-5' [default: all].",
        help_heading = "Selection"
    )]
    pub select: Option<String>,

    #[arg(
        short = 'i',
        long,
        value_name = "GLOB",
        help = "Only keep files whose path matches (repeatable).",
        help_heading = "Selection"
    )]
    pub include: Vec<String>,

    #[arg(
        short = 'e',
        long,
        value_name = "GLOB",
        help = "Drop files whose path matches (repeatable).",
        help_heading = "Selection"
    )]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FormatOutputOpts {
    #[arg(short = 'f', long, help = "Set the output format.", value_name = "FORMAT", value_parser = ["table", "json", "yaml", "xml"], help_heading = "Output Formatting")]
    pub format: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Save every code block of an HTML page as files in one archive.",
    long_about = "xbundle finds headings that name files (e.g. '1. src/app.ts'), pairs each with \nthe code block that follows it, and packs the selected files into a zip archive \nwith a README manifest.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  xbundle scan page.html\n  xbundle bundle page.html --select 1,3-5 -o ./downloads\n  xbundle preview page.html -s 2\n  xbundle watch page.html --clear",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(
        short,
        long,
        global = true,
        help = "Silence informational messages and warnings."
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    #[command(visible_alias = "ls", about = "List the files detected in a document.")]
    Scan(ScanArgs),

    #[command(
        visible_alias = "b",
        about = "Pack the selected files into a zip archive and save it."
    )]
    Bundle(BundleArgs),

    #[command(visible_alias = "p", about = "Print the content of the selected files.")]
    Preview(PreviewArgs),

    #[command(
        visible_alias = "w",
        about = "Monitor a document and rescan it after changes settle."
    )]
    Watch(WatchArgs),

    #[command(about = "Generate or save shell completion scripts.")]
    Completion(CompletionArgs),

    #[command(about = "Show or save the default configuration file structure.")]
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    #[clap(flatten)]
    pub input: InputOpts,

    #[clap(flatten)]
    pub config_file: ConfigFileOpts,

    #[clap(flatten)]
    pub format_output: FormatOutputOpts,

    #[arg(
        long,
        help = "Also list every heading and why it was or was not taken as a file."
    )]
    pub explain: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    #[clap(flatten)]
    pub input: InputOpts,

    #[clap(flatten)]
    pub config_file: ConfigFileOpts,

    #[clap(flatten)]
    pub selection: SelectionOpts,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        help = "Directory to save the archive in (overrides config).",
        help_heading = "Output Control"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        value_name = "METHOD",
        value_parser = ["deflate", "bzip2", "zstd"],
        help = "Compression method (overrides config).",
        help_heading = "Output Control"
    )]
    pub compression: Option<String>,

    #[arg(
        long,
        help = "Fail instead of overwriting when two files map to the same archive path.",
        help_heading = "Output Control"
    )]
    pub strict_paths: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    #[clap(flatten)]
    pub input: InputOpts,

    #[clap(flatten)]
    pub config_file: ConfigFileOpts,

    #[clap(flatten)]
    pub selection: SelectionOpts,
}

#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    #[clap(flatten)]
    pub input: InputOpts,

    #[clap(flatten)]
    pub config_file: ConfigFileOpts,

    #[arg(
        long,
        value_name = "DELAY_STRING",
        help = "Set debounce delay for watch mode [default: 500ms]"
    )]
    pub watch_delay: Option<String>,

    #[arg(long, help = "Clear the screen before each rescan report.")]
    pub clear: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    #[arg(
        long,
        value_name = "SHELL",
        help = "Shell to generate completions for (fish, bash, zsh) [default: fish]"
    )]
    pub shell: Option<String>,

    #[arg(
        long,
        help = "Save completion script to default location (prompts overwrite)."
    )]
    pub save: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        long,
        help = "Save default config structure to default path (prompts overwrite)."
    )]
    pub save: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bundle_selection() {
        let cli = Cli::try_parse_from([
            "xbundle", "bundle", "page.html", "-s", "1,3-5", "-i", "src/**", "-o", "out",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Bundle(args)) => {
                assert_eq!(args.input.input, "page.html");
                assert_eq!(args.selection.select.as_deref(), Some("1,3-5"));
                assert_eq!(args.selection.include, vec!["src/**".to_string()]);
                assert_eq!(args.output_dir, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn heading_levels_are_comma_separated() {
        let cli = Cli::try_parse_from(["xbundle", "scan", "-", "--heading-levels", "2,3"]).unwrap();
        match cli.command {
            Some(Commands::Scan(args)) => assert_eq!(args.input.heading_levels, vec![2, 3]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn config_flags_conflict() {
        assert!(
            Cli::try_parse_from(["xbundle", "scan", "a.html", "--config", "x", "--no-config"])
                .is_err()
        );
    }
}
