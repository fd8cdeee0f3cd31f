use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Validate every XML file in a directory against the XML Schemas of another
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "validate-xml-dir")]
#[command(version)]
#[command(
    about = "Validate every *.xml file in a directory against all *.xsd schemas of another directory"
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose (debug) output")]
    pub verbose: bool,

    /// Directory holding the schema files
    #[arg(
        short = 's',
        long = "schemes",
        value_name = "DIR",
        help = "Directory where the *.xsd files are located [default: .]"
    )]
    pub schemes: Option<PathBuf>,

    /// Directory holding the documents to validate
    #[arg(
        short = 'x',
        long = "xml",
        value_name = "DIR",
        help = "Directory where the *.xml files are located [default: .]"
    )]
    pub xml: Option<PathBuf>,

    /// Configuration file
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Configuration file (TOML or JSON)"
    )]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve an argument vector (program name first) without exiting the
    /// process on failure
    pub fn resolve<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args)
    }
}

/// Whether a resolution failure is really a `--help` or `--version` request
pub fn is_informational(err: &clap::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
    )
}

/// Render the error followed by the full help text, as one block
pub fn usage_message(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let help = Cli::command().render_help().to_string();
    format!("{}\n{}", rendered.trim_end(), help.trim_end())
}
