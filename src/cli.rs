use crate::lexicon::MonthLocale;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "report-kit",
    version,
    about = "Monthly activity report toolkit: PDF extraction, month renaming, folder duplication and DOCX templating"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        help = "Settings file (default: ~/.config/report-kit/settings.json)"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract text from every PDF in a folder
    Extract { folder: PathBuf },
    /// Copy a folder tree to a new destination
    Duplicate {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long, default_value_t = false, help = "Compare checksums before committing")]
        verify: bool,
    },
    /// Rewrite month names in filenames to the current month
    Rename {
        folder: PathBuf,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, value_enum, help = "Language of the new month name")]
        locale: Option<MonthLocale>,
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=12),
            help = "Treat this month (1-12) as current"
        )]
        month: Option<u32>,
    },
    /// Fill a DOCX template from a JSON content file
    Render {
        template: PathBuf,
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List the markers and table anchors of a DOCX template
    Inspect { template: PathBuf },
    /// Write drafted report content into the monthly report
    Report {
        report: PathBuf,
        #[arg(long)]
        content: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the filename -> text payload handed to the drafting agent
    Sources { folder: PathBuf },
    /// Print the drafting instructions for a report and its source folder
    Prompt { report: PathBuf, folder: PathBuf },
    /// Look up NWS point metadata for "latitude,longitude"
    Weather {
        #[arg(allow_hyphen_values = true)]
        location: String,
    },
}
