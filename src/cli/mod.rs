use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::workflow::WizardStep;

pub mod commands;

#[derive(Parser)]
#[command(name = "invoice-review")]
#[command(version)]
#[command(about = "Review, validate and generate invoices extracted by the invoice service")]
#[command(long_about = "invoice-review drives extracted invoices through attribute mapping, \
                       validation and custom invoice generation against the invoice REST service. \
                       Get started with 'invoice-review list' to see what is waiting for review.")]
pub struct Cli {
    /// Configuration file to load instead of invoice-review.toml
    #[arg(long, global = true, value_name = "PATH", help = "Load configuration from this TOML file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List invoices with their status and available actions
    List,
    /// Show one invoice: attributes, highlights and validation summary
    Show {
        /// Invoice id
        id: String,
    },
    /// Upload a new invoice PDF for extraction
    Upload {
        /// PDF file to upload
        file: PathBuf,
    },
    /// Edit attributes and move an invoice through the review steps
    Review {
        /// Invoice id
        id: String,
        /// Set a leaf value, e.g. --set InvoiceTotal=120 or --set Items[0].Amount=9
        #[arg(long = "set", value_name = "SEL=VALUE", help = "Set an attribute value (repeatable)")]
        set: Vec<String>,
        /// Confirm a leaf attribute as mapped
        #[arg(long = "confirm", value_name = "SEL", help = "Mark an attribute as mapped (repeatable)")]
        confirm: Vec<String>,
        /// Mark every attribute as mapped
        #[arg(long, help = "Select all attributes, including nested items")]
        map_all: bool,
        /// Keep committing steps until this one is done
        #[arg(long, value_enum, help = "Commit steps up to and including this one (default: current step only)")]
        through: Option<ThroughStep>,
    },
    /// Download the generated invoice of a completed review
    Download {
        /// Invoice id
        id: String,
        /// Output path (default: the invoice file name in the current directory)
        #[arg(long, value_name = "PATH", help = "Where to write the PDF")]
        out: Option<PathBuf>,
    },
    /// Print the highlight boxes of an invoice
    Highlights {
        /// Invoice id
        id: String,
        /// Only this page (zero-based)
        #[arg(long, help = "Restrict output to one page")]
        page: Option<u32>,
        /// Emit an SVG overlay instead of a listing
        #[arg(long, help = "Print an SVG overlay for the page (page 0 when --page is absent)")]
        svg: bool,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing invoice-review.toml
        #[arg(long, help = "Force initialization, overwriting existing configuration")]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThroughStep {
    Mapping,
    Validate,
    Generate,
}

impl From<ThroughStep> for WizardStep {
    fn from(step: ThroughStep) -> Self {
        match step {
            ThroughStep::Mapping => WizardStep::Mapping,
            ThroughStep::Validate => WizardStep::Validate,
            ThroughStep::Generate => WizardStep::Generate,
        }
    }
}
