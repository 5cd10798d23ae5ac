//! Command-line interface, clap-based.
//!
//! Defines the [`Cli`] struct with one subcommand per engine operation
//! plus global flags (--operator, --verbose). Wire-facing enums get
//! CLI-local `ValueEnum` mirrors mapped to the domain types.

use clap::{Parser, Subcommand, ValueEnum};

use crate::consultation::{Feasibility, FollowUpKind, Status};

/// labflow — consultation lifecycle manager for the lab CRM.
#[derive(Debug, Parser)]
#[command(name = "labflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Operator name recorded on follow-ups and created records.
    #[arg(long, global = true)]
    pub operator: Option<String>,

    /// Enable verbose output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

/// Status filter accepted by the CLI, mapped to [`Status`] internally.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Following,
    Quoted,
    Rejected,
    Closed,
}

impl From<StatusArg> for Status {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Status::Pending,
            StatusArg::Following => Status::Following,
            StatusArg::Quoted => Status::Quoted,
            StatusArg::Rejected => Status::Rejected,
            StatusArg::Closed => Status::Closed,
        }
    }
}

/// Follow-up contact channel.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Phone,
    Email,
    Visit,
    Other,
}

impl From<KindArg> for FollowUpKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Phone => FollowUpKind::Phone,
            KindArg::Email => FollowUpKind::Email,
            KindArg::Visit => FollowUpKind::Visit,
            KindArg::Other => FollowUpKind::Other,
        }
    }
}

/// Feasibility verdict.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FeasibilityArg {
    Feasible,
    Difficult,
    Infeasible,
}

impl From<FeasibilityArg> for Feasibility {
    fn from(arg: FeasibilityArg) -> Self {
        match arg {
            FeasibilityArg::Feasible => Feasibility::Feasible,
            FeasibilityArg::Difficult => Feasibility::Difficult,
            FeasibilityArg::Infeasible => Feasibility::Infeasible,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List consultations, optionally filtered by status or keyword.
    List {
        /// Only show records in this status.
        #[arg(long)]
        status: Option<StatusArg>,

        /// Match against company, contact or consultation number.
        #[arg(long)]
        keyword: Option<String>,

        /// Page number, starting at 1.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },

    /// Show one consultation with its follow-up history.
    Show { id: i64 },

    /// Create a new consultation.
    Create {
        #[arg(long)]
        company: String,

        #[arg(long)]
        contact: String,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        sample: Option<String>,

        #[arg(long)]
        test_items: Option<String>,

        #[arg(long)]
        budget: Option<f64>,

        /// Assigning a follower starts the record in `following`.
        #[arg(long)]
        follower: Option<String>,
    },

    /// Update descriptive fields of a consultation.
    Update {
        id: i64,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        contact: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        sample: Option<String>,

        #[arg(long)]
        test_items: Option<String>,

        #[arg(long)]
        budget: Option<f64>,

        #[arg(long)]
        follower: Option<String>,

        /// Explicitly move a pending record to `following`.
        #[arg(long, default_value_t = false)]
        start_following: bool,
    },

    /// Record a follow-up interaction.
    FollowUp {
        id: i64,

        /// What was said or agreed.
        content: String,

        #[arg(long, value_enum, default_value_t = KindArg::Phone)]
        kind: KindArg,

        /// Planned next step, if any.
        #[arg(long)]
        next_action: Option<String>,
    },

    /// Set or replace the feasibility assessment.
    Feasibility {
        id: i64,

        #[arg(value_enum)]
        verdict: FeasibilityArg,

        #[arg(long)]
        note: Option<String>,

        #[arg(long)]
        price: Option<f64>,
    },

    /// Close a consultation without quoting. Terminal.
    Close { id: i64 },

    /// Convert a followed consultation into a quotation.
    Quote { id: i64 },

    /// Delete a pending consultation.
    Delete { id: i64 },

    /// Run the built-in offline lifecycle walkthrough.
    Demo,
}
