//! Device rightsizing CLI
//!
//! A command-line tool for reviewing recommendations, managing policies
//! and pushing telemetry to the rightsizing service.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{ingest, policies, recommendations, savings};
use rightsize_lib::{
    policy::{PolicyCreate, PolicyPatch},
    store::RecommendationFilter,
};
use std::path::PathBuf;

/// Device rightsizing CLI
#[derive(Parser)]
#[command(name = "rsz")]
#[command(author, version, about = "CLI for the Device Rightsizing service", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via RSZ_API_URL env var)
    #[arg(long, env = "RSZ_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get rightsizing recommendations
    #[command(subcommand)]
    Get(GetCommands),

    /// Approve a pending recommendation
    Approve {
        /// Recommendation ID to approve
        id: String,
    },

    /// Override a pending recommendation
    Override {
        /// Recommendation ID to override
        id: String,
    },

    /// Evaluate a tenant's telemetry under a policy
    Simulate {
        /// Policy ID
        #[arg(long)]
        policy: String,

        /// Tenant ID (defaults to default_tenant from the config file)
        #[arg(long, short)]
        tenant: Option<String>,
    },

    /// Push a telemetry batch (or capability snapshots) from a JSON file
    Ingest {
        /// Path to the JSON payload
        file: PathBuf,

        /// The file holds capability snapshots instead of telemetry
        #[arg(long)]
        capabilities: bool,
    },

    /// Manage policy profiles
    #[command(subcommand)]
    Policy(PolicyCommands),

    /// Show expected annual savings from downsize recommendations
    Savings {
        /// Tenant ID (defaults to default_tenant from the config file)
        #[arg(long, short)]
        tenant: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum GetCommands {
    /// List recommendations for a tenant
    Recommendations {
        /// Tenant ID (defaults to default_tenant from the config file)
        #[arg(long, short)]
        tenant: Option<String>,

        /// Filter by action (UPSIZE, DOWNSIZE, EXTEND_LIFE)
        #[arg(long, short)]
        action: Option<String>,

        /// Filter by classification (UNDERPOWERED, OVERPROVISIONED, RIGHT_SIZED)
        #[arg(long, short)]
        classification: Option<String>,

        /// Only recommendations at or above this confidence
        #[arg(long)]
        min_confidence: Option<f64>,
    },

    /// Show one recommendation
    Recommendation {
        /// Recommendation ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Create a policy profile
    Create {
        /// Tenant ID (defaults to default_tenant from the config file)
        #[arg(long, short)]
        tenant: Option<String>,

        /// Policy name
        #[arg(long, short)]
        name: String,

        /// Enable strict mode
        #[arg(long)]
        strict: bool,

        /// Thresholds as a JSON object
        #[arg(long)]
        thresholds: Option<String>,

        /// Auto-execute rules as a JSON object
        #[arg(long)]
        rules: Option<String>,
    },

    /// Show a policy profile
    Show {
        /// Policy ID
        id: String,
    },

    /// Update fields of a policy profile
    Update {
        /// Policy ID
        id: String,

        #[arg(long, short)]
        name: Option<String>,

        #[arg(long)]
        strict: Option<bool>,

        /// Thresholds as a JSON object (replaces the stored ones)
        #[arg(long)]
        thresholds: Option<String>,

        /// Auto-execute rules as a JSON object (replaces the stored ones)
        #[arg(long)]
        rules: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    // Initialize client
    let client = client::ApiClient::new(&config.resolve_api_url(cli.api_url))?;
    let format = cli.format;

    // Execute command
    match cli.command {
        Commands::Get(get_cmd) => match get_cmd {
            GetCommands::Recommendations {
                tenant,
                action,
                classification,
                min_confidence,
            } => {
                let filter = RecommendationFilter {
                    tenant_id: config.resolve_tenant(tenant)?,
                    action,
                    classification,
                    min_confidence,
                };
                recommendations::get_recommendations(&client, filter, format).await?;
            }
            GetCommands::Recommendation { id } => {
                recommendations::get_recommendation(&client, &id, format).await?;
            }
        },
        Commands::Approve { id } => {
            recommendations::approve_recommendation(&client, &id, format).await?;
        }
        Commands::Override { id } => {
            recommendations::override_recommendation(&client, &id, format).await?;
        }
        Commands::Simulate { policy, tenant } => {
            let tenant = config.resolve_tenant(tenant)?;
            policies::simulate(&client, &policy, &tenant, format).await?;
        }
        Commands::Ingest { file, capabilities } => {
            ingest::ingest(&client, &file, capabilities, format).await?;
        }
        Commands::Policy(policy_cmd) => match policy_cmd {
            PolicyCommands::Create {
                tenant,
                name,
                strict,
                thresholds,
                rules,
            } => {
                let input = PolicyCreate {
                    tenant_id: config.resolve_tenant(tenant)?,
                    name,
                    strict_mode: strict,
                    thresholds: policies::parse_object("--thresholds", thresholds.as_deref())?
                        .unwrap_or_default(),
                    auto_execute_rules: policies::parse_object("--rules", rules.as_deref())?
                        .unwrap_or_default(),
                };
                policies::create_policy(&client, input, format).await?;
            }
            PolicyCommands::Show { id } => {
                policies::show_policy(&client, &id, format).await?;
            }
            PolicyCommands::Update {
                id,
                name,
                strict,
                thresholds,
                rules,
            } => {
                let patch = PolicyPatch {
                    name,
                    strict_mode: strict,
                    thresholds: policies::parse_object("--thresholds", thresholds.as_deref())?,
                    auto_execute_rules: policies::parse_object("--rules", rules.as_deref())?,
                };
                policies::update_policy(&client, &id, patch, format).await?;
            }
        },
        Commands::Savings { tenant } => {
            let tenant = config.resolve_tenant(tenant)?;
            savings::show_savings(&client, &tenant, format).await?;
        }
    }

    Ok(())
}
