//! CLI entry point for b2c-graph — an Azure AD B2C directory client.
//!
//! Authenticates with OAuth2 client credentials against the token endpoint
//! the chosen subcommand needs (Azure AD Graph or Microsoft Graph), runs the
//! operation and prints the result as JSON on stdout.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (auth failure, API error, partial membership edit, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use b2c_graph::auth::Credentials;
use b2c_graph::client::Tenant;
use b2c_graph::error::Result;
use b2c_graph::groups::{self, MembershipReport};
use b2c_graph::{reports, users};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Application (client) ID of the app registration.
    #[arg(long, env = "B2C_CLIENT_ID")]
    client_id: String,

    /// Client secret of the app registration. Prefer setting via the
    /// B2C_CLIENT_SECRET environment variable to keep it out of shell
    /// history and process listings.
    #[arg(long, env = "B2C_CLIENT_SECRET", hide_env_values = true)]
    client_secret: String,

    /// Tenant domain, e.g. contoso.onmicrosoft.com.
    #[arg(long, env = "B2C_TENANT_DOMAIN")]
    tenant_domain: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a single user (Microsoft Graph).
    User { id: String },
    /// List users (first page).
    Users,
    /// Find users whose first email address contains the given text.
    SearchUser { needle: String },
    /// Create a local account.
    AddUser {
        email: String,
        display_name: String,
        /// Initial password. Prefer the B2C_NEW_USER_PASSWORD environment variable.
        #[arg(long, env = "B2C_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Delete a user by object ID.
    DeleteUser { object_id: String },
    /// List the groups a user belongs to.
    MemberGroups {
        user_id: String,
        /// Resolve group IDs to display names.
        #[arg(long)]
        detailed: bool,
    },
    /// Show a single group.
    Group { id: String },
    /// List groups (first page).
    Groups,
    /// List all members of a group (Microsoft Graph).
    GroupMembers { group_id: String },
    /// Add every user with the given email address to a group.
    AddMember { group: String, email: String },
    /// Remove every user with the given email address from a group.
    RemoveMember { group: String, email: String },
    /// Number of B2C authentications in the last 30 days.
    AuthCount,
}

impl Command {
    /// Subcommands served by Microsoft Graph need a v2.0 token; the rest
    /// talk to the Azure AD Graph API.
    fn uses_graph(&self) -> bool {
        matches!(
            self,
            Command::User { .. } | Command::SearchUser { .. } | Command::GroupMembers { .. }
        )
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: MembershipReport) -> Result<()> {
    for object_id in &report.changed {
        println!("{:?} {object_id} in {}: ok", report.op, report.group);
    }
    Ok(())
}

async fn run(tenant: &Tenant, command: Command) -> Result<()> {
    match command {
        Command::User { id } => print_json(&users::get_user(tenant, &id).await?),
        Command::Users => print_json(&users::get_users(tenant).await?),
        Command::SearchUser { needle } => print_json(&users::search_user(tenant, &needle).await?),
        Command::AddUser {
            email,
            display_name,
            password,
        } => print_json(&users::add_user(tenant, &email, &display_name, &password).await?),
        Command::DeleteUser { object_id } => users::delete_user(tenant, &object_id).await,
        Command::MemberGroups { user_id, detailed } => {
            let groups = if detailed {
                users::get_member_groups_detailed(tenant, &user_id).await?
            } else {
                users::get_member_group_ids(tenant, &user_id).await?
            };
            print_json(&groups)
        }
        Command::Group { id } => print_json(&groups::get_group(tenant, &id).await?),
        Command::Groups => print_json(&groups::get_groups(tenant).await?),
        Command::GroupMembers { group_id } => {
            print_json(&groups::get_group_members(tenant, &group_id).await?)
        }
        Command::AddMember { group, email } => {
            print_report(groups::add_group_member(tenant, &group, &email).await?)
        }
        Command::RemoveMember { group, email } => {
            print_report(groups::delete_group_member(tenant, &group, &email).await?)
        }
        Command::AuthCount => print_json(&reports::get_b2c_authentication_count(tenant).await?),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let args = Cli::parse();

    let mut tenant = Tenant::new(Credentials::new(
        &args.client_id,
        &args.client_secret,
        &args.tenant_domain,
    ));

    let auth = if args.command.uses_graph() {
        tenant.authenticate_graph().await
    } else {
        tenant.authenticate_legacy().await
    };
    if let Err(e) = auth {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match run(&tenant, args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
