mod age;
mod client;
mod config;
mod member;
mod render;
mod style;

use crate::client::ApiClient;
use crate::config::{Overrides, Scope, resolve, save};
use crate::member::{Member, MemberUpdate};
use crate::render::{Paint, render_detail, render_table};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const USAGE_HINT: &str = "Nothing to do for --address. Use one of:
  --info                                 show the member
  --delete                               remove the member
  --edit --name <TEXT> --description <TEXT>
                                         rename / describe the member
  --auth <true|false>                    authorize or deauthorize the member";

#[derive(Parser)]
#[command(
    name = "ztctl",
    version,
    about = "Inspect and manage members of a ZeroTier network",
    after_help = "Without --address, all members of the network are listed."
)]
struct Cli {
    #[arg(
        long,
        env = "ZTCTL_TOKEN",
        hide_env_values = true,
        help = "API token override for this invocation (otherwise read from config)"
    )]
    token: Option<String>,

    #[arg(
        long,
        value_name = "NETWORK_ID",
        env = "ZTCTL_NETWORK",
        help = "Network to operate on (otherwise read from config)"
    )]
    network: Option<String>,

    #[arg(
        long,
        value_name = "URL",
        env = "ZTCTL_BASE_URL",
        help = "Base URL of the controller API (defaults to https://api.zerotier.com/api/v1)"
    )]
    base_url: Option<String>,

    #[arg(long, value_name = "ID", help = "Member address; omit to list all members")]
    address: Option<String>,

    #[arg(long, help = "Show details for the member")]
    info: bool,

    #[arg(long, help = "Delete the member from the network")]
    delete: bool,

    #[arg(long, help = "Update the member's --name and/or --description")]
    edit: bool,

    #[arg(long, value_name = "TEXT", help = "New display name (with --edit)")]
    name: Option<String>,

    #[arg(long, value_name = "TEXT", help = "New description (with --edit)")]
    description: Option<String>,

    #[arg(long, value_name = "true|false", help = "Authorize or deauthorize the member")]
    auth: Option<bool>,

    #[arg(long, help = "List only authorized members")]
    authorized_only: bool,

    #[arg(
        long,
        short = 'o',
        value_enum,
        default_value_t = OutputFormat::Pretty,
        help = "Output format for listings and member details"
    )]
    output: OutputFormat,

    #[arg(long, global = true, help = "Disable coloured output")]
    no_color: bool,

    #[arg(long, short = 'v', global = true, help = "Log requests to stderr")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Persist token, network and/or base URL to the chosen scope
    Configure {
        #[arg(long)]
        token: Option<String>,
        #[arg(long, value_name = "NETWORK_ID")]
        network: Option<String>,
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        #[arg(
            long,
            value_enum,
            default_value_t = ScopeArg::User,
            help = "Where to write the config (local project dir or user config dir)"
        )]
        scope: ScopeArg,
    },
    /// Show current configuration (token masked)
    ConfigShow,
    /// Generate shell completion scripts
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScopeArg {
    Local,
    User,
}

impl From<ScopeArg> for Scope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Local => Scope::Local,
            ScopeArg::User => Scope::User,
        }
    }
}

/// The single operation one invocation performs.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    List { authorized_only: bool },
    Info { address: String },
    Delete { address: String },
    Edit { address: String, update: MemberUpdate },
    SetAuthorization { address: String, authorized: bool },
    Usage,
}

impl Action {
    /// Flags are checked in priority order: info, delete, edit, auth.
    /// A blank `--address` counts as absent and lists the network.
    fn from_cli(cli: &Cli) -> Self {
        let address = cli
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        let Some(address) = address else {
            return Action::List {
                authorized_only: cli.authorized_only,
            };
        };

        let details = MemberUpdate::details(cli.name.clone(), cli.description.clone());
        if cli.info {
            Action::Info { address }
        } else if cli.delete {
            Action::Delete { address }
        } else if cli.edit && !details.is_empty() {
            Action::Edit {
                address,
                update: details,
            }
        } else if let Some(authorized) = cli.auth {
            Action::SetAuthorization {
                address,
                authorized,
            }
        } else {
            Action::Usage
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ztctl={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("reading current directory")?;

    if let Some(command) = &cli.command {
        run_command(command, &cwd)?;
        return Ok(ExitCode::SUCCESS);
    }

    let action = Action::from_cli(&cli);
    debug!(?action, "selected action");
    if action == Action::Usage {
        eprintln!("{USAGE_HINT}");
        return Ok(ExitCode::from(2));
    }

    let settings = resolve(
        &cwd,
        Overrides {
            token: cli.token.clone(),
            network: cli.network.clone(),
            base_url: cli.base_url.clone(),
        },
    )?;
    let client = ApiClient::new(&settings.base_url, &settings.network, &settings.token)?;
    let paint = style::painter(cli.no_color);

    execute(action, &client, &settings.network, cli.output, paint.as_ref())?;
    Ok(ExitCode::SUCCESS)
}

fn execute(
    action: Action,
    client: &ApiClient,
    network: &str,
    output: OutputFormat,
    paint: &dyn Paint,
) -> Result<()> {
    match action {
        Action::List { authorized_only } => {
            let mut members = client.list_members().context("listing members")?;
            if authorized_only {
                members.retain(Member::is_authorized);
            }
            if output == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&members)?);
                return Ok(());
            }
            println!("Network ID: {network}\n");
            if members.is_empty() {
                println!("No members found.");
            } else {
                print!("{}", render_table(&members, Utc::now(), paint));
            }
        }
        Action::Info { address } => {
            let member = client
                .get_member(&address)
                .with_context(|| format!("fetching member {address}"))?;
            if output == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&member)?);
            } else {
                print!("{}", render_detail(&member, Utc::now(), paint));
            }
        }
        Action::Delete { address } => {
            client
                .delete_member(&address)
                .with_context(|| format!("deleting member {address}"))?;
            println!("Member {address} deleted.");
        }
        Action::Edit { address, update } => {
            client
                .update_member(&address, &update)
                .with_context(|| format!("updating member {address}"))?;
            println!("Member {address} updated successfully.");
        }
        Action::SetAuthorization {
            address,
            authorized,
        } => {
            client
                .update_member(&address, &MemberUpdate::authorization(authorized))
                .with_context(|| format!("updating member {address}"))?;
            let verb = if authorized { "authorized" } else { "deauthorized" };
            println!("Member {address} {verb}.");
        }
        Action::Usage => unreachable!("usage is handled before connecting"),
    }
    Ok(())
}

fn run_command(command: &Commands, cwd: &std::path::Path) -> Result<()> {
    match command {
        Commands::Configure {
            token,
            network,
            base_url,
            scope,
        } => {
            if token.is_none() && network.is_none() && base_url.is_none() {
                bail!("nothing to configure; pass --token, --network and/or --base-url");
            }
            let mut existing = config::load_scope((*scope).into(), cwd)?;
            if let Some(token) = token {
                existing.token = Some(token.clone());
            }
            if let Some(network) = network {
                existing.network = Some(network.clone());
            }
            if let Some(url) = base_url {
                existing.base_url = Some(url.clone());
            }

            let path = save((*scope).into(), &existing, cwd)?;
            println!("Saved configuration to {}", path.display());
        }
        Commands::ConfigShow => {
            let merged = config::load(cwd)?;
            print!("{}", serde_yaml::to_string(&config::masked(&merged))?);
        }
        Commands::Completion { shell } => {
            use clap_complete::{generate, shells};
            let mut cmd = Cli::command();
            let bin = cmd.get_name().to_string();
            match shell {
                CompletionShell::Bash => {
                    generate(shells::Bash, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Zsh => {
                    generate(shells::Zsh, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::Fish => {
                    generate(shells::Fish, &mut cmd, bin, &mut std::io::stdout())
                }
                CompletionShell::PowerShell => {
                    generate(shells::PowerShell, &mut cmd, bin, &mut std::io::stdout())
                }
            }
        }
    }
    Ok(())
}
