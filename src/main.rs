//! mrgate - Merge Request Quality Gate
//!
//! Command-line entry point. The process exit status is the gate: 0 when no
//! critical check failed, 1 otherwise, 2 for configuration errors.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use mrgate::ci::{CiOutcome, CiPatcher, CI_FILE};
use mrgate::config::{ConfigLoader, ConfigValidator, ConnectionArgs, GateConfig};
use mrgate::report::ReportSink;
use mrgate::run::{GateRun, RunOptions};
use mrgate::rules::Severity;
use mrgate::source::{GitLabClient, SnapshotSource};
use mrgate::{GateError, Result};

#[derive(Parser)]
#[command(name = "mrgate")]
#[command(version)]
#[command(about = "Merge request quality gate for GitLab CI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true, default_value = ".")]
    project: PathBuf,

    /// Extra config file merged over the user and project files
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a merge request on GitLab and post the report
    Check {
        /// Access token
        #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Project id or `group/project` path
        #[arg(long, env = "CI_PROJECT_ID")]
        project_id: Option<String>,

        /// Merge request IID
        #[arg(long, env = "CI_MERGE_REQUEST_IID")]
        mr: Option<u64>,

        /// API root, e.g. https://gitlab.example.com/api/v4
        #[arg(long, env = "CI_API_V4_URL")]
        api_url: Option<String>,

        /// Print the report without posting it to the MR
        #[arg(long)]
        no_comment: bool,

        /// Write a JSON run summary
        #[arg(long, value_name = "PATH")]
        json_out: Option<PathBuf>,
    },

    /// Evaluate an offline snapshot without touching the network
    Scan {
        /// Snapshot JSON document
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Also print the Markdown report
        #[arg(long)]
        markdown: bool,

        /// Write a JSON run summary
        #[arg(long, value_name = "PATH")]
        json_out: Option<PathBuf>,
    },

    /// List the registered checks
    Rules,

    /// Show or validate configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// GitLab CI integration
    Ci {
        #[command(subcommand)]
        action: CiAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the merged configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration files
    Validate,
    /// Show configuration file locations
    Paths,
}

#[derive(Subcommand)]
enum CiAction {
    /// Add the quality-check job to .gitlab-ci.yml
    Init {
        /// Replace an existing job
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "mrgate=debug,warn"
    } else {
        "mrgate=info,warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let project_path = cli.project.canonicalize().unwrap_or(cli.project.clone());
    if !project_path.exists() {
        return Err(GateError::config(format!(
            "Project directory does not exist: {}",
            project_path.display()
        )));
    }

    let loader = ConfigLoader::new().with_explicit_path(cli.config.clone());

    match cli.command {
        Commands::Check {
            token,
            project_id,
            mr,
            api_url,
            no_comment,
            json_out,
        } => {
            let config = loader.load(&project_path)?;
            let settings = ConnectionArgs {
                api_url,
                token,
                project_id,
                mr_iid: mr,
            }
            .resolve(&config)?;
            let client = GitLabClient::new(settings)?;

            let engine = config.build_engine()?;
            let renderer = config.report_renderer();
            let options = RunOptions {
                post_comment: !no_comment,
                json_out,
            };
            let sink: &dyn ReportSink = &client;
            let outcome = GateRun::new(&engine, &renderer, config.project_label.clone())
                .execute(&client, Some(sink), &options)
                .await?;

            print!("{}", outcome.console);
            if outcome.posted {
                println!("Report posted to merge request.");
            }
            Ok(outcome.exit_code())
        }

        Commands::Scan {
            snapshot,
            markdown,
            json_out,
        } => {
            let config = loader.load(&project_path)?;
            let source = SnapshotSource::load(&snapshot)?;
            let engine = config.build_engine()?;
            let renderer = config.report_renderer();
            let options = RunOptions {
                post_comment: false,
                json_out,
            };
            let outcome = GateRun::new(&engine, &renderer, config.project_label.clone())
                .execute(&source, None, &options)
                .await?;

            print!("{}", outcome.console);
            if markdown {
                println!();
                print!("{}", outcome.markdown);
            }
            Ok(outcome.exit_code())
        }

        Commands::Rules => {
            let config = loader.load(&project_path)?;
            let engine = config.build_engine()?;

            println!("\n{} Registered checks", "Rules:".cyan().bold());
            println!("{}", "─".repeat(60));
            for (id, name, severity) in engine.registered() {
                let cap = config
                    .limits
                    .cap_of(id)
                    .map(|c| format!("cap {}", c))
                    .unwrap_or_default();
                println!(
                    "   {:<24} {} {:<28} {}",
                    id,
                    colored_severity(severity),
                    name,
                    cap.dimmed()
                );
            }
            for id in &config.checks.disabled {
                println!("   {:<24} {}", id, "disabled".dimmed());
            }
            println!();
            Ok(0)
        }

        Commands::Config { action } => match action {
            ConfigAction::Show { json } => {
                let config = loader.load(&project_path)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&config)?);
                } else {
                    print!("{}", config.to_toml()?);
                }
                Ok(0)
            }
            ConfigAction::Validate => {
                let report = ConfigValidator::new(&project_path)
                    .with_loader(loader)
                    .validate();
                if cli.verbose {
                    println!("{}", report.verbose_report());
                } else {
                    for error in &report.errors {
                        eprintln!("{} {}", "Error:".red(), error);
                    }
                    for warning in &report.warnings {
                        eprintln!("{} {}", "Warning:".yellow(), warning);
                    }
                    if report.is_valid() {
                        println!("{} {}", "OK".green(), report.summary());
                    } else {
                        println!("{} {}", "FAILED".red(), report.summary());
                    }
                }
                Ok(report.exit_code())
            }
            ConfigAction::Paths => {
                print_paths(&loader, &project_path, cli.config.as_deref());
                Ok(0)
            }
        },

        Commands::Ci {
            action: CiAction::Init { force },
        } => {
            let report = CiPatcher::new(&project_path).init(force)?;
            match report.pipeline {
                CiOutcome::Unchanged => println!(
                    "{} {} already has the quality-check job (use --force to replace it)",
                    "OK".green(),
                    CI_FILE
                ),
                outcome => println!("{} {}: {}", "Updated:".green().bold(), CI_FILE, outcome),
            }
            if report.config_created {
                println!(
                    "{} {}",
                    "Created:".green().bold(),
                    GateConfig::project_path(&project_path).display()
                );
            }
            Ok(0)
        }
    }
}

fn colored_severity(severity: Severity) -> colored::ColoredString {
    let label = format!("{:<10}", severity.to_string());
    match severity {
        Severity::Critical => label.red(),
        Severity::Warning => label.yellow(),
        Severity::Info => label.blue(),
    }
}

fn print_paths(loader: &ConfigLoader, project_path: &Path, explicit: Option<&Path>) {
    println!("\n{} Configuration Paths", "Config:".cyan().bold());
    println!("{}", "─".repeat(40));
    match loader.user_config_path() {
        Some(path) => println!("   User:     {}", path.display()),
        None => println!("   User:     (no config directory on this platform)"),
    }
    println!(
        "   Project:  {}",
        GateConfig::project_path(project_path).display()
    );
    if let Some(path) = explicit {
        println!("   Explicit: {}", path.display());
    }
    println!("   Pipeline: {}", project_path.join(CI_FILE).display());
}
