use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use quorum_core::QuorumConfig;
use quorum_github::{CommentAction, GitHubClient};
use quorum_review::SessionClient;

#[derive(Parser)]
#[command(
    name = "quorum",
    version,
    about = "PR summary and multi-reviewer bot",
    long_about = "Quorum fetches a pull request, asks an LLM to review it, and keeps exactly\n\
                   one up-to-date comment on the PR.\n\n\
                   Both run modes are zero-argument and read their target from the environment\n\
                   (QUORUM_REPO/GITHUB_REPOSITORY, QUORUM_PR/PR_NUMBER, GITHUB_TOKEN) or from\n\
                   .quorum.toml.\n\n\
                   Examples:\n  \
                     quorum summarize     Post a single-session PR summary\n  \
                     quorum review        Fan out security/performance/readability reviewers\n  \
                     quorum doctor        Check setup and environment"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .quorum.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize the PR with a single LLM session and upsert the comment
    #[command(long_about = "Summarize the PR with a single LLM session.\n\n\
        Fetches PR metadata, commits, and per-file diffs (truncated to the configured\n\
        ceilings), sends one summarizer session, and creates or updates the bot's\n\
        marker-tagged comment on the PR.\n\n\
        Example:\n  QUORUM_REPO=owner/repo QUORUM_PR=42 quorum summarize")]
    Summarize,
    /// Run the multi-agent review: three specialists plus an orchestrator
    #[command(
        long_about = "Run the multi-agent review.\n\n\
        Fans the PR out to security, performance, and readability reviewer sessions\n\
        concurrently, then merges their findings through an orchestrator session into\n\
        Critical/Warning/Suggestion buckets. A failed reviewer is noted in the report;\n\
        the run only fails when every reviewer fails.\n\n\
        Example:\n  QUORUM_REPO=owner/repo QUORUM_PR=42 quorum review"
    )]
    Review,
    /// Create a default .quorum.toml configuration file
    #[command(long_about = "Create a default .quorum.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .quorum.toml already exists.")]
    Init,
    /// Check your Quorum setup and environment
    #[command(long_about = "Check your Quorum setup and environment.\n\n\
        Runs diagnostics for the config file, target repository and PR number,\n\
        GitHub token, and LLM credential resolution.")]
    Doctor,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!("quorum v{version} — one comment, three specialists, zero duplicates\n");

    println!("Quick start:");
    println!("  quorum init          Create a .quorum.toml config file");
    println!("  quorum summarize     Post a single-session PR summary");
    println!("  quorum review        Run the multi-agent review\n");

    println!("All commands:");
    println!("  summarize  Single-session PR summary, upserted as one comment");
    println!("  review     Security/performance/readability fan-out + orchestrated merge");
    println!("  doctor     Check your setup and environment");
    println!("  init       Create default configuration\n");

    println!("Run 'quorum <command> --help' for details.");
}

fn make_spinner(message: &str) -> Option<indicatif::ProgressBar> {
    if !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = indicatif::ProgressBar::new_spinner();
    pb.set_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})").unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    Some(pb)
}

/// Fetch the snapshot and build the shared prompt; both run modes start here.
async fn fetch_stage(
    config: &QuorumConfig,
    verbose: bool,
) -> Result<(GitHubClient, String, String, u64, String)> {
    let (owner, repo, number) = config.target()?;
    let github = GitHubClient::new(config.github.token.as_deref())?;

    eprintln!("Fetching {owner}/{repo}#{number} ...");
    let snapshot = github
        .fetch_snapshot(&owner, &repo, number, &config.limits)
        .await?;
    eprintln!(
        "Fetched \"{}\" by {} ({} commits, {} files)",
        snapshot.title,
        snapshot.author,
        snapshot.commit_messages.len(),
        snapshot.files.len(),
    );

    let prompt = quorum_review::prompt::build_pr_prompt(&snapshot);
    if verbose {
        eprintln!("Prompt size: {} chars", prompt.len());
    }
    Ok((github, owner, repo, number, prompt))
}

fn report_publish(action: CommentAction, owner: &str, repo: &str, number: u64) {
    match action {
        CommentAction::Created => eprintln!("Created comment on {owner}/{repo}#{number}"),
        CommentAction::Updated => eprintln!("Updated comment on {owner}/{repo}#{number}"),
    }
}

async fn run_summarize(config: &QuorumConfig, verbose: bool) -> Result<()> {
    let (github, owner, repo, number, prompt) = fetch_stage(config, verbose).await?;

    let credential = config.llm_credential()?;
    let session_client = SessionClient::new(&config.llm, credential)?;

    let spinner = make_spinner("Summarizing PR...");
    let summary = quorum_review::runner::run_summary(&session_client, &prompt)
        .await
        .inspect_err(|_| {
            if let Some(pb) = &spinner {
                pb.finish_with_message("Failed");
            }
        })?;
    if let Some(pb) = spinner {
        pb.finish_with_message("Summary ready");
    }

    let action = github.upsert_comment(&owner, &repo, number, &summary).await?;
    report_publish(action, &owner, &repo, number);
    Ok(())
}

async fn run_review(config: &QuorumConfig, verbose: bool) -> Result<()> {
    let (github, owner, repo, number, prompt) = fetch_stage(config, verbose).await?;

    let credential = config.llm_credential()?;
    let session_client = SessionClient::new(&config.llm, credential)?;

    eprintln!(
        "Dispatching {} reviewers ...",
        quorum_core::ReviewerRole::ALL.len()
    );
    let spinner = make_spinner("Reviewing PR...");
    let report = quorum_review::orchestrator::run_review(&session_client, &prompt)
        .await
        .inspect_err(|_| {
            if let Some(pb) = &spinner {
                pb.finish_with_message("Failed");
            }
        })?;
    if let Some(pb) = spinner {
        pb.finish_with_message("Review merged");
    }

    for role in &report.succeeded {
        eprintln!("  {} review completed", role.label());
    }
    for role in &report.failed {
        eprintln!("  {} review unavailable", role.label());
    }

    let action = github
        .upsert_comment(&owner, &repo, number, &report.to_markdown())
        .await?;
    report_publish(action, &owner, &repo, number);
    Ok(())
}

struct CheckResult {
    name: &'static str,
    status: &'static str,
    detail: String,
    hint: Option<String>,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            status: "pass",
            detail: detail.into(),
            hint: None,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            name,
            status: "fail",
            detail: detail.into(),
            hint: Some(hint.into()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self.status {
            "pass" => "\u{2713}",
            _ => "\u{2717}",
        }
    }
}

fn run_doctor(config: &QuorumConfig) {
    let mut checks: Vec<CheckResult> = Vec::new();

    let config_path = std::path::Path::new(".quorum.toml");
    if config_path.exists() {
        checks.push(CheckResult::pass("config_file", ".quorum.toml found"));
    } else {
        checks.push(CheckResult::fail(
            "config_file",
            ".quorum.toml not found",
            "run 'quorum init' to create a default config",
        ));
    }

    match config.target() {
        Ok((owner, repo, number)) => {
            checks.push(CheckResult::pass(
                "target",
                format!("{owner}/{repo}#{number}"),
            ));
        }
        Err(e) => checks.push(CheckResult::fail(
            "target",
            e.to_string(),
            "set QUORUM_REPO (owner/repo) and QUORUM_PR",
        )),
    }

    if config.github.token.is_some()
        || std::env::var("GITHUB_TOKEN").is_ok()
        || std::env::var("GH_TOKEN").is_ok()
    {
        checks.push(CheckResult::pass("github_token", "token available"));
    } else {
        checks.push(CheckResult::fail(
            "github_token",
            "no GitHub token",
            "export GITHUB_TOKEN=... or set token in .quorum.toml [github]",
        ));
    }

    match config.llm_credential() {
        Ok(_) => checks.push(CheckResult::pass("llm_credential", "credential resolved")),
        Err(e) => checks.push(CheckResult::fail(
            "llm_credential",
            e.to_string(),
            "export COPILOT_API_KEY=... (or rely on GITHUB_TOKEN)",
        )),
    }

    checks.push(CheckResult::pass(
        "llm_model",
        format!("{} (timeout {}s)", config.llm.model, config.llm.timeout_secs),
    ));

    let version = env!("CARGO_PKG_VERSION");
    println!("Quorum v{version} — Environment Check\n");
    for check in &checks {
        let label = check.name.replace('_', " ");
        println!("  {} {label:<16} {}", check.symbol(), check.detail);
        if let Some(hint) = &check.hint {
            println!("    hint: {hint}");
        }
    }
    let passed = checks.iter().filter(|c| c.status == "pass").count();
    let failed = checks.iter().filter(|c| c.status == "fail").count();
    println!("\n{passed} checks passed, {failed} failed");
}

const DEFAULT_CONFIG: &str = r#"# Quorum Configuration
# Env vars override file values: QUORUM_REPO, QUORUM_PR, GITHUB_TOKEN,
# COPILOT_API_KEY, QUORUM_LLM_BASE_URL.

[github]
# repo = "owner/repo"
# pr = 123
# token = "ghp_..."

[llm]
# model = "gpt-4.1"
# base_url = "https://api.githubcopilot.com"
# timeout_secs = 120

[limits]
# per_file_chars = 3000
# total_chars = 50000
"#;

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => QuorumConfig::from_file(path)?,
        None => {
            let default_path = std::path::Path::new(".quorum.toml");
            if default_path.exists() {
                QuorumConfig::from_file(default_path)?
            } else {
                QuorumConfig::default()
            }
        }
    };
    config.apply_env();

    match cli.command {
        None => {
            print_welcome();
        }
        Some(Command::Summarize) => {
            run_summarize(&config, cli.verbose).await?;
        }
        Some(Command::Review) => {
            run_review(&config, cli.verbose).await?;
        }
        Some(Command::Init) => {
            let path = std::path::Path::new(".quorum.toml");
            if path.exists() {
                miette::bail!(".quorum.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .quorum.toml with default configuration");
        }
        Some(Command::Doctor) => {
            run_doctor(&config);
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "quorum", &mut std::io::stdout());
        }
    }

    Ok(())
}
