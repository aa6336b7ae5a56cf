use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use actionkb::analysis::Outcome;
use actionkb::config::Config;
use actionkb::error::KbError;
use actionkb::ir::{ActionRef, RepoMetadata};
use actionkb::output::OutputFormat;
use actionkb::{kb, AnalyzeOptions};

#[derive(Parser)]
#[command(
    name = "action-kb",
    about = "GITHUB_TOKEN usage and permission inference for CI actions",
    version,
    author
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a local checkout of an action
    Analyze {
        /// Path to the action directory (containing action.yml)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Action reference (owner/repo[/path])
        #[arg(long, short = 'a', conflicts_with = "title")]
        action: Option<String>,

        /// Knowledge-base issue title to take the action reference from
        #[arg(long, short = 't')]
        title: Option<String>,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (comment, manifest, json)
        #[arg(long, short = 'f', default_value = "comment")]
        format: String,

        /// Override the detected top language ("not found" disables endpoint inference)
        #[arg(long)]
        language: Option<String>,

        /// Git ref for follow-up links
        #[arg(long)]
        git_ref: Option<String>,

        /// Stargazer count to report
        #[arg(long)]
        stars: Option<u64>,

        /// Fork count to report
        #[arg(long)]
        forks: Option<u64>,

        /// Repository visibility to report
        #[arg(long)]
        private: Option<bool>,

        /// Exit with status 1 when no token reference is found
        #[arg(long)]
        fail_on_no_token: bool,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the rule table in effect
    ListRules {
        /// Config file path
        #[arg(long, short = 'c', default_value = ".action-kb.toml")]
        config: PathBuf,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Print the knowledge-base path of an action's manifest
    KbPath {
        /// Action reference (owner/repo[/path]) or a KB issue title
        action: String,

        /// Print the placeholder manifest for a new entry as well
        #[arg(long)]
        placeholder: bool,
    },

    /// Generate a starter .action-kb.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Analyze {
            path,
            action,
            title,
            config,
            format,
            language,
            git_ref,
            stars,
            forks,
            private,
            fail_on_no_token,
            output,
        } => {
            let repo = RepoMetadata {
                stars,
                forks,
                private,
            };
            resolve_action(action, title).and_then(|action| {
                let options = AnalyzeOptions {
                    action,
                    config_path: config,
                    language_override: language,
                    git_ref_override: git_ref,
                    repo,
                };
                cmd_analyze(path, options, format, fail_on_no_token, output)
            })
        }
        Commands::ListRules { config, format } => cmd_list_rules(config, format),
        Commands::KbPath {
            action,
            placeholder,
        } => cmd_kb_path(action, placeholder),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_action(action: Option<String>, title: Option<String>) -> Result<ActionRef, KbError> {
    match (action, title) {
        (Some(action), _) => ActionRef::parse(&action),
        (None, Some(title)) => kb::action_from_title(&title),
        (None, None) => Err(KbError::InvalidActionRef(
            "either --action or --title is required".into(),
        )),
    }
}

fn cmd_analyze(
    path: PathBuf,
    options: AnalyzeOptions,
    format_str: String,
    fail_on_no_token: bool,
    output_path: Option<PathBuf>,
) -> Result<i32, KbError> {
    let format = OutputFormat::from_str_lenient(&format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using comment", format_str);
        OutputFormat::Comment
    });

    let report = actionkb::analyze(&path, &options)?;
    let rendered = actionkb::render_report(&report, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(
        if fail_on_no_token && report.result.outcome == Outcome::NoToken {
            1
        } else {
            0
        },
    )
}

fn cmd_list_rules(config_path: PathBuf, format_str: String) -> Result<i32, KbError> {
    let config = Config::load(&config_path)?;
    // Compile to surface invalid patterns before printing.
    config.rules.compile()?;
    let rules = &config.rules;

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(rules)?;
            println!("{}", json);
        }
        _ => {
            println!("TOKEN PATTERNS");
            for pattern in &rules.token_patterns {
                println!("  {}", pattern);
            }
            println!("DEFAULT TOKEN PATTERN");
            println!("  {}", rules.default_token_pattern);

            println!();
            println!("{:<14} {:<18} CLIENT LIBRARIES", "LANGUAGE", "MANIFEST");
            println!("{}", "-".repeat(72));
            for lang in &rules.languages {
                println!(
                    "{:<14} {:<18} {}",
                    lang.name,
                    lang.dependency_manifest,
                    lang.client_libraries.join(", ")
                );
            }

            println!();
            println!("{:<16} SCOPE", "FRAGMENT");
            println!("{}", "-".repeat(40));
            for rule in &rules.scopes {
                println!("{:<16} {}", rule.fragment, rule.scope);
            }

            println!();
            println!("{:<16} VERB", "METHOD PREFIX");
            println!("{}", "-".repeat(40));
            for rule in &rules.method_verbs {
                println!("{:<16} {}", rule.prefix, rule.verb);
            }
        }
    }

    Ok(0)
}

fn cmd_kb_path(action: String, placeholder: bool) -> Result<i32, KbError> {
    let action = if kb::is_kb_title(&action) {
        kb::action_from_title(&action)?
    } else {
        ActionRef::parse(&action)?
    };

    println!("{}", kb::manifest_path(&action).display());
    if placeholder {
        print!("{}", kb::placeholder_manifest(&action));
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, KbError> {
    let path = PathBuf::from(".action-kb.toml");

    if path.exists() && !force {
        eprintln!(".action-kb.toml already exists. Use --force to overwrite.");
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created .action-kb.toml");

    Ok(0)
}
