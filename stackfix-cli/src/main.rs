use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use fs_err as fs;
use stackfix_cli::config::{self, CliOverrides, ConfigMerger, MergedConfig};
use stackfix_cli::env::service_environment;
use stackfix_compose::{FixupError, FixupPolicy, fixup};
use stackfix_core::adapters::{DockerComposeSource, FsWritePort};
use stackfix_core::{CONF_DIR, RenderSettings, render_patch, run_render};
use stackfix_envfile::FsLayerSource;
use std::io::{IsTerminal, Read, Write};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "stackfix",
    version,
    about = "Fix up canonical docker compose configurations for ddev projects."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fix up a canonical compose document read from a file or stdin.
    Fixup(FixupArgs),
    /// Canonicalize a project's compose files with docker compose and write the full artifact.
    Render(RenderArgs),
    /// Show the environment a service receives from the project's .env layers.
    Env(EnvArgs),
}

/// Flags shared by `fixup` and `render`.
#[derive(Debug, clap::Args)]
struct PolicyArgs {
    /// Project name (default: `name` from .ddev/config.yaml, then the directory name).
    #[arg(long)]
    project: Option<String>,

    /// Environment layer to inject, in order. Repeatable.
    #[arg(long = "env-file")]
    env_files: Vec<Utf8PathBuf>,

    /// Host address for published ports without a host_ip.
    #[arg(long)]
    bind_ip: Option<String>,

    /// Bind published ports on all interfaces.
    #[arg(long, default_value_t = false)]
    bind_all_interfaces: bool,

    /// Tell services not to emit colored output.
    #[arg(long, default_value_t = false)]
    no_color: bool,
}

impl PolicyArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            project: self.project.clone(),
            bind_ip: self.bind_ip.clone(),
            bind_all_interfaces: self.bind_all_interfaces,
        }
    }
}

#[derive(Debug, Parser)]
struct FixupArgs {
    /// Input document; `-` reads stdin.
    #[arg(long, default_value = "-")]
    input: String,

    /// Write the result here instead of stdout.
    #[arg(long)]
    output: Option<Utf8PathBuf>,

    /// Project root holding .ddev/config.yaml (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Print a diff against the input instead of the document.
    #[arg(long, default_value_t = false)]
    diff: bool,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Debug, Parser)]
struct RenderArgs {
    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Docker CLI used to run `compose config`.
    #[arg(long, default_value = "docker")]
    compose_bin: String,

    /// Compose file, in merge order. Repeatable (default: discovered in .ddev).
    #[arg(long = "compose-file")]
    compose_files: Vec<Utf8PathBuf>,

    /// Print the diff but do not write the artifact.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Debug, Parser)]
struct EnvArgs {
    /// Service name.
    service: String,

    /// Project root (default: current directory).
    #[arg(long, default_value = ".")]
    project_root: Utf8PathBuf,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        return ExitCode::from(exit_code(&e));
    }
    ExitCode::from(0)
}

/// 2 for malformed compose input, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<FixupError>())
        .map(FixupError::exit_code)
        .unwrap_or(1)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Fixup(args) => cmd_fixup(args),
        Command::Render(args) => cmd_render(args),
        Command::Env(args) => cmd_env(args),
    }
}

/// Colors stay on unless disabled by flag, by a non-empty `NO_COLOR`, or by a non-tty stdout.
fn colors_enabled(no_color_flag: bool, no_color_env: Option<&str>) -> bool {
    !no_color_flag
        && no_color_env.is_none_or(str::is_empty)
        && std::io::stdout().is_terminal()
}

fn merged_config(project_root: &Utf8Path, policy: &PolicyArgs) -> anyhow::Result<MergedConfig> {
    let file_config = config::load_or_default(project_root).context("load project config")?;
    let merged = ConfigMerger::new(file_config).merge(project_root, &policy.overrides());
    debug!(
        "merged config: project={}, bind={:?}",
        merged.project_name, merged.bind
    );
    Ok(merged)
}

fn cmd_fixup(args: FixupArgs) -> anyhow::Result<()> {
    let merged = merged_config(&args.project_root, &args.policy)?;

    let input = if args.input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("read compose document from stdin")?;
        buf
    } else {
        fs::read_to_string(&args.input).with_context(|| format!("read {}", args.input))?
    };

    let no_color = std::env::var("NO_COLOR").ok();
    let colors = colors_enabled(args.policy.no_color, no_color.as_deref());

    // Only explicit settings bind ports here; engine detection is a `render` concern.
    let bind_ip = if merged.bind.bind_all_interfaces {
        Some("0.0.0.0".to_string())
    } else {
        merged.bind.bind_ip.clone()
    };
    let policy = FixupPolicy {
        env_files: args.policy.env_files.clone(),
        colors_enabled: colors,
        no_color,
        bind_ip,
        ..FixupPolicy::for_project(&merged.project_name)
    };

    let document = fixup(&input, &policy)?;
    let yaml = document.to_yaml()?;

    let out = if args.diff {
        let name = if args.input == "-" { "stdin" } else { args.input.as_str() };
        render_patch(Utf8Path::new(name), &input, &yaml, colors)
    } else {
        yaml
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &out).with_context(|| format!("write {}", path))?;
            info!(path = %path, "wrote fixed compose document");
        }
        None => {
            std::io::stdout()
                .write_all(out.as_bytes())
                .context("write to stdout")?;
        }
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let merged = merged_config(&args.project_root, &args.policy)?;

    let no_color = std::env::var("NO_COLOR").ok();
    let colors = colors_enabled(args.policy.no_color, no_color.as_deref());

    let mut bind = merged.bind;
    bind.docker_host = std::env::var("DOCKER_HOST").ok();

    let settings = RenderSettings {
        project_root: args.project_root.clone(),
        project_name: merged.project_name,
        compose_files: args.compose_files,
        env_files: (!args.policy.env_files.is_empty()).then(|| args.policy.env_files.clone()),
        bind,
        colors_enabled: colors,
        no_color,
        dry_run: args.dry_run,
    };

    let compose = DockerComposeSource::new(args.compose_bin, args.project_root.join(CONF_DIR));
    let outcome = run_render(&settings, &compose, &FsWritePort)?;

    let mut stdout = std::io::stdout();
    if outcome.written {
        writeln!(stdout, "wrote {}", outcome.artifact_path)?;
    } else if outcome.changed {
        stdout.write_all(outcome.patch.as_bytes())?;
    } else {
        writeln!(stdout, "{} is up to date", outcome.artifact_path)?;
    }
    Ok(())
}

fn cmd_env(args: EnvArgs) -> anyhow::Result<()> {
    let conf_dir = args.project_root.join(CONF_DIR);
    let env = service_environment(&conf_dir, &args.service, &FsLayerSource)?;

    let out = match args.format {
        OutputFormat::Text => env.to_text(),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&env).context("serialize environment")?;
            json.push('\n');
            json
        }
    };
    std::io::stdout()
        .write_all(out.as_bytes())
        .context("write to stdout")?;
    Ok(())
}
