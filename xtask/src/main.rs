use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use fs_err as fs;
use stackfix_core::{CONF_DIR, OVERRIDE_COMPOSE_FILE};
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

#[derive(Debug, Parser)]
#[command(name = "xtask", about = "Workspace helper tasks")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bless golden fixtures (overwrite expected outputs).
    BlessFixtures,
    /// Create a new golden fixture skeleton under tests/fixtures/<name>.
    NewFixture { name: String },
    /// Create a sample project layout (.ddev/config.yaml, .env layers, override file).
    InitProject {
        #[arg(long, default_value = "sample-project")]
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::BlessFixtures => {
            let status = ProcessCommand::new("cargo")
                .args(["test", "-p", "stackfix-compose", "--test", "golden_fixtures"])
                .env("STACKFIX_BLESS", "1")
                .status()
                .context("run golden fixture blessing")?;
            if !status.success() {
                bail!("bless-fixtures failed");
            }
        }
        Command::NewFixture { name } => {
            let dir = new_fixture(Path::new("tests/fixtures"), &name)?;
            println!("created {}", dir.display());
        }
        Command::InitProject { dir } => {
            init_project(&dir)?;
            println!("initialized {}/{CONF_DIR}", dir.display());
        }
    }
    Ok(())
}

fn new_fixture(root: &Path, name: &str) -> anyhow::Result<PathBuf> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("fixture names are [A-Za-z0-9_]+, got {name:?}");
    }
    let dir = root.join(name);
    if dir.exists() {
        bail!("{} already exists", dir.display());
    }

    fs::create_dir_all(dir.join("env"))?;
    fs::write(
        dir.join("input.yaml"),
        "services:\n  web:\n    image: ddev/ddev-webserver\n",
    )?;
    fs::write(dir.join("policy.yaml"), format!("project: {name}\n"))?;
    Ok(dir)
}

fn init_project(dir: &Path) -> anyhow::Result<()> {
    let conf = dir.join(CONF_DIR);
    fs::create_dir_all(&conf).with_context(|| format!("create {}", conf.display()))?;

    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sample-project");
    let files = [
        ("config.yaml".to_string(), format!("name: {name}\nbind_all_interfaces: false\n")),
        (".env".to_string(), "# shared by every service\nAPP_ENV=dev\n".to_string()),
        (".env.web".to_string(), "# web only\nAPP_DEBUG=1\n".to_string()),
        (
            OVERRIDE_COMPOSE_FILE.to_string(),
            "services:\n  web:\n    environment:\n      - EXTRA=1\n".to_string(),
        ),
    ];
    for (file, contents) in files {
        let path = conf.join(file);
        if path.exists() {
            continue;
        }
        fs::write(&path, contents)?;
    }
    Ok(())
}
