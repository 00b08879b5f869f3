use anyhow::Result;
use clap::Parser;
use optager::commands::{self, config::Config};
use optager::install::InstallOptions;
use std::path::PathBuf;

/// optager - install tarballs into a shared install root
///
/// Extracts a .tar.gz or .tar.xz archive that holds a single folder into the
/// install root and links its executables into a bin directory.
///
/// Examples:
///   optager install node-v20.11.0-linux-x64.tar.xz --name node
///   optager install -g tool-1.0.tar.gz
///   optager remove node
#[derive(Parser, Debug)]
#[command(author, version = env!("OPTAGER_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Install root directory (defaults to /opt; also via OPTAGER_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "OPTAGER_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub install_root: Option<PathBuf>,

    /// Bin directory for global installs (defaults to /usr/local/bin; also via OPTAGER_GLOBAL_BIN)
    #[arg(
        long = "global-bin-dir",
        env = "OPTAGER_GLOBAL_BIN",
        value_name = "PATH",
        global = true
    )]
    pub global_bin_dir: Option<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install an archive into the install root
    Install(InstallArgs),

    /// Remove installed packages
    #[command(alias = "uninstall")]
    Remove(RemoveArgs),

    /// List installed packages
    List,

    /// Print the version
    Version,
}

#[derive(clap::Args, Debug)]
pub struct InstallArgs {
    /// Path to a .tar.gz, .tgz, .tar.xz or .txz archive
    #[arg(value_name = "ARCHIVE")]
    pub archive: PathBuf,

    /// Link binaries into the global bin directory instead of ~/.local/bin
    #[arg(long, short = 'g')]
    pub global: bool,

    /// Name to refer to the package by, instead of its folder name
    #[arg(long, short = 'n', value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Display names or folder names of the packages to remove
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = optager::runtime::RealRuntime;

    if let Commands::Version = cli.command {
        println!("optager {}", env!("OPTAGER_VERSION"));
        return Ok(());
    }

    let config = Config::new(&runtime, cli.install_root, cli.global_bin_dir)?;
    match cli.command {
        Commands::Install(args) => commands::install(
            runtime,
            &args.archive,
            InstallOptions {
                display_name: args.name,
                global: args.global,
            },
            config,
        )?,
        Commands::Remove(args) => commands::remove(runtime, &args.names, config)?,
        Commands::List => commands::list(runtime, config)?,
        Commands::Version => {}
    }
    Ok(())
}
