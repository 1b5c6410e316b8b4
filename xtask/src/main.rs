use clap::{Parser, Subcommand};

use crate::test::Test;

mod build;
mod esp;
mod run;
mod test;

#[derive(Parser)]
#[command(about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the boot menu for the UEFI target
    Build {
        /// Build with release profile
        #[arg(short, long, default_value_t = false)]
        release: bool,

        /// Build with target architecture
        #[arg(short, long, default_value = "x86_64-unknown-uefi")]
        target: String,
    },

    /// Stage an ESP directory layout with the binary at EFI/Boot/bootx64.efi
    Esp {
        /// Build with release profile
        #[arg(short, long, default_value_t = false)]
        release: bool,

        /// Where to create the layout
        #[arg(short, long, default_value = "esp")]
        out: String,
    },

    /// Run zbl in a VM with uefi-run
    Run {
        /// Path to the OVMF code file
        #[arg(long)]
        ovmf_code: Option<String>,

        /// Build with release profile
        #[arg(short, long, default_value_t = false)]
        release: bool,

        /// Add an additional file to the root of the image
        #[arg(long)]
        add_file: Option<String>,
    },

    /// Run unit tests and clippy on host
    Test {
        #[command(subcommand)]
        command: Option<Test>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Build { release, target } => build::build(release, &target)?,
        Commands::Esp { release, out } => esp::stage(release, &out)?,
        Commands::Run {
            ovmf_code,
            release,
            add_file,
        } => run::run(ovmf_code.as_deref(), release, add_file.as_deref())?,
        Commands::Test { command } => test::test_crate(command)?,
    }
    Ok(())
}
