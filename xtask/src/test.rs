use clap::Subcommand;
use duct::cmd;

#[derive(Subcommand)]
pub enum Test {
    /// Run integration tests in a VM with uefi-run
    Run {
        /// Path to the OVMF code file
        #[arg(long)]
        ovmf_code: Option<String>,
    },
}

pub fn test_crate(command: Option<Test>) -> anyhow::Result<()> {
    if let Some(command) = command {
        let Test::Run { ovmf_code } = command;
        test_on_vm(ovmf_code.as_deref())
    } else {
        test_on_host()
    }
}

pub fn test_on_host() -> anyhow::Result<()> {
    cmd!("cargo", "clippy", "--package", "zbl-rs").run()?;
    cmd!("cargo", "test", "--package", "zbl-rs", "--lib").run()?;
    cmd!("cargo", "fmt", "--all", "--check").run()?;
    Ok(())
}

pub fn test_on_vm(ovmf_code: Option<&str>) -> anyhow::Result<()> {
    let mut run_args = vec!["-d"];

    if let Some(ovmf_code) = ovmf_code {
        run_args.extend(["-b", ovmf_code]);
    }

    run_args.push("target/x86_64-unknown-uefi/debug/zbl-tests.efi");
    cmd!("cargo", "install", "uefi-run").run()?; // will not install if its already installed
    cmd!(
        "cargo",
        "build",
        "--package",
        "zbl-rs-tests",
        "--target",
        "x86_64-unknown-uefi",
    )
    .run()?;
    if let Err(e) = cmd("uefi-run", run_args).run() {
        println!(
            "hint: if the error was that the PC BIOS could not be loaded, you may have to specify ovmf-code"
        );
        return Err(e.into());
    }
    Ok(())
}
