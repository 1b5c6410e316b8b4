use duct::cmd;

use crate::build;

pub fn run(ovmf_code: Option<&str>, release: bool, add_file: Option<&str>) -> anyhow::Result<()> {
    let mut run_args = vec!["-d"];

    if let Some(ovmf_code) = ovmf_code {
        run_args.extend(["-b", ovmf_code]);
    }

    if let Some(add_file) = add_file {
        run_args.extend(["-f", add_file]);
    }

    let binary = build::binary_path(release);
    run_args.push(&binary);

    cmd!("cargo", "install", "uefi-run").run()?; // will not install if its already installed
    build::build(release, "x86_64-unknown-uefi")?;
    if let Err(e) = cmd("uefi-run", run_args).run() {
        println!(
            "hint: if the error was that the PC BIOS could not be loaded, you may have to specify ovmf-code"
        );
        return Err(e.into());
    }
    Ok(())
}
