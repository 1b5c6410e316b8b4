use duct::cmd;

pub fn build(release: bool, target: &str) -> anyhow::Result<()> {
    let mut build_args = vec!["build", "--package", "zbl-rs", "--target", target];

    if release {
        build_args.push("--release");
    }

    cmd("cargo", build_args).run()?;
    Ok(())
}

/// The path the boot menu binary lands at for a given profile.
pub fn binary_path(release: bool) -> String {
    let profile = if release { "release" } else { "debug" };
    format!("target/x86_64-unknown-uefi/{profile}/zbl.efi")
}
