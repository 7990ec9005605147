use std::{env, fs, io, path::PathBuf};

fn main() -> io::Result<()> {
    // Put `memory.x` where the linker finds it
    let out = PathBuf::from(env::var_os("OUT_DIR").ok_or(io::Error::other("OUT_DIR not set"))?);
    fs::write(out.join("memory.x"), include_bytes!("memory.x"))?;

    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
