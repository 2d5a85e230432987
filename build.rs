#![allow(clippy::uninlined_format_args)]

use std::{
    env,
    fs,
    io,
    path::Path,
};

fn main() -> io::Result<()> {
    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;

    let workspace = Path::new(&out_dir)
        .ancestors()
        .find(|ancestor| ancestor.file_name().is_some_and(|name| name == "target"))
        .and_then(|target| target.parent())
        .and_then(|p| p.file_name())
        .and_then(|p| p.to_str())
        .map(|p| p.to_owned())
        .or_else(|| env::var("CARGO_PKG_NAME").ok())
        .unwrap_or_default();

    let dest = Path::new(&out_dir).join("workspace.rs");

    fs::write(
        dest,
        format!(
            "/// The name of the project's workspace.\npub const WORKSPACE: &str = {:?};",
            workspace
        ),
    )
}
