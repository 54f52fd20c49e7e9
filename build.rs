use std::env;
use std::path::PathBuf;

use anyhow::*;
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;

/// Copies the model/texture assets next to the build output so the relative
/// paths used by the loaders resolve when running from `target/`.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/*");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if assets_src.exists() {
        let out_dir = env::var("OUT_DIR")?;
        let mut copy_options = CopyOptions::new();
        copy_options.overwrite = true;
        copy_items(&["assets/"], out_dir, &copy_options)?;
    }

    Ok(())
}
