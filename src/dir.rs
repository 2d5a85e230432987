//! Default location of [`FileIO`](crate::backend::FileIO) slots.

use std::{
    path::PathBuf,
    sync::LazyLock,
};

use platform_dirs::AppDirs;

include!(concat!(env!("OUT_DIR"), "/workspace.rs"));

/// Directory used by [`FileIO::default`](crate::backend::FileIO) for slot files.
///
/// It is the `saves` folder inside the per-user data directory of [`WORKSPACE`], the folder name
/// of the workspace this crate was built in. On platforms without a data directory the path is
/// relative, so slots land in `./saves`.
///
/// | Windows                                             | Linux/*BSD                       | MacOS                                           |
/// |-----------------------------------------------------|----------------------------------|-------------------------------------------------|
/// | `C:\Users\%USERNAME%\AppData\Local\WORKSPACE\saves` | `~/.local/share/WORKSPACE/saves` | `~/Library/Application Support/WORKSPACE/saves` |
pub static SAVE_DIR: LazyLock<PathBuf> =
    LazyLock::new(|| save_dir(AppDirs::new(Some(WORKSPACE), true)));

fn save_dir(dirs: Option<AppDirs>) -> PathBuf {
    dirs.map(|dirs| dirs.data_dir)
        .unwrap_or_default()
        .join("saves")
}
