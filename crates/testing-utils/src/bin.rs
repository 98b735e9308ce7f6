use crate::fixtures::AfFixture;
use assert_cmd::prelude::*;
use command_extra::CommandExtra;
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::{tempdir, TempDir};
use text_block_macros::text_block_fnl;

const DEFAULT_CONFIG: &str = text_block_fnl! {
    "store-dir=../podvend-store"
    "spec-repo=../specs"
    "deployment-target=5.0"
};

fn create_default_config(workspace: &Path) {
    fs::write(workspace.join(".podvendrc"), DEFAULT_CONFIG).expect("write to .podvendrc");
}

/// A `podvend` command running in an empty workspace under a temporary root.
pub fn podvend_with_temp_cwd(create_config: bool) -> (Command, TempDir, PathBuf) {
    let root = tempdir().expect("create temporary directory");
    let workspace = root.path().join("workspace");
    fs::create_dir(&workspace).expect("create temporary workspace for podvend");
    if create_config {
        create_default_config(&workspace)
    }
    let command = Command::cargo_bin("podvend")
        .expect("find the podvend binary")
        .with_current_dir(&workspace);
    (command, root, workspace)
}

/// Like [`podvend_with_temp_cwd`] with a config, the AFNetworking spec repository next to the
/// workspace, and its `Podfile.json` inside.
pub fn podvend_with_af_fixture() -> (Command, TempDir, PathBuf) {
    let (command, root, workspace) = podvend_with_temp_cwd(true);
    AfFixture::write(root.path());
    AfFixture::write_podfile(&workspace);
    (command, root, workspace)
}
