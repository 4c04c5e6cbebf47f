//! Default plugin search locations.

use camino::{Utf8Path, Utf8PathBuf};
use dirs::data_dir;

/// Directory, relative to the target directory, holding project-local plugins.
pub const PROJECT_PLUGIN_DIR: &str = ".courier/plugins";

/// Computes the plugin search path used when none is configured explicitly.
///
/// Project-local plugins come first so a workspace can shadow a plugin that is
/// also installed for the user.
#[must_use]
pub fn default_plugin_search_paths(target_directory: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut paths = vec![target_directory.join(PROJECT_PLUGIN_DIR)];
    if let Some(user_dir) = user_plugin_directory() {
        paths.push(user_dir);
    }
    paths
}

fn user_plugin_directory() -> Option<Utf8PathBuf> {
    data_dir()
        .and_then(|path| Utf8PathBuf::from_path_buf(path).ok())
        .map(|base| base.join("courier").join("plugins"))
}
