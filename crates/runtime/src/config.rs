use std::path::PathBuf;

pub const PROGRAM_NAME: &str = "zsql";
pub const PROGRAM_LOG_LEVEL: &str = "ZSQL_LOG";
pub const DATA_DIR_NAME: &str = "zsql";
pub const DATABASE_FILE_NAME: &str = "zsql.db";

/// Resolves an XDG-style base directory: prefer `xdg_var`, otherwise fall
/// back to `$HOME` with `home_suffix` appended.
pub fn xdg_or_home(xdg_var: &str, home_suffix: &str) -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(xdg_var) {
        return Some(PathBuf::from(dir));
    }

    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(home_suffix.trim_start_matches('/')))
}

/// The directory holding the database, e.g. `$XDG_DATA_HOME/zsql` or
/// `$HOME/.local/share/zsql`. `None` if neither `XDG_DATA_HOME` nor `HOME`
/// is set.
pub fn data_dir() -> Option<PathBuf> {
    xdg_or_home("XDG_DATA_HOME", ".local/share").map(|base| base.join(DATA_DIR_NAME))
}

/// Full path to the database file within `data_dir()`.
pub fn default_database_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join(DATABASE_FILE_NAME))
}

/// Creates `dir` (and any missing parents) with mode `0700` on unix. A
/// no-op if the directory already exists.
#[cfg(unix)]
pub fn ensure_dir_mode_0700(dir: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if dir.is_dir() {
        return Ok(());
    }

    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
pub fn ensure_dir_mode_0700(dir: &std::path::Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Restricts an already-created file to mode `0600` on unix. Used on the
/// database file itself, which would otherwise inherit the process umask
/// (typically world/group-readable).
#[cfg(unix)]
pub fn ensure_file_mode_0600(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
pub fn ensure_file_mode_0600(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn xdg_or_home_prefers_the_xdg_var_when_set() {
        unsafe { std::env::set_var("XDG_DATA_HOME", "/xdg/data") };
        unsafe { std::env::set_var("HOME", "/home/u") };

        assert_eq!(
            xdg_or_home("XDG_DATA_HOME", ".local/share"),
            Some(PathBuf::from("/xdg/data"))
        );

        unsafe { std::env::remove_var("XDG_DATA_HOME") };
        unsafe { std::env::remove_var("HOME") };
    }

    #[test]
    #[serial]
    fn xdg_or_home_falls_back_to_home_with_suffix() {
        unsafe { std::env::remove_var("XDG_DATA_HOME") };
        unsafe { std::env::set_var("HOME", "/home/u") };

        assert_eq!(
            xdg_or_home("XDG_DATA_HOME", ".local/share"),
            Some(PathBuf::from("/home/u/.local/share"))
        );

        unsafe { std::env::remove_var("HOME") };
    }

    #[test]
    #[serial]
    fn xdg_or_home_is_none_when_neither_var_is_set() {
        unsafe { std::env::remove_var("XDG_DATA_HOME") };
        unsafe { std::env::remove_var("HOME") };

        assert_eq!(xdg_or_home("XDG_DATA_HOME", ".local/share"), None);
    }

    #[test]
    #[serial]
    fn data_dir_appends_the_zsql_subdirectory() {
        unsafe { std::env::set_var("XDG_DATA_HOME", "/xdg/data") };
        unsafe { std::env::remove_var("HOME") };

        assert_eq!(data_dir(), Some(PathBuf::from("/xdg/data/zsql")));

        unsafe { std::env::remove_var("XDG_DATA_HOME") };
    }

    #[test]
    #[serial]
    fn default_database_path_appends_the_database_file_name() {
        unsafe { std::env::set_var("XDG_DATA_HOME", "/xdg/data") };
        unsafe { std::env::remove_var("HOME") };

        assert_eq!(
            default_database_path(),
            Some(PathBuf::from("/xdg/data/zsql/zsql.db"))
        );

        unsafe { std::env::remove_var("XDG_DATA_HOME") };
    }

    #[test]
    #[serial]
    fn default_database_path_is_none_without_xdg_or_home() {
        unsafe { std::env::remove_var("XDG_DATA_HOME") };
        unsafe { std::env::remove_var("HOME") };

        assert_eq!(default_database_path(), None);
    }
}
