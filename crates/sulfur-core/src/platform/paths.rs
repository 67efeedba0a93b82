use std::path::PathBuf;

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(unix)]
pub fn home_dir() -> Option<PathBuf> {
    env_path("HOME").or_else(|| {
        use nix::unistd::{Uid, User};
        User::from_uid(Uid::effective())
            .ok()
            .flatten()
            .map(|u| u.dir)
    })
}

#[cfg(windows)]
pub fn home_dir() -> Option<PathBuf> {
    env_path("USERPROFILE").or_else(|| {
        let home_drive = std::env::var_os("HOMEDRIVE")?;
        let home_path = std::env::var_os("HOMEPATH")?;
        let mut path = PathBuf::from(home_drive);
        path.push(home_path);
        Some(path)
    })
}

#[cfg(target_os = "macos")]
pub fn config_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join("Library").join("Application Support"))
}

#[cfg(windows)]
pub fn config_dir() -> Option<PathBuf> {
    env_path("APPDATA")
}

#[cfg(all(unix, not(target_os = "macos")))]
pub fn config_dir() -> Option<PathBuf> {
    env_path("XDG_CONFIG_HOME")
        .filter(|p| p.is_absolute())
        .or_else(|| home_dir().map(|h| h.join(".config")))
}

/// Root of Unity's per-user save data (`Application.persistentDataPath`
/// without the company/product suffix). Game saves live under
/// `<root>/<company>/<product>`.
#[cfg(windows)]
pub fn unity_data_dir() -> Option<PathBuf> {
    // LocalLow has no environment variable of its own; Unity derives it from
    // the user profile, and so do we.
    home_dir().map(|h| h.join("AppData").join("LocalLow"))
}

#[cfg(target_os = "macos")]
pub fn unity_data_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join("Library").join("Application Support"))
}

#[cfg(all(unix, not(target_os = "macos")))]
pub fn unity_data_dir() -> Option<PathBuf> {
    config_dir().map(|c| c.join("unity3d"))
}
