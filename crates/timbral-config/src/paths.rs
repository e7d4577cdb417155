//! Platform-specific paths for analysis profiles.
//!
//! # Directory Structure
//!
//! - **User profiles**: `~/.config/timbral/profiles/` (Linux), `~/Library/Application Support/timbral/profiles/` (macOS), `%APPDATA%\timbral\profiles\` (Windows)
//! - **System profiles**: `/usr/share/timbral/profiles/` (Linux), `/Library/Application Support/timbral/profiles/` (macOS)
//!
//! # Example
//!
//! ```rust,no_run
//! use timbral_config::paths;
//!
//! if let Some(path) = paths::find_profile("speech_16k") {
//!     println!("Found profile at: {:?}", path);
//! }
//! ```

use std::path::{Path, PathBuf};

use crate::ConfigError;

/// Application name used for directory paths.
const APP_NAME: &str = "timbral";

/// Subdirectory name for profiles.
const PROFILES_SUBDIR: &str = "profiles";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the user-specific profiles directory.
pub fn user_profiles_dir() -> PathBuf {
    user_config_dir().join(PROFILES_SUBDIR)
}

/// Returns the system-wide profiles directory.
pub fn system_profiles_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        PathBuf::from("/usr/share").join(APP_NAME).join(PROFILES_SUBDIR)
    }
    #[cfg(target_os = "macos")]
    {
        PathBuf::from("/Library/Application Support")
            .join(APP_NAME)
            .join(PROFILES_SUBDIR)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join(PROFILES_SUBDIR)
    }
}

/// Find a profile file by path or name.
///
/// Searches in order: the name as a path, the user profiles directory, the
/// system profiles directory. A `.toml` extension is added when missing.
pub fn find_profile(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let filename = if name.ends_with(".toml") {
        name.to_string()
    } else {
        format!("{name}.toml")
    };

    [user_profiles_dir(), system_profiles_dir()]
        .into_iter()
        .map(|dir| dir.join(&filename))
        .find(|candidate| candidate.is_file())
}

/// Ensure the user profiles directory exists.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_profiles_dir() -> Result<PathBuf, ConfigError> {
    let dir = user_profiles_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::create_dir(&dir, e))?;
    }
    Ok(dir)
}

/// List profile files in the user profiles directory.
pub fn list_user_profiles() -> Vec<PathBuf> {
    list_profiles_in_dir(&user_profiles_dir())
}

/// List profile files in the system profiles directory.
pub fn list_system_profiles() -> Vec<PathBuf> {
    list_profiles_in_dir(&system_profiles_dir())
}

/// List `.toml` files in `dir`, sorted. Missing or unreadable directories
/// give an empty list.
pub fn list_profiles_in_dir(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut profiles: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    profiles.sort();
    profiles
}

/// Profile name from a file path (the file stem).
///
/// ```rust
/// use timbral_config::paths::profile_name_from_path;
/// use std::path::Path;
///
/// let name = profile_name_from_path(Path::new("/path/to/speech_16k.toml"));
/// assert_eq!(name, Some("speech_16k".to_string()));
/// ```
pub fn profile_name_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dirs_contain_app_name() {
        assert!(user_config_dir().to_string_lossy().contains("timbral"));
        assert!(user_profiles_dir().ends_with("timbral/profiles"));
        assert!(system_profiles_dir().to_string_lossy().contains("timbral"));
    }

    #[test]
    fn test_find_profile_by_path() {
        let temp_dir = TempDir::new().unwrap();
        let profile_path = temp_dir.path().join("voice.toml");
        fs::write(&profile_path, "name = \"voice\"").unwrap();

        let found = find_profile(profile_path.to_str().unwrap());
        assert_eq!(found, Some(profile_path));
    }

    #[test]
    fn test_find_profile_not_found() {
        assert!(find_profile("nonexistent_profile_12345").is_none());
    }

    #[test]
    fn test_list_profiles_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.toml"), "").unwrap();
        fs::write(temp_dir.path().join("a.toml"), "").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(temp_dir.path().join("dir.toml")).unwrap();

        let profiles = list_profiles_in_dir(temp_dir.path());
        let names: Vec<_> = profiles
            .iter()
            .filter_map(|p| profile_name_from_path(p))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_list_profiles_nonexistent_dir() {
        assert!(list_profiles_in_dir(Path::new("/nonexistent/path/12345")).is_empty());
    }

    #[test]
    fn test_profile_name_from_path() {
        assert_eq!(
            profile_name_from_path(Path::new("simple.toml")),
            Some("simple".to_string())
        );
        assert_eq!(profile_name_from_path(Path::new("/")), None);
    }
}
