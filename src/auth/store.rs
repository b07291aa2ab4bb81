//! On-disk token cache
//!
//! The credential is written as CBOR to `auth-token.bin` inside a
//! per-(vendor, application) directory. Lookups walk a fixed list of
//! directories and take the first one holding the file; fresh saves go to
//! the user cache directory.

use crate::auth::identity::AppIdentity;
use crate::auth::token::Credential;
use crate::utils::errors::{AuthError, AuthResult};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const TOKEN_FILE_NAME: &str = "auth-token.bin";

/// Where the token file may live, in lookup priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    search_dirs: Vec<PathBuf>,
    cache_dir: PathBuf,
}

impl CacheLocation {
    /// Current directory, user config, user cache, then system-wide
    /// locations. The user cache directory receives new files.
    pub fn for_identity(identity: &AppIdentity) -> AuthResult<Self> {
        let cache_root = dirs::cache_dir().ok_or_else(|| {
            AuthError::Config("unable to determine the user cache directory".to_string())
        })?;
        let cache_dir = cache_root.join(&identity.vendor).join(&identity.app_name);

        let mut search_dirs = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            search_dirs.push(cwd);
        }
        if let Some(config) = dirs::config_dir() {
            search_dirs.push(config.join(&identity.vendor).join(&identity.app_name));
        }
        search_dirs.push(cache_dir.clone());
        for system in system_config_dirs() {
            search_dirs.push(system.join(&identity.vendor).join(&identity.app_name));
        }

        Ok(Self {
            search_dirs,
            cache_dir,
        })
    }

    pub fn with_dirs(search_dirs: Vec<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dirs,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Directories probed by [`CacheLocation::find`], in order. The cache
    /// directory is appended unless the search list already holds it.
    pub fn candidates(&self) -> impl Iterator<Item = &Path> {
        let fallback = (!self.search_dirs.contains(&self.cache_dir)).then_some(&self.cache_dir);
        self.search_dirs
            .iter()
            .chain(fallback)
            .map(PathBuf::as_path)
    }

    /// First directory containing `file_name`.
    pub fn find(&self, file_name: &str) -> Option<PathBuf> {
        self.candidates()
            .map(|dir| dir.join(file_name))
            .find(|path| path.is_file())
    }

    pub fn default_path(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }
}

#[cfg(target_os = "macos")]
fn system_config_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("/Library/Application Support")]
}

#[cfg(windows)]
fn system_config_dirs() -> Vec<PathBuf> {
    std::env::var_os("PROGRAMDATA")
        .map(PathBuf::from)
        .into_iter()
        .collect()
}

#[cfg(all(unix, not(target_os = "macos")))]
fn system_config_dirs() -> Vec<PathBuf> {
    match std::env::var("XDG_CONFIG_DIRS") {
        Ok(dirs) if !dirs.is_empty() => std::env::split_paths(&dirs).collect(),
        _ => vec![PathBuf::from("/etc/xdg")],
    }
}

#[cfg(not(any(unix, windows)))]
fn system_config_dirs() -> Vec<PathBuf> {
    Vec::new()
}

/// Loads, saves and removes the cached credential.
#[derive(Debug)]
pub struct TokenStore {
    location: CacheLocation,
    known_path: Mutex<Option<PathBuf>>,
}

impl TokenStore {
    pub fn new(location: CacheLocation) -> Self {
        Self {
            location,
            known_path: Mutex::new(None),
        }
    }

    pub fn location(&self) -> &CacheLocation {
        &self.location
    }

    /// Path of an existing token file, if any.
    pub fn resolve(&self) -> Option<PathBuf> {
        self.location.find(TOKEN_FILE_NAME)
    }

    /// Where the credential is, or would be, stored.
    pub fn token_path(&self) -> PathBuf {
        if let Some(path) = self.known_path.lock().clone() {
            return path;
        }
        self.resolve()
            .unwrap_or_else(|| self.location.default_path(TOKEN_FILE_NAME))
    }

    pub fn load(&self) -> AuthResult<Credential> {
        let path = self
            .resolve()
            .ok_or_else(|| AuthError::TokenNotFound(TOKEN_FILE_NAME.to_string()))?;
        let credential = Self::load_from(&path)?;
        *self.known_path.lock() = Some(path);
        Ok(credential)
    }

    /// Decodes the token file at `path`. An existing but undecodable file is
    /// reported as [`AuthError::TokenDecode`].
    pub fn load_from(path: &Path) -> AuthResult<Credential> {
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => AuthError::TokenNotFound(path.display().to_string()),
            _ => AuthError::TokenDecode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let credential: Credential =
            ciborium::from_reader(BufReader::new(file)).map_err(|e| AuthError::TokenDecode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        debug!("Loaded cached token from {}", path.display());
        Ok(credential)
    }

    /// Writes the credential, replacing any previous content, and returns
    /// the file it went to.
    pub fn save(&self, credential: &Credential) -> AuthResult<PathBuf> {
        let known = self.known_path.lock().clone();
        let path = match known.or_else(|| self.resolve()) {
            Some(path) => path,
            None => {
                create_private_dir(self.location.cache_dir()).map_err(|source| {
                    AuthError::Persistence {
                        path: self.location.cache_dir().to_path_buf(),
                        source,
                    }
                })?;
                self.location.default_path(TOKEN_FILE_NAME)
            }
        };

        info!("Saving token file to: {}", path.display());
        write_private_file(&path, credential).map_err(|source| AuthError::Persistence {
            path: path.clone(),
            source,
        })?;

        *self.known_path.lock() = Some(path.clone());
        Ok(path)
    }

    /// Deletes the token file. A missing file is not an error.
    pub fn remove(&self) -> AuthResult<()> {
        let known = self.known_path.lock().take();
        let Some(path) = known.or_else(|| self.resolve()) else {
            debug!("No cached token to remove");
            return Ok(());
        };

        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed cached token {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Io(e)),
        }
    }
}

fn create_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

fn write_private_file(path: &Path, credential: &Credential) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(path)?;

    // The mode above only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    let mut writer = BufWriter::new(file);
    ciborium::into_writer(credential, &mut writer).map_err(|e| match e {
        ciborium::ser::Error::Io(e) => e,
        ciborium::ser::Error::Value(msg) => io::Error::new(io::ErrorKind::InvalidData, msg),
    })?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn credential() -> Credential {
        Credential::new("ya29.access")
            .with_refresh_token("1//refresh")
            .with_expiry(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap())
    }

    fn store_in(temp: &TempDir) -> TokenStore {
        let cache = temp.path().join("cache").join("vendor").join("app");
        TokenStore::new(CacheLocation::with_dirs(
            vec![temp.path().join("local"), temp.path().join("config")],
            cache,
        ))
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let path = store.save(&credential()).unwrap();
        assert_eq!(path, temp.path().join("cache/vendor/app").join(TOKEN_FILE_NAME));

        let loaded = TokenStore::load_from(&path).unwrap();
        assert_eq!(loaded, credential());
        assert_eq!(store.load().unwrap(), credential());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_uses_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let path = store.save(&credential()).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let local = temp.path().join("local");
        fs::create_dir_all(&local).unwrap();
        let existing = local.join(TOKEN_FILE_NAME);
        fs::write(&existing, vec![0u8; 4096]).unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o644)).unwrap();

        let store = store_in(&temp);
        let path = store.save(&credential()).unwrap();
        assert_eq!(path, existing);
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
        // truncated, not appended to
        assert_eq!(TokenStore::load_from(&path).unwrap(), credential());
    }

    #[test]
    fn test_first_matching_directory_wins() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        let config = temp.path().join("config");
        fs::create_dir_all(&config).unwrap();
        let other = Credential::new("from-config");
        let config_store = TokenStore::new(CacheLocation::with_dirs(vec![], &config));
        config_store.save(&other).unwrap();

        store.save(&credential()).unwrap();
        // the config copy was found first and overwritten
        assert_eq!(store.resolve(), Some(config.join(TOKEN_FILE_NAME)));
        assert_eq!(store.load().unwrap(), credential());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);
        let err = store.load().unwrap_err();
        assert!(matches!(err, AuthError::TokenNotFound(_)));
        assert!(err.is_cache_miss());
        assert_eq!(
            store.token_path(),
            temp.path().join("cache/vendor/app").join(TOKEN_FILE_NAME)
        );
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("local");
        fs::create_dir_all(&local).unwrap();
        fs::write(local.join(TOKEN_FILE_NAME), b"\xff\x00garbage").unwrap();

        let err = store_in(&temp).load().unwrap_err();
        assert!(matches!(err, AuthError::TokenDecode { .. }));
        assert!(err.is_cache_miss());
    }

    #[test]
    fn test_remove() {
        let temp = TempDir::new().unwrap();
        let store = store_in(&temp);

        store.remove().unwrap();

        let path = store.save(&credential()).unwrap();
        store.remove().unwrap();
        assert!(!path.exists());
        assert!(matches!(store.load(), Err(AuthError::TokenNotFound(_))));

        store.remove().unwrap();
    }

    #[test]
    fn test_save_fails_when_directory_cannot_be_created() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"file").unwrap();

        let store = TokenStore::new(CacheLocation::with_dirs(vec![], blocker.join("app")));
        let err = store.save(&credential()).unwrap_err();
        assert!(matches!(err, AuthError::Persistence { .. }));
        assert!(err.to_string().contains("writable"));
    }

    #[test]
    fn test_identity_location_ends_with_vendor_and_app() {
        let identity = AppIdentity::resolve(Some("acme"), Some("sheets"), "id");
        if let Ok(location) = CacheLocation::for_identity(&identity) {
            assert!(location.cache_dir().ends_with("acme/sheets"));
            assert!(location.search_dirs().contains(&location.cache_dir().to_path_buf()));
            assert_eq!(location.candidates().count(), location.search_dirs().len());
        }
    }

    #[test]
    fn test_cache_dir_probed_once() {
        let location = CacheLocation::with_dirs(
            vec![PathBuf::from("/a"), PathBuf::from("/cache"), PathBuf::from("/b")],
            "/cache",
        );
        let probed: Vec<&Path> = location.candidates().collect();
        assert_eq!(
            probed,
            vec![Path::new("/a"), Path::new("/cache"), Path::new("/b")]
        );

        let location = CacheLocation::with_dirs(vec![PathBuf::from("/a")], "/cache");
        let probed: Vec<&Path> = location.candidates().collect();
        assert_eq!(probed, vec![Path::new("/a"), Path::new("/cache")]);
    }
}
