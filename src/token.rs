/*
API token persistence. The token lives in a small JSON file under the user's
home directory and is asked for once, before any domain is checked.
*/
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::CheckError;

const CONFIG_DIR: &str = ".indiwtf";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenConfig {
    #[serde(default)]
    pub token: String,
}

pub trait TokenStore {
    /// Never fails: a missing or unreadable file is an empty config.
    fn load(&self) -> TokenConfig;
    fn save(&self, config: &TokenConfig) -> Result<(), CheckError>;
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<home>/.indiwtf/config.json`, with home taken from `HOME` or `USERPROFILE`.
    pub fn default_path() -> Option<PathBuf> {
        ["HOME", "USERPROFILE"]
            .into_iter()
            .filter_map(std::env::var_os)
            .find(|home| !home.is_empty())
            .map(|home| config_path_in(Path::new(&home)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> TokenConfig {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "no token config");
                return TokenConfig::default();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), %err, "ignoring unreadable token config");
            TokenConfig::default()
        })
    }

    fn save(&self, config: &TokenConfig) -> Result<(), CheckError> {
        let io_err = |source| CheckError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string(config)?;
        fs::write(&self.path, json).map_err(io_err)?;
        info!(path = %self.path.display(), "saved API token");
        Ok(())
    }
}

pub fn config_path_in(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Picks the API token: an explicit value first, then the store, then the
/// user via `prompt`/`input`. A token typed in is saved; a failed save is
/// only logged. An empty answer yields `None`.
pub fn acquire_token<S, R, W>(
    explicit: Option<String>,
    store: &S,
    mut input: R,
    mut prompt: W,
) -> Result<Option<String>, CheckError>
where
    S: TokenStore + ?Sized,
    R: BufRead,
    W: Write,
{
    if let Some(token) = explicit.filter(|t| !t.trim().is_empty()) {
        return Ok(Some(token.trim().to_string()));
    }

    let stored = store.load();
    if !stored.token.trim().is_empty() {
        return Ok(Some(stored.token.trim().to_string()));
    }

    let stdio_err = |source| CheckError::Io {
        path: PathBuf::from("<stdin>"),
        source,
    };
    write!(prompt, "Enter your API token: ").map_err(stdio_err)?;
    prompt.flush().map_err(stdio_err)?;
    let mut line = String::new();
    input.read_line(&mut line).map_err(stdio_err)?;

    let token = line.trim().to_string();
    if token.is_empty() {
        warn!("no API token entered, querying anonymously");
        return Ok(None);
    }

    let config = TokenConfig {
        token: token.clone(),
    };
    if let Err(err) = store.save(&config) {
        warn!(%err, "could not persist API token");
    }
    Ok(Some(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io::Cursor;

    #[derive(Default)]
    struct MemoryStore {
        config: RefCell<TokenConfig>,
        saves: RefCell<usize>,
        fail: bool,
    }

    impl TokenStore for MemoryStore {
        fn load(&self) -> TokenConfig {
            self.config.borrow().clone()
        }

        fn save(&self, config: &TokenConfig) -> Result<(), CheckError> {
            *self.saves.borrow_mut() += 1;
            if self.fail {
                return Err(CheckError::Io {
                    path: PathBuf::from("/readonly/config.json"),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            *self.config.borrow_mut() = config.clone();
            Ok(())
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(config_path_in(dir.path()));
        let config = TokenConfig {
            token: "abc123".to_string(),
        };

        store.save(&config).expect("save should create the directory");
        assert!(dir.path().join(".indiwtf").is_dir());
        assert_eq!(store.load(), config);

        let raw = fs::read_to_string(store.path()).expect("read config");
        assert_eq!(raw, r#"{"token":"abc123"}"#);
    }

    #[test]
    fn load_missing_or_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("nope").join("config.json"));
        assert_eq!(store.load(), TokenConfig::default());

        let corrupt = dir.path().join("config.json");
        fs::write(&corrupt, "{not json").expect("write");
        assert_eq!(FileTokenStore::new(&corrupt).load(), TokenConfig::default());
    }

    #[test]
    fn save_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join(".indiwtf");
        fs::write(&blocker, "").expect("write");
        let store = FileTokenStore::new(config_path_in(dir.path()));

        let err = store
            .save(&TokenConfig {
                token: "t".to_string(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }

    #[test]
    fn config_path_lives_under_home() {
        assert_eq!(
            config_path_in(Path::new("/home/budi")),
            PathBuf::from("/home/budi/.indiwtf/config.json")
        );
    }

    #[test]
    fn explicit_token_wins_without_prompting() {
        let store = MemoryStore::default();
        let mut prompt: Vec<u8> = Vec::new();
        let token = acquire_token(Some("flag".into()), &store, Cursor::new(""), &mut prompt).unwrap();
        assert_eq!(token.as_deref(), Some("flag"));
        assert!(prompt.is_empty());
        assert_eq!(*store.saves.borrow(), 0);
    }

    #[test]
    fn stored_token_is_reused() {
        let store = MemoryStore::default();
        store.config.borrow_mut().token = "saved".to_string();
        let mut prompt: Vec<u8> = Vec::new();
        let token = acquire_token(None, &store, Cursor::new("typed\n"), &mut prompt).unwrap();
        assert_eq!(token.as_deref(), Some("saved"));
        assert!(prompt.is_empty());
    }

    #[test]
    fn prompted_token_is_persisted() {
        let store = MemoryStore::default();
        let mut prompt: Vec<u8> = Vec::new();
        let token = acquire_token(None, &store, Cursor::new("  typed \n"), &mut prompt).unwrap();
        assert_eq!(token.as_deref(), Some("typed"));
        assert_eq!(String::from_utf8(prompt).unwrap(), "Enter your API token: ");
        assert_eq!(store.load().token, "typed");
    }

    #[test]
    fn failed_save_still_returns_token() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let token = acquire_token(None, &store, Cursor::new("typed\n"), Vec::<u8>::new()).unwrap();
        assert_eq!(token.as_deref(), Some("typed"));
        assert_eq!(*store.saves.borrow(), 1);
    }

    #[test]
    fn empty_answer_means_anonymous() {
        let store = MemoryStore::default();
        let token = acquire_token(None, &store, Cursor::new("\n"), Vec::<u8>::new()).unwrap();
        assert_eq!(token, None);
        assert_eq!(*store.saves.borrow(), 0);
    }
}
