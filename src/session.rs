use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::client::{ClientError, ClientResult};
use crate::model::{AuthenticatedProfile, Profile, Venue};

pub const TOKEN_KEY: &str = "token";
pub const PROFILE_KEY: &str = "profile";

/// Key → JSON value store backed by one file per key in a directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Missing keys read as `None`. So does content that no longer parses.
    pub fn read<T: DeserializeOwned>(&self, key: &str) -> io::Result<Option<T>> {
        let bytes = match std::fs::read(self.path(key)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("ignoring malformed session entry {key}: {e}");
                Ok(None)
            }
        }
    }

    pub fn write<T: Serialize>(&self, key: &str, value: &T) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec(value).map_err(io::Error::other)?;
        // Write-then-rename so a crash never leaves a half-written entry.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, self.path(key))
    }

    pub fn remove(&self, key: &str) -> io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Who is logged in. Passed explicitly to every authenticated call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    profile: Option<Profile>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(token: impl Into<String>, profile: Profile) -> Self {
        Self {
            token: Some(token.into()),
            profile: Some(profile),
        }
    }

    pub fn from_login(auth: AuthenticatedProfile) -> Self {
        Self::new(auth.access_token, auth.profile)
    }

    pub fn load(store: &SessionStore) -> io::Result<Self> {
        Ok(Self {
            token: store.read(TOKEN_KEY)?,
            profile: store.read(PROFILE_KEY)?,
        })
    }

    pub fn save(&self, store: &SessionStore) -> io::Result<()> {
        match &self.token {
            Some(token) => store.write(TOKEN_KEY, token)?,
            None => store.remove(TOKEN_KEY)?,
        }
        match &self.profile {
            Some(profile) => store.write(PROFILE_KEY, profile)?,
            None => store.remove(PROFILE_KEY)?,
        }
        Ok(())
    }

    /// Log out: drop both entries from the store and forget them here.
    pub fn clear(&mut self, store: &SessionStore) -> io::Result<()> {
        store.remove(TOKEN_KEY)?;
        store.remove(PROFILE_KEY)?;
        self.token = None;
        self.profile = None;
        Ok(())
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Token for an `Authorization: Bearer` header.
    pub fn bearer(&self) -> ClientResult<&str> {
        self.token().ok_or(ClientError::MissingToken)
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    pub fn set_profile(&mut self, profile: Profile) {
        self.profile = Some(profile);
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_venue_manager(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.venue_manager)
    }

    /// True when the logged-in profile owns `venue`.
    pub fn owns(&self, venue: &Venue) -> bool {
        match (&self.profile, &venue.owner) {
            (Some(me), Some(owner)) => me.name == owner.name,
            _ => false,
        }
    }
}
