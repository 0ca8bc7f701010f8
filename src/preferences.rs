//! Small user preferences kept in device storage.
//!
//! Values are plain strings. Reads fall back to defaults; writes that fail
//! are logged and otherwise ignored.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::store::{keys, DraftStore};

/// Light/dark appearance preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorScheme {
    Light,
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

impl ColorScheme {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"') {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" | "auto" => Ok(Self::System),
            other => Err(format!("unknown color scheme {other:?}")),
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of the app the device is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Customer,
    Staff,
}

impl Role {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Staff => "staff",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_matches('"') {
            "customer" => Ok(Self::Customer),
            "staff" | "admin" => Ok(Self::Staff),
            other => Err(format!("unknown role {other:?}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to stored preferences.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn DraftStore>,
}

impl Preferences {
    /// Wrap a store.
    pub fn new(store: Arc<dyn DraftStore>) -> Self {
        Self { store }
    }

    /// Username remembered on the sign-in screen.
    pub async fn saved_username(&self) -> Option<String> {
        self.read(keys::SAVED_USERNAME).await
    }

    /// Remember (or, with `None`, forget) the sign-in username.
    pub async fn set_saved_username(&self, username: Option<&str>) {
        match username {
            Some(name) => self.write(keys::SAVED_USERNAME, name).await,
            None => self.forget(keys::SAVED_USERNAME).await,
        }
    }

    /// Stored color scheme, or the default.
    pub async fn color_scheme(&self) -> ColorScheme {
        self.parsed(keys::USER_COLOR_SCHEME).await
    }

    /// Store the color scheme.
    pub async fn set_color_scheme(&self, scheme: ColorScheme) {
        self.write(keys::USER_COLOR_SCHEME, scheme.as_str()).await;
    }

    /// Stored role, or the default.
    pub async fn selected_role(&self) -> Role {
        self.parsed(keys::SELECTED_ROLE).await
    }

    /// Store the role.
    pub async fn set_selected_role(&self, role: Role) {
        self.write(keys::SELECTED_ROLE, role.as_str()).await;
    }

    async fn parsed<T: FromStr<Err = String> + Default>(&self, key: &str) -> T {
        match self.read(key).await.map(|raw| raw.parse::<T>()) {
            Some(Ok(value)) => value,
            Some(Err(e)) => {
                tracing::debug!(key, error = %e, "ignoring unrecognized preference");
                T::default()
            }
            None => T::default(),
        }
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read preference");
                None
            }
        }
    }

    async fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value.to_string()).await {
            tracing::warn!(key, error = %e, "failed to store preference");
        }
    }

    async fn forget(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            tracing::warn!(key, error = %e, "failed to remove preference");
        }
    }
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}
