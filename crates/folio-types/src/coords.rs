use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Where a project's documents live on the hosting platform.
///
/// Resolved once per request from project metadata and never mutated
/// afterwards. `owner` is the organization when the repository belongs to
/// one, otherwise the owning user's account name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Pick the organization when present, otherwise the user account.
    pub fn for_owner(user: &str, org: Option<&str>, repo: impl Into<String>) -> Self {
        let owner = match org {
            Some(org) if !org.is_empty() => org,
            _ => user,
        };
        Self::new(owner, repo)
    }

    /// `owner/repo` form used in API paths.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// The account flavor backing a project.
///
/// `Github` projects live in a repository owned by the user (or their
/// organization) and are accessed with the caller's own credential.
/// `Google` projects were created by users signing in without a hosting
/// account; their content lives in a repository accessed with the project
/// owner's credential.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    #[default]
    Github,
    Google,
}

impl AccountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" | "" => Ok(Self::Github),
            "google" => Ok(Self::Google),
            other => Err(TypeError::UnknownAccountKind(other.to_string())),
        }
    }
}
