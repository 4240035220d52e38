//! JSON seed loader for the in-memory adapters.
//!
//! ```json
//! {
//!   "users": [{ "id": "…", "username": "alice", "avatarUrl": "https://…", "password": "…" }],
//!   "groups": [{ "id": "…", "name": "General", "slug": "g1", "creatorId": "…", "memberIds": [] }]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::domain::{
    Group, GroupId, GroupSlug, GroupValidationError, UserId, UserProfile, UserValidationError,
    Username,
};

use super::group_store::{GroupStoreError, InMemoryGroupStore};
use super::user_directory::{InMemoryUserDirectory, UserDirectoryError};

/// Errors raised while loading seed data.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("seed file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid seed user `{username}`: {source}")]
    User {
        username: String,
        #[source]
        source: UserValidationError,
    },
    #[error("invalid seed group `{slug}`: {source}")]
    Group {
        slug: String,
        #[source]
        source: GroupValidationError,
    },
    #[error("seed group `{slug}` references unknown user {user_id}")]
    UnknownUser { slug: String, user_id: String },
    #[error(transparent)]
    Directory(#[from] UserDirectoryError),
    #[error(transparent)]
    Groups(#[from] GroupStoreError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SeedUser {
    id: String,
    username: String,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SeedGroup {
    id: String,
    name: String,
    slug: String,
    creator_id: String,
    #[serde(default)]
    member_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedDocument {
    #[serde(default)]
    users: Vec<SeedUser>,
    #[serde(default)]
    groups: Vec<SeedGroup>,
}

/// Populated stores built from a seed document.
pub struct Seed {
    pub users: Arc<InMemoryUserDirectory>,
    pub groups: Arc<InMemoryGroupStore>,
}

impl Seed {
    /// Read and apply the seed file at `path`.
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let seed = Self::from_json(&raw)?;
        info!(path = %path.display(), "seed data loaded");
        Ok(seed)
    }

    /// Parse and apply a seed document.
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        let document: SeedDocument = serde_json::from_str(raw)?;
        let users = Arc::new(InMemoryUserDirectory::new());
        let groups = Arc::new(InMemoryGroupStore::new());
        let mut known = Vec::with_capacity(document.users.len());

        for user in document.users {
            let profile = profile_from(&user)?;
            known.push(profile.id().clone());
            users.insert(profile, user.password)?;
        }
        for group in document.groups {
            groups.insert(group_from(group, &known)?)?;
        }
        Ok(Self { users, groups })
    }
}

fn profile_from(user: &SeedUser) -> Result<UserProfile, SeedError> {
    let invalid = |source| SeedError::User {
        username: user.username.clone(),
        source,
    };
    let id = UserId::new(&user.id).map_err(invalid)?;
    let username = Username::new(user.username.clone()).map_err(invalid)?;
    let profile = UserProfile::new(id, username);
    match &user.avatar_url {
        Some(avatar) => profile.with_avatar_url(avatar).map_err(invalid),
        None => Ok(profile),
    }
}

fn group_from(group: SeedGroup, known: &[UserId]) -> Result<Group, SeedError> {
    let SeedGroup {
        id,
        name,
        slug,
        creator_id,
        member_ids,
    } = group;
    let invalid = |source| SeedError::Group {
        slug: slug.clone(),
        source,
    };
    let id = GroupId::new(&id).map_err(invalid)?;
    let group_slug = GroupSlug::new(slug.clone()).map_err(invalid)?;
    let resolve = |raw: String| -> Result<UserId, SeedError> {
        UserId::new(&raw)
            .ok()
            .filter(|user| known.contains(user))
            .ok_or_else(|| SeedError::UnknownUser {
                slug: slug.clone(),
                user_id: raw,
            })
    };
    let creator = resolve(creator_id)?;
    let members = member_ids
        .into_iter()
        .map(resolve)
        .collect::<Result<Vec<_>, _>>()?;
    Group::new(id, name, group_slug, creator, members).map_err(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoginCredentials;
    use crate::domain::ports::{GroupRepository, LoginService, UserProfileQuery};
    use rstest::rstest;
    use std::io::Write;

    const ALICE: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
    const BOB: &str = "5b3c2c1e-8d6f-4a7b-9e0d-1f2a3b4c5d6e";
    const G1: &str = "9b2f61a4-7c1e-4a43-9d0b-58f5a8e5e0c1";

    fn document(groups: &str) -> String {
        format!(
            r#"{{
                "users": [
                    {{ "id": "{ALICE}", "username": "alice", "avatarUrl": "https://cdn.example/alice.png", "password": "wonderland" }},
                    {{ "id": "{BOB}", "username": "bob" }}
                ],
                "groups": {groups}
            }}"#
        )
    }

    #[rstest]
    #[tokio::test]
    async fn loads_users_and_groups() {
        let groups = format!(
            r#"[{{ "id": "{G1}", "name": "General", "slug": "g1", "creatorId": "{ALICE}", "memberIds": ["{BOB}"] }}]"#
        );
        let seed = Seed::from_json(&document(&groups)).expect("valid seed");

        let alice = UserId::new(ALICE).expect("id");
        let profile = seed.users.fetch_profile(&alice).await.expect("profile");
        assert_eq!(profile.avatar_url(), Some("https://cdn.example/alice.png"));

        let creds = LoginCredentials::try_from_parts("alice", "wonderland").expect("creds");
        assert_eq!(seed.users.authenticate(&creds).await.expect("login"), alice);

        let slug = GroupSlug::new("g1").expect("slug");
        let group = seed
            .groups
            .find_by_slug(&slug)
            .await
            .expect("lookup")
            .expect("g1 present");
        assert!(group.admits(&UserId::new(BOB).expect("id")));
    }

    #[rstest]
    fn rejects_groups_with_unknown_members() {
        let groups = format!(
            r#"[{{ "id": "{G1}", "name": "General", "slug": "g1", "creatorId": "{ALICE}", "memberIds": ["9a1c73d2-6f0e-4b8e-8a55-2f4d1a0e1f02"] }}]"#
        );
        let err = Seed::from_json(&document(&groups)).err().expect("rejected");
        assert!(matches!(err, SeedError::UnknownUser { .. }), "{err}");
    }

    #[rstest]
    #[case(r#"[{ "id": "not-a-uuid", "name": "General", "slug": "g1", "creatorId": "3fa85f64-5717-4562-b3fc-2c963f66afa6" }]"#)]
    #[case(r#"[{ "id": "9b2f61a4-7c1e-4a43-9d0b-58f5a8e5e0c1", "name": "General", "slug": "G 1", "creatorId": "3fa85f64-5717-4562-b3fc-2c963f66afa6" }]"#)]
    fn rejects_invalid_groups(#[case] groups: &str) {
        let err = Seed::from_json(&document(groups)).err().expect("rejected");
        assert!(matches!(err, SeedError::Group { .. }), "{err}");
    }

    #[rstest]
    fn rejects_unknown_fields() {
        let err = Seed::from_json(r#"{ "users": [], "channels": [] }"#)
            .err()
            .expect("rejected");
        assert!(matches!(err, SeedError::Parse(_)), "{err}");
    }

    #[rstest]
    fn reads_seed_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(document("[]").as_bytes()).expect("write seed");
        assert!(Seed::load(file.path()).is_ok());
    }

    #[rstest]
    fn reports_missing_seed_file() {
        let err = Seed::load(Path::new("/nonexistent/seed.json"))
            .err()
            .expect("rejected");
        assert!(matches!(err, SeedError::Read { .. }), "{err}");
    }
}
