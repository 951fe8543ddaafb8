// Ownership annotation - the last transformation before a record is returned.

use serde::Serialize;

use crate::infrastructure::viewer::Principal;
use crate::models::{FollowEdge, Post, UserProfile};

/// Records that belong to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> &str;
}

impl Owned for Post {
    fn owner_id(&self) -> &str {
        &self.author_id
    }
}

impl Owned for FollowEdge {
    fn owner_id(&self) -> &str {
        &self.follower_id
    }
}

impl Owned for UserProfile {
    fn owner_id(&self) -> &str {
        &self.uid
    }
}

/// A record plus its relationship to the caller. Serializes as the record's
/// own fields with `isOwner` alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotated<T> {
    #[serde(flatten)]
    pub record: T,
    #[serde(rename = "isOwner")]
    pub is_owner: bool,
}

pub fn annotate<T: Owned>(record: T, principal: &Principal) -> Annotated<T> {
    let is_owner = record.owner_id() == principal.id;
    Annotated { record, is_owner }
}

pub fn annotate_all<T: Owned>(records: Vec<T>, principal: &Principal) -> Vec<Annotated<T>> {
    records
        .into_iter()
        .map(|record| annotate(record, principal))
        .collect()
}
