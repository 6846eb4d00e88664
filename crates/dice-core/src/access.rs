//! Who may draw on, and save, which canvas.

use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(pub i64);

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The current viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<UserId>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(id: UserId) -> Self {
        Self { user_id: Some(id) }
    }
}

/// The school an actor belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub school_id: SchoolId,
}

impl Membership {
    pub fn of(school_id: SchoolId) -> Self {
        Self { school_id }
    }
}

/// True iff the actor is a member of the canvas's school.
pub fn can_write(membership: Option<&Membership>, canvas_school: SchoolId) -> bool {
    membership.is_some_and(|m| m.school_id == canvas_school)
}

/// Write policy of a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAccess {
    /// Anyone may draw (the public wall).
    Public,
    /// Only members of the school may draw and save.
    Members(SchoolId),
}

impl WriteAccess {
    /// Evaluate against the membership currently held by the caller.
    pub fn grants(&self, membership: Option<&Membership>) -> bool {
        match *self {
            WriteAccess::Public => true,
            WriteAccess::Members(school) => can_write(membership, school),
        }
    }
}

/// Failure of an identity or membership lookup.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Identity lookup failed: {0}")]
    Identity(String),
    #[error("Membership lookup failed: {0}")]
    Membership(String),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Source of the authenticated actor.
#[cfg(not(target_arch = "wasm32"))]
pub trait IdentityProvider: Send + Sync {
    fn current_actor(&self) -> BoxFuture<'_, AccessResult<Actor>>;
}

/// Lookup of a user's school.
#[cfg(not(target_arch = "wasm32"))]
pub trait MembershipDirectory: Send + Sync {
    fn membership(&self, user: UserId) -> BoxFuture<'_, AccessResult<Option<Membership>>>;
}

/// Source of the authenticated actor (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait IdentityProvider {
    fn current_actor(&self) -> BoxFuture<'_, AccessResult<Actor>>;
}

/// Lookup of a user's school (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait MembershipDirectory {
    fn membership(&self, user: UserId) -> BoxFuture<'_, AccessResult<Option<Membership>>>;
}

/// Resolve the current actor's membership once for a page view.
///
/// Failed lookups are treated as "no membership": the canvas stays viewable
/// and simply refuses writes.
pub async fn resolve_membership<I, D>(identity: &I, directory: &D) -> Option<Membership>
where
    I: IdentityProvider + ?Sized,
    D: MembershipDirectory + ?Sized,
{
    let actor = match identity.current_actor().await {
        Ok(actor) => actor,
        Err(e) => {
            log::warn!("{}; continuing as anonymous", e);
            return None;
        }
    };

    let user = actor.user_id?;
    match directory.membership(user).await {
        Ok(membership) => membership,
        Err(e) => {
            log::warn!("{}; continuing without membership", e);
            None
        }
    }
}

/// Identity fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    actor: Actor,
}

impl StaticIdentity {
    pub fn new(actor: Actor) -> Self {
        Self { actor }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> BoxFuture<'_, AccessResult<Actor>> {
        let actor = self.actor;
        Box::pin(async move { Ok(actor) })
    }
}

/// In-memory user → school directory.
#[derive(Default)]
pub struct MemoryDirectory {
    schools: RwLock<HashMap<UserId, SchoolId>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the school of `user`.
    pub fn enroll(&self, user: UserId, school: SchoolId) -> AccessResult<()> {
        let mut schools = self
            .schools
            .write()
            .map_err(|e| AccessError::Membership(format!("Lock error: {}", e)))?;
        schools.insert(user, school);
        Ok(())
    }
}

impl MembershipDirectory for MemoryDirectory {
    fn membership(&self, user: UserId) -> BoxFuture<'_, AccessResult<Option<Membership>>> {
        Box::pin(async move {
            let schools = self
                .schools
                .read()
                .map_err(|e| AccessError::Membership(format!("Lock error: {}", e)))?;
            Ok(schools.get(&user).copied().map(Membership::of))
        })
    }
}
