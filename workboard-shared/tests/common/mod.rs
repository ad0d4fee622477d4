//! Shared fixtures for the service-level integration tests

#![allow(dead_code)]

use chrono::Duration;
use workboard_shared::auth::jwt::JwtSettings;
use workboard_shared::models::membership::MembershipRole;
use workboard_shared::models::organization::Organization;
use workboard_shared::models::user::{CreateUser, User};
use workboard_shared::services::organizations;
use workboard_shared::store::{MemoryStore, Store};

pub fn jwt_settings() -> JwtSettings {
    JwtSettings::new(
        "test-access-secret-0123456789abcdef",
        "test-refresh-secret-0123456789abcdef",
        Duration::minutes(15),
        Duration::days(7),
    )
}

/// Inserts a user directly, skipping password hashing
pub async fn user(store: &MemoryStore, email: &str) -> User {
    store
        .create_user(CreateUser {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            name: None,
        })
        .await
        .expect("create user")
}

/// An organization and its owner
pub struct OrgFixture {
    pub owner: User,
    pub organization: Organization,
}

pub async fn organization(store: &MemoryStore, name: &str) -> OrgFixture {
    let email = format!("owner-{}@example.com", name.to_lowercase().replace(' ', "-"));
    let owner = user(store, &email).await;
    let organization = organizations::create_organization(store, owner.id, name.to_string())
        .await
        .expect("create organization");

    OrgFixture {
        owner,
        organization,
    }
}

/// Adds a new user to the fixture organization through invite + accept
pub async fn member(
    store: &MemoryStore,
    fixture: &OrgFixture,
    email: &str,
    role: MembershipRole,
) -> User {
    let user = user(store, email).await;

    let invitation = organizations::invite_member(
        store,
        fixture.owner.id,
        &fixture.organization.slug,
        email.to_string(),
        role,
    )
    .await
    .expect("invite member");

    organizations::accept_invite(store, user.id, &invitation.token)
        .await
        .expect("accept invite");

    user
}
