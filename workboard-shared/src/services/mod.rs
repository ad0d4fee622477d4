/// Use cases
///
/// Every function takes the store as `&dyn Store` plus the acting user id and
/// fails fast in a fixed order: the target entity must exist, the caller must
/// be a member of its organization, the caller's role must allow the action,
/// and finally the domain rule (status graph, invitation state, ...) must
/// hold. Mutations hand their audit record to the store, which persists both
/// atomically.
///
/// # Example
///
/// ```
/// use workboard_shared::services::{organizations, projects};
/// use workboard_shared::store::{MemoryStore, Store};
/// use workboard_shared::models::user::CreateUser;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let owner = store
///     .create_user(CreateUser {
///         email: "owner@example.com".into(),
///         password_hash: "hash".into(),
///         name: None,
///     })
///     .await?;
///
/// let org = organizations::create_organization(&store, owner.id, "My Org".into()).await?;
/// assert_eq!(org.slug, "my-org");
///
/// let created = projects::create_project(&store, owner.id, "Launch".into(), None, org.id, vec![]).await?;
/// assert_eq!(created.project.organization_id, org.id);
/// # Ok(())
/// # }
/// ```

pub mod audit;
pub mod auth;
pub mod comments;
pub mod error;
pub mod health;
pub mod organizations;
pub mod projects;
pub mod tags;
pub mod tasks;
pub mod users;

pub use error::{Resource, ServiceError, ServiceResult};
