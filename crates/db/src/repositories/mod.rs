//! Repository layer: one unit struct per table with associated async
//! functions taking a `&PgPool`.

mod session_repo;
mod user_repo;

pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
