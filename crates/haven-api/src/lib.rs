//! JSON REST API for haven.
//!
//! Exposes an axum [`Router`] backed by any [`haven_core::store::IncidentStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", haven_api::api_router(store.clone()))
//! ```

pub mod directory;
pub mod error;
pub mod incidents;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use haven_core::store::IncidentStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IncidentStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Incidents
    .route(
      "/incidents",
      get(incidents::list::<S>).post(incidents::create::<S>),
    )
    .route("/incidents/{id}", get(incidents::get_one::<S>))
    .route(
      "/incidents/{id}/attachments",
      post(incidents::add_attachment::<S>),
    )
    // Directory
    .route("/students", post(directory::create_student::<S>))
    .route(
      "/students/{id}/contacts",
      post(directory::add_contact::<S>),
    )
    .route("/staff", post(directory::create_staff::<S>))
    .with_state(store)
}
