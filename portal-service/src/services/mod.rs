//! Services layer for the investor portal.
//!
//! Business logic lives here; handlers stay thin and map service results to
//! HTTP responses.

pub mod admin;
pub mod auth;
pub mod cache;
mod database;
pub mod error;
pub mod onboarding;
pub mod rate_limit;
mod session;
pub mod catalog;

pub use admin::{AdminService, ProvisionedCredentials};
pub use auth::{AuthService, SessionGrant};
pub use cache::{MemoryCache, NullCache, RedisCache, ViewCache};
pub use catalog::CatalogService;
pub use database::{Database, OverviewCounts};
pub use error::ServiceError;
pub use onboarding::{AccessClaim, OnboardingService};
pub use rate_limit::{Decision, SlidingWindowLimiter, WindowConfig};
pub use session::{SessionClaims, SessionService};
