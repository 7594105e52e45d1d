//! Services layer: data access, authentication, authorization, seeding.

pub mod auth;
pub mod authorizer;
mod database;
mod jwt;
pub mod seed;

pub use auth::AuthService;
pub use database::Database;
pub use jwt::{Claims, JwtService};
