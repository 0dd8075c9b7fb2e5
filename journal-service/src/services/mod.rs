pub mod database;
pub mod jwt;
pub mod storage;

pub use database::{BoardListFilter, Database};
pub use jwt::{AccessTokenClaims, JwtService};
pub use storage::{LocalStorage, Storage, UploadedFile};
