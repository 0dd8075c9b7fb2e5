//! Persisted entities for journal-service.

pub mod board;
pub mod comment;
pub mod drawing;
pub mod drawing_box;
pub mod kid;
pub mod user;

pub use board::{Board, BoardCategory, BoardTitle, BoardWithAuthor, CreateBoard, UpdateBoard};
pub use comment::{Comment, CommentWithAuthor, CreateComment};
pub use drawing::{CreateDrawing, Drawing, UpdateDrawing};
pub use drawing_box::{BoxCategory, DrawingBox};
pub use kid::{CreateKid, Kid, UpdateKid};
pub use user::User;
