pub mod boards;
pub mod drawing_boxes;
pub mod drawings;
pub mod kids;

pub use boards::{
    BoardDetailResponse, BoardListParams, BoardListResponse, BoardRequest, BoardResponse,
    BoardTitleResponse, CommentRequest, CommentResponse,
};
pub use drawing_boxes::{DrawingBoxDetailResponse, DrawingBoxRequest, DrawingBoxResponse};
pub use drawings::{DrawingRequest, DrawingResponse};
pub use kids::{KidRequest, KidResponse};
