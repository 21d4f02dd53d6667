pub mod ar_page;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod nft;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
