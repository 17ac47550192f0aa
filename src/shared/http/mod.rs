/// JSONレスポンスの組み立て
pub mod response;

pub use response::{error_body, error_response, json_response};
