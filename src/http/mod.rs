pub mod multipart;
pub mod request;
pub mod response;
pub mod transport;

pub use request::{Header, HttpRequest};
pub use response::HttpResponse;
pub use transport::{HttpTransport, ReqwestTransport};
