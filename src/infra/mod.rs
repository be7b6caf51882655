pub mod gemini_client;
pub mod http_client;

pub use gemini_client::GeminiClassifier;
pub use http_client::ReqwestHttp;
