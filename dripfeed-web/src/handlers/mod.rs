//! HTTP request handlers organized by functionality

pub mod echo;
pub mod files;
pub mod httpbin;
pub mod upload;
pub mod utils;

// Re-export handler functions
pub use echo::{
    EchoGetBody, EchoPostBody, RefreshBody, echo_get, echo_post, fail, index, redirect_to_echo,
    refresh, response_headers,
};
pub use files::{FileServeError, serve_file};
pub use httpbin::{
    BodyEchoBody, CookiesBody, MetaEchoBody, cookies, httpbin_delete, httpbin_get, httpbin_patch,
    httpbin_post, httpbin_put, status_code,
};
pub use upload::{upload_binary, upload_file, upload_multi};
