pub mod call_access;
pub mod config;
pub mod jwt_auth;
mod responses;
pub mod stream_video;
mod telementry;

pub use self::config::AppConfig;
pub use call_access::*;
pub use responses::*;
pub use stream_video::StreamVideoService;
pub use telementry::*;
