pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod schema;
pub mod store;
pub mod video;

pub use config::HuddleConfig;
pub use error::HuddleError;
pub use lifecycle::{CallEvent, CallingState, JoinRejection, LifecycleAction};
pub use models::{Agent, Meeting, MeetingStatus, Page};
pub use video::{StreamVideoClient, VideoError, VideoService};
