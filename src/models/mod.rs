pub mod note;
pub mod notification;
pub mod period;
pub mod preferences;
pub mod project;
pub mod response;
pub mod tracking;
