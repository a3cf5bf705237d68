pub mod building_info;
pub mod database;
pub mod memory;
pub mod note;
pub mod notification;
pub mod preferences;
pub mod project;
pub mod store;
pub mod tracking;
pub mod update_checker;

pub use building_info::{BuildingInfoClient, UpdateFeed};
pub use database::Database;
pub use memory::MemoryStore;
pub use note::NoteService;
pub use notification::NotificationService;
pub use preferences::PreferenceService;
pub use project::ProjectService;
pub use store::DataStore;
pub use tracking::TrackingService;
pub use update_checker::ProjectUpdateService;
