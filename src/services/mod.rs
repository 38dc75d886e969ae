pub mod analytics;
pub mod hierarchy;
pub mod resource;

pub use analytics::AnalyticsService;
pub use hierarchy::HierarchyService;
pub use resource::ResourceService;
