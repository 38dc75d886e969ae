pub mod browse;
pub mod download;
pub mod login;
pub mod search;

pub use browse::{field_detail, list_fields, module_detail, semester_modules};
pub use download::download;
pub use login::login;
pub use search::search_resources;
