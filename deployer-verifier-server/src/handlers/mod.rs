pub mod deployers;
pub mod status;
