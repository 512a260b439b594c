pub mod dropdown;
pub mod format;
pub mod modal;

pub use dropdown::Dropdowns;
pub use format::{insert_formatting, FormatError, FormatKind};
pub use modal::Modal;
