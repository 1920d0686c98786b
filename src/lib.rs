pub mod export;
pub mod frontend;
pub mod table_view;
pub mod toolbar;

pub use datatable_core;
pub use frontend::TableFrontend;
pub use table_view::{TableResponse, TableView};
pub use toolbar::Toolbar;
