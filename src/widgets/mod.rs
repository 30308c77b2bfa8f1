pub mod controls;
pub mod datatable;
pub mod debug;
pub mod filter_row;
pub mod preset_picker;
pub mod text_input;
