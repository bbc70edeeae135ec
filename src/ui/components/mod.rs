pub mod command_overlay;
pub mod feature_list;
pub mod input;
