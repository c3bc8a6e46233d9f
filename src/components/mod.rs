pub mod app;
pub mod canvas_controls;
pub mod canvas_view;
pub mod settings_modal;
pub mod status_bar;
