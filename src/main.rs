mod components;
mod model;
mod settings;
mod state;
mod util;

fn main() {
    console_error_panic_hook::set_once();
    util::init_logging();
    log::info!("gesture canvas starting");
    yew::Renderer::<components::app::App>::new().render();
}
