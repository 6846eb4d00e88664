//! Main application entry point (native).

fn main() {
    #[cfg(feature = "native")]
    env_logger::init();
    log::info!("Starting DICE canvas");

    if let Err(e) = pollster::block_on(dice_app::App::run()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
