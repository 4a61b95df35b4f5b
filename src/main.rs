use phong_viewer::DemoConfig;

fn main() {
    env_logger::init();
    if let Err(err) = phong_viewer::run(DemoConfig::default()) {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
