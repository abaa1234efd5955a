fn main() {
    if let Err(err) = svg_crop_tools::run_crop() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
