use boardkit::init_logging;

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    boardkit::run(&args)
}
