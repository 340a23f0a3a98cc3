mod cli;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let options = cli::Options::from_args(std::env::args().skip(1))?;
    cli::run_maze_walk(&options)
}
