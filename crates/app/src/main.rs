mod html;
mod stream;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = stream::AppConfig::from_env()?;
    stream::run(config)
}
