use log::LevelFilter;
use quill::start;
use quill_database::config::QuillConfig;

#[tokio::main]
pub async fn main() -> quill_database::error::BackendResult<()> {
    if std::env::args().collect::<Vec<_>>().get(1) == Some(&"--print-config".to_string()) {
        println!("{}", doku::to_toml::<QuillConfig>());
        std::process::exit(0);
    }

    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .filter_module("quill", LevelFilter::Debug)
        .init();

    let config = QuillConfig::read()?;
    start(config, None, None).await?;
    Ok(())
}
