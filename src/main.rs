use anyhow::Result;
use catalog_ocr::utils::logging;
use catalog_ocr::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    let app = App::initialize(config)?;

    // `--single` 走单文档模式，其余情况走批量模式
    if std::env::args().nth(1).as_deref() == Some("--single") {
        app.run_single().await?;
    } else {
        app.run().await?;
    }

    Ok(())
}
