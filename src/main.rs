use bankwatch::config::AppConfig;
use bankwatch::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    bankwatch::logging::init();
    let config = AppConfig::from_env()?;
    bankwatch::run(config).await
}
