use std::process::ExitCode;

use brightspace_downloader::{CmsClient, Config, Credentials, logging};
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let config = Config::parse();
    logging::init(config.verbose);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> brightspace_downloader::Result<()> {
    let base_url = config.base_url()?;
    info!("Detected base URL: {base_url}");

    let credentials = Credentials::load(&config.auth, config.host().as_deref())?;
    let cms = CmsClient::new(&base_url, &credentials)?;
    cms.parse_course(&config.course_url, &config.output).await?;
    Ok(())
}
