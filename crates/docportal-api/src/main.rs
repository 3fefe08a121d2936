use docportal_core::Config;

// mimalloc keeps fragmentation low on musl-based container images.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = docportal_api::setup::initialize_app(config.clone()).await?;

    docportal_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
