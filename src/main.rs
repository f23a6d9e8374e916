use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    parley::logging::init();
    parley::run().await
}
