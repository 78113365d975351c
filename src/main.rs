#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = avaliar_rust::run().await {
        eprintln!("avaliar-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
