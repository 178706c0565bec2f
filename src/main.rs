#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = edumate_rust::run().await {
        eprintln!("edumate-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
