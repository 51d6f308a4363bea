#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = school_marks::run().await {
        eprintln!("school-marks fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
