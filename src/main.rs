#[tokio::main]
async fn main() {
    if let Err(err) = annotations_mcp::mcp::server::run_stdio().await {
        eprintln!("annotations-mcp: {}", err);
        std::process::exit(1);
    }
}
